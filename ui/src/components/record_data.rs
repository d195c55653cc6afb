//! Sub-rows of a record's `data` cell
//!
//! One row per record-type label. In display mode each row carries its value
//! in `data-value`; in edit mode it holds an input tagged with `data-label`,
//! so values are always read back per label and never parsed out of text.

use leptos::prelude::*;

#[component]
pub fn RecordData(pairs: Vec<(String, String)>, editing: bool) -> impl IntoView {
    view! {
        <div class="record-data">
            {pairs
                .into_iter()
                .map(|(label, value)| {
                    if editing {
                        view! {
                            <div class="record-data-row">
                                <label class="record-data-label">{label.clone()}</label>
                                <input
                                    type="text"
                                    class="record-data-input"
                                    data-label=label
                                    value=value
                                />
                            </div>
                        }
                            .into_any()
                    } else {
                        let data_label = label.clone();
                        let data_value = value.clone();
                        view! {
                            <div class="record-data-row" data-label=data_label data-value=data_value>
                                <span class="record-data-label">{label}": "</span>
                                <span class="record-data-value">{value}</span>
                            </div>
                        }
                            .into_any()
                    }
                })
                .collect_view()}
        </div>
    }
}
