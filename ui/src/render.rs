//! Rendering a [`Row`] back into its table row

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlOptionElement};
use zoneforge_editor::{Action, Catalogs, DisplayValue, Field, FieldInput, FieldKind, FieldView, Row};

use crate::components::record_data::RecordData;
use crate::dom;

const ACTIONS: [Action; 5] = [Action::Edit, Action::Delete, Action::Save, Action::Cancel, Action::Create];

/// Mount display text or inputs for every field and show the buttons the
/// row's state allows
pub fn render_row(document: &Document, element: &Element, row: &Row, catalogs: &Catalogs) {
    for field in row.fields() {
        let Some(cell) = dom::cell(element, field.name()) else {
            warn!("no cell for field {}", field.name());
            continue;
        };

        match field.view() {
            FieldView::Display(display) => render_display(document, &cell, display),
            FieldView::Editing { input, .. } => render_input(document, &cell, field, input, catalogs),
        }
    }

    let visible = row.visible_actions();
    for action in ACTIONS {
        for button in dom::elements(element, &format!("button.{}", action.class())) {
            let result = if visible.contains(&action) {
                button.remove_attribute("hidden")
            } else {
                button.set_attribute("hidden", "")
            };
            if let Err(err) = result {
                warn!("could not toggle {} button: {:?}", action.class(), err);
            }
        }
    }
}

fn clear(cell: &Element) {
    cell.set_inner_html("");
}

fn append(cell: &Element, child: &Element) {
    if let Err(err) = cell.append_child(child) {
        warn!("could not mount element: {:?}", err);
    }
}

fn render_display(document: &Document, cell: &Element, display: &DisplayValue) {
    if let Err(err) = cell.set_attribute("data-original", &display.to_attribute()) {
        warn!("could not store data-original: {:?}", err);
    }
    clear(cell);

    match display {
        DisplayValue::Text(text) => cell.set_text_content(Some(text)),
        DisplayValue::List(labels) => {
            for label in labels {
                if let Ok(span) = document.create_element("span") {
                    span.set_class_name("multi-role");
                    span.set_text_content(Some(label));
                    append(cell, &span);
                }
            }
        }
        DisplayValue::Pairs(pairs) => mount_record_data(cell, pairs.clone(), false),
    }
}

fn render_input(document: &Document, cell: &Element, field: &Field, input: &FieldInput, catalogs: &Catalogs) {
    if dom::form_control(cell) {
        fill_control(cell, input);
        return;
    }
    clear(cell);

    match input {
        FieldInput::Text(text) => {
            let input_type = if field.kind() == FieldKind::Secret { "password" } else { "text" };
            if let Some(input) = text_input(document, field.name(), input_type, text) {
                append(cell, &input);
            }
        }
        FieldInput::Select(selected) => {
            let values: Vec<String> = selected.iter().cloned().collect();
            if let Some(select) = select_input(document, field.name(), &values, false, catalogs) {
                append(cell, &select);
            }
        }
        FieldInput::MultiSelect(values) => {
            if let Some(select) = select_input(document, field.name(), values, true, catalogs) {
                append(cell, &select);
            }
        }
        FieldInput::Structured(pairs) => mount_record_data(cell, pairs.clone(), true),
    }
}

/// Write an input into a control the markup already provides
fn fill_control(control: &Element, input: &FieldInput) {
    match input {
        FieldInput::Text(text) => {
            if let Some(element) = control.dyn_ref::<HtmlInputElement>() {
                element.set_value(text);
            }
        }
        FieldInput::Select(selected) => {
            let values: Vec<String> = selected.iter().cloned().collect();
            select_values(control, &values);
        }
        FieldInput::MultiSelect(values) => select_values(control, values),
        FieldInput::Structured(_) => warn!("record data cannot be held by a single control"),
    }
}

fn select_values(select: &Element, selected: &[String]) {
    for option in dom::elements(select, "option") {
        if let Ok(option) = option.dyn_into::<HtmlOptionElement>() {
            let value = option.value();
            option.set_selected(selected.iter().any(|selected| *selected == value));
        }
    }
}

fn text_input(document: &Document, name: &str, input_type: &str, value: &str) -> Option<Element> {
    let input = document
        .create_element("input")
        .ok()?
        .dyn_into::<HtmlInputElement>()
        .ok()?;
    input.set_type(input_type);
    input.set_name(name);
    input.set_value(value);
    Some(input.into())
}

/// Clone the field's template select, or build one from the catalog when the
/// page has no template for it
fn select_input(
    document: &Document,
    name: &str,
    selected: &[String],
    multiple: bool,
    catalogs: &Catalogs,
) -> Option<Element> {
    let select = match dom::clone_template(document, name) {
        Some(select) => select,
        None => {
            let select = document
                .create_element("select")
                .ok()?
                .dyn_into::<web_sys::HtmlSelectElement>()
                .ok()?;
            for option in catalogs.get(name).map(|catalog| catalog.options()).unwrap_or_default() {
                let element = HtmlOptionElement::new_with_text_and_value(&option.label, &option.value).ok()?;
                select.append_child(&element).ok()?;
            }
            select
        }
    };

    // the clone must not be mistaken for a row cell or the association select
    for attribute in ["data-field", "id"] {
        if let Err(err) = select.remove_attribute(attribute) {
            warn!("could not detach template select: {:?}", err);
        }
    }
    select.set_name(name);
    select.set_multiple(multiple);

    let select: Element = select.into();
    select_values(&select, selected);
    Some(select)
}

fn mount_record_data(cell: &Element, pairs: Vec<(String, String)>, editing: bool) {
    match cell.clone().dyn_into::<HtmlElement>() {
        Ok(parent) => {
            leptos::mount::mount_to(parent, move || view! { <RecordData pairs=pairs editing=editing /> }).forget();
        }
        Err(_) => warn!("record data cell is not an HTML element"),
    }
}
