//! Option catalogs for relational fields
//!
//! Edit-mode selects are clones of one canonical option list per field; the
//! options are never re-fetched per row.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::url::UrlTemplate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Backend identifier; an empty value is the "nothing selected" entry
    pub value: String,
    pub label: String,
    /// `data-option-url`, used to associate a freshly created row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_url: Option<UrlTemplate>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            option_url: None,
        }
    }

    pub fn with_option_url(mut self, url: impl Into<UrlTemplate>) -> Self {
        self.option_url = Some(url.into());
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionCatalog {
    options: Vec<SelectOption>,
}

impl OptionCatalog {
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self { options }
    }

    pub const fn empty() -> Self {
        Self {
            options: Vec::new(),
        }
    }

    /// Every option, in markup order
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    /// Options that name an entity (placeholders excluded)
    pub fn selectable(&self) -> impl Iterator<Item = &SelectOption> {
        self.options.iter().filter(|option| !option.is_placeholder())
    }

    pub fn by_value(&self, value: &str) -> Option<&SelectOption> {
        self.selectable().find(|option| option.value == value)
    }

    pub fn by_label(&self, label: &str) -> Option<&SelectOption> {
        self.selectable().find(|option| option.label == label)
    }

    /// Values of the options whose labels are listed, in catalog order
    pub fn values_for_labels(&self, labels: &[String]) -> Vec<String> {
        self.selectable()
            .filter(|option| labels.contains(&option.label))
            .map(|option| option.value.clone())
            .collect()
    }

    /// Labels of the listed values, in catalog order
    pub fn labels_for_values(&self, values: &[String]) -> Vec<String> {
        self.selectable()
            .filter(|option| values.contains(&option.value))
            .map(|option| option.label.clone())
            .collect()
    }
}

impl FromIterator<SelectOption> for OptionCatalog {
    fn from_iter<I: IntoIterator<Item = SelectOption>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Catalogs keyed by `data-field` name
pub type Catalogs = BTreeMap<String, OptionCatalog>;
