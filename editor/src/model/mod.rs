//! Row view-model
//!
//! A [`Row`] is built once from a [`RowSpec`] and validated at that point, so
//! handlers never discover a missing attribute halfway through a save.

pub mod catalog;
pub mod spec;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BindError, EditorError, EditorResult};
use crate::fetch::Method;
use crate::url::UrlTemplate;

pub use catalog::{Catalogs, OptionCatalog, SelectOption};
pub use spec::{AttributeSource, FieldSpec, RowSpec};

/// Field holding the identifying name of every row
pub const NAME_FIELD: &str = "name";
/// Display text of a single-select field with nothing selected
pub const NO_SELECTION: &str = "None";

/// Table a row belongs to, from `data-category`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Users,
    Groups,
    Roles,
    Records,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Groups => "groups",
            Self::Roles => "roles",
            Self::Records => "records",
        }
    }

    /// JSON key carrying the row name in create/update bodies
    pub fn name_key(&self) -> &'static str {
        match self {
            Self::Users => "username",
            _ => "name",
        }
    }

    /// Method used to rename an existing entity
    pub fn update_method(&self) -> Method {
        match self {
            Self::Users => Method::Patch,
            _ => Method::Put,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "users" | "user" => Ok(Self::Users),
            "groups" | "group" => Ok(Self::Groups),
            "roles" | "role" => Ok(Self::Roles),
            "records" | "record" | "zone" => Ok(Self::Records),
            other => Err(BindError::InvalidAttribute {
                attribute: "data-category".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Widget a field swaps in while editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    MultiSelect,
    Structured,
    Secret,
}

impl FieldKind {
    /// Widget conventionally used for a `data-field` name
    pub fn for_field(name: &str) -> Self {
        match name {
            "group" => Self::Select,
            "role" | "roles" => Self::MultiSelect,
            "data" => Self::Structured,
            "password" => Self::Secret,
            _ => Self::Text,
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect)
    }
}

/// What a cell shows outside edit mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayValue {
    Text(String),
    /// Labels of the related entities, one element each
    List(Vec<String>),
    /// Ordered `label -> value` sub-fields
    Pairs(Vec<(String, String)>),
}

impl DisplayValue {
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::MultiSelect => Self::List(Vec::new()),
            FieldKind::Structured => Self::Pairs(Vec::new()),
            _ => Self::Text(String::new()),
        }
    }

    /// Parse a `data-original` membership list; empty entries are dropped
    pub fn from_joined(joined: &str) -> Self {
        Self::List(
            joined
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Plain text of the value, as stored in `data-original`
    pub fn to_attribute(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(labels) => labels.join(","),
            Self::Pairs(pairs) => pairs
                .iter()
                .map(|(label, value)| format!("{}: {}", label, value))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// What a cell holds while editing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldInput {
    Text(String),
    /// Selected option value
    Select(Option<String>),
    /// Selected option values
    MultiSelect(Vec<String>),
    Structured(Vec<(String, String)>),
}

/// Exactly one of display text or input widget is mounted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldView {
    Display(DisplayValue),
    Editing {
        original: DisplayValue,
        input: FieldInput,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    editable: bool,
    view: FieldView,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, editable: bool, display: DisplayValue) -> Self {
        Self {
            name: name.into(),
            kind,
            editable,
            view: FieldView::Display(display),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn view(&self) -> &FieldView {
        &self.view
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.view, FieldView::Editing { .. })
    }

    /// Display value, or the snapshot while editing
    pub fn original(&self) -> &DisplayValue {
        match &self.view {
            FieldView::Display(display) => display,
            FieldView::Editing { original, .. } => original,
        }
    }

    pub fn input(&self) -> Option<&FieldInput> {
        match &self.view {
            FieldView::Editing { input, .. } => Some(input),
            FieldView::Display(_) => None,
        }
    }

    /// Current text: the input while editing, the display text otherwise
    pub fn text(&self) -> String {
        match &self.view {
            FieldView::Editing {
                input: FieldInput::Text(text),
                ..
            } => text.clone(),
            FieldView::Display(display) | FieldView::Editing { original: display, .. } => {
                display.to_attribute()
            }
        }
    }

    /// Snapshot the display value and mount an input seeded from it
    pub(crate) fn begin_edit(&mut self, catalog: Option<&OptionCatalog>) {
        if let FieldView::Display(display) = &self.view {
            let input = seed_input(self.kind, display, catalog);
            self.view = FieldView::Editing {
                original: display.clone(),
                input,
            };
        }
    }

    /// Drop the input and show the snapshot again
    pub(crate) fn restore(&mut self) {
        if let FieldView::Editing { original, .. } = &self.view {
            self.view = FieldView::Display(original.clone());
        }
    }

    /// Drop the input and show a new value
    pub(crate) fn commit(&mut self, display: DisplayValue) {
        self.view = FieldView::Display(display);
    }

    pub(crate) fn input_mut(&mut self) -> Option<&mut FieldInput> {
        match &mut self.view {
            FieldView::Editing { input, .. } => Some(input),
            FieldView::Display(_) => None,
        }
    }
}

fn seed_input(kind: FieldKind, display: &DisplayValue, catalog: Option<&OptionCatalog>) -> FieldInput {
    match (kind, display) {
        (FieldKind::Select, DisplayValue::Text(label)) => FieldInput::Select(
            catalog
                .and_then(|catalog| catalog.by_label(label))
                .map(|option| option.value.clone()),
        ),
        (FieldKind::MultiSelect, DisplayValue::List(labels)) => FieldInput::MultiSelect(
            catalog
                .map(|catalog| catalog.values_for_labels(labels))
                .unwrap_or_default(),
        ),
        (FieldKind::Structured, DisplayValue::Pairs(pairs)) => FieldInput::Structured(pairs.clone()),
        (FieldKind::Secret, _) => FieldInput::Text(String::new()),
        (_, display) => FieldInput::Text(display.to_attribute()),
    }
}

/// Lifecycle of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    Display,
    Editing,
    Saving,
    Removed,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Display => "displayed",
            Self::Editing => "being edited",
            Self::Saving => "saving",
            Self::Removed => "removed",
        })
    }
}

/// Action buttons of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Edit,
    Delete,
    Save,
    Cancel,
    Create,
}

impl Action {
    /// CSS class of the matching button
    pub fn class(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Save => "save",
            Self::Cancel => "cancel",
            Self::Create => "create",
        }
    }
}

/// One editable table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    category: Category,
    is_new: bool,
    fields: Vec<Field>,
    url: Option<UrlTemplate>,
    name_url: Option<String>,
    select_url: Option<UrlTemplate>,
    record_index: Option<u32>,
    state: RowState,
}

impl Row {
    /// Validate a spec and build the row.
    ///
    /// New-record rows start with every editable field mounted as an input.
    pub fn bind(spec: RowSpec, catalogs: &Catalogs) -> Result<Self, BindError> {
        spec.validate()?;

        let mut fields: Vec<Field> = spec
            .fields
            .into_iter()
            .map(|field| Field::new(field.name, field.kind, field.editable, field.display))
            .collect();

        let state = if spec.is_new {
            for field in fields.iter_mut().filter(|field| field.editable) {
                let catalog = catalogs.get(&field.name);
                field.begin_edit(catalog);
            }
            RowState::Editing
        } else {
            RowState::Display
        };

        Ok(Self {
            category: spec.category,
            is_new: spec.is_new,
            fields,
            url: spec.url,
            name_url: spec.name_url,
            select_url: spec.select_url,
            record_index: spec.record_index,
            state,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: RowState) {
        self.state = state;
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> EditorResult<&mut Field> {
        self.fields
            .iter_mut()
            .find(|field| field.name == name)
            .ok_or_else(|| EditorError::UnknownField(name.to_string()))
    }

    /// Current text of a field, empty when the field is absent
    pub fn text_of(&self, name: &str) -> String {
        self.field(name).map(Field::text).unwrap_or_default()
    }

    /// Name as currently displayed, used as the tag of whole-row requests
    pub fn display_name(&self) -> String {
        self.field(NAME_FIELD)
            .map(|field| field.original().to_attribute())
            .unwrap_or_default()
    }

    /// Create endpoint of a new-record row (`data-url`)
    pub fn url(&self) -> Option<&UrlTemplate> {
        self.url.as_ref()
    }

    /// Entity endpoint (`data-name-url`)
    pub fn name_url(&self) -> Option<&str> {
        self.name_url.as_deref()
    }

    /// Association endpoint (`data-select-url`)
    pub fn select_url(&self) -> Option<&UrlTemplate> {
        self.select_url.as_ref()
    }

    pub fn record_index(&self) -> Option<u32> {
        self.record_index
    }

    /// Buttons visible in the current state
    pub fn visible_actions(&self) -> &'static [Action] {
        if self.is_new {
            return &[Action::Create];
        }
        match self.state {
            RowState::Display => &[Action::Edit, Action::Delete],
            RowState::Editing | RowState::Saving => &[Action::Save, Action::Cancel],
            RowState::Removed => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_attribute() {
        assert_eq!("users".parse::<Category>().unwrap(), Category::Users);
        assert_eq!(" Groups ".parse::<Category>().unwrap(), Category::Groups);
        assert!(matches!(
            "zones-admin".parse::<Category>(),
            Err(BindError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_from_joined_drops_empty_entries() {
        assert_eq!(
            DisplayValue::from_joined("admin,,dns_edit,"),
            DisplayValue::List(vec!["admin".to_string(), "dns_edit".to_string()])
        );
        assert_eq!(DisplayValue::from_joined(""), DisplayValue::List(vec![]));
    }

    #[test]
    fn test_begin_edit_and_restore() {
        let mut field = Field::new("name", FieldKind::Text, true, DisplayValue::Text("alice".into()));
        field.begin_edit(None);
        assert_eq!(field.input(), Some(&FieldInput::Text("alice".into())));

        if let Some(FieldInput::Text(text)) = field.input_mut() {
            text.push_str("-renamed");
        }
        assert_eq!(field.text(), "alice-renamed");

        field.restore();
        assert_eq!(field.view(), &FieldView::Display(DisplayValue::Text("alice".into())));
    }

    #[test]
    fn test_secret_input_starts_empty() {
        let mut field = Field::new("password", FieldKind::Secret, true, DisplayValue::Text("****".into()));
        field.begin_edit(None);
        assert_eq!(field.input(), Some(&FieldInput::Text(String::new())));
    }
}
