//! Row descriptions gathered from markup or from backend listings

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::BuildHasher;

use super::{Category, DisplayValue, FieldKind, NAME_FIELD};
use crate::error::BindError;
use crate::url::UrlTemplate;

/// Read access to an element's attributes
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> Option<String>;

    /// Short description of the element for error messages
    fn describe(&self) -> String {
        "element".to_string()
    }
}

impl<S: BuildHasher> AttributeSource for HashMap<String, String, S> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl AttributeSource for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

fn required<A: AttributeSource + ?Sized>(source: &A, name: &str) -> Result<String, BindError> {
    source
        .attribute(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BindError::MissingAttribute {
            element: source.describe(),
            attribute: name.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub editable: bool,
    pub display: DisplayValue,
}

impl FieldSpec {
    /// Editable field whose widget follows the `data-field` convention
    pub fn new(name: impl Into<String>, display: DisplayValue) -> Self {
        let name = name.into();
        Self {
            kind: FieldKind::for_field(&name),
            name,
            editable: true,
            display,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, DisplayValue::Text(value.into()))
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }
}

/// Everything needed to bind a [`Row`](super::Row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    pub category: Category,
    pub is_new: bool,
    pub fields: Vec<FieldSpec>,
    pub url: Option<UrlTemplate>,
    pub name_url: Option<String>,
    pub select_url: Option<UrlTemplate>,
    pub record_index: Option<u32>,
}

impl RowSpec {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            is_new: false,
            fields: Vec::new(),
            url: None,
            name_url: None,
            select_url: None,
            record_index: None,
        }
    }

    /// Spec of a new-record row posting to `url`
    pub fn new_record(category: Category, url: impl Into<UrlTemplate>) -> Self {
        Self {
            is_new: true,
            url: Some(url.into()),
            ..Self::new(category)
        }
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_name_url(mut self, url: impl Into<String>) -> Self {
        self.name_url = Some(url.into());
        self
    }

    pub fn with_select_url(mut self, url: impl Into<UrlTemplate>) -> Self {
        self.select_url = Some(url.into());
        self
    }

    pub fn with_record_index(mut self, index: u32) -> Self {
        self.record_index = Some(index);
        self
    }

    /// Build a spec from the row element and its cells.
    ///
    /// Each cell comes with its display value and whether it carries the
    /// `editable` class. `data-name-url` and `data-select-url` may sit on any
    /// cell; the first occurrence wins.
    pub fn from_attributes<R, C, I>(row: &R, is_new: bool, cells: I) -> Result<Self, BindError>
    where
        R: AttributeSource + ?Sized,
        C: AttributeSource,
        I: IntoIterator<Item = (C, DisplayValue, bool)>,
    {
        let category = required(row, "data-category")?.parse::<Category>()?;
        let mut spec = Self::new(category);
        spec.is_new = is_new;
        spec.url = row.attribute("data-url").filter(|url| !url.is_empty()).map(UrlTemplate::new);

        if let Some(index) = row.attribute("data-record-index") {
            let parsed = index.trim().parse::<u32>().map_err(|_| BindError::InvalidAttribute {
                attribute: "data-record-index".to_string(),
                value: index.clone(),
            })?;
            spec.record_index = Some(parsed);
        }

        for (cell, display, editable) in cells {
            let name = required(&cell, "data-field")?;

            if spec.name_url.is_none() {
                spec.name_url = cell.attribute("data-name-url").filter(|url| !url.is_empty());
            }
            if spec.select_url.is_none() {
                spec.select_url = cell
                    .attribute("data-select-url")
                    .filter(|url| !url.is_empty())
                    .map(UrlTemplate::new);
            }

            let mut field = FieldSpec::new(name, display);
            field.editable = editable;
            spec.fields.push(field);
        }

        spec.validate()?;
        Ok(spec)
    }

    /// Check that every attribute the row's commands will need is present
    pub fn validate(&self) -> Result<(), BindError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(BindError::DuplicateField(field.name.clone()));
            }
        }

        if !seen.contains(NAME_FIELD) {
            return Err(BindError::MissingField(NAME_FIELD.to_string()));
        }

        if self.category == Category::Records {
            for name in ["type", "data"] {
                if !seen.contains(name) {
                    return Err(BindError::MissingField(name.to_string()));
                }
            }
        }

        if self.is_new {
            if self.url.is_none() {
                return Err(missing("new-record row", "data-url"));
            }
            return Ok(());
        }

        if self.name_url.is_none() {
            return Err(missing("name cell", "data-name-url"));
        }

        let has_relation = self
            .fields
            .iter()
            .any(|field| field.editable && field.kind.is_relational());
        if has_relation && self.select_url.is_none() {
            return Err(missing("relation cell", "data-select-url"));
        }

        if self.category == Category::Records && self.record_index.is_none() {
            return Err(missing("record row", "data-record-index"));
        }

        Ok(())
    }
}

fn missing(element: &str, attribute: &str) -> BindError {
    BindError::MissingAttribute {
        element: element.to_string(),
        attribute: attribute.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_from_attributes_collects_urls() {
        let row = attrs(&[("data-category", "groups")]);
        let cells = vec![
            (
                attrs(&[("data-field", "name"), ("data-name-url", "/api/group/4")]),
                DisplayValue::Text("ops".into()),
                true,
            ),
            (
                attrs(&[("data-field", "role"), ("data-select-url", "/api/group/4/role/0")]),
                DisplayValue::from_joined("admin,dns_read"),
                true,
            ),
        ];

        let spec = RowSpec::from_attributes(&row, false, cells).unwrap();
        assert_eq!(spec.category, Category::Groups);
        assert_eq!(spec.name_url.as_deref(), Some("/api/group/4"));
        assert_eq!(spec.select_url, Some(UrlTemplate::new("/api/group/4/role/0")));
        assert_eq!(spec.fields[1].kind, FieldKind::MultiSelect);
    }

    #[test]
    fn test_missing_category_fails_fast() {
        let row = attrs(&[]);
        let cells: Vec<(HashMap<String, String>, DisplayValue, bool)> = vec![];
        let err = RowSpec::from_attributes(&row, false, cells).unwrap_err();
        assert_eq!(
            err,
            BindError::MissingAttribute {
                element: "element".into(),
                attribute: "data-category".into()
            }
        );
    }

    #[test]
    fn test_existing_row_needs_name_url() {
        let spec = RowSpec::new(Category::Roles).with_field(FieldSpec::text("name", "auditor"));
        assert_eq!(spec.validate(), Err(missing("name cell", "data-name-url")));
    }

    #[test]
    fn test_relation_needs_select_url() {
        let spec = RowSpec::new(Category::Users)
            .with_name_url("/api/user/3")
            .with_field(FieldSpec::text("name", "carol"))
            .with_field(FieldSpec::text("group", "None"));
        assert_eq!(spec.validate(), Err(missing("relation cell", "data-select-url")));
    }

    #[test]
    fn test_record_rows_need_index() {
        let spec = RowSpec::new(Category::Records)
            .with_name_url("/api/zones/example.com/records/www")
            .with_field(FieldSpec::text("name", "www").read_only())
            .with_field(FieldSpec::text("type", "A").read_only())
            .with_field(FieldSpec::new("data", DisplayValue::Pairs(vec![])));
        assert_eq!(spec.validate(), Err(missing("record row", "data-record-index")));
        assert!(spec.with_record_index(0).validate().is_ok());
    }

    #[test]
    fn test_invalid_record_index() {
        let row = attrs(&[("data-category", "records"), ("data-record-index", "first")]);
        let cells: Vec<(HashMap<String, String>, DisplayValue, bool)> = vec![];
        assert!(matches!(
            RowSpec::from_attributes(&row, false, cells),
            Err(BindError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let spec = RowSpec::new_record(Category::Roles, "/api/role")
            .with_field(FieldSpec::text("name", ""))
            .with_field(FieldSpec::text("name", ""));
        assert_eq!(spec.validate(), Err(BindError::DuplicateField("name".into())));
    }
}
