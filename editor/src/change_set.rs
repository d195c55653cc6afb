//! Translating edited rows into backend requests

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::error::{BindError, EditorError, EditorResult};
use crate::fetch::{Method, PlannedRequest};
use crate::model::{
    Catalogs, Category, DisplayValue, Field, FieldInput, FieldKind, OptionCatalog, Row, SelectOption,
    NAME_FIELD, NO_SELECTION,
};
use crate::url::UrlTemplate;

/// Requests representing the effect of one save
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub requests: Vec<PlannedRequest>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}

/// Association request that needs the id of the row being created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAssociation {
    pub tag: String,
    pub url: UrlTemplate,
    pub option_value: String,
}

impl PendingAssociation {
    /// Fill the URL with the created id, then the option value
    pub fn resolve(&self, created_id: &str) -> PlannedRequest {
        PlannedRequest::new(
            self.tag.clone(),
            Method::Post,
            self.url.fill(&[created_id, self.option_value.as_str()]),
        )
    }
}

/// Requests for a new-record row
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePlan {
    pub primary: PlannedRequest,
    pub associations: Vec<PendingAssociation>,
    /// Initial password of a new user, shown once after creation
    pub password: Option<String>,
}

/// Membership change of a many-to-many relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange<'a> {
    Added(&'a SelectOption),
    Removed(&'a SelectOption),
}

/// Symmetric difference between the original labels and the selected values.
///
/// Walks the catalog in order; members present on both sides produce nothing.
pub fn diff_memberships<'a>(
    catalog: &'a OptionCatalog,
    original_labels: &[String],
    selected_values: &[String],
) -> Vec<MembershipChange<'a>> {
    catalog
        .selectable()
        .filter_map(|option| {
            let was = original_labels.contains(&option.label);
            let is = selected_values.contains(&option.value);
            match (was, is) {
                (true, false) => Some(MembershipChange::Removed(option)),
                (false, true) => Some(MembershipChange::Added(option)),
                _ => None,
            }
        })
        .collect()
}

/// Generate an initial password for a new user
pub fn generate_password(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Diff an editing row against its snapshots
pub fn plan_update(row: &Row, catalogs: &Catalogs) -> EditorResult<ChangeSet> {
    let mut requests = Vec::new();

    match row.category() {
        Category::Records => {
            if let Some(request) = plan_record_update(row)? {
                requests.push(request);
            }
        }
        category => {
            if let Some(field) = row.field(NAME_FIELD).filter(|field| field.is_editing()) {
                let new_name = field.text();
                if new_name != field.original().to_attribute() {
                    requests.push(
                        PlannedRequest::new(new_name.clone(), category.update_method(), entity_url(row)?)
                            .with_body(json!({ (category.name_key()): new_name })),
                    );
                }
            }

            for field in row.fields().iter().filter(|field| field.is_editing()) {
                match field.kind() {
                    FieldKind::Select => {
                        requests.extend(plan_select_change(row, field, catalog_for(catalogs, field))?)
                    }
                    FieldKind::MultiSelect => requests.extend(plan_membership_change(
                        row,
                        field,
                        catalog_for(catalogs, field),
                    )?),
                    _ => {}
                }
            }
        }
    }

    Ok(ChangeSet { requests })
}

/// DELETE for an existing row
pub fn plan_delete(row: &Row) -> EditorResult<PlannedRequest> {
    let request = PlannedRequest::new(row.display_name(), Method::Delete, entity_url(row)?);

    if row.category() != Category::Records {
        return Ok(request);
    }

    let data = row
        .field("data")
        .map(|field| pairs_to_object(display_pairs(field.original())))
        .unwrap_or_default();

    Ok(request.with_body(json!({
        "type": row.text_of("type"),
        "data": data,
        "index": row.record_index(),
    })))
}

/// Creation request plus its dependent associations.
///
/// Fails with [`EditorError::Validation`] when the name is empty.
pub fn plan_create(row: &Row, catalogs: &Catalogs, password_length: usize) -> EditorResult<CreatePlan> {
    let name = row.text_of(NAME_FIELD).trim().to_string();
    if name.is_empty() {
        return Err(EditorError::Validation(format!(
            "The {} field is required",
            NAME_FIELD
        )));
    }

    let url = row
        .url()
        .ok_or_else(|| missing("new-record row", "data-url"))?
        .fill(&[name.as_str()]);

    let mut body = Map::new();
    body.insert(row.category().name_key().to_string(), Value::String(name.clone()));

    let mut password = None;
    match row.category() {
        Category::Users => {
            let typed = row.text_of("password");
            let chosen = if typed.is_empty() {
                generate_password(password_length)
            } else {
                typed
            };
            body.insert("password".to_string(), Value::String(chosen.clone()));
            password = Some(chosen);
        }
        Category::Records => {
            let record_type = row.text_of("type").trim().to_string();
            if record_type.is_empty() {
                return Err(EditorError::Validation("The type field is required".to_string()));
            }
            body.insert("type".to_string(), Value::String(record_type));
            body.insert("data".to_string(), pairs_to_object(input_pairs(row.field("data"))));
            insert_optional_text(&mut body, "ttl", row.text_of("ttl"));
            insert_optional_text(&mut body, "comment", row.text_of("comment"));
        }
        Category::Groups | Category::Roles => {}
    }

    let primary = PlannedRequest::new(name, Method::Post, url).with_body(Value::Object(body));

    let mut associations = Vec::new();
    for field in row.fields().iter().filter(|field| field.kind().is_relational()) {
        let catalog = catalog_for(catalogs, field);
        for value in selected_values(field) {
            let option = catalog.by_value(&value).ok_or_else(|| EditorError::UnknownOption {
                field: field.name().to_string(),
                value: value.clone(),
            })?;
            let url = option
                .option_url
                .clone()
                .ok_or_else(|| missing("option", "data-option-url"))?;
            associations.push(PendingAssociation {
                tag: option.label.clone(),
                url,
                option_value: option.value.clone(),
            });
        }
    }

    Ok(CreatePlan {
        primary,
        associations,
        password,
    })
}

/// Display value a field shows after its change was committed
pub fn committed_display(field: &Field, catalogs: &Catalogs) -> DisplayValue {
    if field.kind() == FieldKind::Secret {
        return field.original().clone();
    }

    let catalog = catalogs.get(field.name());
    match field.input() {
        Some(FieldInput::Text(text)) => DisplayValue::Text(text.clone()),
        Some(FieldInput::Select(Some(value))) => DisplayValue::Text(
            catalog
                .and_then(|catalog| catalog.by_value(value))
                .map(|option| option.label.clone())
                .unwrap_or_else(|| value.clone()),
        ),
        Some(FieldInput::Select(None)) => DisplayValue::Text(NO_SELECTION.to_string()),
        Some(FieldInput::MultiSelect(values)) => DisplayValue::List(
            catalog
                .map(|catalog| catalog.labels_for_values(values))
                .unwrap_or_else(|| values.clone()),
        ),
        Some(FieldInput::Structured(pairs)) => DisplayValue::Pairs(pairs.clone()),
        None => field.original().clone(),
    }
}

fn plan_select_change(row: &Row, field: &Field, catalog: &OptionCatalog) -> EditorResult<Vec<PlannedRequest>> {
    let original_label = field.original().to_attribute();
    let original = catalog.by_label(&original_label);
    let selected = match field.input() {
        Some(FieldInput::Select(selected)) => selected.as_deref(),
        _ => None,
    };

    let request = match (original, selected) {
        (Some(before), Some(after)) if before.value == after => None,
        (before, Some(after)) => {
            let option = catalog.by_value(after).ok_or_else(|| EditorError::UnknownOption {
                field: field.name().to_string(),
                value: after.to_string(),
            })?;
            let method = if before.is_none() { Method::Post } else { Method::Put };
            Some(PlannedRequest::new(
                option.label.clone(),
                method,
                association_url(row)?.fill(&[option.value.as_str()]),
            ))
        }
        (Some(before), None) => Some(PlannedRequest::new(
            before.label.clone(),
            Method::Delete,
            association_url(row)?.fill(&[before.value.as_str()]),
        )),
        (None, None) => None,
    };

    Ok(request.into_iter().collect())
}

fn plan_membership_change(
    row: &Row,
    field: &Field,
    catalog: &OptionCatalog,
) -> EditorResult<Vec<PlannedRequest>> {
    let original_labels = match field.original() {
        DisplayValue::List(labels) => labels.clone(),
        other => match DisplayValue::from_joined(&other.to_attribute()) {
            DisplayValue::List(labels) => labels,
            _ => Vec::new(),
        },
    };
    let selected = selected_values(field);

    let changes = diff_memberships(catalog, &original_labels, &selected);
    if changes.is_empty() {
        return Ok(Vec::new());
    }

    let url = association_url(row)?;
    Ok(changes
        .into_iter()
        .map(|change| {
            let (option, method) = match change {
                MembershipChange::Added(option) => (option, Method::Post),
                MembershipChange::Removed(option) => (option, Method::Delete),
            };
            PlannedRequest::new(option.label.clone(), method, url.fill(&[option.value.as_str()]))
        })
        .collect())
}

fn plan_record_update(row: &Row) -> EditorResult<Option<PlannedRequest>> {
    let changed = row
        .fields()
        .iter()
        .filter(|field| field.is_editing())
        .any(|field| match (field.input(), field.original()) {
            (Some(FieldInput::Structured(pairs)), DisplayValue::Pairs(original)) => pairs != original,
            (Some(FieldInput::Structured(pairs)), _) => !pairs.is_empty(),
            _ => field.text() != field.original().to_attribute(),
        });
    if !changed {
        return Ok(None);
    }

    let mut body = Map::new();
    body.insert("type".to_string(), Value::String(row.text_of("type")));
    body.insert("data".to_string(), pairs_to_object(input_pairs(row.field("data"))));
    body.insert("index".to_string(), json!(row.record_index()));
    insert_optional_text(&mut body, "ttl", row.text_of("ttl"));
    insert_optional_text(&mut body, "comment", row.text_of("comment"));

    Ok(Some(
        PlannedRequest::new(row.display_name(), Method::Put, entity_url(row)?).with_body(Value::Object(body)),
    ))
}

fn selected_values(field: &Field) -> Vec<String> {
    match field.input() {
        Some(FieldInput::Select(Some(value))) if !value.is_empty() => vec![value.clone()],
        Some(FieldInput::MultiSelect(values)) => {
            values.iter().filter(|value| !value.is_empty()).cloned().collect()
        }
        _ => Vec::new(),
    }
}

fn input_pairs(field: Option<&Field>) -> Vec<(String, String)> {
    match field.and_then(Field::input) {
        Some(FieldInput::Structured(pairs)) => pairs.clone(),
        _ => field.map(|field| display_pairs(field.original())).unwrap_or_default(),
    }
}

fn display_pairs(display: &DisplayValue) -> Vec<(String, String)> {
    match display {
        DisplayValue::Pairs(pairs) => pairs.clone(),
        _ => Vec::new(),
    }
}

fn pairs_to_object(pairs: Vec<(String, String)>) -> Value {
    Value::Object(
        pairs
            .into_iter()
            .map(|(label, value)| (label, Value::String(value)))
            .collect(),
    )
}

fn insert_optional_text(body: &mut Map<String, Value>, key: &str, value: String) {
    let value = value.trim();
    if !value.is_empty() {
        body.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn catalog_for<'a>(catalogs: &'a Catalogs, field: &Field) -> &'a OptionCatalog {
    static EMPTY: OptionCatalog = OptionCatalog::empty();
    catalogs.get(field.name()).unwrap_or(&EMPTY)
}

fn entity_url(row: &Row) -> Result<String, BindError> {
    row.name_url()
        .map(str::to_string)
        .ok_or_else(|| missing("name cell", "data-name-url"))
}

fn association_url(row: &Row) -> Result<&UrlTemplate, BindError> {
    row.select_url()
        .ok_or_else(|| missing("relation cell", "data-select-url"))
}

fn missing(element: &str, attribute: &str) -> BindError {
    BindError::MissingAttribute {
        element: element.to_string(),
        attribute: attribute.to_string(),
    }
}
