//! Row snapshots built from the backend list endpoints
//!
//! The browser reads rows from server-rendered markup. The CLI has no markup,
//! so it rebuilds the same [`RowSpec`]s and option catalogs from the JSON
//! listings.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use zoneforge_editor::{
    Catalogs, Category, DisplayValue, FieldKind, FieldSpec, OptionCatalog, RowSpec, SelectOption,
};

use crate::cli::{Assignment, RowTarget};
use crate::client::HttpTransport;
use crate::error::{ClientError, ClientResult};

const GROUP_ROLE_URL: &str = "/api/group/0/role/0";

#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: u64,
    pub user_name: String,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    pub id: u64,
    pub group_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleEntry {
    pub id: u64,
    pub role_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub ttl: Option<Value>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub index: u32,
}

#[derive(Deserialize)]
struct UserList {
    users: Vec<UserEntry>,
}

#[derive(Deserialize)]
struct GroupList {
    groups: Vec<GroupEntry>,
}

#[derive(Deserialize)]
struct RoleList {
    roles: Vec<RoleEntry>,
}

pub async fn users(http: &HttpTransport) -> ClientResult<Vec<UserEntry>> {
    Ok(http.get_json::<UserList>("/api/user").await?.users)
}

pub async fn groups(http: &HttpTransport) -> ClientResult<Vec<GroupEntry>> {
    Ok(http.get_json::<GroupList>("/api/group").await?.groups)
}

pub async fn roles(http: &HttpTransport) -> ClientResult<Vec<RoleEntry>> {
    Ok(http.get_json::<RoleList>("/api/role").await?.roles)
}

/// Records of a zone, optionally narrowed to one name and type
pub async fn records(
    http: &HttpTransport,
    zone: &str,
    name: Option<&str>,
    record_type: Option<&str>,
) -> ClientResult<Vec<RecordEntry>> {
    let mut path = format!("/api/zones/{}/records", urlencoding::encode(zone));
    if let Some(name) = name {
        path.push('/');
        path.push_str(&urlencoding::encode(name));
    }
    if let Some(record_type) = record_type {
        path.push_str("?type=");
        path.push_str(&urlencoding::encode(record_type));
    }
    http.get_json(&path).await
}

/// Option catalogs of the relational fields a category edits
pub async fn load_catalogs(http: &HttpTransport, category: Category) -> ClientResult<Catalogs> {
    let mut catalogs = Catalogs::new();
    match category {
        Category::Users => {
            catalogs.insert("group".to_string(), group_catalog(&groups(http).await?));
        }
        Category::Groups => {
            catalogs.insert("role".to_string(), role_catalog(&roles(http).await?));
        }
        Category::Roles | Category::Records => {}
    }
    Ok(catalogs)
}

pub fn group_catalog(groups: &[GroupEntry]) -> OptionCatalog {
    std::iter::once(SelectOption::new("", "None"))
        .chain(groups.iter().map(|group| {
            SelectOption::new(group.id.to_string(), group.group_name.clone())
                .with_option_url(format!("/api/group/{}/user/0", group.id))
        }))
        .collect()
}

pub fn role_catalog(roles: &[RoleEntry]) -> OptionCatalog {
    std::iter::once(SelectOption::new("", "Select roles"))
        .chain(roles.iter().map(|role| {
            SelectOption::new(role.id.to_string(), role.role_name.clone()).with_option_url(GROUP_ROLE_URL)
        }))
        .collect()
}

/// Snapshot one existing row.
///
/// `originals` supplies pre-edit values the listings do not carry, such as
/// a group's role membership.
pub async fn load_row(http: &HttpTransport, target: &RowTarget, originals: &[Assignment]) -> ClientResult<RowSpec> {
    let spec = match target.category {
        Category::Users => {
            let users = users(http).await?;
            let user = find(&users, target, |user| (user.id, user.user_name.as_str()))?;
            user_row(user)
        }
        Category::Groups => {
            let groups = groups(http).await?;
            let group = find(&groups, target, |group| (group.id, group.group_name.as_str()))?;
            if !originals.iter().any(|original| original.field == "role") {
                warn!(
                    group = %group.group_name,
                    "group listing has no role membership, assuming none; pass --original role=..."
                );
            }
            group_row(group)
        }
        Category::Roles => {
            let roles = roles(http).await?;
            let role = find(&roles, target, |role| (role.id, role.role_name.as_str()))?;
            role_row(role)
        }
        Category::Records => {
            let zone = require_zone(target.zone.as_deref())?;
            let record_type = target
                .record_type
                .as_deref()
                .ok_or_else(|| ClientError::InvalidAssignment("--type is required for records".to_string()))?;
            let entries = records(http, zone, Some(&target.key), Some(record_type)).await?;
            let record = entries
                .iter()
                .find(|record| record.index == target.index)
                .ok_or_else(|| not_found(target))?;
            record_row(zone, record)
        }
    };

    apply_originals(spec, originals)
}

pub fn user_row(user: &UserEntry) -> RowSpec {
    RowSpec::new(Category::Users)
        .with_name_url(format!("/api/user/{}", user.id))
        .with_select_url(format!("/api/group/0/user/{}", user.id))
        .with_field(FieldSpec::text("name", user.user_name.clone()))
        .with_field(FieldSpec::text(
            "group",
            user.group.clone().unwrap_or_else(|| "None".to_string()),
        ))
}

pub fn group_row(group: &GroupEntry) -> RowSpec {
    RowSpec::new(Category::Groups)
        .with_name_url(format!("/api/group/{}", group.id))
        .with_select_url(format!("/api/group/{}/role/0", group.id))
        .with_field(FieldSpec::text("name", group.group_name.clone()))
        .with_field(FieldSpec::new("role", DisplayValue::List(Vec::new())))
}

pub fn role_row(role: &RoleEntry) -> RowSpec {
    RowSpec::new(Category::Roles)
        .with_name_url(format!("/api/role/{}", role.id))
        .with_field(FieldSpec::text("name", role.role_name.clone()))
}

pub fn record_row(zone: &str, record: &RecordEntry) -> RowSpec {
    RowSpec::new(Category::Records)
        .with_name_url(format!(
            "/api/zones/{}/records/{}",
            urlencoding::encode(zone),
            urlencoding::encode(&record.name)
        ))
        .with_record_index(record.index)
        .with_field(FieldSpec::text("name", record.name.clone()).read_only())
        .with_field(FieldSpec::text("type", record.record_type.clone()).read_only())
        .with_field(FieldSpec::text("ttl", record.ttl.as_ref().map(plain_text).unwrap_or_default()))
        .with_field(FieldSpec::new("data", DisplayValue::Pairs(record_pairs(&record.data))))
        .with_field(FieldSpec::text("comment", record.comment.clone().unwrap_or_default()))
}

/// Empty new-record row of a table
pub fn new_row(category: Category, zone: Option<&str>) -> ClientResult<RowSpec> {
    let spec = match category {
        Category::Users => RowSpec::new_record(category, "/api/user")
            .with_field(FieldSpec::text("name", ""))
            .with_field(FieldSpec::text("password", ""))
            .with_field(FieldSpec::text("group", "")),
        Category::Groups => RowSpec::new_record(category, "/api/group")
            .with_field(FieldSpec::text("name", ""))
            .with_field(FieldSpec::new("role", DisplayValue::List(Vec::new()))),
        Category::Roles => RowSpec::new_record(category, "/api/role").with_field(FieldSpec::text("name", "")),
        Category::Records => {
            let zone = require_zone(zone)?;
            RowSpec::new_record(
                category,
                format!("/api/zones/{}/records", urlencoding::encode(zone)),
            )
            .with_field(FieldSpec::text("name", ""))
            .with_field(FieldSpec::text("type", ""))
            .with_field(FieldSpec::text("ttl", ""))
            .with_field(FieldSpec::new("data", DisplayValue::Pairs(Vec::new())))
            .with_field(FieldSpec::text("comment", ""))
        }
    };
    Ok(spec)
}

/// One-line summaries of a table, for `list`
pub async fn list(http: &HttpTransport, category: Category, zone: Option<&str>) -> ClientResult<Vec<String>> {
    let lines = match category {
        Category::Users => users(http)
            .await?
            .iter()
            .map(|user| {
                format!(
                    "{}\t{}\t{}",
                    user.id,
                    user.user_name,
                    user.group.as_deref().unwrap_or("None")
                )
            })
            .collect(),
        Category::Groups => groups(http)
            .await?
            .iter()
            .map(|group| format!("{}\t{}", group.id, group.group_name))
            .collect(),
        Category::Roles => roles(http)
            .await?
            .iter()
            .map(|role| format!("{}\t{}", role.id, role.role_name))
            .collect(),
        Category::Records => {
            let zone = require_zone(zone)?;
            records(http, zone, None, None)
                .await?
                .iter()
                .map(|record| {
                    let data = DisplayValue::Pairs(record_pairs(&record.data)).to_attribute();
                    format!(
                        "{}\t{}\t{}\t{}\t{}",
                        record.name,
                        record.record_type,
                        record.index,
                        record.ttl.as_ref().map(plain_text).unwrap_or_default(),
                        data.replace('\n', ", ")
                    )
                })
                .collect()
        }
    };
    Ok(lines)
}

fn apply_originals(mut spec: RowSpec, originals: &[Assignment]) -> ClientResult<RowSpec> {
    for original in originals {
        let field = spec
            .fields
            .iter_mut()
            .find(|field| field.name == original.field)
            .ok_or_else(|| ClientError::InvalidAssignment(format!("{}={}", original.field, original.value)))?;

        field.display = match field.kind {
            FieldKind::MultiSelect => DisplayValue::from_joined(&original.value),
            _ => DisplayValue::Text(original.value.clone()),
        };
        debug!(field = %original.field, "pre-edit value overridden");
    }
    Ok(spec)
}

fn find<'a, T>(entries: &'a [T], target: &RowTarget, key: impl Fn(&T) -> (u64, &str)) -> ClientResult<&'a T> {
    entries
        .iter()
        .find(|entry| {
            let (id, name) = key(entry);
            name == target.key || id.to_string() == target.key
        })
        .ok_or_else(|| not_found(target))
}

fn not_found(target: &RowTarget) -> ClientError {
    ClientError::NotFound {
        category: target.category.to_string(),
        key: target.key.clone(),
    }
}

fn require_zone(zone: Option<&str>) -> ClientResult<&str> {
    zone.ok_or_else(|| ClientError::InvalidAssignment("--zone is required for records".to_string()))
}

fn record_pairs(data: &Map<String, Value>) -> Vec<(String, String)> {
    data.iter()
        .map(|(label, value)| (label.clone(), plain_text(value)))
        .collect()
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
