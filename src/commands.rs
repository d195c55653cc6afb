//! Subcommand runners
//!
//! Every mutating subcommand drives a [`RowEditor`] exactly like a click
//! sequence in the browser would: enter edit mode, change inputs, submit.

use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};
use zoneforge_editor::model::NO_SELECTION;
use zoneforge_editor::{
    Catalogs, Category, Command as EditorCommand, Dialogs, EditorContext, FieldKind, OptionCatalog, Outcome, Row,
    RowEditor,
};

use crate::cli::{Assignment, Command, RowTarget};
use crate::client::HttpTransport;
use crate::config::Settings;
use crate::error::{ClientError, ClientResult};
use crate::rows;

/// What a subcommand produced, for printing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Lines(Vec<String>),
    Row { action: &'static str, outcome: Outcome },
}

impl Report {
    /// The operation was refused, invalid, or never reached the server
    pub fn is_failure(&self) -> bool {
        match self {
            Report::Row { outcome, .. } => outcome.is_failure(),
            Report::Lines(_) => false,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Lines(lines) => f.write_str(&lines.join("\n")),
            Report::Row { action, outcome } => {
                let text = match outcome {
                    Outcome::Displayed => "saved",
                    Outcome::Removed => "deleted",
                    Outcome::Reload => "done, the table changed on the server; list it again to see the current state",
                    Outcome::Editing => "not saved",
                    Outcome::Unchanged => "nothing changed",
                    Outcome::Failed { rolled_back: true } => "failed, the row was left as it was",
                    Outcome::Failed { rolled_back: false } => "failed, nothing was saved",
                };
                write!(f, "{}: {}", action, text)
            }
        }
    }
}

#[derive(Deserialize)]
struct RecordType {
    fields: Vec<String>,
}

pub struct App {
    settings: Settings,
    http: HttpTransport,
}

impl App {
    pub fn new(settings: Settings, http: HttpTransport) -> Self {
        Self { settings, http }
    }

    /// Build the HTTP transport and log in if needed
    pub async fn connect(settings: Settings) -> ClientResult<Self> {
        let http = HttpTransport::connect(&settings).await?;
        Ok(Self::new(settings, http))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn execute(&self, command: &Command, dialogs: &dyn Dialogs) -> anyhow::Result<Report> {
        match command {
            Command::List { category, zone } => Ok(Report::Lines(
                rows::list(&self.http, *category, zone.as_deref()).await?,
            )),
            Command::Edit { target, set, original } => self.edit(target, set, original, dialogs).await,
            Command::Create { category, zone, set } => self.create(*category, zone.as_deref(), set, dialogs).await,
            Command::Delete { target } => self.delete(target, dialogs).await,
            Command::Types { record_type } => self.record_type(record_type).await,
        }
    }

    async fn edit(
        &self,
        target: &RowTarget,
        set: &[Assignment],
        original: &[Assignment],
        dialogs: &dyn Dialogs,
    ) -> anyhow::Result<Report> {
        let catalogs = rows::load_catalogs(&self.http, target.category).await?;
        let spec = rows::load_row(&self.http, target, original).await?;
        let mut editor = RowEditor::new(Row::bind(spec, &catalogs)?);
        let ctx = self.context(&catalogs, dialogs);

        let entered = editor.dispatch(EditorCommand::EnterEdit, &ctx).await?;
        if entered != Outcome::Editing {
            return Ok(Report::Row {
                action: "edit",
                outcome: entered,
            });
        }
        for assignment in set {
            let command = assignment_command(editor.row(), &catalogs, assignment)?;
            editor.dispatch(command, &ctx).await?;
        }

        let outcome = editor.dispatch(EditorCommand::Save, &ctx).await?;
        info!(category = %target.category, key = %target.key, ?outcome, "edit finished");
        Ok(Report::Row { action: "edit", outcome })
    }

    async fn create(
        &self,
        category: Category,
        zone: Option<&str>,
        set: &[Assignment],
        dialogs: &dyn Dialogs,
    ) -> anyhow::Result<Report> {
        let catalogs = rows::load_catalogs(&self.http, category).await?;
        let mut editor = RowEditor::new(Row::bind(rows::new_row(category, zone)?, &catalogs)?);
        let ctx = self.context(&catalogs, dialogs);

        // the record type decides which data labels exist
        let ordered = set
            .iter()
            .filter(|assignment| assignment.field == "type")
            .chain(set.iter().filter(|assignment| assignment.field != "type"));
        for assignment in ordered {
            let command = assignment_command(editor.row(), &catalogs, assignment)?;
            editor.dispatch(command, &ctx).await?;
        }

        let outcome = editor.dispatch(EditorCommand::Create, &ctx).await?;
        info!(%category, ?outcome, "create finished");
        Ok(Report::Row {
            action: "create",
            outcome,
        })
    }

    async fn delete(&self, target: &RowTarget, dialogs: &dyn Dialogs) -> anyhow::Result<Report> {
        let catalogs = Catalogs::new();
        let spec = rows::load_row(&self.http, target, &[]).await?;
        let mut editor = RowEditor::new(Row::bind(spec, &catalogs)?);
        let ctx = self.context(&catalogs, dialogs);

        let outcome = editor.dispatch(EditorCommand::Delete, &ctx).await?;
        Ok(Report::Row {
            action: "delete",
            outcome,
        })
    }

    async fn record_type(&self, record_type: &str) -> anyhow::Result<Report> {
        let path = format!(
            "{}/{}",
            self.settings.editor.record_type_url.trim_end_matches('/'),
            urlencoding::encode(record_type)
        );
        let found: RecordType = self.http.get_json(&path).await?;
        Ok(Report::Lines(found.fields))
    }

    fn context<'a>(&'a self, catalogs: &'a Catalogs, dialogs: &'a dyn Dialogs) -> EditorContext<'a> {
        EditorContext {
            transport: &self.http,
            dialogs,
            catalogs,
            config: &self.settings.editor,
        }
    }
}

/// Translate a `field=value` argument into the input command for that field
pub fn assignment_command(row: &Row, catalogs: &Catalogs, assignment: &Assignment) -> ClientResult<EditorCommand> {
    if let Some((field, label)) = assignment.sub_field() {
        return Ok(EditorCommand::SetSubField {
            field: field.to_string(),
            label: label.to_string(),
            value: assignment.value.clone(),
        });
    }

    let field = row
        .field(&assignment.field)
        .ok_or_else(|| invalid(assignment, "the row has no such field"))?;
    let catalog = catalogs.get(field.name());

    let command = match field.kind() {
        FieldKind::Text if field.name() == "type" && row.category() == Category::Records && row.is_new() => {
            EditorCommand::ChangeRecordType {
                record_type: assignment.value.trim().to_string(),
            }
        }
        FieldKind::Text | FieldKind::Secret => EditorCommand::SetText {
            field: assignment.field.clone(),
            value: assignment.value.clone(),
        },
        FieldKind::Select => EditorCommand::Select {
            field: assignment.field.clone(),
            value: resolve_option(catalog, &assignment.value),
        },
        FieldKind::MultiSelect => EditorCommand::SetSelection {
            field: assignment.field.clone(),
            values: assignment
                .value
                .split(',')
                .filter_map(|entry| resolve_option(catalog, entry))
                .collect(),
        },
        FieldKind::Structured => {
            return Err(invalid(assignment, "address sub-fields as <field>.<label>=value"));
        }
    };

    debug!(field = %assignment.field, command = command.name(), "assignment translated");
    Ok(command)
}

/// Option value for a label or value typed by the user.
///
/// Unknown entries pass through so the editor rejects them by name.
fn resolve_option(catalog: Option<&OptionCatalog>, entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() || entry == NO_SELECTION {
        return None;
    }

    let known = catalog.and_then(|catalog| catalog.by_label(entry).or_else(|| catalog.by_value(entry)));
    Some(known.map(|option| option.value.clone()).unwrap_or_else(|| entry.to_string()))
}

fn invalid(assignment: &Assignment, reason: &str) -> ClientError {
    ClientError::InvalidAssignment(format!("{}={}: {}", assignment.field, assignment.value, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::{group_catalog, group_row, new_row, role_catalog, GroupEntry, RoleEntry};

    fn assignment(field: &str, value: &str) -> Assignment {
        Assignment {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    fn group_catalogs() -> Catalogs {
        let mut catalogs = Catalogs::new();
        catalogs.insert(
            "role".to_string(),
            role_catalog(&[
                RoleEntry {
                    id: 1,
                    role_name: "admin".to_string(),
                },
                RoleEntry {
                    id: 2,
                    role_name: "dns_read".to_string(),
                },
            ]),
        );
        catalogs
    }

    #[test]
    fn test_multi_select_accepts_labels_and_values() {
        let catalogs = group_catalogs();
        let row = Row::bind(
            group_row(&GroupEntry {
                id: 3,
                group_name: "ops".to_string(),
            }),
            &catalogs,
        )
        .unwrap();

        let command = assignment_command(&row, &catalogs, &assignment("role", "admin, 2,")).unwrap();
        assert_eq!(
            command,
            EditorCommand::SetSelection {
                field: "role".to_string(),
                values: vec!["1".to_string(), "2".to_string()],
            }
        );
    }

    #[test]
    fn test_select_none_clears() {
        let mut catalogs = Catalogs::new();
        catalogs.insert(
            "group".to_string(),
            group_catalog(&[GroupEntry {
                id: 5,
                group_name: "ops".to_string(),
            }]),
        );
        let row = Row::bind(new_row(Category::Users, None).unwrap(), &catalogs).unwrap();

        assert_eq!(
            assignment_command(&row, &catalogs, &assignment("group", "None")).unwrap(),
            EditorCommand::Select {
                field: "group".to_string(),
                value: None,
            }
        );
        assert_eq!(
            assignment_command(&row, &catalogs, &assignment("group", "ops")).unwrap(),
            EditorCommand::Select {
                field: "group".to_string(),
                value: Some("5".to_string()),
            }
        );
    }

    #[test]
    fn test_record_assignments() {
        let catalogs = Catalogs::new();
        let row = Row::bind(new_row(Category::Records, Some("example.com")).unwrap(), &catalogs).unwrap();

        assert_eq!(
            assignment_command(&row, &catalogs, &assignment("type", " MX ")).unwrap(),
            EditorCommand::ChangeRecordType {
                record_type: "MX".to_string()
            }
        );
        assert_eq!(
            assignment_command(&row, &catalogs, &assignment("data.exchange", "mx1.example.com.")).unwrap(),
            EditorCommand::SetSubField {
                field: "data".to_string(),
                label: "exchange".to_string(),
                value: "mx1.example.com.".to_string(),
            }
        );
        assert!(assignment_command(&row, &catalogs, &assignment("data", "x")).is_err());
        assert!(assignment_command(&row, &catalogs, &assignment("owner", "x")).is_err());
    }

    #[test]
    fn test_report_display() {
        let report = Report::Row {
            action: "edit",
            outcome: Outcome::Displayed,
        };
        assert_eq!(report.to_string(), "edit: saved");
        assert!(!report.is_failure());
        let rejected = Report::Row {
            action: "delete",
            outcome: Outcome::Failed { rolled_back: true },
        };
        assert!(rejected.is_failure());
        assert_eq!(rejected.to_string(), "delete: failed, the row was left as it was");
        assert!(!Report::Row {
            action: "delete",
            outcome: Outcome::Unchanged
        }
        .is_failure());
        assert_eq!(
            Report::Lines(vec!["a".to_string(), "b".to_string()]).to_string(),
            "a\nb"
        );
    }
}
