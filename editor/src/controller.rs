//! Row editor controller
//!
//! One [`RowEditor`] per table row. Every user action arrives as a
//! [`Command`] through [`RowEditor::dispatch`], which drives the row through
//! `display -> editing -> saving -> display | editing` and reports what the
//! surrounding page must do as an [`Outcome`].
//!
//! Requests of one save or create run strictly in order through a
//! [`Batch`]. Once any of them has been accepted, a later failure asks for a
//! full reload instead of trying to reconcile local state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::change_set::{committed_display, plan_create, plan_delete, plan_update, CreatePlan};
use crate::error::{EditorError, EditorResult, RequestError};
use crate::fetch::{summarize, Batch, FetchResult, Method, PlannedRequest, Transport};
use crate::model::{Catalogs, Category, FieldInput, Row, RowState};

/// Blocking, page-modal dialogs
pub trait Dialogs {
    fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
}

/// What happens to a row when nothing was committed and a save fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the inputs so the user can correct and retry
    #[default]
    StayEditing,
    /// Restore the pre-edit snapshot
    Rollback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub failure_policy: FailurePolicy,
    /// Length of generated initial passwords
    pub password_length: usize,
    /// Base of the record-type lookup, `/{type}` is appended
    pub record_type_url: String,
    pub delete_prompt: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            password_length: 16,
            record_type_url: "/api/types/recordtype".to_string(),
            delete_prompt: "Are you sure you want to delete this record?".to_string(),
        }
    }
}

/// Collaborators shared by every row of a page
#[derive(Clone, Copy)]
pub struct EditorContext<'a> {
    pub transport: &'a dyn Transport,
    pub dialogs: &'a dyn Dialogs,
    pub catalogs: &'a Catalogs,
    pub config: &'a EditorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    EnterEdit,
    Cancel,
    Save,
    Delete,
    Create,
    /// Enter key in any input
    Submit,
    SetText {
        field: String,
        value: String,
    },
    /// Pick one option value, `None` clears the selection
    Select {
        field: String,
        value: Option<String>,
    },
    SetSelection {
        field: String,
        values: Vec<String>,
    },
    SetSubField {
        field: String,
        label: String,
        value: String,
    },
    ChangeRecordType {
        record_type: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnterEdit => "edit",
            Self::Cancel => "cancel",
            Self::Save => "save",
            Self::Delete => "delete",
            Self::Create => "create",
            Self::Submit => "submit",
            Self::SetText { .. } => "set text",
            Self::Select { .. } => "select",
            Self::SetSelection { .. } => "set selection",
            Self::SetSubField { .. } => "set sub-field",
            Self::ChangeRecordType { .. } => "change record type",
        }
    }
}

/// What the page must do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Inputs are mounted
    Editing,
    /// Display text is mounted
    Displayed,
    /// The row no longer exists and must be taken off the page
    Removed,
    /// Local state may be stale; reload from the server
    Reload,
    /// Nothing changed
    Unchanged,
    /// The server refused the operation or it could not be sent. With
    /// `rolled_back` the row shows its previous display values, otherwise
    /// the inputs are kept for a retry.
    Failed { rolled_back: bool },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

pub struct RowEditor {
    row: Row,
}

impl RowEditor {
    pub fn new(row: Row) -> Self {
        Self { row }
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn into_row(self) -> Row {
        self.row
    }

    pub fn state(&self) -> RowState {
        self.row.state()
    }

    /// True while requests are in flight
    pub fn is_busy(&self) -> bool {
        self.row.state() == RowState::Saving
    }

    pub async fn dispatch(&mut self, command: Command, ctx: &EditorContext<'_>) -> EditorResult<Outcome> {
        debug!(
            category = %self.row.category(),
            command = command.name(),
            state = %self.row.state(),
            "dispatching command"
        );

        match command {
            Command::EnterEdit => self.enter_edit(ctx).await,
            Command::Cancel => self.cancel(),
            Command::Save => self.save(ctx).await,
            Command::Delete => self.delete(ctx).await,
            Command::Create => self.create(ctx).await,
            Command::Submit if self.row.is_new() => self.create(ctx).await,
            Command::Submit => self.save(ctx).await,
            Command::SetText { field, value } => self.set_text(&field, value),
            Command::Select { field, value } => self.select(&field, value, ctx.catalogs),
            Command::SetSelection { field, values } => self.set_selection(&field, values, ctx.catalogs),
            Command::SetSubField { field, label, value } => self.set_sub_field(&field, label, value),
            Command::ChangeRecordType { record_type } => self.change_record_type(record_type, ctx).await,
        }
    }

    async fn enter_edit(&mut self, ctx: &EditorContext<'_>) -> EditorResult<Outcome> {
        self.expect_existing("edit")?;
        self.expect_state("edit", RowState::Display)?;

        let labels = if self.needs_record_labels() {
            let record_type = self.row.text_of("type");
            match fetch_record_labels(&record_type, ctx).await {
                Ok(labels) => Some(labels),
                Err(EditorError::Request(err)) => {
                    ctx.dialogs.alert(&err.report());
                    return Ok(Outcome::Failed { rolled_back: true });
                }
                Err(err) => return Err(err),
            }
        } else {
            None
        };

        for field in self.row.fields_mut().iter_mut().filter(|field| field.is_editable()) {
            let catalog = ctx.catalogs.get(field.name());
            field.begin_edit(catalog);
        }
        if let Some(labels) = labels {
            self.apply_record_labels(labels)?;
        }

        self.row.set_state(RowState::Editing);
        Ok(Outcome::Editing)
    }

    fn cancel(&mut self) -> EditorResult<Outcome> {
        self.expect_existing("cancel")?;
        self.expect_state("cancel", RowState::Editing)?;

        self.rollback();
        Ok(Outcome::Displayed)
    }

    async fn save(&mut self, ctx: &EditorContext<'_>) -> EditorResult<Outcome> {
        self.expect_existing("save")?;
        self.expect_state("save", RowState::Editing)?;

        let change_set = plan_update(&self.row, ctx.catalogs)?;
        if change_set.is_empty() {
            debug!("nothing changed, leaving edit mode");
            self.commit(ctx.catalogs);
            return Ok(Outcome::Displayed);
        }

        self.row.set_state(RowState::Saving);
        let mut batch = Batch::new(ctx.transport);

        match batch.send_all(&change_set.requests).await {
            Ok(()) => {
                info!(
                    category = %self.row.category(),
                    requests = change_set.len(),
                    "row saved"
                );
                ctx.dialogs.alert(&summarize(batch.results()));
                self.commit(ctx.catalogs);
                Ok(Outcome::Displayed)
            }
            Err(err) => Ok(self.save_failed(err, ctx)),
        }
    }

    fn save_failed(&mut self, err: RequestError, ctx: &EditorContext<'_>) -> Outcome {
        ctx.dialogs.alert(&err.report());

        if err.partially_committed() {
            warn!(error = %err, "save partially committed, page must reload");
            self.row.set_state(RowState::Editing);
            return Outcome::Reload;
        }

        match ctx.config.failure_policy {
            FailurePolicy::StayEditing => {
                self.row.set_state(RowState::Editing);
                Outcome::Failed { rolled_back: false }
            }
            FailurePolicy::Rollback => {
                self.rollback();
                Outcome::Failed { rolled_back: true }
            }
        }
    }

    async fn delete(&mut self, ctx: &EditorContext<'_>) -> EditorResult<Outcome> {
        self.expect_existing("delete")?;
        self.expect_state("delete", RowState::Display)?;

        if !ctx.dialogs.confirm(&ctx.config.delete_prompt) {
            return Ok(Outcome::Unchanged);
        }

        let request = plan_delete(&self.row)?;
        self.row.set_state(RowState::Saving);
        let mut batch = Batch::new(ctx.transport);

        match batch.send(&request).await {
            Ok(result) => {
                ctx.dialogs.alert(&result.summary_line());
                info!(tag = %request.tag, "row deleted");
                self.row.set_state(RowState::Removed);
                Ok(Outcome::Removed)
            }
            Err(err) => {
                ctx.dialogs.alert(&err.to_string());
                self.row.set_state(RowState::Display);
                Ok(Outcome::Failed { rolled_back: true })
            }
        }
    }

    async fn create(&mut self, ctx: &EditorContext<'_>) -> EditorResult<Outcome> {
        self.expect_new("create")?;
        self.expect_state("create", RowState::Editing)?;

        let plan = match plan_create(&self.row, ctx.catalogs, ctx.config.password_length) {
            Ok(plan) => plan,
            Err(EditorError::Validation(message)) => {
                ctx.dialogs.alert(&message);
                return Ok(Outcome::Failed { rolled_back: false });
            }
            Err(err) => return Err(err),
        };

        self.row.set_state(RowState::Saving);
        let outcome = run_create(plan, ctx).await;
        self.row.set_state(RowState::Editing);
        Ok(outcome)
    }

    fn set_text(&mut self, name: &str, value: String) -> EditorResult<Outcome> {
        self.expect_state("edit a field", RowState::Editing)?;

        match editing_input(&mut self.row, name)? {
            FieldInput::Text(text) => {
                *text = value;
                Ok(Outcome::Editing)
            }
            _ => Err(wrong_input(name, "text")),
        }
    }

    fn select(&mut self, name: &str, value: Option<String>, catalogs: &Catalogs) -> EditorResult<Outcome> {
        self.expect_state("select", RowState::Editing)?;

        let value = value.filter(|value| !value.is_empty());
        if let Some(value) = &value {
            check_option(catalogs, name, value)?;
        }

        match editing_input(&mut self.row, name)? {
            FieldInput::Select(selected) => {
                *selected = value;
                Ok(Outcome::Editing)
            }
            _ => Err(wrong_input(name, "single-select")),
        }
    }

    fn set_selection(&mut self, name: &str, values: Vec<String>, catalogs: &Catalogs) -> EditorResult<Outcome> {
        self.expect_state("select", RowState::Editing)?;

        let values: Vec<String> = values.into_iter().filter(|value| !value.is_empty()).collect();
        for value in &values {
            check_option(catalogs, name, value)?;
        }

        match editing_input(&mut self.row, name)? {
            FieldInput::MultiSelect(selected) => {
                *selected = values;
                Ok(Outcome::Editing)
            }
            _ => Err(wrong_input(name, "multi-select")),
        }
    }

    fn set_sub_field(&mut self, name: &str, label: String, value: String) -> EditorResult<Outcome> {
        self.expect_state("edit a field", RowState::Editing)?;

        match editing_input(&mut self.row, name)? {
            FieldInput::Structured(pairs) => {
                match pairs.iter_mut().find(|(existing, _)| *existing == label) {
                    Some((_, slot)) => *slot = value,
                    None => pairs.push((label, value)),
                }
                Ok(Outcome::Editing)
            }
            _ => Err(wrong_input(name, "structured")),
        }
    }

    async fn change_record_type(&mut self, record_type: String, ctx: &EditorContext<'_>) -> EditorResult<Outcome> {
        if self.row.category() != Category::Records {
            return Err(EditorError::Unsupported {
                command: "change record type",
                row: self.row.category().as_str(),
            });
        }
        self.expect_state("change record type", RowState::Editing)?;
        editing_input(&mut self.row, "type")?;

        let labels = match fetch_record_labels(&record_type, ctx).await {
            Ok(labels) => labels,
            Err(EditorError::Request(err)) => {
                ctx.dialogs.alert(&err.report());
                return Ok(Outcome::Editing);
            }
            Err(err) => return Err(err),
        };

        if let FieldInput::Text(text) = editing_input(&mut self.row, "type")? {
            *text = record_type;
        }
        self.apply_record_labels(labels)?;
        Ok(Outcome::Editing)
    }

    /// Lay out the structured `data` input along the given labels,
    /// keeping values of labels that survive
    fn apply_record_labels(&mut self, labels: Vec<String>) -> EditorResult<()> {
        match editing_input(&mut self.row, "data")? {
            FieldInput::Structured(pairs) => {
                let previous = std::mem::take(pairs);
                *pairs = labels
                    .into_iter()
                    .map(|label| {
                        let value = previous
                            .iter()
                            .find(|(existing, _)| *existing == label)
                            .map(|(_, value)| value.clone())
                            .unwrap_or_default();
                        (label, value)
                    })
                    .collect();
                Ok(())
            }
            _ => Err(wrong_input("data", "structured")),
        }
    }

    fn needs_record_labels(&self) -> bool {
        self.row.category() == Category::Records
            && self
                .row
                .field("data")
                .map(|field| field.original().to_attribute().is_empty())
                .unwrap_or(false)
    }

    fn commit(&mut self, catalogs: &Catalogs) {
        for field in self.row.fields_mut().iter_mut().filter(|field| field.is_editing()) {
            let display = committed_display(field, catalogs);
            field.commit(display);
        }
        self.row.set_state(RowState::Display);
    }

    fn rollback(&mut self) {
        for field in self.row.fields_mut() {
            field.restore();
        }
        self.row.set_state(RowState::Display);
    }

    fn expect_state(&self, command: &'static str, expected: RowState) -> EditorResult<()> {
        if self.row.state() == expected {
            Ok(())
        } else {
            Err(EditorError::InvalidTransition {
                command,
                state: self.row.state(),
            })
        }
    }

    fn expect_existing(&self, command: &'static str) -> EditorResult<()> {
        if self.row.is_new() {
            Err(EditorError::Unsupported {
                command,
                row: "new-record",
            })
        } else {
            Ok(())
        }
    }

    fn expect_new(&self, command: &'static str) -> EditorResult<()> {
        if self.row.is_new() {
            Ok(())
        } else {
            Err(EditorError::Unsupported {
                command,
                row: "existing",
            })
        }
    }
}

async fn run_create(plan: CreatePlan, ctx: &EditorContext<'_>) -> Outcome {
    let mut batch = Batch::new(ctx.transport);

    let created_id = match batch.send(&plan.primary).await {
        Ok(result) => result.id(),
        Err(err) => {
            ctx.dialogs.alert(&err.report());
            return Outcome::Failed { rolled_back: false };
        }
    };

    if !plan.associations.is_empty() {
        let Some(created_id) = created_id else {
            warn!(tag = %plan.primary.tag, "creation response carried no id");
            ctx.dialogs.alert(&format!(
                "{}{}: no id returned, associations were not assigned\n",
                summarize(batch.results()),
                plan.primary.tag
            ));
            return Outcome::Reload;
        };

        let requests: Vec<PlannedRequest> = plan
            .associations
            .iter()
            .map(|association| association.resolve(&created_id))
            .collect();

        if let Err(err) = batch.send_all(&requests).await {
            ctx.dialogs.alert(&err.report());
            return Outcome::Reload;
        }
    }

    info!(
        tag = %plan.primary.tag,
        associations = plan.associations.len(),
        "row created"
    );

    if ctx.dialogs.confirm(&reload_prompt(batch.results(), plan.password.as_deref())) {
        Outcome::Reload
    } else {
        Outcome::Unchanged
    }
}

fn reload_prompt(results: &[FetchResult], password: Option<&str>) -> String {
    let mut message = String::new();
    for (index, result) in results.iter().enumerate() {
        message.push_str(&result.summary_line());
        message.push('\n');
        if index == 0 {
            if let Some(password) = password {
                message.push_str(&format!("Password: {}\n", password));
            }
        }
    }
    message.push_str("\nReload to load new record?");
    message
}

async fn fetch_record_labels(record_type: &str, ctx: &EditorContext<'_>) -> EditorResult<Vec<String>> {
    let url = format!(
        "{}/{}",
        ctx.config.record_type_url.trim_end_matches('/'),
        urlencoding::encode(record_type)
    );
    let request = PlannedRequest::new(record_type, Method::Get, url);

    let mut batch = Batch::new(ctx.transport);
    let result = batch.send(&request).await?;

    let fields = result
        .fields
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| EditorError::UnexpectedResponse(format!("record type `{}` has no field list", record_type)))?;

    Ok(fields
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn editing_input<'r>(row: &'r mut Row, name: &str) -> EditorResult<&'r mut FieldInput> {
    row.field_mut(name)?
        .input_mut()
        .ok_or_else(|| EditorError::ReadOnlyField(name.to_string()))
}

fn check_option(catalogs: &Catalogs, field: &str, value: &str) -> EditorResult<()> {
    let known = catalogs
        .get(field)
        .map(|catalog| catalog.by_value(value).is_some())
        .unwrap_or(false);

    if known {
        Ok(())
    } else {
        Err(EditorError::UnknownOption {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

fn wrong_input(field: &str, expected: &'static str) -> EditorError {
    EditorError::WrongInput {
        field: field.to_string(),
        expected,
    }
}
