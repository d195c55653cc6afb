//! # ZoneForge row editor
//!
//! The inline row-editing protocol behind the ZoneForge admin tables (DNS
//! zone records, users, groups and access roles), free of any DOM or HTTP
//! client so it can run in the browser, in a terminal, or in tests.
//!
//! ## Architecture
//!
//! - **model**: typed [`Row`] view-model, bound once from a [`RowSpec`]
//! - **change_set**: diffs of edited rows turned into ordered backend requests
//! - **fetch**: the [`Transport`] contract and the sequential [`Batch`]
//! - **controller**: the per-row [`RowEditor`] state machine
//!
//! ```rust,no_run
//! use zoneforge_editor::{Catalogs, Category, Command, EditorConfig, EditorContext, FieldSpec, Row, RowEditor, RowSpec};
//! # async fn demo(ctx: EditorContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
//! let spec = RowSpec::new(Category::Roles)
//!     .with_name_url("/api/role/2")
//!     .with_field(FieldSpec::text("name", "auditor"));
//! let mut editor = RowEditor::new(Row::bind(spec, ctx.catalogs)?);
//!
//! editor.dispatch(Command::EnterEdit, &ctx).await?;
//! editor.dispatch(Command::SetText { field: "name".into(), value: "auditors".into() }, &ctx).await?;
//! let outcome = editor.dispatch(Command::Save, &ctx).await?;
//! # let _ = (outcome, EditorConfig::default(), Catalogs::new());
//! # Ok(())
//! # }
//! ```

pub mod change_set;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod model;
pub mod url;


pub use change_set::{ChangeSet, CreatePlan, MembershipChange, PendingAssociation};
pub use controller::{Command, Dialogs, EditorConfig, EditorContext, FailurePolicy, Outcome, RowEditor};
pub use error::{BindError, EditorError, EditorResult, RequestError};
pub use fetch::{ensure_ok, summarize, Batch, FetchResult, Method, PlannedRequest, Transport, TransportFailure};
pub use model::{
    Action, AttributeSource, Catalogs, Category, DisplayValue, Field, FieldInput, FieldKind, FieldSpec,
    FieldView, OptionCatalog, Row, RowSpec, RowState, SelectOption,
};
pub use url::UrlTemplate;
