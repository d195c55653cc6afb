//! Error types for the row editor

use thiserror::Error;

use crate::fetch::{summarize, FetchResult};
use crate::model::RowState;

/// Errors raised while turning markup or a row snapshot into a [`Row`](crate::Row)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A data attribute the controller depends on is absent
    #[error("missing required attribute `{attribute}` on {element}")]
    MissingAttribute { element: String, attribute: String },

    /// An attribute is present but cannot be interpreted
    #[error("invalid value `{value}` for attribute `{attribute}`")]
    InvalidAttribute { attribute: String, value: String },

    /// The row lacks a field the category requires
    #[error("row has no `{0}` field")]
    MissingField(String),

    /// A field name appears twice in the same row
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),
}

/// A request batch stopped early
///
/// Both variants carry every result received so far, including the failing
/// one when the server answered, so callers can report the whole batch.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The server answered with a non-2xx status
    #[error("{tag}: {message}")]
    Rejected {
        tag: String,
        status: u16,
        message: String,
        details: Vec<FetchResult>,
    },

    /// The request never produced a response
    #[error("{tag}: request failed: {reason}")]
    Transport {
        tag: String,
        reason: String,
        details: Vec<FetchResult>,
    },
}

impl RequestError {
    /// Results gathered before (and including) the failure
    pub fn details(&self) -> &[FetchResult] {
        match self {
            Self::Rejected { details, .. } | Self::Transport { details, .. } => details,
        }
    }

    /// True once any earlier request in the batch was accepted by the server
    pub fn partially_committed(&self) -> bool {
        self.details().iter().any(|result| result.ok)
    }

    /// Text for the blocking alert shown to the user
    pub fn report(&self) -> String {
        match self {
            Self::Rejected { details, .. } if !details.is_empty() => summarize(details),
            Self::Transport { details, .. } if !details.is_empty() => {
                format!("{}{}\n", summarize(details), self)
            }
            _ => self.to_string(),
        }
    }
}

/// Errors returned by [`RowEditor::dispatch`](crate::RowEditor::dispatch)
///
/// User-facing failures (rejected requests, empty required fields) are
/// reported through the dialogs and surface as an outcome, not as an error.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The command is not valid in the row's current state
    #[error("cannot {command} while the row is {state}")]
    InvalidTransition {
        command: &'static str,
        state: RowState,
    },

    /// The command is valid for some rows, but not this one
    #[error("cannot {command} on a {row} row")]
    Unsupported {
        command: &'static str,
        row: &'static str,
    },

    /// No field of that name exists in the row
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// The field is shown as text only and has no input
    #[error("field `{0}` is not editable")]
    ReadOnlyField(String),

    /// The field exists but its widget takes a different kind of input
    #[error("field `{field}` does not accept {expected} input")]
    WrongInput {
        field: String,
        expected: &'static str,
    },

    /// A selected value is not part of the field's option catalog
    #[error("unknown option `{value}` for field `{field}`")]
    UnknownOption { field: String, value: String },

    /// The row needs an attribute to build a request and does not have it
    #[error(transparent)]
    Bind(#[from] BindError),

    /// A request outside a user-facing batch failed
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Input rejected before any request was built
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a body the editor cannot use
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type alias for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
