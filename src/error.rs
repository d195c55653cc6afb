//! Errors of the command-line client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded or deserialized
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but holds unusable values
    #[error("invalid configuration: {0}")]
    InvalidSettings(String),

    /// HTTP client failure outside an editor batch
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer to a lookup or login request
    #[error("{url} answered {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Credentials were rejected or the login answer had no token
    #[error("login failed: {0}")]
    Login(String),

    /// The addressed row is not in the listing
    #[error("no {category} named `{key}`")]
    NotFound { category: String, key: String },

    /// A `--set`/`--original` argument does not fit the row
    #[error("invalid assignment `{0}`")]
    InvalidAssignment(String),

    /// A listing or lookup returned a body of the wrong shape
    #[error("unexpected response from {url}: {reason}")]
    UnexpectedResponse { url: String, reason: String },
}

pub type ClientResult<T> = Result<T, ClientError>;
