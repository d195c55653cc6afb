//! Fetch helper contract
//!
//! A [`Transport`] issues one JSON request and normalizes the answer into a
//! [`FetchResult`], whatever the status code. [`Batch`] runs requests strictly
//! one after another and stops at the first failure, keeping every result so
//! the caller can report the whole batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::error::RequestError;

/// HTTP methods used by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request of a change set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRequest {
    /// Human-readable label of the affected entity
    pub tag: String,
    pub method: Method,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl PlannedRequest {
    pub fn new(tag: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            method,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Normalized response of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Tag copied from the request
    pub tag: String,
    /// Top-level fields of the JSON body; empty when the body is not an object
    pub fields: Map<String, Value>,
    pub status: u16,
    pub ok: bool,
}

impl FetchResult {
    /// Build a result from a status code and the raw body.
    ///
    /// Bodies that are not JSON objects leave `fields` empty.
    pub fn from_body(tag: impl Into<String>, status: u16, body: &[u8]) -> Self {
        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Self {
            tag: tag.into(),
            fields,
            status,
            ok: (200..300).contains(&status),
        }
    }

    /// Server-provided `message`, if any
    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").and_then(Value::as_str)
    }

    /// Message with a status fallback
    pub fn describe(&self) -> String {
        match self.message() {
            Some(message) => message.to_string(),
            None if self.ok => format!("done (status {})", self.status),
            None => format!("HTTP error! status: {}", self.status),
        }
    }

    /// Identifier assigned by the backend on creation
    pub fn id(&self) -> Option<String> {
        match self.fields.get("id")? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// `tag: message` line used in alerts
    pub fn summary_line(&self) -> String {
        format!("{}: {}", self.tag, self.describe())
    }
}

/// Join results into the multi-line text shown in alerts
pub fn summarize(results: &[FetchResult]) -> String {
    results
        .iter()
        .map(|result| format!("{}\n", result.summary_line()))
        .collect()
}

/// Failure to obtain any response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Issues HTTP requests for the editor.
///
/// Implementations send `Content-Type: application/json`, serialize `body`
/// when present, and return `Ok` for every response the server produced,
/// including non-2xx ones.
#[async_trait(?Send)]
pub trait Transport {
    async fn fetch(&self, request: &PlannedRequest) -> Result<FetchResult, TransportFailure>;
}

/// Turn a failed result into an error carrying the batch it belongs to
pub fn ensure_ok(result: &FetchResult, batch: &[FetchResult]) -> Result<(), RequestError> {
    if result.ok {
        return Ok(());
    }

    Err(RequestError::Rejected {
        tag: result.tag.clone(),
        status: result.status,
        message: result.describe(),
        details: batch.to_vec(),
    })
}

/// Ordered, truncatable list of attempted requests
pub struct Batch<'a> {
    transport: &'a dyn Transport,
    results: Vec<FetchResult>,
}

impl<'a> Batch<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            results: Vec::new(),
        }
    }

    /// Issue one request and record its result.
    ///
    /// Fails when the transport fails or the server rejects the request.
    pub async fn send(&mut self, request: &PlannedRequest) -> Result<&FetchResult, RequestError> {
        debug!(method = %request.method, url = %request.url, tag = %request.tag, "sending request");

        let result = match self.transport.fetch(request).await {
            Ok(result) => result,
            Err(failure) => {
                warn!(url = %request.url, error = %failure, "request failed");
                return Err(RequestError::Transport {
                    tag: request.tag.clone(),
                    reason: failure.0,
                    details: self.results.clone(),
                });
            }
        };

        debug!(status = result.status, ok = result.ok, "received response");
        self.results.push(result);

        let index = self.results.len() - 1;
        if let Err(err) = ensure_ok(&self.results[index], &self.results) {
            warn!(
                tag = %request.tag,
                completed = index,
                "request rejected, abandoning the rest of the batch"
            );
            return Err(err);
        }

        Ok(&self.results[index])
    }

    /// Issue requests in order, stopping at the first failure
    pub async fn send_all<'r, I>(&mut self, requests: I) -> Result<(), RequestError>
    where
        I: IntoIterator<Item = &'r PlannedRequest>,
    {
        for request in requests {
            self.send(request).await?;
        }
        Ok(())
    }

    pub fn results(&self) -> &[FetchResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<FetchResult> {
        self.results
    }
}
