//! HTTP access to the ZoneForge backend
//!
//! [`HttpTransport`] is the native [`Transport`]: every editor request goes
//! through it with a JSON content type and, once logged in, a bearer token.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};
use zoneforge_editor::{FetchResult, Method, PlannedRequest, Transport, TransportFailure};

use crate::config::{BackendSettings, Settings};
use crate::error::{ClientError, ClientResult};

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpTransport {
    pub fn new(backend: &BackendSettings) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = backend.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: backend.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Transport authenticated from the configured token, logging in with
    /// username and password when there is none
    pub async fn connect(settings: &Settings) -> ClientResult<Self> {
        let transport = Self::new(&settings.backend)?;

        if let Some(token) = settings.auth.token() {
            return Ok(transport.with_token(SecretString::from(token.expose_secret().to_owned())));
        }
        if let Some((username, password)) = settings.auth.login() {
            let token = transport.login(username, password).await?;
            return Ok(transport.with_token(token));
        }

        debug!("no credentials configured, requests are sent anonymously");
        Ok(transport)
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, username: &str, password: &SecretString) -> ClientResult<SecretString> {
        let url = self.url("/api/login");
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "username": username,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(ClientError::Login(message_of(&body).unwrap_or_else(|| status.to_string())));
        }

        let token = body
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Login("response carried no token".to_string()))?;

        info!(username, "logged in");
        Ok(SecretString::from(token.to_string()))
    }

    /// GET a listing and deserialize it
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        debug!(url = %url, "fetching listing");

        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
                message: message_of(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| ClientError::UnexpectedResponse {
            url,
            reason: err.to_string(),
        })
    }

    /// Absolute URL of a backend path; absolute URLs pass through
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &PlannedRequest) -> Result<FetchResult, TransportFailure> {
        let url = self.url(&request.url);
        let mut builder = self
            .authorize(self.client.request(to_reqwest(request.method), &url))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportFailure(err.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TransportFailure(err.to_string()))?;

        Ok(FetchResult::from_body(request.tag.clone(), status, &bytes))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn message_of(body: &Value) -> Option<String> {
    body.get("message").and_then(Value::as_str).map(str::to_string)
}
