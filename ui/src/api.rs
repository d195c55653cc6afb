//! Fetch-based transport for the ZoneForge backend
//!
//! Requests are same-origin; the browser attaches the session cookie.

use async_trait::async_trait;
use gloo_net::http::{Method as HttpMethod, Request, RequestBuilder};
use zoneforge_editor::{FetchResult, Method, PlannedRequest, Transport, TransportFailure};

pub struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn fetch(&self, request: &PlannedRequest) -> Result<FetchResult, TransportFailure> {
        let response = build(request)
            .map_err(|e| TransportFailure(format!("Failed to build request: {}", e)))?
            .send()
            .await
            .map_err(|e| TransportFailure(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .binary()
            .await
            .map_err(|e| TransportFailure(format!("Failed to read response: {}", e)))?;

        Ok(FetchResult::from_body(request.tag.clone(), status, &body))
    }
}

fn build(request: &PlannedRequest) -> Result<Request, gloo_net::Error> {
    let builder = RequestBuilder::new(&request.url)
        .method(http_method(request.method))
        .header("Content-Type", "application/json");

    match &request.body {
        Some(body) => builder.json(body),
        None => builder.build(),
    }
}

fn http_method(method: Method) -> HttpMethod {
    match method {
        Method::Get => HttpMethod::GET,
        Method::Post => HttpMethod::POST,
        Method::Put => HttpMethod::PUT,
        Method::Patch => HttpMethod::PATCH,
        Method::Delete => HttpMethod::DELETE,
    }
}
