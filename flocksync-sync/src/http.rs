//! JSON-over-HTTP requests with retry.
//!
//! Both APIs are plain request/response JSON. Every call goes through
//! [`with_retry`]: transport failures, non-2xx statuses and undecodable
//! bodies all consume retry budget.

use crate::error::{SyncError, SyncResult};
use crate::retry::{RetryPolicy, with_retry};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY: usize = 512;

/// Options for one JSON request.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl JsonRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(url)
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    fn label(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// HTTP client that decodes JSON responses and retries failures.
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: Client,
    policy: RetryPolicy,
}

impl JsonClient {
    /// Creates a client with a 30 second request timeout.
    pub fn new(policy: RetryPolicy) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, policy })
    }

    /// GETs `url` with the given headers and query parameters.
    pub async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> SyncResult<Value> {
        let mut request = JsonRequest::get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        for (name, value) in query {
            request = request.query(*name, value.as_str());
        }
        self.send(&request).await
    }

    /// POSTs `body` as JSON to `url` with the given headers.
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> SyncResult<Value> {
        let mut request = JsonRequest::post(url, body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(&request).await
    }

    /// Sends the request, retrying per policy, and returns the decoded body.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    pub async fn send(&self, request: &JsonRequest) -> SyncResult<Value> {
        let label = request.label();
        with_retry(&self.policy, &label, || self.send_once(request)).await
    }

    async fn send_once(&self, request: &JsonRequest) -> SyncResult<Value> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("{} failed: {e}", request.label())))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("reading response body failed: {e}")))?;

        debug!(status = status.as_u16(), len = bytes.len(), "{}", request.label());

        if !status.is_success() {
            return Err(SyncError::Http {
                status: status.as_u16(),
                body: truncate(&String::from_utf8_lossy(&bytes), MAX_ERROR_BODY),
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| SyncError::Decode(e.to_string()))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder_collects_options() {
        let request = JsonRequest::get("https://example.org/x")
            .header("X-Auth", "k")
            .query("page", "2");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.headers, vec![("X-Auth".to_string(), "k".to_string())]);
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert!(request.body.is_none());

        let post = JsonRequest::post("https://example.org/y", json!({"a": 1}));
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.body, Some(json!({"a": 1})));
        assert_eq!(post.label(), "POST https://example.org/y");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }
}
