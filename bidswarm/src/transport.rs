//! HTTP seam between the engine and the network.
use bidswarm_core::DIAGNOSTIC_BODY_LIMIT;
use reqwest::{header, Client};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn truncated_body(&self) -> String {
        truncate(&self.body, DIAGNOSTIC_BODY_LIMIT)
    }
}

/// Cut `body` to at most `limit` characters.
pub fn truncate(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(String),
}

/// Sends a JSON `POST` and hands back the status and body.
///
/// Implementations must be safe to share between every virtual user of a run.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;
}

impl<T> Transport for Arc<T>
where
    T: Transport + Sync,
{
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        Transport::post_json(&**self, url, body, bearer, timeout).await
    }
}

/// [`Transport`] backed by a single pooled `reqwest` client.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .timeout(timeout);

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let res = request
            .send()
            .await
            .map_err(|err| classify(err, timeout))?;
        let status = res.status().as_u16();
        let body = res.text().await.map_err(|err| classify(err, timeout))?;

        Ok(HttpResponse { status, body })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Request(err.to_string())
    }
}
