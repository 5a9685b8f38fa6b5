//! Single-request HTTP boundary.
//!
//! A [`Transport`] performs exactly one GET and reports the status code and
//! parsed JSON body. Retry, pacing and bookkeeping live above this layer in
//! [`crate::retry`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ScraperError;

/// Status code and body of one completed HTTP exchange.
///
/// `body` is `Value::Null` for non-2xx responses; error pages are not JSON.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl TransportResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one GET request.
///
/// Implementations must be shareable across concurrently running page tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Transport`] when no usable response was
    /// obtained (connection refused, timeout, malformed JSON body).
    async fn get(&self, url: &str) -> Result<TransportResponse, ScraperError>;
}

/// Production [`Transport`] backed by a pooled `reqwest::Client`.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates an `HttpTransport` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(TransportResponse {
                status: status.as_u16(),
                body: serde_json::Value::Null,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(url, &e))?;
        let body = serde_json::from_str(&text).map_err(|e| ScraperError::Transport {
            url: url.to_owned(),
            reason: format!("malformed JSON body: {e}"),
        })?;

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> ScraperError {
    let reason = if err.is_timeout() {
        "request timeout".to_owned()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    ScraperError::Transport {
        url: url.to_owned(),
        reason,
    }
}
