//! # minicrm-adapter-webhook-reqwest
//!
//! Sends the HTTP calls of `webhook` automation actions with
//! [reqwest](https://docs.rs/reqwest).
//!
//! ## Dependency rule
//! Depends on `minicrm-app` (for the `WebhookClient` port) and
//! `minicrm-domain` (for error types).

use std::time::Duration;

use minicrm_app::ports::{WebhookClient, WebhookRequest};
use minicrm_domain::automation::WebhookMethod;
use minicrm_domain::error::{HttpError, MiniCrmError};

/// Failure to set up the HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("unable to build HTTP client: {0}")]
pub struct BuildError(#[from] reqwest::Error);

/// [`WebhookClient`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestWebhookClient {
    client: reqwest::Client,
}

impl ReqwestWebhookClient {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, BuildError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn to_method(method: WebhookMethod) -> reqwest::Method {
    match method {
        WebhookMethod::Post => reqwest::Method::POST,
        WebhookMethod::Put => reqwest::Method::PUT,
    }
}

impl WebhookClient for ReqwestWebhookClient {
    async fn send(&self, request: &WebhookRequest) -> Result<(), MiniCrmError> {
        let body = serde_json::to_vec(&request.body)
            .map_err(|err| HttpError::Transport(err.to_string()))?;

        // the request already carries its Content-Type, so no `.json()`
        let mut builder = self
            .client
            .request(to_method(request.method), &request.url)
            .body(body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|err| {
            tracing::debug!(url = %request.url, error = %err, "webhook transport failure");
            HttpError::Transport(err.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(url = %request.url, status = status.as_u16(), "webhook delivered");
            return Ok(());
        }
        Err(HttpError::Status {
            status: status.as_u16(),
            status_text: status
                .canonical_reason()
                .map_or_else(|| status.as_str().to_string(), str::to_string),
        }
        .into())
    }
}
