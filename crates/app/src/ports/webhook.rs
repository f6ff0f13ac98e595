//! Webhook port — outbound HTTP calls made by `webhook` actions.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use minicrm_domain::automation::WebhookMethod;
use minicrm_domain::error::MiniCrmError;

/// Header name forced on every webhook request.
pub const CONTENT_TYPE: &str = "Content-Type";

/// A fully assembled outbound webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub method: WebhookMethod,
    pub url: String,
    /// Header pairs in send order. Contains exactly one `Content-Type`.
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl WebhookRequest {
    /// Build a JSON request. Configured headers are kept except for any
    /// `Content-Type` (compared case-insensitively), which is always
    /// `application/json`.
    #[must_use]
    pub fn json(
        method: WebhookMethod,
        url: impl Into<String>,
        configured_headers: &BTreeMap<String, String>,
        body: serde_json::Value,
    ) -> Self {
        let mut headers: Vec<(String, String)> = configured_headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        headers.push((CONTENT_TYPE.to_string(), "application/json".to_string()));
        Self {
            method,
            url: url.into(),
            headers,
            body,
        }
    }
}

/// Sends webhook requests.
pub trait WebhookClient {
    /// Send `request`.
    ///
    /// Fails with [`MiniCrmError::Http`] when the endpoint answers outside the
    /// 2xx range or cannot be reached.
    fn send(
        &self,
        request: &WebhookRequest,
    ) -> impl Future<Output = Result<(), MiniCrmError>> + Send;
}

impl<T: WebhookClient + Send + Sync> WebhookClient for Arc<T> {
    fn send(
        &self,
        request: &WebhookRequest,
    ) -> impl Future<Output = Result<(), MiniCrmError>> + Send {
        (**self).send(request)
    }
}
