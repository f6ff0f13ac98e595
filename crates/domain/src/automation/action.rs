//! Action — the side effect performed when a rule fires.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Category of side-effecting operation a rule performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendEmail,
    CreateTask,
    Webhook,
}

impl ActionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendEmail => "send_email",
            Self::CreateTask => "create_task",
            Self::Webhook => "webhook",
        }
    }

    /// Keys a config of this type may carry.
    #[must_use]
    pub fn config_fields(self) -> &'static [&'static str] {
        match self {
            Self::SendEmail => &["template", "subject"],
            Self::CreateTask => &["title", "assignee"],
            Self::Webhook => &["url", "method", "headers"],
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send_email" => Ok(Self::SendEmail),
            "create_task" => Ok(Self::CreateTask),
            "webhook" => Ok(Self::Webhook),
            other => Err(ValidationError::UnknownVariant {
                field: "action_type",
                value: other.to_string(),
            }),
        }
    }
}

/// HTTP method used by a webhook action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    #[default]
    Post,
    Put,
}

impl WebhookMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl std::fmt::Display for WebhookMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action-specific settings, one variant per [`ActionType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    SendEmail {
        /// Template identifier or body.
        template: String,
        subject: String,
    },
    CreateTask {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        assignee: Option<String>,
    },
    Webhook {
        url: String,
        #[serde(default)]
        method: WebhookMethod,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

impl ActionConfig {
    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::SendEmail { .. } => ActionType::SendEmail,
            Self::CreateTask { .. } => ActionType::CreateTask,
            Self::Webhook { .. } => ActionType::Webhook,
        }
    }

    /// Read an untagged JSON config as the variant for `action_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ConfigMismatch`] when the JSON does not have
    /// the declared variant's shape, or [`ValidationError::InvalidValue`] when
    /// a field value is unusable.
    pub fn parse(
        action_type: ActionType,
        value: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        let config: Self = super::parse_tagged(
            "action_config",
            action_type.as_str(),
            action_type.config_fields(),
            value,
        )?;
        config.validate()?;
        Ok(config)
    }

    /// Check value-level constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] when a required text field
    /// is blank, a webhook URL is not an absolute `http(s)` URL, or a webhook
    /// header could not be sent over HTTP.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::SendEmail { template, subject } => {
                require_text("action_config.template", template)?;
                require_text("action_config.subject", subject)
            }
            Self::CreateTask { title, .. } => require_text("action_config.title", title),
            Self::Webhook { url, headers, .. } => {
                validate_url(url)?;
                headers
                    .iter()
                    .try_for_each(|(name, value)| validate_header(name, value))
            }
        }
    }

    /// The config as stored, without the variant tag.
    #[must_use]
    pub fn to_untagged(&self) -> serde_json::Value {
        super::untagged(self)
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ValidationError::InvalidValue {
            field: "action_config.url",
            reason: format!("`{url}` is not an absolute http(s) URL"),
        }),
    }
}

/// Names are RFC 9110 tokens; values may hold any byte but controls, tab
/// excepted.
fn validate_header(name: &str, value: &str) -> Result<(), ValidationError> {
    const TOKEN_PUNCT: &[u8] = b"!#$%&'*+-.^_`|~";

    let name_ok = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || TOKEN_PUNCT.contains(&b));
    if !name_ok {
        return Err(ValidationError::InvalidValue {
            field: "action_config.headers",
            reason: format!("`{}` is not a valid header name", name.escape_debug()),
        });
    }
    let value_ok = value.bytes().all(|b| b == b'\t' || (b >= 0x20 && b != 0x7f));
    if !value_ok {
        return Err(ValidationError::InvalidValue {
            field: "action_config.headers",
            reason: format!("value of `{name}` contains a control character"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_create_task_without_assignee() {
        let config = ActionConfig::parse(
            ActionType::CreateTask,
            serde_json::json!({"title": "Welcome call", "assignee": null}),
        )
        .unwrap();
        assert_eq!(
            config,
            ActionConfig::CreateTask {
                title: "Welcome call".to_string(),
                assignee: None,
            }
        );
    }

    #[test]
    fn should_default_webhook_method_to_post() {
        let config = ActionConfig::parse(
            ActionType::Webhook,
            serde_json::json!({"url": "https://hooks.example.com/crm"}),
        )
        .unwrap();
        assert!(matches!(
            config,
            ActionConfig::Webhook {
                method: WebhookMethod::Post,
                ref headers,
                ..
            } if headers.is_empty()
        ));
    }

    #[test]
    fn should_parse_webhook_with_put_and_headers() {
        let config = ActionConfig::parse(
            ActionType::Webhook,
            serde_json::json!({
                "url": "http://localhost:9000/hook",
                "method": "PUT",
                "headers": {"X-Token": "secret"}
            }),
        )
        .unwrap();
        match config {
            ActionConfig::Webhook { method, headers, .. } => {
                assert_eq!(method, WebhookMethod::Put);
                assert_eq!(headers.get("X-Token").map(String::as_str), Some("secret"));
            }
            other => panic!("expected webhook, got {other:?}"),
        }
    }

    #[test]
    fn should_reject_webhook_method_outside_post_and_put() {
        let err = ActionConfig::parse(
            ActionType::Webhook,
            serde_json::json!({"url": "https://example.com", "method": "DELETE"}),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::ConfigMismatch { .. }));
    }

    #[test]
    fn should_reject_config_shaped_for_another_action() {
        let err = ActionConfig::parse(ActionType::Webhook, serde_json::json!({"title": "Call"}))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ConfigMismatch { field: "action_config", kind: "webhook", .. }
        ));
    }

    #[test]
    fn should_reject_header_name_containing_a_space() {
        let err = ActionConfig::parse(
            ActionType::Webhook,
            serde_json::json!({
                "url": "https://example.com/hook",
                "headers": {"X Token": "secret"}
            }),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue {
                field: "action_config.headers",
                ..
            }
        ));
    }

    #[test]
    fn should_reject_header_value_containing_a_newline() {
        let err = ActionConfig::parse(
            ActionType::Webhook,
            serde_json::json!({
                "url": "https://example.com/hook",
                "headers": {"X-Token": "secret\nInjected: yes"}
            }),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue {
                field: "action_config.headers",
                ..
            }
        ));
    }

    #[test]
    fn should_accept_header_value_with_spaces_and_tabs() {
        let config = ActionConfig::parse(
            ActionType::Webhook,
            serde_json::json!({
                "url": "https://example.com/hook",
                "headers": {"Authorization": "Bearer abc\tdef"}
            }),
        );
        assert!(config.is_ok());
    }

    #[test]
    fn should_reject_create_task_config_carrying_webhook_fields() {
        let err = ActionConfig::parse(
            ActionType::CreateTask,
            serde_json::json!({"title": "x", "url": "https://e.com", "method": "PUT"}),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ConfigMismatch {
                field: "action_config",
                kind: "create_task",
                ..
            }
        ));
    }

    #[test]
    fn should_reject_relative_webhook_url() {
        let err = ActionConfig::parse(ActionType::Webhook, serde_json::json!({"url": "/hook"}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "action_config.url", .. }));
    }

    #[test]
    fn should_reject_blank_email_subject() {
        let err = ActionConfig::parse(
            ActionType::SendEmail,
            serde_json::json!({"template": "welcome", "subject": "  "}),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue { field: "action_config.subject", .. }
        ));
    }

    #[test]
    fn should_strip_tag_and_skip_empty_fields_when_untagged() {
        let config = ActionConfig::CreateTask {
            title: "Follow up".to_string(),
            assignee: None,
        };
        assert_eq!(config.to_untagged(), serde_json::json!({"title": "Follow up"}));
    }
}
