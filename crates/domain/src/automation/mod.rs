//! Automation rules — trigger type + config → action type + config.
//!
//! A rule reacts to one category of business event ([`TriggerType`]) by
//! performing one side effect ([`ActionConfig`]). Configs arrive as loose
//! JSON in a [`RuleDraft`] and are turned into typed variants by
//! [`RuleDraft::validate`], so an [`AutomationRule`] always carries configs
//! whose shape matches its declared types.

mod action;
mod trigger;

pub use action::{ActionConfig, ActionType, WebhookMethod};
pub use trigger::{TriggerConfig, TriggerType};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{RuleId, TenantId};
use crate::time::Timestamp;

/// Minimum length of a rule name, after trimming.
pub const MIN_NAME_LEN: usize = 2;

/// A rule owned by one tenant that reacts to change events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RuleRecord", try_from = "RuleRecord")]
pub struct AutomationRule {
    pub id: RuleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub trigger: TriggerConfig,
    pub action: ActionConfig,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl AutomationRule {
    #[must_use]
    pub fn trigger_type(&self) -> TriggerType {
        self.trigger.trigger_type()
    }

    #[must_use]
    pub fn action_type(&self) -> ActionType {
        self.action.action_type()
    }

    /// Create a rule for `tenant_id` from an already validated draft.
    #[must_use]
    pub fn from_definition(
        tenant_id: TenantId,
        definition: RuleDefinition,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: RuleId::new(),
            tenant_id,
            name: definition.name,
            trigger: definition.trigger,
            action: definition.action,
            is_active: definition.is_active,
            created_at,
        }
    }

    /// Decode a row image (as carried by a change event) into a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedRecord`] if the row is not a rule
    /// record, or the config validation errors of [`RuleDraft::validate`].
    pub fn from_record_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        let record: RuleRecord =
            serde_json::from_value(value).map_err(|err| ValidationError::MalformedRecord {
                entity: "automation_rule",
                reason: err.to_string(),
            })?;
        Self::try_from(record)
    }

    /// Encode the rule as its flat row image.
    #[must_use]
    pub fn to_record_json(&self) -> serde_json::Value {
        // The record only holds strings, bools, ids and JSON values.
        serde_json::to_value(RuleRecord::from(self.clone())).unwrap_or_default()
    }
}

/// Loosely-typed rule input, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub name: String,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: serde_json::Value,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_config: serde_json::Value,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A draft whose configs have been checked against their declared types.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    pub name: String,
    pub trigger: TriggerConfig,
    pub action: ActionConfig,
    pub is_active: bool,
}

impl RuleDraft {
    /// Check the name and read both configs as their declared variants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NameTooShort`] when the trimmed name is
    /// shorter than [`MIN_NAME_LEN`], or a config error from
    /// [`TriggerConfig::parse`] / [`ActionConfig::parse`].
    pub fn validate(self) -> Result<RuleDefinition, ValidationError> {
        let name = self.name.trim().to_string();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(ValidationError::NameTooShort { min: MIN_NAME_LEN });
        }
        let trigger = TriggerConfig::parse(self.trigger_type, self.trigger_config)?;
        let action = ActionConfig::parse(self.action_type, self.action_config)?;
        Ok(RuleDefinition {
            name,
            trigger,
            action,
            is_active: self.is_active,
        })
    }
}

/// Flat row image of a rule, matching the `automation_rules` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: RuleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: serde_json::Value,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_config: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl From<AutomationRule> for RuleRecord {
    fn from(rule: AutomationRule) -> Self {
        Self {
            id: rule.id,
            tenant_id: rule.tenant_id,
            trigger_type: rule.trigger_type(),
            trigger_config: rule.trigger.to_untagged(),
            action_type: rule.action_type(),
            action_config: rule.action.to_untagged(),
            name: rule.name,
            is_active: rule.is_active,
            created_at: rule.created_at,
        }
    }
}

impl TryFrom<RuleRecord> for AutomationRule {
    type Error = ValidationError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            tenant_id: record.tenant_id,
            name: record.name,
            trigger: TriggerConfig::parse(record.trigger_type, record.trigger_config)?,
            action: ActionConfig::parse(record.action_type, record.action_config)?,
            is_active: record.is_active,
            created_at: record.created_at,
        })
    }
}

/// Deserialize an untagged config object as the `kind` variant of `T`.
///
/// Keys outside `known` are refused rather than dropped, so a config written
/// for another type never passes as this one.
fn parse_tagged<T: DeserializeOwned>(
    field: &'static str,
    kind: &'static str,
    known: &[&str],
    value: serde_json::Value,
) -> Result<T, ValidationError> {
    let mut object = match value {
        serde_json::Value::Null => serde_json::Map::new(),
        serde_json::Value::Object(object) => object,
        other => {
            return Err(ValidationError::ConfigMismatch {
                field,
                kind,
                reason: format!("expected an object, got {other}"),
            });
        }
    };
    if let Some(unknown) = object.keys().find(|key| !known.contains(&key.as_str())) {
        return Err(ValidationError::ConfigMismatch {
            field,
            kind,
            reason: format!("unknown field `{unknown}`, expected one of {known:?}"),
        });
    }
    object.insert("type".to_string(), serde_json::Value::from(kind));
    serde_json::from_value(serde_json::Value::Object(object)).map_err(|err| {
        ValidationError::ConfigMismatch {
            field,
            kind,
            reason: err.to_string(),
        }
    })
}

/// Serialize a tagged config and drop its tag.
fn untagged<T: Serialize>(config: &T) -> serde_json::Value {
    match serde_json::to_value(config) {
        Ok(serde_json::Value::Object(mut object)) => {
            object.remove("type");
            serde_json::Value::Object(object)
        }
        _ => serde_json::Value::Object(serde_json::Map::new()),
    }
}
