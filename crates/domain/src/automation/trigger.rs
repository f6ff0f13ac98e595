//! Trigger — the business event category that activates a rule.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::change::{ChangeEvent, ChangeOperation, Table};
use crate::error::ValidationError;

/// Category of business event a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    NewCustomer,
    CustomerStatusChange,
    HighValueOrder,
}

impl TriggerType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewCustomer => "new_customer",
            Self::CustomerStatusChange => "customer_status_change",
            Self::HighValueOrder => "high_value_order",
        }
    }

    /// Keys a config of this type may carry.
    #[must_use]
    pub fn config_fields(self) -> &'static [&'static str] {
        match self {
            Self::NewCustomer => &["tags"],
            Self::CustomerStatusChange => &["from", "to"],
            Self::HighValueOrder => &["threshold"],
        }
    }

    /// The trigger category a change event belongs to, if any.
    ///
    /// Only the table and operation are considered; the row content is not
    /// inspected.
    #[must_use]
    pub fn for_change(event: &ChangeEvent) -> Option<Self> {
        match (event.table, event.operation) {
            (Table::Customers, ChangeOperation::Insert) => Some(Self::NewCustomer),
            (Table::Customers, ChangeOperation::Update) => Some(Self::CustomerStatusChange),
            (Table::Orders, ChangeOperation::Insert) => Some(Self::HighValueOrder),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_customer" => Ok(Self::NewCustomer),
            "customer_status_change" => Ok(Self::CustomerStatusChange),
            "high_value_order" => Ok(Self::HighValueOrder),
            other => Err(ValidationError::UnknownVariant {
                field: "trigger_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Trigger-specific settings, one variant per [`TriggerType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    NewCustomer {
        /// Customer tags the rule is meant for.
        #[serde(default)]
        tags: Vec<String>,
    },
    CustomerStatusChange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
    HighValueOrder {
        /// Order total considered "high value".
        threshold: f64,
    },
}

impl TriggerConfig {
    #[must_use]
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            Self::NewCustomer { .. } => TriggerType::NewCustomer,
            Self::CustomerStatusChange { .. } => TriggerType::CustomerStatusChange,
            Self::HighValueOrder { .. } => TriggerType::HighValueOrder,
        }
    }

    /// Read an untagged JSON config as the variant for `trigger_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ConfigMismatch`] when the JSON does not have
    /// the declared variant's shape, or [`ValidationError::InvalidValue`] when
    /// a field value is out of range.
    pub fn parse(
        trigger_type: TriggerType,
        value: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        let config: Self = super::parse_tagged(
            "trigger_config",
            trigger_type.as_str(),
            trigger_type.config_fields(),
            value,
        )?;
        config.validate()?;
        Ok(config)
    }

    /// Check value-level constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] for a negative or non-finite
    /// order threshold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Self::HighValueOrder { threshold } = self {
            if !threshold.is_finite() || *threshold < 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: "trigger_config.threshold",
                    reason: format!("{threshold} is not a non-negative amount"),
                });
            }
        }
        Ok(())
    }

    /// The config as stored, without the variant tag.
    #[must_use]
    pub fn to_untagged(&self) -> serde_json::Value {
        super::untagged(self)
    }
}
