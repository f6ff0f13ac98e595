//! Change events — row-level notifications from the external store.
//!
//! A [`ChangeEvent`] is ephemeral: it is delivered by the change feed,
//! consumed once by the automation engine, and never persisted.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::TenantId;

/// Tables whose changes the automation core can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    AutomationRules,
    Customers,
    Orders,
    Tasks,
}

impl Table {
    /// Table name as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutomationRules => "automation_rules",
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::Tasks => "tasks",
        }
    }

    /// Name of a single row of this table, used as the dispatch context key.
    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::AutomationRules => "automation_rule",
            Self::Customers => "customer",
            Self::Orders => "order",
            Self::Tasks => "task",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automation_rules" => Ok(Self::AutomationRules),
            "customers" => Ok(Self::Customers),
            "orders" => Ok(Self::Orders),
            "tasks" => Ok(Self::Tasks),
            other => Err(ValidationError::UnknownVariant {
                field: "table",
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// A row was inserted, updated, or deleted in one tenant's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub operation: ChangeOperation,
    pub tenant_id: TenantId,
    /// Post-change row image for insert/update, pre-delete image for delete.
    pub record: serde_json::Value,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        table: Table,
        operation: ChangeOperation,
        record: serde_json::Value,
    ) -> Self {
        Self {
            table,
            operation,
            tenant_id,
            record,
        }
    }

    #[must_use]
    pub fn insert(tenant_id: TenantId, table: Table, record: serde_json::Value) -> Self {
        Self::new(tenant_id, table, ChangeOperation::Insert, record)
    }

    #[must_use]
    pub fn update(tenant_id: TenantId, table: Table, record: serde_json::Value) -> Self {
        Self::new(tenant_id, table, ChangeOperation::Update, record)
    }

    #[must_use]
    pub fn delete(tenant_id: TenantId, table: Table, record: serde_json::Value) -> Self {
        Self::new(tenant_id, table, ChangeOperation::Delete, record)
    }

    /// Snapshot handed to actions, keyed by the singular table name
    /// (e.g. `{"customer": {...}}`).
    #[must_use]
    pub fn context(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(1);
        map.insert(self.table.singular().to_string(), self.record.clone());
        serde_json::Value::Object(map)
    }
}
