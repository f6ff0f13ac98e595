//! Execution log — the append-only audit trail of action dispatches.

use serde::{Deserialize, Serialize};

use crate::automation::ActionType;
use crate::id::{LogEntryId, RuleId, TenantId};
use crate::time::Timestamp;

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    /// Build an outcome from a dispatch result, using the error's message.
    #[must_use]
    pub fn from_result<T, E: std::fmt::Display>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::succeeded(),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

/// One audit row in `automation_logs`. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: LogEntryId,
    pub tenant_id: TenantId,
    pub rule_id: RuleId,
    pub action_type: ActionType,
    /// Snapshot of the data that triggered the action.
    pub context: serde_json::Value,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: Timestamp,
}

impl ExecutionLogEntry {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        rule_id: RuleId,
        action_type: ActionType,
        context: serde_json::Value,
        outcome: Outcome,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: LogEntryId::new(),
            tenant_id,
            rule_id,
            action_type,
            context,
            success: outcome.success,
            error: outcome.error,
            created_at,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        Outcome {
            success: self.success,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_successful_outcome_from_ok() {
        let result: Result<(), String> = Ok(());
        assert_eq!(Outcome::from_result(&result), Outcome::succeeded());
    }

    #[test]
    fn should_carry_error_message_from_err() {
        let result: Result<(), String> = Err("constraint violation".to_string());
        let outcome = Outcome::from_result(&result);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("constraint violation"));
    }

    #[test]
    fn should_copy_outcome_into_entry() {
        let entry = ExecutionLogEntry::new(
            TenantId::new(),
            RuleId::new(),
            ActionType::Webhook,
            serde_json::json!({"order": {"total": 10}}),
            Outcome::failed("Webhook failed: Bad Gateway"),
            crate::time::now(),
        );
        assert!(!entry.success);
        assert_eq!(entry.outcome(), Outcome::failed("Webhook failed: Bad Gateway"));
    }
}
