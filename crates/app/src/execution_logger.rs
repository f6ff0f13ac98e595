//! Execution logger — writes one audit entry per dispatch attempt.

use minicrm_domain::automation::ActionType;
use minicrm_domain::execution_log::{ExecutionLogEntry, Outcome};
use minicrm_domain::id::{RuleId, TenantId};

use crate::ports::ExecutionLogStore;

/// Write-only audit trail over an [`ExecutionLogStore`].
///
/// A failed write is reported through `tracing` and otherwise swallowed: by
/// the time it is recorded, the action's side effect has already happened.
pub struct ExecutionLogger<L> {
    store: L,
}

impl<L: ExecutionLogStore> ExecutionLogger<L> {
    pub fn new(store: L) -> Self {
        Self { store }
    }

    /// Append an entry and wait for the write to finish.
    pub async fn record(
        &self,
        tenant_id: TenantId,
        rule_id: RuleId,
        action_type: ActionType,
        context: serde_json::Value,
        outcome: Outcome,
    ) {
        let entry = ExecutionLogEntry::new(
            tenant_id,
            rule_id,
            action_type,
            context,
            outcome,
            minicrm_domain::time::now(),
        );
        let entry_id = entry.id;
        if let Err(err) = self.store.append(entry).await {
            tracing::warn!(
                error = %err,
                %entry_id,
                %tenant_id,
                %rule_id,
                %action_type,
                "failed to write automation log entry"
            );
        }
    }
}
