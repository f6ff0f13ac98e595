//! `SQLite` implementation of [`ExecutionLogStore`].

use sqlx::SqlitePool;

use minicrm_app::ports::ExecutionLogStore;
use minicrm_domain::error::MiniCrmError;
use minicrm_domain::execution_log::ExecutionLogEntry;

use crate::error::StorageError;

const INSERT: &str = r"
    INSERT INTO automation_logs
        (id, tenant_id, rule_id, action_type, context, success, error, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

/// Append-only `automation_logs` writer.
pub struct SqliteExecutionLogStore {
    pool: SqlitePool,
}

impl SqliteExecutionLogStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ExecutionLogStore for SqliteExecutionLogStore {
    async fn append(&self, entry: ExecutionLogEntry) -> Result<(), MiniCrmError> {
        let context = serde_json::to_string(&entry.context).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(entry.id.as_uuid())
            .bind(entry.tenant_id.as_uuid())
            .bind(entry.rule_id.as_uuid())
            .bind(entry.action_type.as_str())
            .bind(&context)
            .bind(entry.success)
            .bind(entry.error.as_deref())
            .bind(crate::format_timestamp(entry.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
