//! `SQLite` implementation of [`TaskRepository`].

use sqlx::SqlitePool;

use minicrm_app::ports::TaskRepository;
use minicrm_domain::error::MiniCrmError;
use minicrm_domain::task::Task;

use crate::error::StorageError;

const INSERT: &str = r"
    INSERT INTO tasks (id, tenant_id, title, assignee, status, created_at)
    VALUES (?, ?, ?, ?, ?, ?)
";

/// `SQLite`-backed task repository.
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: Task) -> Result<Task, MiniCrmError> {
        sqlx::query(INSERT)
            .bind(task.id.as_uuid())
            .bind(task.tenant_id.as_uuid())
            .bind(&task.title)
            .bind(task.assignee.as_deref())
            .bind(task.status.as_str())
            .bind(crate::format_timestamp(task.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(task)
    }
}
