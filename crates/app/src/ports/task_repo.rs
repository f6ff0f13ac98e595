//! Task repository port.

use std::future::Future;
use std::sync::Arc;

use minicrm_domain::error::MiniCrmError;
use minicrm_domain::task::Task;

/// Write access to the `tasks` table.
pub trait TaskRepository {
    /// Insert a task row. The task carries its own `tenant_id`.
    fn insert(&self, task: Task) -> impl Future<Output = Result<Task, MiniCrmError>> + Send;
}

impl<T: TaskRepository + Send + Sync> TaskRepository for Arc<T> {
    fn insert(&self, task: Task) -> impl Future<Output = Result<Task, MiniCrmError>> + Send {
        (**self).insert(task)
    }
}
