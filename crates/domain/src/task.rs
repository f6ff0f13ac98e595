//! Task — a to-do item, created by users or by `create_task` automations.

use serde::{Deserialize, Serialize};

use crate::id::{TaskId, TenantId};
use crate::time::Timestamp;

/// Workflow state of a [`Task`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task row in the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub tenant_id: TenantId,
    pub title: String,
    pub assignee: Option<String>,
    pub status: TaskStatus,
    pub created_at: Timestamp,
}

impl Task {
    /// A new `pending` task stamped with `created_at`.
    #[must_use]
    pub fn pending(
        tenant_id: TenantId,
        title: impl Into<String>,
        assignee: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: TaskId::new(),
            tenant_id,
            title: title.into(),
            assignee,
            status: TaskStatus::Pending,
            created_at,
        }
    }
}
