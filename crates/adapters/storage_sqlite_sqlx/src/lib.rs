//! # minicrm-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `minicrm-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Announce committed `automation_rules` writes on the change feed
//!
//! Every row carries a `tenant_id` and every query filters on it.
//!
//! ## Dependency rule
//! Depends on `minicrm-app` (for port traits) and `minicrm-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

#[allow(clippy::missing_errors_doc)]
pub mod automation_rule_repo;
pub mod error;
#[allow(clippy::missing_errors_doc)]
pub mod execution_log_store;
pub mod pool;
#[allow(clippy::missing_errors_doc)]
pub mod task_repo;

pub use automation_rule_repo::SqliteAutomationRuleRepository;
pub use execution_log_store::SqliteExecutionLogStore;
pub use pool::{Config, Database};
pub use task_repo::SqliteTaskRepository;

/// Render a timestamp the way every `created_at` column stores it.
///
/// Fixed precision and a `Z` suffix keep lexical and chronological order
/// the same, so `ORDER BY created_at` sorts correctly.
fn format_timestamp(ts: minicrm_domain::time::Timestamp) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<minicrm_domain::time::Timestamp, sqlx::Error> {
    minicrm_domain::time::parse_rfc3339(value).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}
