//! Execution log store port — append-only audit persistence.

use std::future::Future;
use std::sync::Arc;

use minicrm_domain::error::MiniCrmError;
use minicrm_domain::execution_log::ExecutionLogEntry;

/// Append-only sink for [`ExecutionLogEntry`] rows. Entries are never read
/// back by the automation core.
pub trait ExecutionLogStore {
    fn append(
        &self,
        entry: ExecutionLogEntry,
    ) -> impl Future<Output = Result<(), MiniCrmError>> + Send;
}

impl<T: ExecutionLogStore + Send + Sync> ExecutionLogStore for Arc<T> {
    fn append(
        &self,
        entry: ExecutionLogEntry,
    ) -> impl Future<Output = Result<(), MiniCrmError>> + Send {
        (**self).append(entry)
    }
}
