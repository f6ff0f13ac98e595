//! Change feed port — realtime row-change subscriptions.
//!
//! A subscription is scoped to one `(tenant, table)` pair and delivers
//! [`ChangeEvent`]s through a queue. Delivery is at-least-once; events of one
//! table arrive in order, events of different tables have no relative order.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use minicrm_domain::change::{ChangeEvent, ChangeOperation, Table};
use minicrm_domain::error::MiniCrmError;
use minicrm_domain::id::TenantId;

/// Opaque handle identifying one subscription, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live subscription: its handle and the queue its events arrive on.
///
/// The queue closes once the subscription is cancelled.
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

/// Source of change events.
pub trait ChangeFeed {
    /// Start receiving changes of `table` rows belonging to `tenant_id`.
    fn subscribe(&self, tenant_id: TenantId, table: Table) -> Subscription;

    /// Cancel a subscription. Unknown handles are ignored.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// Sink through which committed row changes are announced.
pub trait ChangePublisher {
    /// Deliver `event` to every matching subscription.
    fn publish(&self, event: ChangeEvent) -> impl Future<Output = Result<(), MiniCrmError>> + Send;
}

impl<T: ChangeFeed> ChangeFeed for Arc<T> {
    fn subscribe(&self, tenant_id: TenantId, table: Table) -> Subscription {
        (**self).subscribe(tenant_id, table)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        (**self).unsubscribe(handle);
    }
}

impl<T: ChangePublisher + Send + Sync> ChangePublisher for Arc<T> {
    fn publish(&self, event: ChangeEvent) -> impl Future<Output = Result<(), MiniCrmError>> + Send {
        (**self).publish(event)
    }
}

/// Per-operation callbacks over a change stream. Every callback defaults to
/// a no-op.
pub trait ChangeHandler {
    /// Called with the inserted row.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the row cannot be handled.
    fn on_insert(&self, _record: &serde_json::Value) -> Result<(), MiniCrmError> {
        Ok(())
    }

    /// Called with the updated row.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the row cannot be handled.
    fn on_update(&self, _record: &serde_json::Value) -> Result<(), MiniCrmError> {
        Ok(())
    }

    /// Called with the row as it was before deletion.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the row cannot be handled.
    fn on_delete(&self, _old_record: &serde_json::Value) -> Result<(), MiniCrmError> {
        Ok(())
    }
}

/// Invoke the callback of `handler` that matches the event's operation.
///
/// # Errors
///
/// Returns whatever the invoked callback returns.
pub fn route<H: ChangeHandler + ?Sized>(
    event: &ChangeEvent,
    handler: &H,
) -> Result<(), MiniCrmError> {
    match event.operation {
        ChangeOperation::Insert => handler.on_insert(&event.record),
        ChangeOperation::Update => handler.on_update(&event.record),
        ChangeOperation::Delete => handler.on_delete(&event.record),
    }
}
