//! In-process change feed backed by tokio unbounded mpsc channels.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use minicrm_domain::change::{ChangeEvent, Table};
use minicrm_domain::error::MiniCrmError;
use minicrm_domain::id::TenantId;

use crate::ports::{ChangeFeed, ChangePublisher, Subscription, SubscriptionHandle};

struct Subscriber {
    tenant_id: TenantId,
    table: Table,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// Change feed living in the same process as its publishers.
///
/// Each subscription gets its own queue, so per-table ordering is the
/// publish order. Publishing succeeds even when nobody listens (the event
/// is simply dropped), and only reaches subscriptions whose tenant and
/// table equal the event's.
#[derive(Default)]
pub struct InProcessChangeFeed {
    next_handle: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionHandle, Subscriber>>,
}

impl InProcessChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn deliver(&self, event: &ChangeEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0;
        // receivers dropped without unsubscribing are pruned here
        subscribers.retain(|_, sub| {
            if sub.tenant_id != event.tenant_id || sub.table != event.table {
                return true;
            }
            if sub.sender.send(event.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                false
            }
        });
        delivered
    }
}

impl ChangeFeed for InProcessChangeFeed {
    fn subscribe(&self, tenant_id: TenantId, table: Table) -> Subscription {
        let handle = SubscriptionHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                handle,
                Subscriber {
                    tenant_id,
                    table,
                    sender,
                },
            );
        tracing::debug!(%handle, %tenant_id, %table, "subscribed to change feed");
        Subscription { handle, receiver }
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let removed = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if removed.is_some() {
            tracing::debug!(%handle, "unsubscribed from change feed");
        }
    }
}

impl ChangePublisher for InProcessChangeFeed {
    fn publish(&self, event: ChangeEvent) -> impl Future<Output = Result<(), MiniCrmError>> + Send {
        let delivered = self.deliver(&event);
        tracing::trace!(
            table = %event.table,
            operation = %event.operation,
            tenant_id = %event.tenant_id,
            delivered,
            "published change event"
        );
        async { Ok(()) }
    }
}
