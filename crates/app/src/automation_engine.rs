//! Automation engine — reacts to change events by dispatching matching rules.
//!
//! One engine runs per tenant. It keeps its [`RuleStore`] live from the
//! `automation_rules` stream and, for each `customers` / `orders` event,
//! dispatches every matching active rule.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;

use minicrm_domain::change::{ChangeEvent, Table};
use minicrm_domain::execution_log::Outcome;
use minicrm_domain::id::RuleId;

use crate::action_dispatcher::ActionDispatcher;
use crate::ports::{ChangeFeed, ExecutionLogStore, TaskRepository, WebhookClient};
use crate::rule_matcher::match_rules;
use crate::rule_store::RuleStore;

/// Tables whose events can trigger rules.
const TRIGGER_TABLES: [Table; 2] = [Table::Customers, Table::Orders];

/// Result of dispatching one matched rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub rule_id: RuleId,
    pub outcome: Outcome,
}

/// Subscribe → match → dispatch loop of one tenant.
pub struct AutomationEngine<R, T, W, L> {
    store: Arc<RuleStore<R>>,
    dispatcher: Arc<ActionDispatcher<T, W, L>>,
}

impl<R, T, W, L> Clone for AutomationEngine<R, T, W, L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<R, T, W, L> AutomationEngine<R, T, W, L>
where
    T: TaskRepository,
    W: WebhookClient,
    L: ExecutionLogStore,
{
    pub fn new(store: Arc<RuleStore<R>>, dispatcher: Arc<ActionDispatcher<T, W, L>>) -> Self {
        Self { store, dispatcher }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<RuleStore<R>> {
        &self.store
    }

    /// Dispatch every active rule matching `event`, one after the other.
    ///
    /// A failed dispatch does not stop the batch; its outcome is reported
    /// like any other.
    #[tracing::instrument(
        skip_all,
        fields(tenant_id = %event.tenant_id, table = %event.table, operation = %event.operation)
    )]
    pub async fn handle_event(&self, event: &ChangeEvent) -> Vec<DispatchReport> {
        let rules = self.store.active_rules();
        let matched = match_rules(event, &rules);
        if matched.is_empty() {
            tracing::debug!("no rule matches change event");
            return Vec::new();
        }

        let context = event.context();
        let mut reports = Vec::with_capacity(matched.len());
        for rule in matched {
            let outcome = match self.dispatcher.dispatch(rule, &context).await {
                Ok(outcome) => {
                    tracing::info!(
                        rule_id = %rule.id,
                        rule_name = %rule.name,
                        "automation executed"
                    );
                    outcome
                }
                Err(err) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        rule_name = %rule.name,
                        error = %err,
                        "automation failed"
                    );
                    Outcome::failed(err.to_string())
                }
            };
            reports.push(DispatchReport {
                rule_id: rule.id,
                outcome,
            });
        }
        reports
    }
}

impl<R, T, W, L> AutomationEngine<R, T, W, L>
where
    R: Send + Sync + 'static,
    T: TaskRepository + Send + Sync + 'static,
    W: WebhookClient + Send + Sync + 'static,
    L: ExecutionLogStore + Send + Sync + 'static,
{
    /// Run until `shutdown` resolves.
    ///
    /// Rule events are applied to the store in stream order, on this task.
    /// Each trigger event is handled on its own task. On shutdown every
    /// subscription is cancelled and in-flight dispatches are awaited.
    pub async fn run<F>(self, feed: F, shutdown: impl Future<Output = ()> + Send)
    where
        F: ChangeFeed,
    {
        let tenant_id = self.store.tenant_id();
        let mut rule_changes = feed.subscribe(tenant_id, Table::AutomationRules);
        let [mut customers, mut orders] =
            TRIGGER_TABLES.map(|table| feed.subscribe(tenant_id, table));
        let handles = [rule_changes.handle, customers.handle, orders.handle];
        tracing::info!(%tenant_id, "automation engine started");

        let mut in_flight = JoinSet::new();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                Some(event) = rule_changes.receiver.recv() => {
                    if let Err(err) = self.store.apply(&event) {
                        tracing::warn!(%tenant_id, error = %err, "failed to apply rule change");
                    }
                }
                Some(event) = customers.receiver.recv() => {
                    self.spawn_dispatch(&mut in_flight, event);
                }
                Some(event) = orders.receiver.recv() => self.spawn_dispatch(&mut in_flight, event),
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => log_join(joined),
            }
        }

        for handle in handles {
            feed.unsubscribe(handle);
        }
        let pending = in_flight.len();
        if pending > 0 {
            tracing::info!(%tenant_id, pending, "waiting for in-flight automations");
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        tracing::info!(%tenant_id, "automation engine stopped");
    }

    fn spawn_dispatch(&self, in_flight: &mut JoinSet<()>, event: ChangeEvent) {
        let engine = self.clone();
        in_flight.spawn(async move {
            engine.handle_event(&event).await;
        });
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        tracing::error!(error = %err, "automation task aborted");
    }
}
