//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the automation core and the outside world.
//! They are defined here (in `app`) so that both the core and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod automation_rule_repo;
pub mod change_feed;
pub mod execution_log_store;
pub mod task_repo;
pub mod webhook;

pub use automation_rule_repo::AutomationRuleRepository;
pub use change_feed::{ChangeFeed, ChangeHandler, ChangePublisher, Subscription, SubscriptionHandle};
pub use execution_log_store::ExecutionLogStore;
pub use task_repo::TaskRepository;
pub use webhook::{WebhookClient, WebhookRequest};
