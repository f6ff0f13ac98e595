//! # minicrm-app
//!
//! Application layer — the automation core and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRuleRepository` — persist and list rules, toggle `is_active`
//!   - `TaskRepository` — insert tasks created by automations
//!   - `ExecutionLogStore` — append audit entries
//!   - `WebhookClient` — send outbound webhook requests
//!   - `ChangeFeed` / `ChangePublisher` — realtime row-change subscriptions
//! - Provide the automation core:
//!   - `RuleStore` — per-tenant live mirror of the rule set
//!   - `rule_matcher` — select active rules for a change event
//!   - `ActionDispatcher` — run one rule's action and audit the outcome
//!   - `ExecutionLogger` — write-only audit trail, never fails its caller
//!   - `AutomationEngine` — subscribe → match → dispatch, per tenant
//! - Provide **in-process infrastructure** (`InProcessChangeFeed`) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `minicrm-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod action_dispatcher;
pub mod automation_engine;
pub mod change_feed;
pub mod execution_logger;
pub mod ports;
pub mod rule_matcher;
pub mod rule_store;
