//! # minicrm-domain
//!
//! Pure domain model for the minicrm automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error taxonomy, timestamps
//! - Define **Automation rules** (trigger type + config → action type + config)
//! - Define **Change events** (row-level insert/update/delete notifications)
//! - Define **Tasks** created by automations
//! - Define **Execution log entries** and dispatch **outcomes**
//! - Contain all invariant enforcement (rule drafts are validated here)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod change;
pub mod execution_log;
pub mod task;
