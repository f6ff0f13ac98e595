//! # minicrm-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API over each tenant's automation rules
//!   (`/api/tenants/{tenant_id}/automations`, …)
//! - Accept row changes pushed by the CRM database
//!   (`/api/tenants/{tenant_id}/changes`) and hand them to the change feed
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `minicrm-app` (for port traits and the rule store) and
//! `minicrm-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
