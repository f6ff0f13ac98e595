//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod automations;
#[allow(clippy::missing_errors_doc)]
pub mod changes;

use axum::Router;
use axum::routing::{get, post, put};

use minicrm_app::ports::{AutomationRuleRepository, ChangePublisher};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, P>() -> Router<AppState<R, P>>
where
    R: AutomationRuleRepository + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/tenants/{tenant_id}/automations",
            get(automations::list::<R, P>).post(automations::create::<R, P>),
        )
        .route(
            "/tenants/{tenant_id}/automations/{id}/active",
            put(automations::set_active::<R, P>),
        )
        .route("/tenants/{tenant_id}/changes", post(changes::ingest::<R, P>))
}
