//! JSON REST handlers for a tenant's automation rules.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use minicrm_app::ports::{AutomationRuleRepository, ChangePublisher};
use minicrm_domain::automation::{AutomationRule, RuleDraft};
use minicrm_domain::error::ValidationError;
use minicrm_domain::id::RuleId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for activating or deactivating a rule.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<AutomationRule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<AutomationRule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the activation endpoint.
pub enum SetActiveResponse {
    NoContent,
}

impl IntoResponse for SetActiveResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/tenants/{tenant_id}/automations` — rules from the live mirror, newest first.
pub async fn list<R, P>(
    State(state): State<AppState<R, P>>,
    Path(tenant_id): Path<String>,
) -> Result<ListResponse, ApiError>
where
    R: AutomationRuleRepository + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync + 'static,
{
    let store = state.tenant(&tenant_id)?;
    Ok(ListResponse::Ok(Json(store.list())))
}

/// `POST /api/tenants/{tenant_id}/automations` — validate and persist a new rule.
///
/// The rule appears in the list once its change event has been mirrored.
pub async fn create<R, P>(
    State(state): State<AppState<R, P>>,
    Path(tenant_id): Path<String>,
    Json(draft): Json<RuleDraft>,
) -> Result<CreateResponse, ApiError>
where
    R: AutomationRuleRepository + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync + 'static,
{
    let store = state.tenant(&tenant_id)?;
    let rule = store.add(draft).await?;
    Ok(CreateResponse::Created(Json(rule)))
}

/// `PUT /api/tenants/{tenant_id}/automations/{id}/active` — toggle a rule.
pub async fn set_active<R, P>(
    State(state): State<AppState<R, P>>,
    Path((tenant_id, id)): Path<(String, String)>,
    Json(req): Json<SetActiveRequest>,
) -> Result<SetActiveResponse, ApiError>
where
    R: AutomationRuleRepository + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync + 'static,
{
    let store = state.tenant(&tenant_id)?;
    let id = RuleId::from_str(&id).map_err(|err| ValidationError::InvalidValue {
        field: "id",
        reason: err.to_string(),
    })?;
    store.toggle(id, req.is_active).await?;
    Ok(SetActiveResponse::NoContent)
}
