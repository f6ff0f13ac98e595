//! Change ingestion — the CRM database pushes committed row changes here.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use minicrm_app::ports::{AutomationRuleRepository, ChangePublisher};
use minicrm_domain::change::{ChangeEvent, ChangeOperation, Table};
use minicrm_domain::error::ValidationError;

use crate::error::ApiError;
use crate::state::AppState;

/// One row change, as sent by a database webhook.
#[derive(Debug, Deserialize)]
pub struct IngestChangeRequest {
    pub table: Table,
    pub operation: ChangeOperation,
    /// Post-change row image, or pre-delete image for deletes.
    pub record: serde_json::Value,
}

/// Possible responses from the ingest endpoint.
pub enum IngestResponse {
    Accepted,
}

impl IntoResponse for IngestResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `POST /api/tenants/{tenant_id}/changes` — publish a row change to the feed.
///
/// Only `customers` and `orders` changes are accepted; rule changes come
/// from the rule repository itself.
pub async fn ingest<R, P>(
    State(state): State<AppState<R, P>>,
    Path(tenant_id): Path<String>,
    Json(req): Json<IngestChangeRequest>,
) -> Result<IngestResponse, ApiError>
where
    R: AutomationRuleRepository + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync + 'static,
{
    let tenant_id = state.tenant(&tenant_id)?.tenant_id();
    if !matches!(req.table, Table::Customers | Table::Orders) {
        return Err(ValidationError::UnsupportedTable {
            table: req.table.to_string(),
        }
        .into());
    }

    let event = ChangeEvent::new(tenant_id, req.table, req.operation, req.record);
    state.publisher().publish(event).await?;
    tracing::debug!(%tenant_id, table = %req.table, operation = %req.operation, "change ingested");
    Ok(IngestResponse::Accepted)
}
