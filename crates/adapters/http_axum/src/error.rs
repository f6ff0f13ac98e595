//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use minicrm_domain::error::MiniCrmError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`MiniCrmError`] to an HTTP response with appropriate status code.
///
/// Client errors carry their message; server-side failures are logged and
/// answered with a generic body.
#[derive(Debug)]
pub struct ApiError(MiniCrmError);

impl<E: Into<MiniCrmError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MiniCrmError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            MiniCrmError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            MiniCrmError::Persistence(err) => {
                tracing::error!(error = %err, "persistence error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            MiniCrmError::Http(err) => {
                tracing::error!(error = %err, "outbound http error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
