use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use performance::PerformanceError;
use serde_json::json;
use thiserror::Error;
use tracing;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Performance error: {0}")]
    Performance(#[from] PerformanceError),
}

/// Converts our custom `AppError` into an HTTP response. Client mistakes get
/// their message back; upstream and integrity failures are logged with
/// structure and masked.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Performance(err) = self;
        let (status, error_message) = match err {
            PerformanceError::InvalidArgument(message) => (StatusCode::BAD_REQUEST, message),
            PerformanceError::Upstream(db_err) => {
                tracing::error!(error = ?db_err, "Store error.");
                (
                    StatusCode::BAD_GATEWAY,
                    "The market store is unavailable".to_string(),
                )
            }
            PerformanceError::DataIntegrity(message) => {
                tracing::error!(error = %message, "Anchor resolution error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Anchor resolution returned incomplete data".to_string(),
                )
            }
            PerformanceError::DeadlineExceeded(deadline) => {
                tracing::error!(deadline = ?deadline, "Request deadline exceeded.");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "The request exceeded its deadline".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
