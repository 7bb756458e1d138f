use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::normalize::InvalidFormat;
use crate::workflow_client::WorkflowError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Workflow(WorkflowError::Timeout(_)) => "WORKFLOW_TIMEOUT",
            AppError::Workflow(WorkflowError::ConnectionFailure(_)) => "WORKFLOW_UNREACHABLE",
            AppError::Workflow(WorkflowError::RequestFailed { .. }) => "WORKFLOW_REQUEST_FAILED",
            AppError::Workflow(WorkflowError::MalformedResponse(_)) => {
                "WORKFLOW_MALFORMED_RESPONSE"
            }
            AppError::InvalidFormat(_) => "INVALID_RESPONSE_FORMAT",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Workflow(e @ WorkflowError::Timeout(_)) => {
                tracing::warn!("Workflow timeout: {e}");
                (StatusCode::GATEWAY_TIMEOUT, e.to_string())
            }
            AppError::Workflow(e) => {
                tracing::error!("Workflow error: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::InvalidFormat(e) => {
                tracing::error!("{e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Unable to analyze resume. Please try again.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
