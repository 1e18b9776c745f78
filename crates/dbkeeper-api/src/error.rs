//! Error responses for the web frontend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dbkeeper_db::AuditError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The audit log could not be read
    #[error("Failed to fetch logs: {0}")]
    Audit(#[from] AuditError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("❌ {}", self);
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
