//! API error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tally_io::IoError;
use tally_recon::{Dataset, ReconError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Upload parsed but was rejected by cleaning or validation.
    #[error(transparent)]
    Data(#[from] ReconError),

    /// Upload is not a readable CSV table.
    #[error(transparent)]
    Csv(#[from] IoError),

    /// Multipart body is malformed or lacks the `file` field.
    #[error("invalid upload: {0}")]
    Upload(String),

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("{0} have not been uploaded to this session")]
    MissingDataset(Dataset),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Data(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Csv(_) | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MissingDataset(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable tag for the `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Data(e) => e.kind(),
            ApiError::Csv(e) => e.kind(),
            ApiError::Upload(_) => "invalid_upload",
            ApiError::SessionNotFound(_) => "session_not_found",
            ApiError::MissingDataset(_) => "missing_dataset",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                "An internal error occurred".to_string()
            }
            ApiError::Data(e) => {
                tracing::info!(kind = e.kind(), "upload rejected: {}", e);
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "status": status.as_u16(),
                "kind": self.kind(),
            }
        }));

        (status, body).into_response()
    }
}
