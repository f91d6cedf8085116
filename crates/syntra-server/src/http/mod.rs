mod routes;

pub use routes::create_router;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use syntra_core::{ErrorKind, Syntra, SyntraError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub syntra: Arc<Syntra>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(syntra: Arc<Syntra>) -> Self {
        Self {
            syntra,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Error body: `{"detail": "..."}`
#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Error type for HTTP handlers. The status follows the error's kind.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    detail: String,
}

impl AppError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

impl From<SyntraError> for AppError {
    fn from(err: SyntraError) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Upstream | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match &err {
            SyntraError::NodeNotFound(_) => "Node not found".to_string(),
            SyntraError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }

        Self { status, detail }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
