use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures reported by the backend collaborator (document store or identity provider).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl BackendError {
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("backend request failed, please try again")]
    Backend(#[source] BackendError),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound { .. } => AppError::NotFound,
            other => AppError::Backend(other),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Backend(e) => tracing::error!("backend failure: {e}"),
            AppError::Anyhow(e) => tracing::error!("internal error: {e:#}"),
            _ => {}
        }

        let status = match &self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Backend(BackendError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            AppError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
