//! HTTP error mapping.
//!
//! Every failing handler answers `{"success": false, "message": ...}` with a
//! status code picked from the error kind.

use aarakshan_core::PortalError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error("too many login attempts, try again in a minute")]
    RateLimited,

    #[error("admin key missing or wrong")]
    AdminKey,

    #[error("{0}")]
    BadRequest(String),

    /// Body, path or query that could not be parsed.
    #[error("{message}")]
    Malformed { status: StatusCode, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Portal(err) => match err {
                PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
                PortalError::Conflict(_) => StatusCode::CONFLICT,
                PortalError::Store(_) if err.is_conflict() => StatusCode::CONFLICT,
                PortalError::Validation(_) => StatusCode::BAD_REQUEST,
                PortalError::Unauthorized | PortalError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
                PortalError::Workflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PortalError::Store(_) | PortalError::Password(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::AdminKey => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Malformed { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client. Internal failures are logged, not echoed.
    pub(crate) fn message(&self) -> String {
        match self {
            ApiError::Portal(PortalError::InvalidCredentials) => "Invalid credentials".into(),
            _ if self.status().is_server_error() => "internal server error".into(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        let body = json!({ "success": false, "message": self.message() });
        (status, Json(body)).into_response()
    }
}
