use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Terminal failures surfaced verbatim to the caller. Nothing here is
/// retried by the engine; there is no transient class in this logic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// A business prerequisite is not met; the caller must fix the input.
    #[error("{0}")]
    Precondition(String),
    /// A structurally invalid cross-reference between entities.
    #[error("{0}")]
    Validation(String),
    /// Attempted mutation of a completed aggregate, or an unauthorized
    /// role change.
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0} does not exist")]
    NotFound(&'static str),
    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),
}

impl ServiceError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Precondition(_) => StatusCode::PRECONDITION_FAILED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::AccessDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
