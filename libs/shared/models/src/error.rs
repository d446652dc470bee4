use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Transport-level error shared by every cell. Cells keep their own error
/// enums and fold them into this at the handler boundary; the JSON body
/// shape `{ "error": ... }` is the same across the whole API.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid bearer token, or a caller reaching for a
    /// resource that belongs to someone else.
    #[error("Unauthorized: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input: unparseable timestamps, bad sort criteria,
    /// an appointment window that ends before it starts.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Input that parsed fine but breaks a domain rule, like a rating
    /// outside 1-5 or rating an appointment that has not finished.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested slot collides with an existing booking or a declared
    /// busy interval.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A webhook whose signature did not verify. Returned before any
    /// payload is trusted.
    #[error("Signature rejected: {0}")]
    SignatureRejected(String),

    /// The payment, meeting or mail collaborator failed or answered
    /// garbage.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Store failure: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::SignatureRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::SignatureRejected(msg)
            | AppError::Upstream(msg)
            | AppError::Store(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        // Client mistakes are routine; only the 5xx family pages anyone.
        if status.is_server_error() {
            tracing::error!("{}: {}", status, message);
        } else {
            tracing::warn!("{}: {}", status, message);
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
