// rest_api/src/errors.rs

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use lib::errors::PrescriptionError;
use security::AuthError;

#[derive(Debug, Error)]
pub enum RestApiError {
    #[error(transparent)]
    Prescription(#[from] PrescriptionError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<JsonRejection> for RestApiError {
    fn from(rejection: JsonRejection) -> Self {
        RestApiError::InvalidInput(rejection.body_text())
    }
}

fn prescription_status(err: &PrescriptionError) -> StatusCode {
    match err {
        PrescriptionError::Validation(_) | PrescriptionError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
        PrescriptionError::Permission(_) | PrescriptionError::EditWindowExpired { .. } => StatusCode::FORBIDDEN,
        PrescriptionError::NotFound(_) => StatusCode::NOT_FOUND,
        PrescriptionError::VersionConflict { .. } => StatusCode::CONFLICT,
        PrescriptionError::Render(_)
        | PrescriptionError::Storage(_)
        | PrescriptionError::Database(_)
        | PrescriptionError::Serialization(_)
        | PrescriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl RestApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestApiError::Prescription(e) => prescription_status(e),
            RestApiError::Auth(AuthError::Storage(e)) => prescription_status(e),
            RestApiError::Auth(AuthError::InvalidCredentials) => StatusCode::BAD_REQUEST,
            RestApiError::Auth(AuthError::MissingToken) => StatusCode::UNAUTHORIZED,
            RestApiError::Auth(AuthError::InvalidToken(_)) => StatusCode::FORBIDDEN,
            RestApiError::Auth(AuthError::Jwt(_) | AuthError::PasswordHash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            RestApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            // Token details stay in the log.
            RestApiError::Auth(AuthError::InvalidToken(_)) => "Invalid or expired token".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}
