// rest_api/src/extract.rs

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use lib::errors::PrescriptionError;
use models::Actor;
use security::AuthError;

use crate::errors::RestApiError;
use crate::AppState;

/// The admin named by the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        Ok(CurrentAdmin(state.auth.authenticate(token)?))
    }
}

/// `Json` with rejections reported in the API's error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(RestApiError))]
pub struct ApiJson<T>(pub T);

/// Ids that do not parse cannot name a stored record.
pub fn record_id(raw: &str, what: &str) -> Result<Uuid, RestApiError> {
    Uuid::parse_str(raw).map_err(|_| PrescriptionError::NotFound(format!("{} not found", what)).into())
}
