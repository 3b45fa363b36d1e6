//! Authentication extractor
//!
//! Extracts and validates JWT tokens from the Authorization header.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use folio_core::AuthContext;

use crate::response::ApiError;
use crate::state::AppState;

/// Caller identity for a request
///
/// No Authorization header yields [`AuthContext::Anonymous`]; the services
/// decide which operations need a signed-in caller. A header carrying a bad
/// or expired token is rejected outright.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(TypedHeader(Authorization(bearer))) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
        else {
            return Ok(Caller(AuthContext::Anonymous));
        };

        let app_state = AppState::from_ref(state);
        let actor = app_state
            .jwt_service()
            .authenticate(bearer.token())
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid access token");
                ApiError::InvalidToken
            })?;

        Ok(Caller(actor.into()))
    }
}
