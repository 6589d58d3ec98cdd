use crate::api::AppState;
use crate::domain::user::Identity;
use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Request, header, request::Parts},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// An authenticated request peer, extracted from the bearer token.
#[derive(Debug)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::Unauthenticated)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthenticated)?;
        let token = auth_str.strip_prefix("Bearer ").ok_or(AppError::Unauthenticated)?;

        let identity = state.identity_service.verify(token)?;

        Ok(Self(identity))
    }
}

/// Propagates an incoming `x-request-id`, minting a UUID when absent.
#[derive(Clone, Copy, Debug)]
pub struct MakeRequestUuidOrHeader;

impl MakeRequestId for MakeRequestUuidOrHeader {
    fn make_request_id<B>(&mut self, request: &Request<B>) -> Option<RequestId> {
        request.headers().get("x-request-id").map_or_else(
            || HeaderValue::from_str(&Uuid::new_v4().to_string()).ok().map(RequestId::new),
            |header| Some(RequestId::new(header.clone())),
        )
    }
}
