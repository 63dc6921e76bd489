//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it through the
//! configured `IdentityProvider`, and injects `OwnerContext` into request
//! extensions for downstream handlers.

use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, OwnerContext};

/// Require a bearer token that maps to a known owner.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_owner(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_owner_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_owner_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?;

    let owner_id = ctx.identity.resolve(token).ok_or_else(|| {
        tracing::debug!("Rejected unknown bearer token");
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(OwnerContext { owner_id });

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<axum::body::Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
