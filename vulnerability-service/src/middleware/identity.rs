//! Caller identity for protected routes.
//!
//! `identity_middleware` verifies the `Authorization` header and stores the
//! resulting [`IdentityContext`] in request extensions; handlers read it back
//! with the [`Identity`] extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::IdentityContext;
use crate::startup::AppState;

/// Middleware to require a valid access token.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing Authorization header")))?;

    let identity = state.tokens.verify(authorization).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        e
    })?;

    let span = tracing::Span::current();
    span.record("user_type", identity.user_type.as_str());
    if let Some(ref user_id) = identity.user_id {
        span.record("user_id", user_id.as_str());
    }

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extractor for the verified caller identity.
pub struct Identity(pub IdentityContext);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<IdentityContext>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Identity missing from request extensions"
            ))
        })?;

        Ok(Identity(identity.clone()))
    }
}
