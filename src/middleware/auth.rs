use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{AuthError, Principal};
use crate::error::ApiError;

/// JWT authentication middleware for everything under `/api`.
///
/// Runs before any handler, so a missing or bad token never reaches
/// business logic or the store. On success the verified [`Principal`] is
/// placed in the request extensions.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = {
        let header = match request.headers().get(AUTHORIZATION) {
            None => None,
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| AuthError::InvalidCredential("non-visible characters in header".to_string()))?,
            ),
        };
        state.verifier.verify_header(header)?
    };

    tracing::debug!(
        "Authenticated '{}' as '{}' (token expires {})",
        principal.subject,
        principal.role,
        principal.expires_at
    );

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Handlers take `Principal` as an argument; it is only present behind
/// [`jwt_auth_middleware`].
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            tracing::error!("Principal requested on a route without jwt_auth_middleware");
            ApiError::unauthorized()
        })
    }
}
