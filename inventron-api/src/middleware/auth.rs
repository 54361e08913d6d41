//! Session gateway for cookie-carried access tokens.
//!
//! The gateway never rejects a request. It resolves the `access_token`
//! cookie into an [`Identity`] when it can and leaves the request anonymous
//! otherwise; handlers that need a caller take [`AuthenticatedUser`], which
//! turns the missing identity into a 401.

use crate::auth::{Identity, TokenIssuer, TokenKind};
use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for the session gateway.
#[derive(Debug, Clone)]
pub struct SessionGatewayState {
    pub issuer: Arc<TokenIssuer>,
}

impl SessionGatewayState {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Attach the caller's identity to the request, or nothing.
///
/// An absent cookie, a garbled token, an expired token and a refresh token
/// in the access cookie all leave the request anonymous. Validation
/// failures are logged at debug level only.
pub async fn session_gateway(
    State(state): State<SessionGatewayState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = &state.issuer.config().cookies.access_cookie;
    let jar = CookieJar::from_headers(request.headers());

    if let Some(cookie) = jar.get(cookie_name) {
        match state.issuer.validate(cookie.value(), TokenKind::Access) {
            Ok(identity) => {
                tracing::Span::current().record("user_id", identity.user_id.0);
                request.extensions_mut().insert(identity);
            }
            Err(e) => {
                tracing::debug!(reason = %e.message, "Ignoring invalid session token");
            }
        }
    }

    next.run(request).await
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Extractor for the authenticated caller.
///
/// Rejects with `UNAUTHENTICATED` (401) when the gateway attached no
/// identity.
///
/// ```ignore
/// async fn list_items(AuthenticatedUser(identity): AuthenticatedUser) -> impl IntoResponse {
///     identity.username
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(ApiError::unauthenticated)
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
