//! Property-Based Tests for Session Enforcement
//!
//! For any request to a route that demands an identity, the route answers
//! 401 unless the access cookie carries an unexpired access token signed
//! with the server secret. A valid token always resolves to the user it
//! was issued for.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use inventron_api::{
    session_gateway, AuthConfig, AuthenticatedUser, JwtSecret, SessionGatewayState, TokenIssuer,
};
use inventron_core::{FixedClock, User, UserId};
use inventron_test_utils::fixtures::TEST_EPOCH;
use inventron_test_utils::generators::arb_garbage_token;
use proptest::prelude::*;
use tokio::runtime::Runtime;
use tower::ServiceExt;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

const SERVER_SECRET: &str = "property-test-secret-with-enough-length";
const FOREIGN_SECRET: &str = "some-other-service-secret-entirely-different";

fn issuer_with(secret: &str, now: i64) -> TokenIssuer {
    let config = AuthConfig {
        jwt_secret: JwtSecret::new(secret.to_string()).expect("test secret"),
        clock: Arc::new(FixedClock(now)),
        ..AuthConfig::default()
    };
    TokenIssuer::new(Arc::new(config))
}

/// Router with a single identity-gated route that echoes the username.
fn test_app() -> Router {
    let state = SessionGatewayState::new(Arc::new(issuer_with(SERVER_SECRET, TEST_EPOCH)));

    Router::new()
        .route(
            "/protected",
            get(|user: AuthenticatedUser| async move { user.username.clone() }),
        )
        .layer(middleware::from_fn_with_state(state, session_gateway))
}

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn test_user(id: i64, username: &str) -> User {
    User {
        id: UserId(id),
        username: username.to_string(),
        password_hash: String::new(),
        date_joined: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
    }
}

async fn call(cookie: Option<String>) -> Result<(StatusCode, String), String> {
    let mut builder = Request::builder().uri("/protected");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::empty()).map_err(|e| e.to_string())?;
    let response = test_app()
        .oneshot(request)
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| e.to_string())?;
    Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
}

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

/// Ways a request can fail to present a usable access token.
#[derive(Debug, Clone)]
enum BadSession {
    /// Random bytes in the access cookie
    Garbage(String),
    /// Well-formed token signed with a different secret
    ForeignSignature { user_id: i64 },
    /// Correctly signed token whose lifetime has passed
    Expired { user_id: i64, age_secs: i64 },
    /// Refresh token placed in the access cookie
    RefreshAsAccess { user_id: i64 },
    /// Valid token with one payload character flipped
    Tampered { user_id: i64, position: usize },
    /// Valid token under an unrelated cookie name
    WrongCookie { user_id: i64 },
    /// No cookie at all
    Missing,
}

fn bad_session_strategy() -> impl Strategy<Value = BadSession> {
    prop_oneof![
        arb_garbage_token().prop_map(BadSession::Garbage),
        (1i64..10_000).prop_map(|user_id| BadSession::ForeignSignature { user_id }),
        (1i64..10_000, 300i64..1_000_000)
            .prop_map(|(user_id, age_secs)| BadSession::Expired { user_id, age_secs }),
        (1i64..10_000).prop_map(|user_id| BadSession::RefreshAsAccess { user_id }),
        (1i64..10_000, any::<usize>())
            .prop_map(|(user_id, position)| BadSession::Tampered { user_id, position }),
        (1i64..10_000).prop_map(|user_id| BadSession::WrongCookie { user_id }),
        Just(BadSession::Missing),
    ]
}

fn bad_session_cookie(session: &BadSession) -> Result<Option<String>, TestCaseError> {
    let server = issuer_with(SERVER_SECRET, TEST_EPOCH);
    let issue = |issuer: &TokenIssuer, user_id: i64| {
        issuer
            .issue(&test_user(user_id, "propuser"))
            .map_err(|e| TestCaseError::fail(e.to_string()))
    };

    let cookie = match session {
        BadSession::Garbage(token) => Some(format!("access_token={token}")),
        BadSession::ForeignSignature { user_id } => {
            let pair = issue(&issuer_with(FOREIGN_SECRET, TEST_EPOCH), *user_id)?;
            Some(format!("access_token={}", pair.access_token))
        }
        BadSession::Expired { user_id, age_secs } => {
            let pair = issue(&issuer_with(SERVER_SECRET, TEST_EPOCH - age_secs), *user_id)?;
            Some(format!("access_token={}", pair.access_token))
        }
        BadSession::RefreshAsAccess { user_id } => {
            let pair = issue(&server, *user_id)?;
            Some(format!("access_token={}", pair.refresh_token))
        }
        BadSession::Tampered { user_id, position } => {
            let token = issue(&server, *user_id)?.access_token;
            Some(format!("access_token={}", tamper_payload(&token, *position)))
        }
        BadSession::WrongCookie { user_id } => {
            let pair = issue(&server, *user_id)?;
            Some(format!("session={}", pair.access_token))
        }
        BadSession::Missing => None,
    };
    Ok(cookie)
}

/// Flip one character inside the payload segment of a JWT.
fn tamper_payload(token: &str, position: usize) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    if let Some(payload) = parts.get_mut(1) {
        let mut chars: Vec<char> = payload.chars().collect();
        if !chars.is_empty() {
            let index = position % chars.len();
            chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
        }
        *payload = chars.into_iter().collect();
    }
    parts.join(".")
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any request without a usable access token is rejected with 401.
    #[test]
    fn prop_bad_sessions_are_rejected(session in bad_session_strategy()) {
        let rt = test_runtime()?;
        let cookie = bad_session_cookie(&session)?;

        let (status, _) = rt
            .block_on(call(cookie))
            .map_err(TestCaseError::fail)?;
        prop_assert_eq!(status, StatusCode::UNAUTHORIZED, "session: {:?}", session);
    }

    /// A token issued for a user is accepted until it expires and resolves
    /// to that user.
    #[test]
    fn prop_valid_access_token_resolves_identity(
        user_id in 1i64..1_000_000,
        username in "[a-z][a-z0-9_]{2,20}",
        age_secs in 0i64..300,
    ) {
        let rt = test_runtime()?;
        let issuer = issuer_with(SERVER_SECRET, TEST_EPOCH - age_secs);
        let pair = issuer
            .issue(&test_user(user_id, &username))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let (status, body) = rt
            .block_on(call(Some(format!("access_token={}", pair.access_token))))
            .map_err(TestCaseError::fail)?;
        prop_assert_eq!(status, StatusCode::OK);
        prop_assert_eq!(body, username);
    }
}
