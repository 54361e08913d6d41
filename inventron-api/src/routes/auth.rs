//! Authentication REST API Routes
//!
//! Registration, login and logout. Login hands the token pair to the
//! browser as HttpOnly cookies; logout tells the browser to drop them.
//! None of these routes require an identity.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use inventron_core::{
    validate_credentials, InventronError, StorageError, ValidationError, ValidationErrors,
};
use inventron_storage::UserStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    auth::{hash_password, run_blocking, verify_password, CookieSettings, TokenIssuer},
    error::{ApiError, ApiResult},
    extractors::JsonBody,
};

// ============================================================================
// TYPES
// ============================================================================

/// Username/password pair for register and login.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for auth routes.
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserStore>,
    pub issuer: Arc<TokenIssuer>,
}

impl AuthState {
    pub fn new(users: Arc<dyn UserStore>, issuer: Arc<TokenIssuer>) -> Self {
        Self { users, issuer }
    }
}

// ============================================================================
// COOKIES
// ============================================================================

fn session_cookie(name: &str, value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    cookie.make_removal();
    cookie
}

fn clear_session(jar: CookieJar, cookies: &CookieSettings) -> CookieJar {
    jar.add(removal_cookie(&cookies.access_cookie))
        .add(removal_cookie(&cookies.refresh_cookie))
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/auth/register - Create a user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid credentials or username taken", body = ApiError),
    ),
)]
pub async fn register(
    State(state): State<AuthState>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let (username, password) = match (req.username, req.password) {
        (Some(username), Some(password)) => (username, password),
        (username, password) => {
            let mut errors = ValidationErrors::new();
            if username.is_none() {
                errors.push(ValidationError::missing("username"));
            }
            if password.is_none() {
                errors.push(ValidationError::missing("password"));
            }
            return Err(ApiError::validation_failed(&errors));
        }
    };

    let username = validate_credentials(&username, &password)?;
    if state.users.find_by_username(&username).await?.is_some() {
        return Err(ApiError::username_taken());
    }

    let password_hash = run_blocking(move || hash_password(&password)).await??;
    let user = state
        .users
        .create(&username, &password_hash)
        .await
        .map_err(|e| match e {
            InventronError::Storage(StorageError::UniqueViolation { .. }) => {
                ApiError::username_taken()
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");
    Ok((
        StatusCode::CREATED,
        MessageResponse::new("User registered successfully!"),
    ))
}

/// POST /api/auth/login - Exchange credentials for session cookies
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Logged in; access and refresh cookies set", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = ApiError),
    ),
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(username), Some(password)) = (req.username, req.password) else {
        return Err(ApiError::invalid_credentials());
    };

    let Some(user) = state.users.find_by_username(username.trim()).await? else {
        tracing::debug!("Login rejected: unknown username");
        return Err(ApiError::invalid_credentials());
    };

    let stored_hash = user.password_hash.clone();
    if !run_blocking(move || verify_password(&password, &stored_hash)).await? {
        tracing::debug!(user_id = %user.id, "Login rejected: password mismatch");
        return Err(ApiError::invalid_credentials());
    }

    let pair = state.issuer.issue(&user)?;
    let config = state.issuer.config();
    let cookies = &config.cookies;
    let jar = jar
        .add(session_cookie(
            &cookies.access_cookie,
            pair.access_token,
            config.access_token_ttl_secs,
            cookies.secure,
        ))
        .add(session_cookie(
            &cookies.refresh_cookie,
            pair.refresh_token,
            config.refresh_token_ttl_secs,
            cookies.secure,
        ));

    tracing::info!(user_id = %user.id, "User logged in");
    Ok((jar, MessageResponse::new("Login successful!")))
}

/// POST /api/auth/logout - Clear session cookies
///
/// Stateless: the tokens themselves stay valid until they expire.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 205, description = "Session cookies cleared", body = MessageResponse),
    ),
)]
pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> impl IntoResponse {
    let jar = clear_session(jar, &state.issuer.config().cookies);
    (
        StatusCode::RESET_CONTENT,
        jar,
        MessageResponse::new("Logout successful."),
    )
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the auth router, mounted under `/api/auth`.
pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state)
}
