//! Authentication Module
//!
//! Issues and validates the signed session tokens handed out at login, and
//! hashes/verifies user passwords.
//!
//! Tokens are stateless HS256 JWTs carried in cookies. An access token is
//! short lived and checked on every request; a refresh token is long lived
//! and is never accepted where an access token is expected. Nothing is
//! stored server side, so there is no revocation.

use crate::error::{ApiError, ApiResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use inventron_core::{Clock, ConfigError, InventronError, SystemClock, User, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";


// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe JWT secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret with validation.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> Result<Self, InventronError> {
        if secret.is_empty() {
            return Err(InventronError::Config(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            }));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (use sparingly, only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Check if the secret is empty without exposing it.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into())),
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Names and flags of the session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub access_cookie: String,
    pub refresh_cookie: String,
    /// Mark cookies `Secure` (HTTPS only).
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            access_cookie: "access_token".to_string(),
            refresh_cookie: "refresh_token".to_string(),
            secure: false,
        }
    }
}

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// Access token lifetime in seconds (default: 5 minutes)
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds (default: 1 day)
    pub refresh_token_ttl_secs: i64,

    /// Clock skew tolerance in seconds applied to `exp` (default: 0)
    pub jwt_clock_skew_secs: i64,

    /// Session cookie names and flags
    pub cookies: CookieSettings,

    /// Clock for token time validation (injected for testing)
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("cookies", &self.cookies)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: build_jwt_secret(INSECURE_DEFAULT_SECRET.to_string()),
            jwt_algorithm: Algorithm::HS256,
            access_token_ttl_secs: 5 * 60,
            refresh_token_ttl_secs: 24 * 60 * 60,
            jwt_clock_skew_secs: 0,
            cookies: CookieSettings::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `INVENTRON_JWT_SECRET`: JWT signing secret
    /// - `INVENTRON_ACCESS_TOKEN_TTL_SECS`: access token lifetime (default: 300)
    /// - `INVENTRON_REFRESH_TOKEN_TTL_SECS`: refresh token lifetime (default: 86400)
    /// - `INVENTRON_JWT_CLOCK_SKEW_SECS`: expiry leeway (default: 0)
    /// - `INVENTRON_ACCESS_COOKIE` / `INVENTRON_REFRESH_COOKIE`: cookie names
    /// - `INVENTRON_COOKIE_SECURE`: set the `Secure` flag (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret_str = std::env::var("INVENTRON_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            access_token_ttl_secs: env_parse("INVENTRON_ACCESS_TOKEN_TTL_SECS")
                .unwrap_or(defaults.access_token_ttl_secs),
            refresh_token_ttl_secs: env_parse("INVENTRON_REFRESH_TOKEN_TTL_SECS")
                .unwrap_or(defaults.refresh_token_ttl_secs),
            jwt_clock_skew_secs: env_parse("INVENTRON_JWT_CLOCK_SKEW_SECS")
                .unwrap_or(defaults.jwt_clock_skew_secs),
            cookies: CookieSettings {
                access_cookie: std::env::var("INVENTRON_ACCESS_COOKIE")
                    .unwrap_or(defaults.cookies.access_cookie),
                refresh_cookie: std::env::var("INVENTRON_REFRESH_COOKIE")
                    .unwrap_or(defaults.cookies.refresh_cookie),
                secure: env_parse("INVENTRON_COOKIE_SECURE").unwrap_or(false),
            },
            clock: Arc::new(SystemClock),
        }
    }

    /// Validate the authentication configuration for production use.
    ///
    /// Call at startup. In development, problems are logged and the server
    /// continues.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("INVENTRON_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Cannot start server in production with insecure JWT secret. \
                     Set INVENTRON_JWT_SECRET to a secure value. \
                     INVENTRON_ENVIRONMENT={}",
                    environment
                )));
            }
            tracing::warn!(
                "SECURITY WARNING: Using insecure default JWT secret. \
                 Set INVENTRON_JWT_SECRET to a secure random value (minimum 32 characters) \
                 before deploying."
            );
        }

        if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            } else if !self.jwt_secret.is_insecure_default() {
                tracing::warn!(
                    "SECURITY WARNING: JWT secret is short ({} chars). \
                     For production, use at least 32 characters.",
                    self.jwt_secret.len()
                );
            }
        }

        if is_production && !self.cookies.secure {
            tracing::warn!("Session cookies are not marked Secure; set INVENTRON_COOKIE_SECURE=true behind HTTPS");
        }

        Ok(())
    }
}

// ============================================================================
// TOKENS
// ============================================================================

/// Which of the two session tokens a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Username at issue time
    pub username: String,

    /// Access or refresh
    pub token_type: TokenKind,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// Create new claims for a user using a clock.
    pub fn new(user: &User, kind: TokenKind, ttl_secs: i64, clock: &dyn Clock) -> Self {
        let now = clock.unix_timestamp();
        Self {
            sub: user.id.to_string(),
            username: user.username.clone(),
            token_type: kind,
            iat: now,
            exp: now.saturating_add(ttl_secs),
            jti: Uuid::now_v7().simple().to_string(),
        }
    }
}

/// Resolved caller identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

/// The pair handed to the client at login.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenPair([REDACTED])")
    }
}

/// Expiry check with leeway. `exp` is exclusive.
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    if now >= exp.saturating_add(leeway_secs) {
        return Err(ApiError::invalid_token("Token has expired"));
    }
    Ok(())
}

/// Signs and validates session tokens.
///
/// Signature checks are delegated to `jsonwebtoken`; time checks use the
/// injected clock so tests are deterministic.
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<AuthConfig>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let secret = config.jwt_secret.expose().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issue an access/refresh token pair for `user`.
    pub fn issue(&self, user: &User) -> ApiResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(user, TokenKind::Access, self.config.access_token_ttl_secs)?,
            refresh_token: self.sign(
                user,
                TokenKind::Refresh,
                self.config.refresh_token_ttl_secs,
            )?,
        })
    }

    fn sign(&self, user: &User, kind: TokenKind, ttl_secs: i64) -> ApiResult<String> {
        let claims = Claims::new(user, kind, ttl_secs, self.config.clock.as_ref());
        let header = Header::new(self.config.jwt_algorithm);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
    }

    /// Validate a token and extract its claims.
    ///
    /// Fails with `InvalidToken` on a bad signature, malformed token,
    /// expiry, or a token of the wrong kind. There is no soft-fail mode.
    pub fn decode_claims(&self, token: &str, expected: TokenKind) -> ApiResult<Claims> {
        // Signature only; time checks below use our clock
        let mut validation = Validation::new(self.config.jwt_algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::invalid_token("Token signature is invalid")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    ApiError::invalid_token("Token is invalid")
                }
                _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
            })?
            .claims;

        let now = self.config.clock.unix_timestamp();
        if now < 0 {
            tracing::error!(
                timestamp = now,
                "System clock returned pre-epoch time - server time is broken"
            );
            return Err(ApiError::internal_error(
                "Server time configuration error - please contact support",
            ));
        }
        validate_claim_times(now, claims.exp, self.config.jwt_clock_skew_secs)?;

        if claims.token_type != expected {
            return Err(ApiError::invalid_token("Token has wrong type"));
        }
        Ok(claims)
    }

    /// Validate a token and resolve the identity it carries.
    pub fn validate(&self, token: &str, expected: TokenKind) -> ApiResult<Identity> {
        let claims = self.decode_claims(token, expected)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| ApiError::invalid_token("Token subject is not a user id"))?;
        Ok(Identity {
            user_id,
            username: claims.username,
        })
    }
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// Hash a password for storage using Argon2id with a random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal_error(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored PHC hash.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}

/// Run a CPU-heavy hashing step off the async executor.
pub async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal_error(format!("Blocking task failed: {}", e)))
}

// ============================================================================
// TESTS
// ============================================================================
