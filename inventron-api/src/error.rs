//! Error Types for the Inventron API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.
//! Server-class errors are logged in full and reach the client only as a
//! generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inventron_core::{InventronError, ItemId, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401)
    // ========================================================================
    /// No identity is attached to a request that requires one
    Unauthenticated,

    /// Session token is malformed, forged, expired, or of the wrong kind
    InvalidToken,

    /// Username/password pair did not match a user
    InvalidCredentials,

    // ========================================================================
    // Client Errors (400)
    // ========================================================================
    /// Request field validation failed
    ValidationFailed,

    /// Request body or path could not be parsed
    InvalidInput,

    /// An item with the same name already exists
    DuplicateItem,

    /// Registration username is already in use
    UsernameTaken,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested item does not exist
    ItemNotFound,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthenticated | ErrorCode::InvalidToken | ErrorCode::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::DuplicateItem
            | ErrorCode::UsernameTaken => StatusCode::BAD_REQUEST,

            ErrorCode::ItemNotFound => StatusCode::NOT_FOUND,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "Authentication credentials were not provided.",
            ErrorCode::InvalidToken => "Token is invalid or expired",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::DuplicateItem => "Item already exists.",
            ErrorCode::UsernameTaken => "A user with that username already exists.",
            ErrorCode::ItemNotFound => "Item not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Database connection pool exhausted",
        }
    }

    /// Whether the error is the server's fault and must not leak detail.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// API error response.
///
/// This is the standard error format returned by all API endpoints.
/// It includes an error code, a human-readable message, and optional
/// field-level details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g. per-field validation messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an API error using the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // CONVENIENCE CONSTRUCTORS
    // ========================================================================

    /// Create an Unauthenticated error.
    pub fn unauthenticated() -> Self {
        Self::from_code(ErrorCode::Unauthenticated)
    }

    /// Create an InvalidToken error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    /// Create an InvalidCredentials error.
    pub fn invalid_credentials() -> Self {
        Self::from_code(ErrorCode::InvalidCredentials)
    }

    /// Create a ValidationFailed error carrying per-field messages.
    pub fn validation_failed(errors: &ValidationErrors) -> Self {
        let details = serde_json::to_value(errors.field_map()).unwrap_or_default();
        Self::from_code(ErrorCode::ValidationFailed).with_details(details)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a DuplicateItem error.
    pub fn duplicate_item(name: &str) -> Self {
        Self::from_code(ErrorCode::DuplicateItem)
            .with_details(serde_json::json!({ "item_name": name }))
    }

    /// Create a UsernameTaken error.
    pub fn username_taken() -> Self {
        Self::from_code(ErrorCode::UsernameTaken)
    }

    /// Create an ItemNotFound error.
    pub fn item_not_found(id: ItemId) -> Self {
        Self::from_code(ErrorCode::ItemNotFound).with_details(serde_json::json!({ "id": id }))
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a DatabaseError.
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create a ServiceUnavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Create a ConnectionPoolExhausted error.
    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }

    /// The body actually sent to the client.
    fn client_view(self) -> Self {
        if self.code.is_server_error() {
            Self::from_code(self.code)
        } else {
            self
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.code.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        }
        (status, Json(self.client_view())).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM STANDARD ERRORS
// ============================================================================

/// Convert from domain errors.
///
/// Unique violations are context dependent and are normally mapped by the
/// caller before reaching this conversion.
impl From<InventronError> for ApiError {
    fn from(err: InventronError) -> Self {
        match err {
            InventronError::Validation(errors) => ApiError::validation_failed(&errors),
            InventronError::Storage(e) => ApiError::database_error(e.to_string()),
            InventronError::Cache(e) => ApiError::internal_error(e.to_string()),
            InventronError::Config(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation_failed(&errors)
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Log the full error for debugging
        tracing::error!("Database error: {:?}", err);

        // Return a generic database error to avoid leaking internal details
        ApiError::database_error("Database operation failed")
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
