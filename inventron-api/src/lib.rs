//! Inventron API - REST layer for the inventory service
//!
//! Axum routes for cookie-session authentication and inventory item CRUD.
//! Single-item reads go through a read-through cache; writes invalidate it.
//! Storage and cache are injected as trait objects so the same router runs
//! against Postgres/Redis in production and in-memory stores in tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{
    hash_password, verify_password, AuthConfig, Claims, CookieSettings, Identity, JwtSecret,
    TokenIssuer, TokenKind, TokenPair,
};
pub use config::{ApiConfig, CacheBackendKind, CacheSettings, StorageBackend};
pub use db::{DbClient, DbConfig, PgItemRepository, PgUserStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{session_gateway, AuthenticatedUser, SessionGatewayState};
pub use openapi::ApiDoc;
pub use routes::{create_api_router, AppContext};
pub use services::ItemService;
