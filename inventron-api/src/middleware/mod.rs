//! Middleware modules for the Inventron API
//!
//! - `auth`: session gateway and the `AuthenticatedUser` extractor
//!
//! The observability middleware lives in [`crate::telemetry`].

mod auth;

pub use auth::{session_gateway, AuthenticatedUser, SessionGatewayState};
