//! Service Layer
//!
//! Business logic between the route handlers and storage. Handlers parse
//! and authenticate; services validate, orchestrate and map storage
//! failures to API errors.

mod item_service;

pub use item_service::ItemService;
