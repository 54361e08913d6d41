//! Async repository traits for items and users.
//!
//! The API layer only talks to these traits. The crate ships in-memory
//! implementations; the Postgres ones live next to the connection pool in
//! `inventron-api`.

use ::async_trait::async_trait;
use inventron_core::{InventoryItem, InventronResult, ItemDraft, ItemId, User};

/// Durable storage of inventory items. The single source of truth.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// All items, ordered by id ascending.
    async fn list(&self) -> InventronResult<Vec<InventoryItem>>;

    /// Get an item by ID.
    async fn get(&self, id: ItemId) -> InventronResult<Option<InventoryItem>>;

    /// Whether any item already uses `name`.
    async fn exists_by_name(&self, name: &str) -> InventronResult<bool>;

    /// Insert a new item and return it with its assigned id and timestamp.
    ///
    /// Implementations must enforce name uniqueness themselves and fail with
    /// `StorageError::UniqueViolation` when it is broken.
    async fn insert(&self, draft: &ItemDraft) -> InventronResult<InventoryItem>;

    /// Replace the mutable fields of an item. `Ok(None)` if it does not exist.
    async fn update(&self, id: ItemId, draft: &ItemDraft) -> InventronResult<Option<InventoryItem>>;

    /// Delete an item. Returns whether a row was removed.
    async fn delete(&self, id: ItemId) -> InventronResult<bool>;

    /// Cheap round trip used by readiness probes.
    async fn health_check(&self) -> InventronResult<()> {
        Ok(())
    }
}

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> InventronResult<Option<User>>;

    /// Create a user from an already hashed password.
    ///
    /// Fails with `StorageError::UniqueViolation` if the username is taken.
    async fn create(&self, username: &str, password_hash: &str) -> InventronResult<User>;
}
