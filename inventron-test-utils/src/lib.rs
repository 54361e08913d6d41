//! Inventron Test Utilities
//!
//! Shared test infrastructure for the Inventron workspace:
//! - Instrumented repository and cache doubles
//! - Proptest generators for item fields and drafts
//! - Fixtures for the common inventory scenarios

pub use inventron_storage::{
    CacheBackend, CacheStats, InMemoryCacheBackend, InMemoryItemRepository, InMemoryUserStore,
    ItemRepository, UserStore,
};

pub use inventron_core::{
    CacheError, Clock, FixedClock, InventoryItem, InventronError, InventronResult, ItemDraft,
    ItemFields, ItemId, ManualClock, StorageError, SystemClock,
};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// INSTRUMENTED DOUBLES
// ============================================================================

/// Repository wrapper that counts point lookups.
///
/// Lets tests assert how many times a read actually reached storage.
#[derive(Debug, Clone)]
pub struct CountingItemRepository {
    inner: Arc<InMemoryItemRepository>,
    gets: Arc<AtomicUsize>,
}

impl Default for CountingItemRepository {
    fn default() -> Self {
        Self::new(InMemoryItemRepository::new())
    }
}

impl CountingItemRepository {
    pub fn new(inner: InMemoryItemRepository) -> Self {
        Self {
            inner: Arc::new(inner),
            gets: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `get` calls made so far.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) {
        self.gets.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemRepository for CountingItemRepository {
    async fn list(&self) -> InventronResult<Vec<InventoryItem>> {
        self.inner.list().await
    }

    async fn get(&self, id: ItemId) -> InventronResult<Option<InventoryItem>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn exists_by_name(&self, name: &str) -> InventronResult<bool> {
        self.inner.exists_by_name(name).await
    }

    async fn insert(&self, draft: &ItemDraft) -> InventronResult<InventoryItem> {
        self.inner.insert(draft).await
    }

    async fn update(&self, id: ItemId, draft: &ItemDraft) -> InventronResult<Option<InventoryItem>> {
        self.inner.update(id, draft).await
    }

    async fn delete(&self, id: ItemId) -> InventronResult<bool> {
        self.inner.delete(id).await
    }
}

/// Repository whose pre-check never sees existing names.
///
/// Simulates two creates racing past the existence check, so the insert's
/// own uniqueness guard is what fires.
#[derive(Debug, Clone, Default)]
pub struct BlindPrecheckRepository {
    inner: InMemoryItemRepository,
}

#[async_trait]
impl ItemRepository for BlindPrecheckRepository {
    async fn list(&self) -> InventronResult<Vec<InventoryItem>> {
        self.inner.list().await
    }

    async fn get(&self, id: ItemId) -> InventronResult<Option<InventoryItem>> {
        self.inner.get(id).await
    }

    async fn exists_by_name(&self, _name: &str) -> InventronResult<bool> {
        Ok(false)
    }

    async fn insert(&self, draft: &ItemDraft) -> InventronResult<InventoryItem> {
        self.inner.insert(draft).await
    }

    async fn update(&self, id: ItemId, draft: &ItemDraft) -> InventronResult<Option<InventoryItem>> {
        self.inner.update(id, draft).await
    }

    async fn delete(&self, id: ItemId) -> InventronResult<bool> {
        self.inner.delete(id).await
    }
}

/// Cache backend that fails every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCacheBackend;

fn unavailable() -> InventronError {
    CacheError::Backend {
        reason: "connection refused (10.0.0.7:6379)".to_string(),
    }
    .into()
}

#[async_trait]
impl CacheBackend for UnavailableCacheBackend {
    async fn get(&self, _key: &str) -> InventronResult<Option<String>> {
        Err(unavailable())
    }

    async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> InventronResult<()> {
        Err(unavailable())
    }

    async fn delete(&self, _key: &str) -> InventronResult<()> {
        Err(unavailable())
    }

    async fn stats(&self) -> InventronResult<CacheStats> {
        Err(unavailable())
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use inventron_core::MAX_ITEM_NAME_LEN;
    use proptest::prelude::*;

    /// Names that pass validation (no surrounding whitespace, 1..=100 chars).
    pub fn arb_item_name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9]([A-Za-z0-9 _-]{0,98}[A-Za-z0-9])?"
            .prop_filter("within length limit", |name| {
                name.chars().count() <= MAX_ITEM_NAME_LEN
            })
    }

    pub fn arb_item_description() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 .,]{0,200}[A-Za-z0-9.]"
    }

    pub fn arb_item_quantity() -> impl Strategy<Value = i32> {
        0..=i32::MAX
    }

    pub fn arb_item_fields() -> impl Strategy<Value = ItemFields> {
        (arb_item_name(), arb_item_description(), arb_item_quantity()).prop_map(
            |(name, description, quantity)| ItemFields {
                item_name: Some(name.into()),
                item_description: Some(description.into()),
                item_quantity: Some(quantity.into()),
            },
        )
    }

    pub fn arb_item_draft() -> impl Strategy<Value = ItemDraft> {
        (arb_item_name(), arb_item_description(), arb_item_quantity()).prop_map(
            |(item_name, item_description, item_quantity)| ItemDraft {
                item_name,
                item_description,
                item_quantity,
            },
        )
    }

    /// Strings that are almost certainly not a valid signed token.
    pub fn arb_garbage_token() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[A-Za-z0-9]{1,64}",
            "[A-Za-z0-9_-]{10,40}\\.[A-Za-z0-9_-]{10,40}\\.[A-Za-z0-9_-]{10,40}",
            "eyJ[A-Za-z0-9_-]{10,60}\\.eyJ[A-Za-z0-9_-]{10,60}\\.[A-Za-z0-9_-]{20,43}",
        ]
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;

    /// Unix timestamp used by fixed-clock tests (2024-01-01T00:00:00Z).
    pub const TEST_EPOCH: i64 = 1_704_067_200;

    pub const TEST_USERNAME: &str = "testuser";
    pub const TEST_PASSWORD: &str = "testpassword";

    /// The item every scenario test starts from.
    pub fn test_item_fields() -> ItemFields {
        ItemFields {
            item_name: Some("Test Item".into()),
            item_description: Some("This is a test item".into()),
            item_quantity: Some(10.into()),
        }
    }

    pub fn draft(name: &str, quantity: i32) -> ItemDraft {
        ItemDraft {
            item_name: name.to_string(),
            item_description: format!("{name} description"),
            item_quantity: quantity,
        }
    }

    /// Repository pre-populated with the given names, ids assigned in order.
    pub async fn seeded_repository(names: &[&str]) -> InventronResult<InMemoryItemRepository> {
        let repo = InMemoryItemRepository::with_clock(Arc::new(FixedClock(TEST_EPOCH)));
        for (i, name) in names.iter().enumerate() {
            repo.insert(&draft(name, i as i32)).await?;
        }
        Ok(repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_counting_repository_counts_gets_only() {
        let repo = CountingItemRepository::default();
        let item = repo.insert(&fixtures::draft("Alpha", 1)).await.unwrap();
        repo.list().await.unwrap();
        repo.get(item.id).await.unwrap();
        repo.get(ItemId::new(999)).await.unwrap();
        assert_eq!(repo.get_count(), 2);
    }

    #[tokio::test]
    async fn test_seeded_repository() {
        let repo = fixtures::seeded_repository(&["Alpha", "Beta"]).await.unwrap();
        assert_eq!(repo.len(), 2);
        assert!(repo.exists_by_name("Beta").await.unwrap());
    }

    proptest! {
        #[test]
        fn prop_generated_fields_validate(fields in generators::arb_item_fields()) {
            prop_assert!(fields.into_draft().is_ok());
        }
    }
}
