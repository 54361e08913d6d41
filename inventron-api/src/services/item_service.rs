//! Item Service
//!
//! CRUD orchestration over the item repository and the read-through cache.
//! Creates never touch the cache; single-item reads go cache first; updates
//! and deletes invalidate the cached snapshot after the write succeeds.

use async_trait::async_trait;
use inventron_core::{
    InventoryItem, InventronError, InventronResult, ItemFields, ItemId, StorageError,
};
use inventron_storage::{ItemRepository, ReadThroughCache, StorageFetcher};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::telemetry::record_cache_lookup;

/// Adapts a repository to the cache's miss path.
struct RepositoryFetcher<'a> {
    repo: &'a dyn ItemRepository,
}

#[async_trait]
impl StorageFetcher<InventoryItem> for RepositoryFetcher<'_> {
    async fn fetch(&self, id: ItemId) -> InventronResult<Option<InventoryItem>> {
        self.repo.get(id).await
    }
}

/// A unique violation on write is a duplicate name, whatever raced us.
fn write_error(err: InventronError, name: &str) -> ApiError {
    match err {
        InventronError::Storage(StorageError::UniqueViolation { .. }) => {
            ApiError::duplicate_item(name)
        }
        other => other.into(),
    }
}

/// Inventory item operations.
#[derive(Clone)]
pub struct ItemService {
    repo: Arc<dyn ItemRepository>,
    cache: ReadThroughCache,
}

impl std::fmt::Debug for ItemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ItemService {
    pub fn new(repo: Arc<dyn ItemRepository>, cache: ReadThroughCache) -> Self {
        Self { repo, cache }
    }

    /// All items in creation order. Not cached.
    pub async fn list(&self) -> ApiResult<Vec<InventoryItem>> {
        Ok(self.repo.list().await?)
    }

    /// Validate and insert a new item.
    ///
    /// # Errors
    /// `VALIDATION_FAILED` for bad fields, `DUPLICATE_ITEM` if the name is
    /// taken, whether caught by the pre-check or by the store's constraint.
    pub async fn create(&self, fields: ItemFields) -> ApiResult<InventoryItem> {
        let draft = fields.into_draft()?;

        if self.repo.exists_by_name(&draft.item_name).await? {
            return Err(ApiError::duplicate_item(&draft.item_name));
        }

        let item = self
            .repo
            .insert(&draft)
            .await
            .map_err(|e| write_error(e, &draft.item_name))?;

        tracing::info!(item_id = %item.id, item_name = %item.item_name, "Item created");
        Ok(item)
    }

    /// Read one item, consulting the repository only on a cache miss.
    pub async fn get(&self, id: ItemId) -> ApiResult<InventoryItem> {
        let fetcher = RepositoryFetcher {
            repo: self.repo.as_ref(),
        };
        let Some(read) = self.cache.get::<InventoryItem, _>(id, &fetcher).await? else {
            record_cache_lookup(false);
            return Err(ApiError::item_not_found(id));
        };

        record_cache_lookup(read.was_cache_hit());
        tracing::debug!(item_id = %id, source = ?read.source(), "Item read");
        Ok(read.into_value())
    }

    /// Merge the supplied fields into the stored item and persist it.
    ///
    /// Omitted fields keep their stored value. The cached snapshot is
    /// deleted once the write has succeeded.
    pub async fn update(&self, id: ItemId, fields: ItemFields) -> ApiResult<InventoryItem> {
        let changes = fields.into_changes()?;

        let current = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::item_not_found(id))?;
        let draft = changes.apply_to(&current);

        if draft.item_name != current.item_name && self.repo.exists_by_name(&draft.item_name).await?
        {
            return Err(ApiError::duplicate_item(&draft.item_name));
        }

        let updated = self
            .repo
            .update(id, &draft)
            .await
            .map_err(|e| write_error(e, &draft.item_name))?
            .ok_or_else(|| ApiError::item_not_found(id))?;

        self.cache.invalidate::<InventoryItem>(id).await?;
        tracing::info!(item_id = %id, "Item updated");
        Ok(updated)
    }

    /// Remove an item and its cached snapshot.
    pub async fn delete(&self, id: ItemId) -> ApiResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ApiError::item_not_found(id));
        }

        self.cache.invalidate::<InventoryItem>(id).await?;
        tracing::info!(item_id = %id, "Item deleted");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
