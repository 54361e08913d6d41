//! In-memory repository and credential store.
//!
//! Used for local runs (`INVENTRON_STORAGE=memory`) and by the test suites.
//! Both enforce uniqueness under their write lock, mirroring the constraints
//! the Postgres schema declares.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use ::async_trait::async_trait;
use inventron_core::{
    Clock, InventoryItem, InventronResult, ItemDraft, ItemId, StorageError, SystemClock, User,
    UserId,
};

use crate::repository::{ItemRepository, UserStore};

const ITEM_NAME_CONSTRAINT: &str = "inventory_items_item_name_key";
const USERNAME_CONSTRAINT: &str = "users_username_key";

#[derive(Debug, Default)]
struct ItemTable {
    next_id: i64,
    rows: BTreeMap<ItemId, InventoryItem>,
}

/// Item repository backed by an ordered map.
#[derive(Debug, Clone)]
pub struct InMemoryItemRepository {
    table: Arc<RwLock<ItemTable>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Arc::new(RwLock::new(ItemTable::default())),
            clock,
        }
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn name_taken(table: &ItemTable, name: &str, except: Option<ItemId>) -> bool {
    table
        .rows
        .values()
        .any(|row| row.item_name == name && Some(row.id) != except)
}

fn duplicate_name(name: &str) -> StorageError {
    StorageError::UniqueViolation {
        constraint: ITEM_NAME_CONSTRAINT.to_string(),
        value: name.to_string(),
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn list(&self) -> InventronResult<Vec<InventoryItem>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get(&self, id: ItemId) -> InventronResult<Option<InventoryItem>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn exists_by_name(&self, name: &str) -> InventronResult<bool> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(name_taken(&table, name, None))
    }

    async fn insert(&self, draft: &ItemDraft) -> InventronResult<InventoryItem> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        if name_taken(&table, &draft.item_name, None) {
            return Err(duplicate_name(&draft.item_name).into());
        }
        table.next_id += 1;
        let item = draft.clone().into_item(ItemId::new(table.next_id), self.clock.now());
        table.rows.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, id: ItemId, draft: &ItemDraft) -> InventronResult<Option<InventoryItem>> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if name_taken(&table, &draft.item_name, Some(id)) {
            return Err(duplicate_name(&draft.item_name).into());
        }
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.item_name = draft.item_name.clone();
        row.item_description = draft.item_description.clone();
        row.item_quantity = draft.item_quantity;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: ItemId) -> InventronResult<bool> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.rows.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
struct UserTable {
    next_id: i64,
    by_username: BTreeMap<String, User>,
}

/// Credential store backed by a map keyed on username.
#[derive(Debug, Clone)]
pub struct InMemoryUserStore {
    table: Arc<RwLock<UserTable>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Arc::new(RwLock::new(UserTable::default())),
            clock,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> InventronResult<Option<User>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.by_username.get(username).cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> InventronResult<User> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        if table.by_username.contains_key(username) {
            return Err(StorageError::UniqueViolation {
                constraint: USERNAME_CONSTRAINT.to_string(),
                value: username.to_string(),
            }
            .into());
        }
        table.next_id += 1;
        let user = User {
            id: UserId(table.next_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            date_joined: self.clock.now(),
        };
        table.by_username.insert(username.to_string(), user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventron_core::{FixedClock, InventronError};

    fn draft(name: &str, quantity: i32) -> ItemDraft {
        ItemDraft {
            item_name: name.to_string(),
            item_description: format!("{name} description"),
            item_quantity: quantity,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryItemRepository::with_clock(Arc::new(FixedClock(1_704_067_200)));
        let first = repo.insert(&draft("Alpha", 1)).await.unwrap();
        let second = repo.insert(&draft("Beta", 2)).await.unwrap();

        assert_eq!(first.id, ItemId::new(1));
        assert_eq!(second.id, ItemId::new(2));
        assert_eq!(first.created_at.timestamp(), 1_704_067_200);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_name() {
        let repo = InMemoryItemRepository::new();
        repo.insert(&draft("Alpha", 1)).await.unwrap();

        let err = repo.insert(&draft("Alpha", 5)).await.unwrap_err();
        assert!(matches!(
            err,
            InventronError::Storage(StorageError::UniqueViolation { .. })
        ));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let repo = InMemoryItemRepository::new();
        for name in ["Charlie", "Alpha", "Bravo"] {
            repo.insert(&draft(name, 0)).await.unwrap();
        }
        let names: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.item_name)
            .collect();
        assert_eq!(names, vec!["Charlie", "Alpha", "Bravo"]);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_created_at() {
        let repo = InMemoryItemRepository::new();
        let created = repo.insert(&draft("Alpha", 1)).await.unwrap();

        let updated = repo
            .update(created.id, &draft("Alpha Prime", 9))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.item_quantity, 9);
    }

    #[tokio::test]
    async fn test_update_to_taken_name_fails() {
        let repo = InMemoryItemRepository::new();
        repo.insert(&draft("Alpha", 1)).await.unwrap();
        let beta = repo.insert(&draft("Beta", 1)).await.unwrap();

        let err = repo.update(beta.id, &draft("Alpha", 1)).await.unwrap_err();
        assert!(matches!(
            err,
            InventronError::Storage(StorageError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_item() {
        let repo = InMemoryItemRepository::new();
        assert!(repo
            .update(ItemId::new(999), &draft("Ghost", 0))
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete(ItemId::new(999)).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_store_rejects_duplicate_username() {
        let store = InMemoryUserStore::new();
        let user = store.create("alice", "hash").await.unwrap();
        assert_eq!(user.id, UserId(1));

        assert!(store.create("alice", "other").await.is_err());
        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash");
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }
}
