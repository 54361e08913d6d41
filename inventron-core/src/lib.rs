//! Inventron Core - domain types shared by storage and the API
//!
//! Holds the inventory item and user records, the validation rules applied
//! before anything is persisted, the injectable clock, and the error
//! taxonomy used across the workspace.

pub mod clock;
pub mod error;
pub mod item;
pub mod user;

pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use error::{
    CacheError, ConfigError, InventronError, InventronResult, StorageError, ValidationError,
    ValidationErrors,
};
pub use item::{InventoryItem, ItemChanges, ItemDraft, ItemFields, ItemId, MAX_ITEM_NAME_LEN};
pub use user::{validate_credentials, User, UserId, MAX_USERNAME_LEN, MIN_PASSWORD_LEN};
