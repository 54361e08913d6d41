//! Inventron Storage - repository traits, in-memory stores and the item cache
//!
//! Defines the storage abstraction the API layer is written against. The
//! Postgres implementations live in `inventron-api` next to the pool.

pub mod cache;
pub mod memory;
pub mod repository;

pub use cache::{
    CacheBackend, CacheConfig, CacheRead, CacheStats, CacheableEntity, InMemoryCacheBackend,
    ReadSource, ReadThroughCache, StorageFetcher, DEFAULT_ENTRY_TTL,
};
#[cfg(feature = "redis")]
pub use cache::RedisCacheBackend;
pub use memory::{InMemoryItemRepository, InMemoryUserStore};
pub use repository::{ItemRepository, UserStore};
