//! Item cache: TTL backends plus a typed read-through layer.
//!
//! The cache is never authoritative. Entries are written lazily on a read
//! miss and deleted by writers after a successful update or delete, so a
//! reader can observe at most TTL-bounded staleness if it races a writer.

pub mod memory;
pub mod read_through;
#[cfg(feature = "redis")]
pub mod redis_backend;
pub mod traits;

pub use memory::InMemoryCacheBackend;
pub use read_through::{
    CacheConfig, CacheRead, ReadSource, ReadThroughCache, StorageFetcher, DEFAULT_ENTRY_TTL,
};
#[cfg(feature = "redis")]
pub use redis_backend::RedisCacheBackend;
pub use traits::{CacheBackend, CacheStats, CacheableEntity};
