//! Caching infrastructure for the service layer.
//!
//! Redis is the primary store; an in-process TTL map takes over whenever
//! Redis cannot be reached. [`ResilientCache`] hides the switch from callers.

mod cache_interface;
pub mod cache_keys;
mod memory_store;
mod pattern;
mod redis_cache;
mod resilient_cache;

pub use cache_interface::CacheStore;
pub use cache_keys::CacheKey;
pub use memory_store::{CacheEntry, MemoryCacheStore, DEFAULT_MAX_ENTRIES};
pub use pattern::KeyPattern;
pub use redis_cache::{
    ConnectionState, ConnectionTracker, ReconnectPolicy, RedisCacheClient, RedisCacheClientParameters,
};
pub use resilient_cache::{CacheLayer, CacheLayerComponent, CacheLayerComponentParameters, CacheWrite, ResilientCache};
