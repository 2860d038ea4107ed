//! Caching primitives.

/// Time- and size-bounded node cache.
pub mod node_cache;

pub use node_cache::{CacheConfig, TtlLruCache};
