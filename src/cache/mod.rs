//! Indexed in-memory object cache
//!
//! Provides the mirror of control-system objects with:
//! - upsert/delete batches applied atomically with respect to readers
//! - an identity index and pluggable hierarchy indexes
//! - filtered, ordered, paginated queries with an unpaginated total
//! - relational lookups of descendants under a hierarchy root

mod stats;
mod store;

pub use stats::CacheStats;
pub use store::Cache;
