//! Live, queryable mirror of messaging infrastructure objects.
//!
//! Producers feed control-system events into a [`Cache`] through
//! [`Cache::add`] and [`Cache::delete`]; readers call [`Cache::query`] for
//! filtered, ordered, paginated results and [`Cache::descendants`] for
//! relational lookups such as the connections of an address space.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod kinds;
pub mod query;
pub mod types;

pub use cache::{Cache, CacheStats};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use index::{HierarchyIndex, IndexSpecifier, Indexer, UidIndex};
pub use types::{ObjectRecord, QueryRequest, QueryResult, StoredObject, Uid};
