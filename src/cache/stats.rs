use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Point-in-time cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
  pub objects: usize,
  /// Live objects per kind
  pub kinds: BTreeMap<String, usize>,
  /// Distinct keys per registered index
  pub index_keys: BTreeMap<String, usize>,
  /// Cumulative objects upserted
  pub adds: u64,
  /// Cumulative objects removed
  pub deletes: u64,
  pub queries: u64,
  pub expression_cache_hits: u64,
}

impl CacheStats {
  pub fn kind_count(&self, kind: &str) -> usize {
    self.kinds.get(kind).copied().unwrap_or(0)
  }
}
