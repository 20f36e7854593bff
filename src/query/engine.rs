use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use super::compiler::{compile_filter, compile_order};
use super::expr::{FilterExpr, OrderExpr};
use crate::error::Result;
use crate::types::{QueryResult, StoredObject};

/// Filter and order expressions of one query, compiled.
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
  pub filter: Option<Arc<FilterExpr>>,
  pub order: Option<Arc<OrderExpr>>,
}

/// LRU of compiled expressions keyed by their source text.
///
/// A capacity of zero disables caching; every call compiles afresh.
pub struct ExpressionCache {
  filters: Option<Mutex<LruCache<String, Arc<FilterExpr>>>>,
  orders: Option<Mutex<LruCache<String, Arc<OrderExpr>>>>,
  hits: AtomicU64,
}

impl ExpressionCache {
  pub fn new(capacity: usize) -> Self {
    let capacity = NonZeroUsize::new(capacity);
    Self {
      filters: capacity.map(|c| Mutex::new(LruCache::new(c))),
      orders: capacity.map(|c| Mutex::new(LruCache::new(c))),
      hits: AtomicU64::new(0),
    }
  }

  /// Compile both expressions, failing on the first syntax error. Blank
  /// expressions count as absent.
  pub fn compile(&self, filter: Option<&str>, order: Option<&str>) -> Result<CompiledQuery> {
    let filter = match non_blank(filter) {
      Some(src) => Some(self.cached(&self.filters, src, compile_filter)?),
      None => None,
    };
    let order = match non_blank(order) {
      Some(src) => Some(self.cached(&self.orders, src, compile_order)?),
      None => None,
    };
    Ok(CompiledQuery { filter, order })
  }

  fn cached<T>(
    &self,
    cache: &Option<Mutex<LruCache<String, Arc<T>>>>,
    src: &str,
    compile: fn(&str) -> Result<T>,
  ) -> Result<Arc<T>> {
    let Some(cache) = cache else {
      return compile(src).map(Arc::new);
    };

    if let Some(hit) = cache.lock().get(src) {
      self.hits.fetch_add(1, Ordering::Relaxed);
      tracing::trace!(expression = src, "expression cache hit");
      return Ok(hit.clone());
    }

    // Failed compilations are not cached.
    let compiled = Arc::new(compile(src)?);
    cache.lock().put(src.to_string(), compiled.clone());
    Ok(compiled)
  }

  pub fn hits(&self) -> u64 {
    self.hits.load(Ordering::Relaxed)
  }
}

impl Default for ExpressionCache {
  fn default() -> Self {
    Self::new(256)
  }
}

fn non_blank(expr: Option<&str>) -> Option<&str> {
  expr.filter(|s| !s.trim().is_empty())
}

/// Filter, count, order and paginate a candidate set.
///
/// `candidates` must arrive in insertion order: the sort is stable, so that
/// order is the tiebreak for equal keys and the order used when no order
/// expression is given.
pub fn execute(
  candidates: Vec<Arc<StoredObject>>,
  query: &CompiledQuery,
  offset: Option<usize>,
  limit: Option<usize>,
) -> QueryResult {
  let mut matched: Vec<Arc<StoredObject>> = match &query.filter {
    Some(filter) => candidates
      .into_iter()
      .filter(|obj| filter.matches(obj))
      .collect(),
    None => candidates,
  };
  let total = matched.len();

  if let Some(order) = &query.order {
    matched.sort_by(|a, b| order.compare(a, b));
  }

  let items = matched
    .into_iter()
    .skip(offset.unwrap_or(0))
    .take(limit.unwrap_or(usize::MAX))
    .collect();

  QueryResult { items, total }
}
