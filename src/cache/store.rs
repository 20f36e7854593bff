//! Cache store implementation

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::stats::CacheStats;
use crate::error::{CacheError, Result};
use crate::index::table::IndexTable;
use crate::index::{child_prefix, IndexSpecifier, Indexer};
use crate::query::{execute, ExpressionCache};
use crate::types::{QueryRequest, QueryResult, StoredObject, Uid};

/// A stored object and the insertion sequence it keeps across replacements.
#[derive(Debug)]
struct Slot {
  seq: u64,
  object: Arc<StoredObject>,
}

/// Everything a reader must see consistently. Guarded by one lock so a query
/// never observes an object in the base table without its index entries.
#[derive(Debug, Default)]
struct State {
  objects: HashMap<Uid, Slot>,
  by_kind: HashMap<String, BTreeMap<u64, Uid>>,
  tables: Vec<IndexTable>,
  next_seq: u64,
}

impl State {
  fn slot(&self, uid: &Uid) -> Option<&Slot> {
    self.objects.get(uid)
  }

  fn remove(&mut self, uid: &Uid) -> Option<Slot> {
    let slot = self.objects.remove(uid)?;
    let kind = slot.object.kind();
    if let Some(listing) = self.by_kind.get_mut(kind) {
      listing.remove(&slot.seq);
      if listing.is_empty() {
        self.by_kind.remove(kind);
      }
    }
    for table in &mut self.tables {
      table.remove(uid);
    }
    Some(slot)
  }
}

/// An object prepared for commit: validated, with keys for every index.
struct Prepared {
  object: StoredObject,
  keys: Vec<BTreeSet<String>>,
}

/// In-memory mirror of control-system objects with secondary indexes.
///
/// Mutations take the write lock, queries and lookups the read lock, so
/// concurrent readers proceed in parallel and never see a half-applied batch.
pub struct Cache {
  specs: Vec<IndexSpecifier>,
  uid_index: usize,
  state: RwLock<State>,
  expressions: ExpressionCache,
  adds: AtomicU64,
  deletes: AtomicU64,
  queries: AtomicU64,
}

impl Cache {
  /// Build a cache with the given indexes. Exactly one identity index is
  /// required; names must be unique and non-blank.
  pub fn new(specs: Vec<IndexSpecifier>) -> Result<Self> {
    Self::with_expression_cache(specs, ExpressionCache::default())
  }

  pub fn with_expression_cache(
    specs: Vec<IndexSpecifier>,
    expressions: ExpressionCache,
  ) -> Result<Self> {
    let mut names = HashSet::new();
    for spec in &specs {
      if spec.name.trim().is_empty() {
        return Err(CacheError::Configuration("index name must not be blank".into()));
      }
      if !names.insert(spec.name.as_str()) {
        return Err(CacheError::Configuration(format!(
          "duplicate index name '{}'",
          spec.name
        )));
      }
      spec
        .indexer
        .validate()
        .map_err(|e| CacheError::Configuration(format!("index '{}': {}", spec.name, e)))?;
    }

    let uid_indexes: Vec<usize> = specs
      .iter()
      .enumerate()
      .filter(|(_, s)| s.indexer.is_uid())
      .map(|(i, _)| i)
      .collect();
    let uid_index = match uid_indexes.as_slice() {
      [single] => *single,
      [] => {
        return Err(CacheError::Configuration(
          "an identity index is required".into(),
        ))
      }
      _ => {
        return Err(CacheError::Configuration(
          "only one identity index may be registered".into(),
        ))
      }
    };

    tracing::info!(
      indexes = ?specs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
      "object cache initialized"
    );

    let state = State {
      tables: specs.iter().map(|_| IndexTable::new()).collect(),
      ..Default::default()
    };

    Ok(Self {
      specs,
      uid_index,
      state: RwLock::new(state),
      expressions,
      adds: AtomicU64::new(0),
      deletes: AtomicU64::new(0),
      queries: AtomicU64::new(0),
    })
  }

  /// Upsert a batch of objects.
  ///
  /// All or nothing: every object is validated and indexed before the write
  /// lock is taken, and on any error none of the batch is applied. A replaced
  /// object keeps its original insertion position; its old index keys are
  /// retracted. Later entries in the batch win over earlier ones with the same
  /// identity.
  pub fn add<I>(&self, objects: I) -> Result<()>
  where
    I: IntoIterator<Item = StoredObject>,
  {
    let prepared = objects
      .into_iter()
      .map(|object| self.prepare(object))
      .collect::<Result<Vec<_>>>()?;
    if prepared.is_empty() {
      return Ok(());
    }

    let count = prepared.len();
    let mut state = self.state.write();
    for Prepared { object, keys } in prepared {
      let uid = object.uid().clone();
      let seq = match state.remove(&uid) {
        Some(previous) => previous.seq,
        None => {
          let seq = state.next_seq;
          state.next_seq += 1;
          seq
        }
      };

      for (table, keys) in state.tables.iter_mut().zip(keys) {
        table.insert(&uid, keys);
      }
      state
        .by_kind
        .entry(object.kind().to_string())
        .or_default()
        .insert(seq, uid.clone());
      state.objects.insert(
        uid,
        Slot {
          seq,
          object: Arc::new(object),
        },
      );
    }
    let size = state.objects.len();
    drop(state);

    self.adds.fetch_add(count as u64, Ordering::Relaxed);
    tracing::debug!(count, size, "committed add batch");
    Ok(())
  }

  /// Convenience for a single object.
  pub fn add_one(&self, object: StoredObject) -> Result<()> {
    self.add(std::iter::once(object))
  }

  fn prepare(&self, object: StoredObject) -> Result<Prepared> {
    object.validate()?;
    let keys = self
      .specs
      .iter()
      .map(|spec| spec.derive_keys(&object))
      .collect::<Result<Vec<_>>>()?;
    Ok(Prepared { object, keys })
  }

  /// Remove an object and all of its index entries. Returns whether it was
  /// present; deleting an absent identity is a no-op.
  pub fn delete(&self, uid: &Uid) -> bool {
    let removed = self.state.write().remove(uid).is_some();
    if removed {
      self.deletes.fetch_add(1, Ordering::Relaxed);
      tracing::debug!(%uid, "deleted object");
    }
    removed
  }

  /// Remove several objects under one write lock. Returns how many were
  /// present.
  pub fn delete_many<'a, I>(&self, uids: I) -> usize
  where
    I: IntoIterator<Item = &'a Uid>,
  {
    let mut state = self.state.write();
    let removed = uids
      .into_iter()
      .filter(|uid| state.remove(uid).is_some())
      .count();
    drop(state);

    self.deletes.fetch_add(removed as u64, Ordering::Relaxed);
    tracing::debug!(removed, "committed delete batch");
    removed
  }

  /// Direct lookup through the identity index.
  pub fn get(&self, uid: &Uid) -> Option<Arc<StoredObject>> {
    let state = self.state.read();
    let found = state.tables[self.uid_index].get(uid.as_str()).next()?;
    state.slot(found).map(|slot| slot.object.clone())
  }

  pub fn contains(&self, uid: &Uid) -> bool {
    self.state.read().tables[self.uid_index].contains_key(uid.as_str())
  }

  /// Run the query pipeline: candidates of `kind` (and `namespace`), filter,
  /// count, order, paginate.
  ///
  /// Without an order expression, results come back in insertion order. That
  /// order is also the tiebreak for equal sort keys.
  pub fn query(&self, request: &QueryRequest) -> Result<QueryResult> {
    let compiled = self
      .expressions
      .compile(request.filter.as_deref(), request.order_by.as_deref())?;
    self.queries.fetch_add(1, Ordering::Relaxed);

    let state = self.state.read();
    let candidates: Vec<Arc<StoredObject>> = match state.by_kind.get(&request.kind) {
      Some(listing) => listing
        .values()
        .filter_map(|uid| state.slot(uid))
        .map(|slot| &slot.object)
        .filter(|obj| {
          request
            .namespace
            .as_deref()
            .map_or(true, |ns| obj.namespace() == ns)
        })
        .cloned()
        .collect(),
      None => Vec::new(),
    };
    drop(state);

    Ok(execute(candidates, &compiled, request.offset, request.limit))
  }

  /// Every object of `child_kind` whose hierarchy keys place it under
  /// `root_key` (e.g. `namespace/addressspace`), in insertion order.
  ///
  /// Uses the first registered hierarchy index.
  pub fn descendants(&self, root_key: &str, child_kind: &str) -> Result<Vec<Arc<StoredObject>>> {
    let position = self
      .specs
      .iter()
      .position(|s| s.indexer.is_hierarchy())
      .ok_or_else(|| CacheError::Configuration("no hierarchy index registered".into()))?;
    Ok(self.descendants_at(position, root_key, child_kind))
  }

  /// As [`Cache::descendants`], against a named hierarchy index.
  pub fn descendants_in(
    &self,
    index: &str,
    root_key: &str,
    child_kind: &str,
  ) -> Result<Vec<Arc<StoredObject>>> {
    let position = self
      .specs
      .iter()
      .position(|s| s.name == index)
      .ok_or_else(|| CacheError::Configuration(format!("unknown index '{}'", index)))?;
    if !matches!(self.specs[position].indexer, Indexer::Hierarchy(_)) {
      return Err(CacheError::Configuration(format!(
        "index '{}' is not a hierarchy index",
        index
      )));
    }
    Ok(self.descendants_at(position, root_key, child_kind))
  }

  fn descendants_at(&self, position: usize, root_key: &str, child_kind: &str) -> Vec<Arc<StoredObject>> {
    let prefix = child_prefix(child_kind, root_key);
    let state = self.state.read();
    let ordered: BTreeMap<u64, Arc<StoredObject>> = state.tables[position]
      .under(&prefix)
      .filter_map(|uid| state.slot(uid))
      .filter(|slot| slot.object.kind() == child_kind)
      .map(|slot| (slot.seq, slot.object.clone()))
      .collect();
    ordered.into_values().collect()
  }

  /// Keys an index currently holds for `uid`.
  pub fn index_keys(&self, index: &str, uid: &Uid) -> Option<BTreeSet<String>> {
    let position = self.specs.iter().position(|s| s.name == index)?;
    self.state.read().tables[position].keys_of(uid).cloned()
  }

  pub fn index_names(&self) -> impl Iterator<Item = &str> {
    self.specs.iter().map(|s| s.name.as_str())
  }

  pub fn len(&self) -> usize {
    self.state.read().objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn stats(&self) -> CacheStats {
    let state = self.state.read();
    CacheStats {
      objects: state.objects.len(),
      kinds: state
        .by_kind
        .iter()
        .map(|(kind, listing)| (kind.clone(), listing.len()))
        .collect(),
      index_keys: self
        .specs
        .iter()
        .zip(&state.tables)
        .map(|(spec, table)| (spec.name.clone(), table.key_count()))
        .collect(),
      adds: self.adds.load(Ordering::Relaxed),
      deletes: self.deletes.load(Ordering::Relaxed),
      queries: self.queries.load(Ordering::Relaxed),
      expression_cache_hits: self.expressions.hits(),
    }
  }
}

impl std::fmt::Debug for Cache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Cache")
      .field("indexes", &self.specs)
      .field("objects", &self.len())
      .finish()
  }
}
