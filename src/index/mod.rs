//! Index abstraction
//!
//! An index maps derived string keys to the identities of stored objects. The
//! set of index kinds is closed: [`Indexer::Uid`] keys every object by its
//! identity, [`Indexer::Hierarchy`] keys objects by their position in the
//! address space / connection / address tree, using a creator registered per
//! object kind.

mod hierarchy;
pub(crate) mod table;
mod uid;

use std::collections::BTreeSet;

pub use hierarchy::{child_prefix, hierarchy_key, HierarchyIndex, HierarchyKeyCreator, KEY_SEPARATOR};
pub use uid::UidIndex;

use crate::error::{CacheError, Result};
use crate::types::StoredObject;

/// Key derivation strategy of a registered index.
#[derive(Debug, Clone)]
pub enum Indexer {
  Uid(UidIndex),
  Hierarchy(HierarchyIndex),
}

impl Indexer {
  /// Checked once, when the cache is built.
  pub(crate) fn validate(&self) -> std::result::Result<(), String> {
    match self {
      Indexer::Uid(_) => Ok(()),
      Indexer::Hierarchy(h) => h.validate(),
    }
  }

  pub fn is_uid(&self) -> bool {
    matches!(self, Indexer::Uid(_))
  }

  pub fn is_hierarchy(&self) -> bool {
    matches!(self, Indexer::Hierarchy(_))
  }
}

impl From<UidIndex> for Indexer {
  fn from(index: UidIndex) -> Self {
    Indexer::Uid(index)
  }
}

impl From<HierarchyIndex> for Indexer {
  fn from(index: HierarchyIndex) -> Self {
    Indexer::Hierarchy(index)
  }
}

/// A named index registered at cache construction.
#[derive(Debug, Clone)]
pub struct IndexSpecifier {
  pub name: String,
  pub indexer: Indexer,
}

impl IndexSpecifier {
  pub fn new(name: impl Into<String>, indexer: impl Into<Indexer>) -> Self {
    Self {
      name: name.into(),
      indexer: indexer.into(),
    }
  }

  /// Keys this index holds for `object`.
  ///
  /// Keys from a previous revision are retracted through the index table, so
  /// derivation only ever sees the incoming revision.
  pub fn derive_keys(&self, object: &StoredObject) -> Result<BTreeSet<String>> {
    match &self.indexer {
      Indexer::Uid(uid) => Ok(uid.derive_keys(object)),
      Indexer::Hierarchy(h) => {
        let creator = h.creator(object.kind()).ok_or_else(|| {
          CacheError::Configuration(format!(
            "index '{}' has no hierarchy creator for kind {}",
            self.name,
            object.kind()
          ))
        })?;
        let keys = creator(object).map_err(|reason| CacheError::Index {
          index: self.name.clone(),
          kind: object.kind().to_string(),
          uid: object.uid().to_string(),
          reason,
        })?;
        if keys.is_empty() {
          return Err(CacheError::Index {
            index: self.name.clone(),
            kind: object.kind().to_string(),
            uid: object.uid().to_string(),
            reason: "no hierarchy keys derived".into(),
          });
        }
        Ok(keys.into_iter().collect())
      }
    }
  }
}
