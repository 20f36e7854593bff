use std::collections::BTreeSet;

use crate::types::StoredObject;

/// One key per object: its identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct UidIndex;

impl UidIndex {
  pub(crate) fn derive_keys(&self, object: &StoredObject) -> BTreeSet<String> {
    BTreeSet::from([object.uid().to_string()])
  }
}
