use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use super::hierarchy::key_matches;
use crate::types::Uid;

/// Storage of one registered index: key to identities, plus the reverse map
/// used to retract every key of an identity on replace or delete.
#[derive(Debug, Default)]
pub(crate) struct IndexTable {
  entries: BTreeMap<String, BTreeSet<Uid>>,
  keys_by_uid: HashMap<Uid, BTreeSet<String>>,
}

impl IndexTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace whatever `uid` held with `keys`.
  pub fn insert(&mut self, uid: &Uid, keys: BTreeSet<String>) {
    self.remove(uid);
    for key in &keys {
      self
        .entries
        .entry(key.clone())
        .or_default()
        .insert(uid.clone());
    }
    self.keys_by_uid.insert(uid.clone(), keys);
  }

  /// Retract every key of `uid`, returning them.
  pub fn remove(&mut self, uid: &Uid) -> Option<BTreeSet<String>> {
    let keys = self.keys_by_uid.remove(uid)?;
    for key in &keys {
      if let Some(uids) = self.entries.get_mut(key) {
        uids.remove(uid);
        if uids.is_empty() {
          self.entries.remove(key);
        }
      }
    }
    Some(keys)
  }

  pub fn get(&self, key: &str) -> impl Iterator<Item = &Uid> {
    self.entries.get(key).into_iter().flatten()
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  /// Identities holding a key equal to `prefix` or below it.
  pub fn under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Uid> + 'a {
    self
      .entries
      .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
      .take_while(move |(key, _)| key.starts_with(prefix))
      .filter(move |(key, _)| key_matches(key, prefix))
      .flat_map(|(_, uids)| uids.iter())
  }

  pub fn key_count(&self) -> usize {
    self.entries.len()
  }

  pub fn keys_of(&self, uid: &Uid) -> Option<&BTreeSet<String>> {
    self.keys_by_uid.get(uid)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn keys(ks: &[&str]) -> BTreeSet<String> {
    ks.iter().map(|k| k.to_string()).collect()
  }

  #[test]
  fn replace_retracts_stale_keys() {
    let mut table = IndexTable::new();
    let uid = Uid::from("u1");
    table.insert(&uid, keys(&["Connection/ns/a/c"]));
    table.insert(&uid, keys(&["Connection/ns/b/c"]));

    assert!(!table.contains_key("Connection/ns/a/c"));
    assert_eq!(table.get("Connection/ns/b/c").count(), 1);
    assert_eq!(table.key_count(), 1);
  }

  #[test]
  fn remove_drops_empty_entries() {
    let mut table = IndexTable::new();
    let uid = Uid::from("u1");
    table.insert(&uid, keys(&["k1", "k2"]));
    assert_eq!(table.remove(&uid), Some(keys(&["k1", "k2"])));
    assert_eq!(table.key_count(), 0);
    assert!(table.remove(&uid).is_none());
  }

  #[test]
  fn under_matches_whole_segments() {
    let mut table = IndexTable::new();
    table.insert(&Uid::from("a"), keys(&["Connection/ns/as/c1"]));
    table.insert(&Uid::from("b"), keys(&["Connection/ns/as/c2"]));
    table.insert(&Uid::from("c"), keys(&["Connection/ns/as1/c3"]));

    let found: Vec<_> = table.under("Connection/ns/as").map(|u| u.as_str()).collect();
    assert_eq!(found, vec!["a", "b"]);
  }
}
