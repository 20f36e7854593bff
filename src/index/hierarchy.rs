use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::StoredObject;

/// Separator between hierarchy key segments.
pub const KEY_SEPARATOR: char = '/';

/// Derives the hierarchy keys of one object kind.
///
/// Keys must have the form `<Kind>/<segment>/.../<name>`, starting with the
/// object's own kind: `Cache::descendants(root, kind)` only finds keys that
/// begin with `<kind>/<root>` followed by a separator or the end of the key.
/// A key such as `ns/as/c1` without the kind in front is never found. Segments
/// must not contain [`KEY_SEPARATOR`].
///
/// Must be deterministic and side-effect free: it runs on every mutation of an
/// object of its kind. An `Err` fails the whole `add` call.
pub type HierarchyKeyCreator =
  Arc<dyn Fn(&StoredObject) -> std::result::Result<Vec<String>, String> + Send + Sync>;

/// Parent/child index over object kinds with a registered creator.
#[derive(Clone, Default)]
pub struct HierarchyIndex {
  creators: BTreeMap<String, HierarchyKeyCreator>,
}

impl HierarchyIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_creator<F>(mut self, kind: impl Into<String>, creator: F) -> Self
  where
    F: Fn(&StoredObject) -> std::result::Result<Vec<String>, String> + Send + Sync + 'static,
  {
    self.creators.insert(kind.into(), Arc::new(creator));
    self
  }

  pub fn with_shared_creator(mut self, kind: impl Into<String>, creator: HierarchyKeyCreator) -> Self {
    self.creators.insert(kind.into(), creator);
    self
  }

  pub fn kinds(&self) -> impl Iterator<Item = &str> {
    self.creators.keys().map(String::as_str)
  }

  pub(crate) fn creator(&self, kind: &str) -> Option<&HierarchyKeyCreator> {
    self.creators.get(kind)
  }

  pub(crate) fn validate(&self) -> std::result::Result<(), String> {
    if self.creators.is_empty() {
      return Err("hierarchy index has no registered kind creators".into());
    }
    if let Some(kind) = self.creators.keys().find(|k| k.trim().is_empty()) {
      return Err(format!("hierarchy creator registered for blank kind '{}'", kind));
    }
    Ok(())
  }
}

impl std::fmt::Debug for HierarchyIndex {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HierarchyIndex")
      .field("kinds", &self.creators.keys().collect::<Vec<_>>())
      .finish()
  }
}

/// Join segments into a hierarchy key, e.g. `Connection/ns/as/host:1234`.
pub fn hierarchy_key<S: AsRef<str>>(segments: &[S]) -> String {
  let mut key = String::new();
  for (i, segment) in segments.iter().enumerate() {
    if i > 0 {
      key.push(KEY_SEPARATOR);
    }
    key.push_str(segment.as_ref());
  }
  key
}

/// Key prefix under which objects of `child_kind` below `root_key` live.
///
/// A key matches when it equals the prefix or continues it after a separator,
/// so `ns/as` never matches `ns/as1`. Only a trailing separator is dropped from
/// `root_key`; a leading one is an empty first segment, as in `/as` for an
/// address space outside any namespace.
pub fn child_prefix(child_kind: &str, root_key: &str) -> String {
  hierarchy_key(&[child_kind, root_key.trim_end_matches(KEY_SEPARATOR)])
}

pub(crate) fn key_matches(key: &str, prefix: &str) -> bool {
  match key.strip_prefix(prefix) {
    Some(rest) => rest.is_empty() || rest.starts_with(KEY_SEPARATOR),
    None => false,
  }
}
