use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{CacheError, Result};

/// Process-wide unique identity of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
  /// A fresh random identity.
  pub fn generate() -> Self {
    Uid(Uuid::new_v4().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.trim().is_empty()
  }
}

impl std::fmt::Display for Uid {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Uid {
  fn from(s: &str) -> Self {
    Uid(s.to_string())
  }
}

impl From<String> for Uid {
  fn from(s: String) -> Self {
    Uid(s)
  }
}

impl From<Uuid> for Uid {
  fn from(u: Uuid) -> Self {
    Uid(u.to_string())
  }
}

/// An entity mirrored from the control system.
///
/// The attribute tree always carries `Kind` and `ObjectMeta` (`Name`,
/// `Namespace`, `UID`) so that filter and order paths such as
/// `$.ObjectMeta.Name` resolve against the same values as the typed accessors.
/// `Spec` and `Status` are free-form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObject {
  kind: String,
  uid: Uid,
  namespace: String,
  name: String,
  attributes: Value,
}

impl StoredObject {
  pub fn new(
    kind: impl Into<String>,
    uid: impl Into<Uid>,
    namespace: impl Into<String>,
    name: impl Into<String>,
  ) -> Self {
    let kind = kind.into();
    let uid = uid.into();
    let namespace = namespace.into();
    let name = name.into();
    let attributes = json!({
      "Kind": kind,
      "ObjectMeta": {
        "Name": name,
        "Namespace": namespace,
        "UID": uid.as_str(),
      },
    });
    Self {
      kind,
      uid,
      namespace,
      name,
      attributes,
    }
  }

  pub fn with_spec(self, spec: Value) -> Self {
    self.with_section("Spec", spec)
  }

  pub fn with_status(self, status: Value) -> Self {
    self.with_section("Status", status)
  }

  /// Attach a label under `ObjectMeta.Labels`.
  pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    if let Some(meta) = self
      .attributes
      .get_mut("ObjectMeta")
      .and_then(Value::as_object_mut)
    {
      let labels = meta
        .entry("Labels")
        .or_insert_with(|| Value::Object(Map::new()));
      if let Some(labels) = labels.as_object_mut() {
        labels.insert(key.into(), Value::String(value.into()));
      }
    }
    self
  }

  fn with_section(mut self, section: &str, value: Value) -> Self {
    if let Some(map) = self.attributes.as_object_mut() {
      map.insert(section.to_string(), value);
    }
    self
  }

  pub fn kind(&self) -> &str {
    &self.kind
  }

  pub fn uid(&self) -> &Uid {
    &self.uid
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn attributes(&self) -> &Value {
    &self.attributes
  }

  pub fn spec(&self) -> Option<&Value> {
    self.attributes.get("Spec")
  }

  pub fn status(&self) -> Option<&Value> {
    self.attributes.get("Status")
  }

  /// Reject objects the cache cannot index.
  pub(crate) fn validate(&self) -> Result<()> {
    if self.uid.is_empty() {
      return Err(CacheError::Validation(format!(
        "{} {}/{} has no identity",
        self.kind, self.namespace, self.name
      )));
    }
    if self.kind.trim().is_empty() {
      return Err(CacheError::Validation(format!(
        "object {} has no kind",
        self.uid
      )));
    }
    if self.name.trim().is_empty() {
      return Err(CacheError::Validation(format!(
        "{} {} has no name",
        self.kind, self.uid
      )));
    }
    Ok(())
  }
}

/// Flat serialized form of an object, as found in snapshot files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
  pub kind: String,
  #[serde(default)]
  pub uid: Option<String>,
  #[serde(default)]
  pub namespace: String,
  pub name: String,
  #[serde(default)]
  pub spec: Option<Value>,
  #[serde(default)]
  pub status: Option<Value>,
}

impl From<ObjectRecord> for StoredObject {
  fn from(record: ObjectRecord) -> Self {
    let uid = record.uid.map(Uid::from).unwrap_or_else(Uid::generate);
    let mut object = StoredObject::new(record.kind, uid, record.namespace, record.name);
    if let Some(spec) = record.spec {
      object = object.with_spec(spec);
    }
    if let Some(status) = record.status {
      object = object.with_status(status);
    }
    object
  }
}
