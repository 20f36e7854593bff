//! Hierarchy key creators for the messaging kinds
//!
//! Every key starts with the object's kind followed by its namespace and, for
//! children, the owning address space:
//!
//! ```text
//! AddressSpace/<ns>/<name>
//! Address/<ns>/<addressSpace>/<name>
//! Connection/<ns>/<addressSpace>/<name>
//! Link/<ns>/<addressSpace>/<connection>/<name>
//! ```
//!
//! so `descendants("<ns>/<addressSpace>", "Connection")` finds the connections
//! of one address space.

use std::sync::Arc;

use crate::index::{
  hierarchy_key, HierarchyIndex, HierarchyKeyCreator, IndexSpecifier, UidIndex, KEY_SEPARATOR,
};
use crate::types::StoredObject;

pub const ADDRESS_SPACE: &str = "AddressSpace";
pub const ADDRESS: &str = "Address";
pub const CONNECTION: &str = "Connection";
pub const LINK: &str = "Link";

pub const BUILTIN_KINDS: [&str; 4] = [ADDRESS_SPACE, ADDRESS, CONNECTION, LINK];

/// Root key of an address space, as passed to `Cache::descendants`.
pub fn address_space_key(namespace: &str, name: &str) -> String {
  hierarchy_key(&[namespace, name])
}

/// Rejects values containing [`KEY_SEPARATOR`].
fn segment<'a>(label: &str, value: &'a str) -> Result<&'a str, String> {
  if value.contains(KEY_SEPARATOR) {
    return Err(format!(
      "{} '{}' contains the key separator '{}'",
      label, value, KEY_SEPARATOR
    ));
  }
  Ok(value)
}

fn spec_str<'a>(object: &'a StoredObject, field: &str) -> Option<&'a str> {
  object
    .spec()?
    .get(field)?
    .as_str()
    .filter(|s| !s.is_empty())
}

fn required_spec<'a>(object: &'a StoredObject, field: &str) -> Result<&'a str, String> {
  let value = spec_str(object, field).ok_or_else(|| format!("missing Spec.{}", field))?;
  segment(&format!("Spec.{}", field), value)
}

fn namespace_segment(object: &StoredObject) -> Result<&str, String> {
  segment("namespace", object.namespace())
}

fn name_segment(object: &StoredObject) -> Result<&str, String> {
  segment("name", object.name())
}

pub fn address_space_keys(object: &StoredObject) -> Result<Vec<String>, String> {
  Ok(vec![hierarchy_key(&[
    ADDRESS_SPACE,
    namespace_segment(object)?,
    name_segment(object)?,
  ])])
}

/// The owning address space is `Spec.AddressSpace`, or else the part of the
/// address name before the first `.`.
pub fn address_keys(object: &StoredObject) -> Result<Vec<String>, String> {
  let name = name_segment(object)?;
  let address_space = match spec_str(object, "AddressSpace") {
    Some(space) => segment("Spec.AddressSpace", space)?,
    None => name
      .split_once('.')
      .map(|(space, _)| space)
      .filter(|space| !space.is_empty())
      .ok_or_else(|| {
        format!(
          "address '{}' has no Spec.AddressSpace and no '<addressspace>.' name prefix",
          name
        )
      })?,
  };
  Ok(vec![hierarchy_key(&[
    ADDRESS,
    namespace_segment(object)?,
    address_space,
    name,
  ])])
}

pub fn connection_keys(object: &StoredObject) -> Result<Vec<String>, String> {
  let address_space = required_spec(object, "AddressSpace")?;
  Ok(vec![hierarchy_key(&[
    CONNECTION,
    namespace_segment(object)?,
    address_space,
    name_segment(object)?,
  ])])
}

pub fn link_keys(object: &StoredObject) -> Result<Vec<String>, String> {
  let address_space = required_spec(object, "AddressSpace")?;
  let connection = required_spec(object, "Connection")?;
  Ok(vec![hierarchy_key(&[
    LINK,
    namespace_segment(object)?,
    address_space,
    connection,
    name_segment(object)?,
  ])])
}

/// Creator for a built-in kind.
pub fn builtin_creator(kind: &str) -> Option<HierarchyKeyCreator> {
  let creator: HierarchyKeyCreator = match kind {
    ADDRESS_SPACE => Arc::new(address_space_keys),
    ADDRESS => Arc::new(address_keys),
    CONNECTION => Arc::new(connection_keys),
    LINK => Arc::new(link_keys),
    _ => return None,
  };
  Some(creator)
}

/// Hierarchy index over every built-in kind.
pub fn hierarchy_index() -> HierarchyIndex {
  BUILTIN_KINDS.iter().fold(HierarchyIndex::new(), |index, kind| {
    match builtin_creator(kind) {
      Some(creator) => index.with_shared_creator(*kind, creator),
      None => index,
    }
  })
}

/// `id` identity index plus `hierarchy` over the built-in kinds.
pub fn default_indexes() -> Vec<IndexSpecifier> {
  vec![
    IndexSpecifier::new("id", UidIndex),
    IndexSpecifier::new("hierarchy", hierarchy_index()),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn address_space_is_a_root() {
    let space = StoredObject::new(ADDRESS_SPACE, "u", "ns", "as");
    assert_eq!(address_space_keys(&space).unwrap(), vec!["AddressSpace/ns/as"]);
  }

  #[test]
  fn connection_hangs_under_its_address_space() {
    let conn = StoredObject::new(CONNECTION, "u", "ns", "host:1234")
      .with_spec(json!({"AddressSpace": "as"}));
    assert_eq!(
      connection_keys(&conn).unwrap(),
      vec!["Connection/ns/as/host:1234"]
    );

    let orphan = StoredObject::new(CONNECTION, "u", "ns", "host:1234");
    assert!(connection_keys(&orphan).is_err());
  }

  #[test]
  fn address_space_of_address_from_spec_or_name() {
    let by_name = StoredObject::new(ADDRESS, "u", "ns", "as.queue1");
    assert_eq!(address_keys(&by_name).unwrap(), vec!["Address/ns/as/as.queue1"]);

    let by_spec = StoredObject::new(ADDRESS, "u", "ns", "queue1")
      .with_spec(json!({"AddressSpace": "other"}));
    assert_eq!(address_keys(&by_spec).unwrap(), vec!["Address/ns/other/queue1"]);

    assert!(address_keys(&StoredObject::new(ADDRESS, "u", "ns", "queue1")).is_err());
  }

  #[test]
  fn link_needs_connection() {
    let link = StoredObject::new(LINK, "u", "ns", "l1")
      .with_spec(json!({"AddressSpace": "as", "Connection": "host:1"}));
    assert_eq!(link_keys(&link).unwrap(), vec!["Link/ns/as/host:1/l1"]);

    let partial = StoredObject::new(LINK, "u", "ns", "l1").with_spec(json!({"AddressSpace": "as"}));
    assert!(link_keys(&partial).is_err());
  }

  #[test]
  fn segments_must_not_contain_the_separator() {
    let conn = StoredObject::new(CONNECTION, "u", "ns", "c1")
      .with_spec(json!({"AddressSpace": "as/other"}));
    assert!(connection_keys(&conn).unwrap_err().contains("Spec.AddressSpace"));

    let link = StoredObject::new(LINK, "u", "ns", "l1")
      .with_spec(json!({"AddressSpace": "as", "Connection": "host/1"}));
    assert!(link_keys(&link).is_err());

    assert!(address_space_keys(&StoredObject::new(ADDRESS_SPACE, "u", "a/b", "as")).is_err());
    assert!(address_keys(&StoredObject::new(ADDRESS, "u", "ns", "as.topic/1")).is_err());
    assert_eq!(
      address_space_keys(&StoredObject::new(ADDRESS_SPACE, "u", "", "as")).unwrap(),
      vec!["AddressSpace//as"]
    );
  }

  #[test]
  fn builtin_index_covers_every_kind() {
    let kinds: Vec<_> = hierarchy_index().kinds().map(str::to_string).collect();
    assert_eq!(kinds.len(), BUILTIN_KINDS.len());
    assert!(builtin_creator("Namespace").is_none());
  }
}
