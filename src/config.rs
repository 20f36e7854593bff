//! Cache configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::Cache;
use crate::error::{CacheError, Result};
use crate::index::{HierarchyIndex, IndexSpecifier, UidIndex};
use crate::kinds::{builtin_creator, BUILTIN_KINDS};
use crate::query::ExpressionCache;

/// Expand environment variables in a string.
/// Supports $VAR_NAME and ${VAR_NAME} syntax.
fn expand_env_vars(input: &str) -> String {
  let mut result = input.to_string();

  // ${VAR_NAME} first, it is the more specific form
  while let Some(start) = result.find("${") {
    if let Some(end) = result[start..].find('}') {
      let var_name = &result[start + 2..start + end];
      let value = std::env::var(var_name).unwrap_or_default();
      result = format!(
        "{}{}{}",
        &result[..start],
        value,
        &result[start + end + 1..]
      );
    } else {
      break;
    }
  }

  let mut i = 0;
  while i < result.len() {
    if result[i..].starts_with('$') {
      let rest = &result[i + 1..];
      let var_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count();
      if var_len > 0 {
        let var_name = &rest[..var_len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..i], value, &rest[var_len..]);
        i += value.len();
        continue;
      }
    }
    i += result[i..].chars().next().map_or(1, char::len_utf8);
  }

  result
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
  #[default]
  Uid,
  Hierarchy,
}

impl std::str::FromStr for IndexType {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "uid" | "id" | "identity" => Ok(IndexType::Uid),
      "hierarchy" | "hierarchical" => Ok(IndexType::Hierarchy),
      _ => Err(format!("Unknown index type: {}", s)),
    }
  }
}

/// One registered index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSection {
  pub name: String,

  #[serde(rename = "type", default)]
  pub index_type: IndexType,

  /// Kinds with a hierarchy creator (hierarchy indexes only)
  #[serde(default)]
  pub kinds: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_level")]
  pub level: String,
}

fn default_level() -> String {
  "info".into()
}

impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_level(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
  /// Indexes, in registration order
  #[serde(default = "default_indexes")]
  pub indexes: Vec<IndexSection>,

  /// Compiled filter/order expressions kept per expression kind (0 = off)
  #[serde(default = "default_expression_cache_size")]
  pub expression_cache_size: usize,

  #[serde(default)]
  pub logging: LoggingSection,
}

fn default_indexes() -> Vec<IndexSection> {
  vec![
    IndexSection {
      name: "id".into(),
      index_type: IndexType::Uid,
      kinds: Vec::new(),
    },
    IndexSection {
      name: "hierarchy".into(),
      index_type: IndexType::Hierarchy,
      kinds: BUILTIN_KINDS.iter().map(|k| k.to_string()).collect(),
    },
  ]
}

fn default_expression_cache_size() -> usize {
  256
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      indexes: default_indexes(),
      expression_cache_size: default_expression_cache_size(),
      logging: LoggingSection::default(),
    }
  }
}

impl CacheConfig {
  pub fn from_yaml(content: &str) -> Result<Self> {
    let expanded = expand_env_vars(content);
    serde_yaml::from_str(&expanded)
      .map_err(|e| CacheError::Configuration(format!("invalid config: {}", e)))
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
      CacheError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    Self::from_yaml(&content)
  }

  pub fn find_and_load() -> Result<Option<Self>> {
    for p in ["resource-mirror.yaml", "resource-mirror.yml"] {
      if Path::new(p).exists() {
        tracing::info!("Loading config from {}", p);
        return Ok(Some(Self::from_file(p)?));
      }
    }
    Ok(None)
  }

  /// Resolve the index sections into specifiers. Hierarchy kinds must name
  /// built-in kinds.
  pub fn index_specifiers(&self) -> Result<Vec<IndexSpecifier>> {
    self
      .indexes
      .iter()
      .map(|section| match section.index_type {
        IndexType::Uid => Ok(IndexSpecifier::new(section.name.clone(), UidIndex)),
        IndexType::Hierarchy => {
          let index = section.kinds.iter().try_fold(HierarchyIndex::new(), |index, kind| {
            builtin_creator(kind)
              .map(|creator| index.with_shared_creator(kind.clone(), creator))
              .ok_or_else(|| {
                CacheError::Configuration(format!(
                  "index '{}': no hierarchy creator for kind '{}'",
                  section.name, kind
                ))
              })
          })?;
          Ok(IndexSpecifier::new(section.name.clone(), index))
        }
      })
      .collect()
  }

  pub fn build(&self) -> Result<Cache> {
    Cache::with_expression_cache(
      self.index_specifiers()?,
      ExpressionCache::new(self.expression_cache_size),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_register_identity_and_hierarchy() {
    let config = CacheConfig::default();
    assert_eq!(config.indexes.len(), 2);
    assert_eq!(config.indexes[0].index_type, IndexType::Uid);
    assert_eq!(config.indexes[1].kinds.len(), BUILTIN_KINDS.len());
    assert_eq!(config.expression_cache_size, 256);
    assert_eq!(config.logging.level, "info");
  }

  #[test]
  fn expands_environment_variables() {
    std::env::set_var("RESOURCE_MIRROR_TEST_LEVEL", "debug");
    assert_eq!(expand_env_vars("level: ${RESOURCE_MIRROR_TEST_LEVEL}"), "level: debug");
    assert_eq!(expand_env_vars("level: $RESOURCE_MIRROR_TEST_LEVEL"), "level: debug");
    assert_eq!(expand_env_vars("cost: $"), "cost: $");
  }

  #[test]
  fn index_type_parse() {
    assert_eq!("uid".parse::<IndexType>().unwrap(), IndexType::Uid);
    assert_eq!("Hierarchy".parse::<IndexType>().unwrap(), IndexType::Hierarchy);
    assert!("btree".parse::<IndexType>().is_err());
  }
}
