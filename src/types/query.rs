use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::StoredObject;

/// Parameters of a cache query.
///
/// `filter` and `order_by` use the expression grammar of [`crate::query`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
  pub kind: String,
  #[serde(default)]
  pub namespace: Option<String>,
  #[serde(default)]
  pub filter: Option<String>,
  #[serde(default)]
  pub order_by: Option<String>,
  #[serde(default)]
  pub offset: Option<usize>,
  #[serde(default)]
  pub limit: Option<usize>,
}

impl QueryRequest {
  pub fn new(kind: impl Into<String>) -> Self {
    Self {
      kind: kind.into(),
      ..Default::default()
    }
  }

  pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
    self.namespace = Some(namespace.into());
    self
  }

  pub fn filter(mut self, filter: impl Into<String>) -> Self {
    self.filter = Some(filter.into());
    self
  }

  pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
    self.order_by = Some(order_by.into());
    self
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
  #[default]
  Asc,
  Desc,
}

/// One page of matches plus the unpaginated match count.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
  pub items: Vec<Arc<StoredObject>>,
  pub total: usize,
}
