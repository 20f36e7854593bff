//! Error taxonomy for the object cache

use thiserror::Error;

/// Errors returned by cache construction, mutation and queries.
///
/// Absent objects are not errors: `get` returns `None` and `delete` of an
/// unknown identity is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
  /// Bad index setup. Surfaced when the cache is built, or when an object of a
  /// kind with no registered hierarchy creator reaches a hierarchy index.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// Malformed object passed to `add`. Nothing from the batch was applied.
  #[error("validation error: {0}")]
  Validation(String),

  /// A registered indexer could not derive keys for an otherwise valid object.
  /// Nothing from the batch was applied.
  #[error("index '{index}' failed for {kind} {uid}: {reason}")]
  Index {
    index: String,
    kind: String,
    uid: String,
    reason: String,
  },

  /// Unparseable filter or order expression. The query returns nothing.
  #[error("syntax error in '{expression}' at offset {position}: {message}")]
  QuerySyntax {
    expression: String,
    position: usize,
    message: String,
  },
}

impl CacheError {
  pub(crate) fn syntax(expression: &str, position: usize, message: impl Into<String>) -> Self {
    CacheError::QuerySyntax {
      expression: expression.to_string(),
      position,
      message: message.into(),
    }
  }
}

pub type Result<T> = std::result::Result<T, CacheError>;
