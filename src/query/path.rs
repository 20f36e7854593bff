use serde_json::Value;

/// A `$`-rooted path into an object's attribute tree, e.g. `$.ObjectMeta.Name`
/// or `$.Status.Messages[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
  raw: String,
  segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Field(String),
  Index(usize),
}

impl AttributePath {
  /// Parse the text between backticks. Errors carry the byte offset within
  /// `raw`.
  pub fn parse(raw: &str) -> Result<Self, (usize, String)> {
    let trimmed = raw.trim();
    let lead = raw.len() - raw.trim_start().len();
    let Some(rest) = trimmed.strip_prefix('$') else {
      return Err((lead, "attribute path must start with '$'".into()));
    };

    let bytes = rest.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
      let at = lead + 1 + i;
      match bytes[i] {
        b'.' => {
          let start = i + 1;
          let mut end = start;
          while end < bytes.len() && bytes[end] != b'.' && bytes[end] != b'[' {
            end += 1;
          }
          let field = rest[start..end].trim();
          if field.is_empty() {
            return Err((at, "empty field name".into()));
          }
          segments.push(Segment::Field(field.to_string()));
          i = end;
        }
        b'[' => {
          let Some(close) = rest[i..].find(']') else {
            return Err((at, "unterminated '['".into()));
          };
          let inner = rest[i + 1..i + close].trim();
          let segment = if let Some(quoted) = inner
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
          {
            Segment::Field(quoted.to_string())
          } else {
            inner
              .parse::<usize>()
              .map(Segment::Index)
              .map_err(|_| (at, format!("invalid index '{}'", inner)))?
          };
          segments.push(segment);
          i += close + 1;
        }
        _ => return Err((at, "expected '.' or '['".into())),
      }
    }

    Ok(Self {
      raw: trimmed.to_string(),
      segments,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  /// The value at this path, or `None` when any segment is missing.
  /// A JSON `null` resolves to `Some(Value::Null)`.
  pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
    self
      .segments
      .iter()
      .try_fold(root, |value, segment| match segment {
        Segment::Field(name) => value.as_object()?.get(name),
        Segment::Index(idx) => value.as_array()?.get(*idx),
      })
  }
}

impl std::fmt::Display for AttributePath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "`{}`", self.raw)
  }
}
