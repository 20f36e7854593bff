use std::cmp::Ordering;

use serde_json::Value;

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
  String(String),
  Number(f64),
  Bool(bool),
  Null,
}

impl Literal {
  /// Compare an attribute value with this literal.
  ///
  /// Only like-typed values are comparable: strings lexically, numbers
  /// numerically, booleans with `false < true`. Any other pairing, including a
  /// `null` attribute, yields `None` and the comparison does not match.
  pub fn compare(&self, attribute: &Value) -> Option<Ordering> {
    match (attribute, self) {
      (Value::String(a), Literal::String(b)) => Some(a.as_str().cmp(b.as_str())),
      (Value::Number(a), Literal::Number(b)) => a.as_f64()?.partial_cmp(b),
      (Value::Bool(a), Literal::Bool(b)) => Some(a.cmp(b)),
      _ => None,
    }
  }
}

impl std::fmt::Display for Literal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
      Literal::Number(n) => write!(f, "{}", n),
      Literal::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
      Literal::Null => write!(f, "NULL"),
    }
  }
}

fn type_rank(value: &Value) -> u8 {
  match value {
    Value::Null => 0,
    Value::Bool(_) => 1,
    Value::Number(_) => 2,
    Value::String(_) => 3,
    Value::Array(_) => 4,
    Value::Object(_) => 5,
  }
}

/// Total order over resolved sort keys.
///
/// Values of one type compare naturally; mixed types order by type
/// (bool < number < string < array < object). Arrays and objects compare by
/// their JSON text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
  match (a, b) {
    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
    (Value::Number(x), Value::Number(y)) => {
      let x = x.as_f64().unwrap_or(f64::NAN);
      let y = y.as_f64().unwrap_or(f64::NAN);
      x.total_cmp(&y)
    }
    (Value::String(x), Value::String(y)) => x.cmp(y),
    (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
      a.to_string().cmp(&b.to_string())
    }
    _ => type_rank(a).cmp(&type_rank(b)),
  }
}

/// Translate a SQL `LIKE` pattern (`%` any run, `_` one char) to an anchored
/// regular expression.
pub fn like_to_regex(pattern: &str) -> Result<regex::Regex, regex::Error> {
  let mut regex_str = String::with_capacity(pattern.len() * 2 + 6);
  regex_str.push_str("(?s)^");

  for c in pattern.chars() {
    match c {
      '%' => regex_str.push_str(".*"),
      '_' => regex_str.push('.'),
      _ => regex_str.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
    }
  }

  regex_str.push('$');
  regex::Regex::new(&regex_str)
}
