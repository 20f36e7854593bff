use std::cmp::Ordering;

use super::path::AttributePath;
use super::value::{compare_values, Literal};
use crate::types::{OrderDirection, StoredObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
}

impl CompareOp {
  fn accepts(self, ord: Ordering) -> bool {
    match self {
      CompareOp::Eq => ord == Ordering::Equal,
      CompareOp::Ne => ord != Ordering::Equal,
      CompareOp::Lt => ord == Ordering::Less,
      CompareOp::Le => ord != Ordering::Greater,
      CompareOp::Gt => ord == Ordering::Greater,
      CompareOp::Ge => ord != Ordering::Less,
    }
  }
}

/// Compiled filter expression.
#[derive(Debug, Clone)]
pub enum FilterExpr {
  Compare {
    path: AttributePath,
    op: CompareOp,
    value: Literal,
  },
  Like {
    path: AttributePath,
    pattern: regex::Regex,
    negated: bool,
  },
  IsNull {
    path: AttributePath,
    negated: bool,
  },
  And(Box<FilterExpr>, Box<FilterExpr>),
  Or(Box<FilterExpr>, Box<FilterExpr>),
  Not(Box<FilterExpr>),
}

impl FilterExpr {
  /// Whether `object` passes the filter. Only a definite `true` passes.
  pub fn matches(&self, object: &StoredObject) -> bool {
    self.evaluate(object) == Some(true)
  }

  /// Three-valued evaluation, `None` meaning unknown.
  ///
  /// A comparison or `LIKE` on an attribute that does not resolve, or that
  /// has another type than the literal, is unknown. `NOT` keeps unknown
  /// unknown, `AND` and `OR` follow SQL: `false AND unknown` is `false`,
  /// `true OR unknown` is `true`, anything else involving unknown is unknown.
  pub fn evaluate(&self, object: &StoredObject) -> Option<bool> {
    let root = object.attributes();
    match self {
      FilterExpr::Compare { path, op, value } => {
        let ord = value.compare(path.resolve(root)?)?;
        Some(op.accepts(ord))
      }
      FilterExpr::Like {
        path,
        pattern,
        negated,
      } => {
        let s = path.resolve(root)?.as_str()?;
        Some(pattern.is_match(s) != *negated)
      }
      FilterExpr::IsNull { path, negated } => {
        let is_null = path.resolve(root).map_or(true, |v| v.is_null());
        Some(is_null != *negated)
      }
      FilterExpr::And(a, b) => match (a.evaluate(object), b.evaluate(object)) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
      },
      FilterExpr::Or(a, b) => match (a.evaluate(object), b.evaluate(object)) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
      },
      FilterExpr::Not(inner) => inner.evaluate(object).map(|v| !v),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
  pub path: AttributePath,
  pub direction: OrderDirection,
}

/// Compiled order expression: one or more terms, earlier terms dominate.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpr {
  pub terms: Vec<OrderTerm>,
}

impl OrderExpr {
  /// Compare two objects. Unresolved and `null` keys sort after every resolved
  /// key in both directions. Returns `Equal` when every term ties; the caller's
  /// stable sort then keeps insertion order.
  pub fn compare(&self, a: &StoredObject, b: &StoredObject) -> Ordering {
    for term in &self.terms {
      let ka = term.path.resolve(a.attributes()).filter(|v| !v.is_null());
      let kb = term.path.resolve(b.attributes()).filter(|v| !v.is_null());
      let ord = match (ka, kb) {
        (Some(x), Some(y)) => {
          let ord = compare_values(x, y);
          match term.direction {
            OrderDirection::Asc => ord,
            OrderDirection::Desc => ord.reverse(),
          }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
      };
      if ord != Ordering::Equal {
        return ord;
      }
    }
    Ordering::Equal
  }
}

#[cfg(test)]
mod tests {
  use crate::query::compile_filter;
  use crate::types::StoredObject;
  use serde_json::json;

  fn eval(filter: &str, object: &StoredObject) -> Option<bool> {
    compile_filter(filter).unwrap().evaluate(object)
  }

  #[test]
  fn missing_attribute_is_unknown_through_not() {
    let bare = StoredObject::new("AddressSpace", "u1", "ns", "as");
    assert_eq!(eval("`$.Spec.Plan` = 'x'", &bare), None);
    assert_eq!(eval("NOT `$.Spec.Plan` = 'x'", &bare), None);
    assert_eq!(eval("NOT `$.Spec.Plan` LIKE 'x%'", &bare), None);
    assert_eq!(eval("`$.Spec.Plan` IS NULL", &bare), Some(true));
  }

  #[test]
  fn and_or_follow_sql_unknown_rules() {
    let obj = StoredObject::new("AddressSpace", "u1", "ns", "as").with_spec(json!({"Plan": "small"}));
    assert_eq!(eval("`$.Spec.Missing` = 1 AND `$.Spec.Plan` = 'large'", &obj), Some(false));
    assert_eq!(eval("`$.Spec.Missing` = 1 AND `$.Spec.Plan` = 'small'", &obj), None);
    assert_eq!(eval("`$.Spec.Missing` = 1 OR `$.Spec.Plan` = 'small'", &obj), Some(true));
    assert_eq!(eval("`$.Spec.Missing` = 1 OR `$.Spec.Plan` = 'large'", &obj), None);
    assert_eq!(eval("NOT (`$.Spec.Missing` = 1 AND `$.Spec.Plan` = 'large')", &obj), Some(true));
  }
}
