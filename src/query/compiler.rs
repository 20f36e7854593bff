//! Recursive-descent compiler for filter and order expressions
//!
//! Filter grammar (keywords are case-insensitive):
//!
//! ```text
//! filter     := or
//! or         := and ( OR and )*
//! and        := unary ( AND unary )*
//! unary      := NOT unary | '(' or ')' | comparison
//! comparison := path op literal
//!             | path [NOT] LIKE string
//!             | path IS [NOT] NULL
//! op         := = | != | <> | < | <= | > | >=
//! literal    := 'string' | number | TRUE | FALSE | NULL
//! path       := `$...`
//! ```
//!
//! Order grammar: `order := path [ASC | DESC] ( ',' path [ASC | DESC] )*`.

use super::expr::{CompareOp, FilterExpr, OrderExpr, OrderTerm};
use super::lexer::{tokenize, Spanned, Token};
use super::path::AttributePath;
use super::value::{like_to_regex, Literal};
use crate::error::{CacheError, Result};
use crate::types::OrderDirection;

pub fn compile_filter(input: &str) -> Result<FilterExpr> {
  let mut parser = Parser::new(input)?;
  let expr = parser.parse_or()?;
  parser.expect_end()?;
  Ok(expr)
}

pub fn compile_order(input: &str) -> Result<OrderExpr> {
  let mut parser = Parser::new(input)?;
  let mut terms = vec![parser.parse_order_term()?];
  while parser.peek() == &Token::Comma {
    parser.advance();
    terms.push(parser.parse_order_term()?);
  }
  parser.expect_end()?;
  Ok(OrderExpr { terms })
}

struct Parser<'a> {
  input: &'a str,
  tokens: Vec<Spanned>,
  cursor: usize,
}

impl<'a> Parser<'a> {
  fn new(input: &'a str) -> Result<Self> {
    Ok(Self {
      input,
      tokens: tokenize(input)?,
      cursor: 0,
    })
  }

  fn peek(&self) -> &Token {
    &self.tokens[self.cursor].token
  }

  fn pos(&self) -> usize {
    self.tokens[self.cursor].pos
  }

  fn advance(&mut self) -> Spanned {
    let current = self.tokens[self.cursor].clone();
    if self.cursor + 1 < self.tokens.len() {
      self.cursor += 1;
    }
    current
  }

  fn error(&self, message: impl Into<String>) -> CacheError {
    CacheError::syntax(self.input, self.pos(), message)
  }

  fn is_keyword(&self, keyword: &str) -> bool {
    matches!(self.peek(), Token::Word(w) if w.eq_ignore_ascii_case(keyword))
  }

  fn eat_keyword(&mut self, keyword: &str) -> bool {
    if self.is_keyword(keyword) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
    if self.eat_keyword(keyword) {
      Ok(())
    } else {
      Err(self.error(format!("expected {}", keyword)))
    }
  }

  fn expect_end(&self) -> Result<()> {
    match self.peek() {
      Token::Eof => Ok(()),
      other => Err(self.error(format!("unexpected {}", describe(other)))),
    }
  }

  fn parse_or(&mut self) -> Result<FilterExpr> {
    let mut left = self.parse_and()?;
    while self.eat_keyword("OR") {
      let right = self.parse_and()?;
      left = FilterExpr::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn parse_and(&mut self) -> Result<FilterExpr> {
    let mut left = self.parse_unary()?;
    while self.eat_keyword("AND") {
      let right = self.parse_unary()?;
      left = FilterExpr::And(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> Result<FilterExpr> {
    if self.eat_keyword("NOT") {
      return Ok(FilterExpr::Not(Box::new(self.parse_unary()?)));
    }
    if self.peek() == &Token::LParen {
      self.advance();
      let inner = self.parse_or()?;
      if self.peek() != &Token::RParen {
        return Err(self.error("expected ')'"));
      }
      self.advance();
      return Ok(inner);
    }
    self.parse_comparison()
  }

  fn parse_path(&mut self) -> Result<AttributePath> {
    let Spanned { token, pos } = self.advance();
    match token {
      Token::Path(raw) => AttributePath::parse(&raw)
        .map_err(|(offset, message)| CacheError::syntax(self.input, pos + 1 + offset, message)),
      other => Err(CacheError::syntax(
        self.input,
        pos,
        format!("expected attribute path, found {}", describe(&other)),
      )),
    }
  }

  fn parse_comparison(&mut self) -> Result<FilterExpr> {
    let path = self.parse_path()?;

    if self.eat_keyword("IS") {
      let negated = self.eat_keyword("NOT");
      self.expect_keyword("NULL")?;
      return Ok(FilterExpr::IsNull { path, negated });
    }

    let negated = self.eat_keyword("NOT");
    if self.is_keyword("LIKE") {
      self.advance();
      let pos = self.pos();
      let Token::Str(pattern) = self.advance().token else {
        return Err(CacheError::syntax(self.input, pos, "LIKE requires a string pattern"));
      };
      let pattern = like_to_regex(&pattern)
        .map_err(|e| CacheError::syntax(self.input, pos, e.to_string()))?;
      return Ok(FilterExpr::Like {
        path,
        pattern,
        negated,
      });
    }
    if negated {
      return Err(self.error("expected LIKE after NOT"));
    }

    let op = match self.peek() {
      Token::Op("=") => CompareOp::Eq,
      Token::Op("!=") | Token::Op("<>") => CompareOp::Ne,
      Token::Op("<") => CompareOp::Lt,
      Token::Op("<=") => CompareOp::Le,
      Token::Op(">") => CompareOp::Gt,
      Token::Op(">=") => CompareOp::Ge,
      other => {
        return Err(self.error(format!(
          "expected comparison operator, found {}",
          describe(other)
        )))
      }
    };
    self.advance();

    let value = self.parse_literal()?;
    Ok(FilterExpr::Compare { path, op, value })
  }

  fn parse_literal(&mut self) -> Result<Literal> {
    let literal = match self.peek() {
      Token::Str(s) => Literal::String(s.clone()),
      Token::Number(n) => Literal::Number(*n),
      Token::Word(w) if w.eq_ignore_ascii_case("TRUE") => Literal::Bool(true),
      Token::Word(w) if w.eq_ignore_ascii_case("FALSE") => Literal::Bool(false),
      Token::Word(w) if w.eq_ignore_ascii_case("NULL") => Literal::Null,
      other => return Err(self.error(format!("expected literal, found {}", describe(other)))),
    };
    self.advance();
    Ok(literal)
  }

  fn parse_order_term(&mut self) -> Result<OrderTerm> {
    let path = self.parse_path()?;
    let direction = if self.eat_keyword("DESC") {
      OrderDirection::Desc
    } else {
      self.eat_keyword("ASC");
      OrderDirection::Asc
    };
    Ok(OrderTerm { path, direction })
  }
}

fn describe(token: &Token) -> String {
  match token {
    Token::Path(p) => format!("path `{}`", p),
    Token::Str(s) => format!("string '{}'", s),
    Token::Number(n) => format!("number {}", n),
    Token::Word(w) => format!("'{}'", w),
    Token::Op(op) => format!("'{}'", op),
    Token::LParen => "'('".into(),
    Token::RParen => "')'".into(),
    Token::Comma => "','".into(),
    Token::Eof => "end of expression".into(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compiles_single_equality() {
    match compile_filter("`$.ObjectMeta.Name` = 'as'").unwrap() {
      FilterExpr::Compare { path, op, value } => {
        assert_eq!(path.as_str(), "$.ObjectMeta.Name");
        assert_eq!(op, CompareOp::Eq);
        assert_eq!(value, Literal::String("as".into()));
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn and_binds_tighter_than_or() {
    let expr = compile_filter("`$.a` = 1 OR `$.b` = 2 and `$.c` = 3").unwrap();
    match expr {
      FilterExpr::Or(_, right) => assert!(matches!(*right, FilterExpr::And(_, _))),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn parentheses_and_not() {
    let expr = compile_filter("NOT (`$.a` = 1 OR `$.b` = 2)").unwrap();
    match expr {
      FilterExpr::Not(inner) => assert!(matches!(*inner, FilterExpr::Or(_, _))),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn like_and_null_tests() {
    assert!(matches!(
      compile_filter("`$.ObjectMeta.Name` NOT LIKE 'my%'").unwrap(),
      FilterExpr::Like { negated: true, .. }
    ));
    assert!(matches!(
      compile_filter("`$.Spec.Plan` is not null").unwrap(),
      FilterExpr::IsNull { negated: true, .. }
    ));
  }

  #[test]
  fn rejects_malformed_filters() {
    for bad in [
      "",
      "`$.a`",
      "`$.a` =",
      "`$.a` = 'x' AND",
      "'x' = `$.a`",
      "`$.a` = 'x')",
      "(`$.a` = 'x'",
      "`$.a` LIKE 5",
      "`$.a` NOT = 1",
      "`a.b` = 1",
      "`$.a` = 'x' `$.b` = 'y'",
    ] {
      assert!(
        matches!(compile_filter(bad), Err(CacheError::QuerySyntax { .. })),
        "accepted: {}",
        bad
      );
    }
  }

  #[test]
  fn path_errors_point_into_the_expression() {
    match compile_filter("`$..Name` = 'x'") {
      Err(CacheError::QuerySyntax { position, .. }) => assert_eq!(position, 2),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn compiles_order_terms() {
    let order = compile_order("`$.ObjectMeta.Name` DESC, `$.ObjectMeta.Namespace`").unwrap();
    assert_eq!(order.terms.len(), 2);
    assert_eq!(order.terms[0].direction, OrderDirection::Desc);
    assert_eq!(order.terms[1].direction, OrderDirection::Asc);

    let asc = compile_order("`$.ObjectMeta.Name` asc").unwrap();
    assert_eq!(asc.terms[0].direction, OrderDirection::Asc);
  }

  #[test]
  fn rejects_malformed_orders() {
    assert!(compile_order("").is_err());
    assert!(compile_order("`$.a` UP").is_err());
    assert!(compile_order("`$.a`,").is_err());
    assert!(compile_order("$.a DESC").is_err());
  }
}
