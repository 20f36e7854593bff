use crate::error::{CacheError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
  /// Backtick-delimited attribute path, without the backticks.
  Path(String),
  Str(String),
  Number(f64),
  Word(String),
  Op(&'static str),
  LParen,
  RParen,
  Comma,
  Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
  pub token: Token,
  pub pos: usize,
}

const OPERATORS: [&str; 7] = ["<=", ">=", "!=", "<>", "=", "<", ">"];

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>> {
  let bytes = input.as_bytes();
  let mut tokens = Vec::new();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    let pos = i;
    let token = match c {
      b'`' => {
        let Some(len) = input[i + 1..].find('`') else {
          return Err(CacheError::syntax(input, pos, "unterminated attribute path"));
        };
        let path = input[i + 1..i + 1 + len].to_string();
        i += len + 2;
        Token::Path(path)
      }
      b'\'' => {
        let (value, next) = read_string(input, i)?;
        i = next;
        Token::Str(value)
      }
      b'(' => {
        i += 1;
        Token::LParen
      }
      b')' => {
        i += 1;
        Token::RParen
      }
      b',' => {
        i += 1;
        Token::Comma
      }
      b'-' | b'.' | b'0'..=b'9' => {
        let (value, next) = read_number(input, i)?;
        i = next;
        Token::Number(value)
      }
      c if c.is_ascii_alphabetic() || c == b'_' => {
        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
          i += 1;
        }
        Token::Word(input[start..i].to_string())
      }
      _ => {
        let rest = &input[i..];
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
          Some(op) => {
            i += op.len();
            Token::Op(*op)
          }
          None => {
            let ch = rest.chars().next().unwrap_or('?');
            return Err(CacheError::syntax(
              input,
              pos,
              format!("unexpected character '{}'", ch),
            ));
          }
        }
      }
    };
    tokens.push(Spanned { token, pos });
  }

  tokens.push(Spanned {
    token: Token::Eof,
    pos: input.len(),
  });
  Ok(tokens)
}

/// Single-quoted string; a doubled quote is an escaped quote.
fn read_string(input: &str, start: usize) -> Result<(String, usize)> {
  let mut value = String::new();
  let mut chars = input[start + 1..].char_indices().peekable();
  while let Some((offset, ch)) = chars.next() {
    if ch == '\'' {
      if let Some((_, '\'')) = chars.peek() {
        value.push('\'');
        chars.next();
        continue;
      }
      return Ok((value, start + 1 + offset + 1));
    }
    value.push(ch);
  }
  Err(CacheError::syntax(input, start, "unterminated string literal"))
}

fn read_number(input: &str, start: usize) -> Result<(f64, usize)> {
  let bytes = input.as_bytes();
  let mut i = start;
  if bytes[i] == b'-' {
    i += 1;
  }
  while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
    i += 1;
  }
  if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
    let mut j = i + 1;
    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
      j += 1;
    }
    if j < bytes.len() && bytes[j].is_ascii_digit() {
      i = j;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
    }
  }

  let text = &input[start..i];
  text
    .parse::<f64>()
    .map(|n| (n, i))
    .map_err(|_| CacheError::syntax(input, start, format!("invalid number '{}'", text)))
}
