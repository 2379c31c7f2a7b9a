//! Lexing a string into tokens.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

mod string;

use sml_syntax::{Const, Ident, Kw, LongIdent, Pos, Token, TokenKind};
use std::fmt;
use str_util::Name;
use string::is_whitespace;

/// A lexed input.
#[derive(Debug)]
pub struct Lex {
  /// The tokens of the input. Whitespace and comments are dropped.
  pub tokens: Vec<Token>,
  /// The errors encountered.
  pub errors: Vec<Error>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKind {
  InvalidSource,
  UnclosedComment,
  UnmatchedCloseComment,
  IncompleteTyVar,
  NegativeWordLit,
  WrongLenCharLit,
  MissingDigitsInNumLit,
  NumLitTooLarge,
  InvalidLongIdent,
  String(string::Error),
}

/// An error encountered when lexing.
#[derive(Debug, Clone)]
pub struct Error {
  pos: Pos,
  kind: ErrorKind,
}

impl Error {
  /// Returns the position of this.
  #[must_use]
  pub fn pos(&self) -> Pos {
    self.pos
  }

  /// Returns whether more input could fix this error, e.g. an unclosed comment or string.
  #[must_use]
  pub fn is_incomplete(&self) -> bool {
    matches!(self.kind, ErrorKind::UnclosedComment | ErrorKind::String(string::Error::Unclosed))
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      ErrorKind::InvalidSource => f.write_str("invalid source character"),
      ErrorKind::UnclosedComment => f.write_str("unclosed comment"),
      ErrorKind::UnmatchedCloseComment => f.write_str("unmatched close comment"),
      ErrorKind::IncompleteTyVar => f.write_str("incomplete type variable"),
      ErrorKind::NegativeWordLit => f.write_str("negative word literal"),
      ErrorKind::WrongLenCharLit => f.write_str("character literal must have length 1"),
      ErrorKind::MissingDigitsInNumLit => f.write_str("missing digits in number literal"),
      ErrorKind::NumLitTooLarge => f.write_str("number literal too large"),
      ErrorKind::InvalidLongIdent => f.write_str("invalid qualified name"),
      ErrorKind::String(string::Error::Unclosed) => f.write_str("unclosed string literal"),
      ErrorKind::String(string::Error::InvalidEscape) => f.write_str("invalid string escape"),
      ErrorKind::String(string::Error::NonWhitespaceInContinuation) => {
        f.write_str("non-whitespace in string continuation")
      }
    }
  }
}

/// Returns a [`Lex`] of the input.
#[must_use]
pub fn get(s: &str) -> Lex {
  let bs = s.as_bytes();
  let mut tokens = Vec::new();
  let mut st = St::default();
  while st.i < bs.len() {
    let start = st.i;
    let kind = go(&mut st, bs);
    debug_assert!(start < st.i, "lexer failed to advance");
    if let Some(kind) = kind {
      let text = String::from_utf8_lossy(&bs[start..st.i]);
      tokens.push(Token::new(kind, text.as_ref(), start));
    }
  }
  Lex { tokens, errors: st.errors }
}

#[derive(Default)]
struct St {
  errors: Vec<Error>,
  i: usize,
}

/// advances `st.i` past one token, comment, or run of whitespace. returns the kind of token, or
/// `None` for trivia and erroneous input.
fn go(st: &mut St, bs: &[u8]) -> Option<TokenKind> {
  let b = bs[st.i];
  let start = st.i;
  // block comments
  if b == b'(' && bs.get(st.i + 1) == Some(&b'*') {
    block_comment(st, bs);
    return None;
  }
  if b == b'*' && bs.get(st.i + 1) == Some(&b')') {
    st.i += 2;
    err(st, start, ErrorKind::UnmatchedCloseComment);
    return None;
  }
  if is_whitespace(b) {
    advance_while(&mut st.i, bs, is_whitespace);
    return None;
  }
  // type variables
  if b == b'\'' {
    advance_while(&mut st.i, bs, |b| b == b'\'');
    let primes = st.i - start;
    let name_start = st.i;
    advance_while(&mut st.i, bs, is_alpha_num);
    if name_start == st.i {
      err(st, start, ErrorKind::IncompleteTyVar);
      return None;
    }
    let name = Name::new(String::from_utf8_lossy(&bs[start..st.i]).as_ref());
    return Some(if primes >= 2 { TokenKind::EqTyVar(name) } else { TokenKind::TyVar(name) });
  }
  // alphanumeric identifiers, keywords, and qualified names
  if b.is_ascii_alphabetic() {
    return Some(alpha_num_ident(st, bs));
  }
  // number literals. note e.g. `~3` is one token but `~ 3` is two
  if b.is_ascii_digit() || (b == b'~' && bs.get(st.i + 1).is_some_and(u8::is_ascii_digit)) {
    return num_lit(st, bs);
  }
  if b == b'"' {
    let s = get_string(st, bs)?;
    return Some(TokenKind::Const(Const::String(s.into())));
  }
  if b == b'#' && bs.get(st.i + 1) == Some(&b'"') {
    st.i += 1;
    let s = get_string(st, bs)?;
    let mut chars = s.chars();
    return match (chars.next(), chars.next()) {
      (Some(c), None) => Some(TokenKind::Const(Const::Char(c))),
      _ => {
        err(st, start, ErrorKind::WrongLenCharLit);
        None
      }
    };
  }
  // symbolic identifiers, which may turn out to be keywords like `=>` or `:`
  if is_symbolic(b) {
    advance_while(&mut st.i, bs, is_symbolic);
    let text = String::from_utf8_lossy(&bs[start..st.i]);
    return Some(match Kw::from_text(&text) {
      Some(kw) => TokenKind::Kw(kw),
      None => {
        TokenKind::Ident(Ident { name: Name::new(text.as_ref()), alphanumeric: false })
      }
    });
  }
  // punctuation
  let punct = match b {
    b'(' => Some(Kw::LRound),
    b')' => Some(Kw::RRound),
    b'[' => Some(Kw::LSquare),
    b']' => Some(Kw::RSquare),
    b'{' => Some(Kw::LCurly),
    b'}' => Some(Kw::RCurly),
    b',' => Some(Kw::Comma),
    b';' => Some(Kw::Semicolon),
    b'_' => Some(Kw::Underscore),
    _ => None,
  };
  if let Some(kw) = punct {
    st.i += 1;
    return Some(TokenKind::Kw(kw));
  }
  if bs[st.i..].starts_with(b"...") {
    st.i += 3;
    return Some(TokenKind::Kw(Kw::DotDotDot));
  }
  // invalid char. go until we find a valid str. this terminates because bs comes from a str.
  loop {
    st.i += 1;
    if st.i >= bs.len() || std::str::from_utf8(&bs[start..st.i]).is_ok() {
      break;
    }
  }
  err(st, start, ErrorKind::InvalidSource);
  None
}

fn block_comment(st: &mut St, bs: &[u8]) {
  let start = st.i;
  st.i += 2;
  let mut level = 1_usize;
  loop {
    match (bs.get(st.i), bs.get(st.i + 1)) {
      (Some(&b'('), Some(&b'*')) => {
        st.i += 2;
        level += 1;
      }
      (Some(&b'*'), Some(&b')')) => {
        st.i += 2;
        level -= 1;
        if level == 0 {
          return;
        }
      }
      (Some(_), _) => st.i += 1,
      (None, _) => {
        err(st, start, ErrorKind::UnclosedComment);
        return;
      }
    }
  }
}

fn alpha_num_ident(st: &mut St, bs: &[u8]) -> TokenKind {
  let start = st.i;
  advance_while(&mut st.i, bs, is_alpha_num);
  let first = String::from_utf8_lossy(&bs[start..st.i]).into_owned();
  if let Some(kw) = Kw::from_text(&first) {
    return TokenKind::Kw(kw);
  }
  let mut parts = vec![Ident { name: Name::new(first), alphanumeric: true }];
  // a `.` directly after an alphanumeric name continues a qualified name, unless it starts `...`
  while parts.last().is_some_and(|x| x.alphanumeric)
    && bs.get(st.i) == Some(&b'.')
    && bs.get(st.i + 1) != Some(&b'.')
  {
    st.i += 1;
    let part_start = st.i;
    match bs.get(st.i) {
      Some(b) if b.is_ascii_alphabetic() => advance_while(&mut st.i, bs, is_alpha_num),
      Some(&b) if is_symbolic(b) => advance_while(&mut st.i, bs, is_symbolic),
      _ => {
        err(st, start, ErrorKind::InvalidLongIdent);
        break;
      }
    }
    let text = String::from_utf8_lossy(&bs[part_start..st.i]).into_owned();
    if Kw::from_text(&text).is_some_and(|kw| kw != Kw::Star && kw != Kw::Eq) {
      err(st, start, ErrorKind::InvalidLongIdent);
    }
    let alphanumeric = text.starts_with(|c: char| c.is_ascii_alphabetic());
    parts.push(Ident { name: Name::new(text), alphanumeric });
  }
  let Some(last) = parts.pop() else { unreachable!("no parts of an identifier") };
  if parts.is_empty() {
    TokenKind::Ident(last)
  } else {
    let qualifiers = parts.into_iter().map(|x| x.name).collect();
    TokenKind::LongIdent(LongIdent { qualifiers, last })
  }
}

fn num_lit(st: &mut St, bs: &[u8]) -> Option<TokenKind> {
  let start = st.i;
  let neg = bs[st.i] == b'~';
  if neg {
    st.i += 1;
  }
  if bs[st.i] == b'0' {
    match bs.get(st.i + 1) {
      Some(&b'w') => {
        st.i += 2;
        let hex = bs.get(st.i) == Some(&b'x');
        if hex {
          st.i += 1;
        }
        let digits = digits(st, bs, hex)?;
        if neg {
          err(st, start, ErrorKind::NegativeWordLit);
          return None;
        }
        let radix = if hex { 16 } else { 10 };
        return match u64::from_str_radix(&digits, radix) {
          Ok(w) => Some(TokenKind::Const(Const::Word(w))),
          Err(_) => {
            err(st, start, ErrorKind::NumLitTooLarge);
            None
          }
        };
      }
      Some(&b'x') => {
        st.i += 2;
        let digits = digits(st, bs, true)?;
        return int_lit(st, start, &digits, 16, neg).map(|n| TokenKind::Const(Const::Int(n)));
      }
      _ => {}
    }
  }
  let int_start = st.i;
  advance_while(&mut st.i, bs, |b| b.is_ascii_digit());
  let mut is_real = false;
  if bs.get(st.i) == Some(&b'.') && bs.get(st.i + 1).is_some_and(u8::is_ascii_digit) {
    is_real = true;
    st.i += 1;
    advance_while(&mut st.i, bs, |b| b.is_ascii_digit());
  }
  if let Some(&b'e' | &b'E') = bs.get(st.i) {
    let save = st.i;
    st.i += 1;
    if bs.get(st.i) == Some(&b'~') {
      st.i += 1;
    }
    if bs.get(st.i).is_some_and(u8::is_ascii_digit) {
      is_real = true;
      advance_while(&mut st.i, bs, |b| b.is_ascii_digit());
    } else {
      // not an exponent, e.g. `1e` is `1` then the name `e`
      st.i = save;
    }
  }
  let text = String::from_utf8_lossy(&bs[int_start..st.i]).into_owned();
  if is_real {
    let r: f64 = text.replace('~', "-").parse().ok()?;
    return Some(TokenKind::Const(Const::Real(if neg { -r } else { r })));
  }
  let n = int_lit(st, start, &text, 10, neg)?;
  if !neg && !text.starts_with('0') {
    if let Ok(n) = u32::try_from(n) {
      return Some(TokenKind::Const(Const::Numeric(n)));
    }
  }
  Some(TokenKind::Const(Const::Int(n)))
}

fn digits(st: &mut St, bs: &[u8], hex: bool) -> Option<String> {
  let s = st.i;
  if hex {
    advance_while(&mut st.i, bs, |b| b.is_ascii_hexdigit());
  } else {
    advance_while(&mut st.i, bs, |b| b.is_ascii_digit());
  }
  if s == st.i {
    err(st, s, ErrorKind::MissingDigitsInNumLit);
    return None;
  }
  Some(String::from_utf8_lossy(&bs[s..st.i]).into_owned())
}

fn int_lit(st: &mut St, start: usize, digits: &str, radix: u32, neg: bool) -> Option<i64> {
  let s = if neg { format!("-{digits}") } else { digits.to_owned() };
  match i64::from_str_radix(&s, radix) {
    Ok(n) => Some(n),
    Err(_) => {
      err(st, start, ErrorKind::NumLitTooLarge);
      None
    }
  }
}

fn get_string(st: &mut St, bs: &[u8]) -> Option<String> {
  let res = string::get(&mut st.i, bs);
  for (idx, e) in res.errors {
    st.errors.push(Error { pos: idx, kind: ErrorKind::String(e) });
  }
  res.actual
}

fn advance_while<P>(idx: &mut usize, bs: &[u8], p: P)
where
  P: Fn(u8) -> bool,
{
  while let Some(&b) = bs.get(*idx) {
    if p(b) {
      *idx += 1;
    } else {
      break;
    }
  }
}

fn is_alpha_num(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_' || b == b'\''
}

fn is_symbolic(b: u8) -> bool {
  matches!(
    b,
    b'!'
      | b'%'
      | b'&'
      | b'$'
      | b'#'
      | b'+'
      | b'-'
      | b'/'
      | b':'
      | b'<'
      | b'='
      | b'>'
      | b'?'
      | b'@'
      | b'\\'
      | b'~'
      | b'`'
      | b'^'
      | b'|'
      | b'*'
  )
}

fn err(st: &mut St, start: usize, kind: ErrorKind) {
  st.errors.push(Error { pos: start, kind });
}

#[cfg(test)]
mod tests {
  use super::get;
  use sml_syntax::{Const, Kw, TokenKind};

  fn kinds(s: &str) -> Vec<TokenKind> {
    let lex = get(s);
    assert!(lex.errors.is_empty(), "{:?}", lex.errors);
    lex.tokens.into_iter().map(|x| x.kind).collect()
  }

  #[test]
  fn numbers() {
    let ks = kinds("0 12 ~3 0x1F 0w7 0wxff 1.5 2e3 012");
    assert_eq!(
      ks,
      vec![
        TokenKind::Const(Const::Int(0)),
        TokenKind::Const(Const::Numeric(12)),
        TokenKind::Const(Const::Int(-3)),
        TokenKind::Const(Const::Int(31)),
        TokenKind::Const(Const::Word(7)),
        TokenKind::Const(Const::Word(255)),
        TokenKind::Const(Const::Real(1.5)),
        TokenKind::Const(Const::Real(2000.0)),
        TokenKind::Const(Const::Int(12)),
      ]
    );
  }

  #[test]
  fn qualified() {
    let lex = get("Int.+ A.B.x {a, ...}");
    assert!(lex.errors.is_empty());
    let texts: Vec<_> = lex.tokens.iter().map(|x| x.text().to_owned()).collect();
    assert_eq!(texts, ["Int.+", "A.B.x", "{", "a", ",", "...", "}"]);
    assert!(matches!(lex.tokens[0].kind, TokenKind::LongIdent(_)));
  }

  #[test]
  fn keywords_and_symbols() {
    let ks = kinds("fn x => x := !y (* a (* nested *) comment *) :> #[");
    assert_eq!(ks[0], TokenKind::Kw(Kw::Fn));
    assert_eq!(ks[2], TokenKind::Kw(Kw::BigArrow));
    assert!(matches!(&ks[4], TokenKind::Ident(x) if x.name.as_str() == ":=" && !x.alphanumeric));
    assert_eq!(ks[7], TokenKind::Kw(Kw::ColonGt));
    assert_eq!(ks[8], TokenKind::Kw(Kw::Hash));
    assert_eq!(ks[9], TokenKind::Kw(Kw::LSquare));
  }

  #[test]
  fn strings_and_chars() {
    let ks = kinds(r#""a\tb\065" #"c" #"\n""#);
    assert_eq!(
      ks,
      vec![
        TokenKind::Const(Const::String("a\tbA".into())),
        TokenKind::Const(Const::Char('c')),
        TokenKind::Const(Const::Char('\n')),
      ]
    );
  }

  #[test]
  fn ty_vars() {
    let ks = kinds("'a ''b");
    assert!(matches!(&ks[0], TokenKind::TyVar(x) if x.as_str() == "'a"));
    assert!(matches!(&ks[1], TokenKind::EqTyVar(x) if x.as_str() == "''b"));
  }

  #[test]
  fn incomplete() {
    let lex = get("val x = (* oops");
    assert!(lex.errors.iter().all(super::Error::is_incomplete));
    assert_eq!(lex.errors.len(), 1);
    let lex = get("val s = \"abc");
    assert!(lex.errors[0].is_incomplete());
  }
}
