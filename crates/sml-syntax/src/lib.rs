//! The token model for SML.
//!
//! Tokens are produced by a lexer and consumed read-only by the parser. Every token can say,
//! without any surrounding context, whether it may be a record label, whether it may be a value
//! identifier, and what its source text was.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

mod kw;

use std::fmt;
use str_util::{Name, SmolStr};

pub use kw::Kw;

/// A byte offset into the source text.
pub type Pos = usize;

/// A token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  /// What kind of token this is.
  pub kind: TokenKind,
  /// The source text of the token.
  pub text: SmolStr,
  /// Where the token starts.
  pub pos: Pos,
}

impl Token {
  /// Returns a new token.
  pub fn new<S>(kind: TokenKind, text: S, pos: Pos) -> Self
  where
    S: Into<SmolStr>,
  {
    Self { kind, text: text.into(), pos }
  }

  /// Returns a keyword token.
  #[must_use]
  pub fn kw(kw: Kw, pos: Pos) -> Self {
    Self::new(TokenKind::Kw(kw), kw.as_str(), pos)
  }

  /// Returns a short identifier token, deciding alphanumeric-ness from the first char.
  #[must_use]
  pub fn ident(name: &str, pos: Pos) -> Self {
    let alphanumeric = name.starts_with(|c: char| c.is_ascii_alphabetic());
    Self::new(TokenKind::Ident(Ident { name: Name::new(name), alphanumeric }), name, pos)
  }

  /// Returns the literal text.
  #[must_use]
  pub fn text(&self) -> &str {
    self.text.as_str()
  }

  /// Returns whether this may be a record label: any identifier, `*`, or a numeric label.
  #[must_use]
  pub fn is_valid_record_label(&self) -> bool {
    match &self.kind {
      TokenKind::Ident(_) | TokenKind::Kw(Kw::Star) | TokenKind::Const(Const::Numeric(_)) => true,
      TokenKind::Kw(_)
      | TokenKind::LongIdent(_)
      | TokenKind::TyVar(_)
      | TokenKind::EqTyVar(_)
      | TokenKind::Const(_) => false,
    }
  }

  /// Returns whether this may be a (short) value identifier.
  ///
  /// `=` and `*` are keywords that are nevertheless value identifiers.
  #[must_use]
  pub fn is_vid(&self) -> bool {
    matches!(&self.kind, TokenKind::Ident(_) | TokenKind::Kw(Kw::Eq | Kw::Star))
  }

  /// Returns whether this may be a long value identifier, i.e. a vid or a qualified name.
  #[must_use]
  pub fn is_long_vid(&self) -> bool {
    self.is_vid() || matches!(self.kind, TokenKind::LongIdent(_))
  }

  /// Returns this as a keyword, if it is one.
  #[must_use]
  pub fn as_kw(&self) -> Option<Kw> {
    match self.kind {
      TokenKind::Kw(kw) => Some(kw),
      _ => None,
    }
  }

  /// Returns the short name of a vid token. For `=` and `*` this is the keyword text.
  #[must_use]
  pub fn vid_name(&self) -> Option<Name> {
    match &self.kind {
      TokenKind::Ident(ident) => Some(ident.name.clone()),
      TokenKind::Kw(kw @ (Kw::Eq | Kw::Star)) => Some(Name::new(kw.as_str())),
      _ => None,
    }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.text())
  }
}

/// A kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
  /// A reserved word or punctuation.
  Kw(Kw),
  /// A short identifier.
  Ident(Ident),
  /// A qualified identifier, like `A.B.x`.
  LongIdent(LongIdent),
  /// A type variable like `'a`. The name includes the prime.
  TyVar(Name),
  /// An equality type variable like `''a`. The name includes the primes.
  EqTyVar(Name),
  /// A special constant.
  Const(Const),
}

/// A short identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
  /// The name.
  pub name: Name,
  /// Whether this is alphanumeric (as opposed to symbolic).
  pub alphanumeric: bool,
}

/// A qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongIdent {
  /// The structure names before the last name. Non-empty.
  pub qualifiers: Vec<Name>,
  /// The last name.
  pub last: Ident,
}

/// A constant token.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
  /// An integer, possibly negative or hexadecimal.
  Int(i64),
  /// A positive decimal integer not starting with `0`. May be used as a record label.
  Numeric(u32),
  /// A real.
  Real(f64),
  /// A word.
  Word(u64),
  /// A character.
  Char(char),
  /// A string, with escapes already interpreted.
  String(SmolStr),
}

impl Const {
  /// Returns the special constant this denotes.
  #[must_use]
  pub fn to_scon(&self) -> SCon {
    match self {
      Const::Int(n) => SCon::Int(*n),
      Const::Numeric(n) => SCon::Int(i64::from(*n)),
      Const::Real(r) => SCon::Real(*r),
      Const::Word(w) => SCon::Word(*w),
      Const::Char(c) => SCon::Char(*c),
      Const::String(s) => SCon::String(s.clone()),
    }
  }
}

/// A special constant, as it appears in expressions and patterns.
#[derive(Debug, Clone, PartialEq)]
pub enum SCon {
  /// `int`
  Int(i64),
  /// `real`
  Real(f64),
  /// `word`
  Word(u64),
  /// `char`
  Char(char),
  /// `string`
  String(SmolStr),
}

impl fmt::Display for SCon {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SCon::Int(n) => {
        if *n < 0 {
          write!(f, "~{}", n.unsigned_abs())
        } else {
          write!(f, "{n}")
        }
      }
      SCon::Real(r) => {
        let s = format!("{r:?}");
        f.write_str(&s.replace('-', "~"))
      }
      SCon::Word(w) => write!(f, "0wx{w:x}"),
      SCon::Char(c) => write!(f, "#{:?}", c.to_string()),
      SCon::String(s) => write!(f, "{:?}", s.as_str()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{Const, Kw, Token, TokenKind};

  #[test]
  fn classification() {
    let eq = Token::kw(Kw::Eq, 0);
    assert!(eq.is_vid());
    assert!(!eq.is_valid_record_label());
    let star = Token::kw(Kw::Star, 0);
    assert!(star.is_vid());
    assert!(star.is_valid_record_label());
    let num = Token::new(TokenKind::Const(Const::Numeric(3)), "3", 0);
    assert!(!num.is_vid());
    assert!(num.is_valid_record_label());
    let zero = Token::new(TokenKind::Const(Const::Int(0)), "0", 0);
    assert!(!zero.is_valid_record_label());
    let x = Token::ident("x", 0);
    assert!(x.is_vid());
    assert!(x.is_valid_record_label());
    let arrow = Token::kw(Kw::Arrow, 0);
    assert!(!arrow.is_vid());
    assert!(!arrow.is_valid_record_label());
  }
}
