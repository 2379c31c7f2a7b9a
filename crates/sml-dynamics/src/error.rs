//! Errors.

use sml_ast::Pos;
use std::fmt;

/// An error when evaluating.
#[derive(Debug)]
pub struct Error {
  pos: Pos,
  kind: ErrorKind,
}

impl Error {
  pub(crate) fn new(pos: Pos, kind: ErrorKind) -> Self {
    Self { pos, kind }
  }

  /// Returns the position of the construct that failed.
  #[must_use]
  pub fn pos(&self) -> Pos {
    self.pos
  }

  /// Returns the kind of error.
  #[must_use]
  pub fn kind(&self) -> &ErrorKind {
    &self.kind
  }

  /// Returns whether this is a problem with the evaluator, not the program.
  #[must_use]
  pub fn is_internal(&self) -> bool {
    matches!(self.kind, ErrorKind::Internal(_))
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.kind.fmt(f)
  }
}

/// A kind of error.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
  /// A name was not bound.
  Undefined(Item, String),
  /// An exception copy named something that is not an exception.
  NotExn(String),
  /// Something that cannot happen in a program the statics accepted.
  Internal(&'static str),
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorKind::Undefined(item, name) => write!(f, "Undefined {item} `{name}`"),
      ErrorKind::NotExn(name) => write!(f, "not an exception: `{name}`"),
      ErrorKind::Internal(s) => f.write_str(s),
    }
  }
}

/// A kind of named thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Item {
  Val,
  Datatype,
  Str,
  Sig,
  Functor,
}

impl fmt::Display for Item {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Item::Val => "value",
      Item::Datatype => "datatype",
      Item::Str => "structure",
      Item::Sig => "signature",
      Item::Functor => "functor",
    };
    f.write_str(s)
  }
}
