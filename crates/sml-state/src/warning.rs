//! Non-fatal advisories.

use sml_ast::Pos;
use std::fmt;

/// A warning about a program. Warnings are collected alongside results rather than stopping
/// anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
  /// Where the warning is about.
  pub pos: Pos,
  /// What the warning is.
  pub message: String,
}

impl Warning {
  /// Returns a new warning.
  pub fn new<S>(pos: Pos, message: S) -> Self
  where
    S: Into<String>,
  {
    Self { pos, message: message.into() }
  }
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}
