//! Configuration.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

pub mod file;

/// Language options, deciding which features the parser accepts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
  /// Successor ML: or-patterns, conjunctive and guarded patterns, `do`, omitted `else`, leading
  /// `|`, and trailing `;`.
  pub allow_successor_ml: bool,
  /// Vector expressions and patterns `#[...]`.
  pub allow_vector: bool,
  /// `structure` declarations inside `let` and `local`.
  pub allow_structures_anywhere: bool,
  /// `signature` declarations inside structures, `let`, and `local`.
  pub allow_signatures_anywhere: bool,
  /// `functor` declarations inside structures, `let`, and `local`.
  pub allow_functors_anywhere: bool,
}

impl Options {
  /// Returns options with successor ML and vectors allowed.
  #[must_use]
  pub fn successor_ml() -> Self {
    Self { allow_successor_ml: true, allow_vector: true, ..Self::default() }
  }
}

impl From<file::Language> for Options {
  fn from(lang: file::Language) -> Self {
    Self {
      allow_successor_ml: lang.allow_successor_ml,
      allow_vector: lang.allow_vector,
      allow_structures_anywhere: lang.allow_structures_anywhere,
      allow_signatures_anywhere: lang.allow_signatures_anywhere,
      allow_functors_anywhere: lang.allow_functors_anywhere,
    }
  }
}
