//! Errors from any pass.

use sml_ast::Pos;
use std::fmt;

/// An error from running an input.
#[derive(Debug)]
pub struct Error(Repr);

#[derive(Debug)]
enum Repr {
  Config(ConfigError),
  Lex(sml_lex::Error),
  Parse(sml_parse::Error),
  Statics(sml_statics::Error),
  Dynamics(sml_dynamics::Error),
}

#[derive(Debug)]
enum ConfigError {
  Parse(toml::de::Error),
  Version(u16),
}

impl Error {
  pub(crate) fn config_parse(e: toml::de::Error) -> Self {
    Self(Repr::Config(ConfigError::Parse(e)))
  }

  pub(crate) fn config_version(v: u16) -> Self {
    Self(Repr::Config(ConfigError::Version(v)))
  }

  pub(crate) fn lex(e: sml_lex::Error) -> Self {
    Self(Repr::Lex(e))
  }

  pub(crate) fn parse(e: sml_parse::Error) -> Self {
    Self(Repr::Parse(e))
  }

  pub(crate) fn statics(e: sml_statics::Error) -> Self {
    Self(Repr::Statics(e))
  }

  pub(crate) fn dynamics(e: sml_dynamics::Error) -> Self {
    Self(Repr::Dynamics(e))
  }

  /// Returns what kind of error this is.
  #[must_use]
  pub fn kind(&self) -> ErrorKind {
    match &self.0 {
      Repr::Config(_) => ErrorKind::Config,
      Repr::Lex(e) => {
        if e.is_incomplete() {
          ErrorKind::Incomplete
        } else {
          ErrorKind::Lex
        }
      }
      Repr::Parse(e) => {
        if e.is_incomplete() {
          ErrorKind::Incomplete
        } else if e.is_feature_disabled() {
          ErrorKind::FeatureDisabled
        } else {
          ErrorKind::Parse
        }
      }
      Repr::Statics(e) => {
        if e.is_internal() || e.is_unsupported() {
          ErrorKind::Internal
        } else {
          ErrorKind::Elaboration
        }
      }
      Repr::Dynamics(e) => {
        if e.is_internal() {
          ErrorKind::Internal
        } else {
          ErrorKind::Evaluation
        }
      }
    }
  }

  /// Returns where in the input the error is, if it is in the input.
  #[must_use]
  pub fn pos(&self) -> Option<Pos> {
    match &self.0 {
      Repr::Config(_) => None,
      Repr::Lex(e) => Some(e.pos()),
      Repr::Parse(e) => Some(e.pos()),
      Repr::Statics(e) => Some(e.pos()),
      Repr::Dynamics(e) => Some(e.pos()),
    }
  }

  /// Returns whether more input may fix this.
  #[must_use]
  pub fn is_incomplete(&self) -> bool {
    self.kind() == ErrorKind::Incomplete
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.0 {
      Repr::Config(ConfigError::Parse(e)) => write!(f, "couldn't parse config: {e}"),
      Repr::Config(ConfigError::Version(v)) => write!(f, "invalid config version: {v}"),
      Repr::Lex(e) => e.fmt(f),
      Repr::Parse(e) => e.fmt(f),
      Repr::Statics(e) => e.fmt(f),
      Repr::Dynamics(e) => e.fmt(f),
    }
  }
}

/// A kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The config file was invalid.
  Config,
  /// The input had a malformed token.
  Lex,
  /// The input was not a valid program.
  Parse,
  /// The input ended early.
  Incomplete,
  /// The input used a feature the options disallow.
  FeatureDisabled,
  /// The program did not typecheck.
  Elaboration,
  /// The program used something not bound at runtime.
  Evaluation,
  /// The interpreter could not handle the program.
  Internal,
}
