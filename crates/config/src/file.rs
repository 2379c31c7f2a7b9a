//! Configuration stored in a config file.

use serde::Deserialize;

/// The name of the config file.
pub const NAME: &str = "smlfront.toml";

/// The root config.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Root {
  /// The version. Should be 1.
  pub version: u16,
  /// The language config.
  #[serde(default)]
  pub language: Language,
}

/// Configuration for the language.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(clippy::struct_excessive_bools)]
pub struct Language {
  /// Whether to allow successor ML features.
  #[serde(default)]
  pub allow_successor_ml: bool,
  /// Whether to allow vector expressions and patterns.
  #[serde(default)]
  pub allow_vector: bool,
  /// Whether to allow structure declarations below top level.
  #[serde(default)]
  pub allow_structures_anywhere: bool,
  /// Whether to allow signature declarations below top level.
  #[serde(default)]
  pub allow_signatures_anywhere: bool,
  /// Whether to allow functor declarations below top level.
  #[serde(default)]
  pub allow_functors_anywhere: bool,
}
