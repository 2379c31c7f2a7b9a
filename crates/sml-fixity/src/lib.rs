//! Types concerning SML infix operators, precedence, and associativity.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

use fast_hash::{FxHashMap, map_with_capacity};
use std::sync::LazyLock;
use str_util::Name;

/// A flat mapping from names to fixities.
pub type Map = FxHashMap<Name, Fixity>;

/// The default infix operators in the std basis.
pub static STD_BASIS: LazyLock<Map> = LazyLock::new(|| {
  let ops_arr: [(Infix, &[&str]); 6] = [
    (Infix::left(7), &["*", "/", "div", "mod"]),
    (Infix::left(6), &["+", "-", "^"]),
    (Infix::right(5), &["::", "@"]),
    (Infix::left(4), &["=", "<>", ">", ">=", "<", "<="]),
    (Infix::left(3), &[":=", "o"]),
    (Infix::left(0), &["before"]),
  ];
  let mut ret = map_with_capacity(ops_arr.iter().map(|(_, names)| names.len()).sum());
  for (info, names) in ops_arr {
    for &name in names {
      ret.insert(Name::new(name), Fixity::Infix(info));
    }
  }
  ret
});

/// The declared status of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
  /// `infix` or `infixr`.
  Infix(Infix),
  /// `nonfix`, which shadows an outer infix declaration.
  Nonfix,
}

impl Fixity {
  /// Returns the infix info, if this is infix.
  #[must_use]
  pub fn infix(self) -> Option<Infix> {
    match self {
      Fixity::Infix(x) => Some(x),
      Fixity::Nonfix => None,
    }
  }
}

/// Information about an infix name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Infix {
  /// The precedence, 0 to 9.
  pub prec: u16,
  /// The associativity.
  pub assoc: Assoc,
}

impl Infix {
  /// Returns a new `Infix` with left associativity.
  #[must_use]
  pub fn left(prec: u16) -> Self {
    Self { prec, assoc: Assoc::Left }
  }

  /// Returns a new `Infix` with right associativity.
  #[must_use]
  pub fn right(prec: u16) -> Self {
    Self { prec, assoc: Assoc::Right }
  }
}

/// Associativity for infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
  /// `infix`
  Left,
  /// `infixr`
  Right,
}

/// A log of fixity declarations made on top of some outer scope.
///
/// Later declarations shadow earlier ones. Scopes are exited by forgetting what was declared since
/// a [`Env::mark`], which is also how a failed parse attempt is undone.
#[derive(Debug, Clone, Default)]
pub struct Env {
  log: Vec<(Name, Fixity)>,
}

impl Env {
  /// Declares the fixity of a name, shadowing any earlier declaration.
  pub fn insert(&mut self, name: Name, fixity: Fixity) {
    self.log.push((name, fixity));
  }

  /// Returns the fixity declared for this name in this overlay, if any.
  #[must_use]
  pub fn get(&self, name: &str) -> Option<Fixity> {
    self.log.iter().rev().find_map(|(n, f)| (n.as_str() == name).then_some(*f))
  }

  /// Returns whether nothing has been declared.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.log.is_empty()
  }

  /// Returns a mark for the current end of the log.
  #[must_use]
  pub fn mark(&self) -> usize {
    self.log.len()
  }

  /// Forgets every declaration made since `mark`.
  pub fn reset(&mut self, mark: usize) {
    self.log.truncate(mark);
  }

  /// Forgets the declarations made between the two marks, keeping those made after.
  pub fn forget(&mut self, range: std::ops::Range<usize>) {
    self.log.drain(range);
  }

  /// Flattens this into one map, later declarations winning.
  #[must_use]
  pub fn to_map(&self) -> Map {
    let mut ret = Map::default();
    ret.extend(self.log.iter().cloned());
    ret
  }
}

#[cfg(test)]
mod tests {
  use super::{Assoc, Env, Fixity, Infix, STD_BASIS};
  use str_util::Name;

  #[test]
  fn std_basis() {
    assert_eq!(STD_BASIS["::"], Fixity::Infix(Infix::right(5)));
    assert_eq!(STD_BASIS["div"].infix().map(|x| x.prec), Some(7));
    assert!(!STD_BASIS.contains_key("andalso"));
  }

  #[test]
  fn scopes() {
    let mut env = Env::default();
    env.insert(Name::new("f"), Fixity::Infix(Infix::left(3)));
    let outer = env.mark();
    env.insert(Name::new("f"), Fixity::Nonfix);
    let inner = env.mark();
    env.insert(Name::new("g"), Fixity::Infix(Infix::right(1)));
    assert_eq!(env.get("f"), Some(Fixity::Nonfix));
    assert_eq!(env.get("g").and_then(Fixity::infix).map(|x| x.assoc), Some(Assoc::Right));
    env.forget(outer..inner);
    assert_eq!(env.get("f"), Some(Fixity::Infix(Infix::left(3))));
    assert!(env.get("g").is_some());
    env.reset(outer);
    assert_eq!(env.get("g"), None);
    assert_eq!(env.to_map().len(), 1);
  }
}
