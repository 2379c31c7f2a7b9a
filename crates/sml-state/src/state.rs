//! The chain of nested scopes.

use crate::{DynamicBasis, IdStatus, Namespace, StaticBasis};
use fast_hash::FxHashMap;
use sml_ast::Path;
use sml_fixity::Fixity;
use std::rc::Rc;
use str_util::Name;

/// One scope in a persistent chain of scopes.
///
/// Inner scopes are made with [`State::nested`] and hold a pointer to their parent, so a scope
/// that was captured (by a closure or a functor) stays valid however the chain grows later.
#[derive(Debug, Default)]
pub struct State {
  parent: Option<Rc<State>>,
  depth: u32,
  /// Fixities declared in this scope.
  pub fixity: sml_fixity::Map,
  /// Static bindings of this scope.
  pub statics: StaticBasis,
  /// Dynamic bindings of this scope.
  pub dynamics: DynamicBasis,
}

impl State {
  /// Returns a new empty scope inside `parent`.
  #[must_use]
  pub fn nested(parent: &Rc<State>) -> State {
    State { parent: Some(Rc::clone(parent)), depth: parent.depth + 1, ..State::default() }
  }

  /// Returns how deep in the chain this is. The outermost scope is 0.
  #[must_use]
  pub fn depth(&self) -> u32 {
    self.depth
  }

  /// Returns the enclosing scope.
  #[must_use]
  pub fn parent(&self) -> Option<&Rc<State>> {
    self.parent.as_ref()
  }

  fn layers(&self) -> impl Iterator<Item = &State> {
    std::iter::successors(Some(self), |s| s.parent.as_deref())
  }

  /// Returns the fixity of a name, from the innermost scope declaring one.
  #[must_use]
  pub fn fixity(&self, name: &str) -> Option<Fixity> {
    self.layers().find_map(|s| s.fixity.get(name).copied())
  }

  /// Returns the innermost scope binding the name, statically, dynamically, or by a declaration
  /// whose elaboration was skipped.
  fn scope_of(&self, ns: Namespace, name: &Name) -> Option<&State> {
    self.layers().find(|s| {
      s.statics.has(ns, name) || s.statics.skips(ns, name) || s.dynamics.has(ns, name)
    })
  }

  /// Returns the identifier status of a value name, from the innermost scope binding it.
  #[must_use]
  pub fn id_status(&self, path: &Path) -> Option<IdStatus> {
    let from_statics = |b: &StaticBasis| b.val_env.get(path.last()).map(|x| x.id_status);
    let from_dynamics = |b: &DynamicBasis| b.val_env.get(path.last()).map(|x| x.1);
    match path.prefix().split_first() {
      None => {
        let s = self.scope_of(Namespace::Val, path.last())?;
        if s.statics.skips(Namespace::Val, path.last()) {
          return Some(IdStatus::Val);
        }
        from_statics(&s.statics).or_else(|| from_dynamics(&s.dynamics))
      }
      Some((fst, rest)) => self
        .static_str_in(fst, rest)
        .and_then(from_statics)
        .or_else(|| self.dynamic_str_in(fst, rest).and_then(from_dynamics)),
    }
  }

  fn static_str_in(&self, fst: &Name, rest: &[Name]) -> Option<&StaticBasis> {
    self.scope_of(Namespace::Str, fst)?.statics.str_env.get(fst)?.get_str(rest)
  }

  fn dynamic_str_in(&self, fst: &Name, rest: &[Name]) -> Option<&DynamicBasis> {
    self.layers().find_map(|s| s.dynamics.str_env.get(fst))?.get_str(rest)
  }

  /// Returns the static structure at the long name.
  #[must_use]
  pub fn static_str(&self, names: &[Name]) -> Option<&StaticBasis> {
    let (fst, rest) = names.split_first()?;
    self.static_str_in(fst, rest)
  }

  /// Returns the dynamic structure at the long name.
  #[must_use]
  pub fn dynamic_str(&self, names: &[Name]) -> Option<&DynamicBasis> {
    let (fst, rest) = names.split_first()?;
    self.dynamic_str_in(fst, rest)
  }

  /// Looks up a long name in the static bases: short names in the innermost scope binding them,
  /// long names through the structure their prefix names.
  pub fn static_lookup<'a, T, F>(&'a self, path: &Path, ns: Namespace, env: F) -> Option<&'a T>
  where
    F: Fn(&'a StaticBasis) -> &'a FxHashMap<Name, T>,
  {
    match path.prefix().split_first() {
      None => env(&self.scope_of(ns, path.last())?.statics).get(path.last()),
      Some((fst, rest)) => env(self.static_str_in(fst, rest)?).get(path.last()),
    }
  }

  /// Looks up a long name in the dynamic bases. See [`State::static_lookup`].
  pub fn dynamic_lookup<'a, T, F>(&'a self, path: &Path, env: F) -> Option<&'a T>
  where
    F: Fn(&'a DynamicBasis) -> &'a FxHashMap<Name, T>,
  {
    match path.prefix().split_first() {
      None => self.layers().find_map(|s| env(&s.dynamics).get(path.last())),
      Some((fst, rest)) => env(self.dynamic_str_in(fst, rest)?).get(path.last()),
    }
  }

  /// Returns whether the long name is bound but without static information, because the
  /// declaration binding it (or a structure on its path) was not elaborated.
  #[must_use]
  pub fn lacks_statics(&self, path: &Path, ns: Namespace) -> bool {
    let Some((fst, rest)) = path.prefix().split_first() else {
      return self.scope_of(ns, path.last()).is_some_and(|s| !s.statics.has(ns, path.last()));
    };
    let Some(s) = self.scope_of(Namespace::Str, fst) else { return false };
    let Some(mut cur) = s.statics.str_env.get(fst) else { return true };
    for name in rest {
      match cur.str_env.get(name) {
        Some(inner) => cur = inner,
        None => return cur.skips(Namespace::Str, name),
      }
    }
    cur.skips(ns, path.last())
  }

  /// Like [`State::lacks_statics`], for a structure.
  #[must_use]
  pub fn str_lacks_statics(&self, names: &[Name]) -> bool {
    match names.split_last() {
      None => false,
      Some((last, prefix)) => {
        self.lacks_statics(&Path::new(prefix.iter().cloned(), last.clone()), Namespace::Str)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::State;
  use crate::{IdStatus, Namespace, StaticBasis, TyScheme, Val, ValInfo};
  use sml_ast::Path;
  use sml_fixity::Fixity;
  use std::rc::Rc;
  use str_util::Name;

  fn val(id_status: IdStatus) -> ValInfo {
    ValInfo { scheme: TyScheme::mono(crate::Ty::unit()), id_status }
  }

  #[test]
  fn chain() {
    let mut outer = State::default();
    outer.fixity.insert(Name::new("f"), Fixity::Nonfix);
    outer.statics.val_env.insert(Name::new("C"), val(IdStatus::Con));
    let mut inner_str = StaticBasis::default();
    inner_str.val_env.insert(Name::new("x"), val(IdStatus::Val));
    outer.statics.str_env.insert(Name::new("S"), inner_str);
    let outer = Rc::new(outer);
    let mut inner = State::nested(&outer);
    inner.statics.val_env.insert(Name::new("C"), val(IdStatus::Val));
    assert_eq!(inner.depth(), 1);
    assert_eq!(inner.fixity("f"), Some(Fixity::Nonfix));
    let c = Path::one(Name::new("C"));
    assert_eq!(inner.id_status(&c), Some(IdStatus::Val));
    assert_eq!(outer.id_status(&c), Some(IdStatus::Con));
    let sx = Path::new([Name::new("S")], Name::new("x"));
    assert!(inner.static_lookup(&sx, Namespace::Val, |b| &b.val_env).is_some());
    let x = Path::one(Name::new("x"));
    assert!(inner.static_lookup(&x, Namespace::Val, |b| &b.val_env).is_none());
  }

  #[test]
  fn dynamic_only_shadows() {
    let mut outer = State::default();
    outer.statics.val_env.insert(Name::new("x"), val(IdStatus::Val));
    outer.statics.str_env.insert(Name::new("S"), StaticBasis::default());
    let outer = Rc::new(outer);
    let mut inner = State::nested(&outer);
    inner.dynamics.val_env.insert(Name::new("x"), (Val::unit(), IdStatus::Val));
    inner.statics.skipped_strs.insert(Name::new("S"));
    let x = Path::one(Name::new("x"));
    assert!(inner.static_lookup(&x, Namespace::Val, |b| &b.val_env).is_none());
    assert!(inner.lacks_statics(&x, Namespace::Val));
    assert!(!outer.lacks_statics(&x, Namespace::Val));
    let s = [Name::new("S")];
    assert!(inner.static_str(&s).is_none());
    assert!(inner.str_lacks_statics(&s));
    let sy = Path::new(s.clone(), Name::new("y"));
    assert!(inner.lacks_statics(&sy, Namespace::Val));
    assert!(!inner.lacks_statics(&Path::one(Name::new("nope")), Namespace::Val));
  }
}
