//! See [`St`].

use crate::error::{Error, ErrorKind};
use crate::unify::apply;
use fast_hash::FxHashSet;
use sml_ast::{Pos, TyVar};
use sml_state::std_basis::FIRST_FREE_STAMP;
use sml_state::{State, StaticBasis, Ty, TyVarBnd, TyVarKind, Warning};
use std::rc::Rc;

/// The mutable state threaded through elaboration.
#[derive(Debug)]
pub(crate) struct St {
  /// Bindings for the type variables made while elaborating.
  pub(crate) bnd: TyVarBnd,
  next: u32,
  pub(crate) warnings: Vec<Warning>,
  /// Constructs the elaborator does not handle, whose declarations were skipped.
  pub(crate) skipped: Vec<Error>,
  /// The scope elaboration started in. Layers below it were elaborated by earlier calls.
  root: Rc<State>,
  /// The free type variables of the values of the root scope and the layers outside it, before
  /// applying `bnd`.
  root_free: Rc<FxHashSet<TyVar>>,
  /// The explicit type variables bound by enclosing `val`s.
  pub(crate) ty_var_scope: Vec<TyVar>,
}

impl St {
  pub(crate) fn new(
    root: &Rc<State>,
    bnd: TyVarBnd,
    next: u32,
    root_free: &Rc<FxHashSet<TyVar>>,
  ) -> St {
    St {
      bnd,
      next,
      warnings: Vec::new(),
      skipped: Vec::new(),
      root: Rc::clone(root),
      root_free: Rc::clone(root_free),
      ty_var_scope: Vec::new(),
    }
  }

  pub(crate) fn next(&self) -> u32 {
    self.next
  }

  /// Returns a fresh type variable of the kind, distinct from every variable already bound and
  /// every variable in `avoid`.
  pub(crate) fn fresh_var(&mut self, kind: TyVarKind, avoid: &[&FxHashSet<TyVar>]) -> TyVar {
    loop {
      let ret = kind.fresh(self.next);
      self.next += 1;
      if !self.bnd.contains_key(&ret) && avoid.iter().all(|xs| !xs.contains(&ret)) {
        return ret;
      }
    }
  }

  pub(crate) fn fresh_ty(&mut self, kind: TyVarKind) -> Ty {
    Ty::Var(self.fresh_var(kind, &[]))
  }

  /// Returns a fresh stamp for a type name. Stamps share the counter with type variables.
  pub(crate) fn fresh_stamp(&mut self) -> u32 {
    let ret = self.next.max(FIRST_FREE_STAMP);
    self.next = ret + 1;
    ret
  }

  /// Marks a type variable as rigid: it unifies only with itself and flexible variables.
  pub(crate) fn make_rigid(&mut self, tv: &TyVar) {
    self.bnd.insert(tv.clone(), (Ty::Var(tv.clone()), true));
  }

  /// Records that a declaration was not elaborated. A name lacking statics only because of an
  /// earlier skip is not recorded again.
  pub(crate) fn skip(&mut self, e: Error) {
    if matches!(e.kind, ErrorKind::NoStatics(_, _)) {
      log::debug!("skipping: {e}");
    } else {
      self.skipped.push(e);
    }
  }

  pub(crate) fn warn<S>(&mut self, pos: Pos, message: S)
  where
    S: Into<String>,
  {
    let w = Warning::new(pos, message);
    log::debug!("statics warning: {w}");
    self.warnings.push(w);
  }

  /// Returns the type variables free in the values of `env` and the layers outside it, with the
  /// bindings applied.
  pub(crate) fn env_free_vars(&self, env: &State) -> FxHashSet<TyVar> {
    let mut raw = FxHashSet::default();
    let mut cur = Some(env);
    while let Some(s) = cur {
      if std::ptr::eq(s, self.root.as_ref()) {
        break;
      }
      s.statics.free_vars(&mut raw);
      cur = s.parent().map(AsRef::as_ref);
    }
    raw.extend(self.root_free.iter().cloned());
    let mut ret = FxHashSet::default();
    for tv in raw {
      apply(&self.bnd, &Ty::Var(tv)).free_vars(&mut ret);
    }
    ret.extend(self.ty_var_scope.iter().cloned());
    ret
  }
}

/// Returns a new scope inside `env` holding the bindings.
pub(crate) fn layer(env: &Rc<State>, basis: StaticBasis) -> Rc<State> {
  let mut ret = State::nested(env);
  ret.statics = basis;
  Rc::new(ret)
}

pub(crate) fn err<T>(pos: Pos, kind: ErrorKind) -> Result<T, Error> {
  Err(Error::new(pos, kind))
}
