//! Generalizing types into schemes, and instantiating schemes into types.

use crate::st::St;
use crate::unify::{apply, is_rigid};
use fast_hash::{FxHashMap, FxHashSet};
use sml_ast::TyVar;
use sml_state::std_basis::Prim;
use sml_state::{State, StaticBasis, Ty, TyScheme, TyVarKind};
use str_util::Name;

/// Replaces the bound variables of the scheme with fresh ones.
pub(crate) fn instantiate(st: &mut St, scheme: &TyScheme) -> Ty {
  if scheme.bound.is_empty() {
    return scheme.ty.clone();
  }
  let map: FxHashMap<_, _> =
    scheme.bound.iter().map(|tv| (tv.clone(), st.fresh_ty(TyVarKind::of(tv)))).collect();
  scheme.ty.subst(&map)
}

/// Pushes the free variables of `ty` onto `ac` in order of first occurrence.
pub(crate) fn free_vars_ordered(ty: &Ty, ac: &mut Vec<TyVar>) {
  match ty {
    Ty::Var(tv) => {
      if !ac.contains(tv) {
        ac.push(tv.clone());
      }
    }
    Ty::Record(rows, rest) => {
      for ty in rows.values() {
        free_vars_ordered(ty, ac);
      }
      if let Some(rv) = rest
        && !ac.contains(rv)
      {
        ac.push(rv.clone());
      }
    }
    Ty::Fn(a, b) => {
      free_vars_ordered(a, ac);
      free_vars_ordered(b, ac);
    }
    Ty::Con(args, _) => {
      for ty in args {
        free_vars_ordered(ty, ac);
      }
    }
  }
}

/// Generalizes `ty` over the variables not free in `env`.
///
/// Overloaded variables are defaulted to `int` rather than generalized. If `expansive`, only the
/// written type variables in `own` are generalized.
pub(crate) fn generalize(
  st: &mut St,
  env: &State,
  ty: &Ty,
  expansive: bool,
  own: &[TyVar],
) -> TyScheme {
  let ty = apply(&st.bnd, ty);
  let mut free = Vec::new();
  free_vars_ordered(&ty, &mut free);
  if free.is_empty() {
    return TyScheme::mono(ty);
  }
  let env_free = st.env_free_vars(env);
  let mut bound = Vec::new();
  let mut defaulted = false;
  for tv in free {
    if env_free.contains(&tv) {
      continue;
    }
    if is_rigid(&st.bnd, &tv) {
      if own.contains(&tv) {
        bound.push(tv);
      }
      continue;
    }
    match TyVarKind::of(&tv) {
      TyVarKind::Num | TyVarKind::Ord => {
        st.bnd.insert(tv, (Prim::Int.ty(), false));
        defaulted = true;
      }
      TyVarKind::Regular | TyVarKind::Equality => {
        if !expansive {
          bound.push(tv);
        }
      }
    }
  }
  let ty = if defaulted { apply(&st.bnd, &ty) } else { ty };
  prettify(TyScheme { bound, ty })
}

/// Renames the fresh bound variables of the scheme to `'a`, `'b`, and so on, skipping names
/// already used.
fn prettify(scheme: TyScheme) -> TyScheme {
  if scheme.bound.iter().all(|tv| sml_state::fresh_counter(tv).is_none()) {
    return scheme;
  }
  let mut used = FxHashSet::default();
  scheme.ty.free_vars(&mut used);
  used.retain(|tv| sml_state::fresh_counter(tv).is_none());
  let mut idx = 0usize;
  let mut map = FxHashMap::default();
  let mut bound = Vec::with_capacity(scheme.bound.len());
  for tv in scheme.bound {
    if sml_state::fresh_counter(&tv).is_none() {
      bound.push(tv);
      continue;
    }
    let prefix = if TyVarKind::of(&tv).is_equality() { "''" } else { "'" };
    let new = loop {
      let candidate = TyVar::new(Name::new(format!("{prefix}{}", pretty_name(idx))));
      idx += 1;
      if !used.contains(&candidate) {
        break candidate;
      }
    };
    used.insert(new.clone());
    map.insert(tv, Ty::Var(new.clone()));
    bound.push(new);
  }
  TyScheme { bound, ty: scheme.ty.subst(&map) }
}

pub(crate) fn pretty_name(idx: usize) -> String {
  let letter = char::from(b'a' + u8::try_from(idx % 26).unwrap_or(0));
  match idx / 26 {
    0 => letter.to_string(),
    n => format!("{letter}{n}"),
  }
}

/// Applies the bindings to every scheme in the basis, defaulting any overloaded variables left.
pub(crate) fn resolve_basis(st: &mut St, basis: &mut StaticBasis) {
  for val in basis.val_env.values_mut() {
    let mut free = Vec::new();
    free_vars_ordered(&apply(&st.bnd, &val.scheme.ty), &mut free);
    for tv in free {
      if matches!(TyVarKind::of(&tv), TyVarKind::Num | TyVarKind::Ord) && !is_rigid(&st.bnd, &tv)
      {
        st.bnd.insert(tv, (Prim::Int.ty(), false));
      }
    }
    val.scheme.ty = apply(&st.bnd, &val.scheme.ty);
  }
  for str in basis.str_env.values_mut() {
    resolve_basis(st, str);
  }
}

#[cfg(test)]
mod tests {
  use super::pretty_name;

  #[test]
  fn names() {
    assert_eq!(pretty_name(0), "a");
    assert_eq!(pretty_name(25), "z");
    assert_eq!(pretty_name(27), "b1");
  }
}
