//! Checking a structure matches a realized signature.

use crate::error::{ErrorKind, Item, Result};
use crate::st::{St, err};
use crate::unify::unify_no_emit;
use fast_hash::{FxHashMap, FxHashSet};
use sml_ast::Pos;
use sml_state::{IdStatus, StaticBasis, Ty, TyScheme, TyVarKind, ValInfo};
use std::collections::BTreeSet;
use str_util::Name;

/// Returns the structure's view through the signature: the names of the signature, the types of
/// the structure, and the value types of the signature.
pub(crate) fn get(
  st: &mut St,
  pos: Pos,
  str: &StaticBasis,
  sig: &StaticBasis,
) -> Result<StaticBasis> {
  let mut ret = StaticBasis::default();
  for (name, sig_info) in sorted(&sig.ty_env) {
    let Some(str_info) = str.ty_env.get(name) else {
      return err(pos, ErrorKind::Unimplemented(Item::Ty, name.clone()));
    };
    if sig_info.arity() != str_info.arity() {
      let kind = ErrorKind::ArityMismatch(name.to_string(), sig_info.arity(), str_info.arity());
      return err(pos, kind);
    }
    let args: Vec<_> = sig_info.ty_fn.bound.iter().map(|tv| rigid(st, TyVarKind::of(tv))).collect();
    let want = sig_info.ty_fn.apply(&args);
    let got = str_info.ty_fn.apply(&args);
    if unify_no_emit(st, &want, &got).is_err() {
      return err(pos, ErrorKind::TypeMismatch(name.clone(), want, got));
    }
    if !sig_info.cons.is_empty() {
      let want: BTreeSet<_> = sig_info.cons.iter().map(|(con, _)| con.as_str()).collect();
      let got: BTreeSet<_> = str_info.cons.iter().map(|(con, _)| con.as_str()).collect();
      if want != got {
        return err(pos, ErrorKind::DatatypeMismatch(name.clone()));
      }
    }
    ret.ty_env.insert(name.clone(), str_info.clone());
  }
  for (name, sig_info) in sorted(&sig.val_env) {
    let Some(str_info) = str.val_env.get(name) else {
      if str.skipped_vals.contains(name) {
        return err(pos, ErrorKind::NoStatics(Item::Val, name.to_string()));
      }
      return err(pos, ErrorKind::Unimplemented(Item::Val, name.clone()));
    };
    let status_ok = match sig_info.id_status {
      IdStatus::Val => true,
      IdStatus::Con | IdStatus::Exn => sig_info.id_status == str_info.id_status,
    };
    if !status_ok {
      return err(pos, ErrorKind::IdStatusMismatch(name.clone()));
    }
    let want = instance(st, &sig_info.scheme, str_info, true);
    let got = instance(st, &str_info.scheme, sig_info, false);
    if unify_no_emit(st, &want, &got).is_err() {
      let (want, got) = (sig_info.scheme.ty.clone(), str_info.scheme.ty.clone());
      return err(pos, ErrorKind::ValueMismatch(name.clone(), want, got));
    }
    ret.val_env.insert(name.clone(), sig_info.clone());
  }
  for (name, sig_str) in sorted(&sig.str_env) {
    let Some(str_str) = str.str_env.get(name) else {
      if str.skipped_strs.contains(name) {
        return err(pos, ErrorKind::NoStatics(Item::Str, name.to_string()));
      }
      return err(pos, ErrorKind::Unimplemented(Item::Str, name.clone()));
    };
    let inner = get(st, pos, str_str, sig_str)?;
    ret.str_env.insert(name.clone(), inner);
  }
  Ok(ret)
}

fn sorted<V>(env: &FxHashMap<Name, V>) -> Vec<(&Name, &V)> {
  let mut ret: Vec<_> = env.iter().collect();
  ret.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
  ret
}

fn rigid(st: &mut St, kind: TyVarKind) -> Ty {
  let tv = st.fresh_var(kind, &[]);
  st.make_rigid(&tv);
  Ty::Var(tv)
}

/// Instantiates the scheme with fresh variables, avoiding the free variables of both sides. The
/// signature's side gets rigid ones, so the structure's side must be at least as general.
fn instance(st: &mut St, scheme: &TyScheme, other: &ValInfo, is_sig: bool) -> Ty {
  let mut avoid = FxHashSet::default();
  scheme.free_vars(&mut avoid);
  other.scheme.free_vars(&mut avoid);
  let mut map = FxHashMap::default();
  for tv in &scheme.bound {
    let new = st.fresh_var(TyVarKind::of(tv), &[&avoid]);
    if is_sig {
      st.make_rigid(&new);
    }
    map.insert(tv.clone(), Ty::Var(new));
  }
  scheme.ty.subst(&map)
}
