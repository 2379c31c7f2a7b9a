//! Signature instances, and realisations of their flexible types by structures.

use crate::error::{ErrorKind, Item, Result};
use crate::st::{St, err};
use sml_ast::{Pos, TyVar};
use sml_state::{Realisation, Sig, StaticBasis, Ty, TyInfo, TyName, TyScheme};
use std::collections::BTreeSet;
use str_util::Name;

/// Where a flexible type name is defined in a signature's environment.
struct Def {
  path: Vec<Name>,
  name: Name,
  ty_name: TyName,
  bound: Vec<TyVar>,
}

/// Returns the flexible type name the type info defines, if any: a type whose type function is
/// the name applied to its own parameters.
pub(crate) fn defined<'a>(info: &'a TyInfo, flex: &BTreeSet<u32>) -> Option<&'a TyName> {
  let Ty::Con(args, name) = &info.ty_fn.ty else { return None };
  let params = &info.ty_fn.bound;
  let is_def = flex.contains(&name.stamp)
    && args.len() == params.len()
    && args.iter().zip(params).all(|(arg, p)| matches!(arg, Ty::Var(tv) if tv == p));
  is_def.then_some(name)
}

/// Finds definitions in name order, so the first name for a type wins.
fn defs(env: &StaticBasis, flex: &BTreeSet<u32>, path: &mut Vec<Name>, ac: &mut Vec<Def>) {
  let mut names: Vec<_> = env.ty_env.iter().collect();
  names.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
  for (name, info) in names {
    if let Some(ty_name) = defined(info, flex) {
      let bound = info.ty_fn.bound.clone();
      ac.push(Def { path: path.clone(), name: name.clone(), ty_name: ty_name.clone(), bound });
    }
  }
  let mut strs: Vec<_> = env.str_env.iter().collect();
  strs.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
  for (name, env) in strs {
    path.push(name.clone());
    defs(env, flex, path, ac);
    path.pop();
  }
}

/// Returns a copy of the signature with fresh stamps for its flexible type names.
pub(crate) fn fresh(st: &mut St, sig: &Sig) -> Sig {
  let mut ac = Vec::new();
  defs(&sig.env, &sig.ty_names, &mut Vec::new(), &mut ac);
  let mut phi = Realisation::default();
  let mut ty_names = BTreeSet::new();
  for def in ac {
    if phi.contains_key(&def.ty_name.stamp) {
      continue;
    }
    let stamp = st.fresh_stamp();
    ty_names.insert(stamp);
    let name = TyName { stamp, ..def.ty_name.clone() };
    let ty = Ty::Con(def.bound.iter().cloned().map(Ty::Var).collect(), name);
    phi.insert(def.ty_name.stamp, TyScheme { bound: def.bound, ty });
  }
  // names no longer reachable by any path stay as they are.
  ty_names.extend(sig.ty_names.iter().filter(|s| !phi.contains_key(s)));
  Sig { ty_names, env: sig.env.realize(&phi) }
}

/// Returns the realisation taking each flexible type name of the signature to the type function
/// of the structure's type at the same path.
pub(crate) fn realisation(pos: Pos, str: &StaticBasis, sig: &Sig) -> Result<Realisation> {
  let mut ac = Vec::new();
  defs(&sig.env, &sig.ty_names, &mut Vec::new(), &mut ac);
  let mut phi = Realisation::default();
  for def in ac {
    if phi.contains_key(&def.ty_name.stamp) {
      continue;
    }
    let Some(inner) = str.get_str(&def.path) else {
      let path: Vec<_> = def.path.iter().map(Name::as_str).collect();
      let path = path.join(".");
      if skips_str(str, &def.path) {
        return err(pos, ErrorKind::NoStatics(Item::Str, path));
      }
      return err(pos, ErrorKind::Unimplemented(Item::Str, Name::new(path)));
    };
    let Some(info) = inner.ty_env.get(&def.name) else {
      return err(pos, ErrorKind::Unimplemented(Item::Ty, def.name));
    };
    if info.arity() != def.bound.len() {
      let kind = ErrorKind::ArityMismatch(def.name.to_string(), def.bound.len(), info.arity());
      return err(pos, kind);
    }
    if def.ty_name.equality && !crate::equality::ty_fn_admits(&info.ty_fn) {
      return err(pos, ErrorKind::NotEquality(info.ty_fn.ty.clone()));
    }
    phi.insert(def.ty_name.stamp, info.ty_fn.clone());
  }
  Ok(phi)
}

/// Returns whether the first name on the path missing from `str` is a skipped structure.
fn skips_str(str: &StaticBasis, path: &[Name]) -> bool {
  let mut cur = str;
  for name in path {
    match cur.str_env.get(name) {
      Some(inner) => cur = inner,
      None => return cur.skipped_strs.contains(name),
    }
  }
  false
}
