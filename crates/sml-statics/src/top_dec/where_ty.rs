//! `where type`.

use crate::error::{ErrorKind, Item, Result};
use crate::st::err;
use sml_ast::{Located, Path, Pos, TyVar};
use sml_state::{Realisation, Sig, State, TyScheme};

/// Realizes the flexible type at `path` in the signature as `ty`, making it no longer flexible.
pub(crate) fn get(
  env: &State,
  pos: Pos,
  mut sig: Sig,
  ty_vars: &[TyVar],
  path: &Path,
  ty: &Located<sml_ast::Ty>,
) -> Result<Sig> {
  let Some(info) = sig.env.get_str(path.prefix()).and_then(|b| b.ty_env.get(path.last())) else {
    return err(pos, ErrorKind::Undefined(Item::Ty, path.to_string()));
  };
  let Some(name) = super::instance::defined(info, &sig.ty_names).cloned() else {
    return err(pos, ErrorKind::CannotRealize(path.to_string()));
  };
  if info.arity() != ty_vars.len() {
    return err(pos, ErrorKind::ArityMismatch(path.to_string(), info.arity(), ty_vars.len()));
  }
  let got = crate::ty::get(env, ty)?;
  crate::ty::check_bound(ty.pos, &got, ty_vars)?;
  let ty_fn = TyScheme { bound: ty_vars.to_vec(), ty: got };
  if name.equality && !crate::equality::ty_fn_admits(&ty_fn) {
    return err(pos, ErrorKind::NotEquality(ty_fn.ty));
  }
  log::debug!("`{path}` realized as `{ty_fn}`");
  sig.ty_names.remove(&name.stamp);
  let phi: Realisation = [(name.stamp, ty_fn)].into_iter().collect();
  sig.env = sig.env.realize(&phi);
  Ok(sig)
}
