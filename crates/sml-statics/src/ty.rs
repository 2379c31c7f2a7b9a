//! Elaborating written types.

use crate::error::{ErrorKind, Item, Result};
use crate::st::err;
use sml_ast::Located;
use sml_state::{Namespace, State, Ty};

pub(crate) fn get(env: &State, ty: &Located<sml_ast::Ty>) -> Result<Ty> {
  let ret = match &ty.val {
    sml_ast::Ty::Var(tv) => Ty::Var(tv.clone()),
    sml_ast::Ty::Record(rows) => {
      let mut ac = std::collections::BTreeMap::new();
      for (lab, ty) in rows {
        ac.insert(lab.clone(), get(env, ty)?);
      }
      Ty::Record(ac, None)
    }
    sml_ast::Ty::Tuple(tys) => {
      Ty::tuple(tys.iter().map(|ty| get(env, ty)).collect::<Result<_>>()?)
    }
    sml_ast::Ty::Con(args, path) => {
      let Some(info) = env.static_lookup(path, Namespace::Ty, |b| &b.ty_env) else {
        if env.lacks_statics(path, Namespace::Ty) {
          return err(ty.pos, ErrorKind::NoStatics(Item::Ty, path.to_string()));
        }
        return err(ty.pos, ErrorKind::Undefined(Item::Ty, path.to_string()));
      };
      if info.arity() != args.len() {
        return err(ty.pos, ErrorKind::ArityMismatch(path.to_string(), info.arity(), args.len()));
      }
      let args: Vec<_> = args.iter().map(|ty| get(env, ty)).collect::<Result<_>>()?;
      info.ty_fn.apply(&args)
    }
    sml_ast::Ty::Fn(param, res) => Ty::fun(get(env, param)?, get(env, res)?),
  };
  Ok(ret)
}

/// Requires every written variable in `ty` to be among `bound`.
pub(crate) fn check_bound(pos: sml_ast::Pos, ty: &Ty, bound: &[sml_ast::TyVar]) -> Result<()> {
  let mut free = Vec::new();
  crate::generalize::free_vars_ordered(ty, &mut free);
  match free.into_iter().find(|tv| !bound.contains(tv)) {
    None => Ok(()),
    Some(tv) => err(pos, ErrorKind::UnboundTyVar(tv)),
  }
}
