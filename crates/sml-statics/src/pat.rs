//! Patterns.

use crate::error::{ErrorKind, Item, Result};
use crate::generalize::instantiate;
use crate::st::{St, err, layer};
use crate::unify::{apply, unify};
use fast_hash::FxHashMap;
use sml_ast::{Located, Pat, Path, SCon};
use sml_state::std_basis::Prim;
use sml_state::{IdStatus, Namespace, State, StaticBasis, Ty, TyScheme, TyVarKind, ValInfo};
use std::collections::BTreeMap;
use std::rc::Rc;
use str_util::Name;

/// The variables a pattern binds.
pub(crate) type Binds = FxHashMap<Name, ValInfo>;

pub(crate) fn scon_ty(scon: &SCon) -> Ty {
  match scon {
    SCon::Int(_) => Prim::Int.ty(),
    SCon::Real(_) => Prim::Real.ty(),
    SCon::Word(_) => Prim::Word.ty(),
    SCon::Char(_) => Prim::Char.ty(),
    SCon::String(_) => Prim::String.ty(),
  }
}

pub(crate) fn get(
  st: &mut St,
  env: &Rc<State>,
  pat: &Located<Pat>,
  binds: &mut Binds,
) -> Result<Ty> {
  let pos = pat.pos;
  let ret = match &pat.val {
    Pat::Wild => st.fresh_ty(TyVarKind::Regular),
    Pat::SCon(scon) => scon_ty(scon),
    Pat::Path(path, _) => match env.id_status(path) {
      Some(IdStatus::Con | IdStatus::Exn) => {
        let ty = con_ty(st, env, pos, path)?;
        if matches!(apply(&st.bnd, &ty), Ty::Fn(_, _)) {
          return err(pos, ErrorKind::ConNeedsArg(path.to_string()));
        }
        ty
      }
      None if env.lacks_statics(path, Namespace::Val) && !path.prefix().is_empty() => {
        return err(pos, ErrorKind::NoStatics(Item::Val, path.to_string()));
      }
      Some(IdStatus::Val) | None => {
        if !path.prefix().is_empty() {
          return err(pos, ErrorKind::NotCon(path.to_string()));
        }
        let ty = st.fresh_ty(TyVarKind::Regular);
        bind(pos, binds, path.last(), &ty)?;
        ty
      }
    },
    Pat::Con(path, arg) => {
      match env.id_status(path) {
        Some(IdStatus::Con | IdStatus::Exn) => {}
        Some(IdStatus::Val) => return err(pos, ErrorKind::NotCon(path.to_string())),
        None if env.lacks_statics(path, Namespace::Val) => {
          return err(pos, ErrorKind::NoStatics(Item::Val, path.to_string()));
        }
        None => return err(pos, ErrorKind::Undefined(Item::Val, path.to_string())),
      }
      let con = con_ty(st, env, pos, path)?;
      let arg_ty = get(st, env, arg, binds)?;
      match apply(&st.bnd, &con) {
        Ty::Fn(param, res) => {
          unify(st, arg.pos, &param, &arg_ty)?;
          *res
        }
        _ => return err(pos, ErrorKind::ConNoArg(path.to_string())),
      }
    }
    Pat::Record { rows, rest } => {
      let mut ac = BTreeMap::new();
      for (lab, pat) in rows {
        let ty = get(st, env, pat, binds)?;
        if ac.insert(lab.clone(), ty).is_some() {
          return err(pat.pos, ErrorKind::Duplicate(Item::Val, Name::new(lab.to_string())));
        }
      }
      let rest = rest.then(|| st.fresh_var(TyVarKind::Regular, &[]));
      Ty::Record(ac, rest)
    }
    Pat::Tuple(pats) => {
      let tys = pats.iter().map(|pat| get(st, env, pat, binds)).collect::<Result<_>>()?;
      Ty::tuple(tys)
    }
    Pat::List(pats) => Prim::List.apply(elems(st, env, pats, binds)?),
    Pat::Vector(pats) => Prim::Vector.apply(elems(st, env, pats, binds)?),
    Pat::Typed(inner, ty) => {
      let want = crate::ty::get(env, ty)?;
      let got = get(st, env, inner, binds)?;
      unify(st, pos, &want, &got)?;
      want
    }
    Pat::As(name, ty, inner) => {
      let got = get(st, env, inner, binds)?;
      if let Some(ty) = ty {
        let want = crate::ty::get(env, ty)?;
        unify(st, pos, &want, &got)?;
      }
      bind(pos, binds, name, &got)?;
      got
    }
    Pat::Conj(a, b) => {
      let a_ty = get(st, env, a, binds)?;
      let b_ty = get(st, env, b, binds)?;
      unify(st, pos, &a_ty, &b_ty)?;
      a_ty
    }
    Pat::Or(alts) => {
      let ty = st.fresh_ty(TyVarKind::Regular);
      let mut first: Option<Binds> = None;
      for alt in alts {
        let mut alt_binds = Binds::default();
        let alt_ty = get(st, env, alt, &mut alt_binds)?;
        unify(st, alt.pos, &ty, &alt_ty)?;
        match &first {
          None => first = Some(alt_binds),
          Some(first) => {
            for (name, info) in first {
              let Some(other) = alt_binds.remove(name) else {
                return err(alt.pos, ErrorKind::OrPatBindings(name.clone()));
              };
              unify(st, alt.pos, &info.scheme.ty, &other.scheme.ty)?;
            }
            if let Some(name) = alt_binds.into_keys().next() {
              return err(alt.pos, ErrorKind::OrPatBindings(name));
            }
          }
        }
      }
      for (name, info) in first.unwrap_or_default() {
        bind(pos, binds, &name, &info.scheme.ty)?;
      }
      ty
    }
    Pat::Guard(inner, guard_pat, guard_exp) => {
      let ty = get(st, env, inner, binds)?;
      let env = layer(env, StaticBasis { val_env: binds.clone(), ..StaticBasis::default() });
      let exp_ty = crate::exp::get(st, &env, guard_exp)?;
      let pat_ty = get(st, &env, guard_pat, binds)?;
      unify(st, guard_pat.pos, &pat_ty, &exp_ty)?;
      ty
    }
  };
  Ok(ret)
}

fn elems(
  st: &mut St,
  env: &Rc<State>,
  pats: &[Located<Pat>],
  binds: &mut Binds,
) -> Result<Ty> {
  let elem = st.fresh_ty(TyVarKind::Regular);
  for pat in pats {
    let ty = get(st, env, pat, binds)?;
    unify(st, pat.pos, &elem, &ty)?;
  }
  Ok(elem)
}

/// Returns an instance of the constructor's type.
fn con_ty(st: &mut St, env: &State, pos: sml_ast::Pos, path: &Path) -> Result<Ty> {
  match env.static_lookup(path, Namespace::Val, |b| &b.val_env) {
    Some(info) => Ok(instantiate(st, &info.scheme)),
    None => err(pos, ErrorKind::NoStatics(Item::Val, path.to_string())),
  }
}

fn bind(pos: sml_ast::Pos, binds: &mut Binds, name: &Name, ty: &Ty) -> Result<()> {
  let info = ValInfo { scheme: TyScheme::mono(ty.clone()), id_status: IdStatus::Val };
  if binds.insert(name.clone(), info).is_some() {
    return err(pos, ErrorKind::Duplicate(Item::Val, name.clone()));
  }
  Ok(())
}
