//! Expressions.

use crate::error::{ErrorKind, Item, Result};
use crate::generalize::instantiate;
use crate::pat::{Binds, scon_ty};
use crate::st::{St, err, layer};
use crate::unify::{apply, unify};
use sml_ast::{Exp, Located, Matcher};
use sml_state::std_basis::Prim;
use sml_state::{Namespace, State, StaticBasis, Ty, TyVarKind};
use std::collections::BTreeMap;
use std::rc::Rc;
use str_util::Name;

pub(crate) fn get(st: &mut St, env: &Rc<State>, exp: &Located<Exp>) -> Result<Ty> {
  let pos = exp.pos;
  let ret = match &exp.val {
    Exp::SCon(scon) => scon_ty(scon),
    Exp::Path(path, _) => {
      if let Some(info) = env.static_lookup(path, Namespace::Val, |b| &b.val_env) {
        let scheme = info.scheme.clone();
        return Ok(instantiate(st, &scheme));
      }
      if env.lacks_statics(path, Namespace::Val) {
        return err(pos, ErrorKind::NoStatics(Item::Val, path.to_string()));
      }
      if !path.prefix().is_empty() && env.static_str(path.prefix()).is_none() {
        let prefix: Vec<_> = path.prefix().iter().map(Name::as_str).collect();
        return err(pos, ErrorKind::Undefined(Item::Module, prefix.join(".")));
      }
      return err(pos, ErrorKind::Undefined(Item::Val, path.to_string()));
    }
    Exp::Record(rows) => {
      let mut ac = BTreeMap::new();
      for (lab, exp) in rows {
        let ty = get(st, env, exp)?;
        if ac.insert(lab.clone(), ty).is_some() {
          return err(exp.pos, ErrorKind::Duplicate(Item::Val, Name::new(lab.to_string())));
        }
      }
      Ty::Record(ac, None)
    }
    Exp::Selector(lab) => {
      let field = st.fresh_ty(TyVarKind::Regular);
      let rest = st.fresh_var(TyVarKind::Regular, &[]);
      let record = Ty::Record(BTreeMap::from([(lab.clone(), field.clone())]), Some(rest));
      Ty::fun(record, field)
    }
    Exp::Tuple(exps) => {
      Ty::tuple(exps.iter().map(|e| get(st, env, e)).collect::<Result<_>>()?)
    }
    Exp::List(exps) => Prim::List.apply(elems(st, env, exps)?),
    Exp::Vector(exps) => Prim::Vector.apply(elems(st, env, exps)?),
    Exp::Seq(exps) => {
      let mut ret = Ty::unit();
      for exp in exps {
        ret = get(st, env, exp)?;
      }
      ret
    }
    Exp::Let(dec, body) => {
      let basis = crate::dec::get(st, env, dec)?;
      get(st, &layer(env, basis), body)?
    }
    Exp::App(func, arg) => {
      let func_ty = get(st, env, func)?;
      let arg_ty = get(st, env, arg)?;
      match apply(&st.bnd, &func_ty) {
        Ty::Fn(param, res) => {
          unify(st, arg.pos, &param, &arg_ty)?;
          *res
        }
        func_ty => {
          let res = st.fresh_ty(TyVarKind::Regular);
          unify(st, func.pos, &Ty::fun(arg_ty, res.clone()), &func_ty)?;
          res
        }
      }
    }
    Exp::Typed(inner, ty) => {
      let want = crate::ty::get(env, ty)?;
      let got = get(st, env, inner)?;
      unify(st, pos, &want, &got)?;
      want
    }
    Exp::Andalso(a, b) | Exp::Orelse(a, b) => {
      bool_exp(st, env, a)?;
      bool_exp(st, env, b)?;
      Prim::Bool.ty()
    }
    Exp::Handle(inner, arms) => {
      let ty = get(st, env, inner)?;
      matcher(st, env, arms, &Prim::Exn.ty(), &ty)?;
      ty
    }
    Exp::Raise(inner) => {
      let ty = get(st, env, inner)?;
      unify(st, inner.pos, &Prim::Exn.ty(), &ty)?;
      st.fresh_ty(TyVarKind::Regular)
    }
    Exp::If(cond, yes, no) => {
      bool_exp(st, env, cond)?;
      let yes_ty = get(st, env, yes)?;
      let no_ty = get(st, env, no)?;
      unify(st, no.pos, &yes_ty, &no_ty)?;
      yes_ty
    }
    Exp::While(cond, body) => {
      bool_exp(st, env, cond)?;
      get(st, env, body)?;
      Ty::unit()
    }
    Exp::Case(head, arms) => {
      let head_ty = get(st, env, head)?;
      let res = st.fresh_ty(TyVarKind::Regular);
      matcher(st, env, arms, &head_ty, &res)?;
      res
    }
    Exp::Fn(arms) => {
      let param = st.fresh_ty(TyVarKind::Regular);
      let res = st.fresh_ty(TyVarKind::Regular);
      matcher(st, env, arms, &param, &res)?;
      Ty::fun(param, res)
    }
  };
  Ok(ret)
}

fn bool_exp(st: &mut St, env: &Rc<State>, exp: &Located<Exp>) -> Result<()> {
  let ty = get(st, env, exp)?;
  unify(st, exp.pos, &Prim::Bool.ty(), &ty)
}

fn elems(st: &mut St, env: &Rc<State>, exps: &[Located<Exp>]) -> Result<Ty> {
  let elem = st.fresh_ty(TyVarKind::Regular);
  for exp in exps {
    let ty = get(st, env, exp)?;
    unify(st, exp.pos, &elem, &ty)?;
  }
  Ok(elem)
}

/// Checks every arm takes `param` to `res`.
pub(crate) fn matcher(
  st: &mut St,
  env: &Rc<State>,
  arms: &Matcher,
  param: &Ty,
  res: &Ty,
) -> Result<()> {
  for arm in arms {
    let mut binds = Binds::default();
    let pat_ty = crate::pat::get(st, env, &arm.pat, &mut binds)?;
    unify(st, arm.pat.pos, param, &pat_ty)?;
    let env = layer(env, StaticBasis { val_env: binds, ..StaticBasis::default() });
    let exp_ty = get(st, &env, &arm.exp)?;
    unify(st, arm.exp.pos, res, &exp_ty)?;
  }
  Ok(())
}
