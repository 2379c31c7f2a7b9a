//! Helpers about expressions: which type variables they mention, and whether they are expansive.

use sml_ast::{Dec, Exp, Located, Pat, Ty, TyVar};
use sml_state::{IdStatus, State};

fn push(tv: &TyVar, ac: &mut Vec<TyVar>) {
  if !ac.contains(tv) {
    ac.push(tv.clone());
  }
}

pub(crate) fn ty_vars_ty(ty: &Located<Ty>, ac: &mut Vec<TyVar>) {
  match &ty.val {
    Ty::Var(tv) => push(tv, ac),
    Ty::Record(rows) => rows.iter().for_each(|(_, ty)| ty_vars_ty(ty, ac)),
    Ty::Tuple(tys) | Ty::Con(tys, _) => tys.iter().for_each(|ty| ty_vars_ty(ty, ac)),
    Ty::Fn(a, b) => {
      ty_vars_ty(a, ac);
      ty_vars_ty(b, ac);
    }
  }
}

/// Collects the written type variables of a value binding, nested declarations included.
pub(crate) fn ty_vars_exp(exp: &Located<Exp>, ac: &mut Vec<TyVar>) {
  match &exp.val {
    Exp::SCon(_) | Exp::Path(_, _) | Exp::Selector(_) => {}
    Exp::Record(rows) => rows.iter().for_each(|(_, e)| ty_vars_exp(e, ac)),
    Exp::Tuple(es) | Exp::List(es) | Exp::Vector(es) | Exp::Seq(es) => {
      es.iter().for_each(|e| ty_vars_exp(e, ac));
    }
    Exp::Let(dec, e) => {
      ty_vars_dec(dec, ac);
      ty_vars_exp(e, ac);
    }
    Exp::App(a, b) | Exp::Andalso(a, b) | Exp::Orelse(a, b) | Exp::While(a, b) => {
      ty_vars_exp(a, ac);
      ty_vars_exp(b, ac);
    }
    Exp::Typed(e, ty) => {
      ty_vars_exp(e, ac);
      ty_vars_ty(ty, ac);
    }
    Exp::Handle(e, matcher) | Exp::Case(e, matcher) => {
      ty_vars_exp(e, ac);
      for arm in matcher {
        ty_vars_pat(&arm.pat, ac);
        ty_vars_exp(&arm.exp, ac);
      }
    }
    Exp::Raise(e) => ty_vars_exp(e, ac),
    Exp::If(a, b, c) => {
      ty_vars_exp(a, ac);
      ty_vars_exp(b, ac);
      ty_vars_exp(c, ac);
    }
    Exp::Fn(matcher) => {
      for arm in matcher {
        ty_vars_pat(&arm.pat, ac);
        ty_vars_exp(&arm.exp, ac);
      }
    }
  }
}

pub(crate) fn ty_vars_pat(pat: &Located<Pat>, ac: &mut Vec<TyVar>) {
  match &pat.val {
    Pat::Wild | Pat::SCon(_) | Pat::Path(_, _) => {}
    Pat::Con(_, p) => ty_vars_pat(p, ac),
    Pat::Record { rows, .. } => rows.iter().for_each(|(_, p)| ty_vars_pat(p, ac)),
    Pat::Tuple(ps) | Pat::List(ps) | Pat::Vector(ps) | Pat::Or(ps) => {
      ps.iter().for_each(|p| ty_vars_pat(p, ac));
    }
    Pat::Typed(p, ty) => {
      ty_vars_pat(p, ac);
      ty_vars_ty(ty, ac);
    }
    Pat::As(_, ty, p) => {
      if let Some(ty) = ty {
        ty_vars_ty(ty, ac);
      }
      ty_vars_pat(p, ac);
    }
    Pat::Conj(a, b) => {
      ty_vars_pat(a, ac);
      ty_vars_pat(b, ac);
    }
    Pat::Guard(p, q, e) => {
      ty_vars_pat(p, ac);
      ty_vars_pat(q, ac);
      ty_vars_exp(e, ac);
    }
  }
}

fn ty_vars_dec(dec: &Located<Dec>, ac: &mut Vec<TyVar>) {
  match &dec.val {
    Dec::Val(_, binds) => {
      for bind in binds {
        ty_vars_pat(&bind.pat, ac);
        ty_vars_exp(&bind.exp, ac);
      }
    }
    Dec::Local(a, b) => {
      ty_vars_dec(a, ac);
      ty_vars_dec(b, ac);
    }
    Dec::Seq(decs) => decs.iter().for_each(|d| ty_vars_dec(d, ac)),
    Dec::Abstype(_, _, d) => ty_vars_dec(d, ac),
    Dec::Do(e) => ty_vars_exp(e, ac),
    // the other declarations bind their own type variables, if any.
    Dec::Fun(_, _)
    | Dec::Ty(_)
    | Dec::Datatype(_, _)
    | Dec::DatatypeCopy(_, _)
    | Dec::Exception(_)
    | Dec::Open(_)
    | Dec::Infix(_, _)
    | Dec::Infixr(_, _)
    | Dec::Nonfix(_)
    | Dec::Structure(_)
    | Dec::Signature(_)
    | Dec::Functor(_) => {}
  }
}

/// Returns whether evaluating the expression might make a reference or raise, in which case its
/// type is not generalized.
pub(crate) fn is_expansive(env: &State, exp: &Located<Exp>) -> bool {
  match &exp.val {
    Exp::SCon(_) | Exp::Path(_, _) | Exp::Selector(_) | Exp::Fn(_) => false,
    Exp::Record(rows) => rows.iter().any(|(_, e)| is_expansive(env, e)),
    Exp::Tuple(es) | Exp::List(es) | Exp::Vector(es) => es.iter().any(|e| is_expansive(env, e)),
    Exp::Typed(e, _) => is_expansive(env, e),
    Exp::App(func, arg) => {
      let Exp::Path(path, _) = &func.val else { return true };
      let is_ref = path.prefix().is_empty() && path.last().as_str() == "ref";
      let is_con = env.id_status(path).is_some_and(IdStatus::is_con);
      is_ref || !is_con || is_expansive(env, arg)
    }
    _ => true,
  }
}
