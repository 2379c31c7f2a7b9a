//! Unification: given two types, figuring out whether they can be made the same, and if so,
//! binding type variables so they are.

use crate::error::{Error, ErrorKind, Result};
use crate::st::St;
use fast_hash::FxHashSet;
use sml_ast::{Pos, TyVar};
use sml_state::std_basis::Prim;
use sml_state::{Ty, TyName, TyVarBnd, TyVarKind, fresh_counter};
use std::collections::BTreeMap;

pub(crate) fn unify(st: &mut St, pos: Pos, want: &Ty, got: &Ty) -> Result<()> {
  unify_no_emit(st, want, got).map_err(|kind| Error::new(pos, kind))
}

/// Like [`unify`], but leaves the position for the caller to decide.
pub(crate) fn unify_no_emit(st: &mut St, want: &Ty, got: &Ty) -> Result<(), ErrorKind> {
  unify_(st, want, got).map_err(|e| match e {
    UnifyError::Incompatible => {
      ErrorKind::IncompatibleTys(apply(&st.bnd, want), apply(&st.bnd, got))
    }
    UnifyError::Circularity(tv, ty) => ErrorKind::Circularity(tv, ty),
    UnifyError::NotEquality(ty) => ErrorKind::NotEquality(ty),
  })
}

/// Requires `ty` to admit equality.
pub(crate) fn equality(st: &mut St, pos: Pos, ty: &Ty) -> Result<()> {
  let ty = apply(&st.bnd, ty);
  make_equality(st, &ty).map_err(|_| Error::new(pos, ErrorKind::NotEquality(ty)))
}

#[derive(Debug)]
enum UnifyError {
  Incompatible,
  Circularity(TyVar, Ty),
  NotEquality(Ty),
}

/// Returns the type with every flexible variable replaced by what it is bound to.
pub(crate) fn apply(bnd: &TyVarBnd, ty: &Ty) -> Ty {
  match ty {
    Ty::Var(tv) => match bnd.get(tv) {
      Some((ty, false)) => apply(bnd, ty),
      Some((_, true)) | None => ty.clone(),
    },
    Ty::Record(rows, rest) => {
      let mut rows: BTreeMap<_, _> =
        rows.iter().map(|(lab, ty)| (lab.clone(), apply(bnd, ty))).collect();
      let mut rest = rest.clone();
      while let Some(rv) = rest.take() {
        match bnd.get(&rv) {
          Some((Ty::Record(more, more_rest), false)) => {
            for (lab, ty) in more {
              rows.entry(lab.clone()).or_insert_with(|| apply(bnd, ty));
            }
            rest.clone_from(more_rest);
          }
          Some((Ty::Var(new), false)) => rest = Some(new.clone()),
          _ => {
            rest = Some(rv);
            break;
          }
        }
      }
      Ty::Record(rows, rest)
    }
    Ty::Fn(a, b) => Ty::fun(apply(bnd, a), apply(bnd, b)),
    Ty::Con(args, name) => Ty::Con(args.iter().map(|ty| apply(bnd, ty)).collect(), name.clone()),
  }
}

/// Written variables and variables marked rigid unify only with themselves and flexible ones.
pub(crate) fn is_rigid(bnd: &TyVarBnd, tv: &TyVar) -> bool {
  fresh_counter(tv).is_none() || matches!(bnd.get(tv), Some((_, true)))
}

/// `want` and `got` will have the bindings applied to them upon entry to this function.
fn unify_(st: &mut St, want: &Ty, got: &Ty) -> Result<(), UnifyError> {
  let want = apply(&st.bnd, want);
  let got = apply(&st.bnd, got);
  match (&want, &got) {
    (Ty::Var(a), Ty::Var(b)) if a == b => Ok(()),
    (Ty::Var(a), Ty::Var(b)) if !is_rigid(&st.bnd, a) && !is_rigid(&st.bnd, b) => {
      bind_vars(st, a, b)
    }
    (Ty::Var(tv), ty) | (ty, Ty::Var(tv)) if !is_rigid(&st.bnd, tv) => bind(st, tv, ty),
    (Ty::Record(want_rows, want_rest), Ty::Record(got_rows, got_rest)) => {
      let mut only_want = BTreeMap::new();
      for (lab, want) in want_rows {
        match got_rows.get(lab) {
          Some(got) => unify_(st, want, got)?,
          None => {
            only_want.insert(lab.clone(), want.clone());
          }
        }
      }
      let only_got: BTreeMap<_, _> = got_rows
        .iter()
        .filter(|&(lab, _)| !want_rows.contains_key(lab))
        .map(|(lab, ty)| (lab.clone(), ty.clone()))
        .collect();
      match (want_rest, got_rest) {
        (None, None) => {
          if only_want.is_empty() && only_got.is_empty() {
            Ok(())
          } else {
            Err(UnifyError::Incompatible)
          }
        }
        (Some(rv), None) => {
          if !only_want.is_empty() {
            return Err(UnifyError::Incompatible);
          }
          bind_row(st, rv, Ty::Record(only_got, None))
        }
        (None, Some(rv)) => {
          if !only_got.is_empty() {
            return Err(UnifyError::Incompatible);
          }
          bind_row(st, rv, Ty::Record(only_want, None))
        }
        (Some(a), Some(b)) => {
          if a == b {
            return if only_want.is_empty() && only_got.is_empty() {
              Ok(())
            } else {
              Err(UnifyError::Incompatible)
            };
          }
          let rest = st.fresh_var(TyVarKind::Regular, &[]);
          bind_row(st, a, Ty::Record(only_got, Some(rest.clone())))?;
          bind_row(st, b, Ty::Record(only_want, Some(rest)))
        }
      }
    }
    (Ty::Fn(want_param, want_res), Ty::Fn(got_param, got_res)) => {
      unify_(st, want_param, got_param)?;
      unify_(st, want_res, got_res)
    }
    (Ty::Con(want_args, want_name), Ty::Con(got_args, got_name)) => {
      if want_name != got_name || want_args.len() != got_args.len() {
        return Err(UnifyError::Incompatible);
      }
      for (want, got) in want_args.iter().zip(got_args) {
        unify_(st, want, got)?;
      }
      Ok(())
    }
    _ => Err(UnifyError::Incompatible),
  }
}

/// How constrained a kind is. A variable is bound to one at least as constrained.
fn rank(kind: TyVarKind) -> u8 {
  match kind {
    TyVarKind::Regular => 0,
    TyVarKind::Equality => 1,
    TyVarKind::Ord => 2,
    TyVarKind::Num => 3,
  }
}

fn bind_vars(st: &mut St, a: &TyVar, b: &TyVar) -> Result<(), UnifyError> {
  let (ra, rb) = (rank(TyVarKind::of(a)), rank(TyVarKind::of(b)));
  let a_to_b = match ra.cmp(&rb) {
    std::cmp::Ordering::Less => true,
    std::cmp::Ordering::Greater => false,
    // the older one wins, so the variables already in scope stay.
    std::cmp::Ordering::Equal => fresh_counter(a) > fresh_counter(b),
  };
  let (from, to) = if a_to_b { (a, b) } else { (b, a) };
  st.bnd.insert(from.clone(), (Ty::Var(to.clone()), false));
  Ok(())
}

fn occurs(tv: &TyVar, ty: &Ty) -> bool {
  let mut free = FxHashSet::default();
  ty.free_vars(&mut free);
  free.contains(tv)
}

fn bind_row(st: &mut St, rv: &TyVar, ty: Ty) -> Result<(), UnifyError> {
  let ty = apply(&st.bnd, &ty);
  if occurs(rv, &ty) {
    return Err(UnifyError::Circularity(rv.clone(), ty));
  }
  st.bnd.insert(rv.clone(), (ty, false));
  Ok(())
}

/// `ty` is not a variable, or is a rigid one.
fn bind(st: &mut St, tv: &TyVar, ty: &Ty) -> Result<(), UnifyError> {
  if occurs(tv, ty) {
    return Err(UnifyError::Circularity(tv.clone(), ty.clone()));
  }
  match TyVarKind::of(tv) {
    TyVarKind::Regular => {}
    TyVarKind::Equality => make_equality(st, ty)?,
    kind @ (TyVarKind::Num | TyVarKind::Ord) => match ty {
      Ty::Con(args, name) if args.is_empty() && overloads(kind, name) => {}
      _ => return Err(UnifyError::Incompatible),
    },
  }
  st.bnd.insert(tv.clone(), (ty.clone(), false));
  Ok(())
}

fn overloads(kind: TyVarKind, name: &TyName) -> bool {
  let num = [Prim::Int, Prim::Word, Prim::Real];
  let ord = [Prim::Char, Prim::String];
  let is = |prims: &[Prim]| prims.iter().any(|p| p.ty_name() == *name);
  match kind {
    TyVarKind::Num => is(&num),
    TyVarKind::Ord => is(&num) || is(&ord),
    TyVarKind::Regular | TyVarKind::Equality => true,
  }
}

/// Makes every flexible variable in `ty` an equality variable, or errors if `ty` cannot admit
/// equality. `ty` has the bindings applied.
fn make_equality(st: &mut St, ty: &Ty) -> Result<(), UnifyError> {
  match ty {
    Ty::Var(tv) => {
      if is_rigid(&st.bnd, tv) {
        return if TyVarKind::of(tv).is_equality() {
          Ok(())
        } else {
          Err(UnifyError::NotEquality(ty.clone()))
        };
      }
      if TyVarKind::of(tv) == TyVarKind::Regular {
        let eq = st.fresh_ty(TyVarKind::Equality);
        st.bnd.insert(tv.clone(), (eq, false));
      }
      Ok(())
    }
    Ty::Record(rows, _) => {
      for ty in rows.values() {
        make_equality(st, ty)?;
      }
      Ok(())
    }
    Ty::Fn(_, _) => Err(UnifyError::NotEquality(ty.clone())),
    Ty::Con(args, name) => {
      if *name == Prim::Ref.ty_name() {
        return Ok(());
      }
      if !name.equality {
        return Err(UnifyError::NotEquality(ty.clone()));
      }
      for ty in args {
        make_equality(st, ty)?;
      }
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{apply, unify_no_emit};
  use crate::error::ErrorKind;
  use crate::st::St;
  use sml_ast::Lab;
  use sml_state::std_basis::Prim;
  use sml_state::{State, Ty, TyVarKind};
  use std::collections::BTreeMap;
  use std::rc::Rc;
  use str_util::Name;

  fn st() -> St {
    St::new(&Rc::new(State::default()), Default::default(), 100, &Rc::default())
  }

  fn lab(s: &str) -> Lab {
    Lab::Name(Name::new(s))
  }

  #[test]
  fn var_con() {
    let mut st = st();
    let a = st.fresh_ty(TyVarKind::Regular);
    let want = Ty::fun(a.clone(), Prim::Bool.ty());
    let got = Ty::fun(Prim::Int.ty(), Prim::Bool.ty());
    unify_no_emit(&mut st, &want, &got).expect("unifies");
    assert_eq!(apply(&st.bnd, &a), Prim::Int.ty());
  }

  #[test]
  fn circularity() {
    let mut st = st();
    let a = st.fresh_ty(TyVarKind::Regular);
    let list = Prim::List.apply(a.clone());
    let err = unify_no_emit(&mut st, &a, &list).expect_err("circular");
    assert!(matches!(err, ErrorKind::Circularity(_, _)));
  }

  #[test]
  fn flex_records() {
    let mut st = st();
    let r1 = st.fresh_var(TyVarKind::Regular, &[]);
    let r2 = st.fresh_var(TyVarKind::Regular, &[]);
    let want = Ty::Record(BTreeMap::from([(lab("a"), Prim::Int.ty())]), Some(r1));
    let got = Ty::Record(BTreeMap::from([(lab("b"), Prim::Bool.ty())]), Some(r2));
    unify_no_emit(&mut st, &want, &got).expect("unifies");
    let Ty::Record(rows, rest) = apply(&st.bnd, &want) else { panic!("not a record") };
    assert_eq!(rows.len(), 2);
    assert!(rest.is_some());
    let closed = Ty::Record(
      BTreeMap::from([(lab("a"), Prim::Int.ty()), (lab("b"), Prim::Bool.ty())]),
      None,
    );
    unify_no_emit(&mut st, &got, &closed).expect("closes");
    assert_eq!(apply(&st.bnd, &want), closed);
  }

  #[test]
  fn missing_row() {
    let mut st = st();
    let r = st.fresh_var(TyVarKind::Regular, &[]);
    let want = Ty::Record(BTreeMap::from([(lab("a"), Prim::Int.ty())]), Some(r));
    let got = Ty::Record(BTreeMap::from([(lab("b"), Prim::Int.ty())]), None);
    assert!(unify_no_emit(&mut st, &want, &got).is_err());
  }

  #[test]
  fn overloaded() {
    let mut st = st();
    let n = st.fresh_ty(TyVarKind::Num);
    assert!(unify_no_emit(&mut st, &n, &Prim::String.ty()).is_err());
    let o = st.fresh_ty(TyVarKind::Ord);
    unify_no_emit(&mut st, &n, &o).expect("num and ord");
    unify_no_emit(&mut st, &o, &Prim::Word.ty()).expect("word is num");
    assert_eq!(apply(&st.bnd, &n), Prim::Word.ty());
  }

  #[test]
  fn rigid() {
    let mut st = st();
    let written = Ty::var("'a");
    assert!(unify_no_emit(&mut st, &written, &Prim::Int.ty()).is_err());
    let flex = st.fresh_ty(TyVarKind::Regular);
    unify_no_emit(&mut st, &written, &flex).expect("flexible binds to rigid");
    assert_eq!(apply(&st.bnd, &flex), written);
  }

  #[test]
  fn equality() {
    let mut st = st();
    let eq = st.fresh_ty(TyVarKind::Equality);
    let err = unify_no_emit(&mut st, &eq, &Ty::fun(Prim::Int.ty(), Prim::Int.ty()));
    assert!(matches!(err, Err(ErrorKind::NotEquality(_))));
    let a = st.fresh_ty(TyVarKind::Regular);
    unify_no_emit(&mut st, &eq, &Prim::List.apply(a.clone())).expect("list of eq");
    let Ty::Var(tv) = apply(&st.bnd, &a) else { panic!("not a var") };
    assert!(tv.is_equality());
  }
}
