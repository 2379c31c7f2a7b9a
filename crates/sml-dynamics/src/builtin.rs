//! Primitive functions.

use crate::error::{Error, ErrorKind};
use crate::mem::Mem;
use crate::types::Escape;
use sml_ast::{Pos, SCon};
use sml_state::std_basis::PrimExn;
use sml_state::{Builtin, Con, Val};
use std::cmp::Ordering;

pub(crate) fn apply(mem: &mut Mem, pos: Pos, builtin: Builtin, arg: Val) -> Result<Val, Escape> {
  let ret = match builtin {
    Builtin::Add | Builtin::Sub | Builtin::Mul | Builtin::Div | Builtin::Mod | Builtin::RealDiv => {
      let (a, b) = scon_pair(pos, &arg)?;
      Val::SCon(arith(pos, builtin, a, b)?)
    }
    Builtin::Neg | Builtin::Abs => {
      let scon = match (builtin, scon(pos, &arg)?) {
        (Builtin::Neg, SCon::Int(n)) => SCon::Int(n.checked_neg().ok_or_else(overflow)?),
        (Builtin::Abs, SCon::Int(n)) => SCon::Int(n.checked_abs().ok_or_else(overflow)?),
        (Builtin::Neg, SCon::Real(r)) => SCon::Real(-r),
        (Builtin::Abs, SCon::Real(r)) => SCon::Real(r.abs()),
        (Builtin::Neg, SCon::Word(w)) => SCon::Word(w.wrapping_neg()),
        (Builtin::Abs, SCon::Word(w)) => SCon::Word(*w),
        _ => return Err(internal(pos, "negation of a non-number")),
      };
      Val::SCon(scon)
    }
    Builtin::Lt | Builtin::Le | Builtin::Gt | Builtin::Ge => {
      let (a, b) = scon_pair(pos, &arg)?;
      let ord = compare(pos, a, b)?;
      let b = match builtin {
        Builtin::Lt => ord == Some(Ordering::Less),
        Builtin::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        Builtin::Gt => ord == Some(Ordering::Greater),
        _ => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
      };
      Val::bool(b)
    }
    Builtin::Eq | Builtin::Neq => {
      let (a, b) = pair(pos, &arg)?;
      let eq = equal(mem, a, b);
      Val::bool(if builtin == Builtin::Eq { eq } else { !eq })
    }
    Builtin::Concat => match scon_pair(pos, &arg)? {
      (SCon::String(a), SCon::String(b)) => Val::SCon(SCon::String(format!("{a}{b}").into())),
      _ => return Err(internal(pos, "concatenation of non-strings")),
    },
    Builtin::Ref => Val::Ref(mem.alloc(arg)),
    Builtin::Deref => {
      let Val::Ref(addr) = arg else { return Err(internal(pos, "dereference of a non-ref")) };
      mem.get(addr).cloned().ok_or_else(|| internal(pos, "no such cell"))?
    }
    Builtin::Assign => {
      let (Val::Ref(addr), val) = pair(pos, &arg)? else {
        return Err(internal(pos, "assignment to a non-ref"));
      };
      if !mem.set(*addr, val.clone()) {
        return Err(internal(pos, "no such cell"));
      }
      Val::unit()
    }
    Builtin::Not => {
      let b = arg.as_bool().ok_or_else(|| internal(pos, "not of a non-bool"))?;
      Val::bool(!b)
    }
    Builtin::Size => {
      let SCon::String(s) = scon(pos, &arg)? else {
        return Err(internal(pos, "size of a non-string"));
      };
      let n = i64::try_from(s.len()).map_err(|_| raise(PrimExn::Size))?;
      Val::SCon(SCon::Int(n))
    }
    Builtin::Chr => {
      let SCon::Int(n) = scon(pos, &arg)? else { return Err(internal(pos, "chr of a non-int")) };
      let c = u8::try_from(*n).map(char::from).map_err(|_| raise(PrimExn::Chr))?;
      Val::SCon(SCon::Char(c))
    }
    Builtin::Ord => {
      let SCon::Char(c) = scon(pos, &arg)? else { return Err(internal(pos, "ord of a non-char")) };
      Val::SCon(SCon::Int(i64::from(u32::from(*c))))
    }
    Builtin::Real => {
      let SCon::Int(n) = scon(pos, &arg)? else { return Err(internal(pos, "real of a non-int")) };
      #[allow(clippy::cast_precision_loss)]
      let r = *n as f64;
      Val::SCon(SCon::Real(r))
    }
    Builtin::Floor => {
      let SCon::Real(r) = scon(pos, &arg)? else {
        return Err(internal(pos, "floor of a non-real"));
      };
      Val::SCon(SCon::Int(floor(*r)?))
    }
  };
  Ok(ret)
}

/// Structural equality. Cells are equal when they are the same cell.
pub(crate) fn equal(mem: &Mem, a: &Val, b: &Val) -> bool {
  match (a, b) {
    (Val::SCon(a), Val::SCon(b)) => a == b,
    (Val::Con(a), Val::Con(b)) => {
      a.same_con(b)
        && match (&a.arg, &b.arg) {
          (None, None) => true,
          (Some(a), Some(b)) => equal(mem, a, b),
          (None, Some(_)) | (Some(_), None) => false,
        }
    }
    (Val::Record(a), Val::Record(b)) => {
      a.len() == b.len()
        && a.iter().zip(b.iter()).all(|((la, a), (lb, b))| la == lb && equal(mem, a, b))
    }
    (Val::Vector(a), Val::Vector(b)) => {
      a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| equal(mem, a, b))
    }
    (Val::Ref(a), Val::Ref(b)) => a == b,
    _ => false,
  }
}

pub(crate) fn raise(exn: PrimExn) -> Escape {
  Escape::Raise(exn.val())
}

fn overflow() -> Escape {
  raise(PrimExn::Overflow)
}

fn internal(pos: Pos, msg: &'static str) -> Escape {
  Escape::Error(Error::new(pos, ErrorKind::Internal(msg)))
}

fn pair(pos: Pos, arg: &Val) -> Result<(&Val, &Val), Escape> {
  arg.as_pair().ok_or_else(|| internal(pos, "primitive needs a pair"))
}

fn scon(pos: Pos, arg: &Val) -> Result<&SCon, Escape> {
  match arg {
    Val::SCon(s) => Ok(s),
    _ => Err(internal(pos, "primitive needs a constant")),
  }
}

fn scon_pair(pos: Pos, arg: &Val) -> Result<(&SCon, &SCon), Escape> {
  let (a, b) = pair(pos, arg)?;
  Ok((scon(pos, a)?, scon(pos, b)?))
}

fn arith(pos: Pos, builtin: Builtin, a: &SCon, b: &SCon) -> Result<SCon, Escape> {
  let ret = match (a, b) {
    (SCon::Int(a), SCon::Int(b)) => SCon::Int(int(builtin, *a, *b)?),
    (SCon::Word(a), SCon::Word(b)) => SCon::Word(word(builtin, *a, *b)?),
    (SCon::Real(a), SCon::Real(b)) => SCon::Real(match builtin {
      Builtin::Add => a + b,
      Builtin::Sub => a - b,
      Builtin::Mul => a * b,
      Builtin::RealDiv => a / b,
      _ => return Err(internal(pos, "integer operation on reals")),
    }),
    _ => return Err(internal(pos, "arithmetic on mismatched constants")),
  };
  Ok(ret)
}

/// `div` rounds toward negative infinity, and `mod` has the sign of the divisor.
fn int(builtin: Builtin, a: i64, b: i64) -> Result<i64, Escape> {
  let ret = match builtin {
    Builtin::Add => a.checked_add(b),
    Builtin::Sub => a.checked_sub(b),
    Builtin::Mul => a.checked_mul(b),
    Builtin::Div | Builtin::Mod if b == 0 => return Err(raise(PrimExn::Div)),
    Builtin::Div => {
      let q = a.checked_div(b).ok_or_else(overflow)?;
      let rounds_up = a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0));
      Some(if rounds_up { q - 1 } else { q })
    }
    Builtin::Mod => {
      let r = a.wrapping_rem(b);
      Some(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
    }
    _ => unreachable!("not an int operation: {builtin:?}"),
  };
  ret.ok_or_else(overflow)
}

fn word(builtin: Builtin, a: u64, b: u64) -> Result<u64, Escape> {
  let ret = match builtin {
    Builtin::Add => a.wrapping_add(b),
    Builtin::Sub => a.wrapping_sub(b),
    Builtin::Mul => a.wrapping_mul(b),
    Builtin::Div => a.checked_div(b).ok_or_else(|| raise(PrimExn::Div))?,
    Builtin::Mod => a.checked_rem(b).ok_or_else(|| raise(PrimExn::Div))?,
    _ => unreachable!("not a word operation: {builtin:?}"),
  };
  Ok(ret)
}

/// `None` when either is NaN.
fn compare(pos: Pos, a: &SCon, b: &SCon) -> Result<Option<Ordering>, Escape> {
  let ret = match (a, b) {
    (SCon::Int(a), SCon::Int(b)) => Some(a.cmp(b)),
    (SCon::Word(a), SCon::Word(b)) => Some(a.cmp(b)),
    (SCon::Real(a), SCon::Real(b)) => a.partial_cmp(b),
    (SCon::Char(a), SCon::Char(b)) => Some(a.cmp(b)),
    (SCon::String(a), SCon::String(b)) => Some(a.as_str().cmp(b.as_str())),
    _ => return Err(internal(pos, "comparison of mismatched constants")),
  };
  Ok(ret)
}

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn floor(r: f64) -> Result<i64, Escape> {
  if r.is_nan() {
    return Err(raise(PrimExn::Domain));
  }
  let r = r.floor();
  if !(-I64_BOUND..I64_BOUND).contains(&r) {
    return Err(overflow());
  }
  #[allow(clippy::cast_possible_truncation)]
  let ret = r as i64;
  Ok(ret)
}

#[cfg(test)]
mod tests {
  use super::{apply, equal};
  use crate::mem::Mem;
  use crate::types::Escape;
  use sml_ast::SCon;
  use sml_state::{Builtin, Val};

  fn int(n: i64) -> Val {
    Val::SCon(SCon::Int(n))
  }

  fn run(builtin: Builtin, a: i64, b: i64) -> String {
    match apply(&mut Mem::default(), 0, builtin, Val::tuple([int(a), int(b)])) {
      Ok(v) => v.to_string(),
      Err(Escape::Raise(v)) => format!("raise {v}"),
      Err(Escape::Error(e)) => format!("error {e}"),
    }
  }

  #[test]
  fn div_mod() {
    assert_eq!(run(Builtin::Div, 7, 2), "3");
    assert_eq!(run(Builtin::Div, -7, 2), "~4");
    assert_eq!(run(Builtin::Mod, -7, 2), "1");
    assert_eq!(run(Builtin::Mod, 7, -2), "~1");
    assert_eq!(run(Builtin::Div, 1, 0), "raise Div");
  }

  #[test]
  fn overflow() {
    assert_eq!(run(Builtin::Add, i64::MAX, 1), "raise Overflow");
    assert_eq!(run(Builtin::Div, i64::MIN, -1), "raise Overflow");
  }

  #[test]
  fn cells() {
    let mut mem = Mem::default();
    let Ok(r) = apply(&mut mem, 0, Builtin::Ref, int(1)) else { panic!("ref failed") };
    let r2 = apply(&mut mem, 0, Builtin::Ref, int(1)).ok();
    assert!(apply(&mut mem, 0, Builtin::Assign, Val::tuple([r.clone(), int(2)])).is_ok());
    let Ok(got) = apply(&mut mem, 0, Builtin::Deref, r.clone()) else { panic!("deref failed") };
    assert_eq!(got.to_string(), "2");
    assert!(equal(&mem, &r, &r));
    assert!(!equal(&mem, &r, &r2.expect("ref failed")));
    assert_eq!(mem.take_log().len(), 3);
  }
}
