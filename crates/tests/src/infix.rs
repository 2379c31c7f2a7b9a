//! Resolving sequences of infix applications.

use crate::check::{check, last_val_exp};
use pretty_assertions::assert_eq;

#[test]
fn std_basis() {
  assert_eq!(last_val_exp("val it = 1 + 2 * 3").unwrap(), "+(1,*(2,3))");
  assert_eq!(last_val_exp("val it = 1 - 2 - 3").unwrap(), "-(-(1,2),3)");
  assert_eq!(last_val_exp("val it = 1 :: 2 :: nil").unwrap(), "::(1,::(2,nil))");
}

#[test]
fn application_binds_tighter() {
  assert_eq!(last_val_exp("val it = f x + g y").unwrap(), "+(f(x),g(y))");
}

#[test]
fn mixed_assoc_different_prec() {
  let s = "infix 1 f infixr 1 g infix h val it = a f b h c g d";
  assert_eq!(last_val_exp(s).unwrap(), "h(f(a,b),g(c,d))");
}

#[test]
fn same_prec_different_assoc() {
  let s = "infix a infixr b val it = 0 a 1 b 2";
  let e = last_val_exp(s).unwrap_err();
  assert_eq!(
    e.to_string(),
    "consecutive infix names with same fixity but different associativity"
  );
}

#[test]
fn without_op() {
  check(
    r"
val x = +
(**     + infix name used as non-infix without `op` *)
",
  );
}

#[test]
fn invalid_fixity() {
  check(
    r"
infix 10 ++
(**   + invalid fixity: `10` is not a single digit *)
",
  );
}
