//! Fixity declarations and their scope.

use crate::check::{check, last_val_exp, run, run_many};
use config::Options;
use pretty_assertions::assert_eq;

#[test]
fn left() {
  let s = "infix 5 f infix 4 g val it = a g b f c g d";
  assert_eq!(last_val_exp(s).unwrap(), "g(g(a,f(b,c)),d)");
}

#[test]
fn right() {
  let s = "infixr 5 f infixr 4 g val it = a g b f c g d";
  assert_eq!(last_val_exp(s).unwrap(), "g(a,g(f(b,c),d))");
}

#[test]
fn default_precedence() {
  let s = "infix f val it = a f b f c";
  assert_eq!(last_val_exp(s).unwrap(), "f(f(a,b),c)");
}

#[test]
fn local_does_not_leak() {
  let out = run(
    r"
local
  infix 5 ++
in
  fun a ++ b = a + b
end
val y = ++ (1, 2)
",
  );
  assert_eq!(out.value("y").unwrap().to_string(), "3");
}

#[test]
fn let_does_not_leak() {
  check(
    r"
val x = let infix 5 ++ fun a ++ b = a in 1 ++ 2 end
val y = ++
(**     + Undefined value `++` *)
",
  );
}

#[test]
fn across_inputs() {
  let out = run_many(Options::default(), &["infix 5 ++ fun a ++ b = a * b", "val x = 2 ++ 3"]);
  assert_eq!(out.value("x").unwrap().to_string(), "6");
}

#[test]
fn nonfix() {
  let out = run("nonfix + val x = + (1, 2)");
  assert_eq!(out.value("x").unwrap().to_string(), "3");
}

#[test]
fn op() {
  let out = run("val x = op + (1, 2) val f = op :: val xs = f (1, nil)");
  assert_eq!(out.value("x").unwrap().to_string(), "3");
  assert_eq!(out.value("xs").unwrap().to_string(), "[1]");
}
