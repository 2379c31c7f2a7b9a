//! `fun` declarations.

use crate::check::{check, run};
use pretty_assertions::assert_eq;

#[test]
fn clauses() {
  let out = run("fun fact 0 = 1 | fact n = n * fact (n - 1) val x = fact 5");
  assert_eq!(out.value("x").unwrap().to_string(), "120");
  assert_eq!(out.ty("fact").unwrap(), "int -> int");
}

#[test]
fn curried() {
  let out = run("fun add a b = a + b val x = add 1 2");
  assert_eq!(out.value("x").unwrap().to_string(), "3");
  assert_eq!(out.ty("add").unwrap(), "int -> int -> int");
}

#[test]
fn infix_clause() {
  let out = run("infix 5 -- fun a -- b = a - b val x = 5 -- 3");
  assert_eq!(out.value("x").unwrap().to_string(), "2");
}

#[test]
fn mutual() {
  let out = run(
    r"
fun even 0 = true
  | even n = odd (n - 1)
and odd 0 = false
  | odd n = even (n - 1)
val a = even 10
val b = odd 7
",
  );
  assert_eq!(out.value("a").unwrap().to_string(), "true");
  assert_eq!(out.value("b").unwrap().to_string(), "true");
}

#[test]
fn name_mismatch() {
  check(
    r"
fun f 0 = 1
  | g n = n
(**+ Function clauses must all name the same function *)
",
  );
}

#[test]
fn arity_mismatch() {
  check(
    r"
fun f 0 = 1
  | f a b = 2
(**+ Different number of arguments *)
",
  );
}

#[test]
fn ret_ty() {
  check(
    r#"
fun f (x : int) : string = x
(**+ Type mismatch: expected `string`, found `int` *)
"#,
  );
}
