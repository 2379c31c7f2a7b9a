//! Assorted core language checks.

use crate::check::{check, interpreter, run, run_err};
use analysis::ErrorKind;
use config::Options;
use pretty_assertions::assert_eq;

#[test]
fn undefined() {
  check(
    r"
val _ = nope
(**     ^ Undefined value `nope` *)
",
  );
}

#[test]
fn undefined_structure() {
  check(
    r"
val _ = S.x
(**+ Undefined module `S` *)
",
  );
}

#[test]
fn type_mismatch() {
  check(
    r#"
val x : int = "a"
(**+ Type mismatch: expected `int`, found `string` *)
"#,
  );
}

#[test]
fn if_branches() {
  check(
    r#"
val _ = if true then 1 else "a"
(**+ Type mismatch: expected `int`, found `string` *)
"#,
  );
}

#[test]
fn types() {
  let out = run(
    r#"
fun double (n : int) = n * 2
val p = (1, "a")
val c = #"x"
val xs = [1.5]
"#,
  );
  assert_eq!(out.ty("double").unwrap(), "int -> int");
  assert_eq!(out.ty("p").unwrap(), "int * string");
  assert_eq!(out.ty("c").unwrap(), "char");
  assert_eq!(out.ty("xs").unwrap(), "real list");
}

#[test]
fn overloading_defaults() {
  let out = run("val f = fn x => x + x val y = f 2");
  assert_eq!(out.ty("y").unwrap(), "int");
  assert_eq!(out.value("y").unwrap().to_string(), "4");
}

#[test]
fn polymorphism() {
  let out = run(
    r#"
fun id x = x
val a = id 3
val b = id "s"
"#,
  );
  assert_eq!(out.ty("a").unwrap(), "int");
  assert_eq!(out.ty("b").unwrap(), "string");
}

#[test]
fn value_restriction() {
  let out = run("val r = ref []");
  let messages: Vec<_> = out.warnings.iter().map(ToString::to_string).collect();
  assert_eq!(messages, ["type of `r` is not generalized: its expression is expansive"]);
  assert!(run("val f = fn x => x").warnings.is_empty());
}

#[test]
fn inferred_vars_in_errors() {
  let e = run_err(Options::default(), &["val _ = (fn x => x + x) \"s\""]);
  assert_eq!(e.to_string(), "Type mismatch: expected `int`, found `string`");
  let e = run_err(Options::default(), &["val _ = (fn x => x) 1 2"]);
  assert_eq!(e.to_string(), "Type mismatch: expected `int -> 'a`, found `int`");
}

#[test]
fn ungeneralized_across_inputs() {
  let e = run_err(
    Options::default(),
    &["val r = ref []", "fun g x = (r := [x]; x)", "val a = g 1", "val b = g \"s\""],
  );
  assert_eq!(e.kind(), ErrorKind::Elaboration, "{e}");
}

#[test]
fn equality() {
  let e = run_err(Options::default(), &["val _ = (fn (x : int) => x) = (fn y => y)"]);
  assert_eq!(e.kind(), ErrorKind::Elaboration);
  assert_eq!(e.to_string(), "`int -> int` does not admit equality");
}

#[test]
fn equality_datatype() {
  let out = run(
    r"
datatype t = A | B of int
val x = B 1 = B 1
val y = A = B 2
",
  );
  assert_eq!(out.value("x").unwrap().to_string(), "true");
  assert_eq!(out.value("y").unwrap().to_string(), "false");
}

#[test]
fn exceptions() {
  let out = run(
    r#"
exception Bad of string
exception Also = Bad
fun check n = if n < 0 then raise Also "negative" else n
val x = check 3
val y = check ~1 handle Bad s => size s
"#,
  );
  assert_eq!(out.value("x").unwrap().to_string(), "3");
  assert_eq!(out.value("y").unwrap().to_string(), "8");
  assert_eq!(out.ty("Bad").unwrap(), "string -> exn");
}

#[test]
fn selectors() {
  let out = run(
    r"
val p = {name = 1, age = 2}
val n = #name p
val t = #2 (1, 3)
",
  );
  assert_eq!(out.value("n").unwrap().to_string(), "1");
  assert_eq!(out.value("t").unwrap().to_string(), "3");
}

#[test]
fn datatype_replication() {
  let out = run(
    r"
datatype a = X | Y
datatype b = datatype a
val v = case X of X => 1 | Y => 2
",
  );
  assert_eq!(out.value("v").unwrap().to_string(), "1");
}

#[test]
fn mutual_recursion() {
  let out = run(
    r"
fun even 0 = true
  | even n = odd (n - 1)
and odd 0 = false
  | odd n = even (n - 1)
val x = (even 10, odd 7)
",
  );
  assert_eq!(out.value("x").unwrap().to_string(), "(true, true)");
}

#[test]
fn shadowing_across_inputs() {
  let mut interpreter = interpreter(Options::default());
  interpreter.run("val x = 1").unwrap();
  interpreter.run("val x = \"s\"").unwrap();
  let out = interpreter.run("val y = x ^ \"t\"").unwrap();
  assert_eq!(out.value("y").unwrap().to_string(), "\"st\"");
}

#[test]
fn error_keeps_state() {
  let mut interpreter = interpreter(Options::default());
  interpreter.run("val x = 1").unwrap();
  let e = interpreter.run("val y = x + \"a\"").unwrap_err();
  assert_eq!(e.kind(), ErrorKind::Elaboration);
  let out = interpreter.run("val z = x + 1").unwrap();
  assert_eq!(out.value("z").unwrap().to_string(), "2");
  assert!(interpreter.run("val w = y").is_err());
}

#[test]
fn lex_error() {
  let e = run_err(Options::default(), &["val x = #\"ab\""]);
  assert_eq!(e.kind(), ErrorKind::Lex);
  assert_eq!(e.to_string(), "character literal must have length 1");
  let e = run_err(Options::default(), &["val x = \"abc"]);
  assert!(e.is_incomplete());
}
