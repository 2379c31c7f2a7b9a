//! Functors.
//!
//! Functor application is evaluated but not elaborated, so a structure bound by one, and any
//! value using it, has no static information. Those bindings are skipped with a warning, and
//! the rest of the input is still elaborated.

use crate::check::{interpreter, run, run_err, run_many};
use analysis::{ErrorKind, FUNCTOR_SKIPPED};
use config::Options;
use pretty_assertions::assert_eq;

const SIG: &str = "signature S = sig val x : int end";

#[test]
fn apply() {
  let out = run(&format!(
    "{SIG} functor F (A : S) = struct val y = A.x + 1 end
structure B = F (struct val x = 1 val z = 2 end)
val b = B.y"
  ));
  assert_eq!(out.value("b").unwrap().to_string(), "2");
  let warnings: Vec<_> = out.warnings.iter().map(|w| w.message.as_str()).collect();
  assert_eq!(warnings, [FUNCTOR_SKIPPED]);
  assert!(out.statics.val_env.is_empty());
}

#[test]
fn body_sees_only_param_sig() {
  let e = run_err(
    Options::default(),
    &[format!("{SIG} functor G (A : S) = struct val w = A.z end").as_str()],
  );
  assert_eq!(e.kind(), ErrorKind::Elaboration, "{e}");
  assert_eq!(e.to_string(), "Undefined value `A.z`");
}

#[test]
fn body_type_error() {
  let e = run_err(
    Options::default(),
    &[r#"functor F (A : sig end) = struct val x = 1 + "a" end"#],
  );
  assert_eq!(e.kind(), ErrorKind::Elaboration, "{e}");
}

#[test]
fn undefined() {
  let e = run_err(Options::default(), &["structure X = Nope (struct end)"]);
  assert_eq!(e.kind(), ErrorKind::Evaluation, "{e}");
  assert_eq!(e.to_string(), "Undefined functor `Nope`");
}

#[test]
fn later_inputs() {
  let out = run_many(
    Options::default(),
    &[
      format!("{SIG} functor F (A : S) = struct val y = A.x * 10 end").as_str(),
      "structure B = F (struct val x = 4 end)",
      "val c = B.y + 1",
    ],
  );
  assert_eq!(out.value("c").unwrap().to_string(), "41");
  assert!(out.warnings.is_empty());
}

#[test]
fn spec_param() {
  let out = run(
    r"
functor F (val x : int) = struct val y = x * 2 end
structure B = F (struct val x = 4 end)
val b = B.y
",
  );
  assert_eq!(out.value("b").unwrap().to_string(), "8");
}

#[test]
fn missing_member() {
  let out = run(&format!(
    "{SIG} functor H (A : S) = struct val k = 0 end
structure E = H (struct end)"
  ));
  let warnings: Vec<_> = out.warnings.iter().map(|w| w.message.as_str()).collect();
  assert_eq!(warnings, [FUNCTOR_SKIPPED, "argument of functor `H` is missing `x`"]);
}

#[test]
fn each_application_is_fresh() {
  let out = run(
    r"
functor Cell (val init : int) = struct val r = ref init end
structure A = Cell (struct val init = 1 end)
structure B = Cell (struct val init = 2 end)
val _ = A.r := 10
val a = !(A.r)
val b = !(B.r)
",
  );
  assert_eq!(out.value("a").unwrap().to_string(), "10");
  assert_eq!(out.value("b").unwrap().to_string(), "2");
}

const SKIP: &str = "functor F (P : sig end) = struct val y = 5 end structure B = F (struct end)";

#[test]
fn rest_of_input_elaborated() {
  let e = run_err(
    Options::default(),
    &["val x = 1", &format!("{SKIP} val x = \"s\""), "val y = x + 1"],
  );
  assert_eq!(e.kind(), ErrorKind::Elaboration, "{e}");
}

#[test]
fn rest_of_input_has_types() {
  let out = run(&format!("{SKIP} val s = \"s\" val d = B.y"));
  assert_eq!(out.ty("s").unwrap(), "string");
  assert!(out.ty("d").is_none());
  assert_eq!(out.value("d").unwrap().to_string(), "5");
  assert_eq!(out.to_string(), "val d = 5\nval s = \"s\" : string");
}

#[test]
fn skipped_structure_later() {
  let mut interpreter = interpreter(Options::default());
  interpreter.run("structure B = struct val y = \"old\" end").unwrap();
  let out = interpreter.run(SKIP).unwrap();
  let warnings: Vec<_> = out.warnings.iter().map(|w| w.message.as_str()).collect();
  assert_eq!(warnings, [FUNCTOR_SKIPPED]);
  let out = interpreter.run("val d = B.y").unwrap();
  assert!(out.ty("d").is_none());
  assert_eq!(out.value("d").unwrap().to_string(), "5");
  assert!(out.warnings.is_empty());
  let out = interpreter.run("val e = d + 1").unwrap();
  assert_eq!(out.value("e").unwrap().to_string(), "6");
  let out = interpreter.run("open B val c = y").unwrap();
  assert_eq!(out.value("c").unwrap().to_string(), "5");
}

#[test]
fn skipped_structure_same_input() {
  let out = run(&format!("structure B = struct val y = \"old\" end {SKIP} val d = B.y"));
  assert!(out.ty("d").is_none());
  assert_eq!(out.value("d").unwrap().to_string(), "5");
}
