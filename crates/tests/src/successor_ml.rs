//! Successor ML features, which are off by default.

use crate::check::{check, run_err, run_many};
use analysis::ErrorKind;
use config::Options;
use pretty_assertions::assert_eq;

#[track_caller]
fn val(s: &str, name: &str) -> String {
  let out = run_many(Options::successor_ml(), &[s]);
  out.value(name).expect("no such value").to_string()
}

#[test]
fn or_pat() {
  let s = r"
fun small (0 | 1 | 2) = true
  | small _ = false
val x = (small 1, small 5)
";
  assert_eq!(val(s, "x"), "(true, false)");
}

#[test]
fn or_pat_binds() {
  let s = r"
datatype t = A of int | B of int | C
fun get (A n | B n) = n
  | get C = 0
val x = get (B 4) + get C
";
  assert_eq!(val(s, "x"), "4");
}

#[test]
fn or_pat_disabled() {
  let e = run_err(Options::default(), &["fun f (0 | 1) = true | f _ = false"]);
  assert_eq!(e.kind(), ErrorKind::FeatureDisabled);
  assert_eq!(e.to_string(), "or-patterns requires `allow-successor-ml`");
}

#[test]
fn or_pat_disabled_pos() {
  check(
    r"
val f = fn (0 | 1) => true | _ => false
(**+ or-patterns requires `allow-successor-ml` *)
",
  );
}

#[test]
fn guard() {
  let s = r"
fun sign n =
  case n of
    (x with true = x > 0) => 1
  | (x with true = x < 0) => ~1
  | _ => 0
val x = [sign 5, sign ~3, sign 0]
";
  assert_eq!(val(s, "x"), "[1, ~1, 0]");
}

#[test]
fn conj() {
  let s = "val (a, _) as (_, b) = (1, 2) val x = a + b";
  assert_eq!(val(s, "x"), "3");
}

#[test]
fn vector() {
  let s = r"
val v = #[1, 2, 3]
val x = case v of #[a, _, c] => a + c | _ => 0
";
  assert_eq!(val(s, "v"), "#[1, 2, 3]");
  assert_eq!(val(s, "x"), "4");
}

#[test]
fn vector_disabled() {
  let e = run_err(Options::default(), &["val v = #[1]"]);
  assert_eq!(e.to_string(), "vectors requires `allow-vector`");
}

#[test]
fn do_dec() {
  let s = "val r = ref 0 do r := 5 val x = !r";
  assert_eq!(val(s, "x"), "5");
}

#[test]
fn optional_else() {
  let s = "val r = ref 0 val _ = if true then r := 3 val x = !r";
  assert_eq!(val(s, "x"), "3");
  let e = run_err(Options::default(), &["val _ = if true then ()"]);
  assert!(e.is_incomplete());
}

#[test]
fn leading_bar() {
  let s = "val f = fn | 0 => 1 | _ => 2 val x = f 0";
  assert_eq!(val(s, "x"), "1");
}
