//! Input that ends early, so a caller could ask for more.

use crate::check::{check, interpreter};
use analysis::ErrorKind;
use config::Options;

#[track_caller]
fn incomplete(s: &str) {
  let e = interpreter(Options::default()).run(s).expect_err(s);
  assert_eq!(e.kind(), ErrorKind::Incomplete, "{s}: {e}");
  assert!(e.is_incomplete());
}

#[test]
fn decs() {
  for s in ["val x =", "fun f x =", "datatype t =", "local val x = 1 in"] {
    incomplete(s);
  }
}

#[test]
fn exps() {
  let exps =
    ["val x = let val y = 1 in y", "val x = (1, 2", "val x = if true then 1", "val x = [1,"];
  for s in exps {
    incomplete(s);
  }
}

#[test]
fn modules() {
  for s in ["structure S = struct", "signature S = sig val x : int", "functor F (A : sig end) ="] {
    incomplete(s);
  }
}

#[test]
fn lex() {
  incomplete("(* no end");
  incomplete("val s = \"no end");
}

#[test]
fn more_input_completes() {
  let mut interpreter = interpreter(Options::default());
  let mut buf = String::new();
  for line in ["val x =", "  1 + 2"] {
    buf.push_str(line);
    buf.push('\n');
    match interpreter.run(&buf) {
      Ok(out) => {
        assert_eq!(out.value("x").unwrap().to_string(), "3");
        return;
      }
      Err(e) => assert!(e.is_incomplete(), "{e}"),
    }
  }
  panic!("never completed");
}

#[test]
fn num_lit() {
  check(
    r"
val _ = 0x
(**     + missing digits in number literal *)
",
  );
}
