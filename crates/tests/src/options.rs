//! Options and config files.

use crate::check::{run_err, run_many};
use analysis::{ErrorKind, Interpreter, options_from_config};
use config::Options;
use pretty_assertions::assert_eq;

#[test]
fn from_config() {
  let mut interpreter = Interpreter::from_config(
    r"
version = 1
[language]
allow-successor-ml = true
",
  )
  .unwrap();
  assert!(interpreter.options().allow_successor_ml);
  assert!(!interpreter.options().allow_vector);
  let out = interpreter.run("fun f (0 | 1) = true | f _ = false val x = f 1").unwrap();
  assert_eq!(out.value("x").unwrap().to_string(), "true");
}

#[test]
fn empty_language() {
  let options = options_from_config("version = 1").unwrap();
  assert_eq!(options, Options::default());
}

#[test]
fn bad_version() {
  let e = options_from_config("version = 2").unwrap_err();
  assert_eq!(e.kind(), ErrorKind::Config);
  assert_eq!(e.to_string(), "invalid config version: 2");
  assert!(e.pos().is_none());
}

#[test]
fn bad_toml() {
  let e = Interpreter::from_config("version = ").unwrap_err();
  assert_eq!(e.kind(), ErrorKind::Config);
  assert!(e.to_string().starts_with("couldn't parse config: "));
}

#[test]
fn structure_in_let() {
  let s = "val x = let structure S = struct val y = 2 end in S.y end";
  let e = run_err(Options::default(), &[s]);
  assert_eq!(e.kind(), ErrorKind::FeatureDisabled);
  let want = "structure declarations below top level requires `allow-structures-anywhere`";
  assert_eq!(e.to_string(), want);
  let options = Options { allow_structures_anywhere: true, ..Options::default() };
  let out = run_many(options, &[s]);
  assert_eq!(out.value("x").unwrap().to_string(), "2");
}

#[test]
fn signature_in_structure() {
  let s = "structure S = struct signature T = sig end end";
  let e = run_err(Options::default(), &[s]);
  assert_eq!(e.kind(), ErrorKind::FeatureDisabled);
  let options = Options { allow_signatures_anywhere: true, ..Options::default() };
  run_many(options, &[s]);
}

#[test]
fn rebind_eq() {
  for s in ["val = = 1", "val rec = = fn x => x", "fun (a = b) = 3", "fun op = (a, b) = 3"] {
    let e = run_err(Options::default(), &[s]);
    assert_eq!(e.kind(), ErrorKind::FeatureDisabled, "{s}");
    assert_eq!(e.to_string(), "rebinding `=` is not allowed", "{s}");
    let e = run_err(Options::successor_ml(), &[s]);
    assert_eq!(e.kind(), ErrorKind::Parse, "{s}");
    assert_eq!(e.to_string(), "`=` may not be rebound", "{s}");
  }
}

#[test]
fn infix_clause_still_parses() {
  let out = run_many(Options::successor_ml(), &["infix ++ fun (a ++ b) = a + b val x = 1 ++ 2"]);
  assert_eq!(out.value("x").unwrap().to_string(), "3");
}
