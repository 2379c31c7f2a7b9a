//! Signatures and specifications.

use crate::check::{check, run, run_err};
use analysis::ErrorKind;
use config::Options;
use pretty_assertions::assert_eq;

#[test]
fn datatype_spec() {
  let out = run(
    r"
signature S = sig
  datatype t = A | B
  val f : t -> int
end
structure X : S = struct
  datatype t = A | B
  fun f A = 0
    | f B = 1
end
val y = X.f X.B
",
  );
  assert_eq!(out.value("y").unwrap().to_string(), "1");
}

#[test]
fn datatype_mismatch() {
  check(
    r"
signature S = sig datatype t = A | B end
structure X : S = struct datatype t = A | C end
(**+ Datatype mismatch for type `t`: the constructors differ *)
",
  );
}

#[test]
fn include() {
  let out = run(
    r"
signature A = sig val x : int end
signature B = sig include A val y : int end
structure X : B = struct val x = 1 val y = 2 val z = 3 end
val s = X.x + X.y
",
  );
  assert_eq!(out.value("s").unwrap().to_string(), "3");
}

#[test]
fn include_later_wins() {
  let out = run(
    r#"
signature S = sig
  include sig val x : int end
  val x : string
end
structure X : S = struct val x = "s" end
val y = X.x ^ "t"
"#,
  );
  assert_eq!(out.value("y").unwrap().to_string(), "\"st\"");
}

#[test]
fn include_earlier_loses() {
  check(
    r"
signature S = sig
  include sig val x : int end
  val x : string
end
structure X : S = struct val x = 1 end
(**+ Type mismatch for value `x`: signature has `string`, structure has `int` *)
",
  );
}

#[test]
fn where_type() {
  let out = run(
    r"
signature S = sig type t val x : t end
structure X :> S where type t = int = struct type t = int val x = 3 end
val y = X.x + 1
",
  );
  assert_eq!(out.value("y").unwrap().to_string(), "4");
}

#[test]
fn where_not_flexible() {
  let e = run_err(
    Options::default(),
    &["signature S = sig type t = int end where type t = string"],
  );
  assert_eq!(e.kind(), ErrorKind::Elaboration, "{e}");
}

#[test]
fn nested_structure() {
  let out = run(
    r"
signature S = sig structure In : sig val x : int end end
structure X : S = struct structure In = struct val x = 5 val y = 6 end end
val a = X.In.x
",
  );
  assert_eq!(out.value("a").unwrap().to_string(), "5");
}

#[test]
fn undefined() {
  check(
    r"
structure X : NOPE = struct end
(**+ Undefined signature `NOPE` *)
",
  );
}

#[test]
fn eqtype() {
  let e = run_err(
    Options::default(),
    &["structure X : sig eqtype t end = struct type t = int -> int end"],
  );
  assert_eq!(e.kind(), ErrorKind::Elaboration, "{e}");
}

#[test]
fn sharing_parses() {
  let lex = sml_lex::get("signature S = sig type t type u sharing type t = u end");
  let state = sml_state::std_basis::get();
  let parse = sml_parse::get(&lex.tokens, &state, &Options::default());
  assert!(parse.is_ok());
}

#[test]
fn sharing_is_internal() {
  let e = run_err(Options::default(), &["signature S = sig type t type u sharing type t = u end"]);
  assert_eq!(e.kind(), ErrorKind::Internal, "{e}");
  assert_eq!(e.to_string(), "sharing is not implemented");
}
