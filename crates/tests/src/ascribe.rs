//! Signature ascription.

use crate::check::{check, run, run_err};
use analysis::ErrorKind;
use config::Options;
use pretty_assertions::assert_eq;

#[test]
fn transparent_hides_extras() {
  check(
    r"
structure S : sig val x : int end = struct val x = 1 val y = 2 end
val z = S.y
(**     ^^^ Undefined value `S.y` *)
",
  );
}

#[test]
fn transparent_keeps_type_identity() {
  let out = run(
    r"
structure S : sig type t val x : t end = struct type t = int val x = 1 end
val y = S.x + 1
",
  );
  assert_eq!(out.value("y").unwrap().to_string(), "2");
}

#[test]
fn opaque_hides_type_identity() {
  let e = run_err(
    Options::default(),
    &[r"
structure S :> sig type t val x : t end = struct type t = int val x = 1 end
val y = S.x + 1
"],
  );
  assert_eq!(e.kind(), ErrorKind::Elaboration, "{e}");
  assert!(e.to_string().starts_with("Type mismatch"), "{e}");
}

#[test]
fn opaque_abstract_use() {
  let out = run(
    r"
structure Counter :> sig
  type t
  val zero : t
  val inc : t -> t
  val get : t -> int
end = struct
  type t = int
  val zero = 0
  fun inc n = n + 1
  fun get n = n
end
val n = Counter.get (Counter.inc (Counter.inc Counter.zero))
",
  );
  assert_eq!(out.value("n").unwrap().to_string(), "2");
}

#[test]
fn unimplemented_value() {
  check(
    r"
structure S : sig val b : int end = struct end
(**+ Unimplemented value `b` *)
",
  );
}

#[test]
fn unimplemented_type() {
  check(
    r"
structure S : sig type t end = struct end
(**+ Unimplemented type `t` *)
",
  );
}

#[test]
fn value_too_general_in_sig() {
  check(
    r"
structure S : sig val id : 'a -> 'a end = struct fun id x = x + 0 end
(**+ Type mismatch for value `id`: signature has `'a -> 'a`, structure has `int -> int` *)
",
  );
}

#[test]
fn more_general_in_struct() {
  let out = run(
    r"
structure S : sig val id : int -> int end = struct fun id x = x end
val y = S.id 3
",
  );
  assert_eq!(out.value("y").unwrap().to_string(), "3");
}

#[test]
fn id_status() {
  check(
    r"
structure S : sig exception E end = struct val E = 3 end
(**+ Identifier status mismatch for `E` *)
",
  );
}
