//! Dynamic semantics: evaluating declarations.
//!
//! Evaluation is a stack machine over the simplified tree, so the depth of recursion in the
//! program is bounded by memory, not by the native stack. Reference cells live in a [`Mem`] that
//! outlives a single call.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

mod builtin;
mod error;
mod interface;
mod mem;
mod pat_match;
mod step;
mod types;

pub use error::{Error, ErrorKind, Item};
pub use mem::Mem;

use sml_ast::simplify::Simplify as _;
use sml_ast::{Dec, Located, SigExp};
use sml_state::{DynamicBasis, DynamicInterface, State, Val, Warning};
use std::rc::Rc;
use types::{Done, St, Step};

/// How an evaluation ended.
#[derive(Debug)]
pub enum Outcome {
  /// The declaration finished, binding these.
  Basis(DynamicBasis),
  /// An exception escaped.
  Raised(Val),
}

/// The result of evaluation.
#[derive(Debug)]
pub struct EvaluationResult {
  /// How it ended.
  pub outcome: Outcome,
  /// Things that were not errors but may be surprising.
  pub warnings: Vec<Warning>,
  /// The writes to reference cells, oldest first.
  pub mem: Vec<(usize, Val)>,
}

impl EvaluationResult {
  /// Returns whether an exception escaped.
  #[must_use]
  pub fn has_thrown(&self) -> bool {
    matches!(self.outcome, Outcome::Raised(_))
  }
}

/// Evaluates the declaration in the state.
///
/// # Errors
///
/// If a name is not bound, which the statics usually rules out first. Escaping exceptions are not
/// errors.
pub fn evaluate(
  state: &Rc<State>,
  dec: &Located<Dec>,
  mem: &mut Mem,
) -> Result<EvaluationResult, Error> {
  elapsed::log("sml_dynamics::evaluate", || {
    let mut st = St::new(Rc::clone(state), mem);
    let done = step::run(&mut st, Step::Dec(dec.simplify()));
    let warnings = std::mem::take(&mut st.warnings);
    let log = st.mem.take_log();
    let outcome = match done? {
      Done::Basis(basis) => Outcome::Basis(basis),
      Done::Raise(exn) => Outcome::Raised(exn),
      Done::Val(_) => unreachable!("a declaration evaluated to a value"),
    };
    Ok(EvaluationResult { outcome, warnings, mem: log })
  })
}

/// Returns the names the signature exposes at runtime.
///
/// # Errors
///
/// If a signature name or datatype it mentions is not bound.
pub fn compute_interface(
  state: &Rc<State>,
  sig_exp: &Located<SigExp>,
) -> Result<DynamicInterface, Error> {
  interface::sig_exp(state, sig_exp)
}

#[cfg(test)]
mod tests {
  use super::{Error, ErrorKind, EvaluationResult, Item, Mem, Outcome, evaluate};
  use pretty_assertions::assert_eq;
  use std::rc::Rc;
  use str_util::Name;

  fn eval(s: &str) -> Result<EvaluationResult, Error> {
    let lex = sml_lex::get(s);
    assert!(lex.errors.is_empty(), "lex errors: {:?}", lex.errors);
    let state = Rc::new(sml_state::std_basis::get());
    let options = config::Options::successor_ml();
    let parse = sml_parse::get(&lex.tokens, &state, &options).expect("should parse");
    evaluate(&state, &parse.dec, &mut Mem::default())
  }

  fn ok(s: &str) -> EvaluationResult {
    match eval(s) {
      Ok(r) => r,
      Err(e) => panic!("{s}: {e}"),
    }
  }

  fn val(r: &EvaluationResult, name: &str) -> String {
    let Outcome::Basis(basis) = &r.outcome else { panic!("raised") };
    let (val, _) = basis.val_env.get(&Name::new(name)).expect("no such value");
    val.to_string()
  }

  #[test]
  fn arithmetic() {
    let r = ok("val a = 1 + 2 * 3 val b = ~7 div 2 val c = ~7 mod 2 val d = 7 mod ~2");
    assert_eq!(val(&r, "a"), "7");
    assert_eq!(val(&r, "b"), "~4");
    assert_eq!(val(&r, "c"), "1");
    assert_eq!(val(&r, "d"), "~1");
  }

  #[test]
  fn div_handle() {
    let r = ok("val a = 7 div 0 handle Div => ~1");
    assert_eq!(val(&r, "a"), "~1");
    let r = ok("val a = 7 div 0");
    assert!(r.has_thrown());
  }

  #[test]
  fn refs() {
    let r = ok("val r = ref 1 val _ = r := 2 val x = !r");
    assert_eq!(val(&r, "x"), "2");
    let log: Vec<_> = r.mem.iter().map(|(addr, v)| format!("{addr} {v}")).collect();
    assert_eq!(log, ["0 1", "0 2"]);
  }

  #[test]
  fn fact() {
    let r = ok("fun fact 0 = 1 | fact n = n * fact (n - 1) val x = fact 10");
    assert_eq!(val(&r, "x"), "3628800");
  }

  #[test]
  fn deep_recursion() {
    let r = ok("fun count 0 = 0 | count n = 1 + count (n - 1) val x = count 100000");
    assert_eq!(val(&r, "x"), "100000");
  }

  #[test]
  fn while_loop() {
    let r = ok("val r = ref 0 val _ = while !r < 10 do r := !r + 1 val n = !r");
    assert_eq!(val(&r, "n"), "10");
  }

  #[test]
  fn generative_exceptions() {
    let r = ok(
      r"
fun mk () =
  let exception E
  in (fn () => raise E, fn f => (f (); false) handle E => true)
  end
val (r1, c1) = mk ()
val (r2, _) = mk ()
val same = c1 r1
val diff = c1 r2 handle _ => false
",
    );
    assert_eq!(val(&r, "same"), "true");
    assert_eq!(val(&r, "diff"), "false");
  }

  #[test]
  fn bind_fails() {
    let r = ok("val SOME x = NONE : int option");
    assert!(r.has_thrown());
  }

  #[test]
  fn functor_narrowing() {
    let prelude = r"
signature S = sig val x : int end
structure A = struct val x = 1 val z = 2 end
";
    let r = ok(&format!("{prelude} functor F (P : S) = struct val y = P.x + 1 end
structure B = F (A) val b = B.y"));
    assert_eq!(val(&r, "b"), "2");
    let e = eval(&format!("{prelude} functor G (P : S) = struct val w = P.z end
structure C = G (A)"))
    .expect_err("z is hidden");
    assert!(matches!(e.kind(), ErrorKind::Undefined(Item::Val, name) if name == "P.z"), "{e}");
  }

  #[test]
  fn functor_missing_member() {
    let r = ok(r"
signature S = sig val x : int end
functor H (P : S) = struct val k = 0 end
structure E = H (struct end)
");
    let messages: Vec<_> = r.warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(messages, ["argument of functor `H` is missing `x`"]);
  }

  #[test]
  fn undefined_functor() {
    let e = eval("structure X = Nope (struct end)").expect_err("no functor");
    assert_eq!(e.to_string(), "Undefined functor `Nope`");
  }

  #[test]
  fn opaque_restricts() {
    let e = eval(r"
structure A :> sig val x : int end = struct val x = 1 val y = 2 end
val y = A.y
")
    .expect_err("y is hidden");
    assert!(matches!(e.kind(), ErrorKind::Undefined(Item::Val, _)), "{e}");
  }
}
