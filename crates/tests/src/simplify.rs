//! Rewriting derived forms into the core.

use crate::check::last_val_exp;
use pretty_assertions::assert_eq;
use sml_ast::{Dec, Exp, Located};
use sml_ast::simplify::Simplify as _;

fn simplified(s: &str) -> (Located<Exp>, Located<Exp>) {
  let lex = sml_lex::get(s);
  let state = sml_state::std_basis::get();
  let parse = sml_parse::get(&lex.tokens, &state, &config::Options::default()).unwrap();
  let Dec::Val(_, binds) = parse.dec.val else { panic!("not a val") };
  let once = binds[0].exp.simplify();
  let twice = once.simplify();
  (once, twice)
}

#[test]
fn tuple() {
  assert_eq!(last_val_exp("val it = (11, 12)").unwrap(), "(11,12)");
  let (once, twice) = simplified("val it = (11, 12)");
  assert_eq!(once.to_string(), "{1 = 11, 2 = 12}");
  assert_eq!(once, twice);
}

#[test]
fn list() {
  let (once, twice) = simplified("val it = [1, 2]");
  assert_eq!(once.to_string(), "::({1 = 1, 2 = ::({1 = 2, 2 = nil})})");
  assert_eq!(once, twice);
}

#[test]
fn if_() {
  let (once, twice) = simplified("val it = if a then b else c");
  assert_eq!(once.to_string(), "(fn true => b | false => c)(a)");
  assert_eq!(once, twice);
}

#[test]
fn andalso() {
  let (once, _) = simplified("val it = a andalso b");
  assert_eq!(once.to_string(), "(fn true => b | false => false)(a)");
}

#[test]
fn case() {
  let (once, _) = simplified("val it = case x of 0 => a | _ => b");
  assert_eq!(once.to_string(), "(fn 0 => a | _ => b)(x)");
}
