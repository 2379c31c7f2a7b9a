//! Parse a sequence of tokens into an abstract syntax tree.
//!
//! Infix names are resolved while parsing, using the fixities of the state parsed against plus
//! any declared by the program itself. Likewise whether a name is a constructor, which a few
//! declarations need to know, comes from the state plus the program's own declarations.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

mod dec;
mod exp;
mod infix;
mod parser;
mod pat;
mod top_dec;
mod ty;
mod util;

use config::Options;
use sml_ast::{Dec, Located};
use sml_state::State;
use sml_syntax::Token;

pub use parser::{Error, ErrorKind, Expected, Feature};

/// The result of a successful parse.
#[derive(Debug)]
pub struct Parse {
  /// The declarations of the program.
  pub dec: Located<Dec>,
  /// The fixities the program declared at top level.
  pub fixity: sml_fixity::Map,
}

/// Parses the tokens as a program in the context of `state`.
///
/// # Errors
///
/// If the tokens were not a valid program. See [`Error::is_incomplete`] for whether adding
/// tokens might fix it.
pub fn get(tokens: &[Token], state: &State, options: &Options) -> Result<Parse, Error> {
  let mut p = parser::Parser::new(tokens, state, options);
  let dec = top_dec::program(&mut p)?;
  Ok(Parse { dec, fixity: p.finish() })
}

#[cfg(test)]
mod tests {
  use super::get;
  use config::Options;
  use sml_ast::{Dec, Exp, Pat};
  use sml_state::std_basis;

  fn parse(s: &str) -> Result<Dec, super::Error> {
    let lex = sml_lex::get(s);
    assert!(lex.errors.is_empty(), "lex errors: {:?}", lex.errors);
    let st = std_basis::get();
    get(&lex.tokens, &st, &Options::default()).map(|x| x.dec.val)
  }

  fn it_exp(s: &str) -> String {
    match parse(s).expect("parses") {
      Dec::Val(_, binds) => binds[0].exp.val.to_string(),
      dec => panic!("not a val: {dec:?}"),
    }
  }

  #[test]
  fn top_exp() {
    assert_eq!(it_exp("1 + 2 * 3"), "+(1,*(2,3))");
    assert_eq!(it_exp("1 - 2 - 3"), "-(-(1,2),3)");
    assert_eq!(it_exp("1 :: 2 :: nil"), "::(1,::(2,nil))");
    assert_eq!(it_exp("f x y"), "f(x)(y)");
  }

  #[test]
  fn local_fixity() {
    let dec = parse("infix 5 ++ ; fun a ++ b = a").expect("parses");
    let Dec::Seq(decs) = dec else { panic!("not a seq") };
    let Dec::Fun(_, binds) = &decs[1].val else { panic!("not a fun") };
    assert_eq!(binds[0].name.as_str(), "++");
    assert!(matches!(binds[0].clauses[0].pats[0].val, Pat::Tuple(_)));
  }

  #[test]
  fn incomplete() {
    for s in ["let val x = 1 in x", "fun f x =", "(1, 2", "structure S = struct"] {
      let err = parse(s).expect_err(s);
      assert!(err.is_incomplete(), "{s}: {err}");
    }
  }

  #[test]
  fn infix_without_op() {
    let err = parse("val x = +").expect_err("bare infix");
    assert_eq!(err.to_string(), "infix name used as non-infix without `op`");
    let Ok(Dec::Val(_, binds)) = parse("val x = op +") else { panic!("op + did not parse") };
    assert!(matches!(binds[0].exp.val, Exp::Path(_, true)));
  }
}
