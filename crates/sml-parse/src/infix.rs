//! Resolving sequences of operands and infix operators by precedence and associativity.

use crate::parser::{ErrorKind, Parser, Result};
use sml_ast::Pos;
use sml_fixity::{Assoc, Infix};
use str_util::Name;

/// An infix operator occurrence.
#[derive(Debug)]
pub(crate) struct Op {
  pub(crate) name: Name,
  pub(crate) pos: Pos,
  pub(crate) info: Infix,
}

/// Resolves `first op1 x1 op2 x2 ...` into a tree with `combine`.
///
/// Higher precedence binds tighter. At equal precedence the associativity decides, and two
/// operators of equal precedence but different associativity may not be adjacent.
pub(crate) fn resolve<T, F>(first: T, rest: Vec<(Op, T)>, mut combine: F) -> Result<T>
where
  F: FnMut(Op, T, T) -> T,
{
  let mut stack: Vec<(T, Op)> = Vec::new();
  let mut cur = first;
  for (op, operand) in rest {
    loop {
      let Some((_, top)) = stack.last() else { break };
      if top.info.prec == op.info.prec && top.info.assoc != op.info.assoc {
        return Err(Parser::error_at(op.pos, ErrorKind::SameFixityDiffAssoc));
      }
      let reduce = top.info.prec > op.info.prec
        || (top.info.prec == op.info.prec && top.info.assoc == Assoc::Left);
      if !reduce {
        break;
      }
      if let Some((lhs, top)) = stack.pop() {
        cur = combine(top, lhs, cur);
      }
    }
    stack.push((cur, op));
    cur = operand;
  }
  while let Some((lhs, top)) = stack.pop() {
    cur = combine(top, lhs, cur);
  }
  Ok(cur)
}

#[cfg(test)]
mod tests {
  use super::{Op, resolve};
  use crate::parser::ErrorKind;
  use sml_fixity::Infix;
  use str_util::Name;

  fn op(name: &str, info: Infix) -> Op {
    Op { name: Name::new(name), pos: 0, info }
  }

  fn show(first: &str, rest: Vec<(Op, &str)>) -> String {
    let rest = rest.into_iter().map(|(o, x)| (o, x.to_owned())).collect();
    resolve(first.to_owned(), rest, |o, l, r| format!("({l} {} {r})", o.name)).expect("resolves")
  }

  #[test]
  fn prec_and_assoc() {
    let add = || op("+", Infix::left(6));
    let mul = || op("*", Infix::left(7));
    let cons = || op("::", Infix::right(5));
    assert_eq!(show("a", vec![(add(), "b"), (mul(), "c"), (add(), "d")]), "((a + (b * c)) + d)");
    assert_eq!(show("a", vec![(cons(), "b"), (cons(), "c")]), "(a :: (b :: c))");
    assert_eq!(show("a", vec![(add(), "b"), (cons(), "c")]), "((a + b) :: c)");
    assert_eq!(show("a", Vec::new()), "a");
  }

  #[test]
  fn mixed_assoc() {
    let rest = vec![(op("+", Infix::left(6)), 2), (op("++", Infix::right(6)), 3)];
    let err = resolve(1, rest, |_, l, r| l + r).expect_err("mixed associativity");
    assert_eq!(err.kind(), &ErrorKind::SameFixityDiffAssoc);
  }
}
