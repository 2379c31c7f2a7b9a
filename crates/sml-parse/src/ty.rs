//! Types.

use crate::parser::{Expected, Parser, Result};
use crate::util::{alpha_path, comma_sep, lab, long_id, tok_ty_var};
use sml_ast::{Located, Ty};
use sml_syntax::Kw;

pub(crate) fn ty(p: &mut Parser<'_>) -> Result<Located<Ty>> {
  let pos = p.pos();
  let lhs = tuple_ty(p)?;
  if p.eat_if(Kw::Arrow) {
    let rhs = ty(p)?;
    Ok(Located::new(Ty::Fn(Box::new(lhs), Box::new(rhs)), pos))
  } else {
    Ok(lhs)
  }
}

fn tuple_ty(p: &mut Parser<'_>) -> Result<Located<Ty>> {
  let pos = p.pos();
  let mut tys = vec![app_ty(p)?];
  while p.eat_if(Kw::Star) {
    tys.push(app_ty(p)?);
  }
  if tys.len() == 1 {
    Ok(tys.swap_remove(0))
  } else {
    Ok(Located::new(Ty::Tuple(tys), pos))
  }
}

/// Type constructors are postfix: `int list option`.
fn app_ty(p: &mut Parser<'_>) -> Result<Located<Ty>> {
  let pos = p.pos();
  let mut ret = at_ty(p)?;
  while let Some(path) = p.peek().and_then(alpha_path) {
    p.bump();
    ret = Located::new(Ty::Con(vec![ret], path), pos);
  }
  Ok(ret)
}

fn at_ty(p: &mut Parser<'_>) -> Result<Located<Ty>> {
  let pos = p.pos();
  if let Some(tv) = p.peek().and_then(tok_ty_var) {
    p.bump();
    return Ok(Located::new(Ty::Var(tv), pos));
  }
  if let Some(path) = p.peek().and_then(alpha_path) {
    p.bump();
    return Ok(Located::new(Ty::Con(Vec::new(), path), pos));
  }
  if p.eat_if(Kw::LCurly) {
    let rows = comma_sep(p, Kw::RCurly, |p| {
      let lab = lab(p)?;
      p.eat(Kw::Colon)?;
      Ok((lab, ty(p)?))
    })?;
    return Ok(Located::new(Ty::Record(rows), pos));
  }
  if p.at(Kw::LRound) && !p.at_n(1, Kw::RRound) {
    p.bump();
    let mut tys = vec![ty(p)?];
    while p.eat_if(Kw::Comma) {
      tys.push(ty(p)?);
    }
    p.eat(Kw::RRound)?;
    if tys.len() == 1 {
      return Ok(tys.swap_remove(0));
    }
    let path = long_id(p)?;
    return Ok(Located::new(Ty::Con(tys, path.val), pos));
  }
  p.expected(Expected::Ty)
}
