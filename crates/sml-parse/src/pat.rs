//! Patterns.

use crate::exp::exp;
use crate::infix::{Op, resolve};
use crate::parser::{ErrorKind, Expected, Feature, Parser, Result};
use crate::ty::ty;
use crate::util::{comma_sep, lab, rebind_eq, tok_path};
use sml_ast::{Lab, Located, Pat, Path};
use sml_syntax::{Const, Kw, TokenKind};
use str_util::Name;

pub(crate) fn pat(p: &mut Parser<'_>) -> Result<Located<Pat>> {
  let pos = p.pos();
  if let Some(ret) = layered(p)? {
    return Ok(ret);
  }
  let mut ret = infix_pat(p)?;
  loop {
    if p.eat_if(Kw::Colon) {
      let ty = ty(p)?;
      ret = Located::new(Pat::Typed(Box::new(ret), ty), pos);
    } else if p.at(Kw::As) {
      p.require(Feature::ConjPat)?;
      p.bump();
      let rhs = pat(p)?;
      ret = Located::new(Pat::Conj(Box::new(ret), Box::new(rhs)), pos);
    } else if p.at(Kw::With) {
      p.require(Feature::GuardPat)?;
      p.bump();
      let guard_pat = pat(p)?;
      p.eat(Kw::Eq)?;
      let guard_exp = exp(p)?;
      let guard = Pat::Guard(Box::new(ret), Box::new(guard_pat), Box::new(guard_exp));
      ret = Located::new(guard, pos);
    } else {
      return Ok(ret);
    }
  }
}

/// Parses `[op] vid [: ty] as pat`, if that is what is next.
fn layered(p: &mut Parser<'_>) -> Result<Option<Located<Pat>>> {
  let pos = p.pos();
  let skip = usize::from(p.at(Kw::Op));
  let Some(tok) = p.peek_n(skip) else { return Ok(None) };
  let Some(name) = tok.vid_name() else { return Ok(None) };
  if !matches!(tok.kind, TokenKind::Ident(_)) {
    return Ok(None);
  }
  if skip == 0 && p.infix(tok).is_some() {
    return Ok(None);
  }
  if p.at_n(skip + 1, Kw::As) {
    for _ in 0..=skip {
      p.bump();
    }
    p.bump();
    let rhs = pat(p)?;
    return Ok(Some(Located::new(Pat::As(name, None, Box::new(rhs)), pos)));
  }
  if !p.at_n(skip + 1, Kw::Colon) {
    return Ok(None);
  }
  let attempt = p.attempt(|p| {
    for _ in 0..=skip {
      p.bump();
    }
    p.eat(Kw::Colon)?;
    let ty = ty(p)?;
    p.eat(Kw::As)?;
    Ok(ty)
  })?;
  match attempt {
    Ok(ty) => {
      let rhs = pat(p)?;
      Ok(Some(Located::new(Pat::As(name, Some(ty), Box::new(rhs)), pos)))
    }
    Err(_) => Ok(None),
  }
}

fn infix_op(p: &Parser<'_>) -> Option<Op> {
  let tok = p.peek()?;
  let TokenKind::Ident(ident) = &tok.kind else { return None };
  let info = p.infix(tok)?;
  Some(Op { name: ident.name.clone(), pos: tok.pos, info })
}

pub(crate) fn infix_pat(p: &mut Parser<'_>) -> Result<Located<Pat>> {
  let first = app_pat(p)?;
  let mut rest = Vec::new();
  while let Some(op) = infix_op(p) {
    p.bump();
    rest.push((op, app_pat(p)?));
  }
  resolve(first, rest, |op, lhs, rhs| {
    let pos = lhs.pos;
    let arg = Located::new(Pat::Tuple(vec![lhs, rhs]), pos);
    Located::new(Pat::Con(Path::one(op.name), Box::new(arg)), pos)
  })
}

fn app_pat(p: &mut Parser<'_>) -> Result<Located<Pat>> {
  let pos = p.pos();
  let ret = at_pat(p)?;
  let path = match &ret.val {
    Pat::Path(path, _) if starts_at_pat(p) => path.clone(),
    _ => return Ok(ret),
  };
  let arg = at_pat(p)?;
  if starts_at_pat(p) {
    return Err(p.error(ErrorKind::ConArgs(path.last().clone())));
  }
  Ok(Located::new(Pat::Con(path, Box::new(arg)), pos))
}

/// Returns whether an atomic pattern starts here.
pub(crate) fn starts_at_pat(p: &Parser<'_>) -> bool {
  let Some(tok) = p.peek() else { return false };
  match &tok.kind {
    TokenKind::Const(_) | TokenKind::LongIdent(_) => true,
    TokenKind::Ident(_) => p.infix(tok).is_none(),
    TokenKind::Kw(kw) => matches!(
      kw,
      Kw::Underscore | Kw::Op | Kw::LRound | Kw::LSquare | Kw::LCurly | Kw::Hash
    ),
    TokenKind::TyVar(_) | TokenKind::EqTyVar(_) => false,
  }
}

pub(crate) fn at_pat(p: &mut Parser<'_>) -> Result<Located<Pat>> {
  let pos = p.pos();
  let Some(tok) = p.peek() else { return p.expected(Expected::Pat) };
  let val = match &tok.kind {
    TokenKind::Const(Const::Real(_)) => return Err(p.error(ErrorKind::RealPat)),
    TokenKind::Const(c) => {
      p.bump();
      Pat::SCon(c.to_scon())
    }
    TokenKind::Ident(_) | TokenKind::LongIdent(_) => {
      if p.infix(tok).is_some() {
        return Err(p.error(ErrorKind::InfixWithoutOp));
      }
      let Some(path) = tok_path(tok) else { return p.expected(Expected::Pat) };
      p.bump();
      Pat::Path(path, false)
    }
    TokenKind::Kw(Kw::Underscore) => {
      p.bump();
      Pat::Wild
    }
    TokenKind::Kw(Kw::Op) => {
      p.bump();
      if p.at(Kw::Eq) {
        return Err(rebind_eq(p));
      }
      match p.peek().and_then(tok_path) {
        Some(path) => {
          p.bump();
          Pat::Path(path, true)
        }
        None => return p.expected(Expected::Name),
      }
    }
    TokenKind::Kw(Kw::LCurly) => {
      p.bump();
      record_pat(p)?
    }
    TokenKind::Kw(Kw::LRound) => {
      p.bump();
      paren_pat(p)?
    }
    TokenKind::Kw(Kw::LSquare) => {
      p.bump();
      Pat::List(comma_sep(p, Kw::RSquare, pat)?)
    }
    TokenKind::Kw(Kw::Hash) if p.at_n(1, Kw::LSquare) => {
      p.require(Feature::Vector)?;
      p.bump();
      p.bump();
      Pat::Vector(comma_sep(p, Kw::RSquare, pat)?)
    }
    _ => return p.expected(Expected::Pat),
  };
  Ok(Located::new(val, pos))
}

fn record_pat(p: &mut Parser<'_>) -> Result<Pat> {
  let mut rows = Vec::new();
  let mut rest = false;
  if p.eat_if(Kw::RCurly) {
    return Ok(Pat::Record { rows, rest });
  }
  loop {
    if p.eat_if(Kw::DotDotDot) {
      rest = true;
      p.eat(Kw::RCurly)?;
      return Ok(Pat::Record { rows, rest });
    }
    let pos = p.pos();
    let lab = lab(p)?;
    if p.eat_if(Kw::Eq) {
      rows.push((lab, pat(p)?));
    } else {
      let Lab::Name(name) = &lab else { return p.expected(Expected::Kw(Kw::Eq)) };
      let pun = punned_row(p, name.clone(), pos)?;
      rows.push((lab, pun));
    }
    if p.eat_if(Kw::Comma) {
      continue;
    }
    p.eat(Kw::RCurly)?;
    return Ok(Pat::Record { rows, rest });
  }
}

/// `{x : ty as pat}` means `{x = x : ty as pat}`.
fn punned_row(p: &mut Parser<'_>, name: Name, pos: usize) -> Result<Located<Pat>> {
  let ty = if p.eat_if(Kw::Colon) { Some(ty(p)?) } else { None };
  if p.eat_if(Kw::As) {
    let rhs = pat(p)?;
    return Ok(Located::new(Pat::As(name, ty, Box::new(rhs)), pos));
  }
  let var = Located::new(Pat::Path(Path::one(name), false), pos);
  Ok(match ty {
    None => var,
    Some(ty) => Located::new(Pat::Typed(Box::new(var), ty), pos),
  })
}

fn paren_pat(p: &mut Parser<'_>) -> Result<Pat> {
  if p.eat_if(Kw::RRound) {
    return Ok(Pat::unit());
  }
  let first = pat(p)?;
  if p.at(Kw::Bar) {
    p.require(Feature::OrPat)?;
    let mut pats = vec![first];
    while p.eat_if(Kw::Bar) {
      pats.push(pat(p)?);
    }
    p.eat(Kw::RRound)?;
    return Ok(Pat::Or(pats));
  }
  if p.eat_if(Kw::RRound) {
    return Ok(first.val);
  }
  let mut pats = vec![first];
  while p.eat_if(Kw::Comma) {
    pats.push(pat(p)?);
  }
  p.eat(Kw::RRound)?;
  Ok(Pat::Tuple(pats))
}
