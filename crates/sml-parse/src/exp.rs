//! Expressions.

use crate::dec::{Ctx, dec};
use crate::infix::{Op, resolve};
use crate::parser::{ErrorKind, Expected, Feature, Parser, Result};
use crate::pat::pat;
use crate::ty::ty;
use crate::util::{comma_sep, lab, leading_bar, tok_path};
use sml_ast::{Arm, Exp, Located, Matcher, Path};
use sml_syntax::{Kw, Token, TokenKind};

pub(crate) fn exp(p: &mut Parser<'_>) -> Result<Located<Exp>> {
  let pos = p.pos();
  let ret = orelse_exp(p)?;
  if p.eat_if(Kw::Handle) {
    let matcher = matcher(p)?;
    return Ok(Located::new(Exp::Handle(Box::new(ret), matcher), pos));
  }
  Ok(ret)
}

fn orelse_exp(p: &mut Parser<'_>) -> Result<Located<Exp>> {
  let pos = p.pos();
  let mut ret = andalso_exp(p)?;
  while p.eat_if(Kw::Orelse) {
    let rhs = andalso_exp(p)?;
    ret = Located::new(Exp::Orelse(Box::new(ret), Box::new(rhs)), pos);
  }
  Ok(ret)
}

fn andalso_exp(p: &mut Parser<'_>) -> Result<Located<Exp>> {
  let pos = p.pos();
  let mut ret = typed_exp(p)?;
  while p.eat_if(Kw::Andalso) {
    let rhs = typed_exp(p)?;
    ret = Located::new(Exp::Andalso(Box::new(ret), Box::new(rhs)), pos);
  }
  Ok(ret)
}

fn typed_exp(p: &mut Parser<'_>) -> Result<Located<Exp>> {
  if let Some(ret) = kw_exp(p)? {
    return Ok(ret);
  }
  let pos = p.pos();
  let mut ret = infix_exp(p)?;
  while p.eat_if(Kw::Colon) {
    let ty = ty(p)?;
    ret = Located::new(Exp::Typed(Box::new(ret), ty), pos);
  }
  Ok(ret)
}

fn kw_exp_start(p: &Parser<'_>) -> Option<Kw> {
  let kw = p.peek()?.as_kw()?;
  matches!(kw, Kw::Raise | Kw::If | Kw::While | Kw::Case | Kw::Fn).then_some(kw)
}

/// Keyword expressions extend as far right as possible.
fn kw_exp(p: &mut Parser<'_>) -> Result<Option<Located<Exp>>> {
  let pos = p.pos();
  let Some(kw) = kw_exp_start(p) else { return Ok(None) };
  p.bump();
  let val = match kw {
    Kw::Raise => Exp::Raise(Box::new(exp(p)?)),
    Kw::If => {
      let cond = exp(p)?;
      p.eat(Kw::Then)?;
      let yes = exp(p)?;
      let no = if p.at(Kw::Else) || !p.options().allow_successor_ml {
        p.eat(Kw::Else)?;
        exp(p)?
      } else {
        Located::new(Exp::unit(), p.pos())
      };
      Exp::If(Box::new(cond), Box::new(yes), Box::new(no))
    }
    Kw::While => {
      let cond = exp(p)?;
      p.eat(Kw::Do)?;
      let body = exp(p)?;
      Exp::While(Box::new(cond), Box::new(body))
    }
    Kw::Case => {
      let head = exp(p)?;
      p.eat(Kw::Of)?;
      Exp::Case(Box::new(head), matcher(p)?)
    }
    _ => Exp::Fn(matcher(p)?),
  };
  Ok(Some(Located::new(val, pos)))
}

pub(crate) fn matcher(p: &mut Parser<'_>) -> Result<Matcher> {
  leading_bar(p)?;
  let mut ret = Vec::new();
  loop {
    let pat = pat(p)?;
    p.eat(Kw::BigArrow)?;
    let exp = exp(p)?;
    ret.push(Arm { pat, exp });
    if !p.eat_if(Kw::Bar) {
      return Ok(ret);
    }
  }
}

fn infix_op(p: &Parser<'_>) -> Option<Op> {
  let tok = p.peek()?;
  let name = tok.vid_name()?;
  let info = p.infix(tok)?;
  Some(Op { name, pos: tok.pos, info })
}

fn infix_exp(p: &mut Parser<'_>) -> Result<Located<Exp>> {
  let first = app_exp(p)?;
  let mut rest = Vec::new();
  while let Some(op) = infix_op(p) {
    p.bump();
    if let Some(kw) = kw_exp_start(p) {
      return Err(p.error(ErrorKind::NeedParens(kw)));
    }
    rest.push((op, app_exp(p)?));
  }
  resolve(first, rest, |op, lhs, rhs| {
    let pos = lhs.pos;
    let func = Located::new(Exp::Path(Path::one(op.name), false), op.pos);
    let arg = Located::new(Exp::Tuple(vec![lhs, rhs]), pos);
    Located::new(Exp::App(Box::new(func), Box::new(arg)), pos)
  })
}

fn app_exp(p: &mut Parser<'_>) -> Result<Located<Exp>> {
  let pos = p.pos();
  let mut ret = at_exp(p)?;
  while starts_at_exp(p) {
    let arg = at_exp(p)?;
    ret = Located::new(Exp::App(Box::new(ret), Box::new(arg)), pos);
  }
  Ok(ret)
}

/// Returns whether an atomic expression starts here. Infix names do not start one.
pub(crate) fn starts_at_exp(p: &Parser<'_>) -> bool {
  let Some(tok) = p.peek() else { return false };
  match &tok.kind {
    TokenKind::Const(_) | TokenKind::LongIdent(_) => true,
    TokenKind::Ident(_) => p.infix(tok).is_none(),
    TokenKind::Kw(kw) => {
      matches!(kw, Kw::Op | Kw::LRound | Kw::LSquare | Kw::LCurly | Kw::Hash | Kw::Let)
    }
    TokenKind::TyVar(_) | TokenKind::EqTyVar(_) => false,
  }
}

/// Returns whether an expression may start here.
pub(crate) fn starts_exp(p: &Parser<'_>) -> bool {
  starts_at_exp(p)
    || kw_exp_start(p).is_some()
    || p.peek().is_some_and(Token::is_vid)
}

fn at_exp(p: &mut Parser<'_>) -> Result<Located<Exp>> {
  let pos = p.pos();
  let Some(tok) = p.peek() else { return p.expected(Expected::Exp) };
  let val = match &tok.kind {
    TokenKind::Const(c) => {
      p.bump();
      Exp::SCon(c.to_scon())
    }
    TokenKind::Ident(_) | TokenKind::LongIdent(_) | TokenKind::Kw(Kw::Eq | Kw::Star) => {
      if p.infix(tok).is_some() {
        return Err(p.error(ErrorKind::InfixWithoutOp));
      }
      let Some(path) = tok_path(tok) else { return p.expected(Expected::Exp) };
      p.bump();
      Exp::Path(path, false)
    }
    TokenKind::Kw(Kw::Op) => {
      p.bump();
      match p.peek().and_then(tok_path) {
        Some(path) => {
          p.bump();
          Exp::Path(path, true)
        }
        None => return p.expected(Expected::Name),
      }
    }
    TokenKind::Kw(Kw::LCurly) => {
      p.bump();
      Exp::Record(comma_sep(p, Kw::RCurly, |p| {
        let lab = lab(p)?;
        p.eat(Kw::Eq)?;
        Ok((lab, exp(p)?))
      })?)
    }
    TokenKind::Kw(Kw::Hash) => {
      p.bump();
      if p.at(Kw::LSquare) {
        p.require(Feature::Vector)?;
        p.bump();
        Exp::Vector(comma_sep(p, Kw::RSquare, exp)?)
      } else {
        Exp::Selector(lab(p)?)
      }
    }
    TokenKind::Kw(Kw::LRound) => {
      p.bump();
      paren_exp(p)?
    }
    TokenKind::Kw(Kw::LSquare) => {
      p.bump();
      Exp::List(comma_sep(p, Kw::RSquare, exp)?)
    }
    TokenKind::Kw(Kw::Let) => {
      p.bump();
      let mark = p.mark();
      let dec = dec(p, Ctx::Inner)?;
      p.eat(Kw::In)?;
      let body = exp_seq(p, Kw::End)?;
      p.leave_scope(mark);
      Exp::Let(Box::new(dec), Box::new(body))
    }
    _ => return p.expected(Expected::Exp),
  };
  Ok(Located::new(val, pos))
}

fn paren_exp(p: &mut Parser<'_>) -> Result<Exp> {
  if p.eat_if(Kw::RRound) {
    return Ok(Exp::unit());
  }
  let first = exp(p)?;
  if p.eat_if(Kw::RRound) {
    return Ok(first.val);
  }
  if p.at(Kw::Semicolon) {
    let pos = first.pos;
    let mut exps = vec![first];
    seq_rest(p, Kw::RRound, &mut exps)?;
    return Ok(seq(exps, pos).val);
  }
  let mut exps = vec![first];
  while p.eat_if(Kw::Comma) {
    exps.push(exp(p)?);
  }
  p.eat(Kw::RRound)?;
  Ok(Exp::Tuple(exps))
}

/// Parses `exp ; ... ; exp` then `close`.
fn exp_seq(p: &mut Parser<'_>, close: Kw) -> Result<Located<Exp>> {
  let pos = p.pos();
  let mut exps = vec![exp(p)?];
  seq_rest(p, close, &mut exps)?;
  Ok(seq(exps, pos))
}

/// A trailing `;` before `close` needs successor ML.
fn seq_rest(p: &mut Parser<'_>, close: Kw, exps: &mut Vec<Located<Exp>>) -> Result<()> {
  while p.at(Kw::Semicolon) {
    if p.at_n(1, close) {
      p.require(Feature::TrailingSemicolon)?;
      p.bump();
      break;
    }
    p.bump();
    exps.push(exp(p)?);
  }
  p.eat(close)?;
  Ok(())
}

fn seq(mut exps: Vec<Located<Exp>>, pos: usize) -> Located<Exp> {
  if exps.len() == 1 { exps.swap_remove(0) } else { Located::new(Exp::Seq(exps), pos) }
}
