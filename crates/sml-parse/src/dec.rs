//! Declarations.

use crate::exp::exp;
use crate::parser::{ErrorKind, Expected, Feature, Parser, Result, further};
use crate::pat::{at_pat, pat, starts_at_pat};
use crate::top_dec::{functor_bind, sig_bind, str_bind};
use crate::ty::ty;
use crate::util::{
  alpha_path, and_sep, bound_vid, fixity_digit, leading_bar, long_id, long_vid, name,
  rebind_eq, ty_var_seq,
};
use sml_ast::{
  ConBind, DatBind, Dec, ExBind, Exp, FunBind, FunClause, Located, Pat, TyBind, ValBind,
};
use sml_fixity::{Fixity, Infix};
use sml_state::IdStatus;
use sml_syntax::{Kw, Token, TokenKind};
use str_util::Name;

/// Where a declaration is, which decides whether module declarations may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ctx {
  /// At top level.
  Top,
  /// In a structure.
  Str,
  /// In a core `let` or `abstype`.
  Inner,
}

pub(crate) fn starts_dec(p: &Parser<'_>) -> bool {
  p.peek().and_then(Token::as_kw).is_some_and(|kw| {
    matches!(
      kw,
      Kw::Val
        | Kw::Fun
        | Kw::Type
        | Kw::Datatype
        | Kw::Abstype
        | Kw::Exception
        | Kw::Local
        | Kw::Open
        | Kw::Infix
        | Kw::Infixr
        | Kw::Nonfix
        | Kw::Do
        | Kw::Structure
        | Kw::Signature
        | Kw::Functor
    )
  })
}

/// Parses a sequence of declarations, optionally separated by `;`.
pub(crate) fn dec(p: &mut Parser<'_>, ctx: Ctx) -> Result<Located<Dec>> {
  let pos = p.pos();
  let mut decs = Vec::new();
  loop {
    if p.eat_if(Kw::Semicolon) {
      continue;
    }
    if !starts_dec(p) {
      break;
    }
    decs.push(dec_one(p, ctx)?);
  }
  Ok(seq(decs, pos))
}

pub(crate) fn seq(mut decs: Vec<Located<Dec>>, pos: usize) -> Located<Dec> {
  if decs.len() == 1 { decs.swap_remove(0) } else { Located::new(Dec::Seq(decs), pos) }
}

pub(crate) fn dec_one(p: &mut Parser<'_>, ctx: Ctx) -> Result<Located<Dec>> {
  let pos = p.pos();
  let Some(kw) = p.peek().and_then(Token::as_kw) else { return p.expected(Expected::Dec) };
  let val = match kw {
    Kw::Val => {
      p.bump();
      let ty_vars = ty_var_seq(p)?;
      let mut rec = false;
      let binds = and_sep(p, |p| {
        rec |= p.eat_if(Kw::Rec);
        val_bind(p, rec)
      })?;
      Dec::Val(ty_vars, binds)
    }
    Kw::Fun => {
      p.bump();
      let ty_vars = ty_var_seq(p)?;
      Dec::Fun(ty_vars, and_sep(p, fun_bind)?)
    }
    Kw::Type => {
      p.bump();
      Dec::Ty(and_sep(p, ty_bind)?)
    }
    Kw::Datatype => {
      p.bump();
      datatype(p)?
    }
    Kw::Abstype => {
      p.bump();
      let before = p.mark();
      let dats = and_sep(p, dat_bind)?;
      let with_ty = withtype(p)?;
      let after = p.mark();
      p.eat(Kw::With)?;
      let body = dec(p, Ctx::Inner)?;
      p.eat(Kw::End)?;
      p.forget(before, after);
      Dec::Abstype(dats, with_ty, Box::new(body))
    }
    Kw::Exception => {
      p.bump();
      Dec::Exception(and_sep(p, ex_bind)?)
    }
    Kw::Local => {
      p.bump();
      let inner = if ctx == Ctx::Top { Ctx::Str } else { ctx };
      let before = p.mark();
      let local = dec(p, inner)?;
      p.eat(Kw::In)?;
      let after = p.mark();
      let body = dec(p, inner)?;
      p.eat(Kw::End)?;
      p.forget(before, after);
      Dec::Local(Box::new(local), Box::new(body))
    }
    Kw::Open => {
      p.bump();
      let mut paths = vec![long_id(p)?.val];
      while let Some(path) = p.peek().and_then(alpha_path) {
        p.bump();
        paths.push(path);
      }
      Dec::Open(paths)
    }
    Kw::Infix | Kw::Infixr => {
      p.bump();
      let prec = fixity_digit(p)?.unwrap_or(0);
      let names = fixity_names(p)?;
      let info = if kw == Kw::Infix { Infix::left(prec) } else { Infix::right(prec) };
      for name in &names {
        p.declare_fixity(name.clone(), Fixity::Infix(info));
      }
      if kw == Kw::Infix { Dec::Infix(prec, names) } else { Dec::Infixr(prec, names) }
    }
    Kw::Nonfix => {
      p.bump();
      let names = fixity_names(p)?;
      for name in &names {
        p.declare_fixity(name.clone(), Fixity::Nonfix);
      }
      Dec::Nonfix(names)
    }
    Kw::Do => {
      p.require(Feature::Do)?;
      p.bump();
      Dec::Do(Box::new(exp(p)?))
    }
    Kw::Structure => {
      if ctx == Ctx::Inner {
        p.require(Feature::StructureHere)?;
      }
      p.bump();
      Dec::Structure(and_sep(p, str_bind)?)
    }
    Kw::Signature => {
      if ctx != Ctx::Top {
        p.require(Feature::SignatureHere)?;
      }
      p.bump();
      Dec::Signature(and_sep(p, sig_bind)?)
    }
    Kw::Functor => {
      if ctx != Ctx::Top {
        p.require(Feature::FunctorHere)?;
      }
      p.bump();
      Dec::Functor(and_sep(p, functor_bind)?)
    }
    _ => return p.expected(Expected::Dec),
  };
  Ok(Located::new(val, pos))
}

fn fixity_names(p: &mut Parser<'_>) -> Result<Vec<Name>> {
  let mut ret = Vec::new();
  while let Some(name) = p.peek().and_then(Token::vid_name) {
    p.bump();
    ret.push(name);
  }
  if ret.is_empty() { p.expected(Expected::Name) } else { Ok(ret) }
}

fn val_bind(p: &mut Parser<'_>, rec: bool) -> Result<ValBind> {
  if p.at(Kw::Eq) {
    return Err(rebind_eq(p));
  }
  let pat = pat(p)?;
  p.eat(Kw::Eq)?;
  let exp = exp(p)?;
  if rec {
    let Some(name) = rec_var(&pat.val) else {
      return Err(Parser::error_at(pat.pos, ErrorKind::ValRecNotVar));
    };
    if p.is_con(name) {
      return Err(Parser::error_at(pat.pos, ErrorKind::RebindCon(name.clone())));
    }
    if !is_fn(&exp.val) {
      return Err(Parser::error_at(exp.pos, ErrorKind::ValRecNotFn));
    }
  }
  Ok(ValBind { rec, pat, exp })
}

fn rec_var(pat: &Pat) -> Option<&Name> {
  match pat {
    Pat::Path(path, _) if path.prefix().is_empty() => Some(path.last()),
    Pat::Typed(pat, _) => rec_var(&pat.val),
    _ => None,
  }
}

fn is_fn(exp: &Exp) -> bool {
  match exp {
    Exp::Fn(_) => true,
    Exp::Typed(exp, _) => is_fn(&exp.val),
    _ => false,
  }
}

fn fun_bind(p: &mut Parser<'_>) -> Result<FunBind> {
  leading_bar(p)?;
  let pos = p.pos();
  let (name, first) = fun_clause(p)?;
  if p.is_con(&name) {
    return Err(Parser::error_at(pos, ErrorKind::RebindCon(name)));
  }
  let arity = first.pats.len();
  let mut clauses = vec![first];
  while p.eat_if(Kw::Bar) {
    let pos = p.pos();
    let (other, clause) = fun_clause(p)?;
    if other != name {
      return Err(Parser::error_at(pos, ErrorKind::FunNameMismatch));
    }
    if clause.pats.len() != arity {
      return Err(Parser::error_at(pos, ErrorKind::FunArityMismatch));
    }
    clauses.push(clause);
  }
  Ok(FunBind { name, clauses })
}

fn fun_clause(p: &mut Parser<'_>) -> Result<(Name, FunClause)> {
  let (name, pats) = fun_head(p)?;
  let ret_ty = if p.eat_if(Kw::Colon) { Some(ty(p)?) } else { None };
  p.eat(Kw::Eq)?;
  let body = exp(p)?;
  Ok((name, FunClause { pats, ret_ty, body }))
}

type FunHead = (Name, Vec<Located<Pat>>);

/// Parses the name and arguments of a clause, in one of the forms
///
/// - `[op] f atpat ... atpat`
/// - `atpat f atpat`, for infix `f`
/// - `(atpat f atpat) atpat ... atpat`, for infix `f`
fn fun_head(p: &mut Parser<'_>) -> Result<FunHead> {
  let Some(tok) = p.peek() else { return p.expected(Expected::Pat) };
  if p.at(Kw::LRound) {
    let parens_err = match p.attempt(infix_head_parens)? {
      Ok(x) => return Ok(x),
      Err(e) => e,
    };
    return match p.attempt(|p| infix_head(p, false))? {
      Ok(x) => Ok(x),
      Err(e) => Err(further(parens_err, e)),
    };
  }
  if p.at(Kw::Op) {
    return prefix_head(p);
  }
  if matches!(tok.kind, TokenKind::Ident(_) | TokenKind::Kw(Kw::Star)) {
    if p.infix(tok).is_some() {
      return Err(p.error(ErrorKind::InfixWithoutOp));
    }
    let next_is_infix = p
      .peek_n(1)
      .is_some_and(|next| next.kind != TokenKind::Kw(Kw::Eq) && p.infix(next).is_some());
    return if next_is_infix { infix_head(p, false) } else { prefix_head(p) };
  }
  if p.at(Kw::Eq) {
    return prefix_head(p);
  }
  infix_head(p, false)
}

fn prefix_head(p: &mut Parser<'_>) -> Result<FunHead> {
  let name = bound_vid(p)?;
  let mut pats = Vec::new();
  while starts_at_pat(p) {
    pats.push(at_pat(p)?);
  }
  if pats.is_empty() {
    return p.expected(Expected::Pat);
  }
  Ok((name, pats))
}

/// Inside parens, a `=` after the left operand can only be the name being bound.
fn infix_head(p: &mut Parser<'_>, in_parens: bool) -> Result<FunHead> {
  let pos = p.pos();
  let lhs = at_pat(p)?;
  if in_parens && p.at(Kw::Eq) {
    return Err(rebind_eq(p));
  }
  let name = match p.peek() {
    Some(tok) if p.infix(tok).is_some() => tok.vid_name(),
    _ => None,
  };
  let Some(name) = name else { return p.expected(Expected::Name) };
  p.bump();
  let rhs = at_pat(p)?;
  Ok((name, vec![Located::new(Pat::Tuple(vec![lhs, rhs]), pos)]))
}

fn infix_head_parens(p: &mut Parser<'_>) -> Result<FunHead> {
  p.eat(Kw::LRound)?;
  let (name, mut pats) = infix_head(p, true)?;
  p.eat(Kw::RRound)?;
  while starts_at_pat(p) {
    pats.push(at_pat(p)?);
  }
  Ok((name, pats))
}

pub(crate) fn ty_bind(p: &mut Parser<'_>) -> Result<TyBind> {
  let ty_vars = ty_var_seq(p)?;
  let name = name(p)?;
  p.eat(Kw::Eq)?;
  let ty = ty(p)?;
  Ok(TyBind { ty_vars, name, ty })
}

fn withtype(p: &mut Parser<'_>) -> Result<Vec<TyBind>> {
  if p.eat_if(Kw::Withtype) { and_sep(p, ty_bind) } else { Ok(Vec::new()) }
}

/// Returns whether `name = datatype` is next.
pub(crate) fn at_datatype_copy(p: &Parser<'_>) -> bool {
  p.peek().is_some_and(|tok| matches!(tok.kind, TokenKind::Ident(_)))
    && p.at_n(1, Kw::Eq)
    && p.at_n(2, Kw::Datatype)
}

/// Parses what follows `datatype`.
fn datatype(p: &mut Parser<'_>) -> Result<Dec> {
  if at_datatype_copy(p) {
    let name = name(p)?;
    p.bump();
    p.bump();
    let path = long_id(p)?.val;
    p.declare_cons_of(&path);
    return Ok(Dec::DatatypeCopy(name, path));
  }
  let dats = and_sep(p, dat_bind)?;
  let with_ty = withtype(p)?;
  Ok(Dec::Datatype(dats, with_ty))
}

pub(crate) fn dat_bind(p: &mut Parser<'_>) -> Result<DatBind> {
  let ty_vars = ty_var_seq(p)?;
  let name = name(p)?;
  p.eat(Kw::Eq)?;
  leading_bar(p)?;
  let mut cons = Vec::new();
  loop {
    let con = bound_vid(p)?;
    let ty = if p.eat_if(Kw::Of) { Some(ty(p)?) } else { None };
    p.declare_con(con.clone(), IdStatus::Con);
    cons.push(ConBind { name: con, ty });
    if !p.eat_if(Kw::Bar) {
      break;
    }
  }
  Ok(DatBind { ty_vars, name, cons })
}

fn ex_bind(p: &mut Parser<'_>) -> Result<ExBind> {
  let name = bound_vid(p)?;
  let ret = if p.eat_if(Kw::Eq) {
    p.eat_if(Kw::Op);
    ExBind::Copy(name.clone(), long_vid(p)?.val)
  } else {
    let ty = if p.eat_if(Kw::Of) { Some(ty(p)?) } else { None };
    ExBind::New(name.clone(), ty)
  };
  p.declare_con(name, IdStatus::Exn);
  Ok(ret)
}
