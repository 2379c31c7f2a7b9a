//! Structures, signatures, functors, and whole programs.

use crate::dec::{Ctx, at_datatype_copy, dat_bind, dec, dec_one, seq, starts_dec};
use crate::exp::{exp, starts_exp};
use crate::parser::{ErrorKind, Expected, Parser, Result, further};
use crate::ty::ty;
use crate::util::{alpha_path, and_sep, bound_vid, long_id, name, ty_var_seq};
use sml_ast::{
  Ascription, Dec, ExDesc, FunctorBind, Located, Pat, Path, SharingKind, SigBind, SigExp, Spec,
  StrBind, StrDesc, StrExp, TyBind, TyDesc, ValBind, ValDesc,
};
use sml_syntax::{Kw, Token, TokenKind};
use str_util::Name;

/// Parses a whole program. A top-level expression `e` means `val it = e`.
pub(crate) fn program(p: &mut Parser<'_>) -> Result<Located<Dec>> {
  let pos = p.pos();
  let mut decs = Vec::new();
  loop {
    if p.eat_if(Kw::Semicolon) {
      continue;
    }
    if p.at_eof() {
      break;
    }
    if starts_dec(p) {
      decs.push(dec_one(p, Ctx::Top)?);
      continue;
    }
    if !starts_exp(p) {
      return p.expected(Expected::Dec);
    }
    let exp_pos = p.pos();
    let exp = exp(p)?;
    let pat = Located::new(Pat::name("it"), exp_pos);
    let bind = ValBind { rec: false, pat, exp };
    decs.push(Located::new(Dec::Val(Vec::new(), vec![bind]), exp_pos));
    if !p.at_eof() && !p.at(Kw::Semicolon) {
      return p.expected(Expected::Kw(Kw::Semicolon));
    }
  }
  Ok(seq(decs, pos))
}

fn ascription(p: &mut Parser<'_>) -> Result<Option<(Ascription, Located<SigExp>)>> {
  let kind = if p.eat_if(Kw::Colon) {
    Ascription::Transparent
  } else if p.eat_if(Kw::ColonGt) {
    Ascription::Opaque
  } else {
    return Ok(None);
  };
  Ok(Some((kind, sig_exp(p)?)))
}

fn ascribe(body: Located<StrExp>, asc: Option<(Ascription, Located<SigExp>)>) -> Located<StrExp> {
  match asc {
    None => body,
    Some((kind, sig_exp)) => {
      let pos = body.pos;
      Located::new(StrExp::Ascription(Box::new(body), kind, Box::new(sig_exp)), pos)
    }
  }
}

pub(crate) fn str_bind(p: &mut Parser<'_>) -> Result<StrBind> {
  let name = name(p)?;
  let asc = ascription(p)?;
  p.eat(Kw::Eq)?;
  let body = str_exp(p)?;
  Ok(StrBind { name, str_exp: ascribe(body, asc) })
}

pub(crate) fn sig_bind(p: &mut Parser<'_>) -> Result<SigBind> {
  let name = name(p)?;
  p.eat(Kw::Eq)?;
  Ok(SigBind { name, sig_exp: sig_exp(p)? })
}

/// Parses `name (param : sigexp) [asc] = strexp` or the derived `name (spec) [asc] = strexp`.
pub(crate) fn functor_bind(p: &mut Parser<'_>) -> Result<FunctorBind> {
  let functor = name(p)?;
  p.eat(Kw::LRound)?;
  let named = p.peek().is_some_and(|tok| matches!(tok.kind, TokenKind::Ident(_)))
    && p.at_n(1, Kw::Colon);
  let (param, param_sig) = if named {
    let param = name(p)?;
    p.eat(Kw::Colon)?;
    (param, sig_exp(p)?)
  } else {
    let pos = p.pos();
    let mark = p.mark();
    let spec = spec(p)?;
    p.leave_scope(mark);
    (Name::new(FunctorBind::SUGAR_PARAM), Located::new(SigExp::Spec(Box::new(spec)), pos))
  };
  p.eat(Kw::RRound)?;
  let asc = ascription(p)?;
  p.eat(Kw::Eq)?;
  let pos = p.pos();
  let mut body = str_exp(p)?;
  if !named {
    let open = Located::new(Dec::Open(vec![Path::one(param.clone())]), pos);
    body = Located::new(StrExp::Let(Box::new(open), Box::new(body)), pos);
  }
  Ok(FunctorBind { name: functor, param, param_sig, body: ascribe(body, asc) })
}

pub(crate) fn str_exp(p: &mut Parser<'_>) -> Result<Located<StrExp>> {
  let pos = p.pos();
  let mut ret = at_str_exp(p)?;
  while let Some((kind, sig_exp)) = ascription(p)? {
    ret = Located::new(StrExp::Ascription(Box::new(ret), kind, Box::new(sig_exp)), pos);
  }
  Ok(ret)
}

fn at_str_exp(p: &mut Parser<'_>) -> Result<Located<StrExp>> {
  let pos = p.pos();
  if p.eat_if(Kw::Struct) {
    let mark = p.mark();
    let dec = dec(p, Ctx::Str)?;
    p.eat(Kw::End)?;
    p.leave_scope(mark);
    return Ok(Located::new(StrExp::Struct(Box::new(dec)), pos));
  }
  if p.eat_if(Kw::Let) {
    let mark = p.mark();
    let dec = dec(p, Ctx::Str)?;
    p.eat(Kw::In)?;
    let body = str_exp(p)?;
    p.eat(Kw::End)?;
    p.leave_scope(mark);
    return Ok(Located::new(StrExp::Let(Box::new(dec), Box::new(body)), pos));
  }
  let functor = match p.peek().map(|tok| &tok.kind) {
    Some(TokenKind::Ident(ident)) if p.at_n(1, Kw::LRound) => Some(ident.name.clone()),
    _ => None,
  };
  if let Some(functor) = functor {
    p.bump();
    p.bump();
    let arg = functor_arg(p)?;
    return Ok(Located::new(StrExp::App(functor, Box::new(arg)), pos));
  }
  match p.peek().and_then(alpha_path) {
    Some(path) => {
      p.bump();
      Ok(Located::new(StrExp::Path(path), pos))
    }
    None => p.expected(Expected::StrExp),
  }
}

/// Parses the argument of a functor application and the closing paren. `F (dec)` means
/// `F (struct dec end)`.
fn functor_arg(p: &mut Parser<'_>) -> Result<Located<StrExp>> {
  let str_err = match p.attempt(|p| {
    let ret = str_exp(p)?;
    p.eat(Kw::RRound)?;
    Ok(ret)
  })? {
    Ok(x) => return Ok(x),
    Err(e) => e,
  };
  let dec_attempt = p.attempt(|p| {
    let pos = p.pos();
    let mark = p.mark();
    let dec = dec(p, Ctx::Str)?;
    p.eat(Kw::RRound)?;
    p.leave_scope(mark);
    Ok(Located::new(StrExp::Struct(Box::new(dec)), pos))
  })?;
  dec_attempt.map_err(|e| further(str_err, e))
}

pub(crate) fn sig_exp(p: &mut Parser<'_>) -> Result<Located<SigExp>> {
  let pos = p.pos();
  let mut ret = if p.eat_if(Kw::Sig) {
    let mark = p.mark();
    let spec = spec(p)?;
    p.eat(Kw::End)?;
    p.leave_scope(mark);
    Located::new(SigExp::Spec(Box::new(spec)), pos)
  } else {
    match p.peek().map(|tok| &tok.kind) {
      Some(TokenKind::Ident(ident)) => {
        let name = ident.name.clone();
        p.bump();
        Located::new(SigExp::Name(name), pos)
      }
      _ => return p.expected(Expected::SigExp),
    }
  };
  while p.eat_if(Kw::Where) {
    p.eat(Kw::Type)?;
    loop {
      let ty_vars = ty_var_seq(p)?;
      let path = long_id(p)?.val;
      p.eat(Kw::Eq)?;
      let ty = ty(p)?;
      ret = Located::new(SigExp::Where(Box::new(ret), ty_vars, path, ty), pos);
      if p.at(Kw::And) && p.at_n(1, Kw::Type) {
        p.bump();
        p.bump();
      } else {
        break;
      }
    }
  }
  Ok(ret)
}

/// Parses a specification. `sharing` applies to everything specified before it.
fn spec(p: &mut Parser<'_>) -> Result<Located<Spec>> {
  let pos = p.pos();
  let mut items = Vec::new();
  loop {
    if p.eat_if(Kw::Semicolon) {
      continue;
    }
    if p.at(Kw::Sharing) {
      let sharing_pos = p.pos();
      p.bump();
      let kind = if p.eat_if(Kw::Type) { SharingKind::Regular } else { SharingKind::Derived };
      let mut paths = vec![long_id(p)?.val];
      while p.eat_if(Kw::Eq) {
        paths.push(long_id(p)?.val);
      }
      if paths.len() < 2 {
        return Err(Parser::error_at(sharing_pos, ErrorKind::SharingTooFew));
      }
      let inner = spec_seq(std::mem::take(&mut items), pos);
      items.push(Located::new(Spec::Sharing(Box::new(inner), kind, paths), sharing_pos));
      continue;
    }
    match spec_one(p)? {
      Some(spec) => items.push(spec),
      None => break,
    }
  }
  Ok(spec_seq(items, pos))
}

fn spec_seq(mut items: Vec<Located<Spec>>, pos: usize) -> Located<Spec> {
  if items.len() == 1 { items.swap_remove(0) } else { Located::new(Spec::Seq(items), pos) }
}

fn spec_one(p: &mut Parser<'_>) -> Result<Option<Located<Spec>>> {
  let pos = p.pos();
  let Some(kw) = p.peek().and_then(Token::as_kw) else { return Ok(None) };
  let val = match kw {
    Kw::Val => {
      p.bump();
      Spec::Val(and_sep(p, |p| {
        let name = bound_vid(p)?;
        p.eat(Kw::Colon)?;
        Ok(ValDesc { name, ty: ty(p)? })
      })?)
    }
    Kw::Type => {
      p.bump();
      let mut descs = Vec::new();
      let mut aliases = Vec::new();
      and_sep(p, |p| {
        let ty_vars = ty_var_seq(p)?;
        let name = name(p)?;
        if p.eat_if(Kw::Eq) {
          aliases.push(TyBind { ty_vars, name, ty: ty(p)? });
        } else {
          descs.push(TyDesc { ty_vars, name });
        }
        Ok(())
      })?;
      match (descs.is_empty(), aliases.is_empty()) {
        (false, true) => Spec::Ty(descs),
        (true, false) => Spec::TyAlias(aliases),
        _ => Spec::Seq(vec![
          Located::new(Spec::Ty(descs), pos),
          Located::new(Spec::TyAlias(aliases), pos),
        ]),
      }
    }
    Kw::Eqtype => {
      p.bump();
      Spec::EqTy(and_sep(p, |p| {
        let ty_vars = ty_var_seq(p)?;
        Ok(TyDesc { ty_vars, name: name(p)? })
      })?)
    }
    Kw::Datatype => {
      p.bump();
      if at_datatype_copy(p) {
        let name = name(p)?;
        p.bump();
        p.bump();
        Spec::DatatypeCopy(name, long_id(p)?.val)
      } else {
        Spec::Datatype(and_sep(p, dat_bind)?)
      }
    }
    Kw::Exception => {
      p.bump();
      Spec::Exception(and_sep(p, |p| {
        let name = bound_vid(p)?;
        let ty = if p.eat_if(Kw::Of) { Some(ty(p)?) } else { None };
        Ok(ExDesc { name, ty })
      })?)
    }
    Kw::Structure => {
      p.bump();
      Spec::Str(and_sep(p, |p| {
        let name = name(p)?;
        p.eat(Kw::Colon)?;
        Ok(StrDesc { name, sig_exp: sig_exp(p)? })
      })?)
    }
    Kw::Include => {
      p.bump();
      include(p)?
    }
    _ => return Ok(None),
  };
  Ok(Some(Located::new(val, pos)))
}

/// `include A B C` means `include A include B include C`.
fn include(p: &mut Parser<'_>) -> Result<Spec> {
  let is_ident = |p: &Parser<'_>, n: usize| {
    p.peek_n(n).is_some_and(|tok| matches!(tok.kind, TokenKind::Ident(_)))
  };
  if !(is_ident(p, 0) && is_ident(p, 1)) {
    return Ok(Spec::Include(Box::new(sig_exp(p)?)));
  }
  let mut ret = Vec::new();
  while is_ident(p, 0) {
    let pos = p.pos();
    let name = name(p)?;
    let sig_exp = Located::new(SigExp::Name(name), pos);
    ret.push(Located::new(Spec::Include(Box::new(sig_exp)), pos));
  }
  Ok(Spec::Seq(ret))
}
