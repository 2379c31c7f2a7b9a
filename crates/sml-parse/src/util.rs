//! Names, labels, and other small pieces shared by the grammar.

use crate::parser::{ErrorKind, Expected, Feature, Parser, Result};
use sml_ast::{Lab, Located, Path, TyVar};
use sml_syntax::{Const, Kw, Token, TokenKind};
use str_util::Name;

/// Returns the path a token names, if it is a (long) vid.
pub(crate) fn tok_path(tok: &Token) -> Option<Path> {
  match &tok.kind {
    TokenKind::LongIdent(long) => {
      Some(Path::new(long.qualifiers.iter().cloned(), long.last.name.clone()))
    }
    _ => tok.vid_name().map(Path::one),
  }
}

/// Parses a long vid, `=` and `*` included.
pub(crate) fn long_vid(p: &mut Parser<'_>) -> Result<Located<Path>> {
  let pos = p.pos();
  match p.peek().and_then(tok_path) {
    Some(path) => {
      p.bump();
      Ok(Located::new(path, pos))
    }
    None => p.expected(Expected::Name),
  }
}

/// Parses a long alphanumeric name, like a structure path or a type constructor.
pub(crate) fn long_id(p: &mut Parser<'_>) -> Result<Located<Path>> {
  let pos = p.pos();
  match p.peek().and_then(alpha_path) {
    Some(path) => {
      p.bump();
      Ok(Located::new(path, pos))
    }
    None => p.expected(Expected::Name),
  }
}

/// Returns the path of an alphanumeric (long) identifier token.
pub(crate) fn alpha_path(tok: &Token) -> Option<Path> {
  match &tok.kind {
    TokenKind::Ident(ident) if ident.alphanumeric => Some(Path::one(ident.name.clone())),
    TokenKind::LongIdent(long) if long.last.alphanumeric => {
      Some(Path::new(long.qualifiers.iter().cloned(), long.last.name.clone()))
    }
    _ => None,
  }
}

/// Parses a short identifier.
pub(crate) fn name(p: &mut Parser<'_>) -> Result<Name> {
  match p.peek().map(|tok| &tok.kind) {
    Some(TokenKind::Ident(ident)) => {
      let ret = ident.name.clone();
      p.bump();
      Ok(ret)
    }
    _ => p.expected(Expected::Name),
  }
}

/// Parses a vid being bound, after an optional `op`. `=` may never be bound.
pub(crate) fn bound_vid(p: &mut Parser<'_>) -> Result<Name> {
  p.eat_if(Kw::Op);
  if p.at(Kw::Eq) {
    return Err(rebind_eq(p));
  }
  match p.peek().and_then(Token::vid_name) {
    Some(name) => {
      p.bump();
      Ok(name)
    }
    None => p.expected(Expected::Name),
  }
}

/// Returns the error for binding `=` at the current token.
pub(crate) fn rebind_eq(p: &Parser<'_>) -> crate::parser::Error {
  if p.options().allow_successor_ml {
    p.error(ErrorKind::RebindEq)
  } else {
    p.error(ErrorKind::FeatureDisabled(Feature::RebindEq))
  }
}

/// Parses a record label.
pub(crate) fn lab(p: &mut Parser<'_>) -> Result<Lab> {
  let Some(tok) = p.peek() else { return p.expected(Expected::Lab) };
  let ret = match &tok.kind {
    TokenKind::Ident(ident) => Lab::Name(ident.name.clone()),
    TokenKind::Kw(Kw::Star) => Lab::Name(Name::new("*")),
    TokenKind::Const(Const::Numeric(n)) => {
      Lab::Num(usize::try_from(*n).unwrap_or(usize::MAX))
    }
    _ => return p.expected(Expected::Lab),
  };
  p.bump();
  Ok(ret)
}

/// Parses an optional sequence of type variables: nothing, `'a`, or `('a, 'b)`.
pub(crate) fn ty_var_seq(p: &mut Parser<'_>) -> Result<Vec<TyVar>> {
  if let Some(tv) = p.peek().and_then(tok_ty_var) {
    p.bump();
    return Ok(vec![tv]);
  }
  if !(p.at(Kw::LRound) && p.peek_n(1).and_then(tok_ty_var).is_some()) {
    return Ok(Vec::new());
  }
  p.bump();
  let mut ret = Vec::new();
  loop {
    match p.peek().and_then(tok_ty_var) {
      Some(tv) => {
        p.bump();
        ret.push(tv);
      }
      None => return p.expected(Expected::Ty),
    }
    if !p.eat_if(Kw::Comma) {
      break;
    }
  }
  p.eat(Kw::RRound)?;
  Ok(ret)
}

pub(crate) fn tok_ty_var(tok: &Token) -> Option<TyVar> {
  match &tok.kind {
    TokenKind::TyVar(name) | TokenKind::EqTyVar(name) => Some(TyVar::new(name.clone())),
    _ => None,
  }
}

/// Parses one or more `f`, separated by `and`.
pub(crate) fn and_sep<T, F>(p: &mut Parser<'_>, mut f: F) -> Result<Vec<T>>
where
  F: FnMut(&mut Parser<'_>) -> Result<T>,
{
  let mut ret = vec![f(p)?];
  while p.eat_if(Kw::And) {
    ret.push(f(p)?);
  }
  Ok(ret)
}

/// Parses zero or more `f` separated by commas, then `close`.
pub(crate) fn comma_sep<T, F>(p: &mut Parser<'_>, close: Kw, mut f: F) -> Result<Vec<T>>
where
  F: FnMut(&mut Parser<'_>) -> Result<T>,
{
  let mut ret = Vec::new();
  if p.eat_if(close) {
    return Ok(ret);
  }
  loop {
    ret.push(f(p)?);
    if p.eat_if(Kw::Comma) {
      continue;
    }
    p.eat(close)?;
    return Ok(ret);
  }
}

/// Eats an optional leading `|`, which needs successor ML.
pub(crate) fn leading_bar(p: &mut Parser<'_>) -> Result<()> {
  if p.at(Kw::Bar) {
    p.require(Feature::LeadingBar)?;
    p.bump();
  }
  Ok(())
}

/// Parses the optional fixity digit of `infix` and `infixr`.
pub(crate) fn fixity_digit(p: &mut Parser<'_>) -> Result<Option<u16>> {
  let Some(tok) = p.peek() else { return Ok(None) };
  if !matches!(tok.kind, TokenKind::Const(_)) {
    return Ok(None);
  }
  let digit = match tok.kind {
    TokenKind::Const(Const::Int(0)) if tok.text.len() == 1 => Some(0),
    TokenKind::Const(Const::Numeric(n @ 1..=9)) if tok.text.len() == 1 => u16::try_from(n).ok(),
    _ => None,
  };
  match digit {
    Some(n) => {
      p.bump();
      Ok(Some(n))
    }
    None => Err(p.error(ErrorKind::InvalidFixity(tok.text.clone()))),
  }
}
