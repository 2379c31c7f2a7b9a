//! The parser: a cursor over tokens plus the fixities and constructors declared so far.

use config::Options;
use sml_ast::{Path, Pos};
use sml_fixity::{Fixity, Infix};
use sml_state::{IdStatus, State};
use sml_syntax::{Kw, Token, TokenKind};
use std::fmt;
use str_util::{Name, SmolStr};

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// A parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
  pos: Pos,
  kind: ErrorKind,
}

impl Error {
  /// Returns where the error is.
  #[must_use]
  pub fn pos(&self) -> Pos {
    self.pos
  }

  /// Returns what the error is.
  #[must_use]
  pub fn kind(&self) -> &ErrorKind {
    &self.kind
  }

  /// Returns whether this means the input ended too early, so more input may fix it.
  #[must_use]
  pub fn is_incomplete(&self) -> bool {
    matches!(self.kind, ErrorKind::Incomplete(_))
  }

  /// Returns whether this means a disabled feature was used.
  #[must_use]
  pub fn is_feature_disabled(&self) -> bool {
    matches!(self.kind, ErrorKind::FeatureDisabled(_))
  }

  /// Returns whether a parse attempt failing with this may be retried with another alternative.
  fn is_soft(&self) -> bool {
    !self.is_incomplete()
      && !self.is_feature_disabled()
      && !matches!(self.kind, ErrorKind::RebindEq)
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.kind.fmt(f)
  }
}

/// A kind of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
  /// The input ended while expecting something.
  Incomplete(Expected),
  /// A feature was used that the options do not enable.
  FeatureDisabled(Feature),
  /// Something was expected, but the token found was not it.
  Expected(Expected, SmolStr),
  /// An infix name was used as an operand.
  InfixWithoutOp,
  /// Adjacent infix names had the same precedence and different associativity.
  SameFixityDiffAssoc,
  /// A keyword expression was an infix operand.
  NeedParens(Kw),
  /// A fixity was not a single digit.
  InvalidFixity(SmolStr),
  /// Clauses of one `fun` named different functions.
  FunNameMismatch,
  /// Clauses of one `fun` took different numbers of arguments.
  FunArityMismatch,
  /// `=` was bound.
  RebindEq,
  /// A constructor was bound by `fun` or `val rec`.
  RebindCon(Name),
  /// `val rec` bound something other than `fn`.
  ValRecNotFn,
  /// `val rec` had a pattern other than a variable.
  ValRecNotVar,
  /// A real constant was used in a pattern.
  RealPat,
  /// A constructor pattern had more than one argument.
  ConArgs(Name),
  /// A sharing spec had fewer than 2 names.
  SharingTooFew,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorKind::Incomplete(e) => write!(f, "unexpected end of input, expected {e}"),
      ErrorKind::FeatureDisabled(Feature::RebindEq) => {
        f.write_str("rebinding `=` is not allowed")
      }
      ErrorKind::FeatureDisabled(feature) => {
        write!(f, "{feature} requires `{}`", feature.option())
      }
      ErrorKind::Expected(e, found) => write!(f, "expected {e}, found `{found}`"),
      ErrorKind::InfixWithoutOp => f.write_str("infix name used as non-infix without `op`"),
      ErrorKind::SameFixityDiffAssoc => {
        f.write_str("consecutive infix names with same fixity but different associativity")
      }
      ErrorKind::NeedParens(kw) => {
        write!(f, "parentheses required around `{kw}` expressions here")
      }
      ErrorKind::InvalidFixity(s) => write!(f, "invalid fixity: `{s}` is not a single digit"),
      ErrorKind::FunNameMismatch => {
        f.write_str("Function clauses must all name the same function")
      }
      ErrorKind::FunArityMismatch => f.write_str("Different number of arguments"),
      ErrorKind::RebindEq => f.write_str("`=` may not be rebound"),
      ErrorKind::RebindCon(name) => write!(f, "cannot rebind constructor `{name}`"),
      ErrorKind::ValRecNotFn => f.write_str("the right side of `val rec` must be `fn`"),
      ErrorKind::ValRecNotVar => f.write_str("the left side of `val rec` must be a variable"),
      ErrorKind::RealPat => f.write_str("real constants are not allowed in patterns"),
      ErrorKind::ConArgs(name) => write!(f, "constructor `{name}` takes only one argument"),
      ErrorKind::SharingTooFew => {
        f.write_str("A sharing expression requires at least 2 type names")
      }
    }
  }
}

/// Something the parser expected.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Expected {
  Exp,
  Pat,
  Ty,
  Dec,
  Lab,
  Name,
  StrExp,
  SigExp,
  Spec,
  Kw(Kw),
}

impl fmt::Display for Expected {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expected::Exp => f.write_str("an expression"),
      Expected::Pat => f.write_str("a pattern"),
      Expected::Ty => f.write_str("a type"),
      Expected::Dec => f.write_str("a declaration"),
      Expected::Lab => f.write_str("a label"),
      Expected::Name => f.write_str("a name"),
      Expected::StrExp => f.write_str("a structure expression"),
      Expected::SigExp => f.write_str("a signature expression"),
      Expected::Spec => f.write_str("a specification"),
      Expected::Kw(kw) => write!(f, "`{kw}`"),
    }
  }
}

/// A feature that may be disabled by the options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Feature {
  OrPat,
  ConjPat,
  GuardPat,
  Do,
  LeadingBar,
  TrailingSemicolon,
  Vector,
  RebindEq,
  StructureHere,
  SignatureHere,
  FunctorHere,
}

impl Feature {
  /// Returns the name of the option enabling this.
  #[must_use]
  pub fn option(self) -> &'static str {
    match self {
      Feature::OrPat
      | Feature::ConjPat
      | Feature::GuardPat
      | Feature::Do
      | Feature::LeadingBar
      | Feature::TrailingSemicolon
      | Feature::RebindEq => "allow-successor-ml",
      Feature::Vector => "allow-vector",
      Feature::StructureHere => "allow-structures-anywhere",
      Feature::SignatureHere => "allow-signatures-anywhere",
      Feature::FunctorHere => "allow-functors-anywhere",
    }
  }

  fn enabled(self, options: &Options) -> bool {
    match self {
      Feature::OrPat
      | Feature::ConjPat
      | Feature::GuardPat
      | Feature::Do
      | Feature::LeadingBar
      | Feature::TrailingSemicolon
      | Feature::RebindEq => options.allow_successor_ml,
      Feature::Vector => options.allow_vector,
      Feature::StructureHere => options.allow_structures_anywhere,
      Feature::SignatureHere => options.allow_signatures_anywhere,
      Feature::FunctorHere => options.allow_functors_anywhere,
    }
  }
}

impl fmt::Display for Feature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Feature::OrPat => "or-patterns",
      Feature::ConjPat => "conjunctive patterns",
      Feature::GuardPat => "guarded patterns",
      Feature::Do => "`do` declarations",
      Feature::LeadingBar => "a leading `|`",
      Feature::TrailingSemicolon => "a trailing `;`",
      Feature::Vector => "vectors",
      Feature::RebindEq => "rebinding `=`",
      Feature::StructureHere => "structure declarations below top level",
      Feature::SignatureHere => "signature declarations below top level",
      Feature::FunctorHere => "functor declarations below top level",
    };
    f.write_str(s)
  }
}

/// A saved parser position, with how many fixities and constructors had been declared.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
  idx: usize,
  fix: usize,
  cons: usize,
}

pub(crate) struct Parser<'a> {
  tokens: &'a [Token],
  idx: usize,
  end: Pos,
  state: &'a State,
  options: &'a Options,
  fix: sml_fixity::Env,
  cons: Vec<(Name, IdStatus)>,
}

impl<'a> Parser<'a> {
  pub(crate) fn new(tokens: &'a [Token], state: &'a State, options: &'a Options) -> Self {
    let end = tokens.last().map_or(0, |tok| tok.pos + tok.text.len());
    let fix = sml_fixity::Env::default();
    Self { tokens, idx: 0, end, state, options, fix, cons: Vec::new() }
  }

  pub(crate) fn peek(&self) -> Option<&'a Token> {
    self.tokens.get(self.idx)
  }

  pub(crate) fn peek_n(&self, n: usize) -> Option<&'a Token> {
    self.tokens.get(self.idx + n)
  }

  pub(crate) fn at(&self, kw: Kw) -> bool {
    self.at_n(0, kw)
  }

  pub(crate) fn at_n(&self, n: usize, kw: Kw) -> bool {
    self.peek_n(n).is_some_and(|tok| tok.kind == TokenKind::Kw(kw))
  }

  pub(crate) fn at_eof(&self) -> bool {
    self.idx >= self.tokens.len()
  }

  /// Returns where the current token starts, or the end of input.
  pub(crate) fn pos(&self) -> Pos {
    self.peek().map_or(self.end, |tok| tok.pos)
  }

  pub(crate) fn bump(&mut self) -> Option<&'a Token> {
    let ret = self.peek()?;
    self.idx += 1;
    Some(ret)
  }

  /// Consumes the keyword if it is next.
  pub(crate) fn eat_if(&mut self, kw: Kw) -> bool {
    let ret = self.at(kw);
    if ret {
      self.idx += 1;
    }
    ret
  }

  /// Consumes the keyword, which must be next.
  pub(crate) fn eat(&mut self, kw: Kw) -> Result<Pos> {
    let pos = self.pos();
    if self.eat_if(kw) { Ok(pos) } else { self.expected(Expected::Kw(kw)) }
  }

  /// Fails, expecting `e` at the current token.
  pub(crate) fn expected<T>(&self, e: Expected) -> Result<T> {
    match self.peek() {
      None => Err(self.error(ErrorKind::Incomplete(e))),
      Some(tok) => Err(self.error(ErrorKind::Expected(e, tok.text.clone()))),
    }
  }

  pub(crate) fn error(&self, kind: ErrorKind) -> Error {
    Error { pos: self.pos(), kind }
  }

  pub(crate) fn error_at(pos: Pos, kind: ErrorKind) -> Error {
    Error { pos, kind }
  }

  /// Fails if the feature is disabled.
  pub(crate) fn require(&self, feature: Feature) -> Result<()> {
    if feature.enabled(self.options) {
      Ok(())
    } else {
      Err(self.error(ErrorKind::FeatureDisabled(feature)))
    }
  }

  pub(crate) fn options(&self) -> &'a Options {
    self.options
  }

  /// Returns the infix status of the token, if it is a short vid declared infix.
  pub(crate) fn infix(&self, tok: &Token) -> Option<Infix> {
    let name = tok.vid_name()?;
    self.fixity(name.as_str()).and_then(Fixity::infix)
  }

  fn fixity(&self, name: &str) -> Option<Fixity> {
    self.fix.get(name).or_else(|| self.state.fixity(name))
  }

  pub(crate) fn declare_fixity(&mut self, name: Name, fixity: Fixity) {
    self.fix.insert(name, fixity);
  }

  pub(crate) fn declare_con(&mut self, name: Name, id_status: IdStatus) {
    self.cons.push((name, id_status));
  }

  /// Declares the constructors of an existing datatype, for `datatype t = datatype path`.
  pub(crate) fn declare_cons_of(&mut self, path: &Path) {
    let Some(cons) = self.state.dynamic_lookup(path, |b| &b.ty_env) else { return };
    self.cons.extend(cons.iter().map(|con| (con.clone(), IdStatus::Con)));
  }

  /// Returns whether the short name is a constructor or exception here.
  pub(crate) fn is_con(&self, name: &Name) -> bool {
    let status = self.cons.iter().rev().find_map(|(n, s)| (n == name).then_some(*s));
    status
      .or_else(|| self.state.id_status(&Path::one(name.clone())))
      .is_some_and(IdStatus::is_con)
  }

  pub(crate) fn mark(&self) -> Mark {
    Mark { idx: self.idx, fix: self.fix.mark(), cons: self.cons.len() }
  }

  /// Goes back to the mark, forgetting what was declared since.
  pub(crate) fn reset(&mut self, mark: Mark) {
    self.idx = mark.idx;
    self.fix.reset(mark.fix);
    self.cons.truncate(mark.cons);
  }

  /// Forgets what was declared between the two marks, as when leaving `local`.
  pub(crate) fn forget(&mut self, from: Mark, to: Mark) {
    self.fix.forget(from.fix..to.fix);
    self.cons.drain(from.cons..to.cons);
  }

  /// Forgets what was declared since the mark, without moving.
  pub(crate) fn leave_scope(&mut self, mark: Mark) {
    self.fix.reset(mark.fix);
    self.cons.truncate(mark.cons);
  }

  /// Runs `f`. If it fails softly, restores the parser and returns the error as the inner result.
  /// Errors for incomplete input or disabled features are never soft.
  pub(crate) fn attempt<T, F>(&mut self, f: F) -> Result<Result<T>>
  where
    F: FnOnce(&mut Self) -> Result<T>,
  {
    let mark = self.mark();
    match f(self) {
      Ok(x) => Ok(Ok(x)),
      Err(e) if e.is_soft() => {
        log::debug!("backtracking to {}: {e}", mark.idx);
        self.reset(mark);
        Ok(Err(e))
      }
      Err(e) => Err(e),
    }
  }

  pub(crate) fn finish(self) -> sml_fixity::Map {
    self.fix.to_map()
  }
}

/// Returns the further of two errors from alternatives that both failed.
pub(crate) fn further(a: Error, b: Error) -> Error {
  if b.pos > a.pos { b } else { a }
}
