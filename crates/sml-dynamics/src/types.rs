//! Types for the stack machine.

use crate::error::Error;
use crate::mem::Mem;
use fast_hash::FxHashMap;
use sml_ast::{Dec, Exp, Lab, Located, Matcher, Pat, Pos, StrBind, StrExp, ValBind};
use sml_state::{DynamicBasis, DynamicInterface, Functor, IdStatus, State, Val, Warning};
use std::collections::BTreeMap;
use std::rc::Rc;
use str_util::Name;

pub(crate) type ValEnv = FxHashMap<Name, (Val, IdStatus)>;

/// What to do next.
#[derive(Debug)]
pub(crate) enum Step {
  Exp(Located<Exp>),
  Val(Val),
  /// An exception value propagating up.
  Raise(Val),
  Dec(Located<Dec>),
  StrExp(Located<StrExp>),
  /// A declaration or structure expression finished.
  Basis(DynamicBasis),
}

/// A step with no frames left to return to.
#[derive(Debug)]
pub(crate) enum Done {
  Val(Val),
  Raise(Val),
  Basis(DynamicBasis),
}

/// Why matching stopped early.
#[derive(Debug)]
pub(crate) enum Escape {
  Raise(Val),
  Error(Error),
}

impl From<Error> for Escape {
  fn from(e: Error) -> Self {
    Escape::Error(e)
  }
}

/// Work to resume once the thing on top of it is done, and the scope to resume it in.
#[derive(Debug)]
pub(crate) struct Frame {
  pub(crate) env: Rc<State>,
  pub(crate) pos: Pos,
  pub(crate) kind: FrameKind,
}

/// The `Vec`s of things still to do are reversed, so the next one is popped.
#[derive(Debug)]
pub(crate) enum FrameKind {
  Record(BTreeMap<Lab, Val>, Lab, Vec<(Lab, Located<Exp>)>),
  Vector(Vec<Val>, Vec<Located<Exp>>),
  AppFunc(Located<Exp>),
  AppArg(Val),
  Raise,
  Handle(Matcher),
  Let(Located<Exp>),
  ValBind(ValEnv, Located<Pat>, Vec<ValBind>),
  DecSeq(DynamicBasis, Vec<Located<Dec>>),
  Local(Located<Dec>),
  /// The types the `abstype` exports.
  Abstype(Vec<Name>),
  StrBind(FxHashMap<Name, DynamicBasis>, Name, Vec<StrBind>),
  Ascription(DynamicInterface),
  FunctorArg(Name, Rc<Functor>),
  StrLet(Located<StrExp>),
}

#[derive(Debug)]
pub(crate) struct St<'m> {
  pub(crate) env: Rc<State>,
  pub(crate) frames: Vec<Frame>,
  pub(crate) mem: &'m mut Mem,
  pub(crate) warnings: Vec<Warning>,
}

impl<'m> St<'m> {
  pub(crate) fn new(env: Rc<State>, mem: &'m mut Mem) -> Self {
    Self { env, frames: Vec::new(), mem, warnings: Vec::new() }
  }

  pub(crate) fn push(&mut self, pos: Pos, kind: FrameKind) {
    let env = Rc::clone(&self.env);
    self.frames.push(Frame { env, pos, kind });
  }

  pub(crate) fn warn<S>(&mut self, pos: Pos, message: S)
  where
    S: Into<String>,
  {
    let w = Warning::new(pos, message);
    log::debug!("dynamics warning: {w}");
    self.warnings.push(w);
  }
}

/// Returns a new scope inside `env` holding the bindings.
pub(crate) fn layer(env: &Rc<State>, basis: DynamicBasis) -> Rc<State> {
  let mut ret = State::nested(env);
  ret.dynamics = basis;
  Rc::new(ret)
}

pub(crate) fn layer_vals(env: &Rc<State>, val_env: ValEnv) -> Rc<State> {
  if val_env.is_empty() {
    return Rc::clone(env);
  }
  layer(env, DynamicBasis { val_env, ..DynamicBasis::default() })
}
