//! Errors.

use crate::generalize::{free_vars_ordered, pretty_name};
use fast_hash::{FxHashMap, FxHashSet};
use sml_ast::{Pos, TyVar};
use sml_state::std_basis::Prim;
use sml_state::{Ty, TyVarKind, fresh_counter};
use std::fmt;
use str_util::Name;

/// An error from elaboration.
#[derive(Debug)]
pub struct Error {
  pub(crate) pos: Pos,
  pub(crate) kind: ErrorKind,
}

impl Error {
  pub(crate) fn new(pos: Pos, kind: ErrorKind) -> Self {
    Self { pos, kind }
  }

  /// Returns where the error is.
  #[must_use]
  pub fn pos(&self) -> Pos {
    self.pos
  }

  /// Returns what kind of error this is.
  #[must_use]
  pub fn kind(&self) -> &ErrorKind {
    &self.kind
  }

  /// Returns whether this error is a known gap in the elaborator rather than a problem with the
  /// program.
  #[must_use]
  pub fn is_internal(&self) -> bool {
    matches!(
      self.kind,
      ErrorKind::Internal(_) | ErrorKind::Unsupported(_) | ErrorKind::NoStatics(_, _)
    )
  }

  /// Returns whether this error is a construct the elaborator does not support, after which the
  /// program may still be run without its static information.
  #[must_use]
  pub fn is_unsupported(&self) -> bool {
    matches!(self.kind, ErrorKind::Unsupported(_) | ErrorKind::NoStatics(_, _))
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.kind.fmt(f)
  }
}

/// A kind of error.
#[derive(Debug)]
pub enum ErrorKind {
  /// A name was not defined.
  Undefined(Item, String),
  /// A signature required something the structure does not have.
  Unimplemented(Item, Name),
  /// Two types that should be the same are not.
  IncompatibleTys(Ty, Ty),
  /// A type variable occurs in the type it would be bound to.
  Circularity(TyVar, Ty),
  /// A type that does not admit equality was used where one must.
  NotEquality(Ty),
  /// A type was given the wrong number of arguments, or has a different number of them than its
  /// specification.
  ArityMismatch(String, usize, usize),
  /// A value's type does not match its specification.
  ValueMismatch(Name, Ty, Ty),
  /// A type does not match its specification.
  TypeMismatch(Name, Ty, Ty),
  /// A datatype does not have the constructors its specification does.
  DatatypeMismatch(Name),
  /// An identifier has a different status than its specification.
  IdStatusMismatch(Name),
  /// A name was bound twice in one pattern or one declaration.
  Duplicate(Item, Name),
  /// A constructor pattern used a value variable.
  NotCon(String),
  /// An exception copy named something other than an exception.
  NotExn(String),
  /// A constructor was used without the argument it needs.
  ConNeedsArg(String),
  /// A nullary constructor was given an argument.
  ConNoArg(String),
  /// The alternatives of an or-pattern bind different names.
  OrPatBindings(Name),
  /// A type variable was used outside of the declaration binding it.
  UnboundTyVar(TyVar),
  /// A `where type` named a type that is not flexible in the signature.
  CannotRealize(String),
  /// A defect, or a deliberate gap in the elaborator.
  Internal(&'static str),
  /// A construct the elaborator does not handle. The dynamics may still run the program.
  Unsupported(&'static str),
  /// A name is bound, but by a declaration that was not elaborated.
  NoStatics(Item, String),
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorKind::Undefined(item, name) => write!(f, "Undefined {item} `{name}`"),
      ErrorKind::Unimplemented(item, name) => write!(f, "Unimplemented {item} `{name}`"),
      ErrorKind::IncompatibleTys(want, got) => {
        let [want, got] = presentable([want, got]);
        write!(f, "Type mismatch: expected `{want}`, found `{got}`")
      }
      ErrorKind::Circularity(tv, ty) => {
        let [tv, ty] = presentable([&Ty::Var(tv.clone()), ty]);
        write!(f, "Circular type: `{tv}` occurs in `{ty}`")
      }
      ErrorKind::NotEquality(ty) => {
        let [ty] = presentable([ty]);
        write!(f, "`{ty}` does not admit equality")
      }
      ErrorKind::ArityMismatch(name, want, got) => {
        write!(f, "Arity mismatch for type `{name}`: expected {want}, found {got}")
      }
      ErrorKind::ValueMismatch(name, want, got) => {
        let [want, got] = presentable([want, got]);
        write!(f, "Type mismatch for value `{name}`: signature has `{want}`, structure has `{got}`")
      }
      ErrorKind::TypeMismatch(name, want, got) => write!(
        f,
        "Type mismatch for type `{name}`: signature has `{want}`, structure has `{got}`"
      ),
      ErrorKind::DatatypeMismatch(name) => {
        write!(f, "Datatype mismatch for type `{name}`: the constructors differ")
      }
      ErrorKind::IdStatusMismatch(name) => write!(f, "Identifier status mismatch for `{name}`"),
      ErrorKind::Duplicate(item, name) => write!(f, "Duplicate {item} `{name}`"),
      ErrorKind::NotCon(path) => write!(f, "`{path}` is not a constructor"),
      ErrorKind::NotExn(path) => write!(f, "`{path}` is not an exception"),
      ErrorKind::ConNeedsArg(path) => write!(f, "Constructor `{path}` requires an argument"),
      ErrorKind::ConNoArg(path) => write!(f, "Constructor `{path}` does not take an argument"),
      ErrorKind::OrPatBindings(name) => {
        write!(f, "`{name}` is not bound by every alternative of the or-pattern")
      }
      ErrorKind::UnboundTyVar(tv) => write!(f, "Unbound type variable `{tv}`"),
      ErrorKind::CannotRealize(path) => {
        write!(f, "Cannot realize `{path}`: it is not a flexible type of the signature")
      }
      ErrorKind::Internal(s) | ErrorKind::Unsupported(s) => f.write_str(s),
      ErrorKind::NoStatics(item, name) => write!(f, "{item} `{name}` has no static information"),
    }
  }
}

/// Returns the types with the variables made during inference renamed to `'a`, `'b`, and so on.
/// Overloaded ones are shown as `int`, what they default to.
fn presentable<const N: usize>(tys: [&Ty; N]) -> [Ty; N] {
  let mut free = Vec::new();
  for ty in tys {
    free_vars_ordered(ty, &mut free);
  }
  let mut used: FxHashSet<_> =
    free.iter().filter(|tv| fresh_counter(tv).is_none()).cloned().collect();
  let mut map = FxHashMap::default();
  let mut idx = 0usize;
  for tv in free {
    if fresh_counter(&tv).is_none() {
      continue;
    }
    let ty = match TyVarKind::of(&tv) {
      TyVarKind::Num | TyVarKind::Ord => Prim::Int.ty(),
      kind => {
        let prefix = if kind.is_equality() { "''" } else { "'" };
        loop {
          let new = TyVar::new(Name::new(format!("{prefix}{}", pretty_name(idx))));
          idx += 1;
          if used.insert(new.clone()) {
            break Ty::Var(new);
          }
        }
      }
    };
    map.insert(tv, ty);
  }
  tys.map(|ty| ty.subst(&map))
}

/// A kind of named thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
  /// A value.
  Val,
  /// A type.
  Ty,
  /// A structure.
  Str,
  /// A signature.
  Sig,
  /// A functor.
  Functor,
  /// A structure being looked up, as in `open` or a path.
  Module,
}

impl fmt::Display for Item {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Item::Val => f.write_str("value"),
      Item::Ty => f.write_str("type"),
      Item::Str => f.write_str("structure"),
      Item::Sig => f.write_str("signature"),
      Item::Functor => f.write_str("functor"),
      Item::Module => f.write_str("module"),
    }
  }
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
