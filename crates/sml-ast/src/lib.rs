//! Abstract syntax trees.
//!
//! Every tree is immutable after the parser builds it. [`simplify`] builds new trees using only
//! the core forms.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

mod display;
pub mod simplify;

use std::fmt;
use str_util::Name;

pub use sml_syntax::{Pos, SCon};

/// A value with a source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
  /// The value.
  pub val: T,
  /// Where it starts.
  pub pos: Pos,
}

impl<T> Located<T> {
  /// Returns a new located value.
  pub fn new(val: T, pos: Pos) -> Self {
    Self { val, pos }
  }

  /// Wraps another value with the same position as this.
  pub fn wrap<U>(&self, val: U) -> Located<U> {
    Located { val, pos: self.pos }
  }
}

/// A record/tuple label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lab {
  /// A named label.
  Name(Name),
  /// A numeric label.
  Num(usize),
}

impl fmt::Display for Lab {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Name(name) => name.fmt(f),
      Self::Num(n) => n.fmt(f),
    }
  }
}

impl Lab {
  /// Return the numeric label for one greater than the number passed.
  #[must_use]
  pub fn tuple(idx: usize) -> Self {
    Self::Num(idx + 1)
  }
}

/// A long identifier, a non-empty sequence of names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
  prefix: Vec<Name>,
  last: Name,
}

impl Path {
  /// Returns a new Path.
  pub fn new<I>(prefix: I, last: Name) -> Self
  where
    I: IntoIterator<Item = Name>,
  {
    Self { prefix: prefix.into_iter().collect(), last }
  }

  /// Returns a Path with no prefix.
  #[must_use]
  pub fn one(name: Name) -> Self {
    Self::new(Vec::new(), name)
  }

  /// Returns the last name in the Path.
  ///
  /// For `Foo.Bar.quz` this would return `quz`.
  #[must_use]
  pub fn last(&self) -> &Name {
    &self.last
  }

  /// Returns the prefix of the Path.
  ///
  /// For `Foo.Bar.quz` this would return `[Foo, Bar]`.
  #[must_use]
  pub fn prefix(&self) -> &[Name] {
    &self.prefix
  }

  /// Return an iterator over all the Names in order.
  pub fn all_names(&self) -> impl Iterator<Item = &Name> {
    self.prefix.iter().chain(std::iter::once(&self.last))
  }
}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for name in &self.prefix {
      name.fmt(f)?;
      f.write_str(".")?;
    }
    self.last.fmt(f)
  }
}

/// A type variable, like `'a` or `''b`. The name includes the primes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TyVar(Name);

impl TyVar {
  /// Returns a new type variable.
  #[must_use]
  pub fn new(name: Name) -> Self {
    Self(name)
  }

  /// Returns the name, primes included.
  #[must_use]
  pub fn as_name(&self) -> &Name {
    &self.0
  }

  /// Returns whether this is an equality type variable.
  #[must_use]
  pub fn is_equality(&self) -> bool {
    self.0.as_str().starts_with("''")
  }
}

impl fmt::Display for TyVar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

// core //

/// An expression.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Exp {
  SCon(SCon),
  /// The bool is whether this was prefixed with `op`.
  Path(Path, bool),
  Record(Vec<(Lab, Located<Exp>)>),
  /// `#lab`
  Selector(Lab),
  /// requires `vec.len() != 1`
  Tuple(Vec<Located<Exp>>),
  List(Vec<Located<Exp>>),
  Vector(Vec<Located<Exp>>),
  /// requires `vec.len() >= 2`
  Seq(Vec<Located<Exp>>),
  Let(Box<Located<Dec>>, Box<Located<Exp>>),
  App(Box<Located<Exp>>, Box<Located<Exp>>),
  Typed(Box<Located<Exp>>, Located<Ty>),
  Andalso(Box<Located<Exp>>, Box<Located<Exp>>),
  Orelse(Box<Located<Exp>>, Box<Located<Exp>>),
  Handle(Box<Located<Exp>>, Matcher),
  Raise(Box<Located<Exp>>),
  If(Box<Located<Exp>>, Box<Located<Exp>>, Box<Located<Exp>>),
  While(Box<Located<Exp>>, Box<Located<Exp>>),
  Case(Box<Located<Exp>>, Matcher),
  Fn(Matcher),
}

impl Exp {
  /// Returns the unit expression `()`.
  #[must_use]
  pub fn unit() -> Self {
    Exp::Tuple(Vec::new())
  }

  /// Returns a path expression for a short name.
  #[must_use]
  pub fn name(s: &str) -> Self {
    Exp::Path(Path::one(Name::new(s)), false)
  }
}

/// A sequence of arms, as in `fn`, `case`, and `handle`.
pub type Matcher = Vec<Arm>;

/// A single arm `pat => exp`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
  /// The pattern.
  pub pat: Located<Pat>,
  /// The expression.
  pub exp: Located<Exp>,
}

/// A pattern.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Pat {
  Wild,
  SCon(SCon),
  /// A variable or a nullary constructor, decided by the statics. The bool is whether this was
  /// prefixed with `op`.
  Path(Path, bool),
  /// A constructor applied to an argument.
  Con(Path, Box<Located<Pat>>),
  Record {
    rows: Vec<(Lab, Located<Pat>)>,
    /// Whether there was a `...`.
    rest: bool,
  },
  /// requires `vec.len() != 1`
  Tuple(Vec<Located<Pat>>),
  List(Vec<Located<Pat>>),
  Vector(Vec<Located<Pat>>),
  Typed(Box<Located<Pat>>, Located<Ty>),
  /// A layered pattern `vid [: ty] as pat`.
  As(Name, Option<Located<Ty>>, Box<Located<Pat>>),
  /// A conjunctive pattern `pat as pat`.
  Conj(Box<Located<Pat>>, Box<Located<Pat>>),
  /// A disjunctive pattern `pat | ... | pat`. requires `vec.len() >= 2`
  Or(Vec<Located<Pat>>),
  /// A guarded pattern `pat with pat = exp`.
  Guard(Box<Located<Pat>>, Box<Located<Pat>>, Box<Located<Exp>>),
}

impl Pat {
  /// Returns the unit pattern `()`.
  #[must_use]
  pub fn unit() -> Self {
    Pat::Tuple(Vec::new())
  }

  /// Returns a path pattern for a short name.
  #[must_use]
  pub fn name(s: &str) -> Self {
    Pat::Path(Path::one(Name::new(s)), false)
  }
}

/// A type.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Ty {
  Var(TyVar),
  Record(Vec<(Lab, Located<Ty>)>),
  /// requires `vec.len() >= 2`
  Tuple(Vec<Located<Ty>>),
  Con(Vec<Located<Ty>>, Path),
  Fn(Box<Located<Ty>>, Box<Located<Ty>>),
}

/// A declaration. Module-level declarations are included, since they are only distinguished from
/// core ones by where they may appear.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Dec {
  Val(Vec<TyVar>, Vec<ValBind>),
  Fun(Vec<TyVar>, Vec<FunBind>),
  Ty(Vec<TyBind>),
  /// The `TyBind`s are from `withtype`.
  Datatype(Vec<DatBind>, Vec<TyBind>),
  DatatypeCopy(Name, Path),
  /// The `TyBind`s are from `withtype`.
  Abstype(Vec<DatBind>, Vec<TyBind>, Box<Located<Dec>>),
  Exception(Vec<ExBind>),
  Local(Box<Located<Dec>>, Box<Located<Dec>>),
  Open(Vec<Path>),
  Seq(Vec<Located<Dec>>),
  Infix(u16, Vec<Name>),
  Infixr(u16, Vec<Name>),
  Nonfix(Vec<Name>),
  /// `do exp`, from successor ML.
  Do(Box<Located<Exp>>),
  Structure(Vec<StrBind>),
  Signature(Vec<SigBind>),
  Functor(Vec<FunctorBind>),
}

impl Dec {
  /// Returns the empty declaration.
  #[must_use]
  pub fn empty() -> Self {
    Dec::Seq(Vec::new())
  }
}

/// A value binding `[rec] pat = exp`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValBind {
  /// Whether this is `rec`.
  pub rec: bool,
  /// The pattern.
  pub pat: Located<Pat>,
  /// The expression.
  pub exp: Located<Exp>,
}

/// A function binding: every clause of one function in a `fun`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunBind {
  /// The function name.
  pub name: Name,
  /// The clauses.
  pub clauses: Vec<FunClause>,
}

/// One `f pat1 ... patn [: ty] = exp` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FunClause {
  /// The argument patterns. An infix clause `a f b` has one tuple argument.
  pub pats: Vec<Located<Pat>>,
  /// The optional result type.
  pub ret_ty: Option<Located<Ty>>,
  /// The body.
  pub body: Located<Exp>,
}

/// A type binding `tyvarseq name = ty`.
#[derive(Debug, Clone, PartialEq)]
pub struct TyBind {
  /// The type variables.
  pub ty_vars: Vec<TyVar>,
  /// The name.
  pub name: Name,
  /// The definition.
  pub ty: Located<Ty>,
}

/// A datatype binding `tyvarseq name = conbind | ... | conbind`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatBind {
  /// The type variables.
  pub ty_vars: Vec<TyVar>,
  /// The name.
  pub name: Name,
  /// The constructors.
  pub cons: Vec<ConBind>,
}

/// A constructor binding `name [of ty]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConBind {
  /// The name.
  pub name: Name,
  /// The argument type.
  pub ty: Option<Located<Ty>>,
}

/// An exception binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ExBind {
  /// `name [of ty]`
  New(Name, Option<Located<Ty>>),
  /// `name = path`
  Copy(Name, Path),
}

// modules //

/// A structure binding `name = strexp`. An ascription `name : sig = strexp` is folded into the
/// structure expression.
#[derive(Debug, Clone, PartialEq)]
pub struct StrBind {
  /// The name.
  pub name: Name,
  /// The structure expression.
  pub str_exp: Located<StrExp>,
}

/// A signature binding `name = sigexp`.
#[derive(Debug, Clone, PartialEq)]
pub struct SigBind {
  /// The name.
  pub name: Name,
  /// The signature expression.
  pub sig_exp: Located<SigExp>,
}

/// A functor binding `name (param : sig) = strexp`.
///
/// The derived form `name (spec) = strexp` binds a parameter named [`FunctorBind::SUGAR_PARAM`]
/// and opens it in the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctorBind {
  /// The functor name.
  pub name: Name,
  /// The parameter name.
  pub param: Name,
  /// The parameter signature.
  pub param_sig: Located<SigExp>,
  /// The body.
  pub body: Located<StrExp>,
}

impl FunctorBind {
  /// The parameter name used by the derived form. It cannot be written in source.
  pub const SUGAR_PARAM: &'static str = "_param";
}

/// A structure expression.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum StrExp {
  Struct(Box<Located<Dec>>),
  Path(Path),
  Ascription(Box<Located<StrExp>>, Ascription, Box<Located<SigExp>>),
  /// Functor application.
  App(Name, Box<Located<StrExp>>),
  Let(Box<Located<Dec>>, Box<Located<StrExp>>),
}

/// A kind of ascription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ascription {
  /// `:`
  Transparent,
  /// `:>`
  Opaque,
}

/// A signature expression.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SigExp {
  Spec(Box<Located<Spec>>),
  Name(Name),
  /// `sigexp where type tyvarseq path = ty`
  Where(Box<Located<SigExp>>, Vec<TyVar>, Path, Located<Ty>),
}

/// A specification, the body of a signature.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Spec {
  Val(Vec<ValDesc>),
  Ty(Vec<TyDesc>),
  EqTy(Vec<TyDesc>),
  /// The derived form `type tyvarseq name = ty`.
  TyAlias(Vec<TyBind>),
  Datatype(Vec<DatBind>),
  DatatypeCopy(Name, Path),
  Exception(Vec<ExDesc>),
  Str(Vec<StrDesc>),
  Include(Box<Located<SigExp>>),
  Seq(Vec<Located<Spec>>),
  Sharing(Box<Located<Spec>>, SharingKind, Vec<Path>),
}

impl Spec {
  /// Returns the empty specification.
  #[must_use]
  pub fn empty() -> Self {
    Spec::Seq(Vec::new())
  }
}

/// A kind of sharing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingKind {
  /// `sharing type`
  Regular,
  /// `sharing` of structures.
  Derived,
}

/// A value description `name : ty`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValDesc {
  /// The name.
  pub name: Name,
  /// The type.
  pub ty: Located<Ty>,
}

/// A type description `tyvarseq name`.
#[derive(Debug, Clone, PartialEq)]
pub struct TyDesc {
  /// The type variables.
  pub ty_vars: Vec<TyVar>,
  /// The name.
  pub name: Name,
}

/// An exception description `name [of ty]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExDesc {
  /// The name.
  pub name: Name,
  /// The argument type.
  pub ty: Option<Located<Ty>>,
}

/// A structure description `name : sigexp`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrDesc {
  /// The name.
  pub name: Name,
  /// The signature expression.
  pub sig_exp: Located<SigExp>,
}
