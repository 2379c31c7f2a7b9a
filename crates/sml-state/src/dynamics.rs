//! Runtime values and dynamic environments.

use crate::{IdStatus, Namespace};
use crate::State;
use fast_hash::FxHashMap;
use sml_ast::{Lab, Located, Matcher, SCon, StrExp};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use str_util::Name;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Val {
  /// A special constant.
  SCon(SCon),
  /// A (possibly not yet applied) constructor.
  Con(Con),
  /// A record. Tuples are records.
  Record(BTreeMap<Lab, Val>),
  /// A vector.
  Vector(Rc<[Val]>),
  /// A reference cell, by address.
  Ref(usize),
  /// A user function.
  Closure(Rc<Closure>),
  /// A primitive function.
  Builtin(Builtin),
}

impl Val {
  /// Returns the unit value.
  #[must_use]
  pub fn unit() -> Self {
    Val::Record(BTreeMap::new())
  }

  /// Returns a tuple value.
  #[must_use]
  pub fn tuple<I>(vals: I) -> Self
  where
    I: IntoIterator<Item = Val>,
  {
    Val::Record(vals.into_iter().enumerate().map(|(idx, v)| (Lab::tuple(idx), v)).collect())
  }

  /// Returns a bool value.
  #[must_use]
  pub fn bool(b: bool) -> Self {
    Val::Con(Con::dat(if b { "true" } else { "false" }))
  }

  /// Returns the bool this is, if it is one.
  #[must_use]
  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Val::Con(Con { name, kind: ConKind::Dat, arg: None }) => match name.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
      },
      _ => None,
    }
  }

  /// Returns the elements of a pair.
  #[must_use]
  pub fn as_pair(&self) -> Option<(&Val, &Val)> {
    match self {
      Val::Record(rows) if rows.len() == 2 => {
        Some((rows.get(&Lab::Num(1))?, rows.get(&Lab::Num(2))?))
      }
      _ => None,
    }
  }

  /// Returns a list value.
  #[must_use]
  pub fn list(vals: Vec<Val>) -> Self {
    let mut ret = Val::Con(Con::dat("nil"));
    for v in vals.into_iter().rev() {
      let arg = Some(Box::new(Val::tuple([v, ret])));
      ret = Val::Con(Con { name: Name::new("::"), kind: ConKind::Dat, arg });
    }
    ret
  }

  /// Returns the elements if this is a list.
  #[must_use]
  pub fn as_list(&self) -> Option<Vec<&Val>> {
    let mut ret = Vec::new();
    let mut cur = self;
    loop {
      let Val::Con(Con { name, kind: ConKind::Dat, arg }) = cur else { return None };
      match (name.as_str(), arg) {
        ("nil", None) => return Some(ret),
        ("::", Some(arg)) => {
          let (hd, tl) = arg.as_pair()?;
          ret.push(hd);
          cur = tl;
        }
        _ => return None,
      }
    }
  }

  fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, atomic: bool) -> fmt::Result {
    if let Some(elems) = self.as_list() {
      f.write_str("[")?;
      for (idx, v) in elems.into_iter().enumerate() {
        if idx != 0 {
          f.write_str(", ")?;
        }
        v.fmt_prec(f, false)?;
      }
      return f.write_str("]");
    }
    match self {
      Val::SCon(scon) => fmt::Display::fmt(scon, f),
      Val::Con(Con { name, arg: None, .. }) => fmt::Display::fmt(name, f),
      Val::Con(Con { name, arg: Some(arg), .. }) => {
        if atomic {
          f.write_str("(")?;
        }
        write!(f, "{name} ")?;
        arg.fmt_prec(f, true)?;
        if atomic {
          f.write_str(")")?;
        }
        Ok(())
      }
      Val::Record(rows) => {
        let is_tuple = rows.len() != 1
          && rows.keys().enumerate().all(|(idx, lab)| *lab == Lab::tuple(idx));
        if is_tuple {
          f.write_str("(")?;
          for (idx, v) in rows.values().enumerate() {
            if idx != 0 {
              f.write_str(", ")?;
            }
            v.fmt_prec(f, false)?;
          }
          return f.write_str(")");
        }
        f.write_str("{")?;
        for (idx, (lab, v)) in rows.iter().enumerate() {
          if idx != 0 {
            f.write_str(", ")?;
          }
          write!(f, "{lab} = ")?;
          v.fmt_prec(f, false)?;
        }
        f.write_str("}")
      }
      Val::Vector(vs) => {
        f.write_str("#[")?;
        for (idx, v) in vs.iter().enumerate() {
          if idx != 0 {
            f.write_str(", ")?;
          }
          v.fmt_prec(f, false)?;
        }
        f.write_str("]")
      }
      Val::Ref(_) => f.write_str("ref"),
      Val::Closure(_) | Val::Builtin(_) => f.write_str("fn"),
    }
  }
}

impl fmt::Display for Val {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.fmt_prec(f, false)
  }
}

/// A constructed value, or an unapplied constructor.
#[derive(Debug, Clone)]
pub struct Con {
  /// The constructor name.
  pub name: Name,
  /// Which kind of constructor.
  pub kind: ConKind,
  /// The argument, if applied.
  pub arg: Option<Box<Val>>,
}

impl Con {
  /// Returns a nullary datatype constructor.
  #[must_use]
  pub fn dat(name: &str) -> Self {
    Self { name: Name::new(name), kind: ConKind::Dat, arg: None }
  }

  /// Returns whether the two are the same constructor, ignoring arguments.
  #[must_use]
  pub fn same_con(&self, other: &Con) -> bool {
    match (self.kind, other.kind) {
      (ConKind::Dat, ConKind::Dat) => self.name == other.name,
      (ConKind::Exn(a), ConKind::Exn(b)) => a == b,
      (ConKind::Dat, ConKind::Exn(_)) | (ConKind::Exn(_), ConKind::Dat) => false,
    }
  }
}

/// A kind of constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConKind {
  /// A datatype constructor, identified by name.
  Dat,
  /// An exception constructor, identified by the stamp made when its declaration was evaluated.
  Exn(u32),
}

/// A closure.
///
/// The functions bound by the same `val rec` are kept by name rather than by a cycle of `Rc`s,
/// and re-bound each time one is applied.
#[derive(Debug)]
pub struct Closure {
  /// The captured scope.
  pub env: Rc<State>,
  /// The functions bound together with this one by `val rec`.
  pub rec: Rc<[(Name, Rc<Matcher>)]>,
  /// The body.
  pub matcher: Rc<Matcher>,
}

/// A primitive function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Builtin {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  RealDiv,
  Neg,
  Abs,
  Lt,
  Le,
  Gt,
  Ge,
  Eq,
  Neq,
  Concat,
  Ref,
  Deref,
  Assign,
  Not,
  Size,
  Chr,
  Ord,
  Real,
  Floor,
}

impl Builtin {
  /// Every builtin with the name it is bound to in the std basis.
  pub const ALL: [(Builtin, &'static str); 24] = [
    (Builtin::Add, "+"),
    (Builtin::Sub, "-"),
    (Builtin::Mul, "*"),
    (Builtin::Div, "div"),
    (Builtin::Mod, "mod"),
    (Builtin::RealDiv, "/"),
    (Builtin::Neg, "~"),
    (Builtin::Abs, "abs"),
    (Builtin::Lt, "<"),
    (Builtin::Le, "<="),
    (Builtin::Gt, ">"),
    (Builtin::Ge, ">="),
    (Builtin::Eq, "="),
    (Builtin::Neq, "<>"),
    (Builtin::Concat, "^"),
    (Builtin::Ref, "ref"),
    (Builtin::Deref, "!"),
    (Builtin::Assign, ":="),
    (Builtin::Not, "not"),
    (Builtin::Size, "size"),
    (Builtin::Chr, "chr"),
    (Builtin::Ord, "ord"),
    (Builtin::Real, "real"),
    (Builtin::Floor, "floor"),
  ];
}

/// A dynamic interface: the names a signature exposes at runtime.
#[derive(Debug, Clone, Default)]
pub struct DynamicInterface {
  /// Types, with their constructors.
  pub ty_env: FxHashMap<Name, Vec<Name>>,
  /// Values.
  pub val_env: FxHashMap<Name, IdStatus>,
  /// Structures.
  pub str_env: FxHashMap<Name, DynamicInterface>,
}

impl DynamicInterface {
  /// Adds everything in `other` to this, overwriting.
  pub fn extend(&mut self, other: DynamicInterface) {
    self.ty_env.extend(other.ty_env);
    self.val_env.extend(other.val_env);
    self.str_env.extend(other.str_env);
  }
}

/// A functor closure.
#[derive(Debug)]
pub struct Functor {
  /// The parameter name.
  pub param: Name,
  /// The interface the argument is narrowed to.
  pub interface: DynamicInterface,
  /// The body.
  pub body: Located<StrExp>,
  /// The scope the functor was declared in.
  pub env: Rc<State>,
}

/// A dynamic basis: the runtime environments of a scope or a structure.
#[derive(Debug, Clone, Default)]
pub struct DynamicBasis {
  /// Types, with their constructors.
  pub ty_env: FxHashMap<Name, Vec<Name>>,
  /// Values.
  pub val_env: FxHashMap<Name, (Val, IdStatus)>,
  /// Structures.
  pub str_env: FxHashMap<Name, DynamicBasis>,
  /// Signatures.
  pub sig_env: FxHashMap<Name, DynamicInterface>,
  /// Functors.
  pub fun_env: FxHashMap<Name, Rc<Functor>>,
}

impl DynamicBasis {
  /// Returns whether this binds the name.
  #[must_use]
  pub fn has(&self, ns: Namespace, name: &Name) -> bool {
    match ns {
      Namespace::Ty => self.ty_env.contains_key(name),
      Namespace::Val => self.val_env.contains_key(name),
      Namespace::Str => self.str_env.contains_key(name),
      Namespace::Sig => self.sig_env.contains_key(name),
      Namespace::Fun => self.fun_env.contains_key(name),
    }
  }

  /// Adds everything in `other` to this, overwriting.
  pub fn extend(&mut self, other: DynamicBasis) {
    self.ty_env.extend(other.ty_env);
    self.val_env.extend(other.val_env);
    self.str_env.extend(other.str_env);
    self.sig_env.extend(other.sig_env);
    self.fun_env.extend(other.fun_env);
  }

  /// Returns whether this binds nothing.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.ty_env.is_empty()
      && self.val_env.is_empty()
      && self.str_env.is_empty()
      && self.sig_env.is_empty()
      && self.fun_env.is_empty()
  }

  /// Returns the structure at `names` inside this.
  #[must_use]
  pub fn get_str(&self, names: &[Name]) -> Option<&DynamicBasis> {
    let mut ret = self;
    for name in names {
      ret = ret.str_env.get(name)?;
    }
    Some(ret)
  }

  /// Returns what of this the interface exposes, with the interface's identifier statuses.
  /// Names the interface has but this lacks are left out.
  #[must_use]
  pub fn restrict(&self, interface: &DynamicInterface) -> DynamicBasis {
    let mut ret = DynamicBasis::default();
    for (name, cons) in &interface.ty_env {
      if self.ty_env.contains_key(name) {
        ret.ty_env.insert(name.clone(), cons.clone());
      }
    }
    for (name, &id_status) in &interface.val_env {
      if let Some((val, _)) = self.val_env.get(name) {
        ret.val_env.insert(name.clone(), (val.clone(), id_status));
      }
    }
    for (name, inner) in &interface.str_env {
      if let Some(str) = self.str_env.get(name) {
        ret.str_env.insert(name.clone(), str.restrict(inner));
      }
    }
    ret
  }
}
