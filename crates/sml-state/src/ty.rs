//! Semantic types.

use fast_hash::{FxHashMap, FxHashSet};
use sml_ast::{Lab, TyVar};
use std::collections::BTreeMap;
use std::fmt;
use str_util::Name;

/// A type name, made fresh by every datatype declaration and opaque ascription.
///
/// Two type names are the same iff their stamps are.
#[derive(Debug, Clone)]
pub struct TyName {
  /// The name as written, for display.
  pub name: Name,
  /// The unique stamp.
  pub stamp: u32,
  /// Whether types built with this admit equality (given their arguments do).
  pub equality: bool,
}

impl PartialEq for TyName {
  fn eq(&self, other: &Self) -> bool {
    self.stamp == other.stamp
  }
}

impl Eq for TyName {}

/// A type.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
  /// A type variable.
  Var(TyVar),
  /// A record. A flexible record `{a : t, ...}` has a row variable, which the statics bind to
  /// the complete record once it is known.
  Record(BTreeMap<Lab, Ty>, Option<TyVar>),
  /// A function.
  Fn(Box<Ty>, Box<Ty>),
  /// A type constructor applied to arguments.
  Con(Vec<Ty>, TyName),
}

impl Ty {
  /// Returns the type `unit`.
  #[must_use]
  pub fn unit() -> Self {
    Ty::Record(BTreeMap::new(), None)
  }

  /// Returns a tuple type.
  #[must_use]
  pub fn tuple(tys: Vec<Ty>) -> Self {
    Ty::Record(tys.into_iter().enumerate().map(|(idx, ty)| (Lab::tuple(idx), ty)).collect(), None)
  }

  /// Returns a function type.
  #[must_use]
  pub fn fun(param: Ty, res: Ty) -> Self {
    Ty::Fn(Box::new(param), Box::new(res))
  }

  /// Returns a type variable type.
  #[must_use]
  pub fn var(name: &str) -> Self {
    Ty::Var(TyVar::new(Name::new(name)))
  }

  /// Adds the free type variables (and row variables) of this to `ac`.
  pub fn free_vars(&self, ac: &mut FxHashSet<TyVar>) {
    match self {
      Ty::Var(tv) => {
        ac.insert(tv.clone());
      }
      Ty::Record(rows, rest) => {
        for ty in rows.values() {
          ty.free_vars(ac);
        }
        if let Some(rv) = rest {
          ac.insert(rv.clone());
        }
      }
      Ty::Fn(a, b) => {
        a.free_vars(ac);
        b.free_vars(ac);
      }
      Ty::Con(args, _) => {
        for ty in args {
          ty.free_vars(ac);
        }
      }
    }
  }

  /// Substitutes variables. A substituted row variable splices in the rows it maps to.
  #[must_use]
  pub fn subst(&self, map: &FxHashMap<TyVar, Ty>) -> Ty {
    match self {
      Ty::Var(tv) => map.get(tv).cloned().unwrap_or_else(|| self.clone()),
      Ty::Record(rows, rest) => {
        let mut rows: BTreeMap<_, _> =
          rows.iter().map(|(lab, ty)| (lab.clone(), ty.subst(map))).collect();
        let rest = match rest.as_ref().map(|rv| (rv, map.get(rv))) {
          None => None,
          Some((rv, None | Some(Ty::Fn(..) | Ty::Con(..)))) => Some(rv.clone()),
          Some((_, Some(Ty::Var(new)))) => Some(new.clone()),
          Some((_, Some(Ty::Record(more, more_rest)))) => {
            for (lab, ty) in more {
              rows.entry(lab.clone()).or_insert_with(|| ty.clone());
            }
            more_rest.clone()
          }
        };
        Ty::Record(rows, rest)
      }
      Ty::Fn(a, b) => Ty::fun(a.subst(map), b.subst(map)),
      Ty::Con(args, name) => Ty::Con(args.iter().map(|ty| ty.subst(map)).collect(), name.clone()),
    }
  }

  /// Replaces type names by the type functions the realisation gives them.
  #[must_use]
  pub fn realize(&self, phi: &Realisation) -> Ty {
    match self {
      Ty::Var(_) => self.clone(),
      Ty::Record(rows, rest) => Ty::Record(
        rows.iter().map(|(lab, ty)| (lab.clone(), ty.realize(phi))).collect(),
        rest.clone(),
      ),
      Ty::Fn(a, b) => Ty::fun(a.realize(phi), b.realize(phi)),
      Ty::Con(args, name) => {
        let args: Vec<_> = args.iter().map(|ty| ty.realize(phi)).collect();
        match phi.get(&name.stamp) {
          Some(ty_fn) => ty_fn.apply(&args),
          None => Ty::Con(args, name.clone()),
        }
      }
    }
  }

  /// Returns the components if this is a tuple type of at least 2 components.
  #[must_use]
  pub fn as_tuple(&self) -> Option<Vec<&Ty>> {
    let Ty::Record(rows, None) = self else { return None };
    if rows.len() < 2 {
      return None;
    }
    rows
      .iter()
      .enumerate()
      .map(|(idx, (lab, ty))| (*lab == Lab::tuple(idx)).then_some(ty))
      .collect()
  }

  fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, prec: Prec) -> fmt::Result {
    if let Some(tys) = self.as_tuple() {
      if prec >= Prec::Arg {
        f.write_str("(")?;
      }
      for (idx, ty) in tys.into_iter().enumerate() {
        if idx != 0 {
          f.write_str(" * ")?;
        }
        ty.fmt_prec(f, Prec::Arg)?;
      }
      if prec >= Prec::Arg {
        f.write_str(")")?;
      }
      return Ok(());
    }
    match self {
      Ty::Var(tv) => fmt::Display::fmt(tv, f),
      Ty::Record(rows, rest) => {
        if rows.is_empty() && rest.is_none() {
          return f.write_str("unit");
        }
        f.write_str("{")?;
        for (idx, (lab, ty)) in rows.iter().enumerate() {
          if idx != 0 {
            f.write_str(", ")?;
          }
          write!(f, "{lab} : ")?;
          ty.fmt_prec(f, Prec::Top)?;
        }
        if rest.is_some() {
          f.write_str(if rows.is_empty() { "..." } else { ", ..." })?;
        }
        f.write_str("}")
      }
      Ty::Fn(a, b) => {
        if prec >= Prec::Tuple {
          f.write_str("(")?;
        }
        a.fmt_prec(f, Prec::Tuple)?;
        f.write_str(" -> ")?;
        b.fmt_prec(f, Prec::Top)?;
        if prec >= Prec::Tuple {
          f.write_str(")")?;
        }
        Ok(())
      }
      Ty::Con(args, name) => {
        match args.as_slice() {
          [] => {}
          [arg] => {
            arg.fmt_prec(f, Prec::Arg)?;
            f.write_str(" ")?;
          }
          args => {
            f.write_str("(")?;
            for (idx, arg) in args.iter().enumerate() {
              if idx != 0 {
                f.write_str(", ")?;
              }
              arg.fmt_prec(f, Prec::Top)?;
            }
            f.write_str(") ")?;
          }
        }
        fmt::Display::fmt(&name.name, f)
      }
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
  Top,
  Tuple,
  Arg,
}

impl fmt::Display for Ty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.fmt_prec(f, Prec::Top)
  }
}

/// A type scheme `forall bound. ty`. Also used for type functions.
#[derive(Debug, Clone, PartialEq)]
pub struct TyScheme {
  /// The bound variables, in order.
  pub bound: Vec<TyVar>,
  /// The body.
  pub ty: Ty,
}

impl TyScheme {
  /// Returns a scheme binding nothing.
  #[must_use]
  pub fn mono(ty: Ty) -> Self {
    Self { bound: Vec::new(), ty }
  }

  /// Instantiates the bound variables with `args`, which should be as many as the bound vars.
  #[must_use]
  pub fn apply(&self, args: &[Ty]) -> Ty {
    if self.bound.is_empty() {
      return self.ty.clone();
    }
    let map: FxHashMap<_, _> = self.bound.iter().cloned().zip(args.iter().cloned()).collect();
    self.ty.subst(&map)
  }

  /// Adds the free type variables to `ac`.
  pub fn free_vars(&self, ac: &mut FxHashSet<TyVar>) {
    let mut inner = FxHashSet::default();
    self.ty.free_vars(&mut inner);
    ac.extend(inner.into_iter().filter(|tv| !self.bound.contains(tv)));
  }

  /// Returns this with all type names realized.
  #[must_use]
  pub fn realize(&self, phi: &Realisation) -> Self {
    Self { bound: self.bound.clone(), ty: self.ty.realize(phi) }
  }
}

impl fmt::Display for TyScheme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.ty.fmt(f)
  }
}

/// A map from type name stamps to the type functions that replace them.
pub type Realisation = FxHashMap<u32, TyScheme>;

/// Bindings for type variables. The flag marks a rigid binding: a signature's variable that may
/// only be unified with itself or a flexible variable.
pub type TyVarBnd = FxHashMap<TyVar, (Ty, bool)>;

/// A kind of type variable, decided by the shape of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TyVarKind {
  /// `'a`
  Regular,
  /// `''a`
  Equality,
  /// Overloaded on `int`, `word`, `real`.
  Num,
  /// Overloaded on `int`, `word`, `real`, `char`, `string`.
  Ord,
}

impl TyVarKind {
  /// Returns the kind of a type variable.
  #[must_use]
  pub fn of(tv: &TyVar) -> Self {
    let s = tv.as_name().as_str();
    if s.starts_with(Self::NUM) {
      Self::Num
    } else if s.starts_with(Self::ORD) {
      Self::Ord
    } else if s.starts_with("''") {
      Self::Equality
    } else {
      Self::Regular
    }
  }

  /// The name prefix of bound `Num` variables in std basis schemes.
  pub const NUM: &'static str = "'~num";

  /// The name prefix of bound `Ord` variables in std basis schemes.
  pub const ORD: &'static str = "'~ord";

  fn prefix(self) -> &'static str {
    match self {
      Self::Regular => "'",
      Self::Equality => "''",
      Self::Num => Self::NUM,
      Self::Ord => Self::ORD,
    }
  }

  /// Returns the fresh variable of this kind with the counter value `n`.
  #[must_use]
  pub fn fresh(self, n: u32) -> TyVar {
    TyVar::new(Name::new(format!("{}*t{n}", self.prefix())))
  }

  /// Returns whether this admits only equality types.
  #[must_use]
  pub fn is_equality(self) -> bool {
    matches!(self, Self::Equality)
  }
}

/// Returns the counter value of a fresh variable, or `None` if it was written in source.
#[must_use]
pub fn fresh_counter(tv: &TyVar) -> Option<u32> {
  let s = tv.as_name().as_str();
  let idx = s.find("*t")?;
  s[idx + 2..].parse().ok()
}

#[cfg(test)]
mod tests {
  use super::{Ty, TyName, TyScheme, TyVarKind, fresh_counter};
  use str_util::Name;

  fn con(name: &str, stamp: u32, args: Vec<Ty>) -> Ty {
    Ty::Con(args, TyName { name: Name::new(name), stamp, equality: true })
  }

  #[test]
  fn display() {
    let int = con("int", 0, Vec::new());
    let list = con("list", 1, vec![Ty::tuple(vec![int.clone(), Ty::var("'a")])]);
    let f = Ty::fun(Ty::fun(int.clone(), int.clone()), list);
    assert_eq!(f.to_string(), "(int -> int) -> (int * 'a) list");
    assert_eq!(Ty::unit().to_string(), "unit");
  }

  #[test]
  fn apply() {
    let scheme = TyScheme { bound: vec![sml_ast::TyVar::new(Name::new("'a"))], ty: Ty::var("'a") };
    let int = con("int", 0, Vec::new());
    assert_eq!(scheme.apply(&[int.clone()]), int);
  }

  #[test]
  fn fresh() {
    let tv = TyVarKind::Equality.fresh(12);
    assert_eq!(tv.as_name().as_str(), "''*t12");
    assert_eq!(TyVarKind::of(&tv), TyVarKind::Equality);
    assert_eq!(fresh_counter(&tv), Some(12));
    assert_eq!(fresh_counter(&sml_ast::TyVar::new(Name::new("'a"))), None);
    assert_eq!(TyVarKind::of(&TyVarKind::Num.fresh(3)), TyVarKind::Num);
  }
}
