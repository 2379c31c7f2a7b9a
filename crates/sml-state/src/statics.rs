//! Static environments: what the elaborator knows about names.

use crate::ty::{Realisation, TyScheme};
use fast_hash::{FxHashMap, FxHashSet};
use sml_ast::TyVar;
use std::collections::BTreeSet;
use str_util::Name;

/// An identifier status, denoting what kind of value a name is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStatus {
  /// A value variable.
  Val,
  /// A value constructor.
  Con,
  /// An exception constructor.
  Exn,
}

impl IdStatus {
  /// Returns whether this is a constructor of either kind.
  #[must_use]
  pub fn is_con(self) -> bool {
    matches!(self, Self::Con | Self::Exn)
  }
}

/// Information about a type name.
#[derive(Debug, Clone)]
pub struct TyInfo {
  /// The type function.
  pub ty_fn: TyScheme,
  /// The constructors, if this is a datatype.
  pub cons: Vec<(Name, TyScheme)>,
}

impl TyInfo {
  /// Returns information for a type without constructors.
  #[must_use]
  pub fn alias(ty_fn: TyScheme) -> Self {
    Self { ty_fn, cons: Vec::new() }
  }

  /// Returns the number of type arguments.
  #[must_use]
  pub fn arity(&self) -> usize {
    self.ty_fn.bound.len()
  }

  /// Returns this with all type names realized.
  #[must_use]
  pub fn realize(&self, phi: &Realisation) -> Self {
    Self {
      ty_fn: self.ty_fn.realize(phi),
      cons: self.cons.iter().map(|(name, s)| (name.clone(), s.realize(phi))).collect(),
    }
  }
}

/// Information about a value.
#[derive(Debug, Clone)]
pub struct ValInfo {
  /// The type scheme.
  pub scheme: TyScheme,
  /// The identifier status.
  pub id_status: IdStatus,
}

/// An elaborated signature: an environment plus the type names it leaves flexible, which
/// matching instantiates.
#[derive(Debug, Clone, Default)]
pub struct Sig {
  /// Stamps of the flexible type names.
  pub ty_names: BTreeSet<u32>,
  /// The environment.
  pub env: StaticBasis,
}

/// An elaborated functor signature.
#[derive(Debug, Clone)]
pub struct FunSig {
  /// The parameter name.
  pub param: Name,
  /// The parameter signature.
  pub param_sig: Sig,
  /// The environment of the body.
  pub body: StaticBasis,
}

/// A static basis: the static environments of a scope or a structure.
#[derive(Debug, Clone, Default)]
pub struct StaticBasis {
  /// Types.
  pub ty_env: FxHashMap<Name, TyInfo>,
  /// Values.
  pub val_env: FxHashMap<Name, ValInfo>,
  /// Structures.
  pub str_env: FxHashMap<Name, StaticBasis>,
  /// Signatures.
  pub sig_env: FxHashMap<Name, Sig>,
  /// Functors.
  pub fun_env: FxHashMap<Name, FunSig>,
  /// Values bound by declarations whose elaboration was skipped.
  pub skipped_vals: FxHashSet<Name>,
  /// Structures bound by declarations whose elaboration was skipped.
  pub skipped_strs: FxHashSet<Name>,
}

/// A kind of name a scope may bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
  /// Types.
  Ty,
  /// Values.
  Val,
  /// Structures.
  Str,
  /// Signatures.
  Sig,
  /// Functors.
  Fun,
}

impl StaticBasis {
  /// Adds everything in `other` to this, overwriting.
  pub fn extend(&mut self, other: StaticBasis) {
    for name in other.val_env.keys() {
      self.skipped_vals.remove(name);
    }
    for name in &other.skipped_vals {
      self.val_env.remove(name);
    }
    for name in other.str_env.keys() {
      self.skipped_strs.remove(name);
    }
    for name in &other.skipped_strs {
      self.str_env.remove(name);
    }
    self.ty_env.extend(other.ty_env);
    self.val_env.extend(other.val_env);
    self.str_env.extend(other.str_env);
    self.sig_env.extend(other.sig_env);
    self.fun_env.extend(other.fun_env);
    self.skipped_vals.extend(other.skipped_vals);
    self.skipped_strs.extend(other.skipped_strs);
  }

  /// Returns whether this binds nothing.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.ty_env.is_empty()
      && self.val_env.is_empty()
      && self.str_env.is_empty()
      && self.sig_env.is_empty()
      && self.fun_env.is_empty()
      && self.skipped_vals.is_empty()
      && self.skipped_strs.is_empty()
  }

  /// Returns whether this has static information for the name.
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

  /// Returns whether this binds the name but its elaboration was skipped.
  #[must_use]
  pub fn skips(&self, ns: Namespace, name: &Name) -> bool {
    match ns {
      Namespace::Val => self.skipped_vals.contains(name),
      Namespace::Str => self.skipped_strs.contains(name),
      Namespace::Ty | Namespace::Sig | Namespace::Fun => false,
    }
  }

  /// Returns the structure at `names` inside this.
  #[must_use]
  pub fn get_str(&self, names: &[Name]) -> Option<&StaticBasis> {
    let mut ret = self;
    for name in names {
      ret = ret.str_env.get(name)?;
    }
    Some(ret)
  }

  /// Adds the free type variables of the values, recursively, to `ac`.
  pub fn free_vars(&self, ac: &mut FxHashSet<TyVar>) {
    for val in self.val_env.values() {
      val.scheme.free_vars(ac);
    }
    for str in self.str_env.values() {
      str.free_vars(ac);
    }
  }

  /// Returns this with all type names realized, structures included.
  #[must_use]
  pub fn realize(&self, phi: &Realisation) -> Self {
    Self {
      ty_env: self.ty_env.iter().map(|(k, v)| (k.clone(), v.realize(phi))).collect(),
      val_env: self
        .val_env
        .iter()
        .map(|(k, v)| {
          (k.clone(), ValInfo { scheme: v.scheme.realize(phi), id_status: v.id_status })
        })
        .collect(),
      str_env: self.str_env.iter().map(|(k, v)| (k.clone(), v.realize(phi))).collect(),
      sig_env: self.sig_env.clone(),
      fun_env: self.fun_env.clone(),
      skipped_vals: self.skipped_vals.clone(),
      skipped_strs: self.skipped_strs.clone(),
    }
  }
}
