//! The initial state: std basis fixities, types, constructors, exceptions, and primitives.

use crate::{
  Builtin, Con, ConKind, DynamicBasis, IdStatus, State, StaticBasis, Ty, TyInfo, TyName,
  TyScheme, TyVarKind, Val, ValInfo,
};
use sml_ast::TyVar;
use str_util::Name;

/// Stamps at or above this are free for type names and exceptions made by declarations.
pub const FIRST_FREE_STAMP: u32 = 64;

/// The primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Prim {
  Int,
  Real,
  Word,
  Char,
  String,
  Bool,
  List,
  Ref,
  Exn,
  Order,
  Option,
  Vector,
}

impl Prim {
  /// All the primitive type names.
  pub const ALL: [Prim; 12] = [
    Prim::Int,
    Prim::Real,
    Prim::Word,
    Prim::Char,
    Prim::String,
    Prim::Bool,
    Prim::List,
    Prim::Ref,
    Prim::Exn,
    Prim::Order,
    Prim::Option,
    Prim::Vector,
  ];

  /// Returns the name.
  #[must_use]
  pub fn name(self) -> &'static str {
    match self {
      Prim::Int => "int",
      Prim::Real => "real",
      Prim::Word => "word",
      Prim::Char => "char",
      Prim::String => "string",
      Prim::Bool => "bool",
      Prim::List => "list",
      Prim::Ref => "ref",
      Prim::Exn => "exn",
      Prim::Order => "order",
      Prim::Option => "option",
      Prim::Vector => "vector",
    }
  }

  /// Returns the type name.
  #[must_use]
  pub fn ty_name(self) -> TyName {
    TyName {
      name: Name::new(self.name()),
      stamp: self as u32,
      equality: !matches!(self, Prim::Real | Prim::Exn),
    }
  }

  fn arity(self) -> usize {
    match self {
      Prim::List | Prim::Ref | Prim::Option | Prim::Vector => 1,
      _ => 0,
    }
  }

  /// Returns the type, for a nullary type name.
  #[must_use]
  pub fn ty(self) -> Ty {
    Ty::Con(Vec::new(), self.ty_name())
  }

  /// Returns the type applied to an argument, for a unary type name.
  #[must_use]
  pub fn apply(self, arg: Ty) -> Ty {
    Ty::Con(vec![arg], self.ty_name())
  }

  fn cons(self) -> &'static [&'static str] {
    match self {
      Prim::Bool => &["true", "false"],
      Prim::List => &["nil", "::"],
      Prim::Ref => &["ref"],
      Prim::Order => &["LESS", "EQUAL", "GREATER"],
      Prim::Option => &["NONE", "SOME"],
      _ => &[],
    }
  }
}

/// The exceptions of the std basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PrimExn {
  Match,
  Bind,
  Div,
  Overflow,
  Fail,
  Chr,
  Subscript,
  Size,
  Empty,
  Option,
  Domain,
}

impl PrimExn {
  /// All the std basis exceptions.
  pub const ALL: [PrimExn; 11] = [
    PrimExn::Match,
    PrimExn::Bind,
    PrimExn::Div,
    PrimExn::Overflow,
    PrimExn::Fail,
    PrimExn::Chr,
    PrimExn::Subscript,
    PrimExn::Size,
    PrimExn::Empty,
    PrimExn::Option,
    PrimExn::Domain,
  ];

  /// Returns the name.
  #[must_use]
  pub fn name(self) -> &'static str {
    match self {
      PrimExn::Match => "Match",
      PrimExn::Bind => "Bind",
      PrimExn::Div => "Div",
      PrimExn::Overflow => "Overflow",
      PrimExn::Fail => "Fail",
      PrimExn::Chr => "Chr",
      PrimExn::Subscript => "Subscript",
      PrimExn::Size => "Size",
      PrimExn::Empty => "Empty",
      PrimExn::Option => "Option",
      PrimExn::Domain => "Domain",
    }
  }

  /// Returns the exception value, for an exception without an argument.
  #[must_use]
  pub fn val(self) -> Val {
    Val::Con(Con { name: Name::new(self.name()), kind: ConKind::Exn(self as u32), arg: None })
  }

  fn arg_ty(self) -> Option<Ty> {
    matches!(self, PrimExn::Fail).then(|| Prim::String.ty())
  }
}

fn ty_var(name: &str) -> TyVar {
  TyVar::new(Name::new(name))
}

fn scheme(bound: &[&str], ty: Ty) -> TyScheme {
  TyScheme { bound: bound.iter().map(|&x| ty_var(x)).collect(), ty }
}

fn pair(a: Ty, b: Ty) -> Ty {
  Ty::tuple(vec![a, b])
}

fn con_scheme(prim: Prim, con: &str) -> TyScheme {
  let a = || Ty::var("'a");
  match (prim, con) {
    (Prim::List, "nil") => scheme(&["'a"], Prim::List.apply(a())),
    (Prim::List, _) => {
      let list = Prim::List.apply(a());
      scheme(&["'a"], Ty::fun(pair(a(), list.clone()), list))
    }
    (Prim::Ref, _) => scheme(&["'a"], Ty::fun(a(), Prim::Ref.apply(a()))),
    (Prim::Option, "NONE") => scheme(&["'a"], Prim::Option.apply(a())),
    (Prim::Option, _) => scheme(&["'a"], Ty::fun(a(), Prim::Option.apply(a()))),
    (prim, _) => TyScheme::mono(prim.ty()),
  }
}

fn builtin_scheme(builtin: Builtin) -> TyScheme {
  let num = || Ty::var(TyVarKind::NUM);
  let ord = || Ty::var(TyVarKind::ORD);
  let int = || Prim::Int.ty();
  let real = || Prim::Real.ty();
  let bool = || Prim::Bool.ty();
  let string = || Prim::String.ty();
  let a = || Ty::var("'a");
  let eq = || Ty::var("''a");
  match builtin {
    Builtin::Add | Builtin::Sub | Builtin::Mul => {
      scheme(&[TyVarKind::NUM], Ty::fun(pair(num(), num()), num()))
    }
    Builtin::Neg | Builtin::Abs => scheme(&[TyVarKind::NUM], Ty::fun(num(), num())),
    Builtin::Div | Builtin::Mod => TyScheme::mono(Ty::fun(pair(int(), int()), int())),
    Builtin::RealDiv => TyScheme::mono(Ty::fun(pair(real(), real()), real())),
    Builtin::Lt | Builtin::Le | Builtin::Gt | Builtin::Ge => {
      scheme(&[TyVarKind::ORD], Ty::fun(pair(ord(), ord()), bool()))
    }
    Builtin::Eq | Builtin::Neq => scheme(&["''a"], Ty::fun(pair(eq(), eq()), bool())),
    Builtin::Concat => TyScheme::mono(Ty::fun(pair(string(), string()), string())),
    Builtin::Ref => con_scheme(Prim::Ref, "ref"),
    Builtin::Deref => scheme(&["'a"], Ty::fun(Prim::Ref.apply(a()), a())),
    Builtin::Assign => scheme(&["'a"], Ty::fun(pair(Prim::Ref.apply(a()), a()), Ty::unit())),
    Builtin::Not => TyScheme::mono(Ty::fun(bool(), bool())),
    Builtin::Size => TyScheme::mono(Ty::fun(string(), int())),
    Builtin::Chr => TyScheme::mono(Ty::fun(int(), Prim::Char.ty())),
    Builtin::Ord => TyScheme::mono(Ty::fun(Prim::Char.ty(), int())),
    Builtin::Real => TyScheme::mono(Ty::fun(int(), real())),
    Builtin::Floor => TyScheme::mono(Ty::fun(real(), int())),
  }
}

fn statics() -> StaticBasis {
  let mut ret = StaticBasis::default();
  for prim in Prim::ALL {
    let bound: &[&str] = if prim.arity() == 1 { &["'a"] } else { &[] };
    let args: Vec<_> = bound.iter().map(|&x| Ty::var(x)).collect();
    let ty_fn = scheme(bound, Ty::Con(args, prim.ty_name()));
    let cons: Vec<_> =
      prim.cons().iter().map(|&con| (Name::new(con), con_scheme(prim, con))).collect();
    for (name, scheme) in &cons {
      let info = ValInfo { scheme: scheme.clone(), id_status: IdStatus::Con };
      ret.val_env.insert(name.clone(), info);
    }
    ret.ty_env.insert(Name::new(prim.name()), TyInfo { ty_fn, cons });
  }
  ret.ty_env.insert(Name::new("unit"), TyInfo::alias(TyScheme::mono(Ty::unit())));
  for exn in PrimExn::ALL {
    let ty = match exn.arg_ty() {
      None => Prim::Exn.ty(),
      Some(arg) => Ty::fun(arg, Prim::Exn.ty()),
    };
    let info = ValInfo { scheme: TyScheme::mono(ty), id_status: IdStatus::Exn };
    ret.val_env.insert(Name::new(exn.name()), info);
  }
  for (builtin, name) in Builtin::ALL {
    if builtin == Builtin::Ref {
      continue;
    }
    let info = ValInfo { scheme: builtin_scheme(builtin), id_status: IdStatus::Val };
    ret.val_env.insert(Name::new(name), info);
  }
  ret
}

fn dynamics() -> DynamicBasis {
  let mut ret = DynamicBasis::default();
  for prim in Prim::ALL {
    let cons: Vec<_> = prim.cons().iter().map(|&x| Name::new(x)).collect();
    for con in &cons {
      if con.as_str() != "ref" {
        ret.val_env.insert(con.clone(), (Val::Con(Con::dat(con.as_str())), IdStatus::Con));
      }
    }
    ret.ty_env.insert(Name::new(prim.name()), cons);
  }
  ret.ty_env.insert(Name::new("unit"), Vec::new());
  for exn in PrimExn::ALL {
    ret.val_env.insert(Name::new(exn.name()), (exn.val(), IdStatus::Exn));
  }
  for (builtin, name) in Builtin::ALL {
    let id_status = if builtin == Builtin::Ref { IdStatus::Con } else { IdStatus::Val };
    ret.val_env.insert(Name::new(name), (Val::Builtin(builtin), id_status));
  }
  ret
}

/// Returns the initial state.
#[must_use]
pub fn get() -> State {
  let mut ret = State::default();
  ret.fixity = sml_fixity::STD_BASIS.clone();
  ret.statics = statics();
  ret.dynamics = dynamics();
  ret
}

#[cfg(test)]
mod tests {
  use super::{Prim, get};
  use crate::{IdStatus, Namespace};
  use sml_ast::Path;
  use str_util::Name;

  #[test]
  fn initial() {
    let st = get();
    let path = |s: &str| Path::one(Name::new(s));
    assert_eq!(st.id_status(&path("::")), Some(IdStatus::Con));
    assert_eq!(st.id_status(&path("ref")), Some(IdStatus::Con));
    assert_eq!(st.id_status(&path("Fail")), Some(IdStatus::Exn));
    assert_eq!(st.id_status(&path("+")), Some(IdStatus::Val));
    let list = st.static_lookup(&path("list"), Namespace::Ty, |b| &b.ty_env);
    let list = list.map(crate::TyInfo::arity);
    assert_eq!(list, Some(1));
    let cons = st.dynamic_lookup(&path("order"), |b| &b.ty_env).map(Vec::len);
    assert_eq!(cons, Some(3));
    let nil = st.static_lookup(&path("nil"), Namespace::Val, |b| &b.val_env);
    let nil = nil.map(|x| x.scheme.to_string());
    assert_eq!(nil.as_deref(), Some("'a list"));
    assert!(!Prim::Real.ty_name().equality);
  }
}
