//! Static semantics: type inference for the core, and elaboration of structures, signatures, and
//! functor declarations.
//!
//! Type variables made during inference are bound in a [`TyVarBnd`] that outlives a single call,
//! so the types of later inputs may refer to ones from earlier inputs.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![allow(clippy::too_many_lines, clippy::single_match_else)]

mod dec;
mod equality;
mod error;
mod exp;
mod generalize;
mod pat;
mod st;
mod top_dec;
mod ty;
mod unify;
mod util;

pub use error::{Error, ErrorKind, Item};

use fast_hash::FxHashSet;
use sml_ast::{Dec, Located, TyVar};
use sml_state::{State, StaticBasis, TyVarBnd, Warning};
use std::rc::Rc;

/// The result of elaboration.
#[derive(Debug)]
pub struct Elab {
  /// What the declaration binds, with its types fully resolved.
  pub basis: StaticBasis,
  /// Things that were not errors but may be surprising.
  pub warnings: Vec<Warning>,
  /// Constructs the elaborator does not handle. The declarations using them were skipped, and
  /// the names they bind are in the `skipped_*` sets of the basis. See [`Error::is_unsupported`].
  pub skipped: Vec<Error>,
  /// The type variable bindings after elaboration.
  pub bnd: TyVarBnd,
  /// The next counter for type variables and type name stamps.
  pub next: u32,
}

/// Elaborates the declaration in the state. `free` holds the free type variables of the values
/// bound in `state`.
///
/// Structure and value bindings using something the elaborator does not support are skipped and
/// reported in [`Elab::skipped`].
///
/// # Errors
///
/// If the declaration does not typecheck, or uses something the elaborator does not support
/// where it cannot skip just one binding. See [`Error::is_unsupported`].
pub fn get(
  state: &Rc<State>,
  bnd: TyVarBnd,
  next: u32,
  free: &Rc<FxHashSet<TyVar>>,
  dec: &Located<Dec>,
) -> Result<Elab, Error> {
  elapsed::log("sml_statics::get", || {
    let mut st = st::St::new(state, bnd, next, free);
    let mut basis = dec::get(&mut st, state, dec)?;
    generalize::resolve_basis(&mut st, &mut basis);
    Ok(Elab { basis, next: st.next(), warnings: st.warnings, skipped: st.skipped, bnd: st.bnd })
  })
}

#[cfg(test)]
mod tests {
  use super::{Elab, Error, ErrorKind, get};
  use pretty_assertions::assert_eq;
  use sml_state::std_basis::FIRST_FREE_STAMP;
  use sml_state::{StaticBasis, TyVarBnd};
  use std::rc::Rc;
  use str_util::Name;

  fn elab(s: &str) -> Result<Elab, Error> {
    let lex = sml_lex::get(s);
    assert!(lex.errors.is_empty(), "lex errors: {:?}", lex.errors);
    let state = Rc::new(sml_state::std_basis::get());
    let options = config::Options::successor_ml();
    let parse = sml_parse::get(&lex.tokens, &state, &options).expect("should parse");
    get(&state, TyVarBnd::default(), FIRST_FREE_STAMP, &Rc::default(), &parse.dec)
  }

  fn ok(s: &str) -> StaticBasis {
    match elab(s) {
      Ok(e) => e.basis,
      Err(e) => panic!("{s}: {e}"),
    }
  }

  fn fails(s: &str) -> Error {
    match elab(s) {
      Ok(_) => panic!("{s}: should fail"),
      Err(e) => e,
    }
  }

  fn val_ty(basis: &StaticBasis, name: &str) -> String {
    let info = basis.val_env.get(&str_util::Name::new(name)).expect("no such value");
    info.scheme.to_string()
  }

  #[test]
  fn id() {
    let basis = ok("val id = fn x => x");
    assert_eq!(val_ty(&basis, "id"), "'a -> 'a");
  }

  #[test]
  fn fun_rec() {
    let basis = ok("fun len [] = 0 | len (_ :: xs) = 1 + len xs");
    assert_eq!(val_ty(&basis, "len"), "'a list -> int");
  }

  #[test]
  fn overloaded_default() {
    let basis = ok("fun add (a, b) = a + b");
    assert_eq!(val_ty(&basis, "add"), "int * int -> int");
  }

  #[test]
  fn equality_fn() {
    let e = fails("val _ = (fn x => x) = (fn y => y)");
    assert!(matches!(e.kind(), ErrorKind::NotEquality(_)), "{e}");
  }

  #[test]
  fn mismatch() {
    let e = fails("val x : int = \"hi\"");
    assert_eq!(e.to_string(), "Type mismatch: expected `int`, found `string`");
  }

  #[test]
  fn value_restriction() {
    let e = elab("val r = ref nil").expect("should elaborate");
    assert_eq!(e.warnings.len(), 1);
    assert!(e.warnings[0].message.contains("`r`"));
  }

  #[test]
  fn datatype_equality() {
    ok("datatype t = A | B of int val _ = A = B 3");
    let e = fails("datatype t = F of int -> int val _ = F (fn x => x) = F (fn x => x)");
    assert!(matches!(e.kind(), ErrorKind::NotEquality(_)), "{e}");
  }

  #[test]
  fn ascription_hides() {
    let basis = ok(
      r"
structure S : sig val x : int end = struct val x = 1 val y = 2 end
",
    );
    let s = basis.str_env.get(&str_util::Name::new("S")).expect("no S");
    assert_eq!(s.val_env.len(), 1);
  }

  #[test]
  fn opaque_abstract() {
    let e = fails(
      r"
structure S :> sig type t val x : t end = struct type t = int val x = 1 end
val _ : int = S.x
",
    );
    assert!(matches!(e.kind(), ErrorKind::IncompatibleTys(_, _)), "{e}");
  }

  #[test]
  fn transparent_visible() {
    ok(
      r"
structure S : sig type t val x : t end = struct type t = int val x = 1 end
val _ : int = S.x
",
    );
  }

  #[test]
  fn unimplemented_value() {
    let e = fails("structure S : sig val x : int end = struct end");
    assert_eq!(e.to_string(), "Unimplemented value `x`");
  }

  #[test]
  fn value_too_specific() {
    let e = fails("structure S : sig val f : 'a -> 'a end = struct fun f x = x + 1 end");
    assert!(matches!(e.kind(), ErrorKind::ValueMismatch(_, _, _)), "{e}");
  }

  #[test]
  fn where_type() {
    ok(
      r"
signature T = sig type t val x : t end
structure S :> T where type t = int = struct type t = int val x = 1 end
val _ : int = S.x
",
    );
  }

  #[test]
  fn functor_body() {
    ok(
      r"
functor F (A : sig type t val x : t end) = struct val y = A.x end
",
    );
  }

  #[test]
  fn functor_app_skipped() {
    let e = elab(
      r"
functor F (A : sig end) = struct val x = 1 end
structure S = F (struct end)
val y = S.x
val z = 3
",
    )
    .unwrap();
    assert_eq!(e.skipped.len(), 1);
    assert!(e.skipped[0].is_unsupported());
    let s = Name::new("S");
    assert!(e.basis.skipped_strs.contains(&s) && !e.basis.str_env.contains_key(&s));
    assert!(e.basis.skipped_vals.contains(&Name::new("y")));
    assert_eq!(val_ty(&e.basis, "z"), "int");
  }

  #[test]
  fn open_skipped_structure() {
    let e = fails(
      r"
functor F (A : sig end) = struct val x = 1 end
structure S = F (struct end)
open S
",
    );
    assert!(e.is_unsupported());
    assert_eq!(e.to_string(), "structure `S` has no static information");
  }

  #[test]
  fn sharing_internal() {
    let e = fails(
      r"
signature S = sig type t type u sharing type t = u end
",
    );
    assert!(e.is_internal());
    assert!(!e.is_unsupported());
  }
}
