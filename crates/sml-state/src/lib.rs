//! The state shared by the parser, the statics, and the dynamics: types, static and dynamic
//! environments, runtime values, and the chain of scopes holding them.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

mod dynamics;
mod state;
mod statics;
mod ty;
mod warning;

pub mod std_basis;

pub use dynamics::{
  Builtin, Closure, Con, ConKind, DynamicBasis, DynamicInterface, Functor, Val,
};
pub use state::State;
pub use statics::{FunSig, IdStatus, Namespace, Sig, StaticBasis, TyInfo, ValInfo};
pub use ty::{Realisation, Ty, TyName, TyScheme, TyVarBnd, TyVarKind, fresh_counter};
pub use warning::Warning;
