//! Tests.
//!
//! - If you're not sure where to put a test, put it in misc.
//! - If you have many similar tests, put them in an existing or new module.

#![cfg(test)]
#![deny(clippy::pedantic, rust_2018_idioms)]

mod ascribe;
mod check;
mod dynamics;
mod fixity;
mod fun_bind;
mod functor;
mod incomplete;
mod infix;
mod misc;
mod options;
mod sig;
mod simplify;
mod successor_ml;
