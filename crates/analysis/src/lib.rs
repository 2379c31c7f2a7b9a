//! The unification of all the passes into a single high-level API.
//!
//! An [`Interpreter`] runs one input at a time through lexing, parsing, elaboration, and
//! evaluation. What an input declares is visible to later inputs.

#![deny(clippy::pedantic, missing_debug_implementations, missing_docs, rust_2018_idioms)]

mod error;

pub use error::{Error, ErrorKind};

use config::Options;
use fast_hash::FxHashSet;
use sml_ast::TyVar;
use sml_dynamics::{Mem, Outcome};
use sml_state::std_basis::{self, FIRST_FREE_STAMP};
use sml_state::{DynamicBasis, State, StaticBasis, TyVarBnd, Val, Warning};
use std::fmt;
use std::rc::Rc;

const PRELUDE: &str = include_str!("prelude.sml");

/// The warning when elaboration is skipped for an input using something the elaborator does not
/// support, like functor application.
pub const FUNCTOR_SKIPPED: &str = "functor elaboration skipped";

/// Returns the options in the contents of a config file.
///
/// # Errors
///
/// If the contents are not a valid config.
pub fn options_from_config(contents: &str) -> Result<Options, Error> {
  let root: config::file::Root = toml::from_str(contents).map_err(Error::config_parse)?;
  if root.version != 1 {
    return Err(Error::config_version(root.version));
  }
  Ok(Options::from(root.language))
}

/// The result of running one input.
#[derive(Debug)]
pub struct Output {
  /// What the input bound statically. Empty if elaboration was skipped.
  pub statics: StaticBasis,
  /// What the input bound dynamically.
  pub dynamics: DynamicBasis,
  /// The exception that escaped. If there is one, the input bound nothing.
  pub raised: Option<Val>,
  /// Things that were not errors but may be surprising.
  pub warnings: Vec<Warning>,
  /// The writes to reference cells, oldest first.
  pub mem: Vec<(usize, Val)>,
}

impl Output {
  /// Returns the value bound to the name.
  #[must_use]
  pub fn value(&self, name: &str) -> Option<&Val> {
    self.dynamics.val_env.get(&str_util::Name::new(name)).map(|(val, _)| val)
  }

  /// Returns the type of the value bound to the name, if it was elaborated.
  #[must_use]
  pub fn ty(&self, name: &str) -> Option<String> {
    self.statics.val_env.get(&str_util::Name::new(name)).map(|info| info.scheme.to_string())
  }
}

impl fmt::Display for Output {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(exn) = &self.raised {
      return write!(f, "uncaught exception {exn}");
    }
    let mut vals: Vec<_> = self.dynamics.val_env.iter().collect();
    vals.sort_unstable_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
    let mut sep = "";
    for (name, (val, _)) in vals {
      write!(f, "{sep}val {name} = {val}")?;
      if let Some(info) = self.statics.val_env.get(name) {
        write!(f, " : {}", info.scheme)?;
      }
      sep = "\n";
    }
    Ok(())
  }
}

/// Runs inputs one after another.
#[derive(Debug)]
pub struct Interpreter {
  state: Rc<State>,
  mem: Mem,
  bnd: TyVarBnd,
  next: u32,
  /// The free type variables of the values bound in `state`.
  free: Rc<FxHashSet<TyVar>>,
  options: Options,
}

impl Interpreter {
  /// Returns a new interpreter, with the primitives and the prelude bound.
  #[must_use]
  pub fn new(options: Options) -> Self {
    let state = std_basis::get();
    let mut free = FxHashSet::default();
    state.statics.free_vars(&mut free);
    let mut ret = Self {
      state: Rc::new(state),
      mem: Mem::default(),
      bnd: TyVarBnd::default(),
      next: FIRST_FREE_STAMP,
      free: Rc::new(free),
      options,
    };
    elapsed::log("prelude", || {
      if let Err(e) = ret.run(PRELUDE) {
        log::error!("prelude error: {e}");
      }
    });
    ret
  }

  /// Returns a new interpreter with the options from the contents of a config file.
  ///
  /// # Errors
  ///
  /// If the contents are not a valid config.
  pub fn from_config(contents: &str) -> Result<Self, Error> {
    options_from_config(contents).map(Self::new)
  }

  /// Returns the current outermost scope.
  #[must_use]
  pub fn state(&self) -> &Rc<State> {
    &self.state
  }

  /// Returns the reference cells.
  #[must_use]
  pub fn mem(&self) -> &Mem {
    &self.mem
  }

  /// Returns the options.
  #[must_use]
  pub fn options(&self) -> Options {
    self.options
  }

  /// Runs the input. If no exception escapes, what it binds is visible to later inputs.
  ///
  /// # Errors
  ///
  /// If any pass fails. An escaping exception is not an error. See [`Error::is_incomplete`] for
  /// whether more input may fix it.
  pub fn run(&mut self, src: &str) -> Result<Output, Error> {
    let lex = elapsed::log("sml_lex::get", || sml_lex::get(src));
    if let Some(e) = lex.errors.into_iter().next() {
      return Err(Error::lex(e));
    }
    let parse =
      elapsed::log("sml_parse::get", || sml_parse::get(&lex.tokens, &self.state, &self.options))
        .map_err(Error::parse)?;
    let mut warnings = Vec::new();
    let elab = sml_statics::get(&self.state, self.bnd.clone(), self.next, &self.free, &parse.dec);
    let elab = match elab {
      Ok(elab) => {
        for e in &elab.skipped {
          log::warn!("skipping elaboration of a binding: {e}");
          warnings.push(Warning::new(e.pos(), FUNCTOR_SKIPPED));
        }
        Some(elab)
      }
      Err(e) if e.is_unsupported() => {
        log::warn!("skipping elaboration: {e}");
        warnings.push(Warning::new(e.pos(), FUNCTOR_SKIPPED));
        None
      }
      Err(e) => return Err(Error::statics(e)),
    };
    let res =
      sml_dynamics::evaluate(&self.state, &parse.dec, &mut self.mem).map_err(Error::dynamics)?;
    let mut statics = StaticBasis::default();
    if let Some(elab) = elab {
      warnings.extend(elab.warnings);
      self.bnd = elab.bnd;
      self.next = elab.next;
      statics = elab.basis;
    }
    warnings.extend(res.warnings);
    let (statics, dynamics, raised) = match res.outcome {
      Outcome::Basis(dynamics) => {
        statics.free_vars(Rc::make_mut(&mut self.free));
        let mut state = State::nested(&self.state);
        state.fixity = parse.fixity;
        state.statics = statics.clone();
        state.dynamics = dynamics.clone();
        self.state = Rc::new(state);
        (statics, dynamics, None)
      }
      Outcome::Raised(exn) => {
        log::debug!("uncaught exception {exn}");
        (StaticBasis::default(), DynamicBasis::default(), Some(exn))
      }
    };
    Ok(Output { statics, dynamics, raised, warnings, mem: res.mem })
  }
}
