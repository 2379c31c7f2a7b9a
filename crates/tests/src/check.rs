//! Running programs and checking what happens.

use analysis::{Interpreter, Output};
use config::Options;
use sml_ast::{Dec, Located};
use std::fmt;

/// Pass the string of an SML program with at most one expectation comment.
///
/// Expectation comments are regular SML comments except they:
/// - are always on only one line
/// - start with `(**`
/// - point at the line with the error, with `^` for the line above or `v` for the line below
/// - contain the expected error message
///
/// With `^` or `v`, the error must start at the column of the arrow. With `+` for the line above
/// or `-` for the line below, it may start anywhere on the line.
///
/// With no expectation comment, the program must run without error.
///
/// ```ignore
/// check(r"
/// val _ = nope
/// (**     ^^^^ Undefined value `nope` *)
/// ");
/// ```
///
/// See also [`fail`] if the test is failing.
#[track_caller]
pub(crate) fn check(s: &str) {
  check_with_options(Options::default(), s);
}

/// Like [`check`], with the given options.
#[track_caller]
pub(crate) fn check_with_options(options: Options, s: &str) {
  if let Some(reason) = get(options, s) {
    panic!("CHECK FAILED: {reason}")
  }
}

/// Like [`check`], but the expectation should not be satisfied.
///
/// Use this instead of ignoring a test of something not yet supported.
#[allow(dead_code)]
#[track_caller]
pub(crate) fn fail(s: &str) {
  if get(Options::default(), s).is_none() {
    panic!("unexpected pass")
  }
}

/// Runs the program and returns the output, which must not be an error.
#[track_caller]
pub(crate) fn run(s: &str) -> Output {
  run_many(Options::default(), &[s])
}

/// Runs the inputs in order in one interpreter, returning the output of the last one. None of
/// them may be an error.
#[track_caller]
pub(crate) fn run_many(options: Options, ss: &[&str]) -> Output {
  let mut interpreter = interpreter(options);
  let mut ret = None;
  for s in ss {
    match interpreter.run(s) {
      Ok(output) => ret = Some(output),
      Err(e) => panic!("{s}: {e}"),
    }
  }
  ret.expect("no inputs")
}

/// Runs the inputs in order in one interpreter, returning the error of the last one. The others
/// may not be errors.
#[track_caller]
pub(crate) fn run_err(options: Options, ss: &[&str]) -> analysis::Error {
  let Some((last, init)) = ss.split_last() else { panic!("no inputs") };
  let mut interpreter = interpreter(options);
  for s in init {
    if let Err(e) = interpreter.run(s) {
      panic!("{s}: {e}")
    }
  }
  match interpreter.run(last) {
    Ok(output) => panic!("{last}: should fail, got {output}"),
    Err(e) => e,
  }
}

/// Parses the program, and returns the expression of the last `val` binding it declares at top
/// level, in the compact display where application is `f(x)`.
#[track_caller]
pub(crate) fn last_val_exp(s: &str) -> Result<String, sml_parse::Error> {
  let lex = sml_lex::get(s);
  assert!(lex.errors.is_empty(), "lex errors: {:?}", lex.errors);
  let state = sml_state::std_basis::get();
  let parse = sml_parse::get(&lex.tokens, &state, &Options::default())?;
  let pos = parse.dec.pos;
  let decs = match parse.dec.val {
    Dec::Seq(decs) => decs,
    dec => vec![Located::new(dec, pos)],
  };
  let exp = decs.iter().rev().find_map(|dec| match &dec.val {
    Dec::Val(_, binds) => binds.last().map(|b| b.exp.to_string()),
    _ => None,
  });
  Ok(exp.expect("no val"))
}

/// Returns a new interpreter, with logging on.
pub(crate) fn interpreter(options: Options) -> Interpreter {
  let _ = env_logger::builder().is_test(true).try_init();
  Interpreter::new(options)
}

fn get(options: Options, s: &str) -> Option<Reason> {
  let want = match expectations(s) {
    Ok(want) => want,
    Err(n) => return Some(Reason::WantWrongNum(n)),
  };
  let got = interpreter(options).run(s);
  match (want, got) {
    (None, Ok(_)) => None,
    (Some((_, msg)), Ok(_)) => Some(Reason::NoError(msg.to_owned())),
    (want, Err(e)) => {
      let Some(pos) = e.pos() else { return Some(Reason::NoPos(e.to_string())) };
      let got = Region::new(s, pos);
      match want {
        None => Some(Reason::GotButNotWanted(got, e.to_string())),
        Some((want, msg)) => {
          let got_msg = e.to_string();
          (!want.matches(got) || msg != got_msg)
            .then(|| Reason::Mismatched(want, got, msg.to_owned(), got_msg))
        }
      }
    }
  }
}

/// Returns the one expectation, or the number of them if more than one.
fn expectations(s: &str) -> Result<Option<(Want, &str)>, usize> {
  let mut ret: Vec<_> =
    s.lines().enumerate().filter_map(|(line_n, line_s)| get_expect(line_n, line_s)).collect();
  match ret.len() {
    0 | 1 => Ok(ret.pop()),
    n => Err(n),
  }
}

const EXPECT_START: &str = "(**";

fn get_expect(line_n: usize, line_s: &str) -> Option<(Want, &str)> {
  let (before, inner) = line_s.split_once(EXPECT_START)?;
  let (inner, _) = inner.split_once("*)")?;
  let non_space_idx = inner.find(|c| c != ' ')?;
  let inner = &inner[non_space_idx..];
  let (arrow, msg) = inner.split_once(' ')?;
  let col = before.len() + EXPECT_START.len() + non_space_idx;
  let want = match arrow.chars().next()? {
    '^' => Want::Exact(Region { line: line_n - 1, col }),
    'v' => Want::Exact(Region { line: line_n + 1, col }),
    '+' => Want::Line(line_n - 1),
    '-' => Want::Line(line_n + 1),
    c => panic!("invalid arrow: {c}"),
  };
  Some((want, msg.trim_end_matches(' ')))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
  line: usize,
  col: usize,
}

impl Region {
  fn new(s: &str, pos: usize) -> Self {
    let before = &s[..pos.min(s.len())];
    let line = before.matches('\n').count();
    let col = before.rfind('\n').map_or(before.len(), |idx| before.len() - idx - 1);
    Self { line, col }
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // the check strings usually have the first line blank.
    write!(f, "{}:{}", self.line, self.col + 1)
  }
}

#[derive(Debug, Clone, Copy)]
enum Want {
  Exact(Region),
  Line(usize),
}

impl Want {
  fn matches(self, got: Region) -> bool {
    match self {
      Want::Exact(r) => r == got,
      Want::Line(line) => line == got.line,
    }
  }
}

impl fmt::Display for Want {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Want::Exact(r) => r.fmt(f),
      Want::Line(line) => write!(f, "{line}"),
    }
  }
}

enum Reason {
  WantWrongNum(usize),
  NoError(String),
  NoPos(String),
  GotButNotWanted(Region, String),
  Mismatched(Want, Region, String, String),
}

impl fmt::Display for Reason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Reason::WantWrongNum(n) => write!(f, "want 0 or 1 expectations, got {n}"),
      Reason::NoError(want) => write!(f, "wanted an error, but got none\n  - want: {want}"),
      Reason::NoPos(got) => write!(f, "got an error with no position: {got}"),
      Reason::GotButNotWanted(r, got) => {
        write!(f, "{r}: got an error, but wanted none\n  - got:  {got}")
      }
      Reason::Mismatched(want_r, got_r, want, got) => {
        writeln!(f, "mismatched errors")?;
        writeln!(f, "  - want: {want_r}: {want}")?;
        write!(f, "  - got:  {got_r}: {got}")
      }
    }
  }
}
