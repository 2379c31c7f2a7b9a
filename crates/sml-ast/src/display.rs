//! Compact displays of trees, mostly for tests and error messages.
//!
//! Application is shown as `f(x)`, so infix resolution results read like `f(f(a,b),c)`.

use crate::{Arm, Exp, Located, Pat, Ty};
use std::fmt;

fn sep<T>(f: &mut fmt::Formatter<'_>, xs: &[T], s: &str) -> fmt::Result
where
  T: fmt::Display,
{
  for (idx, x) in xs.iter().enumerate() {
    if idx != 0 {
      f.write_str(s)?;
    }
    x.fmt(f)?;
  }
  Ok(())
}

fn arms(f: &mut fmt::Formatter<'_>, matcher: &[Arm]) -> fmt::Result {
  for (idx, arm) in matcher.iter().enumerate() {
    if idx != 0 {
      f.write_str(" | ")?;
    }
    write!(f, "{} => {}", arm.pat, arm.exp)?;
  }
  Ok(())
}

impl<T> fmt::Display for Located<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.val.fmt(f)
  }
}

impl fmt::Display for Exp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Exp::SCon(scon) => scon.fmt(f),
      Exp::Path(path, _) => path.fmt(f),
      Exp::Record(rows) => {
        f.write_str("{")?;
        for (idx, (lab, exp)) in rows.iter().enumerate() {
          if idx != 0 {
            f.write_str(", ")?;
          }
          write!(f, "{lab} = {exp}")?;
        }
        f.write_str("}")
      }
      Exp::Selector(lab) => write!(f, "#{lab}"),
      Exp::Tuple(es) => {
        f.write_str("(")?;
        sep(f, es, ",")?;
        f.write_str(")")
      }
      Exp::List(es) => {
        f.write_str("[")?;
        sep(f, es, ",")?;
        f.write_str("]")
      }
      Exp::Vector(es) => {
        f.write_str("#[")?;
        sep(f, es, ",")?;
        f.write_str("]")
      }
      Exp::Seq(es) => {
        f.write_str("(")?;
        sep(f, es, "; ")?;
        f.write_str(")")
      }
      Exp::Let(_, exp) => write!(f, "let ... in {exp} end"),
      Exp::App(func, arg) => match &arg.val {
        Exp::Tuple(_) => write!(f, "{func}{arg}"),
        _ => write!(f, "{func}({arg})"),
      },
      Exp::Typed(exp, ty) => write!(f, "({exp} : {ty})"),
      Exp::Andalso(a, b) => write!(f, "({a} andalso {b})"),
      Exp::Orelse(a, b) => write!(f, "({a} orelse {b})"),
      Exp::Handle(exp, matcher) => {
        write!(f, "({exp} handle ")?;
        arms(f, matcher)?;
        f.write_str(")")
      }
      Exp::Raise(exp) => write!(f, "(raise {exp})"),
      Exp::If(c, t, e) => write!(f, "(if {c} then {t} else {e})"),
      Exp::While(c, b) => write!(f, "(while {c} do {b})"),
      Exp::Case(head, matcher) => {
        write!(f, "(case {head} of ")?;
        arms(f, matcher)?;
        f.write_str(")")
      }
      Exp::Fn(matcher) => {
        f.write_str("(fn ")?;
        arms(f, matcher)?;
        f.write_str(")")
      }
    }
  }
}

impl fmt::Display for Pat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Pat::Wild => f.write_str("_"),
      Pat::SCon(scon) => scon.fmt(f),
      Pat::Path(path, _) => path.fmt(f),
      Pat::Con(path, arg) => match &arg.val {
        Pat::Tuple(_) => write!(f, "{path}{arg}"),
        _ => write!(f, "{path}({arg})"),
      },
      Pat::Record { rows, rest } => {
        f.write_str("{")?;
        for (idx, (lab, pat)) in rows.iter().enumerate() {
          if idx != 0 {
            f.write_str(", ")?;
          }
          write!(f, "{lab} = {pat}")?;
        }
        if *rest {
          f.write_str(if rows.is_empty() { "..." } else { ", ..." })?;
        }
        f.write_str("}")
      }
      Pat::Tuple(ps) => {
        f.write_str("(")?;
        sep(f, ps, ",")?;
        f.write_str(")")
      }
      Pat::List(ps) => {
        f.write_str("[")?;
        sep(f, ps, ",")?;
        f.write_str("]")
      }
      Pat::Vector(ps) => {
        f.write_str("#[")?;
        sep(f, ps, ",")?;
        f.write_str("]")
      }
      Pat::Typed(pat, ty) => write!(f, "({pat} : {ty})"),
      Pat::As(name, None, pat) => write!(f, "({name} as {pat})"),
      Pat::As(name, Some(ty), pat) => write!(f, "({name} : {ty} as {pat})"),
      Pat::Conj(a, b) => write!(f, "({a} as {b})"),
      Pat::Or(ps) => {
        f.write_str("(")?;
        sep(f, ps, " | ")?;
        f.write_str(")")
      }
      Pat::Guard(p, q, e) => write!(f, "({p} with {q} = {e})"),
    }
  }
}

impl fmt::Display for Ty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Ty::Var(tv) => tv.fmt(f),
      Ty::Record(rows) => {
        f.write_str("{")?;
        for (idx, (lab, ty)) in rows.iter().enumerate() {
          if idx != 0 {
            f.write_str(", ")?;
          }
          write!(f, "{lab} : {ty}")?;
        }
        f.write_str("}")
      }
      Ty::Tuple(ts) => {
        f.write_str("(")?;
        sep(f, ts, " * ")?;
        f.write_str(")")
      }
      Ty::Con(args, path) => {
        match args.as_slice() {
          [] => {}
          [arg] => write!(f, "{arg} ")?,
          args => {
            f.write_str("(")?;
            sep(f, args, ", ")?;
            f.write_str(") ")?;
          }
        }
        path.fmt(f)
      }
      Ty::Fn(a, b) => write!(f, "({a} -> {b})"),
    }
  }
}
