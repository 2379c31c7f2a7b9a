//! Rewriting derived forms into core forms.
//!
//! After simplification, expressions are only special constants, paths, records, vectors, `let`,
//! application, typed, `handle`, `raise`, and `fn`. Patterns have no tuples or lists, types have
//! no tuples, and declarations have no `fun` or `do`. Simplifying a simplified tree returns an
//! identical tree.

use crate::{
  Arm, ConBind, DatBind, Dec, ExBind, Exp, FunBind, FunctorBind, Lab, Located, Pat, Path, SigBind,
  SigExp, Spec, StrBind, StrDesc, StrExp, Ty, TyBind, ValBind, ValDesc,
};
use str_util::Name;

/// Something that can be simplified.
pub trait Simplify {
  /// Returns the simplified form of this.
  #[must_use]
  fn simplify(&self) -> Self;
}

impl<T> Simplify for Box<T>
where
  T: Simplify,
{
  fn simplify(&self) -> Self {
    Box::new(self.as_ref().simplify())
  }
}

impl<T> Simplify for Option<T>
where
  T: Simplify,
{
  fn simplify(&self) -> Self {
    self.as_ref().map(Simplify::simplify)
  }
}

impl<T> Simplify for Vec<T>
where
  T: Simplify,
{
  fn simplify(&self) -> Self {
    self.iter().map(Simplify::simplify).collect()
  }
}

const WHILE_NAME: &str = "__whl";
const SELECTOR_NAME: &str = "__rs";

fn arg_name(idx: usize) -> Name {
  Name::new(format!("__arg{idx}"))
}

fn rows<T, F>(xs: &[Located<T>], f: F) -> Vec<(Lab, Located<T>)>
where
  F: Fn(&Located<T>) -> Located<T>,
{
  xs.iter().enumerate().map(|(idx, x)| (Lab::tuple(idx), f(x))).collect()
}

fn bool_arms(pos: usize, on_true: Located<Exp>, on_false: Located<Exp>) -> Vec<Arm> {
  vec![
    Arm { pat: Located::new(Pat::name("true"), pos), exp: on_true },
    Arm { pat: Located::new(Pat::name("false"), pos), exp: on_false },
  ]
}

fn app(func: Located<Exp>, arg: Located<Exp>) -> Exp {
  Exp::App(Box::new(func), Box::new(arg))
}

impl Simplify for Located<Exp> {
  fn simplify(&self) -> Self {
    let pos = self.pos;
    let val = match &self.val {
      Exp::SCon(_) | Exp::Path(_, _) => self.val.clone(),
      Exp::Record(rs) => {
        Exp::Record(rs.iter().map(|(lab, e)| (lab.clone(), e.simplify())).collect())
      }
      Exp::Selector(lab) => {
        let pat = Pat::Record {
          rows: vec![(lab.clone(), Located::new(Pat::name(SELECTOR_NAME), pos))],
          rest: true,
        };
        let exp = Located::new(Exp::name(SELECTOR_NAME), pos);
        let arm = Arm { pat: Located::new(pat, pos), exp };
        Exp::Fn(vec![arm])
      }
      Exp::Tuple(es) => Exp::Record(rows(es, Simplify::simplify)),
      Exp::List(es) => {
        let mut ac = Located::new(Exp::name("nil"), pos);
        for e in es.iter().rev() {
          let rows = vec![(Lab::tuple(0), e.simplify()), (Lab::tuple(1), ac)];
          let pair = Located::new(Exp::Record(rows), e.pos);
          ac = Located::new(app(Located::new(Exp::name("::"), e.pos), pair), e.pos);
        }
        return ac;
      }
      Exp::Vector(es) => Exp::Vector(es.simplify()),
      Exp::Seq(es) => {
        let mut iter = es.iter().rev();
        let Some(last) = iter.next() else { return Located::new(Exp::Record(Vec::new()), pos) };
        let mut ac = last.simplify();
        for e in iter {
          let arm = Arm { pat: Located::new(Pat::Wild, e.pos), exp: ac };
          ac = Located::new(app(Located::new(Exp::Fn(vec![arm]), e.pos), e.simplify()), e.pos);
        }
        return ac;
      }
      Exp::Let(dec, e) => Exp::Let(dec.simplify(), e.simplify()),
      Exp::App(f, x) => Exp::App(f.simplify(), x.simplify()),
      Exp::Typed(e, ty) => Exp::Typed(e.simplify(), ty.simplify()),
      Exp::Andalso(a, b) => {
        let arms = bool_arms(pos, b.as_ref().simplify(), Located::new(Exp::name("false"), pos));
        app(Located::new(Exp::Fn(arms), pos), a.as_ref().simplify())
      }
      Exp::Orelse(a, b) => {
        let arms = bool_arms(pos, Located::new(Exp::name("true"), pos), b.as_ref().simplify());
        app(Located::new(Exp::Fn(arms), pos), a.as_ref().simplify())
      }
      Exp::Handle(e, matcher) => Exp::Handle(e.simplify(), matcher.simplify()),
      Exp::Raise(e) => Exp::Raise(e.simplify()),
      Exp::If(c, t, e) => {
        let arms = bool_arms(pos, t.as_ref().simplify(), e.as_ref().simplify());
        app(Located::new(Exp::Fn(arms), pos), c.as_ref().simplify())
      }
      Exp::While(cond, body) => return while_loop(pos, cond, body).simplify(),
      Exp::Case(head, matcher) => {
        app(Located::new(Exp::Fn(matcher.simplify()), pos), head.as_ref().simplify())
      }
      Exp::Fn(matcher) => Exp::Fn(matcher.simplify()),
    };
    Located::new(val, pos)
  }
}

/// `let val rec __whl = fn () => if c then (b; __whl ()) else () in __whl () end`
fn while_loop(pos: usize, cond: &Located<Exp>, body: &Located<Exp>) -> Located<Exp> {
  let lp = |val: Exp| Located::new(val, pos);
  let call = || lp(app(lp(Exp::name(WHILE_NAME)), lp(Exp::unit())));
  let then = lp(Exp::Seq(vec![body.clone(), call()]));
  let if_ = lp(Exp::If(Box::new(cond.clone()), Box::new(then), Box::new(lp(Exp::unit()))));
  let func = lp(Exp::Fn(vec![Arm { pat: Located::new(Pat::unit(), pos), exp: if_ }]));
  let bind = ValBind { rec: true, pat: Located::new(Pat::name(WHILE_NAME), pos), exp: func };
  let dec = Located::new(Dec::Val(Vec::new(), vec![bind]), pos);
  lp(Exp::Let(Box::new(dec), Box::new(call())))
}

impl Simplify for Arm {
  fn simplify(&self) -> Self {
    Arm { pat: self.pat.simplify(), exp: self.exp.simplify() }
  }
}

impl Simplify for Located<Pat> {
  fn simplify(&self) -> Self {
    let pos = self.pos;
    let val = match &self.val {
      Pat::Wild | Pat::SCon(_) | Pat::Path(_, _) => self.val.clone(),
      Pat::Con(path, arg) => Pat::Con(path.clone(), arg.simplify()),
      Pat::Record { rows, rest } => Pat::Record {
        rows: rows.iter().map(|(lab, p)| (lab.clone(), p.simplify())).collect(),
        rest: *rest,
      },
      Pat::Tuple(ps) => Pat::Record { rows: rows(ps, Simplify::simplify), rest: false },
      Pat::List(ps) => {
        let mut ac = Located::new(Pat::name("nil"), pos);
        for p in ps.iter().rev() {
          let rows = vec![(Lab::tuple(0), p.simplify()), (Lab::tuple(1), ac)];
          let pair = Located::new(Pat::Record { rows, rest: false }, p.pos);
          ac = Located::new(Pat::Con(Path::one(Name::new("::")), Box::new(pair)), p.pos);
        }
        return ac;
      }
      Pat::Vector(ps) => Pat::Vector(ps.simplify()),
      Pat::Typed(p, ty) => Pat::Typed(p.simplify(), ty.simplify()),
      Pat::As(name, ty, p) => Pat::As(name.clone(), ty.simplify(), p.simplify()),
      Pat::Conj(a, b) => Pat::Conj(a.simplify(), b.simplify()),
      Pat::Or(ps) => Pat::Or(ps.simplify()),
      Pat::Guard(p, q, e) => Pat::Guard(p.simplify(), q.simplify(), e.simplify()),
    };
    Located::new(val, pos)
  }
}

impl Simplify for Located<Ty> {
  fn simplify(&self) -> Self {
    let val = match &self.val {
      Ty::Var(_) => self.val.clone(),
      Ty::Record(rs) => Ty::Record(rs.iter().map(|(lab, t)| (lab.clone(), t.simplify())).collect()),
      Ty::Tuple(ts) => Ty::Record(rows(ts, Simplify::simplify)),
      Ty::Con(args, path) => Ty::Con(args.simplify(), path.clone()),
      Ty::Fn(a, b) => Ty::Fn(a.simplify(), b.simplify()),
    };
    self.wrap(val)
  }
}

impl Simplify for Located<Dec> {
  fn simplify(&self) -> Self {
    let pos = self.pos;
    let val = match &self.val {
      Dec::Val(ty_vars, binds) => Dec::Val(ty_vars.clone(), binds.simplify()),
      Dec::Fun(ty_vars, binds) => {
        Dec::Val(ty_vars.clone(), binds.iter().map(|b| fun_bind(pos, b)).collect())
      }
      Dec::Ty(binds) => Dec::Ty(binds.simplify()),
      Dec::Datatype(dats, tys) => Dec::Datatype(dats.simplify(), tys.simplify()),
      Dec::DatatypeCopy(_, _)
      | Dec::Open(_)
      | Dec::Infix(_, _)
      | Dec::Infixr(_, _)
      | Dec::Nonfix(_) => self.val.clone(),
      Dec::Abstype(dats, tys, dec) => Dec::Abstype(dats.simplify(), tys.simplify(), dec.simplify()),
      Dec::Exception(binds) => Dec::Exception(binds.simplify()),
      Dec::Local(a, b) => Dec::Local(a.simplify(), b.simplify()),
      Dec::Seq(decs) => Dec::Seq(decs.simplify()),
      Dec::Do(exp) => {
        let pat = Located::new(Pat::Record { rows: Vec::new(), rest: false }, exp.pos);
        Dec::Val(Vec::new(), vec![ValBind { rec: false, pat, exp: exp.as_ref().simplify() }])
      }
      Dec::Structure(binds) => Dec::Structure(binds.simplify()),
      Dec::Signature(binds) => Dec::Signature(binds.simplify()),
      Dec::Functor(binds) => Dec::Functor(binds.simplify()),
    };
    Located::new(val, pos)
  }
}

/// `fun f p11 ... p1n = e1 | ...` becomes
///
/// ```text
/// val rec f = fn __arg0 => ... fn __argn =>
///   case (__arg0, ..., __argn) of (p11, ..., p1n) => e1 | ...
/// ```
fn fun_bind(pos: usize, bind: &FunBind) -> ValBind {
  let lp = |val| Located::new(val, pos);
  let arity = bind.clauses.first().map_or(0, |c| c.pats.len());
  let arms: Vec<_> = bind
    .clauses
    .iter()
    .map(|clause| {
      let pat = match clause.pats.as_slice() {
        [one] => one.clone(),
        pats => Located::new(Pat::Tuple(pats.to_vec()), pats.first().map_or(pos, |p| p.pos)),
      };
      let exp = match &clause.ret_ty {
        None => clause.body.clone(),
        Some(ty) => clause.body.wrap(Exp::Typed(Box::new(clause.body.clone()), ty.clone())),
      };
      Arm { pat, exp }
    })
    .collect();
  let mut args: Vec<_> =
    (0..arity).map(|idx| lp(Exp::Path(Path::one(arg_name(idx)), false))).collect();
  let head = if args.len() == 1 { args.swap_remove(0) } else { lp(Exp::Tuple(args)) };
  let mut exp = lp(Exp::Case(Box::new(head), arms));
  for idx in (0..arity).rev() {
    let pat = Located::new(Pat::Path(Path::one(arg_name(idx)), false), pos);
    exp = lp(Exp::Fn(vec![Arm { pat, exp }]));
  }
  let pat = Located::new(Pat::Path(Path::one(bind.name.clone()), false), pos);
  ValBind { rec: true, pat, exp: exp.simplify() }
}

impl Simplify for ValBind {
  fn simplify(&self) -> Self {
    ValBind { rec: self.rec, pat: self.pat.simplify(), exp: self.exp.simplify() }
  }
}

impl Simplify for TyBind {
  fn simplify(&self) -> Self {
    TyBind { ty_vars: self.ty_vars.clone(), name: self.name.clone(), ty: self.ty.simplify() }
  }
}

impl Simplify for DatBind {
  fn simplify(&self) -> Self {
    DatBind { ty_vars: self.ty_vars.clone(), name: self.name.clone(), cons: self.cons.simplify() }
  }
}

impl Simplify for ConBind {
  fn simplify(&self) -> Self {
    ConBind { name: self.name.clone(), ty: self.ty.simplify() }
  }
}

impl Simplify for ExBind {
  fn simplify(&self) -> Self {
    match self {
      ExBind::New(name, ty) => ExBind::New(name.clone(), ty.simplify()),
      ExBind::Copy(_, _) => self.clone(),
    }
  }
}

impl Simplify for StrBind {
  fn simplify(&self) -> Self {
    StrBind { name: self.name.clone(), str_exp: self.str_exp.simplify() }
  }
}

impl Simplify for SigBind {
  fn simplify(&self) -> Self {
    SigBind { name: self.name.clone(), sig_exp: self.sig_exp.simplify() }
  }
}

impl Simplify for FunctorBind {
  fn simplify(&self) -> Self {
    FunctorBind {
      name: self.name.clone(),
      param: self.param.clone(),
      param_sig: self.param_sig.simplify(),
      body: self.body.simplify(),
    }
  }
}

impl Simplify for Located<StrExp> {
  fn simplify(&self) -> Self {
    let val = match &self.val {
      StrExp::Struct(dec) => StrExp::Struct(dec.simplify()),
      StrExp::Path(_) => self.val.clone(),
      StrExp::Ascription(str_exp, asc, sig_exp) => {
        StrExp::Ascription(str_exp.simplify(), *asc, sig_exp.simplify())
      }
      StrExp::App(name, arg) => StrExp::App(name.clone(), arg.simplify()),
      StrExp::Let(dec, str_exp) => StrExp::Let(dec.simplify(), str_exp.simplify()),
    };
    self.wrap(val)
  }
}

impl Simplify for Located<SigExp> {
  fn simplify(&self) -> Self {
    let val = match &self.val {
      SigExp::Spec(spec) => SigExp::Spec(spec.simplify()),
      SigExp::Name(_) => self.val.clone(),
      SigExp::Where(sig_exp, ty_vars, path, ty) => {
        SigExp::Where(sig_exp.simplify(), ty_vars.clone(), path.clone(), ty.simplify())
      }
    };
    self.wrap(val)
  }
}

impl Simplify for Located<Spec> {
  fn simplify(&self) -> Self {
    let val = match &self.val {
      Spec::Val(descs) => Spec::Val(
        descs.iter().map(|d| ValDesc { name: d.name.clone(), ty: d.ty.simplify() }).collect(),
      ),
      Spec::Ty(_) | Spec::EqTy(_) | Spec::DatatypeCopy(_, _) => self.val.clone(),
      Spec::TyAlias(binds) => Spec::TyAlias(binds.simplify()),
      Spec::Datatype(dats) => Spec::Datatype(dats.simplify()),
      Spec::Exception(descs) => Spec::Exception(
        descs.iter().map(|d| crate::ExDesc { name: d.name.clone(), ty: d.ty.simplify() }).collect(),
      ),
      Spec::Str(descs) => Spec::Str(
        descs
          .iter()
          .map(|d| StrDesc { name: d.name.clone(), sig_exp: d.sig_exp.simplify() })
          .collect(),
      ),
      Spec::Include(sig_exp) => Spec::Include(sig_exp.simplify()),
      Spec::Seq(specs) => Spec::Seq(specs.simplify()),
      Spec::Sharing(spec, kind, paths) => Spec::Sharing(spec.simplify(), *kind, paths.clone()),
    };
    self.wrap(val)
  }
}

#[cfg(test)]
mod tests {
  use super::Simplify as _;
  use crate::{Exp, Lab, Located, SCon};
  use pretty_assertions::assert_eq;

  fn int(n: i64) -> Located<Exp> {
    Located::new(Exp::SCon(SCon::Int(n)), 0)
  }

  #[test]
  fn tuple_to_record() {
    let tuple = Located::new(Exp::Tuple(vec![int(11), int(12)]), 0);
    let once = tuple.simplify();
    assert_eq!(once.val, Exp::Record(vec![(Lab::Num(1), int(11)), (Lab::Num(2), int(12))]));
    assert_eq!(once.simplify(), once);
  }

  #[test]
  fn while_is_idempotent() {
    let cond = Located::new(Exp::name("c"), 0);
    let body = Located::new(Exp::name("b"), 0);
    let w = Located::new(Exp::While(Box::new(cond), Box::new(body)), 0);
    let once = w.simplify();
    assert!(matches!(once.val, Exp::Let(_, _)));
    assert_eq!(once.simplify(), once);
  }

  #[test]
  fn list_to_cons() {
    let list = Located::new(Exp::List(vec![int(1), int(2)]), 0);
    let once = list.simplify();
    assert_eq!(once.to_string(), "::({1 = 1, 2 = ::({1 = 2, 2 = nil})})");
    assert_eq!(once.simplify(), once);
  }
}
