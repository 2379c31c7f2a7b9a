//! Stepping a stack machine.
//!
//! Nothing here recurses on the program: work still to do is kept in frames on a heap-allocated
//! stack, so deep recursion in the program does not overflow the native stack.

use crate::builtin;
use crate::error::{Error, ErrorKind, Item};
use crate::interface;
use crate::pat_match;
use crate::types::{Done, Escape, Frame, FrameKind, St, Step, ValEnv, layer, layer_vals};
use fast_hash::FxHashMap;
use sml_ast::{Arm, DatBind, Dec, ExBind, Exp, Located, Matcher, Pat, Path, Pos, StrExp, TyBind};
use sml_state::std_basis::PrimExn;
use sml_state::{
  Closure, Con, ConKind, DynamicBasis, DynamicInterface, Functor, IdStatus, State, Val,
};
use std::collections::BTreeMap;
use std::rc::Rc;
use str_util::Name;

/// Steps until there are no frames left.
pub(crate) fn run(st: &mut St<'_>, mut s: Step) -> Result<Done, Error> {
  loop {
    s = match s {
      Step::Val(v) if st.frames.is_empty() => return Ok(Done::Val(v)),
      Step::Raise(v) if st.frames.is_empty() => return Ok(Done::Raise(v)),
      Step::Basis(b) if st.frames.is_empty() => return Ok(Done::Basis(b)),
      s => step(st, s)?,
    };
  }
}

fn step(st: &mut St<'_>, s: Step) -> Result<Step, Error> {
  match s {
    Step::Exp(exp) => exp_step(st, exp),
    Step::Val(val) => match st.frames.pop() {
      None => unreachable!("no frame for a value"),
      Some(frame) => val_frame(st, frame, val),
    },
    Step::Raise(exn) => {
      while let Some(frame) = st.frames.pop() {
        // every other frame is abandoned.
        if let FrameKind::Handle(matcher) = frame.kind
          && let Some(s) = arms(st, &frame.env, &matcher, &exn)?
        {
          return Ok(s);
        }
      }
      Ok(Step::Raise(exn))
    }
    Step::Dec(dec) => dec_step(st, dec),
    Step::StrExp(str_exp) => str_exp_step(st, str_exp),
    Step::Basis(basis) => match st.frames.pop() {
      None => unreachable!("no frame for a basis"),
      Some(frame) => basis_frame(st, frame, basis),
    },
  }
}

fn exp_step(st: &mut St<'_>, exp: Located<Exp>) -> Result<Step, Error> {
  let pos = exp.pos;
  match exp.val {
    Exp::SCon(scon) => Ok(Step::Val(Val::SCon(scon))),
    Exp::Path(path, _) => match st.env.dynamic_lookup(&path, |b| &b.val_env) {
      Some((val, _)) => Ok(Step::Val(val.clone())),
      None => Err(Error::new(pos, ErrorKind::Undefined(Item::Val, path.to_string()))),
    },
    Exp::Record(mut rows) => {
      rows.reverse();
      match rows.pop() {
        None => Ok(Step::Val(Val::unit())),
        Some((lab, exp)) => {
          st.push(pos, FrameKind::Record(BTreeMap::new(), lab, rows));
          Ok(Step::Exp(exp))
        }
      }
    }
    Exp::Vector(mut exps) => {
      exps.reverse();
      match exps.pop() {
        None => Ok(Step::Val(Val::Vector(Rc::from(Vec::new())))),
        Some(exp) => {
          st.push(pos, FrameKind::Vector(Vec::new(), exps));
          Ok(Step::Exp(exp))
        }
      }
    }
    Exp::Let(dec, body) => {
      st.push(pos, FrameKind::Let(*body));
      Ok(Step::Dec(*dec))
    }
    Exp::App(func, arg) => {
      st.push(pos, FrameKind::AppFunc(*arg));
      Ok(Step::Exp(*func))
    }
    Exp::Typed(inner, _) => Ok(Step::Exp(*inner)),
    Exp::Handle(inner, matcher) => {
      st.push(pos, FrameKind::Handle(matcher));
      Ok(Step::Exp(*inner))
    }
    Exp::Raise(inner) => {
      st.push(pos, FrameKind::Raise);
      Ok(Step::Exp(*inner))
    }
    Exp::Fn(matcher) => {
      let env = Rc::clone(&st.env);
      let clos = Closure { env, rec: Rc::from(Vec::new()), matcher: Rc::new(matcher) };
      Ok(Step::Val(Val::Closure(Rc::new(clos))))
    }
    Exp::Selector(_)
    | Exp::Tuple(_)
    | Exp::List(_)
    | Exp::Seq(_)
    | Exp::Andalso(_, _)
    | Exp::Orelse(_, _)
    | Exp::If(_, _, _)
    | Exp::While(_, _)
    | Exp::Case(_, _) => unreachable!("derived expression after simplification"),
  }
}

fn val_frame(st: &mut St<'_>, frame: Frame, val: Val) -> Result<Step, Error> {
  let pos = frame.pos;
  match frame.kind {
    FrameKind::Record(mut done, lab, mut rest) => {
      done.insert(lab, val);
      match rest.pop() {
        None => Ok(Step::Val(Val::Record(done))),
        Some((lab, exp)) => {
          st.env = frame.env;
          st.push(pos, FrameKind::Record(done, lab, rest));
          Ok(Step::Exp(exp))
        }
      }
    }
    FrameKind::Vector(mut done, mut rest) => {
      done.push(val);
      match rest.pop() {
        None => Ok(Step::Val(Val::Vector(Rc::from(done)))),
        Some(exp) => {
          st.env = frame.env;
          st.push(pos, FrameKind::Vector(done, rest));
          Ok(Step::Exp(exp))
        }
      }
    }
    FrameKind::AppFunc(arg) => {
      st.env = frame.env;
      st.push(pos, FrameKind::AppArg(val));
      Ok(Step::Exp(arg))
    }
    FrameKind::AppArg(func) => apply(st, pos, func, val),
    FrameKind::Raise => Ok(Step::Raise(val)),
    // the head did not raise.
    FrameKind::Handle(_) => Ok(Step::Val(val)),
    FrameKind::ValBind(mut done, pat, mut rest) => {
      let mut ac = ValEnv::default();
      match pat_match::get(st, &frame.env, &mut ac, &pat, &val) {
        Ok(true) => {}
        Ok(false) => return Ok(Step::Raise(PrimExn::Bind.val())),
        Err(e) => return escape(e),
      }
      done.extend(ac);
      match rest.pop() {
        None => Ok(Step::Basis(DynamicBasis { val_env: done, ..DynamicBasis::default() })),
        Some(bind) => {
          st.env = frame.env;
          st.push(pos, FrameKind::ValBind(done, bind.pat, rest));
          Ok(Step::Exp(bind.exp))
        }
      }
    }
    FrameKind::Let(_)
    | FrameKind::DecSeq(_, _)
    | FrameKind::Local(_)
    | FrameKind::Abstype(_)
    | FrameKind::StrBind(_, _, _)
    | FrameKind::Ascription(_)
    | FrameKind::FunctorArg(_, _)
    | FrameKind::StrLet(_) => unreachable!("bad surrounding frame for a value"),
  }
}

fn apply(st: &mut St<'_>, pos: Pos, func: Val, arg: Val) -> Result<Step, Error> {
  match func {
    Val::Closure(clos) => {
      let env = closure_env(&clos);
      match arms(st, &env, &clos.matcher, &arg)? {
        Some(s) => Ok(s),
        None => Ok(Step::Raise(PrimExn::Match.val())),
      }
    }
    Val::Con(con) if con.arg.is_none() => {
      Ok(Step::Val(Val::Con(Con { arg: Some(Box::new(arg)), ..con })))
    }
    Val::Builtin(b) => match builtin::apply(st.mem, pos, b, arg) {
      Ok(v) => Ok(Step::Val(v)),
      Err(e) => escape(e),
    },
    Val::SCon(_) | Val::Con(_) | Val::Record(_) | Val::Vector(_) | Val::Ref(_) => {
      Err(Error::new(pos, ErrorKind::Internal("application of a non-function")))
    }
  }
}

/// The closure's scope, with the functions it was declared with bound again.
fn closure_env(clos: &Closure) -> Rc<State> {
  let val_env: ValEnv = clos
    .rec
    .iter()
    .map(|(name, matcher)| {
      let f = Closure {
        env: Rc::clone(&clos.env),
        rec: Rc::clone(&clos.rec),
        matcher: Rc::clone(matcher),
      };
      (name.clone(), (Val::Closure(Rc::new(f)), IdStatus::Val))
    })
    .collect();
  layer_vals(&clos.env, val_env)
}

/// Returns the step into the first arm matching the value, or `None` if none does.
fn arms(
  st: &mut St<'_>,
  env: &Rc<State>,
  matcher: &[Arm],
  val: &Val,
) -> Result<Option<Step>, Error> {
  for arm in matcher {
    let mut ac = ValEnv::default();
    match pat_match::get(st, env, &mut ac, &arm.pat, val) {
      Ok(true) => {
        st.env = layer_vals(env, ac);
        return Ok(Some(Step::Exp(arm.exp.clone())));
      }
      Ok(false) => {}
      Err(Escape::Raise(exn)) => return Ok(Some(Step::Raise(exn))),
      Err(Escape::Error(e)) => return Err(e),
    }
  }
  Ok(None)
}

fn escape(e: Escape) -> Result<Step, Error> {
  match e {
    Escape::Raise(exn) => Ok(Step::Raise(exn)),
    Escape::Error(e) => Err(e),
  }
}

fn dec_step(st: &mut St<'_>, dec: Located<Dec>) -> Result<Step, Error> {
  let pos = dec.pos;
  let mut ret = DynamicBasis::default();
  match dec.val {
    Dec::Val(_, mut binds) => {
      if binds.iter().any(|b| b.rec) {
        ret.val_env = rec_binds(&st.env, pos, binds)?;
      } else {
        binds.reverse();
        let Some(bind) = binds.pop() else { return Ok(Step::Basis(ret)) };
        st.push(pos, FrameKind::ValBind(ValEnv::default(), bind.pat, binds));
        return Ok(Step::Exp(bind.exp));
      }
    }
    Dec::Ty(binds) => {
      for bind in binds {
        ret.ty_env.insert(bind.name, Vec::new());
      }
    }
    Dec::Datatype(dats, withs) => ret = datatypes(&dats, &withs),
    Dec::DatatypeCopy(name, path) => ret = datatype_copy(&st.env, pos, name, &path)?,
    Dec::Abstype(dats, withs, body) => {
      let basis = datatypes(&dats, &withs);
      let names = basis.ty_env.keys().cloned().collect();
      st.push(pos, FrameKind::Abstype(names));
      st.env = layer(&st.env, basis);
      return Ok(Step::Dec(*body));
    }
    Dec::Exception(binds) => {
      for bind in binds {
        let (name, val) = match bind {
          ExBind::New(name, _) => {
            let kind = ConKind::Exn(st.mem.fresh_exn());
            let val = Val::Con(Con { name: name.clone(), kind, arg: None });
            (name, val)
          }
          ExBind::Copy(name, path) => match st.env.dynamic_lookup(&path, |b| &b.val_env) {
            Some((val, IdStatus::Exn)) => (name, val.clone()),
            Some(_) => return Err(Error::new(pos, ErrorKind::NotExn(path.to_string()))),
            None => {
              return Err(Error::new(pos, ErrorKind::Undefined(Item::Val, path.to_string())));
            }
          },
        };
        ret.val_env.insert(name, (val, IdStatus::Exn));
      }
    }
    Dec::Local(local, body) => {
      st.push(pos, FrameKind::Local(*body));
      return Ok(Step::Dec(*local));
    }
    Dec::Open(paths) => {
      for path in paths {
        let names: Vec<_> = path.all_names().cloned().collect();
        let Some(basis) = st.env.dynamic_str(&names) else {
          return Err(Error::new(pos, ErrorKind::Undefined(Item::Str, path.to_string())));
        };
        ret.extend(basis.clone());
      }
    }
    Dec::Seq(mut decs) => {
      decs.reverse();
      let Some(first) = decs.pop() else { return Ok(Step::Basis(ret)) };
      st.push(pos, FrameKind::DecSeq(DynamicBasis::default(), decs));
      return Ok(Step::Dec(first));
    }
    Dec::Infix(_, _) | Dec::Infixr(_, _) | Dec::Nonfix(_) => {}
    Dec::Structure(mut binds) => {
      binds.reverse();
      let Some(bind) = binds.pop() else { return Ok(Step::Basis(ret)) };
      st.push(pos, FrameKind::StrBind(FxHashMap::default(), bind.name, binds));
      return Ok(Step::StrExp(bind.str_exp));
    }
    Dec::Signature(binds) => {
      for bind in binds {
        let interface = interface::sig_exp(&st.env, &bind.sig_exp)?;
        ret.sig_env.insert(bind.name, interface);
      }
    }
    Dec::Functor(binds) => {
      for bind in binds {
        let interface = interface::sig_exp(&st.env, &bind.param_sig)?;
        let env = Rc::clone(&st.env);
        let functor = Functor { param: bind.param, interface, body: bind.body, env };
        ret.fun_env.insert(bind.name, Rc::new(functor));
      }
    }
    Dec::Fun(_, _) | Dec::Do(_) => unreachable!("derived declaration after simplification"),
  }
  Ok(Step::Basis(ret))
}

/// Every expression of a `val rec` is a `fn`.
fn rec_binds(env: &Rc<State>, pos: Pos, binds: Vec<sml_ast::ValBind>) -> Result<ValEnv, Error> {
  let mut fns = Vec::with_capacity(binds.len());
  for bind in binds {
    let (Some(name), Some(matcher)) = (var_name(&bind.pat), fn_matcher(bind.exp)) else {
      return Err(Error::new(pos, ErrorKind::Internal("`val rec` binding is not a function")));
    };
    fns.push((name, Rc::new(matcher)));
  }
  let rec: Rc<[(Name, Rc<Matcher>)]> = Rc::from(fns);
  let ret = rec
    .iter()
    .map(|(name, matcher)| {
      let f = Closure { env: Rc::clone(env), rec: Rc::clone(&rec), matcher: Rc::clone(matcher) };
      (name.clone(), (Val::Closure(Rc::new(f)), IdStatus::Val))
    })
    .collect();
  Ok(ret)
}

fn var_name(pat: &Located<Pat>) -> Option<Name> {
  match &pat.val {
    Pat::Path(path, _) if path.prefix().is_empty() => Some(path.last().clone()),
    Pat::Typed(inner, _) => var_name(inner),
    _ => None,
  }
}

fn fn_matcher(exp: Located<Exp>) -> Option<Matcher> {
  match exp.val {
    Exp::Fn(matcher) => Some(matcher),
    Exp::Typed(inner, _) => fn_matcher(*inner),
    _ => None,
  }
}

fn datatypes(dats: &[DatBind], withs: &[TyBind]) -> DynamicBasis {
  let mut ret = DynamicBasis::default();
  for dat in dats {
    let cons: Vec<_> = dat.cons.iter().map(|c| c.name.clone()).collect();
    for con in &cons {
      ret.val_env.insert(con.clone(), (Val::Con(Con::dat(con.as_str())), IdStatus::Con));
    }
    ret.ty_env.insert(dat.name.clone(), cons);
  }
  for bind in withs {
    ret.ty_env.insert(bind.name.clone(), Vec::new());
  }
  ret
}

fn datatype_copy(env: &State, pos: Pos, name: Name, path: &Path) -> Result<DynamicBasis, Error> {
  let Some(cons) = env.dynamic_lookup(path, |b| &b.ty_env) else {
    return Err(Error::new(pos, ErrorKind::Undefined(Item::Datatype, path.to_string())));
  };
  let mut ret = DynamicBasis::default();
  for con in cons {
    let con_path = Path::new(path.prefix().iter().cloned(), con.clone());
    let val = match env.dynamic_lookup(&con_path, |b| &b.val_env) {
      Some((val, _)) => val.clone(),
      None => Val::Con(Con::dat(con.as_str())),
    };
    ret.val_env.insert(con.clone(), (val, IdStatus::Con));
  }
  ret.ty_env.insert(name, cons.clone());
  Ok(ret)
}

fn basis_frame(st: &mut St<'_>, frame: Frame, basis: DynamicBasis) -> Result<Step, Error> {
  let pos = frame.pos;
  match frame.kind {
    FrameKind::Let(body) => {
      st.env = layer(&frame.env, basis);
      Ok(Step::Exp(body))
    }
    FrameKind::DecSeq(mut done, mut rest) => {
      let env = layer(&frame.env, basis.clone());
      done.extend(basis);
      match rest.pop() {
        None => Ok(Step::Basis(done)),
        Some(dec) => {
          st.env = env;
          st.push(pos, FrameKind::DecSeq(done, rest));
          Ok(Step::Dec(dec))
        }
      }
    }
    FrameKind::Local(body) => {
      st.env = layer(&frame.env, basis);
      Ok(Step::Dec(body))
    }
    FrameKind::Abstype(names) => {
      let mut ret = DynamicBasis::default();
      for name in names {
        ret.ty_env.insert(name, Vec::new());
      }
      ret.extend(basis);
      Ok(Step::Basis(ret))
    }
    FrameKind::StrBind(mut done, name, mut rest) => {
      done.insert(name, basis);
      match rest.pop() {
        None => Ok(Step::Basis(DynamicBasis { str_env: done, ..DynamicBasis::default() })),
        Some(bind) => {
          st.env = frame.env;
          st.push(pos, FrameKind::StrBind(done, bind.name, rest));
          Ok(Step::StrExp(bind.str_exp))
        }
      }
    }
    FrameKind::Ascription(interface) => Ok(Step::Basis(basis.restrict(&interface))),
    FrameKind::FunctorArg(name, functor) => {
      let mut ac = Vec::new();
      missing(&basis, &functor.interface, "", &mut ac);
      ac.sort_unstable();
      for member in ac {
        st.warn(pos, format!("argument of functor `{name}` is missing `{member}`"));
      }
      log::debug!("applying functor `{name}`");
      let arg = basis.restrict(&functor.interface);
      let param = DynamicBasis {
        str_env: [(functor.param.clone(), arg)].into_iter().collect(),
        ..DynamicBasis::default()
      };
      st.env = layer(&functor.env, param);
      Ok(Step::StrExp(functor.body.clone()))
    }
    FrameKind::StrLet(body) => {
      st.env = layer(&frame.env, basis);
      Ok(Step::StrExp(body))
    }
    FrameKind::Record(_, _, _)
    | FrameKind::Vector(_, _)
    | FrameKind::AppFunc(_)
    | FrameKind::AppArg(_)
    | FrameKind::Raise
    | FrameKind::Handle(_)
    | FrameKind::ValBind(_, _, _) => unreachable!("bad surrounding frame for a basis"),
  }
}

/// The names the interface has that the basis lacks.
fn missing(basis: &DynamicBasis, interface: &DynamicInterface, prefix: &str, ac: &mut Vec<String>) {
  let vals = interface.val_env.keys().filter(|n| !basis.val_env.contains_key(*n));
  let tys = interface.ty_env.keys().filter(|n| !basis.ty_env.contains_key(*n));
  ac.extend(vals.chain(tys).map(|n| format!("{prefix}{n}")));
  for (name, inner) in &interface.str_env {
    match basis.str_env.get(name) {
      None => ac.push(format!("{prefix}{name}")),
      Some(basis) => missing(basis, inner, &format!("{prefix}{name}."), ac),
    }
  }
}

fn str_exp_step(st: &mut St<'_>, str_exp: Located<StrExp>) -> Result<Step, Error> {
  let pos = str_exp.pos;
  match str_exp.val {
    StrExp::Struct(dec) => Ok(Step::Dec(*dec)),
    StrExp::Path(path) => {
      let names: Vec<_> = path.all_names().cloned().collect();
      match st.env.dynamic_str(&names) {
        Some(basis) => Ok(Step::Basis(basis.clone())),
        None => Err(Error::new(pos, ErrorKind::Undefined(Item::Str, path.to_string()))),
      }
    }
    StrExp::Ascription(inner, _, sig) => {
      let interface = interface::sig_exp(&st.env, &sig)?;
      st.push(pos, FrameKind::Ascription(interface));
      Ok(Step::StrExp(*inner))
    }
    StrExp::App(name, arg) => {
      let path = Path::one(name.clone());
      let Some(functor) = st.env.dynamic_lookup(&path, |b| &b.fun_env).cloned() else {
        return Err(Error::new(pos, ErrorKind::Undefined(Item::Functor, name.to_string())));
      };
      st.push(pos, FrameKind::FunctorArg(name, functor));
      Ok(Step::StrExp(*arg))
    }
    StrExp::Let(dec, body) => {
      st.push(pos, FrameKind::StrLet(*body));
      Ok(Step::Dec(*dec))
    }
  }
}
