//! Declarations.

use crate::error::{ErrorKind, Item, Result};
use crate::generalize::generalize;
use crate::pat::Binds;
use crate::st::{St, err, layer};
use crate::unify::{is_rigid, unify};
use crate::util::{is_expansive, ty_vars_exp, ty_vars_pat};
use fast_hash::{FxHashMap, FxHashSet};
use sml_ast::simplify::Simplify as _;
use sml_ast::{DatBind, Dec, ExBind, Located, Pat, TyBind, TyVar, ValBind};
use sml_state::std_basis::Prim;
use sml_state::{
  IdStatus, Namespace, Realisation, State, StaticBasis, Ty, TyInfo, TyName, TyScheme, ValInfo,
};
use std::rc::Rc;
use str_util::Name;

pub(crate) fn get(st: &mut St, env: &Rc<State>, dec: &Located<Dec>) -> Result<StaticBasis> {
  let mut ret = StaticBasis::default();
  match &dec.val {
    Dec::Val(ty_vars, binds) => ret = val(st, env, ty_vars, binds)?,
    Dec::Fun(_, _) | Dec::Do(_) => return get(st, env, &dec.simplify()),
    Dec::Ty(binds) => ret.ty_env = ty_binds(env, binds)?,
    Dec::Datatype(dats, withs) => ret = datatype(st, env, dec.pos, dats, withs)?.0,
    Dec::DatatypeCopy(name, path) => ret = datatype_copy(env, dec.pos, name, path)?,
    Dec::Abstype(dats, withs, body) => {
      let (dat_basis, _) = datatype(st, env, dec.pos, dats, withs)?;
      let inner = get(st, &layer(env, dat_basis.clone()), body)?;
      for (name, info) in dat_basis.ty_env {
        ret.ty_env.insert(name, TyInfo::alias(info.ty_fn));
      }
      ret.extend(inner);
    }
    Dec::Exception(binds) => {
      for bind in binds {
        let (name, info) = ex_bind(st, env, dec.pos, bind)?;
        if ret.val_env.insert(name.clone(), info).is_some() {
          return err(dec.pos, ErrorKind::Duplicate(Item::Val, name));
        }
      }
    }
    Dec::Local(local, body) => {
      let local = get(st, env, local)?;
      ret = get(st, &layer(env, local), body)?;
    }
    Dec::Open(paths) => {
      for path in paths {
        let names: Vec<_> = path.all_names().cloned().collect();
        let Some(str) = env.static_str(&names) else {
          if env.str_lacks_statics(&names) {
            return err(dec.pos, ErrorKind::NoStatics(Item::Str, path.to_string()));
          }
          return err(dec.pos, ErrorKind::Undefined(Item::Module, path.to_string()));
        };
        ret.extend(str.clone());
      }
    }
    Dec::Seq(decs) => {
      let mut cur = Rc::clone(env);
      for dec in decs {
        let basis = get(st, &cur, dec)?;
        ret.extend(basis.clone());
        cur = layer(&cur, basis);
      }
    }
    Dec::Infix(_, _) | Dec::Infixr(_, _) | Dec::Nonfix(_) => {}
    Dec::Structure(binds) => ret = crate::top_dec::str_binds(st, env, binds)?,
    Dec::Signature(binds) => ret.sig_env = crate::top_dec::sig_binds(st, env, binds)?,
    Dec::Functor(binds) => ret.fun_env = crate::top_dec::functor_binds(st, env, binds)?,
  }
  Ok(ret)
}

/// If a binding uses something without static information, the names the declaration binds are
/// recorded as skipped.
fn val(
  st: &mut St,
  env: &Rc<State>,
  ty_vars: &[TyVar],
  binds: &[ValBind],
) -> Result<StaticBasis> {
  let mut own = ty_vars.to_vec();
  for bind in binds {
    ty_vars_pat(&bind.pat, &mut own);
    ty_vars_exp(&bind.exp, &mut own);
  }
  own.retain(|tv| !st.ty_var_scope.contains(tv));
  let scope_len = st.ty_var_scope.len();
  st.ty_var_scope.extend(own.iter().cloned());
  let tys = val_tys(st, env, binds);
  st.ty_var_scope.truncate(scope_len);
  let mut ret = StaticBasis::default();
  let tys = match tys {
    Ok(tys) => tys,
    Err(e) if e.is_unsupported() => {
      st.skip(e);
      for bind in binds {
        pat_vars(env, &bind.pat, &mut ret.skipped_vals);
      }
      return Ok(ret);
    }
    Err(e) => return Err(e),
  };
  for (name, ty, expansive) in tys {
    let scheme = generalize(st, env, &ty, expansive, &own);
    if expansive {
      let pos = binds.first().map_or(0, |b| b.pat.pos);
      value_restriction(st, env, pos, &name, &scheme);
    }
    ret.val_env.insert(name, ValInfo { scheme, id_status: IdStatus::Val });
  }
  Ok(ret)
}

/// Adds the variables the pattern binds to `ac`.
fn pat_vars(env: &State, pat: &Located<Pat>, ac: &mut FxHashSet<Name>) {
  match &pat.val {
    Pat::Wild | Pat::SCon(_) => {}
    Pat::Path(path, _) => {
      let is_con = env.id_status(path).is_some_and(IdStatus::is_con);
      if path.prefix().is_empty() && !is_con {
        ac.insert(path.last().clone());
      }
    }
    Pat::Con(_, arg) | Pat::Typed(arg, _) => pat_vars(env, arg, ac),
    Pat::Record { rows, .. } => {
      for (_, pat) in rows {
        pat_vars(env, pat, ac);
      }
    }
    Pat::Tuple(pats) | Pat::List(pats) | Pat::Vector(pats) => {
      for pat in pats {
        pat_vars(env, pat, ac);
      }
    }
    Pat::As(name, _, inner) => {
      ac.insert(name.clone());
      pat_vars(env, inner, ac);
    }
    Pat::Conj(a, b) | Pat::Guard(a, b, _) => {
      pat_vars(env, a, ac);
      pat_vars(env, b, ac);
    }
    Pat::Or(pats) => {
      if let Some(pat) = pats.first() {
        pat_vars(env, pat, ac);
      }
    }
  }
}

/// Returns each name bound, its type, and whether its expression was expansive.
fn val_tys(
  st: &mut St,
  env: &Rc<State>,
  binds: &[ValBind],
) -> Result<Vec<(Name, Ty, bool)>> {
  let mut ret = Vec::new();
  if binds.iter().any(|b| b.rec) {
    let mut rec_binds = Binds::default();
    let mut pat_tys = Vec::with_capacity(binds.len());
    for bind in binds {
      pat_tys.push(crate::pat::get(st, env, &bind.pat, &mut rec_binds)?);
    }
    let rec_env = layer(env, StaticBasis { val_env: rec_binds.clone(), ..StaticBasis::default() });
    for (bind, pat_ty) in binds.iter().zip(pat_tys) {
      let exp_ty = crate::exp::get(st, &rec_env, &bind.exp)?;
      unify(st, bind.exp.pos, &pat_ty, &exp_ty)?;
    }
    ret.extend(rec_binds.into_iter().map(|(name, info)| (name, info.scheme.ty, false)));
    return Ok(ret);
  }
  let mut seen = FxHashSet::default();
  for bind in binds {
    let exp_ty = crate::exp::get(st, env, &bind.exp)?;
    let mut binds = Binds::default();
    let pat_ty = crate::pat::get(st, env, &bind.pat, &mut binds)?;
    unify(st, bind.pat.pos, &pat_ty, &exp_ty)?;
    let expansive = is_expansive(env, &bind.exp);
    for (name, info) in binds {
      if !seen.insert(name.clone()) {
        return err(bind.pat.pos, ErrorKind::Duplicate(Item::Val, name));
      }
      ret.push((name, info.scheme.ty, expansive));
    }
  }
  Ok(ret)
}

fn value_restriction(
  st: &mut St,
  env: &State,
  pos: sml_ast::Pos,
  name: &Name,
  scheme: &TyScheme,
) {
  let mut free = FxHashSet::default();
  scheme.free_vars(&mut free);
  let env_free = st.env_free_vars(env);
  let not_generalized =
    free.iter().any(|tv| !is_rigid(&st.bnd, tv) && !env_free.contains(tv));
  if not_generalized {
    st.warn(pos, format!("type of `{name}` is not generalized: its expression is expansive"));
  }
}

fn ty_binds(env: &State, binds: &[TyBind]) -> Result<FxHashMap<Name, TyInfo>> {
  let mut ret = FxHashMap::default();
  for bind in binds {
    let (name, info) = ty_bind(env, bind)?;
    if ret.insert(name.clone(), info).is_some() {
      return err(bind.ty.pos, ErrorKind::Duplicate(Item::Ty, name));
    }
  }
  Ok(ret)
}

pub(crate) fn ty_bind(env: &State, bind: &TyBind) -> Result<(Name, TyInfo)> {
  let ty = crate::ty::get(env, &bind.ty)?;
  crate::ty::check_bound(bind.ty.pos, &ty, &bind.ty_vars)?;
  let ty_fn = TyScheme { bound: bind.ty_vars.clone(), ty };
  Ok((bind.name.clone(), TyInfo::alias(ty_fn)))
}

/// Elaborates datatypes and their `withtype` types. Returns the bindings and the stamps of the
/// new type names.
pub(crate) fn datatype(
  st: &mut St,
  env: &Rc<State>,
  pos: sml_ast::Pos,
  dats: &[DatBind],
  withs: &[TyBind],
) -> Result<(StaticBasis, Vec<u32>)> {
  let mut ret = StaticBasis::default();
  let mut stamps = Vec::with_capacity(dats.len());
  for dat in dats {
    let stamp = st.fresh_stamp();
    stamps.push(stamp);
    let name = TyName { name: dat.name.clone(), stamp, equality: true };
    let ty_fn = TyScheme { bound: dat.ty_vars.clone(), ty: con_ty(&dat.ty_vars, name) };
    if ret.ty_env.insert(dat.name.clone(), TyInfo::alias(ty_fn)).is_some() {
      return err(pos, ErrorKind::Duplicate(Item::Ty, dat.name.clone()));
    }
  }
  let dat_env = layer(env, ret.clone());
  for bind in withs {
    let (name, info) = ty_bind(&dat_env, bind)?;
    ret.ty_env.insert(name, info);
  }
  let dat_env = layer(env, ret.clone());
  let mut con_args = Vec::with_capacity(dats.len());
  for dat in dats {
    let mut args = Vec::with_capacity(dat.cons.len());
    for con in &dat.cons {
      let arg = match &con.ty {
        None => None,
        Some(ty) => {
          let arg = crate::ty::get(&dat_env, ty)?;
          crate::ty::check_bound(ty.pos, &arg, &dat.ty_vars)?;
          Some(arg)
        }
      };
      args.push((con.name.clone(), arg));
    }
    con_args.push(args);
  }
  let group: Vec<_> = stamps
    .iter()
    .zip(&con_args)
    .map(|(&stamp, args)| (stamp, args.iter().filter_map(|(_, ty)| ty.as_ref()).collect()))
    .collect();
  let eq = crate::equality::datatypes(&group);
  let phi: Realisation = dats
    .iter()
    .zip(&stamps)
    .map(|(dat, &stamp)| {
      let name = TyName { name: dat.name.clone(), stamp, equality: eq.contains(&stamp) };
      (stamp, TyScheme { bound: dat.ty_vars.clone(), ty: con_ty(&dat.ty_vars, name) })
    })
    .collect();
  for bind in withs {
    if let Some(info) = ret.ty_env.get_mut(&bind.name) {
      *info = info.realize(&phi);
    }
  }
  for ((dat, &stamp), args) in dats.iter().zip(&stamps).zip(con_args) {
    let Some(ty_fn) = phi.get(&stamp).cloned() else { continue };
    let mut cons = Vec::with_capacity(args.len());
    for (name, arg) in args {
      let ty = match arg {
        None => ty_fn.ty.clone(),
        Some(arg) => Ty::fun(arg.realize(&phi), ty_fn.ty.clone()),
      };
      let scheme = TyScheme { bound: dat.ty_vars.clone(), ty };
      let info = ValInfo { scheme: scheme.clone(), id_status: IdStatus::Con };
      if ret.val_env.insert(name.clone(), info).is_some() {
        return err(pos, ErrorKind::Duplicate(Item::Val, name));
      }
      cons.push((name, scheme));
    }
    ret.ty_env.insert(dat.name.clone(), TyInfo { ty_fn, cons });
  }
  log::debug!("datatypes {stamps:?}, of which {eq:?} admit equality");
  Ok((ret, stamps))
}

/// `datatype name = datatype path`
pub(crate) fn datatype_copy(
  env: &State,
  pos: sml_ast::Pos,
  name: &Name,
  path: &sml_ast::Path,
) -> Result<StaticBasis> {
  let Some(info) = env.static_lookup(path, Namespace::Ty, |b| &b.ty_env) else {
    if env.lacks_statics(path, Namespace::Ty) {
      return err(pos, ErrorKind::NoStatics(Item::Ty, path.to_string()));
    }
    return err(pos, ErrorKind::Undefined(Item::Ty, path.to_string()));
  };
  let mut ret = StaticBasis::default();
  for (con, scheme) in &info.cons {
    let info = ValInfo { scheme: scheme.clone(), id_status: IdStatus::Con };
    ret.val_env.insert(con.clone(), info);
  }
  ret.ty_env.insert(name.clone(), info.clone());
  Ok(ret)
}

fn con_ty(ty_vars: &[TyVar], name: TyName) -> Ty {
  Ty::Con(ty_vars.iter().cloned().map(Ty::Var).collect(), name)
}

fn ex_bind(
  st: &mut St,
  env: &State,
  pos: sml_ast::Pos,
  bind: &ExBind,
) -> Result<(Name, ValInfo)> {
  match bind {
    ExBind::New(name, ty) => {
      let ty = match ty {
        None => Prim::Exn.ty(),
        Some(ty) => {
          let arg = crate::ty::get(env, ty)?;
          crate::ty::check_bound(ty.pos, &arg, &st.ty_var_scope)?;
          Ty::fun(arg, Prim::Exn.ty())
        }
      };
      Ok((name.clone(), ValInfo { scheme: TyScheme::mono(ty), id_status: IdStatus::Exn }))
    }
    ExBind::Copy(name, path) => match env.static_lookup(path, Namespace::Val, |b| &b.val_env) {
      None if env.lacks_statics(path, Namespace::Val) => {
        err(pos, ErrorKind::NoStatics(Item::Val, path.to_string()))
      }
      None => err(pos, ErrorKind::Undefined(Item::Val, path.to_string())),
      Some(info) => {
        if info.id_status != IdStatus::Exn {
          return err(pos, ErrorKind::NotExn(path.to_string()));
        }
        Ok((name.clone(), info.clone()))
      }
    },
  }
}
