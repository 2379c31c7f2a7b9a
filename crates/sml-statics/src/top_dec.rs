//! Modules: structures, signatures, and functors.

mod enrich;
mod instance;
mod where_ty;

use crate::error::{ErrorKind, Item, Result};
use crate::generalize::free_vars_ordered;
use crate::st::{St, err, layer};
use fast_hash::FxHashMap;
use sml_ast::{Ascription, FunctorBind, Located, Path, SigBind, SigExp, Spec, StrBind, StrExp};
use sml_state::std_basis::Prim;
use sml_state::{
  FunSig, IdStatus, Namespace, Sig, State, StaticBasis, Ty, TyInfo, TyName, TyScheme, ValInfo,
};
use std::collections::BTreeSet;
use std::rc::Rc;
use str_util::Name;

const FUNCTOR_APP: &str = "functor application is not yet supported by the static elaborator";

/// A binding whose structure expression uses something the elaborator does not support is
/// skipped, and its name recorded as bound without static information.
pub(crate) fn str_binds(st: &mut St, env: &Rc<State>, binds: &[StrBind]) -> Result<StaticBasis> {
  let mut ret = StaticBasis::default();
  for bind in binds {
    let dup = ret.str_env.contains_key(&bind.name) || ret.skipped_strs.contains(&bind.name);
    if dup {
      return err(bind.str_exp.pos, ErrorKind::Duplicate(Item::Str, bind.name.clone()));
    }
    match str_exp(st, env, &bind.str_exp) {
      Ok(basis) => {
        ret.str_env.insert(bind.name.clone(), basis);
      }
      Err(e) if e.is_unsupported() => {
        st.skip(e);
        ret.skipped_strs.insert(bind.name.clone());
      }
      Err(e) => return Err(e),
    }
  }
  Ok(ret)
}

pub(crate) fn sig_binds(
  st: &mut St,
  env: &Rc<State>,
  binds: &[SigBind],
) -> Result<FxHashMap<Name, Sig>> {
  let mut ret = FxHashMap::default();
  for bind in binds {
    let sig = sig_exp(st, env, &bind.sig_exp)?;
    if ret.insert(bind.name.clone(), sig).is_some() {
      return err(bind.sig_exp.pos, ErrorKind::Duplicate(Item::Sig, bind.name.clone()));
    }
  }
  Ok(ret)
}

/// The body is checked once, against a fresh instance of the parameter signature.
pub(crate) fn functor_binds(
  st: &mut St,
  env: &Rc<State>,
  binds: &[FunctorBind],
) -> Result<FxHashMap<Name, FunSig>> {
  let mut ret = FxHashMap::default();
  for bind in binds {
    let param_sig = sig_exp(st, env, &bind.param_sig)?;
    let param = StaticBasis {
      str_env: [(bind.param.clone(), param_sig.env.clone())].into_iter().collect(),
      ..StaticBasis::default()
    };
    let body = str_exp(st, &layer(env, param), &bind.body)?;
    log::debug!("functor `{}` has {} flexible types", bind.name, param_sig.ty_names.len());
    let fun_sig = FunSig { param: bind.param.clone(), param_sig, body };
    if ret.insert(bind.name.clone(), fun_sig).is_some() {
      return err(bind.body.pos, ErrorKind::Duplicate(Item::Functor, bind.name.clone()));
    }
  }
  Ok(ret)
}

fn str_exp(st: &mut St, env: &Rc<State>, str_exp: &Located<StrExp>) -> Result<StaticBasis> {
  let pos = str_exp.pos;
  match &str_exp.val {
    StrExp::Struct(dec) => crate::dec::get(st, env, dec),
    StrExp::Path(path) => {
      let names: Vec<_> = path.all_names().cloned().collect();
      if let Some(basis) = env.static_str(&names) {
        return Ok(basis.clone());
      }
      if env.str_lacks_statics(&names) {
        return err(pos, ErrorKind::NoStatics(Item::Str, path.to_string()));
      }
      err(pos, ErrorKind::Undefined(Item::Str, path.to_string()))
    }
    StrExp::Ascription(inner, kind, sig) => {
      let basis = self::str_exp(st, env, inner)?;
      let sig = sig_exp(st, env, sig)?;
      let phi = instance::realisation(pos, &basis, &sig)?;
      let matched = enrich::get(st, pos, &basis, &sig.env.realize(&phi))?;
      match kind {
        Ascription::Transparent => Ok(matched),
        Ascription::Opaque => Ok(sig.env),
      }
    }
    StrExp::App(_, _) => err(pos, ErrorKind::Unsupported(FUNCTOR_APP)),
    StrExp::Let(dec, body) => {
      let basis = crate::dec::get(st, env, dec)?;
      self::str_exp(st, &layer(env, basis), body)
    }
  }
}

fn sig_exp(st: &mut St, env: &Rc<State>, sig_exp: &Located<SigExp>) -> Result<Sig> {
  let pos = sig_exp.pos;
  match &sig_exp.val {
    SigExp::Spec(inner) => {
      let mut ty_names = BTreeSet::new();
      let env = spec(st, env, inner, &mut ty_names)?;
      Ok(Sig { ty_names, env })
    }
    SigExp::Name(name) => {
      let path = Path::one(name.clone());
      if let Some(sig) = env.static_lookup(&path, Namespace::Sig, |b| &b.sig_env) {
        return Ok(instance::fresh(st, sig));
      }
      if env.lacks_statics(&path, Namespace::Sig) {
        return err(pos, ErrorKind::NoStatics(Item::Sig, name.to_string()));
      }
      err(pos, ErrorKind::Undefined(Item::Sig, name.to_string()))
    }
    SigExp::Where(inner, ty_vars, path, ty) => {
      let sig = self::sig_exp(st, env, inner)?;
      where_ty::get(env, pos, sig, ty_vars, path, ty)
    }
  }
}

/// Elaborates a specification, adding the stamps of the type names it leaves flexible to `flex`.
fn spec(
  st: &mut St,
  env: &Rc<State>,
  spec: &Located<Spec>,
  flex: &mut BTreeSet<u32>,
) -> Result<StaticBasis> {
  let pos = spec.pos;
  let mut ret = StaticBasis::default();
  match &spec.val {
    Spec::Val(descs) => {
      for desc in descs {
        let ty = crate::ty::get(env, &desc.ty)?;
        let mut bound = Vec::new();
        free_vars_ordered(&ty, &mut bound);
        let info = ValInfo { scheme: TyScheme { bound, ty }, id_status: IdStatus::Val };
        if ret.val_env.insert(desc.name.clone(), info).is_some() {
          return err(desc.ty.pos, ErrorKind::Duplicate(Item::Val, desc.name.clone()));
        }
      }
    }
    Spec::Ty(descs) | Spec::EqTy(descs) => {
      let equality = matches!(spec.val, Spec::EqTy(_));
      for desc in descs {
        let stamp = st.fresh_stamp();
        flex.insert(stamp);
        let name = TyName { name: desc.name.clone(), stamp, equality };
        let ty = Ty::Con(desc.ty_vars.iter().cloned().map(Ty::Var).collect(), name);
        let info = TyInfo::alias(TyScheme { bound: desc.ty_vars.clone(), ty });
        if ret.ty_env.insert(desc.name.clone(), info).is_some() {
          return err(pos, ErrorKind::Duplicate(Item::Ty, desc.name.clone()));
        }
      }
    }
    Spec::TyAlias(binds) => {
      for bind in binds {
        let (name, info) = crate::dec::ty_bind(env, bind)?;
        if ret.ty_env.insert(name.clone(), info).is_some() {
          return err(bind.ty.pos, ErrorKind::Duplicate(Item::Ty, name));
        }
      }
    }
    Spec::Datatype(dats) => {
      let (basis, stamps) = crate::dec::datatype(st, env, pos, dats, &[])?;
      flex.extend(stamps);
      ret = basis;
    }
    Spec::DatatypeCopy(name, path) => ret = crate::dec::datatype_copy(env, pos, name, path)?,
    Spec::Exception(descs) => {
      for desc in descs {
        let ty = match &desc.ty {
          None => Prim::Exn.ty(),
          Some(ty) => {
            let arg = crate::ty::get(env, ty)?;
            crate::ty::check_bound(ty.pos, &arg, &[])?;
            Ty::fun(arg, Prim::Exn.ty())
          }
        };
        let info = ValInfo { scheme: TyScheme::mono(ty), id_status: IdStatus::Exn };
        if ret.val_env.insert(desc.name.clone(), info).is_some() {
          return err(pos, ErrorKind::Duplicate(Item::Val, desc.name.clone()));
        }
      }
    }
    Spec::Str(descs) => {
      for desc in descs {
        let sig = sig_exp(st, env, &desc.sig_exp)?;
        flex.extend(sig.ty_names);
        if ret.str_env.insert(desc.name.clone(), sig.env).is_some() {
          return err(desc.sig_exp.pos, ErrorKind::Duplicate(Item::Str, desc.name.clone()));
        }
      }
    }
    Spec::Include(inner) => {
      let sig = sig_exp(st, env, inner)?;
      flex.extend(sig.ty_names);
      ret = sig.env;
    }
    Spec::Seq(specs) => {
      let mut scope = Rc::clone(env);
      for inner in specs {
        let basis = self::spec(st, &scope, inner, flex)?;
        scope = layer(&scope, basis.clone());
        ret.extend(basis);
      }
    }
    Spec::Sharing(_, _, _) => return err(pos, ErrorKind::Internal("sharing is not implemented")),
  }
  Ok(ret)
}
