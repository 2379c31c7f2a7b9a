//! Dynamic interfaces of signatures.

use crate::error::{Error, ErrorKind, Item};
use sml_ast::{Located, Path, SigExp, Spec};
use sml_state::{DynamicInterface, IdStatus, State};

pub(crate) fn sig_exp(env: &State, sig_exp: &Located<SigExp>) -> Result<DynamicInterface, Error> {
  match &sig_exp.val {
    SigExp::Spec(spec) => get(env, &DynamicInterface::default(), spec),
    SigExp::Name(name) => match env.dynamic_lookup(&Path::one(name.clone()), |b| &b.sig_env) {
      Some(interface) => Ok(interface.clone()),
      None => Err(Error::new(sig_exp.pos, ErrorKind::Undefined(Item::Sig, name.to_string()))),
    },
    // types do not matter here.
    SigExp::Where(inner, _, _, _) => self::sig_exp(env, inner),
  }
}

/// `prev` is what the specifications before this one in the same signature specify.
fn get(
  env: &State,
  prev: &DynamicInterface,
  spec: &Located<Spec>,
) -> Result<DynamicInterface, Error> {
  let mut ret = DynamicInterface::default();
  match &spec.val {
    Spec::Val(descs) => {
      for desc in descs {
        ret.val_env.insert(desc.name.clone(), IdStatus::Val);
      }
    }
    Spec::Ty(descs) | Spec::EqTy(descs) => {
      for desc in descs {
        ret.ty_env.insert(desc.name.clone(), Vec::new());
      }
    }
    Spec::TyAlias(binds) => {
      for bind in binds {
        ret.ty_env.insert(bind.name.clone(), Vec::new());
      }
    }
    Spec::Datatype(dats) => {
      for dat in dats {
        let cons: Vec<_> = dat.cons.iter().map(|c| c.name.clone()).collect();
        for con in &cons {
          ret.val_env.insert(con.clone(), IdStatus::Con);
        }
        ret.ty_env.insert(dat.name.clone(), cons);
      }
    }
    Spec::DatatypeCopy(name, path) => {
      let local = if path.prefix().is_empty() { prev.ty_env.get(path.last()) } else { None };
      let Some(cons) = local.or_else(|| env.dynamic_lookup(path, |b| &b.ty_env)) else {
        return Err(Error::new(spec.pos, ErrorKind::Undefined(Item::Datatype, path.to_string())));
      };
      for con in cons {
        ret.val_env.insert(con.clone(), IdStatus::Con);
      }
      ret.ty_env.insert(name.clone(), cons.clone());
    }
    Spec::Exception(descs) => {
      for desc in descs {
        ret.val_env.insert(desc.name.clone(), IdStatus::Exn);
      }
    }
    Spec::Str(descs) => {
      for desc in descs {
        ret.str_env.insert(desc.name.clone(), sig_exp(env, &desc.sig_exp)?);
      }
    }
    Spec::Include(inner) => ret = sig_exp(env, inner)?,
    Spec::Seq(specs) => {
      let mut prev = prev.clone();
      for spec in specs {
        let interface = self::get(env, &prev, spec)?;
        prev.extend(interface.clone());
        ret.extend(interface);
      }
    }
    // sharing only constrains types.
    Spec::Sharing(inner, _, _) => ret = self::get(env, prev, inner)?,
  }
  Ok(ret)
}

#[cfg(test)]
mod tests {
  use super::sig_exp;
  use sml_ast::{Dec, Located};
  use sml_state::IdStatus;
  use str_util::Name;

  fn sig_dec(s: &str) -> Located<Dec> {
    let lex = sml_lex::get(s);
    assert!(lex.errors.is_empty());
    let state = sml_state::std_basis::get();
    sml_parse::get(&lex.tokens, &state, &config::Options::default()).expect("should parse").dec
  }

  #[test]
  fn include_later_wins() {
    let dec = sig_dec(
      r"
signature S = sig
  include sig datatype t = A end
  datatype u = datatype t
  include sig val A : int end
end
",
    );
    let Dec::Signature(binds) = &dec.val else { panic!("not a signature: {dec:?}") };
    let state = sml_state::std_basis::get();
    let interface = sig_exp(&state, &binds[0].sig_exp).expect("should compute");
    assert_eq!(interface.val_env.get(&Name::new("A")), Some(&IdStatus::Val));
    assert_eq!(interface.ty_env.get(&Name::new("u")).map(Vec::len), Some(1));
  }
}
