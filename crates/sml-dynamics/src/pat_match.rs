//! Matching a value against a pattern.

use crate::error::{Error, ErrorKind, Item};
use crate::types::{Done, Escape, St, Step, ValEnv, layer_vals};
use sml_ast::{Located, Pat, Path};
use sml_state::{Builtin, IdStatus, State, Val};
use std::rc::Rc;

/// Adds the variables the pattern binds to `ac` if the value matches.
pub(crate) fn get(
  st: &mut St<'_>,
  env: &Rc<State>,
  ac: &mut ValEnv,
  pat: &Located<Pat>,
  val: &Val,
) -> Result<bool, Escape> {
  match &pat.val {
    Pat::Wild => Ok(true),
    Pat::SCon(scon) => Ok(matches!(val, Val::SCon(v) if v == scon)),
    Pat::Path(path, _) => match con(env, path) {
      Some(Val::Con(con)) => Ok(matches!(val, Val::Con(v) if v.same_con(con) && v.arg.is_none())),
      Some(_) => Err(internal(pat, "constructor pattern without an argument").into()),
      None => {
        ac.insert(path.last().clone(), (val.clone(), IdStatus::Val));
        Ok(true)
      }
    },
    Pat::Con(path, arg) => match con(env, path) {
      Some(Val::Con(con)) => match val {
        Val::Con(v) if v.same_con(con) => match &v.arg {
          Some(v_arg) => get(st, env, ac, arg, v_arg),
          None => Err(internal(pat, "constructor value without an argument").into()),
        },
        _ => Ok(false),
      },
      Some(Val::Builtin(Builtin::Ref)) => {
        let Val::Ref(addr) = val else {
          return Err(internal(pat, "ref pattern on a non-ref").into());
        };
        let Some(contents) = st.mem.get(*addr).cloned() else {
          return Err(internal(pat, "no such cell").into());
        };
        get(st, env, ac, arg, &contents)
      }
      Some(_) => Err(internal(pat, "not a constructor").into()),
      None => Err(Error::new(pat.pos, ErrorKind::Undefined(Item::Val, path.to_string())).into()),
    },
    Pat::Record { rows, .. } => {
      let Val::Record(val_rows) = val else {
        return Err(internal(pat, "record pattern on a non-record").into());
      };
      for (lab, pat) in rows {
        let Some(v) = val_rows.get(lab) else {
          return Err(internal(pat, "record value missing a label").into());
        };
        if !get(st, env, ac, pat, v)? {
          return Ok(false);
        }
      }
      Ok(true)
    }
    Pat::Vector(pats) => {
      let Val::Vector(vals) = val else {
        return Err(internal(pat, "vector pattern on a non-vector").into());
      };
      if pats.len() != vals.len() {
        return Ok(false);
      }
      for (pat, v) in pats.iter().zip(vals.iter()) {
        if !get(st, env, ac, pat, v)? {
          return Ok(false);
        }
      }
      Ok(true)
    }
    Pat::Typed(inner, _) => get(st, env, ac, inner, val),
    Pat::As(name, _, inner) => {
      ac.insert(name.clone(), (val.clone(), IdStatus::Val));
      get(st, env, ac, inner, val)
    }
    Pat::Conj(a, b) => Ok(get(st, env, ac, a, val)? && get(st, env, ac, b, val)?),
    Pat::Or(alts) => {
      for alt in alts {
        let mut alt_ac = ValEnv::default();
        if get(st, env, &mut alt_ac, alt, val)? {
          ac.extend(alt_ac);
          return Ok(true);
        }
      }
      Ok(false)
    }
    Pat::Guard(inner, guard_pat, guard_exp) => {
      if !get(st, env, ac, inner, val)? {
        return Ok(false);
      }
      let guard_env = layer_vals(env, ac.clone());
      let mut nested = St::new(Rc::clone(&guard_env), &mut *st.mem);
      let done = crate::step::run(&mut nested, Step::Exp(guard_exp.as_ref().clone()));
      let warnings = nested.warnings;
      st.warnings.extend(warnings);
      match done? {
        Done::Val(v) => get(st, &guard_env, ac, guard_pat, &v),
        Done::Raise(exn) => Err(Escape::Raise(exn)),
        Done::Basis(_) => Err(internal(pat, "guard evaluated to a declaration").into()),
      }
    }
    Pat::Tuple(_) | Pat::List(_) => unreachable!("derived pattern after simplification"),
  }
}

/// Returns the constructor the path names, or `None` if it names a variable or nothing.
fn con<'a>(env: &'a State, path: &Path) -> Option<&'a Val> {
  match env.dynamic_lookup(path, |b| &b.val_env) {
    Some((v, IdStatus::Con | IdStatus::Exn)) => Some(v),
    Some((_, IdStatus::Val)) | None => None,
  }
}

fn internal(pat: &Located<Pat>, msg: &'static str) -> Error {
  Error::new(pat.pos, ErrorKind::Internal(msg))
}
