//! Which datatypes admit equality.

use fast_hash::FxHashSet;
use sml_state::{Ty, TyScheme};
use sml_state::std_basis::Prim;

/// Returns the stamps of the datatypes in a group of mutually recursive datatypes that admit
/// equality, given the argument types of each datatype's constructors.
///
/// Starts by assuming every datatype in the group does, and removes ones with a constructor
/// argument that does not until nothing changes.
pub(crate) fn datatypes(group: &[(u32, Vec<&Ty>)]) -> FxHashSet<u32> {
  let stamps: FxHashSet<_> = group.iter().map(|&(stamp, _)| stamp).collect();
  let mut ret = stamps.clone();
  loop {
    let mut changed = false;
    for (stamp, args) in group {
      if ret.contains(stamp) && !args.iter().all(|ty| admits(ty, &stamps, &ret)) {
        ret.remove(stamp);
        changed = true;
      }
    }
    if !changed {
      return ret;
    }
  }
}

/// Returns whether the type function admits equality when its arguments do.
pub(crate) fn ty_fn_admits(ty_fn: &TyScheme) -> bool {
  let none = FxHashSet::default();
  admits(&ty_fn.ty, &none, &none)
}

/// Type variables are the datatype's parameters, which are assumed to admit equality.
fn admits(ty: &Ty, group: &FxHashSet<u32>, eq: &FxHashSet<u32>) -> bool {
  match ty {
    Ty::Var(_) => true,
    Ty::Record(rows, _) => rows.values().all(|ty| admits(ty, group, eq)),
    Ty::Fn(_, _) => false,
    Ty::Con(args, name) => {
      if group.contains(&name.stamp) {
        eq.contains(&name.stamp) && args.iter().all(|ty| admits(ty, group, eq))
      } else if *name == Prim::Ref.ty_name() {
        true
      } else {
        name.equality && args.iter().all(|ty| admits(ty, group, eq))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::datatypes;
  use sml_state::std_basis::Prim;
  use sml_state::{Ty, TyName};
  use str_util::Name;

  fn con(stamp: u32) -> Ty {
    Ty::Con(Vec::new(), TyName { name: Name::new("t"), stamp, equality: true })
  }

  #[test]
  fn mutual() {
    let real = Prim::Real.ty();
    let int = Prim::Int.ty();
    let a_to_b = con(101);
    let b_to_c = con(102);
    let fun = Ty::fun(int.clone(), int.clone());
    // 100 has an int and a 101, 101 has a 102, 102 has a function.
    let group = vec![(100, vec![&int, &a_to_b]), (101, vec![&b_to_c]), (102, vec![&fun])];
    assert!(datatypes(&group).is_empty());
    let group = vec![(100, vec![&int, &a_to_b]), (101, vec![&int])];
    assert_eq!(datatypes(&group).len(), 2);
    let group = vec![(100, vec![&real])];
    assert!(datatypes(&group).is_empty());
  }
}
