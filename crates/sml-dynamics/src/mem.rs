//! See [`Mem`].

use sml_state::Val;
use sml_state::std_basis::FIRST_FREE_STAMP;

/// The memory reference cells live in, and the counter for exception stamps. It outlives a
/// single evaluation.
#[derive(Debug)]
pub struct Mem {
  cells: Vec<Val>,
  next_exn: u32,
  log: Vec<(usize, Val)>,
}

impl Default for Mem {
  fn default() -> Self {
    Self { cells: Vec::new(), next_exn: FIRST_FREE_STAMP, log: Vec::new() }
  }
}

impl Mem {
  /// Returns the contents of the cell.
  #[must_use]
  pub fn get(&self, addr: usize) -> Option<&Val> {
    self.cells.get(addr)
  }

  /// Returns the number of cells ever made.
  #[must_use]
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  /// Returns whether no cells were ever made.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub(crate) fn alloc(&mut self, val: Val) -> usize {
    let addr = self.cells.len();
    self.log.push((addr, val.clone()));
    self.cells.push(val);
    addr
  }

  /// Returns false if there is no such cell.
  pub(crate) fn set(&mut self, addr: usize, val: Val) -> bool {
    let Some(cell) = self.cells.get_mut(addr) else { return false };
    *cell = val.clone();
    self.log.push((addr, val));
    true
  }

  pub(crate) fn fresh_exn(&mut self) -> u32 {
    let ret = self.next_exn;
    self.next_exn += 1;
    ret
  }

  /// Returns the writes since the last call, oldest first.
  pub(crate) fn take_log(&mut self) -> Vec<(usize, Val)> {
    std::mem::take(&mut self.log)
  }
}
