use std::{alloc::Layout, ptr::NonNull};

/// One block obtained from upstream. Size and alignment never change after
/// creation; only `in_use` flips.
#[derive(Clone, Copy, Debug)]
pub struct Block {
  pub addr: NonNull<u8>,
  pub layout: Layout,
  pub in_use: bool,
}

impl Block {
  pub fn new(
    addr: NonNull<u8>,
    layout: Layout,
  ) -> Self {
    Self {
      addr,
      layout,
      in_use: true,
    }
  }

  /// A free block fits when it is at least as large and at least as strictly
  /// aligned as requested. The address itself is not re-checked.
  pub fn fits(
    &self,
    layout: Layout,
  ) -> bool {
    !self.in_use && self.layout.size() >= layout.size() && self.layout.align() >= layout.align()
  }

  pub fn size(&self) -> usize {
    self.layout.size()
  }
}
