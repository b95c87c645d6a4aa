use std::{alloc, mem, ptr::NonNull};

use libc::c_void;

use crate::error::{Error, Result};

/// The allocator that ultimately obtains and releases memory.
///
/// # Safety
///
/// `allocate` must return a block of at least `layout.size()` bytes aligned
/// to `layout.align()`, distinct from every other live block it returned.
/// `deallocate` must accept exactly the blocks `allocate` returned, together
/// with the layout they were requested with.
pub unsafe trait Upstream {
  fn allocate(
    &self,
    layout: alloc::Layout,
  ) -> Result<NonNull<u8>>;

  /// # Safety
  ///
  /// `ptr` must come from `allocate` on this upstream with the same `layout`
  /// and must not be used afterwards.
  unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    layout: alloc::Layout,
  );
}

/// Zero-byte requests are padded to one byte so every issued address is unique.
fn padded(layout: alloc::Layout) -> alloc::Layout {
  match alloc::Layout::from_size_align(layout.size().max(1), layout.align()) {
    Ok(padded) => padded,
    Err(_) => layout,
  }
}

fn out_of_memory(layout: alloc::Layout) -> Error {
  Error::OutOfMemory {
    size: layout.size(),
    align: layout.align(),
  }
}

/// The process default allocator (`std::alloc`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

unsafe impl Upstream for System {
  fn allocate(
    &self,
    layout: alloc::Layout,
  ) -> Result<NonNull<u8>> {
    let ptr = unsafe { alloc::alloc(padded(layout)) };
    NonNull::new(ptr).ok_or_else(|| out_of_memory(layout))
  }

  unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    layout: alloc::Layout,
  ) {
    unsafe { alloc::dealloc(ptr.as_ptr(), padded(layout)) }
  }
}

/// libc `posix_memalign` / `free`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Malloc;

unsafe impl Upstream for Malloc {
  fn allocate(
    &self,
    layout: alloc::Layout,
  ) -> Result<NonNull<u8>> {
    // posix_memalign wants a power of two that is a multiple of the pointer size.
    let align = layout.align().max(mem::size_of::<*mut c_void>());
    let mut out: *mut c_void = std::ptr::null_mut();

    let status = unsafe { libc::posix_memalign(&mut out, align, layout.size().max(1)) };
    if status != 0 {
      return Err(out_of_memory(layout));
    }

    NonNull::new(out as *mut u8).ok_or_else(|| out_of_memory(layout))
  }

  unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    _layout: alloc::Layout,
  ) {
    unsafe { libc::free(ptr.as_ptr() as *mut c_void) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exercise<U: Upstream>(upstream: U) {
    let layout = alloc::Layout::from_size_align(24, 16).unwrap();
    let ptr = upstream.allocate(layout).unwrap();

    assert_eq!(ptr.as_ptr() as usize % 16, 0);

    unsafe {
      ptr.as_ptr().write_bytes(0xAB, layout.size());
      assert_eq!(*ptr.as_ptr().add(23), 0xAB);
      upstream.deallocate(ptr, layout);
    }
  }

  #[test]
  fn system_round_trip() {
    exercise(System);
  }

  #[test]
  fn malloc_round_trip() {
    exercise(Malloc);
  }

  #[test]
  fn zero_sized_requests_get_distinct_addresses() {
    let layout = alloc::Layout::from_size_align(0, 1).unwrap();

    for upstream in [&System as &dyn Probe, &Malloc as &dyn Probe] {
      let (a, b) = upstream.pair(layout);
      assert_ne!(a, b);
    }
  }

  trait Probe {
    fn pair(
      &self,
      layout: alloc::Layout,
    ) -> (usize, usize);
  }

  impl<U: Upstream> Probe for U {
    fn pair(
      &self,
      layout: alloc::Layout,
    ) -> (usize, usize) {
      let a = self.allocate(layout).unwrap();
      let b = self.allocate(layout).unwrap();
      let addrs = (a.as_ptr() as usize, b.as_ptr() as usize);
      unsafe {
        self.deallocate(a, layout);
        self.deallocate(b, layout);
      }
      addrs
    }
  }
}
