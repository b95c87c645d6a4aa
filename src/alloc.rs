use std::{alloc::Layout, ptr::NonNull};

use crate::{
  error::Result,
  resource::TrackingResource,
  upstream::{Malloc, System, Upstream},
};

/// The allocator capability a [`DynArray`](crate::DynArray) is generic over.
///
/// Storage can move between two containers without reallocating only when
/// their allocators report [`is_equal`](Allocator::is_equal).
///
/// # Safety
///
/// A block returned by `allocate` must be at least `layout.size()` bytes,
/// aligned to `layout.align()`, not overlap any other live block, and stay
/// valid until it is passed to `deallocate`. When `is_equal` returns true the
/// two handles must accept each other's blocks in `deallocate`.
///
/// A plain `impl` is rejected:
///
/// ```compile_fail,E0200
/// use std::{alloc::Layout, ptr::NonNull};
/// use dynalloc::{Allocator, Result};
///
/// struct Dangling;
///
/// impl Allocator for Dangling {
///     fn allocate(&self, _layout: Layout) -> Result<NonNull<u8>> {
///         Ok(NonNull::dangling())
///     }
///
///     unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) -> Result<()> {
///         Ok(())
///     }
///
///     fn is_equal(&self, _other: &Self) -> bool {
///         true
///     }
/// }
/// ```
pub unsafe trait Allocator {
  fn allocate(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>>;

  /// # Safety
  ///
  /// `ptr` must have been returned by `allocate` on an equal allocator with
  /// the same `layout`, and must not be used afterwards.
  unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    layout: Layout,
  ) -> Result<()>;

  fn is_equal(
    &self,
    other: &Self,
  ) -> bool;

  /// Writes `value` into an uninitialized slot.
  ///
  /// # Safety
  ///
  /// `slot` must be valid for writes and properly aligned.
  unsafe fn construct<T>(
    &self,
    slot: NonNull<T>,
    value: T,
  ) {
    unsafe { slot.as_ptr().write(value) }
  }

  /// Drops the value in `slot`, leaving it uninitialized.
  ///
  /// # Safety
  ///
  /// `slot` must hold an initialized value that is not used afterwards.
  unsafe fn destroy<T>(
    &self,
    slot: NonNull<T>,
  ) {
    unsafe { slot.as_ptr().drop_in_place() }
  }
}

macro_rules! stateless_allocator {
  ($ty:ty) => {
    unsafe impl Allocator for $ty {
      fn allocate(
        &self,
        layout: Layout,
      ) -> Result<NonNull<u8>> {
        Upstream::allocate(self, layout)
      }

      unsafe fn deallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
      ) -> Result<()> {
        unsafe { Upstream::deallocate(self, ptr, layout) };
        Ok(())
      }

      fn is_equal(
        &self,
        _other: &Self,
      ) -> bool {
        true
      }
    }
  };
}

stateless_allocator!(System);
stateless_allocator!(Malloc);

unsafe impl<U: Upstream> Allocator for &TrackingResource<U> {
  fn allocate(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    (**self).allocate(layout)
  }

  unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    layout: Layout,
  ) -> Result<()> {
    unsafe { (**self).deallocate(ptr, layout) }
  }

  fn is_equal(
    &self,
    other: &Self,
  ) -> bool {
    (**self).is_equal(other)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resource_handles_compare_by_identity() {
    let a = TrackingResource::new();
    let b = TrackingResource::new();

    assert!(Allocator::is_equal(&&a, &&a));
    assert!(!Allocator::is_equal(&&a, &&b));
  }

  #[test]
  fn construct_and_destroy_in_place() {
    let resource = TrackingResource::new();
    let handle = &resource;
    let layout = Layout::new::<String>();

    let slot = Allocator::allocate(&handle, layout).unwrap().cast::<String>();
    unsafe {
      handle.construct(slot, String::from("slot"));
      assert_eq!(slot.as_ref(), "slot");
      handle.destroy(slot);
      Allocator::deallocate(&handle, slot.cast(), layout).unwrap();
    }

    assert_eq!(resource.used_blocks(), 0);
  }

  #[test]
  fn stateless_allocators_are_always_equal() {
    assert!(System.is_equal(&System));
    assert!(Malloc.is_equal(&Malloc));
  }
}
