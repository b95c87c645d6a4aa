//! Forward cursors and iterators over [`DynArray`](crate::DynArray) storage.
//!
//! A cursor is a bare position in the buffer: it can be advanced one slot at
//! a time and compared by address, nothing else. Shared and mutable cursors
//! are generated from the same definition so both views have one shape.
//! Cursors borrow the array, so any reallocation invalidates them at compile
//! time.

use std::{fmt, iter::FusedIterator, marker::PhantomData, ptr::NonNull};

macro_rules! cursor {
  ($(#[$meta:meta])* $name:ident, $($mut:tt)?) => {
    $(#[$meta])*
    pub struct $name<'a, T> {
      ptr: NonNull<T>,
      _marker: PhantomData<&'a $($mut)? T>,
    }

    impl<'a, T> $name<'a, T> {
      pub(crate) fn new(ptr: NonNull<T>) -> Self {
        Self {
          ptr,
          _marker: PhantomData,
        }
      }

      /// Pre-increment: moves to the next slot.
      pub fn advance(&mut self) -> &mut Self {
        self.ptr = unsafe { self.ptr.add(1) };
        self
      }

      /// Post-increment: moves to the next slot, returning the old position.
      pub fn advance_post(&mut self) -> Self {
        let previous = Self::new(self.ptr);
        self.advance();
        previous
      }

      pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
      }
    }

    impl<T> PartialEq for $name<'_, T> {
      fn eq(
        &self,
        other: &Self,
      ) -> bool {
        self.ptr == other.ptr
      }
    }

    impl<T> Eq for $name<'_, T> {}

    impl<T> fmt::Debug for $name<'_, T> {
      fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
      ) -> fmt::Result {
        f.debug_tuple(stringify!($name)).field(&self.ptr).finish()
      }
    }
  };
}

cursor!(
  /// Read-only position in an array.
  Cursor,
);

cursor!(
  /// Mutable position in an array.
  CursorMut, mut
);

impl<'a, T> Cursor<'a, T> {
  /// # Safety
  ///
  /// The cursor must be before `end()` of the array it came from.
  pub unsafe fn get(&self) -> &'a T {
    unsafe { self.ptr.as_ref() }
  }
}

impl<T> Clone for Cursor<'_, T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for Cursor<'_, T> {}

impl<'a, T> CursorMut<'a, T> {
  /// # Safety
  ///
  /// The cursor must be before `end_mut()` of the array it came from, and no
  /// other reference to the same slot may be alive.
  pub unsafe fn get(&mut self) -> &'a mut T {
    unsafe { &mut *self.ptr.as_ptr() }
  }
}

/// Shared iterator over the live elements of an array.
pub struct Iter<'a, T> {
  front: Cursor<'a, T>,
  remaining: usize,
}

impl<'a, T> Iter<'a, T> {
  pub(crate) fn new(
    begin: Cursor<'a, T>,
    len: usize,
  ) -> Self {
    Self {
      front: begin,
      remaining: len,
    }
  }
}

impl<'a, T> Iterator for Iter<'a, T> {
  type Item = &'a T;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }

    self.remaining -= 1;
    Some(unsafe { self.front.advance_post().get() })
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
  fn clone(&self) -> Self {
    Self {
      front: self.front,
      remaining: self.remaining,
    }
  }
}

/// Mutable iterator over the live elements of an array.
pub struct IterMut<'a, T> {
  front: CursorMut<'a, T>,
  remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
  pub(crate) fn new(
    begin: CursorMut<'a, T>,
    len: usize,
  ) -> Self {
    Self {
      front: begin,
      remaining: len,
    }
  }
}

impl<'a, T> Iterator for IterMut<'a, T> {
  type Item = &'a mut T;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }

    self.remaining -= 1;
    Some(unsafe { self.front.advance_post().get() })
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

#[cfg(test)]
mod tests {
  use crate::DynArray;

  fn sample() -> DynArray<i32> {
    let mut arr = DynArray::new();
    for value in [1, 2, 3] {
      arr.push(value).unwrap();
    }
    arr
  }

  #[test]
  fn cursor_walks_begin_to_end() {
    let arr = sample();

    let mut sum = 0;
    let mut it = arr.begin();
    while it != arr.end() {
      sum += unsafe { *it.get() };
      it.advance();
    }

    assert_eq!(sum, 6);
  }

  #[test]
  fn post_increment_returns_previous_position() {
    let arr = sample();
    let mut it = arr.begin();

    let old = it.advance_post();
    assert_eq!(old, arr.begin());
    assert_ne!(it, arr.begin());
    assert_eq!(unsafe { *old.get() }, 1);
    assert_eq!(unsafe { *it.get() }, 2);
  }

  #[test]
  fn empty_array_begin_equals_end() {
    let arr = DynArray::<i32>::new();
    assert_eq!(arr.begin(), arr.end());
    assert_eq!(arr.iter().next(), None);
  }

  #[test]
  fn mutable_cursor_writes_through() {
    let mut arr = sample();

    let mut it = arr.begin_mut();
    unsafe { *it.get() = 10 };
    it.advance();
    unsafe { *it.get() += 10 };

    assert_eq!(arr.as_slice(), &[10, 12, 3]);
  }

  #[test]
  fn iterators_are_restartable_and_exact() {
    let mut arr = sample();

    let iter = arr.iter();
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.clone().sum::<i32>(), 6);
    assert_eq!(iter.copied().collect::<Vec<_>>(), vec![1, 2, 3]);

    for value in &mut arr {
      *value *= 2;
    }
    assert_eq!((&arr).into_iter().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
  }

  #[test]
  fn zero_sized_elements_iterate_len_times() {
    let mut arr = DynArray::new();
    for _ in 0..5 {
      arr.push(()).unwrap();
    }

    assert_eq!(arr.iter().count(), 5);
  }
}
