use std::{
  alloc::Layout,
  fmt, mem,
  marker::PhantomData,
  ops::{Index, IndexMut},
  ptr::{self, NonNull},
  slice,
};

use log::error;

use crate::{
  alloc::Allocator,
  error::{Error, Result},
  iter::{Cursor, CursorMut, Iter, IterMut},
  upstream::System,
};

/// A growable, contiguous array whose storage comes from a pluggable
/// [`Allocator`].
///
/// ```text
///   buf
///   ┌─────┬─────┬─────┬─────────────────┐
///   │  0  │  1  │  2  │  uninitialized  │
///   └─────┴─────┴─────┴─────────────────┘
///   ◄──── len ───────►
///   ◄──────────────── cap ──────────────►
/// ```
///
/// Only `[0, len)` holds live values; the tail is raw memory. Capacity
/// doubles on growth and never shrinks.
pub struct DynArray<T, A: Allocator = System> {
  buf: NonNull<T>,
  cap: usize,
  len: usize,
  alloc: A,
  _marker: PhantomData<T>,
}

impl<T> DynArray<T> {
  pub fn new() -> Self {
    Self::new_in(System)
  }

  pub fn with_capacity(capacity: usize) -> Result<Self> {
    Self::with_capacity_in(capacity, System)
  }
}

impl<T> Default for DynArray<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T, A: Allocator> DynArray<T, A> {
  /// Empty array; nothing is allocated until the first push or reserve.
  pub fn new_in(alloc: A) -> Self {
    Self {
      buf: NonNull::dangling(),
      cap: 0,
      len: 0,
      alloc,
      _marker: PhantomData,
    }
  }

  pub fn with_capacity_in(
    capacity: usize,
    alloc: A,
  ) -> Result<Self> {
    let mut arr = Self::new_in(alloc);
    arr.reserve(capacity)?;
    Ok(arr)
  }

  fn layout(capacity: usize) -> Result<Layout> {
    Layout::array::<T>(capacity).map_err(|_| Error::CapacityOverflow)
  }

  fn allocate_buffer(
    &self,
    capacity: usize,
  ) -> Result<NonNull<T>> {
    let layout = Self::layout(capacity)?;
    if layout.size() == 0 {
      return Ok(NonNull::dangling());
    }

    Ok(self.alloc.allocate(layout)?.cast())
  }

  /// # Safety
  ///
  /// `buf` must have come from `allocate_buffer(capacity)` on this array's
  /// allocator and hold no live values.
  unsafe fn release_buffer(
    &self,
    buf: NonNull<T>,
    capacity: usize,
  ) -> Result<()> {
    let layout = Self::layout(capacity)?;
    if layout.size() == 0 {
      return Ok(());
    }

    unsafe { self.alloc.deallocate(buf.cast(), layout) }
  }

  /// Returns a buffer the array no longer points at. The operation that
  /// replaced it has already taken effect, so a refusal is only logged.
  ///
  /// # Safety
  ///
  /// Same as [`release_buffer`](Self::release_buffer).
  unsafe fn retire_buffer(
    &self,
    buf: NonNull<T>,
    capacity: usize,
  ) {
    if capacity == 0 {
      return;
    }

    if let Err(err) = unsafe { self.release_buffer(buf, capacity) } {
      error!("failed to release array storage of {capacity} slots: {err}");
    }
  }

  /// Grows the buffer to exactly `new_capacity` slots; no-op if it is
  /// already at least that large.
  ///
  /// Live values are moved bitwise into the new buffer, which cannot fail,
  /// so the old buffer is released only once every value has arrived. On
  /// allocation failure the array is left untouched; once the new buffer is
  /// in place the call succeeds even if the old one cannot be returned.
  pub fn reserve(
    &mut self,
    new_capacity: usize,
  ) -> Result<()> {
    if new_capacity <= self.cap {
      return Ok(());
    }

    let new_buf = self.allocate_buffer(new_capacity)?;

    unsafe { ptr::copy_nonoverlapping(self.buf.as_ptr(), new_buf.as_ptr(), self.len) };

    let old_buf = mem::replace(&mut self.buf, new_buf);
    let old_cap = mem::replace(&mut self.cap, new_capacity);

    unsafe { self.retire_buffer(old_buf, old_cap) };

    Ok(())
  }

  fn grow(&mut self) -> Result<()> {
    let new_capacity = match self.cap {
      0 => 1,
      cap => cap.checked_mul(2).ok_or(Error::CapacityOverflow)?,
    };
    self.reserve(new_capacity)
  }

  /// Appends `value`, doubling the capacity first when full.
  ///
  /// On failure `value` is dropped and the array is unchanged.
  pub fn push(
    &mut self,
    value: T,
  ) -> Result<()> {
    if self.len == self.cap {
      self.grow()?;
    }

    unsafe {
      let slot = self.buf.add(self.len);
      self.alloc.construct(slot, value);
    }
    self.len += 1;

    Ok(())
  }

  /// Appends a clone of `value`.
  pub fn push_clone(
    &mut self,
    value: &T,
  ) -> Result<()>
  where
    T: Clone,
  {
    self.push(value.clone())
  }

  pub fn get(
    &self,
    index: usize,
  ) -> Result<&T> {
    if index >= self.len {
      return Err(Error::IndexOutOfRange { index, len: self.len });
    }

    Ok(unsafe { self.buf.add(index).as_ref() })
  }

  pub fn get_mut(
    &mut self,
    index: usize,
  ) -> Result<&mut T> {
    if index >= self.len {
      return Err(Error::IndexOutOfRange { index, len: self.len });
    }

    Ok(unsafe { self.buf.add(index).as_mut() })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn capacity(&self) -> usize {
    self.cap
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn allocator(&self) -> &A {
    &self.alloc
  }

  pub fn as_slice(&self) -> &[T] {
    unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
  }

  /// Drops every live value. Capacity and storage are kept.
  pub fn clear(&mut self) {
    let len = mem::replace(&mut self.len, 0);

    // len is already 0, so a panicking destructor leaks the rest instead of
    // dropping them twice.
    for i in 0..len {
      unsafe { self.alloc.destroy(self.buf.add(i)) };
    }
  }

  /// Exchanges storage, length, capacity and allocator in constant time.
  pub fn swap(
    &mut self,
    other: &mut Self,
  ) {
    mem::swap(self, other);
  }

  /// Deep copy into exactly `len` fresh slots from a clone of this array's
  /// allocator.
  pub fn try_clone(&self) -> Result<Self>
  where
    T: Clone,
    A: Clone,
  {
    let mut copy = Self::with_capacity_in(self.len, self.alloc.clone())?;

    // copy owns what it has constructed so far; a panicking clone drops it.
    for value in self.iter() {
      unsafe { copy.alloc.construct(copy.buf.add(copy.len), value.clone()) };
      copy.len += 1;
    }

    Ok(copy)
  }

  /// Copy-assignment. Builds the copy first, then swaps it in, so a failed
  /// or panicking copy leaves `self` untouched.
  pub fn assign(
    &mut self,
    other: &Self,
  ) -> Result<()>
  where
    T: Clone,
    A: Clone,
  {
    let mut copy = other.try_clone()?;
    self.swap(&mut copy);
    Ok(())
  }

  /// Move-assignment. Adopts `other`'s buffer when both allocators are
  /// equal; otherwise moves the values into storage from `self`'s own
  /// allocator. If that allocation fails `self` is unchanged.
  pub fn assign_from(
    &mut self,
    mut other: Self,
  ) -> Result<()> {
    if self.alloc.is_equal(&other.alloc) {
      mem::swap(&mut self.buf, &mut other.buf);
      mem::swap(&mut self.cap, &mut other.cap);
      mem::swap(&mut self.len, &mut other.len);
      return Ok(());
    }

    let new_buf = self.allocate_buffer(other.len)?;
    unsafe { ptr::copy_nonoverlapping(other.buf.as_ptr(), new_buf.as_ptr(), other.len) };
    // The values now live in new_buf; other only frees its buffer on drop.
    let new_len = mem::replace(&mut other.len, 0);

    self.clear();
    let old_buf = mem::replace(&mut self.buf, new_buf);
    let old_cap = mem::replace(&mut self.cap, new_len);
    self.len = new_len;

    unsafe { self.retire_buffer(old_buf, old_cap) };

    Ok(())
  }

  pub fn begin(&self) -> Cursor<'_, T> {
    Cursor::new(self.buf)
  }

  pub fn end(&self) -> Cursor<'_, T> {
    Cursor::new(unsafe { self.buf.add(self.len) })
  }

  pub fn begin_mut(&mut self) -> CursorMut<'_, T> {
    CursorMut::new(self.buf)
  }

  pub fn end_mut(&mut self) -> CursorMut<'_, T> {
    CursorMut::new(unsafe { self.buf.add(self.len) })
  }

  pub fn iter(&self) -> Iter<'_, T> {
    Iter::new(self.begin(), self.len)
  }

  pub fn iter_mut(&mut self) -> IterMut<'_, T> {
    let len = self.len;
    IterMut::new(self.begin_mut(), len)
  }
}

impl<T, A: Allocator> Drop for DynArray<T, A> {
  fn drop(&mut self) {
    self.clear();
    unsafe { self.retire_buffer(self.buf, self.cap) };
  }
}

impl<T, A: Allocator> Index<usize> for DynArray<T, A> {
  type Output = T;

  fn index(
    &self,
    index: usize,
  ) -> &T {
    match self.get(index) {
      Ok(value) => value,
      Err(err) => panic!("{err}"),
    }
  }
}

impl<T, A: Allocator> IndexMut<usize> for DynArray<T, A> {
  fn index_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    let len = self.len;
    match self.get_mut(index) {
      Ok(value) => value,
      Err(_) => panic!("{}", Error::IndexOutOfRange { index, len }),
    }
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a DynArray<T, A> {
  type Item = &'a T;
  type IntoIter = Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut DynArray<T, A> {
  type Item = &'a mut T;
  type IntoIter = IterMut<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter_mut()
  }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for DynArray<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<DynArray<T, B>> for DynArray<T, A> {
  fn eq(
    &self,
    other: &DynArray<T, B>,
  ) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: Eq, A: Allocator> Eq for DynArray<T, A> {}
