use std::{alloc::Layout, ptr::NonNull};

use dynalloc::{DynArray, Error, Malloc, TrackingResource};

fn word() -> Layout {
  Layout::from_size_align(4, 4).unwrap()
}

#[test]
fn append_three_and_read_back() {
  let resource = TrackingResource::new();
  let mut arr = DynArray::new_in(&resource);

  arr.push(10).unwrap();
  arr.push(20).unwrap();
  arr.push(30).unwrap();

  assert_eq!(arr.len(), 3);
  assert_eq!((arr[0], arr[1], arr[2]), (10, 20, 30));
  assert!(arr.capacity() >= 3);
}

#[test]
fn freed_word_is_handed_out_again() {
  let resource = TrackingResource::new();

  let a = resource.allocate(word()).unwrap();
  unsafe { resource.deallocate(a, word()).unwrap() };
  let again = resource.allocate(word()).unwrap();

  assert_eq!(a, again);
  assert_eq!(resource.used_blocks(), 1);
  assert_eq!(resource.allocation_count(), 1);

  unsafe { resource.deallocate(again, word()).unwrap() };
}

#[test]
fn unknown_address_is_rejected() {
  let resource = TrackingResource::new();
  let mut stray = 0u32;
  let stray = NonNull::from(&mut stray).cast::<u8>();

  let result = unsafe { resource.deallocate(stray, word()) };

  assert_eq!(
    result,
    Err(Error::UnknownBlock {
      addr: stray.as_ptr() as usize
    })
  );
  assert_eq!(resource.allocation_count(), 0);
}

#[test]
fn second_free_is_a_double_free() {
  let resource = TrackingResource::new();
  let ptr = resource.allocate(word()).unwrap();

  unsafe {
    assert!(resource.deallocate(ptr, word()).is_ok());
    assert!(matches!(resource.deallocate(ptr, word()), Err(Error::DoubleFree { .. })));
  }
}

#[test]
fn arrays_over_libc_upstream() {
  let resource = TrackingResource::with_upstream(Malloc);

  let mut words = DynArray::new_in(&resource);
  for i in 0..100u64 {
    words.push(i * i).unwrap();
  }

  let copy = words.try_clone().unwrap();
  assert_eq!(copy, words);
  assert_eq!(copy.iter().sum::<u64>(), (0..100u64).map(|i| i * i).sum());

  drop(words);
  drop(copy);
  assert_eq!(resource.used_blocks(), 0);
}

#[test]
fn many_short_lived_arrays_share_blocks() {
  let resource = TrackingResource::new();

  for round in 0..10 {
    let mut arr = DynArray::new_in(&resource);
    for i in 0..16 {
      arr.push(format!("{round}-{i}")).unwrap();
    }
    assert_eq!(arr[15], format!("{round}-15"));
  }

  // Capacities 1..=16 need five buffers; later rounds reuse them.
  assert_eq!(resource.allocation_count(), 5);
  assert_eq!(resource.used_blocks(), 0);
}
