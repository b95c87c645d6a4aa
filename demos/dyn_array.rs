use std::f64::consts::{E, PI, SQRT_2};

use dynalloc::{DynArray, ResourceConfig, System, TrackingResource};

#[derive(Clone, Debug)]
struct Constant {
  id: u32,
  value: f64,
  name: String,
}

fn main() -> dynalloc::Result<()> {
  // Run with RUST_LOG=debug to watch blocks being created and reused.
  env_logger::init();

  let resource = TrackingResource::with_config(System, ResourceConfig::new("demo").report_on_drop(true));

  // --------------------------------------------------------------------
  // 1) Plain integers.
  // --------------------------------------------------------------------
  {
    println!("=== Demonstration with i32 ===");
    let mut arr = DynArray::new_in(&resource);

    for i in 0..5 {
      arr.push(i * 10)?;
    }

    print!("Array: ");
    let mut it = arr.begin();
    while it != arr.end() {
      print!("{} ", unsafe { it.get() });
      it.advance();
    }
    println!();

    println!("{}", resource.stats());
  }

  // --------------------------------------------------------------------
  // 2) Values that own heap memory of their own.
  // --------------------------------------------------------------------
  {
    println!("\n=== Demonstration with Constant ===");
    let mut arr = DynArray::new_in(&resource);

    arr.push(Constant { id: 1, value: PI, name: "Pi".into() })?;
    arr.push(Constant { id: 2, value: E, name: "E".into() })?;
    arr.push(Constant { id: 3, value: SQRT_2, name: "sqrt(2)".into() })?;

    println!("Complex array:");
    for item in &arr {
      println!("  id: {}, value: {}, name: {}", item.id, item.value, item.name);
    }

    println!("{}", resource.stats());
  }

  // --------------------------------------------------------------------
  // 3) A second array picks up the buffers the first one released.
  // --------------------------------------------------------------------
  {
    println!("\n=== Memory Reuse Demonstration ===");

    let before = {
      let mut first = DynArray::new_in(&resource);
      for i in 0..3 {
        first.push(i)?;
      }
      resource.allocation_count()
    };

    let mut second = DynArray::new_in(&resource);
    for i in 10..13 {
      second.push(i)?;
    }

    println!("Reused memory array: {:?}", second);
    println!(
      "Blocks before: {}, after: {} ({})",
      before,
      resource.allocation_count(),
      if before == resource.allocation_count() {
        "every buffer was recycled"
      } else {
        "some buffers came from upstream"
      }
    );

    println!("{}", resource.stats());
  }

  Ok(())
}
