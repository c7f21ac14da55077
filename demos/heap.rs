use freelist_heap::{
  HEADER_OVERHEAD, HeapManager, MmapRegion, Result, align::next_power_of_two, print_alloc, print_free_list,
};

/// Prints a section banner so each scenario is easy to find in the output.
fn section(label: &str) {
  println!("\n--------------------------------------------------------------------");
  println!("{}", label);
  println!("--------------------------------------------------------------------");
}

/// Two small allocations back to back, then the second one is released.
fn small_blocks() -> Result<()> {
  section("[1] Two 4-byte blocks, release the second");
  let mut heap = HeapManager::init(10000)?;

  let alice = heap.allocate(size_of::<i32>())?;
  print_alloc(&heap, alice);
  let bob = heap.allocate(size_of::<i32>())?;
  print_alloc(&heap, bob);

  heap.release(bob)?;
  print_free_list(&heap);
  Ok(())
}

/// A released 15-byte block is handed out whole to a smaller request.
fn reuse_after_release() -> Result<()> {
  section("[2] Reuse a released block");
  let mut heap = HeapManager::init(10000)?;

  let alice = heap.allocate(15)?;
  let bob = heap.allocate(15)?;
  let charlie = heap.allocate(15)?;
  for handle in [alice, bob, charlie] {
    print_alloc(&heap, handle);
  }

  heap.release(bob)?;
  print_free_list(&heap);

  let david = heap.allocate(size_of::<f64>())?;
  print_alloc(&heap, david);
  println!(
    "david == bob? {}",
    if david == bob {
      "Yes, it reused the released block"
    } else {
      "No, it was carved somewhere else"
    }
  );
  println!("absorbed bytes: {}", heap.stats().absorbed_bytes);
  Ok(())
}

/// A region sized with `next_power_of_two`, split twice and released.
fn power_of_two_region() -> Result<()> {
  let size = next_power_of_two(100);
  section(&format!("[3] {} byte region ({} byte headers)", size, HEADER_OVERHEAD));
  let mut heap = HeapManager::init(size)?;

  let p = heap.allocate(40)?;
  let q = heap.allocate(10)?;
  print_free_list(&heap);

  heap.release(p)?;
  print!("free p: ");
  print_free_list(&heap);

  heap.release(q)?;
  print!("free q: ");
  print_free_list(&heap);

  let stats = heap.stats();
  println!("{:?}", stats);
  println!("conserved: {}", stats.is_conserved());
  Ok(())
}

/// Stores a few numbers in heap memory and computes their standard deviation
/// from there. The region comes straight from `mmap`.
fn standard_deviation(values: &[i32]) -> Result<()> {
  section("[4] Standard deviation over heap memory (mmap region)");
  let width = size_of::<i32>();

  let region = MmapRegion::new(values.len() * width * HEADER_OVERHEAD)?;
  let mut heap = HeapManager::with_region(region)?;
  let buffer = heap.allocate(values.len() * width)?;
  print_alloc(&heap, buffer);

  for (slot, value) in heap.payload_mut(buffer)?.chunks_exact_mut(width).zip(values) {
    slot.copy_from_slice(&value.to_ne_bytes());
  }

  let stored: Vec<f64> = heap
    .payload(buffer)?
    .chunks_exact(width)
    .map(|chunk| {
      let mut word = [0u8; 4];
      word.copy_from_slice(chunk);
      i32::from_ne_bytes(word) as f64
    })
    .collect();

  let mean = stored.iter().sum::<f64>() / stored.len() as f64;
  let variance = stored.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / stored.len() as f64;
  println!("values = {:?}", values);
  println!("std dev = {:.6}", variance.sqrt());

  heap.release(buffer)?;
  Ok(())
}

fn main() -> Result<()> {
  // RUST_LOG=debug shows every split and free-list dump as it happens.
  env_logger::init();

  small_blocks()?;
  reuse_after_release()?;
  power_of_two_region()?;
  standard_deviation(&[2, 4, 4, 4, 5, 5, 7, 9])?;

  println!("\nEnd of example.");
  Ok(())
}
