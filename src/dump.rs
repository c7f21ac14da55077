use std::fmt;

use crate::{
  heap::{FreeBlocks, HeapManager, Payload},
  region::Region,
};

/// Renders block sizes in free-list order:
///
/// ```text
///   free list: [24] -> [9902] -> end
/// ```
#[derive(Debug, Clone)]
pub struct FreeListDump<'a> {
  blocks: FreeBlocks<'a>,
}

impl<'a> FreeListDump<'a> {
  pub fn new(blocks: FreeBlocks<'a>) -> Self {
    Self { blocks }
  }
}

impl fmt::Display for FreeListDump<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "free list: ")?;
    for block in self.blocks.clone() {
      write!(f, "[{}] -> ", block.size)?;
    }
    write!(f, "end")
  }
}

/// Prints the free list of `heap` to stdout.
pub fn print_free_list<R: Region>(heap: &HeapManager<R>) {
  println!("{}", heap.dump());
}

/// Prints where a fresh allocation landed.
pub fn print_alloc<R: Region>(
  heap: &HeapManager<R>,
  payload: Payload,
) {
  match (heap.block_size(payload), heap.address_of(payload)) {
    (Ok(size), Ok(address)) => println!(
      "Allocated {} bytes, offset = {}, address = {:?}",
      size,
      payload.offset(),
      address
    ),
    (Err(err), _) | (_, Err(err)) => println!("No allocation at offset {}: {}", payload.offset(), err),
  }
}

#[cfg(test)]
mod tests {
  use crate::{HEADER_OVERHEAD, HeapManager};

  #[test]
  fn test_dump_lists_sizes_head_first() {
    let mut heap = HeapManager::init(10000).unwrap();
    assert_eq!(heap.dump().to_string(), format!("free list: [{}] -> end", 10000 - HEADER_OVERHEAD));

    let p = heap.allocate(40).unwrap();
    let _q = heap.allocate(10).unwrap();
    heap.release(p).unwrap();

    assert_eq!(
      heap.dump().to_string(),
      format!("free list: [40] -> [{}] -> end", 10000 - 3 * HEADER_OVERHEAD - 50)
    );
  }

  #[test]
  fn test_dump_of_exhausted_heap() {
    let mut heap = HeapManager::init(HEADER_OVERHEAD + 8).unwrap();
    heap.allocate(8).unwrap();
    assert_eq!(heap.dump().to_string(), "free list: end");
  }
}
