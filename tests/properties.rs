//! Property-based tests for the heap invariants.
//!
//! Random allocate/release sequences are replayed against a fresh heap and
//! the byte accounting, header layout and payload contents are checked after
//! every step.

use freelist_heap::{HEADER_OVERHEAD, HeapError, HeapManager, Payload};
use proptest::prelude::*;

const REGION: usize = 4096;

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  Release(usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    3 => (1usize..300).prop_map(Op::Allocate),
    2 => any::<usize>().prop_map(Op::Release),
  ]
}

// Header ranges of every block, free or live, must be disjoint and inside the region.
fn assert_headers_disjoint(
  heap: &HeapManager,
  live: &[(Payload, u8)],
) {
  let mut headers: Vec<usize> = heap.free_blocks().map(|block| block.offset).collect();
  headers.extend(live.iter().map(|(payload, _)| payload.offset() - HEADER_OVERHEAD));
  headers.sort_unstable();

  for pair in headers.windows(2) {
    assert!(pair[0] + HEADER_OVERHEAD <= pair[1], "headers overlap: {:?}", pair);
  }
  if let Some(last) = headers.last() {
    assert!(last + HEADER_OVERHEAD <= REGION);
  }
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(200))]

  /// Free, allocated, header and absorbed bytes always add up to the region.
  #[test]
  fn footprint_is_conserved(ops in prop::collection::vec(op(), 1..80)) {
    let mut heap = HeapManager::init(REGION).unwrap();
    let mut live: Vec<(Payload, u8)> = Vec::new();

    for (step, op) in ops.into_iter().enumerate() {
      match op {
        Op::Allocate(size) => match heap.allocate(size) {
          Ok(payload) => {
            prop_assert_eq!(heap.payload(payload).unwrap().len(), size);
            let tag = step as u8;
            heap.payload_mut(payload).unwrap().fill(tag);
            live.push((payload, tag));
          }
          Err(HeapError::OutOfMemory { .. }) => {}
          Err(err) => panic!("unexpected error: {err}"),
        },
        Op::Release(pick) if !live.is_empty() => {
          let (payload, _) = live.swap_remove(pick % live.len());
          heap.release(payload).unwrap();
        }
        Op::Release(_) => {}
      }

      let stats = heap.stats();
      prop_assert!(stats.is_conserved(), "{:?}", stats);
      prop_assert_eq!(stats.allocated_blocks, live.len());
      assert_headers_disjoint(&heap, &live);

      for (payload, tag) in &live {
        let view = heap.payload(*payload).unwrap();
        prop_assert_eq!(view.len(), heap.block_size(*payload).unwrap());
        prop_assert!(view.iter().all(|b| b == tag));
      }
    }
  }

  /// A released block comes back at the head with its recorded size and is reused.
  #[test]
  fn release_round_trip(first in 1usize..500, size in 1usize..500) {
    let mut heap = HeapManager::init(REGION).unwrap();
    let _pinned = heap.allocate(first).unwrap();

    let payload = heap.allocate(size).unwrap();
    let recorded = heap.block_size(payload).unwrap();
    heap.release(payload).unwrap();

    let head = heap.free_blocks().next().unwrap();
    prop_assert_eq!(head.offset, payload.offset() - HEADER_OVERHEAD);
    prop_assert_eq!(head.size, recorded);
    prop_assert_eq!(heap.allocate(size).unwrap(), payload);
  }

  /// Releasing a handle twice is refused and changes nothing.
  #[test]
  fn double_release_is_rejected(size in 1usize..1000) {
    let mut heap = HeapManager::init(REGION).unwrap();
    let payload = heap.allocate(size).unwrap();
    heap.release(payload).unwrap();

    let before = heap.stats();
    let err = heap.release(payload).unwrap_err();
    prop_assert!(matches!(err, HeapError::DoubleRelease { .. }), "{}", err);
    prop_assert_eq!(heap.stats(), before);
  }

  /// A region sized for exactly one block is exhausted by it.
  #[test]
  fn exact_region_is_exhausted(n in 1usize..2048) {
    let mut heap = HeapManager::init(n + HEADER_OVERHEAD).unwrap();
    heap.allocate(n).unwrap();
    let exhausted = matches!(heap.allocate(1), Err(HeapError::OutOfMemory { requested: 1 }));
    prop_assert!(exhausted);
  }
}
