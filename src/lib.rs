//! # freelist-heap - A First-Fit Free-List Heap
//!
//! This crate provides a `malloc`/`free` style heap that manages **one fixed
//! region** of memory reserved up front, and never asks the platform allocator
//! for anything else once it is running.
//!
//! ## Overview
//!
//! Free blocks are kept in a singly linked list threaded through their own
//! headers. Allocation walks the list and takes the first block that is big
//! enough (first fit), splitting off whatever is left when the rest can still
//! hold a block of its own:
//!
//! ```text
//!   allocate(40) on a fresh region:
//!
//!   before  ┌────────┬─────────────────────────────────────────────────────┐
//!           │ H 9984 │                     free                            │
//!           └────────┴─────────────────────────────────────────────────────┘
//!           ▲ head
//!
//!   after   ┌────────┬──────────┬────────┬───────────────────────────────────┐
//!           │ H 40   │ payload  │ H 9928 │               free                │
//!           └────────┴──────────┴────────┴───────────────────────────────────┘
//!                    ▲                   ▲
//!                    └─ returned         └─ head
//! ```
//!
//! Release pushes the block back on the front of the list. Neighbouring free
//! blocks are **not** merged.
//!
//! ## Crate Structure
//!
//! ```text
//!   freelist_heap
//!   ├── align      - Rounding helpers (align!, round_up, next_power_of_two)
//!   ├── block      - Block header layout inside the region (internal)
//!   ├── dump       - Free-list tracer
//!   ├── error      - HeapError
//!   ├── heap       - HeapManager implementation
//!   ├── locked     - LockedHeapManager, a spin-locked HeapManager
//!   └── region     - Backing stores (BoxedRegion, MmapRegion)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use freelist_heap::{HeapManager, align::next_power_of_two};
//!
//! let mut heap = HeapManager::init(next_power_of_two(1000)).unwrap();
//!
//! let numbers = heap.allocate(4 * 8).unwrap();
//! heap.payload_mut(numbers).unwrap()[..8].copy_from_slice(&42u64.to_ne_bytes());
//!
//! println!("{}", heap.dump());
//! heap.release(numbers).unwrap();
//! ```
//!
//! ## Block Layout
//!
//! Handles are byte offsets into the region, never raw pointers. Every header
//! read and write is bounds checked against the region.
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         Payload                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ next: free link │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │   HEADER_OVERHEAD     │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Payload handle
//! ```
//!
//! ## Limitations
//!
//! - **No coalescing**: released neighbours stay separate blocks
//! - **Fixed footprint**: the region never grows
//! - **Word alignment only**: payloads are aligned to the pointer width
//! - **Single owner**: share through [`LockedHeapManager`] if you must
//!
//! ## Logging
//!
//! Decisions and free-list dumps are emitted through the [`log`] facade at
//! `debug` level. Install any logger to see them.

pub mod align;
mod block;
mod dump;
pub mod error;
mod heap;
mod locked;
pub mod region;

pub use block::{HEADER_OVERHEAD, POINTER_WIDTH};
pub use dump::{FreeListDump, print_alloc, print_free_list};
pub use error::{HeapError, Result};
pub use heap::{FreeBlock, FreeBlocks, HeapManager, HeapStats, Payload};
pub use locked::LockedHeapManager;
pub use region::{BoxedRegion, MmapRegion, Region};
