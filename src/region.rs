//! Backing memory for a heap.
//!
//! A heap never grows: it is handed one fixed-size byte region when it is
//! initialized and carves every block out of it. Where those bytes come from
//! is the business of a [`Region`].

use std::{io, ptr, slice};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};
use log::debug;

use crate::error::{HeapError, Result};

/// A fixed-length, writable run of bytes owned by the heap.
pub trait Region {
  fn bytes(&self) -> &[u8];

  fn bytes_mut(&mut self) -> &mut [u8];

  fn len(&self) -> usize {
    self.bytes().len()
  }

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Zero-filled region living on the process heap. The default backing store.
#[derive(Debug)]
pub struct BoxedRegion {
  bytes: Box<[u8]>,
}

impl BoxedRegion {
  pub fn new(size: usize) -> Self {
    Self {
      bytes: vec![0u8; size].into_boxed_slice(),
    }
  }
}

impl Region for BoxedRegion {
  fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    &mut self.bytes
  }
}

/// Region obtained straight from the kernel with an anonymous private
/// `mmap(2)`, unmapped again on drop.
///
/// ```text
///   mmap(NULL, size, PROT_READ | PROT_WRITE, MAP_PRIVATE | MAP_ANONYMOUS, -1, 0)
///
///   ┌──────────────────────────────────────────────┐
///   │  size bytes, page backed, zero filled        │
///   └──────────────────────────────────────────────┘
///   ▲
///   └── base
/// ```
#[derive(Debug)]
pub struct MmapRegion {
  base: *mut u8,
  size: usize,
}

// The mapping is owned exclusively by this value.
unsafe impl Send for MmapRegion {}

impl MmapRegion {
  pub fn new(size: usize) -> Result<Self> {
    if size == 0 {
      return Err(HeapError::InvalidSize {
        size,
        reason: "cannot map an empty region",
      });
    }

    let address = unsafe {
      mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(io::Error::last_os_error().into());
    }

    debug!("mapped {} byte region at {:?}", size, address);
    Ok(Self {
      base: address as *mut u8,
      size,
    })
  }

  /// Address of the first byte of the mapping.
  pub fn base(&self) -> *const u8 {
    self.base
  }
}

impl Region for MmapRegion {
  fn bytes(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.base, self.size) }
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.base, self.size) }
  }
}

impl Drop for MmapRegion {
  fn drop(&mut self) {
    unsafe {
      if munmap(self.base as *mut c_void, self.size) != 0 {
        debug!("munmap of {:?} failed: {}", self.base, io::Error::last_os_error());
      }
    }
  }
}
