//! Error type shared by every heap operation.

use std::io;

use thiserror::Error;

/// Everything that can go wrong while talking to a [`HeapManager`].
///
/// All variants are recoverable: a rejected call leaves the free list exactly
/// as it was before the call.
///
/// [`HeapManager`]: crate::HeapManager
#[derive(Error, Debug)]
pub enum HeapError {
  #[error("invalid size {size}: {reason}")]
  InvalidSize { size: usize, reason: &'static str },

  #[error("out of memory: no free block can hold {requested} bytes")]
  OutOfMemory { requested: usize },

  #[error("invalid handle: offset {offset} was not issued by this heap")]
  InvalidHandle { offset: usize },

  #[error("double release: block at offset {offset} is already free")]
  DoubleRelease { offset: usize },

  #[error("block header at offset {offset} lies outside the {region_size} byte region")]
  HeaderOutOfBounds { offset: usize, region_size: usize },

  #[error("could not reserve region: {0}")]
  RegionUnavailable(#[from] io::Error),
}

impl HeapError {
  /// True for handles the heap refuses to release, including double releases.
  pub fn is_invalid_handle(&self) -> bool {
    matches!(self, HeapError::InvalidHandle { .. } | HeapError::DoubleRelease { .. })
  }
}

pub type Result<T> = std::result::Result<T, HeapError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_double_release_is_an_invalid_handle() {
    assert!(HeapError::DoubleRelease { offset: 16 }.is_invalid_handle());
    assert!(HeapError::InvalidHandle { offset: 3 }.is_invalid_handle());
    assert!(!HeapError::OutOfMemory { requested: 1 }.is_invalid_handle());
  }

  #[test]
  fn test_messages() {
    let err = HeapError::OutOfMemory { requested: 64 };
    assert_eq!(err.to_string(), "out of memory: no free block can hold 64 bytes");

    let err = HeapError::from(io::Error::from(io::ErrorKind::OutOfMemory));
    assert!(err.to_string().starts_with("could not reserve region"));
  }
}
