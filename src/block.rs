use std::mem;

use log::trace;

use crate::error::{HeapError, Result};

/// Width of one machine word, the granularity payload boundaries round to.
pub const POINTER_WIDTH: usize = mem::size_of::<usize>();

/// Bytes taken by one header in front of every payload: a size word and a link word.
pub const HEADER_OVERHEAD: usize = 2 * POINTER_WIDTH;

// Link word stored for "no successor".
const TERMINATOR: usize = usize::MAX;

/// Block metadata as it sits in the arena, immediately before the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
  pub size: usize,
  pub next: Option<usize>,
}

impl BlockHeader {
  pub fn new(
    size: usize,
    next: Option<usize>,
  ) -> Self {
    Self { size, next }
  }

  /// Decodes the header stored at `offset`.
  pub fn read(
    arena: &[u8],
    offset: usize,
  ) -> Result<Self> {
    let bytes = header_bytes(arena, offset)?;
    let (size, next) = bytes.split_at(POINTER_WIDTH);

    let size = usize::from_ne_bytes(word(size));
    let next = match usize::from_ne_bytes(word(next)) {
      TERMINATOR => None,
      link => Some(link),
    };

    trace!("read header @{}: size={} next={:?}", offset, size, next);
    Ok(Self { size, next })
  }

  /// Encodes this header at `offset`.
  pub fn write(
    &self,
    arena: &mut [u8],
    offset: usize,
  ) -> Result<()> {
    let region_size = arena.len();
    let end = offset
      .checked_add(HEADER_OVERHEAD)
      .filter(|end| *end <= region_size)
      .ok_or(HeapError::HeaderOutOfBounds { offset, region_size })?;

    let (size, next) = arena[offset..end].split_at_mut(POINTER_WIDTH);
    size.copy_from_slice(&self.size.to_ne_bytes());
    next.copy_from_slice(&self.next.unwrap_or(TERMINATOR).to_ne_bytes());
    Ok(())
  }
}

/// Offset of the payload that follows the header at `header`.
pub const fn payload_of(header: usize) -> usize {
  header + HEADER_OVERHEAD
}

/// Offset of the header that precedes `payload`, if there is room for one.
pub const fn header_of(payload: usize) -> Option<usize> {
  payload.checked_sub(HEADER_OVERHEAD)
}

fn header_bytes(
  arena: &[u8],
  offset: usize,
) -> Result<&[u8]> {
  offset
    .checked_add(HEADER_OVERHEAD)
    .and_then(|end| arena.get(offset..end))
    .ok_or(HeapError::HeaderOutOfBounds { offset, region_size: arena.len() })
}

fn word(bytes: &[u8]) -> [u8; POINTER_WIDTH] {
  let mut out = [0u8; POINTER_WIDTH];
  out.copy_from_slice(bytes);
  out
}
