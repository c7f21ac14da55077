use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::{
  align,
  block::{BlockHeader, HEADER_OVERHEAD, POINTER_WIDTH, header_of, payload_of},
  dump::FreeListDump,
  error::{HeapError, Result},
  region::{BoxedRegion, Region},
};

/// Handle to a live allocation: the offset of its payload inside the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload(usize);

impl Payload {
  pub fn offset(self) -> usize {
    self.0
  }

  /// Rebuilds a handle from a raw payload offset. Releasing one that the heap
  /// never issued is rejected with [`HeapError::InvalidHandle`].
  pub fn from_offset(offset: usize) -> Self {
    Self(offset)
  }
}

/// A block currently on the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Offset of the block header.
  pub offset: usize,
  /// Payload bytes the block can hand out.
  pub size: usize,
}

/// Walks the free list from the head, in list order.
#[derive(Debug, Clone)]
pub struct FreeBlocks<'a> {
  arena: &'a [u8],
  cursor: Option<usize>,
}

impl Iterator for FreeBlocks<'_> {
  type Item = FreeBlock;

  fn next(&mut self) -> Option<FreeBlock> {
    let offset = self.cursor?;
    let header = match BlockHeader::read(self.arena, offset) {
      Ok(header) => header,
      Err(err) => {
        warn!("free list walk stopped: {}", err);
        self.cursor = None;
        return None;
      }
    };
    self.cursor = header.next;
    Some(FreeBlock {
      offset,
      size: header.size,
    })
  }
}

/// Byte accounting for the whole region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub region_size: usize,
  pub free_blocks: usize,
  pub free_bytes: usize,
  pub allocated_blocks: usize,
  pub allocated_bytes: usize,
  pub overhead_bytes: usize,
  /// Slack swallowed by blocks handed out whole (see [`HeapManager::allocate`]).
  /// Counted until the region is dropped, since a released block only returns
  /// the size its header records.
  pub absorbed_bytes: usize,
}

impl HeapStats {
  /// Every byte of the region is either free payload, allocated payload,
  /// header, or absorbed slack.
  pub fn is_conserved(&self) -> bool {
    self.free_bytes + self.allocated_bytes + self.overhead_bytes + self.absorbed_bytes == self.region_size
  }
}

/// First-fit free-list heap over a single fixed region.
///
/// ```text
///   region
///   ┌────────┬──────────────┬────────┬──────────────┬────────┬───────────────────┐
///   │ header │   payload    │ header │   payload    │ header │      payload      │
///   │ size   │  (allocated) │ size   │   (free)     │ size   │      (free)       │
///   │ next ─────────────────│─ ─ ─ ─ │              │ next ──┼──► end            │
///   └────────┴──────────────┴────────┴──────────────┴────────┴───────────────────┘
///                                ▲                       ▲
///                               head ── next ────────────┘
/// ```
///
/// Every block, free or allocated, starts with a [`HEADER_OVERHEAD`] byte
/// header. Only free blocks are linked; allocated ones are tracked by a
/// registry so that stale and repeated releases can be refused.
#[derive(Debug)]
pub struct HeapManager<R: Region = BoxedRegion> {
  region: R,
  head: Option<usize>,
  // Header offset of every live allocation -> slack it absorbed.
  live: BTreeMap<usize, usize>,
  // Header offset of every block put back by `release` and not handed out since.
  released: BTreeSet<usize>,
  // Slack of blocks that have since been released.
  released_slack: usize,
}

impl HeapManager<BoxedRegion> {
  /// Reserves a zeroed `region_size` byte region and lays a single free block
  /// over all of it.
  pub fn init(region_size: usize) -> Result<Self> {
    check_region_size(region_size)?;
    Self::with_region(BoxedRegion::new(region_size))
  }
}

impl<R: Region> HeapManager<R> {
  /// Takes ownership of `region` and lays a single free block over all of it.
  pub fn with_region(mut region: R) -> Result<Self> {
    let region_size = region.len();
    check_region_size(region_size)?;

    BlockHeader::new(region_size - HEADER_OVERHEAD, None).write(region.bytes_mut(), 0)?;
    debug!(
      "heap initialized: {} byte region, {} bytes free",
      region_size,
      region_size - HEADER_OVERHEAD
    );

    Ok(Self {
      region,
      head: Some(0),
      live: BTreeMap::new(),
      released: BTreeSet::new(),
      released_slack: 0,
    })
  }

  /// Hands out the first free block that can hold `requested_size` bytes.
  ///
  /// When the chosen block has room for at least a pointer-width residual
  /// behind the request, it is split: the front keeps exactly
  /// `requested_size` bytes, and a new free block starts at the next
  /// pointer-aligned offset past them and takes the chosen block's place in
  /// the free list.
  ///
  /// The residual records `original - HEADER_OVERHEAD - requested_size`
  /// bytes, so the alignment padding is not charged to it: when
  /// `requested_size` is not word aligned the residual claims up to one word
  /// past the end of the block it came from. A block only counts as a fit
  /// when `requested_size` bytes also fit before the next header (or the end
  /// of the region), so every successful allocation hands out its full size.
  ///
  /// Otherwise the whole block is handed out and its header shrunk to
  /// `requested_size`. The difference is absorbed and never returns to the
  /// free list; it is reported as [`HeapStats::absorbed_bytes`].
  pub fn allocate(
    &mut self,
    requested_size: usize,
  ) -> Result<Payload> {
    if requested_size == 0 {
      return Err(HeapError::InvalidSize {
        size: 0,
        reason: "allocation must request at least one byte",
      });
    }

    let mut previous: Option<usize> = None;
    let mut cursor = self.head;

    while let Some(offset) = cursor {
      let block = self.header(offset)?;

      let fits = block.size >= requested_size && payload_of(offset) + requested_size <= self.physical_end(offset);
      if fits {
        let payload = self.carve(previous, offset, block, requested_size)?;
        debug!("{}", self.dump());
        return Ok(payload);
      }

      debug!("block @{} cannot hold {} bytes (records {})", offset, requested_size, block.size);
      previous = Some(offset);
      cursor = block.next;
    }

    debug!("no free block holds {} bytes", requested_size);
    Err(HeapError::OutOfMemory {
      requested: requested_size,
    })
  }

  /// Puts the block behind `payload` back at the head of the free list.
  ///
  /// The block is not merged with its neighbours, even when they are free.
  pub fn release(
    &mut self,
    payload: Payload,
  ) -> Result<()> {
    let offset = self.live_header(payload).inspect_err(|err| warn!("release rejected: {}", err))?;

    let mut block = self.header(offset)?;
    block.next = self.head;
    block.write(self.region.bytes_mut(), offset)?;
    self.head = Some(offset);

    if let Some(slack) = self.live.remove(&offset) {
      self.released_slack += slack;
    }
    self.released.insert(offset);

    debug!("released block @{} ({} bytes)", offset, block.size);
    debug!("{}", self.dump());
    Ok(())
  }

  /// Payload bytes recorded for a live allocation.
  pub fn block_size(
    &self,
    payload: Payload,
  ) -> Result<usize> {
    let offset = self.live_header(payload)?;
    Ok(self.header(offset)?.size)
  }

  /// Read access to a live allocation's payload, exactly as long as the size
  /// it was allocated with.
  pub fn payload(
    &self,
    payload: Payload,
  ) -> Result<&[u8]> {
    let end = self.payload_end(payload)?;
    let region_size = self.region.len();
    self
      .region
      .bytes()
      .get(payload.0..end)
      .ok_or(HeapError::HeaderOutOfBounds { offset: payload.0, region_size })
  }

  /// Write access to a live allocation's payload.
  pub fn payload_mut(
    &mut self,
    payload: Payload,
  ) -> Result<&mut [u8]> {
    let end = self.payload_end(payload)?;
    let region_size = self.region.len();
    self
      .region
      .bytes_mut()
      .get_mut(payload.0..end)
      .ok_or(HeapError::HeaderOutOfBounds { offset: payload.0, region_size })
  }

  /// Address of a live allocation's first payload byte in process memory.
  pub fn address_of(
    &self,
    payload: Payload,
  ) -> Result<*const u8> {
    Ok(self.payload(payload)?.as_ptr())
  }

  /// Header offset of the first free block, if any block is free.
  pub fn head(&self) -> Option<usize> {
    self.head
  }

  pub fn free_blocks(&self) -> FreeBlocks<'_> {
    FreeBlocks {
      arena: self.region.bytes(),
      cursor: self.head,
    }
  }

  /// Human-readable trace of the free list, head first.
  pub fn dump(&self) -> FreeListDump<'_> {
    FreeListDump::new(self.free_blocks())
  }

  pub fn region_size(&self) -> usize {
    self.region.len()
  }

  pub fn region(&self) -> &R {
    &self.region
  }

  pub fn stats(&self) -> HeapStats {
    let mut stats = HeapStats {
      region_size: self.region.len(),
      ..HeapStats::default()
    };

    for block in self.free_blocks() {
      stats.free_blocks += 1;
      stats.free_bytes += block.size;
    }

    for (&offset, &slack) in &self.live {
      stats.allocated_blocks += 1;
      stats.absorbed_bytes += slack;
      match self.header(offset) {
        Ok(header) => stats.allocated_bytes += header.size,
        Err(err) => warn!("allocated block @{} unreadable: {}", offset, err),
      }
    }

    stats.overhead_bytes = (stats.free_blocks + stats.allocated_blocks) * HEADER_OVERHEAD;
    stats.absorbed_bytes += self.released_slack;
    stats
  }

  fn carve(
    &mut self,
    previous: Option<usize>,
    offset: usize,
    block: BlockHeader,
    requested_size: usize,
  ) -> Result<Payload> {
    let payload = payload_of(offset);
    let residual_offset = payload + align!(requested_size);

    let worth_splitting = (block.size - requested_size)
      .checked_sub(HEADER_OVERHEAD)
      .is_some_and(|rest| rest >= POINTER_WIDTH);
    let fits_in_block = residual_offset + HEADER_OVERHEAD <= self.physical_end(offset);

    if worth_splitting && fits_in_block {
      let residual = BlockHeader::new(block.size - HEADER_OVERHEAD - requested_size, block.next);
      debug!(
        "splitting block @{}: {} -> {} + residual {} @{}",
        offset, block.size, requested_size, residual.size, residual_offset
      );

      residual.write(self.region.bytes_mut(), residual_offset)?;
      self.relink(previous, Some(residual_offset))?;
      self.claim(offset, requested_size, 0)?;
    } else {
      let slack = block.size - requested_size;
      debug!(
        "handing out block @{} whole: {} bytes for {} ({} absorbed)",
        offset, block.size, requested_size, slack
      );

      self.relink(previous, block.next)?;
      self.claim(offset, requested_size, slack)?;
    }

    Ok(Payload(payload))
  }

  // Points `previous` (or the head, when the block was first) at `next`.
  fn relink(
    &mut self,
    previous: Option<usize>,
    next: Option<usize>,
  ) -> Result<()> {
    match previous {
      Some(previous) => {
        let mut header = self.header(previous)?;
        header.next = next;
        header.write(self.region.bytes_mut(), previous)
      }
      None => {
        self.head = next;
        Ok(())
      }
    }
  }

  fn claim(
    &mut self,
    offset: usize,
    size: usize,
    slack: usize,
  ) -> Result<()> {
    BlockHeader::new(size, None).write(self.region.bytes_mut(), offset)?;
    self.live.insert(offset, slack);
    self.released.remove(&offset);
    Ok(())
  }

  fn payload_end(
    &self,
    payload: Payload,
  ) -> Result<usize> {
    let offset = self.live_header(payload)?;
    Ok(payload.0 + self.header(offset)?.size)
  }

  // First byte past the block at `offset`: the next header in address order,
  // or the end of the region.
  fn physical_end(
    &self,
    offset: usize,
  ) -> usize {
    let next_live = self.live.range(offset + 1..).next().map(|(&header, _)| header);
    let next_free = self.free_blocks().map(|block| block.offset).filter(|&header| header > offset).min();

    [next_live, next_free].into_iter().flatten().min().unwrap_or(self.region.len())
  }

  fn live_header(
    &self,
    payload: Payload,
  ) -> Result<usize> {
    let offset = header_of(payload.0).ok_or(HeapError::InvalidHandle { offset: payload.0 })?;

    if self.live.contains_key(&offset) {
      return Ok(offset);
    }

    if self.released.contains(&offset) {
      Err(HeapError::DoubleRelease { offset: payload.0 })
    } else {
      Err(HeapError::InvalidHandle { offset: payload.0 })
    }
  }

  fn header(
    &self,
    offset: usize,
  ) -> Result<BlockHeader> {
    BlockHeader::read(self.region.bytes(), offset)
  }
}

fn check_region_size(region_size: usize) -> Result<()> {
  if region_size == 0 || region_size < HEADER_OVERHEAD {
    return Err(HeapError::InvalidSize {
      size: region_size,
      reason: "region must hold at least one block header",
    });
  }
  Ok(())
}
