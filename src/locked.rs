use spin::{Mutex, MutexGuard};

use crate::{
  error::Result,
  heap::{HeapManager, HeapStats, Payload},
  region::{BoxedRegion, Region},
};

/// A [`HeapManager`] behind a spin lock, for callers that have to share one.
///
/// Every operation takes the lock for its whole duration, so calls from
/// different threads are applied one at a time.
pub struct LockedHeapManager<R: Region = BoxedRegion> {
  inner: Mutex<HeapManager<R>>,
}

impl LockedHeapManager<BoxedRegion> {
  pub fn init(region_size: usize) -> Result<Self> {
    Ok(Self::new(HeapManager::init(region_size)?))
  }
}

impl<R: Region> LockedHeapManager<R> {
  pub fn new(heap: HeapManager<R>) -> Self {
    Self {
      inner: Mutex::new(heap),
    }
  }

  pub fn allocate(
    &self,
    requested_size: usize,
  ) -> Result<Payload> {
    self.inner.lock().allocate(requested_size)
  }

  pub fn release(
    &self,
    payload: Payload,
  ) -> Result<()> {
    self.inner.lock().release(payload)
  }

  pub fn stats(&self) -> HeapStats {
    self.inner.lock().stats()
  }

  /// Holds the lock for a sequence of operations.
  pub fn lock(&self) -> MutexGuard<'_, HeapManager<R>> {
    self.inner.lock()
  }

  pub fn into_inner(self) -> HeapManager<R> {
    self.inner.into_inner()
  }
}
