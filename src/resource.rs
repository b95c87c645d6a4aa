use std::{alloc::Layout, cell::RefCell, fmt, ptr::NonNull};

use log::{debug, info, warn};

use crate::{
  block::Block,
  config::ResourceConfig,
  error::{Error, Result},
  upstream::{System, Upstream},
};

/// A caching layer in front of an [`Upstream`] allocator.
///
/// Every block ever requested from upstream is recorded. Deallocated blocks
/// are only marked free and handed out again to the first later request they
/// fit (first fit, in creation order). Memory goes back upstream only when the
/// resource itself is dropped.
///
/// The resource is shared by reference (`&TrackingResource` is an
/// [`Allocator`](crate::Allocator)) and is not thread-safe.
pub struct TrackingResource<U: Upstream = System> {
  blocks: RefCell<Vec<Block>>,
  upstream: U,
  config: ResourceConfig,
}

/// Snapshot of the resource's bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
  pub blocks: usize,
  pub used: usize,
  pub free: usize,
  pub total_bytes: usize,
}

impl fmt::Display for Stats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "Stats:\nTotal blocks: {}\nUsed blocks: {}\nFree blocks: {}\nTotal allocated: {} bytes",
      self.blocks, self.used, self.free, self.total_bytes
    )
  }
}

impl TrackingResource<System> {
  pub fn new() -> Self {
    Self::with_upstream(System)
  }
}

impl Default for TrackingResource<System> {
  fn default() -> Self {
    Self::new()
  }
}

impl<U: Upstream> TrackingResource<U> {
  pub fn with_upstream(upstream: U) -> Self {
    Self::with_config(upstream, ResourceConfig::default())
  }

  pub fn with_config(
    upstream: U,
    config: ResourceConfig,
  ) -> Self {
    debug!("[{}] created", config.label);

    Self {
      blocks: RefCell::new(Vec::new()),
      upstream,
      config,
    }
  }

  pub fn config(&self) -> &ResourceConfig {
    &self.config
  }

  fn find_free_block(
    blocks: &[Block],
    layout: Layout,
  ) -> Option<usize> {
    blocks.iter().position(|block| block.fits(layout))
  }

  fn find_block(
    blocks: &[Block],
    addr: NonNull<u8>,
  ) -> Option<usize> {
    blocks.iter().position(|block| block.addr == addr)
  }

  /// Returns a block of at least `layout.size()` bytes.
  ///
  /// Reuses the first free block that fits, otherwise asks upstream for a new
  /// block of exactly `layout` and records it.
  pub fn allocate(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    let mut blocks = self.blocks.borrow_mut();

    if let Some(idx) = Self::find_free_block(&blocks, layout) {
      let block = &mut blocks[idx];
      block.in_use = true;

      debug!(
        "[{}] Reused {} bytes at {:?} (block of {} bytes)",
        self.config.label,
        layout.size(),
        block.addr,
        block.size()
      );

      return Ok(block.addr);
    }

    let addr = self.upstream.allocate(layout)?;
    blocks.push(Block::new(addr, layout));

    debug!(
      "[{}] New allocation: {} bytes at {:?} (alignment {})",
      self.config.label,
      layout.size(),
      addr,
      layout.align()
    );

    Ok(addr)
  }

  /// Marks the block at `ptr` free for reuse. Size and alignment are not
  /// consulted; the block keeps the layout it was created with.
  ///
  /// # Errors
  ///
  /// [`Error::UnknownBlock`] if this resource never issued `ptr`,
  /// [`Error::DoubleFree`] if it is already free.
  ///
  /// # Safety
  ///
  /// The memory behind `ptr` must not be accessed afterwards: the next
  /// fitting request receives the same address.
  pub unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    _layout: Layout,
  ) -> Result<()> {
    let mut blocks = self.blocks.borrow_mut();
    let addr = ptr.as_ptr() as usize;

    let Some(idx) = Self::find_block(&blocks, ptr) else {
      return Err(Error::UnknownBlock { addr });
    };

    let block = &mut blocks[idx];
    if !block.in_use {
      return Err(Error::DoubleFree { addr });
    }
    block.in_use = false;

    debug!("[{}] Marked as free: {} bytes at {:?}", self.config.label, block.size(), ptr);
    Ok(())
  }

  /// Identity comparison: only the same instance is equal.
  pub fn is_equal(
    &self,
    other: &Self,
  ) -> bool {
    std::ptr::eq(self, other)
  }

  pub fn owns(
    &self,
    ptr: NonNull<u8>,
  ) -> bool {
    Self::find_block(&self.blocks.borrow(), ptr).is_some()
  }

  pub fn allocation_count(&self) -> usize {
    self.blocks.borrow().len()
  }

  pub fn used_blocks(&self) -> usize {
    self.blocks.borrow().iter().filter(|block| block.in_use).count()
  }

  pub fn free_blocks(&self) -> usize {
    self.allocation_count() - self.used_blocks()
  }

  pub fn total_allocated(&self) -> usize {
    self.blocks.borrow().iter().map(Block::size).sum()
  }

  pub fn stats(&self) -> Stats {
    let blocks = self.blocks.borrow();
    let used = blocks.iter().filter(|block| block.in_use).count();

    Stats {
      blocks: blocks.len(),
      used,
      free: blocks.len() - used,
      total_bytes: blocks.iter().map(Block::size).sum(),
    }
  }

  pub fn log_stats(&self) {
    info!("[{}] {}", self.config.label, self.stats());
  }
}

impl<U: Upstream> fmt::Debug for TrackingResource<U> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("TrackingResource")
      .field("label", &self.config.label)
      .field("stats", &self.stats())
      .finish()
  }
}

impl<U: Upstream> Drop for TrackingResource<U> {
  fn drop(&mut self) {
    if self.config.report_on_drop {
      self.log_stats();
    }

    let blocks = self.blocks.get_mut();
    let leaked = blocks.iter().filter(|block| block.in_use).count();

    for block in blocks.drain(..) {
      unsafe { self.upstream.deallocate(block.addr, block.layout) };
      debug!("[{}] Cleaned up: {} bytes at {:?}", self.config.label, block.size(), block.addr);
    }

    if leaked > 0 {
      warn!("[{}] {} blocks still in use at teardown", self.config.label, leaked);
    }
  }
}
