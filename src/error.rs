//! Error types shared by the tracking resource and the array.

use thiserror::Error;

/// Errors raised by allocation, deallocation and checked element access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// The upstream allocator could not satisfy the request.
  #[error("out of memory: {size} bytes aligned to {align}")]
  OutOfMemory {
    /// Requested size in bytes.
    size: usize,
    /// Requested alignment in bytes.
    align: usize,
  },

  /// The address was already marked free.
  #[error("double deallocation detected at {addr:#x}")]
  DoubleFree {
    /// The offending address.
    addr: usize,
  },

  /// The address was never issued by this resource.
  #[error("deallocation of unknown block at {addr:#x}")]
  UnknownBlock {
    /// The offending address.
    addr: usize,
  },

  /// Checked access past the last live element.
  #[error("index {index} out of range for length {len}")]
  IndexOutOfRange {
    /// The requested index.
    index: usize,
    /// Number of live elements.
    len: usize,
  },

  /// The requested capacity does not fit in a memory layout.
  #[error("capacity overflow")]
  CapacityOverflow,
}

/// Result type for every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;
