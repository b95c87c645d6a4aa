//! # dynalloc - A Growable Array over a Block-Recycling Allocator
//!
//! This crate pairs two primitives:
//!
//! - [`TrackingResource`]: an allocator that remembers every block it ever
//!   obtained from an upstream allocator and recycles freed blocks
//!   (first fit, in creation order) instead of returning them upstream.
//! - [`DynArray`]: a contiguous, growable array generic over any
//!   [`Allocator`], which `&TrackingResource` implements.
//!
//! ## Overview
//!
//! ```text
//!   Block Recycling:
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │  TrackingResource                                                │
//!   │                                                                  │
//!   │   blocks (creation order = search order)                         │
//!   │   ┌──────────┬──────────┬──────────┬──────────┐                  │
//!   │   │ 4B  used │ 8B  free │ 16B used │ 32B free │                  │
//!   │   └──────────┴──────────┴──────────┴──────────┘                  │
//!   │                  ▲                                               │
//!   │                  └── allocate(6 bytes) reuses this one           │
//!   │                                                                  │
//!   │   no fit? ──► Upstream::allocate ──► new block appended          │
//!   └──────────────────────────────────────────────────────────────────┘
//!
//!   deallocate only flips `in_use`; memory goes back upstream when the
//!   resource is dropped.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   dynalloc
//!   ├── error      - Error enum and Result alias
//!   ├── config     - ResourceConfig (log label, drop-time report)
//!   ├── upstream   - Upstream trait, System and Malloc upstreams
//!   ├── block      - Block record (internal)
//!   ├── resource   - TrackingResource and Stats
//!   ├── alloc      - Allocator capability used by DynArray
//!   ├── iter       - Cursor / CursorMut, Iter / IterMut
//!   └── array      - DynArray
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use dynalloc::{DynArray, TrackingResource};
//!
//! let resource = TrackingResource::new();
//!
//! {
//!     let mut arr = DynArray::new_in(&resource);
//!     for i in 0..5 {
//!         arr.push(i * 10).unwrap();
//!     }
//!     assert_eq!(arr[4], 40);
//! }
//!
//! // The array is gone but its buffers are kept for reuse.
//! assert_eq!(resource.used_blocks(), 0);
//! assert!(resource.allocation_count() > 0);
//! ```
//!
//! ## Growth
//!
//! ```text
//!   push into a full array:
//!
//!   old ┌───┬───┬───┬───┐
//!       │ a │ b │ c │ d │        cap 4
//!       └───┴───┴───┴───┘
//!         │   │   │   │   bitwise move
//!         ▼   ▼   ▼   ▼
//!   new ┌───┬───┬───┬───┬───┬───┬───┬───┐
//!       │ a │ b │ c │ d │ e │   │   │   │   cap 8
//!       └───┴───┴───┴───┴───┴───┴───┴───┘
//!
//!   old buffer is handed back to the allocator afterwards.
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the resource uses a `RefCell`, arrays hold raw
//!   pointers; neither is `Sync`.
//! - **Append-only growth**: no insert, remove or shrink.
//! - **Linear search**: reuse scans every block; this is a diagnostic
//!   allocator, not a fast one.
//!
//! ## Diagnostics
//!
//! Block creation, reuse and cleanup are logged at `debug` through the
//! [`log`] facade, stats at `info`, leaked blocks at `warn`. Install any
//! logger to see them.

mod alloc;
pub mod array;
mod block;
pub mod config;
pub mod error;
pub mod iter;
pub mod resource;
pub mod upstream;

pub use alloc::Allocator;
pub use array::DynArray;
pub use config::ResourceConfig;
pub use error::{Error, Result};
pub use iter::{Cursor, CursorMut, Iter, IterMut};
pub use resource::{Stats, TrackingResource};
pub use upstream::{Malloc, System, Upstream};
