//! # chunkalloc - A Fixed-Granularity Chunk Allocator
//!
//! This crate carves pages obtained from `mmap(2)` into equal-sized chunks and
//! hands out contiguous runs of chunks. Every page tracks which of its chunks
//! are in use with a single 64 bit occupancy bitmap.
//!
//! ## Overview
//!
//! ```text
//!   Page (4096 bytes, 64 chunks of 64 bytes):
//!
//!   ┌────┬────┬────┬────┬────┬────┬────┬────┬───────────────────────┬────┐
//!   │ c0 │ c1 │ c2 │ c3 │ c4 │ c5 │ c6 │ c7 │          ...          │ c63│
//!   └────┴────┴────┴────┴────┴────┴────┴────┴───────────────────────┴────┘
//!     A    A    -    -    -    B    B    -
//!
//!   occupancy = ...0000_0110_0011
//!                        ▲▲    ▲▲
//!                        ││    └┴── bits 0-1: A (100 bytes, 2 chunks)
//!                        └┴──────── bits 5-6: B (2 chunks)
//!
//!   Bit i stands for chunk i, bytes [i * chunk_size, (i + 1) * chunk_size).
//! ```
//!
//! An allocation of `n` bytes needs `ceil(n / chunk_size)` chunks. The pages
//! are scanned in the order they were mapped and the first page with enough
//! free chunks in a row wins (first fit, lowest chunk first). When no page has
//! room a new page is mapped, unless the configured page limit is reached.
//!
//! ## Crate Structure
//!
//! ```text
//!   chunkalloc
//!   ├── align      - Rounding macros (align_to!, align_down!)
//!   ├── config     - AllocatorConfig and the validated Geometry
//!   ├── error      - ConfigError, AllocError, FreeError, MapError
//!   ├── logger     - Logger trait and its console / log-crate / no-op sinks
//!   ├── manager    - AllocationManager: allocate, free, page growth
//!   ├── os         - PageSource trait and the mmap backed source
//!   ├── page       - Page record and the first-fit run search
//!   └── store      - PageStore: growable or fixed-capacity page pool
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chunkalloc::{AllocationManager, AllocatorConfig};
//!
//! let config = AllocatorConfig::new(4096, 1024);
//! let mut allocator = AllocationManager::new(config).unwrap();
//!
//! let ptr = allocator.allocate(1000).unwrap();
//! unsafe { ptr.as_ptr().write_bytes(0xAB, 1000) };
//!
//! allocator.free(ptr.as_ptr(), 1000).unwrap();
//! ```
//!
//! ## Freeing
//!
//! The allocator stores no per-allocation header. Callers pass back the
//! address *and* the size they asked for, and the chunk count is derived
//! again from that size. A free is refused without touching the bitmap when
//! the address is not inside a known page, is not on a chunk boundary, or the
//! run it describes is not fully allocated.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **One page per allocation**: requests larger than a page fail
//! - **Pages are never returned**: they are unmapped when the manager is dropped
//! - **Unix-only**: requires `libc` and `mmap` (POSIX systems)

pub mod align;
pub mod config;
pub mod error;
pub mod logger;
mod manager;
pub mod os;
pub mod page;
pub mod store;

pub use config::{AllocatorConfig, Geometry};
pub use error::{AllocError, ConfigError, FreeError, MapError, ParseLogLevelError};
pub use logger::{ConsoleLogger, LogFacade, LogLevel, Logger, NoopLogger};
pub use manager::{AllocationManager, Stats};
pub use os::{MmapSource, PageSource};
pub use page::Page;
