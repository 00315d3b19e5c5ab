use std::io;

use thiserror::Error;

/// Rejected allocator geometries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("chunk size must be greater than zero")]
  ZeroChunkSize,
  #[error("page size must be greater than zero")]
  ZeroPageSize,
  #[error("page size {page_size} is not a multiple of chunk size {chunk_size}")]
  PageNotMultipleOfChunk { page_size: usize, chunk_size: usize },
  #[error("{chunks_per_page} chunks per page exceed the {max} bit occupancy bitmap")]
  TooManyChunksPerPage { chunks_per_page: usize, max: usize },
}

/// A log level name that [`LogLevel`](crate::LogLevel) does not know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level `{0}`")]
pub struct ParseLogLevelError(pub String);

/// Failure of the OS mapping primitive.
#[derive(Error, Debug)]
pub enum MapError {
  #[error("mmap of {len} bytes failed: {source}")]
  Os {
    len: usize,
    #[source]
    source: io::Error,
  },
  #[error("munmap of {len} bytes at {base:#x} failed: {source}")]
  Unmap {
    base: usize,
    len: usize,
    #[source]
    source: io::Error,
  },
}

#[derive(Error, Debug)]
pub enum AllocError {
  #[error("cannot allocate 0 bytes")]
  ZeroSize,
  #[error("{requested} bytes need {chunks} chunks, a page only holds {max}")]
  TooLarge {
    requested: u64,
    chunks: usize,
    max: usize,
  },
  #[error("page limit of {max_pages} reached")]
  PageLimitReached { max_pages: usize },
  #[error(transparent)]
  Map(#[from] MapError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FreeError {
  #[error("address {0:#x} does not belong to any page")]
  UnknownAddress(usize),
  #[error("cannot free 0 bytes")]
  ZeroSize,
  #[error("address {0:#x} is not on a chunk boundary")]
  Misaligned(usize),
  #[error("run of {chunks} chunks at chunk {first} runs past the end of the page")]
  OutOfPage { first: usize, chunks: usize },
  #[error("run of {chunks} chunks at chunk {first} is not fully allocated")]
  NotAllocated { first: usize, chunks: usize },
  #[error("negative size {0}")]
  NegativeSize(i64),
}

impl FreeError {
  /// Status code reported by [`AllocationManager::free_mem`](crate::AllocationManager::free_mem).
  pub fn status(&self) -> i32 {
    match self {
      FreeError::UnknownAddress(_) => -1,
      FreeError::ZeroSize => -2,
      FreeError::Misaligned(_) => -3,
      FreeError::OutOfPage { .. } => -4,
      FreeError::NegativeSize(_) => -5,
      FreeError::NotAllocated { .. } => -6,
    }
  }
}

pub type Result<T, E = AllocError> = std::result::Result<T, E>;
