use std::num::NonZeroUsize;

use crate::{align_to, error::ConfigError, logger::LogLevel};

/// Width of the per-page occupancy bitmap.
pub const MAX_CHUNKS_PER_PAGE: usize = u64::BITS as usize;

pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Construction parameters of an [`AllocationManager`](crate::AllocationManager).
///
/// ```rust
/// use std::num::NonZeroUsize;
/// use chunkalloc::AllocatorConfig;
///
/// let geometry = AllocatorConfig::default()
///   .with_chunk_size(1024)
///   .with_max_pages(NonZeroUsize::new(8))
///   .validate()
///   .unwrap();
///
/// assert_eq!(geometry.chunks_per_page(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
  pub page_size: usize,
  pub chunk_size: usize,
  /// `None` lets the pool grow without bound.
  pub max_pages: Option<NonZeroUsize>,
  /// Level of the console logger installed by
  /// [`AllocationManager::new`](crate::AllocationManager::new). Managers
  /// built with an explicit logger ignore it.
  pub log_level: LogLevel,
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      chunk_size: DEFAULT_CHUNK_SIZE,
      max_pages: None,
      log_level: LogLevel::Error,
    }
  }
}

impl AllocatorConfig {
  pub fn new(
    page_size: usize,
    chunk_size: usize,
  ) -> Self {
    Self {
      page_size,
      chunk_size,
      ..Self::default()
    }
  }

  pub fn with_page_size(
    mut self,
    page_size: usize,
  ) -> Self {
    self.page_size = page_size;
    self
  }

  pub fn with_chunk_size(
    mut self,
    chunk_size: usize,
  ) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  pub fn with_max_pages(
    mut self,
    max_pages: Option<NonZeroUsize>,
  ) -> Self {
    self.max_pages = max_pages;
    self
  }

  pub fn with_log_level(
    mut self,
    log_level: LogLevel,
  ) -> Self {
    self.log_level = log_level;
    self
  }

  /// Checks the geometry and derives the number of chunks per page.
  pub fn validate(&self) -> Result<Geometry, ConfigError> {
    if self.chunk_size == 0 {
      return Err(ConfigError::ZeroChunkSize);
    }

    if self.page_size == 0 {
      return Err(ConfigError::ZeroPageSize);
    }

    if self.page_size % self.chunk_size != 0 {
      return Err(ConfigError::PageNotMultipleOfChunk {
        page_size: self.page_size,
        chunk_size: self.chunk_size,
      });
    }

    let chunks_per_page = self.page_size / self.chunk_size;
    if chunks_per_page > MAX_CHUNKS_PER_PAGE {
      return Err(ConfigError::TooManyChunksPerPage {
        chunks_per_page,
        max: MAX_CHUNKS_PER_PAGE,
      });
    }

    Ok(Geometry {
      page_size: self.page_size,
      chunk_size: self.chunk_size,
      chunks_per_page,
      max_pages: self.max_pages,
    })
  }
}

/// Validated allocator geometry, fixed for the lifetime of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
  page_size: usize,
  chunk_size: usize,
  chunks_per_page: usize,
  max_pages: Option<NonZeroUsize>,
}

impl Geometry {
  pub fn page_size(&self) -> usize {
    self.page_size
  }

  pub fn chunk_size(&self) -> usize {
    self.chunk_size
  }

  pub fn chunks_per_page(&self) -> usize {
    self.chunks_per_page
  }

  pub fn max_pages(&self) -> Option<NonZeroUsize> {
    self.max_pages
  }

  /// Number of chunks needed to hold `num_bytes`, rounded up.
  ///
  /// Saturates at `usize::MAX` for requests that do not fit the address space.
  pub fn chunk_count(
    &self,
    num_bytes: u64,
  ) -> usize {
    let chunks = num_bytes.div_ceil(self.chunk_size as u64);
    usize::try_from(chunks).unwrap_or(usize::MAX)
  }

  /// Bytes actually reserved for a request of `num_bytes`, or `None` when
  /// that rounds past `usize::MAX`.
  pub fn rounded_size(
    &self,
    num_bytes: usize,
  ) -> Option<usize> {
    align_to!(num_bytes, self.chunk_size)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_geometry() {
    let geometry = AllocatorConfig::default().validate().unwrap();

    assert_eq!(geometry.page_size(), 4096);
    assert_eq!(geometry.chunk_size(), 64);
    assert_eq!(geometry.chunks_per_page(), 64);
    assert_eq!(geometry.max_pages(), None);
  }

  #[test]
  fn test_rejects_bad_geometry() {
    assert_eq!(
      AllocatorConfig::new(4096, 0).validate(),
      Err(ConfigError::ZeroChunkSize)
    );
    assert_eq!(
      AllocatorConfig::new(0, 64).validate(),
      Err(ConfigError::ZeroPageSize)
    );
    assert_eq!(
      AllocatorConfig::new(4096, 48).validate(),
      Err(ConfigError::PageNotMultipleOfChunk {
        page_size: 4096,
        chunk_size: 48,
      })
    );
    assert_eq!(
      AllocatorConfig::new(4096, 32).validate(),
      Err(ConfigError::TooManyChunksPerPage {
        chunks_per_page: 128,
        max: 64,
      })
    );
  }

  #[test]
  fn test_chunk_count_rounds_up() {
    let geometry = AllocatorConfig::default().validate().unwrap();

    for num_bytes in 1..=64 {
      assert_eq!(geometry.chunk_count(num_bytes), 1);
    }
    assert_eq!(geometry.chunk_count(65), 2);
    assert_eq!(geometry.chunk_count(4096), 64);
    assert_eq!(geometry.chunk_count(4097), 65);
    assert_eq!(geometry.chunk_count(0), 0);
  }

  #[test]
  fn test_non_power_of_two_chunks() {
    let geometry = AllocatorConfig::new(4800, 75).validate().unwrap();

    assert_eq!(geometry.chunks_per_page(), 64);
    assert_eq!(geometry.chunk_count(76), 2);
    assert_eq!(geometry.rounded_size(76), Some(150));
  }

  #[test]
  fn test_rounded_size_near_usize_max() {
    let geometry = AllocatorConfig::default().validate().unwrap();

    assert_eq!(geometry.rounded_size(1), Some(64));
    assert_eq!(geometry.rounded_size(usize::MAX - 63), Some(usize::MAX - 63));
    assert_eq!(geometry.rounded_size(usize::MAX - 62), None);
    assert_eq!(geometry.rounded_size(usize::MAX), None);
  }
}
