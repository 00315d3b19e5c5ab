use std::{ptr, ptr::NonNull};

use crate::{
  align_down,
  config::{AllocatorConfig, Geometry},
  error::{AllocError, ConfigError, FreeError, Result},
  logger::{ConsoleLogger, LogLevel, Logger},
  os::{MmapSource, PageSource},
  page::Page,
  store::PageStore,
};

macro_rules! diag {
  ($logger:expr, $level:ident, $($arg:tt)+) => {
    $logger.log(LogLevel::$level, format_args!($($arg)+))
  };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Usage {
  Allocate,
  Free,
}

/// Snapshot of how much of the pool is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
  pub pages: usize,
  pub used_chunks: usize,
  pub free_chunks: usize,
  pub bytes_in_use: usize,
}

/// Hands out runs of fixed-size chunks carved from mapped pages.
///
/// Each page tracks its chunks in a 64 bit occupancy bitmap. Requests are
/// served first-fit from the existing pages in the order they were mapped,
/// and a new page is mapped only when none of them has room.
///
/// The manager is single-threaded. Wrap it in a mutex if it has to be shared.
pub struct AllocationManager<S: PageSource = MmapSource> {
  geometry: Geometry,
  pages: PageStore,
  source: S,
  logger: Box<dyn Logger>,
}

impl AllocationManager<MmapSource> {
  /// Builds a manager backed by `mmap(2)` that logs to the console at
  /// `config.log_level`.
  pub fn new(config: AllocatorConfig) -> Result<Self, ConfigError> {
    Self::with_source(config, MmapSource)
  }
}

impl<S: PageSource> AllocationManager<S> {
  /// Like [`new`](AllocationManager::new), with pages coming from `source`.
  pub fn with_source(
    config: AllocatorConfig,
    source: S,
  ) -> Result<Self, ConfigError> {
    Self::with_parts(config, source, ConsoleLogger::new(config.log_level))
  }

  /// Builds a manager that reports everything, including a rejected
  /// geometry, to `logger`. `config.log_level` is not consulted.
  pub fn with_parts(
    config: AllocatorConfig,
    source: S,
    logger: impl Logger + 'static,
  ) -> Result<Self, ConfigError> {
    let geometry = config.validate().inspect_err(|err| {
      diag!(logger, Error, "Invalid allocator geometry: {}", err);
    })?;

    Ok(Self {
      geometry,
      pages: PageStore::new(geometry.max_pages()),
      source,
      logger: Box::new(logger),
    })
  }

  /// Replaces the diagnostic sink.
  pub fn with_logger(
    mut self,
    logger: impl Logger + 'static,
  ) -> Self {
    self.logger = Box::new(logger);
    self
  }

  pub fn geometry(&self) -> &Geometry {
    &self.geometry
  }

  pub fn page_count(&self) -> usize {
    self.pages.len()
  }

  /// Page records in the order they were mapped.
  pub fn pages(&self) -> impl Iterator<Item = &Page> + '_ {
    self.pages.iter()
  }

  pub fn stats(&self) -> Stats {
    let pages = self.pages.len();
    let used_chunks: usize = self.pages.iter().map(Page::used_chunks).sum();

    Stats {
      pages,
      used_chunks,
      free_chunks: pages * self.geometry.chunks_per_page() - used_chunks,
      bytes_in_use: used_chunks * self.geometry.chunk_size(),
    }
  }

  fn chunk_count(
    &self,
    num_bytes: u64,
  ) -> usize {
    let num_chunks = self.geometry.chunk_count(num_bytes);
    diag!(self.logger, Info, "{} chunks for {} bytes", num_chunks, num_bytes);

    num_chunks
  }

  /// Allocates at least `num_bytes`, rounded up to whole chunks.
  ///
  /// The returned address is chunk aligned relative to its page and stays
  /// valid until passed to [`free`](Self::free) with the same size.
  pub fn allocate(
    &mut self,
    num_bytes: usize,
  ) -> Result<NonNull<u8>> {
    self.allocate_bytes(num_bytes as u64)
  }

  fn allocate_bytes(
    &mut self,
    num_bytes: u64,
  ) -> Result<NonNull<u8>> {
    if num_bytes == 0 {
      diag!(self.logger, Error, "allocate called with 0 for num_bytes.");
      return Err(AllocError::ZeroSize);
    }

    let chunks_per_page = self.geometry.chunks_per_page();
    let num_chunks = self.chunk_count(num_bytes);

    if num_chunks > chunks_per_page {
      diag!(self.logger, Error, "Cannot allocate more than {} chunks!", chunks_per_page);
      return Err(AllocError::TooLarge {
        requested: num_bytes,
        chunks: num_chunks,
        max: chunks_per_page,
      });
    }

    let no_room = || AllocError::TooLarge {
      requested: num_bytes,
      chunks: num_chunks,
      max: chunks_per_page,
    };

    let (index, first_chunk) = match self.pages.first_fit(num_chunks, chunks_per_page) {
      Some(found) => found,
      None => {
        let index = self.add_page().inspect_err(|err| {
          diag!(self.logger, Error, "Call to add_page failed: {}", err);
        })?;

        let fresh = self.pages.get(index);
        match fresh.and_then(|page| page.find_free_run(num_chunks, chunks_per_page)) {
          Some(first_chunk) => (index, first_chunk),
          None => {
            diag!(self.logger, Error, "No availability on new page!");
            return Err(no_room());
          }
        }
      }
    };

    diag!(self.logger, Info, "First chunk to use is {}", first_chunk);

    self
      .change_usage(index, first_chunk, num_chunks, Usage::Allocate)
      .ok_or_else(no_room)
  }

  /// Maps one more page and returns its index in the pool.
  pub fn add_page(&mut self) -> Result<usize> {
    let page_size = self.geometry.page_size();

    if self.pages.is_full() {
      let max_pages = self.pages.capacity().unwrap_or(self.pages.len());
      diag!(self.logger, Error, "Page limit of {} reached.", max_pages);
      return Err(AllocError::PageLimitReached { max_pages });
    }

    diag!(self.logger, Info, "Allocating new page.");

    let base = self.source.map(page_size).inspect_err(|err| {
      diag!(self.logger, Error, "{}", err);
    })?;

    let addr = base.as_ptr() as usize;
    if align_down!(addr, page_size) != addr {
      diag!(
        self.logger,
        Error,
        "Mapped page at {:#x} is not aligned to {} bytes!",
        addr,
        page_size
      );
    }

    match self.pages.push(Page::new(base)) {
      Ok(index) => Ok(index),
      Err(page) => {
        if let Err(err) = unsafe { self.source.unmap(page.base(), page_size) } {
          diag!(self.logger, Error, "{}", err);
        }
        Err(AllocError::PageLimitReached {
          max_pages: self.pages.len(),
        })
      }
    }
  }

  /// Returns the run at `address` to the pool.
  ///
  /// `num_bytes` must be the size that was passed to [`allocate`](Self::allocate).
  /// The run has to be fully allocated, otherwise nothing changes and
  /// [`FreeError::NotAllocated`] is returned.
  pub fn free(
    &mut self,
    address: *mut u8,
    num_bytes: usize,
  ) -> Result<(), FreeError> {
    let addr = address as usize;
    let page_size = self.geometry.page_size();
    let chunk_size = self.geometry.chunk_size();
    let chunks_per_page = self.geometry.chunks_per_page();

    let Some((index, page)) = self.pages.find_containing(addr, page_size) else {
      diag!(self.logger, Error, "Couldn't locate page in which to free {:#x}!", addr);
      return Err(FreeError::UnknownAddress(addr));
    };

    if num_bytes == 0 {
      diag!(self.logger, Error, "free called with 0 for num_bytes.");
      return Err(FreeError::ZeroSize);
    }

    let page = *page;
    let offset = addr - page.base_addr();
    if align_down!(offset, chunk_size) != offset {
      diag!(self.logger, Error, "{:#x} is not on a chunk boundary!", addr);
      return Err(FreeError::Misaligned(addr));
    }

    let first_chunk = offset / chunk_size;
    let num_chunks = self.chunk_count(num_bytes as u64);

    if num_chunks > chunks_per_page - first_chunk {
      diag!(
        self.logger,
        Error,
        "{} chunks from chunk {} overrun the page!",
        num_chunks,
        first_chunk
      );
      return Err(FreeError::OutOfPage {
        first: first_chunk,
        chunks: num_chunks,
      });
    }

    if !page.is_run_allocated(first_chunk, num_chunks) {
      diag!(
        self.logger,
        Error,
        "{} chunks from chunk {} are not all allocated!",
        num_chunks,
        first_chunk
      );
      return Err(FreeError::NotAllocated {
        first: first_chunk,
        chunks: num_chunks,
      });
    }

    match self.change_usage(index, first_chunk, num_chunks, Usage::Free) {
      Some(_) => Ok(()),
      None => Err(FreeError::UnknownAddress(addr)),
    }
  }

  /// Like [`allocate`](Self::allocate), but reports failure as a null pointer.
  pub fn alloc_mem(
    &mut self,
    num_bytes: u64,
  ) -> *mut u8 {
    self
      .allocate_bytes(num_bytes)
      .map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  /// Like [`free`](Self::free), but reports `0` on success and a negative
  /// [`FreeError::status`] on failure.
  pub fn free_mem(
    &mut self,
    address: *mut u8,
    num_bytes: i64,
  ) -> i32 {
    let result = match usize::try_from(num_bytes) {
      Ok(num_bytes) => self.free(address, num_bytes),
      Err(_) => {
        diag!(self.logger, Error, "free_mem called with negative size {}.", num_bytes);
        Err(FreeError::NegativeSize(num_bytes))
      }
    };

    match result {
      Ok(()) => 0,
      Err(err) => err.status(),
    }
  }

  fn change_usage(
    &mut self,
    index: usize,
    first_chunk: usize,
    num_chunks: usize,
    usage: Usage,
  ) -> Option<NonNull<u8>> {
    let chunk_size = self.geometry.chunk_size();
    let logger = &self.logger;
    let page = self.pages.get_mut(index)?;

    diag!(
      logger,
      Info,
      "change_usage called. Page is {:?}, first chunk is {}, num_chunks is {}. {}",
      page.base(),
      first_chunk,
      num_chunks,
      match usage {
        Usage::Allocate => "allocating.",
        Usage::Free => "freeing.",
      }
    );

    logger.log_bits(LogLevel::Info, "Occupancy before operation is: ", page.occupancy());

    match usage {
      Usage::Allocate => page.mark(first_chunk, num_chunks),
      Usage::Free => page.clear(first_chunk, num_chunks),
    }

    logger.log_bits(LogLevel::Info, "Occupancy after operation is:  ", page.occupancy());

    Some(page.chunk_ptr(first_chunk, chunk_size))
  }
}

impl<S: PageSource> Drop for AllocationManager<S> {
  fn drop(&mut self) {
    let page_size = self.geometry.page_size();

    for page in self.pages.iter() {
      if let Err(err) = unsafe { self.source.unmap(page.base(), page_size) } {
        diag!(self.logger, Error, "{}", err);
      }
    }
  }
}
