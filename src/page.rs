use std::ptr::NonNull;

/// Mask with `num_chunks` bits set starting at bit `first_chunk`.
///
/// Bit `i` stands for chunk `i`, the chunk covering bytes
/// `[i * chunk_size, (i + 1) * chunk_size)` of the page.
pub fn run_mask(
  first_chunk: usize,
  num_chunks: usize,
) -> u64 {
  debug_assert!(first_chunk + num_chunks <= u64::BITS as usize);

  let ones = match num_chunks {
    0 => 0,
    n if n >= u64::BITS as usize => u64::MAX,
    n => (1u64 << n) - 1,
  };

  ones.checked_shl(first_chunk as u32).unwrap_or(0)
}

/// One mapped page and the chunks handed out from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  base: NonNull<u8>,
  occupancy: u64,
}

impl Page {
  pub fn new(base: NonNull<u8>) -> Self {
    Self { base, occupancy: 0 }
  }

  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  pub fn base_addr(&self) -> usize {
    self.base.as_ptr() as usize
  }

  pub fn occupancy(&self) -> u64 {
    self.occupancy
  }

  pub fn used_chunks(&self) -> usize {
    self.occupancy.count_ones() as usize
  }

  pub fn contains(
    &self,
    addr: usize,
    page_size: usize,
  ) -> bool {
    let base = self.base_addr();
    addr >= base && addr - base < page_size
  }

  /// First-fit search for `num_chunks` free chunks.
  ///
  /// Every start offset from `0` to `chunks_per_page - num_chunks` is tried,
  /// lowest first.
  pub fn find_free_run(
    &self,
    num_chunks: usize,
    chunks_per_page: usize,
  ) -> Option<usize> {
    if num_chunks == 0 || num_chunks > chunks_per_page {
      return None;
    }

    (0..=chunks_per_page - num_chunks)
      .find(|&first| run_mask(first, num_chunks) & self.occupancy == 0)
  }

  pub fn is_run_allocated(
    &self,
    first_chunk: usize,
    num_chunks: usize,
  ) -> bool {
    let mask = run_mask(first_chunk, num_chunks);
    self.occupancy & mask == mask
  }

  pub fn mark(
    &mut self,
    first_chunk: usize,
    num_chunks: usize,
  ) {
    self.occupancy |= run_mask(first_chunk, num_chunks);
  }

  pub fn clear(
    &mut self,
    first_chunk: usize,
    num_chunks: usize,
  ) {
    self.occupancy &= !run_mask(first_chunk, num_chunks);
  }

  /// Address of chunk `chunk` within this page.
  pub(crate) fn chunk_ptr(
    &self,
    chunk: usize,
    chunk_size: usize,
  ) -> NonNull<u8> {
    // SAFETY: callers only pass chunk indices inside the page, so the offset
    // stays within the mapping.
    unsafe { self.base.add(chunk * chunk_size) }
  }
}
