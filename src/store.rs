use std::num::NonZeroUsize;

use crate::page::Page;

/// Fixed-capacity arena of page records, allocated once up front.
#[derive(Debug)]
pub struct PageArena {
  slots: Box<[Option<Page>]>,
  len: usize,
}

impl PageArena {
  pub fn with_capacity(capacity: NonZeroUsize) -> Self {
    Self {
      slots: vec![None; capacity.get()].into_boxed_slice(),
      len: 0,
    }
  }

  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  fn filled(&self) -> &[Option<Page>] {
    &self.slots[..self.len]
  }
}

/// Ordered collection of page records.
///
/// Unbounded pools grow a `Vec`, bounded pools fill a pre-allocated arena.
/// Both keep insertion order and behave the same apart from `push` refusing
/// once the arena is full.
#[derive(Debug)]
pub enum PageStore {
  Growable(Vec<Page>),
  Fixed(PageArena),
}

impl PageStore {
  pub fn new(max_pages: Option<NonZeroUsize>) -> Self {
    match max_pages {
      Some(capacity) => PageStore::Fixed(PageArena::with_capacity(capacity)),
      None => PageStore::Growable(Vec::new()),
    }
  }

  pub fn len(&self) -> usize {
    match self {
      PageStore::Growable(pages) => pages.len(),
      PageStore::Fixed(arena) => arena.len,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn capacity(&self) -> Option<usize> {
    match self {
      PageStore::Growable(_) => None,
      PageStore::Fixed(arena) => Some(arena.capacity()),
    }
  }

  pub fn is_full(&self) -> bool {
    match self {
      PageStore::Growable(_) => false,
      PageStore::Fixed(arena) => arena.len == arena.capacity(),
    }
  }

  /// Appends `page` and returns its index, or hands it back when full.
  pub fn push(
    &mut self,
    page: Page,
  ) -> Result<usize, Page> {
    match self {
      PageStore::Growable(pages) => {
        pages.push(page);
        Ok(pages.len() - 1)
      }
      PageStore::Fixed(arena) => {
        if arena.len == arena.capacity() {
          return Err(page);
        }

        let index = arena.len;
        arena.slots[index] = Some(page);
        arena.len += 1;
        Ok(index)
      }
    }
  }

  pub fn get(
    &self,
    index: usize,
  ) -> Option<&Page> {
    match self {
      PageStore::Growable(pages) => pages.get(index),
      PageStore::Fixed(arena) => arena.filled().get(index)?.as_ref(),
    }
  }

  pub fn get_mut(
    &mut self,
    index: usize,
  ) -> Option<&mut Page> {
    match self {
      PageStore::Growable(pages) => pages.get_mut(index),
      PageStore::Fixed(arena) => {
        if index >= arena.len {
          return None;
        }
        arena.slots[index].as_mut()
      }
    }
  }

  pub fn iter(&self) -> Box<dyn Iterator<Item = &Page> + '_> {
    match self {
      PageStore::Growable(pages) => Box::new(pages.iter()),
      PageStore::Fixed(arena) => Box::new(arena.filled().iter().flatten()),
    }
  }

  /// The page whose range `[base, base + page_size)` holds `addr`, with its index.
  pub fn find_containing(
    &self,
    addr: usize,
    page_size: usize,
  ) -> Option<(usize, &Page)> {
    self
      .iter()
      .enumerate()
      .find(|(_, page)| page.contains(addr, page_size))
  }

  /// First page, in insertion order, with `num_chunks` free chunks in a row.
  ///
  /// Returns the page index and the first chunk of the run.
  pub fn first_fit(
    &self,
    num_chunks: usize,
    chunks_per_page: usize,
  ) -> Option<(usize, usize)> {
    self.iter().enumerate().find_map(|(index, page)| {
      let first_chunk = page.find_free_run(num_chunks, chunks_per_page)?;
      Some((index, first_chunk))
    })
  }
}
