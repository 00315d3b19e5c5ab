use std::{io, ptr, ptr::NonNull};

use libc::{
  MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_EXEC, PROT_READ, PROT_WRITE, c_void, mmap, munmap,
};

use crate::error::MapError;

/// Where the allocator gets its pages from.
pub trait PageSource {
  /// Maps `len` bytes of anonymous, private, read/write/execute memory.
  fn map(
    &mut self,
    len: usize,
  ) -> Result<NonNull<u8>, MapError>;

  /// Releases a region previously returned by [`PageSource::map`].
  ///
  /// # Safety
  ///
  /// `base` and `len` must describe exactly one earlier mapping, and nothing
  /// may access that memory afterwards.
  unsafe fn unmap(
    &mut self,
    base: NonNull<u8>,
    len: usize,
  ) -> Result<(), MapError>;
}

/// Pages straight from `mmap(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapSource;

impl PageSource for MmapSource {
  fn map(
    &mut self,
    len: usize,
  ) -> Result<NonNull<u8>, MapError> {
    let address = unsafe {
      mmap(
        ptr::null_mut(),
        len,
        PROT_READ | PROT_WRITE | PROT_EXEC,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(MapError::Os {
        len,
        source: io::Error::last_os_error(),
      });
    }

    NonNull::new(address as *mut u8).ok_or_else(|| MapError::Os {
      len,
      source: io::Error::from(io::ErrorKind::OutOfMemory),
    })
  }

  unsafe fn unmap(
    &mut self,
    base: NonNull<u8>,
    len: usize,
  ) -> Result<(), MapError> {
    let rc = unsafe { munmap(base.as_ptr() as *mut c_void, len) };

    if rc != 0 {
      return Err(MapError::Unmap {
        base: base.as_ptr() as usize,
        len,
        source: io::Error::last_os_error(),
      });
    }

    Ok(())
  }
}
