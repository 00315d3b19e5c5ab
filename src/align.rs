/// Rounds `value` up to the next multiple of `align`, or `None` when the
/// result does not fit the integer type.
///
/// `align` does not need to be a power of two, chunk sizes such as 48 bytes
/// are valid geometries.
///
/// # Examples
///
/// ```rust
/// use chunkalloc::align_to;
///
/// assert_eq!(align_to!(1usize, 64), Some(64));
/// assert_eq!(align_to!(64usize, 64), Some(64));
/// assert_eq!(align_to!(65usize, 64), Some(128));
/// assert_eq!(align_to!(100usize, 48), Some(144));
/// assert_eq!(align_to!(usize::MAX, 64), None);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    {
      let value = $value;
      let align = $align;
      (value / align)
        .checked_add(if value % align == 0 { 0 } else { 1 })
        .and_then(|units| units.checked_mul(align))
    }
  };
}

/// Rounds `value` down to the previous multiple of `align`.
///
/// # Examples
///
/// ```rust
/// use chunkalloc::align_down;
///
/// assert_eq!(align_down!(0x1fff, 0x1000), 0x1000);
/// assert_eq!(align_down!(0x2000, 0x1000), 0x2000);
/// ```
#[macro_export]
macro_rules! align_down {
  ($value:expr, $align:expr) => {
    {
      let value = $value;
      value - value % ($align)
    }
  };
}

#[cfg(test)]
mod tests {
  #[test]
  fn test_align_to() {
    for chunk in [16usize, 48, 64, 1024] {
      for i in 0..10 {
        let sizes = (chunk * i + 1)..=(chunk * (i + 1));
        let expected = chunk * (i + 1);

        for size in sizes {
          assert_eq!(Some(expected), align_to!(size, chunk));
        }
      }
    }
  }

  #[test]
  fn test_align_to_overflow() {
    assert_eq!(align_to!(usize::MAX, 1usize), Some(usize::MAX));
    assert_eq!(align_to!(usize::MAX, 64usize), None);
    assert_eq!(align_to!(usize::MAX - 62, 64usize), None);
    assert_eq!(align_to!(usize::MAX - 63, 64usize), Some(usize::MAX - 63));
    assert_eq!(align_to!(usize::MAX - 64, 64usize), Some(usize::MAX - 63));
  }

  #[test]
  fn test_align_down() {
    let page = 4096usize;

    for base in [0usize, 0x7f00_0000_0000, 0x1000] {
      for offset in [0usize, 1, 63, 4095] {
        assert_eq!(base, align_down!(base + offset, page));
      }
    }
  }
}
