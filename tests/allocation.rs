use std::{num::NonZeroUsize, ptr};

use chunkalloc::{
  AllocError, AllocationManager, AllocatorConfig, ConfigError, ConsoleLogger, LogFacade, LogLevel,
  MmapSource, NoopLogger,
};

fn bounded(max_pages: usize) -> AllocatorConfig {
  AllocatorConfig::default().with_max_pages(NonZeroUsize::new(max_pages))
}

fn quiet(config: AllocatorConfig) -> AllocationManager {
  AllocationManager::with_parts(config, MmapSource, NoopLogger).unwrap()
}

fn occupancies(allocator: &AllocationManager) -> Vec<u64> {
  allocator.pages().map(|page| page.occupancy()).collect()
}

#[test]
fn chunk_rounding() {
  let mut allocator = quiet(AllocatorConfig::default());

  for num_bytes in [1usize, 17, 63, 64] {
    allocator.allocate(num_bytes).unwrap();
  }
  allocator.allocate(65).unwrap();

  assert_eq!(allocator.stats().used_chunks, 4 + 2);
}

#[test]
fn invalid_geometry_fails_construction() {
  let config = AllocatorConfig::new(1000, 64).with_log_level(LogLevel::None);

  assert!(matches!(
    AllocationManager::new(config),
    Err(ConfigError::PageNotMultipleOfChunk {
      page_size: 1000,
      chunk_size: 64
    })
  ));
}

#[test]
fn growth_is_the_same_for_both_page_stores() {
  for config in [AllocatorConfig::default(), bounded(4)] {
    let mut allocator = quiet(config);

    for _ in 0..64 {
      allocator.allocate(64).unwrap();
    }
    assert_eq!(allocator.page_count(), 1);

    let address = allocator.allocate(64).unwrap();
    assert_eq!(allocator.page_count(), 2);

    let new_page = allocator.pages().nth(1).unwrap();
    assert_eq!(address, new_page.base());
  }
}

#[test]
fn bounded_pool_stops_growing() {
  let mut allocator = quiet(bounded(2));

  allocator.allocate(4096).unwrap();
  allocator.allocate(4096).unwrap();

  assert!(matches!(
    allocator.allocate(64),
    Err(AllocError::PageLimitReached { max_pages: 2 })
  ));
  assert!(allocator.alloc_mem(64).is_null());
  assert_eq!(occupancies(&allocator), vec![u64::MAX, u64::MAX]);
}

#[test]
fn round_trip_on_every_page() {
  let mut allocator = quiet(AllocatorConfig::new(4096, 512));
  let mut live = Vec::new();

  for num_bytes in [512usize, 1000, 2048, 4096, 100, 3000] {
    let before = occupancies(&allocator);
    let address = allocator.alloc_mem(num_bytes as u64);
    assert!(!address.is_null());

    live.push((address, num_bytes, before));
  }
  assert_eq!(allocator.page_count(), 3);

  for (address, num_bytes, before) in live.into_iter().rev() {
    assert_eq!(allocator.free_mem(address, num_bytes as i64), 0);

    let after = occupancies(&allocator);
    assert_eq!(&after[..before.len()], &before[..]);
  }

  assert_eq!(allocator.stats().used_chunks, 0);
}

#[test]
fn allocations_hold_independent_data() {
  let mut allocator = quiet(AllocatorConfig::new(4096, 256));
  let sizes = [256usize, 700, 1, 1024, 300];

  let blocks: Vec<_> = sizes
    .iter()
    .map(|&size| (allocator.allocate(size).unwrap(), size))
    .collect();

  unsafe {
    for (i, (address, size)) in blocks.iter().enumerate() {
      ptr::write_bytes(address.as_ptr(), i as u8 + 1, *size);
    }

    for (i, (address, size)) in blocks.iter().enumerate() {
      let bytes = std::slice::from_raw_parts(address.as_ptr(), *size);
      assert!(bytes.iter().all(|&b| b == i as u8 + 1));
    }
  }
}

#[test]
fn unknown_free_changes_nothing() {
  let mut allocator = quiet(AllocatorConfig::default());
  allocator.allocate(200).unwrap();
  let before = occupancies(&allocator);

  let mut outside = [0u8; 64];
  assert_eq!(allocator.free_mem(outside.as_mut_ptr(), 64), -1);
  assert_eq!(occupancies(&allocator), before);
}

#[test]
fn loggers_do_not_change_behaviour() {
  let run = |allocator: AllocationManager| {
    let mut allocator = allocator;
    let mut offsets = Vec::new();

    for num_bytes in [100usize, 4000, 64, 0, 5000, 1] {
      let address = allocator.alloc_mem(num_bytes as u64) as usize;
      let located = allocator
        .pages()
        .enumerate()
        .find(|(_, page)| page.contains(address, 4096))
        .map(|(index, page)| (index, address - page.base_addr()));
      offsets.push(located);
    }

    (offsets, occupancies(&allocator))
  };

  let config = AllocatorConfig::default();
  let silent = run(quiet(config));
  let facade = run(
    AllocationManager::new(config)
      .unwrap()
      .with_logger(LogFacade::new(LogLevel::Info)),
  );
  let console = run(
    AllocationManager::new(config)
      .unwrap()
      .with_logger(ConsoleLogger::new(LogLevel::Warn)),
  );

  assert_eq!(silent, facade);
  assert_eq!(silent, console);
}
