use std::{env, io::Read, num::NonZeroUsize, ptr::NonNull};

use chunkalloc::{AllocationManager, AllocatorConfig, ConsoleLogger, LogLevel, logger::bit_string};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect the process with tools like `pmap` or
/// `gdb` while pages get mapped. Set `CHUNKALLOC_NO_PAUSE` to run straight
/// through.
fn block_until_enter_pressed() {
  if env::var_os("CHUNKALLOC_NO_PAUSE").is_some() {
    return;
  }

  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints every page with its occupancy bitmap, chunk 0 on the right.
fn print_pages(
  label: &str,
  allocator: &AllocationManager,
) {
  let stats = allocator.stats();

  println!(
    "[{}] {} page(s), {} chunk(s) used, {} free, {} bytes in use",
    label, stats.pages, stats.used_chunks, stats.free_chunks, stats.bytes_in_use,
  );

  for (index, page) in allocator.pages().enumerate() {
    println!("    page {} at {:?}: {}", index, page.base(), bit_string(page.occupancy()));
  }
}

fn print_alloc(
  num_bytes: usize,
  address: NonNull<u8>,
  allocator: &AllocationManager,
) {
  println!(
    "Allocated {} bytes ({} reserved), address = {:?}",
    num_bytes,
    allocator.geometry().rounded_size(num_bytes).unwrap(),
    address,
  );
}

fn main() {
  // CHUNKALLOC_LOG=info shows every bitmap change the allocator makes.
  let level = env::var("CHUNKALLOC_LOG")
    .ok()
    .and_then(|value| value.parse().ok())
    .unwrap_or(LogLevel::Error);

  // 4 chunks of 1 KiB per page, at most 3 pages.
  let config = AllocatorConfig::new(4096, 1024).with_max_pages(NonZeroUsize::new(3));
  let mut allocator = AllocationManager::new(config)
    .unwrap()
    .with_logger(ConsoleLogger::new(level));

  print_pages("start", &allocator);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Allocate a single chunk. The first page gets mapped.
  // --------------------------------------------------------------------
  let first = allocator.allocate(1024).unwrap();
  println!("\n[1] Allocate 1024 bytes");
  print_alloc(1024, first, &allocator);

  unsafe {
    let first_ptr = first.as_ptr() as *mut u32;
    first_ptr.write(0xDEADBEEF);
    println!("[1] Value written to first = 0x{:X}", first_ptr.read());
  }
  print_pages("1", &allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Allocate 3000 bytes. Rounded up to 3 chunks, this fills the page.
  // --------------------------------------------------------------------
  let second = allocator.allocate(3000).unwrap();
  println!("\n[2] Allocate 3000 bytes");
  print_alloc(3000, second, &allocator);
  print_pages("2", &allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) No room left, so the next chunk comes from a new page.
  // --------------------------------------------------------------------
  let third = allocator.allocate(10).unwrap();
  println!("\n[3] Allocate 10 bytes (page growth)");
  print_alloc(10, third, &allocator);
  print_pages("3", &allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Free the first chunk and allocate again. First fit reuses it.
  // --------------------------------------------------------------------
  allocator.free(first.as_ptr(), 1024).unwrap();
  println!("\n[4] Freed first at {:?}", first);
  print_pages("4", &allocator);

  let fourth = allocator.allocate(512).unwrap();
  println!(
    "[4] fourth == first? {}",
    if fourth == first {
      "Yes, it reused the freed chunk"
    } else {
      "No, it allocated somewhere else"
    }
  );

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Requests the allocator refuses.
  // --------------------------------------------------------------------
  println!("\n[5] Rejected requests");
  println!("    allocate(0)    -> {:?}", allocator.allocate(0).err());
  println!("    allocate(4097) -> {:?}", allocator.allocate(4097).err());

  allocator.free(third.as_ptr(), 10).unwrap();
  println!("    free twice     -> {:?}", allocator.free(third.as_ptr(), 10).err());

  let mut local = 0u8;
  println!("    free_mem(stack address) -> {}", allocator.free_mem(&mut local, 1));

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) Fill the pool until the page limit stops it.
  // --------------------------------------------------------------------
  let mut count = 0;
  while allocator.allocate(4096).is_ok() {
    count += 1;
  }
  println!("\n[6] {} more full pages before hitting the limit", count);
  print_pages("6", &allocator);

  // --------------------------------------------------------------------
  // 7) End of demo. Dropping the manager unmaps its pages.
  // --------------------------------------------------------------------
  drop(allocator);
  println!("\n[7] End of example. All pages have been unmapped.");
}
