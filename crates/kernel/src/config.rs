//! Build-time kernel configuration.

use log::LevelFilter;
use mos_hal::allocator::BuddyConfig;

/// Start of the kernel heap window.
pub const HEAP_BASE: usize = 0x0100_0000;

/// 128-byte minimum blocks.
pub const MIN_ALLOC_LOG2: usize = 7;

/// 512 MiB window.
pub const MAX_ALLOC_LOG2: usize = 29;

pub const HEAP_CONFIG: BuddyConfig = match BuddyConfig::new(MIN_ALLOC_LOG2, MAX_ALLOC_LOG2) {
    Ok(config) => config,
    Err(_) => BuddyConfig::DEFAULT,
};

// Fail the build instead of silently running with the fallback above.
const _: () = assert!(
    HEAP_CONFIG.min_alloc_log2() == MIN_ALLOC_LOG2
        && HEAP_CONFIG.max_alloc_log2() == MAX_ALLOC_LOG2,
    "heap geometry out of range"
);

/// Bytes of split-bit storage the heap needs.
pub const HEAP_SPLIT_BYTES: usize = HEAP_CONFIG.split_bytes();

/// Size of the heap window.
pub const HEAP_SIZE: usize = 1 << MAX_ALLOC_LOG2;

#[cfg(feature = "verbose-syscalls")]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Trace;
#[cfg(not(feature = "verbose-syscalls"))]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;
