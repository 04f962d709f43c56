//! Allocator geometry.
//!
//! Bucket `b` holds blocks of `2^(max_alloc_log2 - b)` bytes; bucket 0 is the
//! whole window and bucket `bucket_count() - 1` holds `MIN_ALLOC` blocks.

use super::AllocError;
use mos_utils::bits;

/// Bytes reserved in front of every allocation for the request size.
pub const HEADER_SIZE: usize = 8;

/// Bytes a free block needs for its `prev`/`next` links.
pub const LINK_SIZE: usize = 2 * core::mem::size_of::<usize>();

/// Upper bound on buckets; one per bit of address width.
pub const MAX_BUCKETS: usize = usize::BITS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuddyConfig {
    min_alloc_log2: usize,
    max_alloc_log2: usize,
}

impl BuddyConfig {
    /// 128-byte minimum blocks in a 512 MiB window.
    pub const DEFAULT: Self = Self {
        min_alloc_log2: 7,
        max_alloc_log2: 29,
    };

    pub const fn new(min_alloc_log2: usize, max_alloc_log2: usize) -> Result<Self, AllocError> {
        if max_alloc_log2 < min_alloc_log2 || max_alloc_log2 >= usize::BITS as usize {
            return Err(AllocError::InvalidConfig);
        }
        // A free block stores two links; an allocated one stores the header.
        if (1usize << min_alloc_log2) < LINK_SIZE || (1usize << min_alloc_log2) < HEADER_SIZE {
            return Err(AllocError::InvalidConfig);
        }
        if max_alloc_log2 - min_alloc_log2 + 1 > MAX_BUCKETS {
            return Err(AllocError::InvalidConfig);
        }
        Ok(Self {
            min_alloc_log2,
            max_alloc_log2,
        })
    }

    pub const fn min_alloc_log2(&self) -> usize {
        self.min_alloc_log2
    }

    pub const fn max_alloc_log2(&self) -> usize {
        self.max_alloc_log2
    }

    pub const fn min_alloc(&self) -> usize {
        1 << self.min_alloc_log2
    }

    pub const fn max_alloc(&self) -> usize {
        1 << self.max_alloc_log2
    }

    pub const fn bucket_count(&self) -> usize {
        self.max_alloc_log2 - self.min_alloc_log2 + 1
    }

    /// Size of the blocks tracked by `bucket`.
    pub const fn block_size(&self, bucket: usize) -> usize {
        1 << (self.max_alloc_log2 - bucket)
    }

    /// One bit per node larger than `MIN_ALLOC`, rounded up to whole bytes.
    pub const fn split_bytes(&self) -> usize {
        bits::bytes_for(1 << (self.bucket_count() - 1))
    }
}

impl Default for BuddyConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
