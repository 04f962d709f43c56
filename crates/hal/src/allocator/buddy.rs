use super::config::{BuddyConfig, HEADER_SIZE, LINK_SIZE, MAX_BUCKETS};
use super::free_list::{FreeBlocks, FreeList};
use super::window::Window;
use super::AllocError;
use mos_utils::BitArray;

// Buddy allocator over a single window of `MAX_ALLOC` bytes.
//
// The window is a complete binary tree of blocks: node 0 covers the whole
// window, node i has children 2i+1 and 2i+2. For every node above the
// minimum size there is one bit holding `used(left) XOR used(right)`, which
// is all release needs to decide whether a buddy can be merged.
//
// The tree starts as a single MIN_ALLOC leaf at `base` and grows upward
// (`bucket_limit` shrinks) only when a request needs it, so a large window
// costs nothing until it is used.

/// Point-in-time view of allocator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuddyStats {
    pub bucket_limit: usize,
    pub max_ptr: usize,
    pub free_bytes: usize,
    pub free_blocks: usize,
}

/// Buddy allocator handing out addresses in `[base, base + MAX_ALLOC)`.
///
/// `W` supplies the memory, `S` the split-bit storage (a static array in the
/// kernel, a `Vec<u8>` in tests). Every allocation is preceded by an 8-byte
/// header holding the request size.
pub struct BuddyAllocator<W, S> {
    config: BuddyConfig,
    window: W,
    /// `buckets[b]` holds free blocks of `2^(max_alloc_log2 - b)` bytes.
    buckets: [FreeList; MAX_BUCKETS],
    /// Bucket of the current tree root.
    bucket_limit: usize,
    node_is_split: BitArray<S>,
    /// Highest address touched so far.
    max_ptr: usize,
    initialized: bool,
}

impl<W, S> BuddyAllocator<W, S> {
    /// Create an allocator. Nothing is touched until the first `allocate`.
    pub const fn new(config: BuddyConfig, window: W, split_storage: S) -> Self {
        Self {
            config,
            window,
            buckets: [const { FreeList::new() }; MAX_BUCKETS],
            bucket_limit: 0,
            node_is_split: BitArray::new(split_storage),
            max_ptr: 0,
            initialized: false,
        }
    }

    pub fn config(&self) -> &BuddyConfig {
        &self.config
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    pub fn bucket_limit(&self) -> usize {
        self.bucket_limit
    }

    pub fn max_ptr(&self) -> usize {
        self.max_ptr
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl<W: Window, S: AsRef<[u8]> + AsMut<[u8]>> BuddyAllocator<W, S> {
    /// Allocate `request` bytes and return the payload address.
    pub fn allocate(&mut self, request: usize) -> Result<usize, AllocError> {
        let needed = match request.checked_add(HEADER_SIZE) {
            Some(needed) if needed <= self.config.max_alloc() => needed,
            _ => return Err(AllocError::RequestTooLarge),
        };
        self.ensure_initialized()?;

        let original_bucket = self.bucket_for_request(needed);
        let mut bucket = original_bucket;
        loop {
            // Grow the tree until the bucket being searched exists.
            self.lower_bucket_limit(bucket)?;

            let ptr = match self.buckets[bucket].pop_back(&mut self.window) {
                Some(ptr) => ptr,
                None => {
                    // Only the root bucket can be refilled by growing; any
                    // other empty bucket falls through to a larger one.
                    if bucket == 0 {
                        break;
                    }
                    if bucket != self.bucket_limit {
                        bucket -= 1;
                        continue;
                    }
                    self.lower_bucket_limit(bucket - 1)?;
                    // Growing from an in-use root pushed its right sibling here.
                    self.buckets[bucket]
                        .pop_back(&mut self.window)
                        .ok_or(AllocError::OutOfMemory)?
                }
            };

            let size = self.config.block_size(bucket);
            let bytes_needed = if bucket < original_bucket {
                size / 2 + LINK_SIZE
            } else {
                size
            };
            if let Err(err) = self.update_max_ptr(ptr + bytes_needed) {
                self.buckets[bucket].push_back(&mut self.window, ptr);
                return Err(err);
            }

            let mut node = self.node_for_ptr(ptr, bucket);
            if node != 0 {
                self.flip_parent_is_split(node);
            }
            // Split down to the requested size, keeping the left half and
            // freeing every right half on the way.
            while bucket < original_bucket {
                node = node * 2 + 1;
                bucket += 1;
                self.flip_parent_is_split(node);
                let right = self.ptr_for_node(node + 1, bucket);
                self.buckets[bucket].push_back(&mut self.window, right);
            }

            self.window.write_word(ptr, request);
            return Ok(ptr + HEADER_SIZE);
        }

        log::debug!("[BUDDY] out of memory for {request} byte request");
        Err(AllocError::OutOfMemory)
    }

    /// Return a block obtained from `allocate`. `0` is ignored.
    ///
    /// Addresses that cannot have come from this allocator are logged and
    /// dropped without touching memory.
    pub fn release(&mut self, addr: usize) {
        if addr == 0 {
            return;
        }
        let base = self.window.base();
        if !self.initialized || addr < base + HEADER_SIZE || addr >= self.max_ptr {
            log::warn!("[BUDDY] release of foreign address {addr:#x}");
            return;
        }

        let ptr = addr - HEADER_SIZE;
        let request = self.window.read_word(ptr);
        if request > self.config.max_alloc() - HEADER_SIZE {
            log::warn!("[BUDDY] corrupt header at {ptr:#x} (size {request})");
            return;
        }
        let mut bucket = self.bucket_for_request(request + HEADER_SIZE);
        if bucket < self.bucket_limit || (ptr - base) % self.config.block_size(bucket) != 0 {
            log::warn!("[BUDDY] release of misaligned block {addr:#x}");
            return;
        }

        let mut node = self.node_for_ptr(ptr, bucket);
        while node != 0 {
            self.flip_parent_is_split(node);
            // Parent still split means the buddy is in use; at the root
            // there is no buddy.
            if self.parent_is_split(node) || bucket == self.bucket_limit {
                break;
            }
            let buddy = self.ptr_for_node(((node - 1) ^ 1) + 1, bucket);
            self.buckets[bucket].remove(&mut self.window, buddy);
            node = (node - 1) / 2;
            bucket -= 1;
        }

        // Back of the list: the next pop of this size returns the same block.
        let block = self.ptr_for_node(node, bucket);
        self.buckets[bucket].push_back(&mut self.window, block);
    }

    /// Free blocks on `bucket`'s list, oldest first.
    pub fn free_blocks(&self, bucket: usize) -> FreeBlocks<'_, W> {
        self.buckets[bucket].iter(&self.window)
    }

    /// Raw split bit of `node` (one bit per node above MIN_ALLOC).
    pub fn is_split(&self, node: usize) -> bool {
        self.node_is_split.get(node)
    }

    pub fn split_bits(&self) -> &[u8] {
        self.node_is_split.as_bytes()
    }

    pub fn stats(&self) -> BuddyStats {
        let mut stats = BuddyStats {
            bucket_limit: self.bucket_limit,
            max_ptr: self.max_ptr,
            ..BuddyStats::default()
        };
        for bucket in 0..self.config.bucket_count() {
            let blocks = self.buckets[bucket].len();
            stats.free_blocks += blocks;
            stats.free_bytes += blocks * self.config.block_size(bucket);
        }
        stats
    }

    /// Address of the first byte of `node`, which lives in `bucket`.
    pub fn ptr_for_node(&self, node: usize, bucket: usize) -> usize {
        self.window.base() + ((node + 1 - (1 << bucket)) << (self.config.max_alloc_log2() - bucket))
    }

    /// Node of `bucket` whose block starts at `ptr`.
    pub fn node_for_ptr(&self, ptr: usize, bucket: usize) -> usize {
        ((ptr - self.window.base()) >> (self.config.max_alloc_log2() - bucket)) + (1 << bucket) - 1
    }

    /// Smallest block (largest bucket index) that fits `request` bytes.
    fn bucket_for_request(&self, request: usize) -> usize {
        let mut bucket = self.config.bucket_count() - 1;
        let mut size = self.config.min_alloc();
        while size < request {
            bucket -= 1;
            size <<= 1;
        }
        bucket
    }

    fn parent_is_split(&self, node: usize) -> bool {
        self.node_is_split.get((node - 1) / 2)
    }

    fn flip_parent_is_split(&mut self, node: usize) {
        self.node_is_split.flip((node - 1) / 2);
    }

    fn ensure_initialized(&mut self) -> Result<(), AllocError> {
        if self.initialized {
            return Ok(());
        }
        if self.node_is_split.as_bytes().len() < self.config.split_bytes() {
            return Err(AllocError::SplitStorageTooSmall);
        }
        if self.window.capacity() < self.config.max_alloc() {
            return Err(AllocError::InvalidConfig);
        }

        let base = self.window.base();
        self.node_is_split.clear_all();
        self.max_ptr = base;
        self.update_max_ptr(base + LINK_SIZE)?;
        self.bucket_limit = self.config.bucket_count() - 1;
        self.buckets[self.bucket_limit] = FreeList::new();
        self.buckets[self.bucket_limit].push_back(&mut self.window, base);
        self.initialized = true;
        log::debug!(
            "[BUDDY] window {base:#x}+{:#x}, {} buckets",
            self.config.max_alloc(),
            self.config.bucket_count()
        );
        Ok(())
    }

    fn update_max_ptr(&mut self, new_value: usize) -> Result<(), AllocError> {
        if new_value > self.max_ptr {
            if !self.window.reserve(new_value) {
                log::debug!("[BUDDY] reservation up to {new_value:#x} denied");
                return Err(AllocError::ReservationDenied);
            }
            self.max_ptr = new_value;
        }
        Ok(())
    }

    /// Double the tree until its root sits in `bucket` or above.
    fn lower_bucket_limit(&mut self, bucket: usize) -> Result<(), AllocError> {
        let base = self.window.base();
        while bucket < self.bucket_limit {
            let root = self.node_for_ptr(base, self.bucket_limit);

            // Whole tree free: the single block at `base` just gets bigger.
            if !self.parent_is_split(root) {
                self.buckets[self.bucket_limit].remove(&mut self.window, base);
                self.bucket_limit -= 1;
                self.buckets[self.bucket_limit] = FreeList::new();
                self.buckets[self.bucket_limit].push_back(&mut self.window, base);
                continue;
            }

            // Tree in use: its new right sibling becomes a free block and the
            // new root is marked used in its own parent.
            let right = self.ptr_for_node(root + 1, self.bucket_limit);
            self.update_max_ptr(right + LINK_SIZE)?;
            self.buckets[self.bucket_limit].push_back(&mut self.window, right);
            self.bucket_limit -= 1;
            self.buckets[self.bucket_limit] = FreeList::new();

            let new_root = (root - 1) / 2;
            if new_root != 0 {
                self.flip_parent_is_split(new_root);
            }
            log::debug!("[BUDDY] tree grown to bucket {}", self.bucket_limit);
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::allocator::BufferWindow;

    const BASE: usize = 0x0100_0000;

    type TestAllocator = BuddyAllocator<BufferWindow, Vec<u8>>;

    /// Helper: allocator over a fresh buffer sized exactly MAX_ALLOC.
    fn create_allocator(min_log2: usize, max_log2: usize) -> TestAllocator {
        let config = BuddyConfig::new(min_log2, max_log2).unwrap();
        let window = BufferWindow::new(BASE, config.max_alloc());
        BuddyAllocator::new(config, window, vec![0; config.split_bytes()])
    }

    /// 128-byte blocks in a 1 KiB window: four leaves, buckets 0..=3.
    fn small() -> TestAllocator {
        create_allocator(7, 10)
    }

    fn list(alloc: &TestAllocator, bucket: usize) -> Vec<usize> {
        alloc.free_blocks(bucket).collect()
    }

    #[test]
    fn test_nothing_touched_before_first_allocate() {
        let alloc = small();
        assert!(!alloc.is_initialized());
        assert_eq!(alloc.window().reserved(), 0);
        assert_eq!(alloc.stats(), BuddyStats::default());
    }

    #[test]
    fn test_first_allocation_is_base_plus_header() {
        let mut alloc = small();
        assert_eq!(alloc.allocate(100), Ok(BASE + 8));
        // 108 bytes fit the initial leaf; no growth.
        assert_eq!(alloc.bucket_limit(), 3);
        assert_eq!(alloc.window().read_word(BASE), 100);
    }

    #[test]
    fn test_fill_and_drain() {
        let mut alloc = small();
        let blocks: Vec<usize> = (0..4).map(|_| alloc.allocate(200).unwrap()).collect();
        assert_eq!(blocks, [BASE + 8, BASE + 264, BASE + 520, BASE + 776]);
        assert_eq!(alloc.allocate(200), Err(AllocError::OutOfMemory));

        for block in blocks {
            alloc.release(block);
        }
        assert_eq!(alloc.stats().free_bytes, 1024);
        assert_eq!(list(&alloc, 0), [BASE]);
        assert_eq!(alloc.allocate(900), Ok(BASE + 8));
    }

    #[test]
    fn test_coalesce_returns_merged_parent() {
        let mut alloc = small();
        let a = alloc.allocate(200).unwrap();
        let b = alloc.allocate(200).unwrap();
        assert_eq!((a, b), (BASE + 8, BASE + 264));

        alloc.release(a);
        alloc.release(b);

        // Parent of A/B is node 1 (bucket 1). Its bit is clear and the
        // merged block is the only entry in bucket 1.
        assert!(!alloc.is_split(1));
        assert_eq!(list(&alloc, 1), [BASE]);
        assert!(list(&alloc, 2).is_empty());

        assert_eq!(alloc.allocate(500), Ok(BASE + 8));
    }

    #[test]
    fn test_largest_request_fits_exactly_one_root_block() {
        let mut alloc = small();
        assert_eq!(alloc.allocate(1024 - 7), Err(AllocError::RequestTooLarge));
        assert_eq!(alloc.allocate(1024 - 8), Ok(BASE + 8));
        assert_eq!(alloc.bucket_limit(), 0);
        assert_eq!(alloc.allocate(1), Err(AllocError::OutOfMemory));

        alloc.release(BASE + 8);
        assert_eq!(list(&alloc, 0), [BASE]);
    }

    #[test]
    fn test_huge_request_does_not_overflow() {
        let mut alloc = small();
        assert_eq!(alloc.allocate(usize::MAX), Err(AllocError::RequestTooLarge));
        assert!(!alloc.is_initialized());
    }

    #[test]
    fn test_one_byte_gets_min_aligned_block() {
        let mut alloc = small();
        let first = alloc.allocate(1).unwrap();
        let second = alloc.allocate(1).unwrap();
        for addr in [first, second] {
            assert_eq!((addr - HEADER_SIZE - BASE) % 128, 0);
        }
        assert_eq!(second - first, 128);
    }

    #[test]
    fn test_release_null_is_noop() {
        let mut alloc = small();
        alloc.release(0);
        assert!(!alloc.is_initialized());

        let a = alloc.allocate(10).unwrap();
        let before = alloc.stats();
        let bits = alloc.split_bits().to_vec();
        alloc.release(0);
        assert_eq!(alloc.stats(), before);
        assert_eq!(alloc.split_bits(), bits);
        alloc.release(a);
    }

    #[test]
    fn test_release_ignores_foreign_addresses() {
        let mut alloc = small();
        let a = alloc.allocate(10).unwrap();
        let before = alloc.stats();

        alloc.release(BASE);
        alloc.release(BASE - 64);
        alloc.release(BASE + 4096);
        assert_eq!(alloc.stats(), before);

        alloc.release(a);
        assert_eq!(alloc.stats().free_bytes, 128);
    }

    #[test]
    fn test_free_then_allocate_same_size_reuses_block() {
        let mut alloc = small();
        let _a = alloc.allocate(50).unwrap();
        let b = alloc.allocate(50).unwrap();
        let _c = alloc.allocate(50).unwrap();

        alloc.release(b);
        assert_eq!(alloc.allocate(50), Ok(b));
    }

    #[test]
    fn test_large_first_request_grows_tree() {
        let mut alloc = small();
        assert_eq!(alloc.allocate(500), Ok(BASE + 8));
        assert_eq!(alloc.bucket_limit(), 1);
        assert_eq!(alloc.allocate(500), Ok(BASE + 512 + 8));
        assert_eq!(alloc.bucket_limit(), 0);
    }

    #[test]
    fn test_growth_marks_new_root_used() {
        let mut alloc = small();
        alloc.allocate(200).unwrap();
        assert!(alloc.is_split(1));

        // Growing from bucket 2 to bucket 1 frees node 4 and flips node 1's
        // parent bit (node 0).
        alloc.allocate(200).unwrap();
        assert_eq!(alloc.bucket_limit(), 1);
        assert!(alloc.is_split(0));
        // Both children of node 1 are used.
        assert!(!alloc.is_split(1));
    }

    #[test]
    fn test_payloads_do_not_clobber_each_other() {
        let mut alloc = small();
        let a = alloc.allocate(100).unwrap();
        alloc.window_mut().bytes_mut(a, 100).fill(0xAA);
        let b = alloc.allocate(100).unwrap();
        alloc.window_mut().bytes_mut(b, 100).fill(0xBB);
        let c = alloc.allocate(300).unwrap();
        alloc.window_mut().bytes_mut(c, 300).fill(0xCC);

        assert!(alloc.window().bytes(a, 100).iter().all(|&x| x == 0xAA));
        assert!(alloc.window().bytes(b, 100).iter().all(|&x| x == 0xBB));
        alloc.release(b);
        assert!(alloc.window().bytes(a, 100).iter().all(|&x| x == 0xAA));
        assert!(alloc.window().bytes(c, 300).iter().all(|&x| x == 0xCC));
    }

    #[test]
    fn test_reservation_denied_leaves_state_consistent() {
        let config = BuddyConfig::new(7, 10).unwrap();
        let window = BufferWindow::new(BASE, 1024).with_reserve_limit(300);
        let mut alloc = BuddyAllocator::new(config, window, vec![0; config.split_bytes()]);

        let a = alloc.allocate(200).unwrap();
        // The sibling at +256 can be linked (needs +272) but not handed out
        // whole (needs +512).
        assert_eq!(alloc.allocate(200), Err(AllocError::ReservationDenied));
        assert_eq!(list(&alloc, 2), [BASE + 256]);
        assert!(alloc.max_ptr() <= BASE + 300);

        alloc.release(a);
        assert_eq!(list(&alloc, 1), [BASE]);
        assert!(list(&alloc, 2).is_empty());
        // A split allocation only needs the left half plus one link pair.
        assert_eq!(alloc.allocate(200), Ok(BASE + 8));
    }

    #[test]
    fn test_split_storage_too_small() {
        let config = BuddyConfig::new(7, 12).unwrap();
        let window = BufferWindow::new(BASE, config.max_alloc());
        let mut alloc = BuddyAllocator::new(config, window, vec![0u8; 1]);
        assert_eq!(alloc.allocate(1), Err(AllocError::SplitStorageTooSmall));
    }

    #[test]
    fn test_window_smaller_than_max_alloc() {
        let config = BuddyConfig::new(7, 12).unwrap();
        let window = BufferWindow::new(BASE, 1024);
        let mut alloc = BuddyAllocator::new(config, window, vec![0; config.split_bytes()]);
        assert_eq!(alloc.allocate(1), Err(AllocError::InvalidConfig));
    }

    #[test]
    fn test_node_address_mapping() {
        let alloc = small();
        assert_eq!(alloc.ptr_for_node(0, 0), BASE);
        assert_eq!(alloc.ptr_for_node(2, 1), BASE + 512);
        assert_eq!(alloc.ptr_for_node(14, 3), BASE + 7 * 128);
        for bucket in 0..4 {
            for offset in 0..(1 << bucket) {
                let ptr = BASE + offset * (1024 >> bucket);
                assert_eq!(alloc.ptr_for_node(alloc.node_for_ptr(ptr, bucket), bucket), ptr);
            }
        }
    }

    #[test]
    fn test_leftmost_node_of_every_level_maps_to_base() {
        let alloc = create_allocator(7, 12);
        for bucket in 0..alloc.config().bucket_count() {
            let leftmost = (1 << bucket) - 1;
            assert_eq!(alloc.ptr_for_node(leftmost, bucket), BASE);
            assert_eq!(alloc.node_for_ptr(BASE, bucket), leftmost);
        }
    }

    #[test]
    fn test_coalesce_up_to_leftmost_block_then_reuse() {
        let mut alloc = small();
        let a = alloc.allocate(200).unwrap();
        let b = alloc.allocate(200).unwrap();
        alloc.release(a);
        alloc.release(b);
        assert_eq!(alloc.allocate(500), Ok(BASE + 8));
    }

    fn snapshot(alloc: &TestAllocator) -> (usize, Vec<u8>, Vec<Vec<usize>>) {
        let lists = (0..alloc.config().bucket_count())
            .map(|bucket| list(alloc, bucket))
            .collect();
        (alloc.bucket_limit(), alloc.split_bits().to_vec(), lists)
    }

    #[test]
    fn test_release_undoes_allocate_on_grown_tree() {
        let mut alloc = create_allocator(7, 12);
        let whole = alloc.allocate(4096 - 8).unwrap();
        alloc.release(whole);
        assert_eq!(alloc.bucket_limit(), 0);
        assert_eq!(list(&alloc, 0), [BASE]);

        // One request per block size, from a leaf up to the whole window.
        let requests = [1, 120, 121, 248, 500, 1000, 2000, 4088];
        let mut held = Vec::new();
        for hold in [100, 300, 50, 700, 10, 1000] {
            for request in requests {
                let before = snapshot(&alloc);
                match alloc.allocate(request) {
                    Ok(addr) => {
                        alloc.release(addr);
                        assert_eq!(snapshot(&alloc), before, "request {request}, {} held", held.len());
                    }
                    Err(err) => {
                        assert!(!held.is_empty(), "request {request} failed on an empty tree");
                        assert_eq!(err, AllocError::OutOfMemory);
                        assert_eq!(snapshot(&alloc), before);
                    }
                }
            }
            held.push(alloc.allocate(hold).unwrap());
        }
        assert_eq!(alloc.bucket_limit(), 0);
    }

    #[test]
    fn test_stats_track_free_space() {
        let mut alloc = small();
        let a = alloc.allocate(100).unwrap();
        let b = alloc.allocate(400).unwrap();
        let stats = alloc.stats();
        assert_eq!(stats.bucket_limit, 0);
        assert_eq!(stats.free_bytes, 1024 - 128 - 512);

        alloc.release(a);
        alloc.release(b);
        let stats = alloc.stats();
        assert_eq!(stats.free_bytes, 1024);
        assert_eq!(stats.free_blocks, 1);
    }

    #[test]
    fn test_default_geometry_serves_small_requests_lazily() {
        let config = BuddyConfig::new(7, 20).unwrap();
        let window = BufferWindow::new(BASE, config.max_alloc());
        let mut alloc = BuddyAllocator::new(config, window, vec![0; config.split_bytes()]);
        let a = alloc.allocate(64).unwrap();
        assert_eq!(a, BASE + 8);
        assert_eq!(alloc.bucket_limit(), config.bucket_count() - 1);
        assert_eq!(alloc.window().reserved(), 128);
    }
}
