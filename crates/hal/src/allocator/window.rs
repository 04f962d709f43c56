//! The address range the buddy allocator carves up.
//!
//! The allocator works in window addresses (`usize`) and only touches memory
//! through this trait: the 8-byte size header of allocated blocks and the two
//! link words at the start of free blocks.

use alloc::boxed::Box;
use alloc::vec;

/// A contiguous address range backed by memory.
///
/// # Safety
/// For every address `a` in `[base(), base() + capacity())`,
/// `as_ptr(a)`/`as_mut_ptr(a)` must return a pointer valid for reads and
/// writes for as long as the window lives, and consecutive addresses must
/// map to consecutive bytes.
pub unsafe trait Window {
    fn base(&self) -> usize;

    /// Total bytes the window can ever back.
    fn capacity(&self) -> usize;

    /// Make every address below `end` usable. Windows that commit memory
    /// lazily grow here; returning `false` denies the request.
    fn reserve(&mut self, end: usize) -> bool {
        end <= self.base() + self.capacity()
    }

    fn as_ptr(&self, addr: usize) -> *const u8;

    fn as_mut_ptr(&mut self, addr: usize) -> *mut u8;

    /// Inverse of `as_ptr`.
    fn address_of(&self, ptr: *const u8) -> usize;

    fn contains(&self, addr: usize, len: usize) -> bool {
        addr >= self.base()
            && addr
                .checked_add(len)
                .is_some_and(|end| end <= self.base() + self.capacity())
    }

    fn read_word(&self, addr: usize) -> usize {
        assert!(self.contains(addr, core::mem::size_of::<usize>()));
        // SAFETY: in range per the check above and the trait contract.
        unsafe { self.as_ptr(addr).cast::<usize>().read_unaligned() }
    }

    fn write_word(&mut self, addr: usize, value: usize) {
        assert!(self.contains(addr, core::mem::size_of::<usize>()));
        // SAFETY: in range per the check above and the trait contract.
        unsafe { self.as_mut_ptr(addr).cast::<usize>().write_unaligned(value) }
    }
}

/// A window over raw memory at a fixed address, e.g. the kernel heap region.
#[derive(Debug)]
pub struct RawWindow {
    base: usize,
    len: usize,
}

impl RawWindow {
    /// # Safety
    /// `[base, base + len)` must be mapped, writable, and used by nothing
    /// else for the lifetime of the window.
    pub const unsafe fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }
}

// SAFETY: the constructor's contract covers the whole range.
unsafe impl Window for RawWindow {
    fn base(&self) -> usize {
        self.base
    }

    fn capacity(&self) -> usize {
        self.len
    }

    fn as_ptr(&self, addr: usize) -> *const u8 {
        addr as *const u8
    }

    fn as_mut_ptr(&mut self, addr: usize) -> *mut u8 {
        addr as *mut u8
    }

    fn address_of(&self, ptr: *const u8) -> usize {
        ptr as usize
    }
}

/// A window backed by an owned heap buffer.
///
/// Window addresses are logical (`base` can be any value, such as the
/// kernel's real heap address); the buffer itself never moves, so pointers
/// handed out through `as_mut_ptr` stay valid. An optional reservation limit
/// models a backing store that refuses to grow past a point.
pub struct BufferWindow {
    base: usize,
    // u64 elements keep block starts 8-byte aligned in real memory.
    storage: Box<[u64]>,
    reserve_limit: usize,
    reserved: usize,
}

impl BufferWindow {
    pub fn new(base: usize, capacity: usize) -> Self {
        Self {
            base,
            storage: vec![0u64; capacity.div_ceil(8)].into_boxed_slice(),
            reserve_limit: capacity,
            reserved: 0,
        }
    }

    /// Refuse reservations that would commit more than `limit` bytes.
    #[must_use]
    pub fn with_reserve_limit(mut self, limit: usize) -> Self {
        self.reserve_limit = limit.min(self.capacity());
        self
    }

    /// Bytes committed so far.
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Borrow `len` bytes starting at window address `addr`.
    pub fn bytes(&self, addr: usize, len: usize) -> &[u8] {
        assert!(self.contains(addr, len));
        let offset = addr - self.base;
        let all = self.storage_bytes();
        &all[offset..offset + len]
    }

    pub fn bytes_mut(&mut self, addr: usize, len: usize) -> &mut [u8] {
        assert!(self.contains(addr, len));
        let offset = addr - self.base;
        let all = self.storage_bytes_mut();
        &mut all[offset..offset + len]
    }

    fn storage_bytes(&self) -> &[u8] {
        // SAFETY: u64 has no padding and u8 has alignment 1.
        unsafe {
            core::slice::from_raw_parts(self.storage.as_ptr().cast::<u8>(), self.storage.len() * 8)
        }
    }

    fn storage_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: u64 has no padding and u8 has alignment 1.
        unsafe {
            core::slice::from_raw_parts_mut(
                self.storage.as_mut_ptr().cast::<u8>(),
                self.storage.len() * 8,
            )
        }
    }
}

// SAFETY: the boxed buffer covers `capacity()` bytes and is never reallocated.
unsafe impl Window for BufferWindow {
    fn base(&self) -> usize {
        self.base
    }

    fn capacity(&self) -> usize {
        self.storage.len() * 8
    }

    fn reserve(&mut self, end: usize) -> bool {
        let Some(wanted) = end.checked_sub(self.base) else {
            return true;
        };
        if wanted > self.reserve_limit {
            return false;
        }
        self.reserved = self.reserved.max(wanted);
        true
    }

    fn as_ptr(&self, addr: usize) -> *const u8 {
        self.storage
            .as_ptr()
            .cast::<u8>()
            .wrapping_add(addr.wrapping_sub(self.base))
    }

    fn as_mut_ptr(&mut self, addr: usize) -> *mut u8 {
        self.storage
            .as_mut_ptr()
            .cast::<u8>()
            .wrapping_add(addr.wrapping_sub(self.base))
    }

    fn address_of(&self, ptr: *const u8) -> usize {
        (ptr as usize)
            .wrapping_sub(self.storage.as_ptr() as usize)
            .wrapping_add(self.base)
    }
}
