use super::buddy::{BuddyAllocator, BuddyStats};
use super::config::HEADER_SIZE;
use super::window::Window;
use super::AllocError;
use crate::{IrqSafeLock, IrqSafeLockGuard};
use core::alloc::{GlobalAlloc, Layout};
use core::ptr;

/// A buddy allocator behind an `IrqSafeLock`, usable as `#[global_allocator]`.
pub struct LockedBuddy<W, S>(IrqSafeLock<BuddyAllocator<W, S>>);

impl<W, S> LockedBuddy<W, S> {
    pub const fn new(allocator: BuddyAllocator<W, S>) -> Self {
        Self(IrqSafeLock::new(allocator))
    }

    pub fn lock(&self) -> IrqSafeLockGuard<'_, BuddyAllocator<W, S>> {
        self.0.lock()
    }
}

impl<W: Window, S: AsRef<[u8]> + AsMut<[u8]>> LockedBuddy<W, S> {
    pub fn allocate(&self, request: usize) -> Result<usize, AllocError> {
        self.0.lock().allocate(request)
    }

    pub fn release(&self, addr: usize) {
        self.0.lock().release(addr);
    }

    pub fn stats(&self) -> BuddyStats {
        self.0.lock().stats()
    }
}

// SAFETY: payloads never overlap while live (buddy invariant) and are 8-byte
// aligned relative to an aligned window, which is all this impl promises.
unsafe impl<W: Window, S: AsRef<[u8]> + AsMut<[u8]>> GlobalAlloc for LockedBuddy<W, S> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // Payloads sit 8 bytes into a block; larger alignments can't be met.
        if layout.align() > HEADER_SIZE {
            log::warn!("[BUDDY] refusing layout with align {}", layout.align());
            return ptr::null_mut();
        }
        let mut heap = self.0.lock();
        match heap.allocate(layout.size()) {
            Ok(addr) => heap.window_mut().as_mut_ptr(addr),
            Err(_) => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        let mut heap = self.0.lock();
        let addr = heap.window().address_of(ptr);
        heap.release(addr);
    }
}
