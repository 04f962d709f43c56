//! Kernel heap.
//!
//! One buddy allocator over `[HEAP_BASE, HEAP_BASE + HEAP_SIZE)` backs both
//! the kernel's own `alloc` collections (queue nodes, payload buffers) and
//! the user-facing allocate/release syscalls.

use crate::config::{HEAP_BASE, HEAP_CONFIG, HEAP_SIZE, HEAP_SPLIT_BYTES};
use mos_hal::allocator::{BuddyAllocator, LockedBuddy, RawWindow, Window};

pub type KernelHeap = LockedBuddy<RawWindow, [u8; HEAP_SPLIT_BYTES]>;

#[cfg_attr(all(target_os = "none", not(test)), global_allocator)]
pub static KERNEL_HEAP: KernelHeap = LockedBuddy::new(BuddyAllocator::new(
    HEAP_CONFIG,
    // SAFETY: boot maps the heap window for the kernel's exclusive use
    // before the first allocation.
    unsafe { RawWindow::new(HEAP_BASE, HEAP_SIZE) },
    [0; HEAP_SPLIT_BYTES],
));

/// Allocator as seen by the syscall layer: plain addresses, 0 on failure.
pub trait UserHeap {
    fn allocate(&self, size: usize) -> usize;
    fn release(&self, addr: usize);
}

impl<W: Window, S: AsRef<[u8]> + AsMut<[u8]>> UserHeap for LockedBuddy<W, S> {
    fn allocate(&self, size: usize) -> usize {
        match LockedBuddy::allocate(self, size) {
            Ok(addr) => addr,
            Err(err) => {
                log::debug!("[HEAP] allocate({size}) failed: {err}");
                0
            }
        }
    }

    fn release(&self, addr: usize) {
        LockedBuddy::release(self, addr);
    }
}
