// Buddy allocator over a fixed linear address window.
// Split into configuration, the window abstraction, the in-block free lists,
// the tree logic itself, and the locked/global-allocator wrapper.

mod buddy;
mod config;
mod free_list;
mod locked;
mod window;

#[cfg(all(test, feature = "std"))]
mod tests_prop;

pub use buddy::{BuddyAllocator, BuddyStats};
pub use config::{BuddyConfig, HEADER_SIZE, LINK_SIZE, MAX_BUCKETS};
pub use free_list::FreeBlocks;
pub use locked::LockedBuddy;
pub use window::{BufferWindow, RawWindow, Window};

use mos_error::define_kernel_error;

define_kernel_error! {
    /// Failures reported by the buddy allocator.
    pub enum AllocError(0x01) {
        /// Configuration constants are out of range
        InvalidConfig = 0x01 => "Invalid allocator configuration",
        /// Split-bit storage is smaller than the tree needs
        SplitStorageTooSmall = 0x02 => "Split-bit storage too small",
        /// request + header exceeds MAX_ALLOC
        RequestTooLarge = 0x03 => "Request exceeds allocator window",
        /// The window refused to back more memory
        ReservationDenied = 0x04 => "Memory reservation denied",
        /// No free block can be produced
        OutOfMemory = 0x05 => "Out of memory",
    }
}
