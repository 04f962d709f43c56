#![cfg_attr(not(feature = "std"), no_std)]

pub mod bits;

pub use bits::BitArray;

// Lock API is spin's; the HAL layers interrupt masking on top (IrqSafeLock).
pub use spin::{Mutex, MutexGuard};

// ============================================================================
// Unit Tests
// ============================================================================
