#![cfg_attr(not(feature = "std"), no_std)]

// HAL crate: interrupt masking, the early serial console, and the kernel's
// memory primitives. Arch-specific code lives in x86_64/ and is only built
// for bare metal; `std` builds swap in host mocks so the crate tests on a
// development machine.

extern crate alloc;

pub mod allocator;
pub mod console;
pub mod interrupts;

#[cfg(all(target_arch = "x86_64", not(feature = "std")))]
pub mod x86_64;
#[cfg(all(target_arch = "x86_64", not(feature = "std")))]
pub use self::x86_64 as arch;

use core::mem::ManuallyDrop;
use mos_utils::{Mutex, MutexGuard};

/// IRQ-safe lock that disables interrupts while held.
///
/// The kernel runs on one CPU; masking interrupts is what keeps an interrupt
/// handler from re-entering the allocator or a message queue while the
/// spinlock is taken.
pub struct IrqSafeLock<T> {
    inner: Mutex<T>,
}

impl<T> IrqSafeLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            inner: Mutex::new(data),
        }
    }

    /// Disable interrupts, then acquire.
    pub fn lock(&self) -> IrqSafeLockGuard<'_, T> {
        let state = interrupts::disable();
        let guard = self.inner.lock();
        IrqSafeLockGuard {
            guard: ManuallyDrop::new(guard),
            state,
        }
    }
}

pub struct IrqSafeLockGuard<'a, T> {
    guard: ManuallyDrop<MutexGuard<'a, T>>,
    state: u64,
}

impl<T> core::ops::Deref for IrqSafeLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> core::ops::DerefMut for IrqSafeLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for IrqSafeLockGuard<'_, T> {
    /// Release the spinlock first, then restore the saved interrupt state.
    fn drop(&mut self) {
        // SAFETY: guard is only dropped once, here in Drop, before restoring interrupts
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        interrupts::restore(self.state);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
