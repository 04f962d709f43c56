// Generic interrupt control wrapper.
// Bare-metal x86_64 delegates to the arch module; host builds (`std`) use a
// per-thread mock flag so lock tests can observe masking without `cli`.

#[cfg(all(target_arch = "x86_64", not(feature = "std")))]
use crate::x86_64::interrupts as arch_interrupts;

#[cfg(feature = "std")]
mod mock {
    use core::cell::Cell;

    /// Mirror of the RFLAGS.IF bit so mock states look like real ones.
    pub const IF_BIT: u64 = 1 << 9;

    std::thread_local! {
        static ENABLED: Cell<bool> = const { Cell::new(true) };
    }

    pub fn disable() -> u64 {
        ENABLED.with(|flag| {
            let previous = flag.replace(false);
            if previous { IF_BIT } else { 0 }
        })
    }

    pub fn enable() {
        ENABLED.with(|flag| flag.set(true));
    }

    pub fn restore(state: u64) {
        if state & IF_BIT != 0 {
            enable();
        }
    }

    pub fn is_enabled() -> bool {
        ENABLED.with(Cell::get)
    }
}

/// Disable interrupts and return the previous state for [`restore`].
#[inline(always)]
pub fn disable() -> u64 {
    #[cfg(feature = "std")]
    {
        mock::disable()
    }
    #[cfg(all(target_arch = "x86_64", not(feature = "std")))]
    {
        arch_interrupts::disable()
    }
    #[cfg(not(any(feature = "std", target_arch = "x86_64")))]
    {
        0
    }
}

/// Unconditionally enable interrupts.
///
/// # Safety
/// Enabling interrupts inside a critical section lets handlers observe
/// half-updated state. Only call this where no `IrqSafeLock` is held.
#[inline(always)]
pub unsafe fn enable() {
    #[cfg(feature = "std")]
    {
        mock::enable();
    }
    #[cfg(all(target_arch = "x86_64", not(feature = "std")))]
    {
        unsafe { arch_interrupts::enable() }
    }
}

/// Restore a state previously returned by [`disable`].
#[inline(always)]
pub fn restore(state: u64) {
    #[cfg(feature = "std")]
    {
        mock::restore(state);
    }
    #[cfg(all(target_arch = "x86_64", not(feature = "std")))]
    {
        arch_interrupts::restore(state);
    }
    #[cfg(not(any(feature = "std", target_arch = "x86_64")))]
    {
        let _ = state;
    }
}

#[inline(always)]
pub fn is_enabled() -> bool {
    #[cfg(feature = "std")]
    {
        mock::is_enabled()
    }
    #[cfg(all(target_arch = "x86_64", not(feature = "std")))]
    {
        arch_interrupts::is_enabled()
    }
    #[cfg(not(any(feature = "std", target_arch = "x86_64")))]
    {
        true
    }
}
