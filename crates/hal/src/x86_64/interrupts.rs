// x86_64 interrupt control via RFLAGS.IF.

use ::x86_64::instructions::interrupts;
use ::x86_64::registers::rflags::{self, RFlags};

/// Disable interrupts, returning the raw RFLAGS value from before `cli`.
#[inline(always)]
pub fn disable() -> u64 {
    let flags = rflags::read_raw();
    interrupts::disable();
    flags
}

#[inline(always)]
pub unsafe fn enable() {
    interrupts::enable();
}

/// Re-enable interrupts only if they were enabled in `state`.
#[inline(always)]
pub fn restore(state: u64) {
    if state & RFlags::INTERRUPT_FLAG.bits() != 0 {
        interrupts::enable();
    }
}

#[inline(always)]
pub fn is_enabled() -> bool {
    interrupts::are_enabled()
}
