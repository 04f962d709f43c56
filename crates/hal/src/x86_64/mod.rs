// x86_64 bare-metal support: interrupt flag control and the COM1 console.

pub mod interrupts;
pub mod serial;

/// Bring up the pieces the memory substrate needs before logging works.
pub fn init() {
    // SAFETY: COM1 is the standard PC serial port; init runs once at boot
    // before anything else writes to it.
    unsafe { serial::COM1.lock().init() };
}
