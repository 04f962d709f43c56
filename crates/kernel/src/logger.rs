//! Kernel logger.
//!
//! Implements `log::Log` on top of the HAL console: COM1 on bare metal,
//! stdout in host builds. Filtering is by the global max level only.

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use mos_hal::println;

static LOGGER: KernelLogger = KernelLogger;

struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the kernel logger. Fails if a logger is already installed.
pub fn init(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(max_level);
    Ok(())
}
