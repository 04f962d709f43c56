#![cfg_attr(not(feature = "std"), no_std)]

//! Mosaic kernel core.
//!
//! The memory substrate of a small single-CPU x86-64 kernel: a buddy-backed
//! kernel heap, per-process message queues with blocking receive, and the
//! syscall selectors that expose them. Boot, drivers, and context switching
//! live outside this crate and reach it through [`init`], [`handle_syscall`],
//! and the [`PROCESSES`] table.

extern crate alloc;

pub mod config;
pub mod ipc;
pub mod logger;
pub mod memory;
pub mod syscall;
pub mod task;

use ipc::MessageQueues;
use memory::{KERNEL_HEAP, KernelHeap};
use syscall::{Kernel, SyscallFrame};
use task::ProcessTable;

/// Every live process's message queue.
pub static QUEUES: MessageQueues = MessageQueues::new();

/// The process table the queues block and wake through.
pub static PROCESSES: ProcessTable = ProcessTable::new();

/// The kernel as seen from the syscall trap.
pub static KERNEL: Kernel<'static, ProcessTable, KernelHeap> =
    Kernel::new(&KERNEL_HEAP, &QUEUES, &PROCESSES);

/// Bring up the console and logging. Call once, before the first syscall.
pub fn init() -> Result<(), log::SetLoggerError> {
    #[cfg(all(target_arch = "x86_64", not(feature = "std")))]
    mos_hal::arch::init();
    logger::init(config::DEFAULT_LOG_LEVEL)?;
    log::info!(
        "[MOSAIC] heap {:#x}+{:#x}, {} byte blocks",
        config::HEAP_BASE,
        config::HEAP_SIZE,
        config::HEAP_CONFIG.min_alloc()
    );
    Ok(())
}

/// Entry point for the architecture's syscall trap.
///
/// # Safety
/// Pointer arguments in `frame` must be valid for the current process, which
/// must be the one `PROCESSES` reports as current.
pub unsafe fn handle_syscall(frame: &mut SyscallFrame) {
    // SAFETY: forwarded from our caller.
    unsafe { KERNEL.dispatch(frame) }
}
