//! Scheduling interface consumed by the message queues.
//!
//! Context switching itself is outside the kernel core; queues only need to
//! find a process, park it, wake it, and give up the CPU. [`ProcessTable`]
//! is the in-tree implementation of that contract.

pub mod process_table;

pub use process_table::{IDLE_PID, ProcessState, ProcessTable, SwitchHook};

/// Process identifier.
pub type Pid = usize;

/// What blocking receive needs from the scheduler.
pub trait Scheduler {
    /// Handle to a schedulable process.
    type Process;

    fn current_pid(&self) -> Pid;

    fn lookup(&self, pid: Pid) -> Option<Self::Process>;

    /// Mark `process` non-runnable.
    fn block(&self, process: &Self::Process);

    /// Mark `process` runnable again.
    fn unblock(&self, process: &Self::Process);

    /// Reschedule. Returns once the caller runs again.
    fn yield_now(&self);
}
