//! Message queue syscalls.
//!
//! Both calls act for the current process: `send` stamps it as the sender,
//! `receive` reads from its own queue.

use super::Kernel;
use super::helpers::UserSlice;
use crate::ipc;
use crate::memory::UserHeap;
use crate::task::{Pid, Scheduler};

impl<S: Scheduler, H: UserHeap + ?Sized> Kernel<'_, S, H> {
    /// Selector 11: 1 once queued; 0 for an unknown target, a bad buffer, or
    /// no memory for the copy.
    ///
    /// # Safety
    /// `(payload, len)` must describe readable memory.
    pub(super) unsafe fn sys_send(&self, target: Pid, payload: usize, len: usize) -> i64 {
        let payload = match UserSlice::new(payload, len) {
            // SAFETY: caller guarantees the user buffer is readable.
            Ok(slice) => unsafe { slice.as_slice() },
            Err(err) => {
                log::warn!("[SYSCALL] send: {err}");
                return 0;
            }
        };
        let Some(queue) = self.queues.get(target) else {
            log::debug!("[SYSCALL] send: no queue for pid {target}");
            return 0;
        };
        let sender = self.scheduler.current_pid();
        match ipc::send(&queue, self.scheduler, sender, payload) {
            Ok(()) => 1,
            Err(err) => {
                log::warn!("[SYSCALL] send {sender} -> {target}: {err}");
                0
            }
        }
    }

    /// Selector 12: blocks until `len` bytes from `sender` are copied to
    /// `dest`, then returns 1. Returns 0 for a bad buffer or a caller with no
    /// queue.
    ///
    /// # Safety
    /// `(dest, len)` must describe writable memory not otherwise in use.
    pub(super) unsafe fn sys_receive(&self, sender: Pid, dest: usize, len: usize) -> i64 {
        let owner = self.scheduler.current_pid();
        let Some(queue) = self.queues.get(owner) else {
            log::warn!("[SYSCALL] receive: pid {owner} has no queue");
            return 0;
        };
        let dest = match UserSlice::new(dest, len) {
            // SAFETY: caller guarantees the user buffer is writable.
            Ok(slice) => unsafe { slice.as_mut_slice() },
            Err(err) => {
                log::warn!("[SYSCALL] receive: {err}");
                return 0;
            }
        };
        match ipc::receive(&queue, self.scheduler, sender, dest) {
            Ok(()) => 1,
            Err(err) => {
                log::warn!("[SYSCALL] receive {owner} <- {sender}: {err}");
                0
            }
        }
    }
}
