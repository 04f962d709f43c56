//! Heap syscalls.

use super::Kernel;
use crate::memory::UserHeap;
use crate::task::Scheduler;

impl<S: Scheduler, H: UserHeap + ?Sized> Kernel<'_, S, H> {
    /// Selector 4: payload address, or 0 when the heap cannot satisfy `size`.
    pub(super) fn sys_alloc(&self, size: usize) -> i64 {
        self.heap.allocate(size) as i64
    }

    /// Selector 10: always 1; foreign addresses are dropped by the heap.
    pub(super) fn sys_free(&self, addr: usize) -> i64 {
        self.heap.release(addr);
        1
    }
}
