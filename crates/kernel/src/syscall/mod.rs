//! Syscall surface.
//!
//! Userland puts a selector in `rdi` and up to five arguments in `rsi`,
//! `rdx`, `rcx`, `r8`, `r9`; the result comes back in `rax`. Only the heap
//! and message queue selectors live here.

pub mod helpers;
mod ipc;
mod mm;

use crate::ipc::MessageQueues;
use crate::memory::UserHeap;
use crate::task::{Pid, ProcessTable, Scheduler};

/// Error codes returned in `rax` as negative values.
pub mod errno {
    pub const ENOSYS: i64 = -38;
}

/// Registers saved by the syscall trap.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyscallFrame {
    pub rax: u64, // return value
    pub rdi: u64, // selector
    pub rsi: u64, // arg0
    pub rdx: u64, // arg1
    pub rcx: u64, // arg2
    pub r8: u64,  // arg3
    pub r9: u64,  // arg4
}

impl SyscallFrame {
    pub fn selector(&self) -> u64 {
        self.rdi
    }
    pub fn arg0(&self) -> u64 {
        self.rsi
    }
    pub fn arg1(&self) -> u64 {
        self.rdx
    }
    pub fn arg2(&self) -> u64 {
        self.rcx
    }
    pub fn arg3(&self) -> u64 {
        self.r8
    }
    pub fn arg4(&self) -> u64 {
        self.r9
    }
    pub fn set_return(&mut self, value: i64) {
        #[cfg(feature = "verbose-syscalls")]
        log::trace!("[SYSCALL] set_return: rax <- 0x{:x}", value);
        self.rax = value as u64;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum SyscallNumber {
    Alloc = 4,
    Free = 10,
    Send = 11,
    Receive = 12,
}

impl SyscallNumber {
    pub fn from_u64(selector: u64) -> Option<Self> {
        match selector {
            4 => Some(Self::Alloc),
            10 => Some(Self::Free),
            11 => Some(Self::Send),
            12 => Some(Self::Receive),
            _ => None,
        }
    }
}

/// Everything a syscall can reach.
pub struct Kernel<'a, S, H: ?Sized> {
    heap: &'a H,
    queues: &'a MessageQueues,
    scheduler: &'a S,
}

impl<'a, S, H: ?Sized> Kernel<'a, S, H> {
    pub const fn new(heap: &'a H, queues: &'a MessageQueues, scheduler: &'a S) -> Self {
        Self {
            heap,
            queues,
            scheduler,
        }
    }

    pub fn queues(&self) -> &'a MessageQueues {
        self.queues
    }

    pub fn scheduler(&self) -> &'a S {
        self.scheduler
    }
}

impl<S: Scheduler, H: UserHeap + ?Sized> Kernel<'_, S, H> {
    /// Route `frame` to its handler and store the result in `rax`.
    ///
    /// # Safety
    /// Pointer arguments in `frame` must describe memory the calling process
    /// may access for the lengths it passed.
    pub unsafe fn dispatch(&self, frame: &mut SyscallFrame) {
        let selector = frame.selector();
        #[cfg(feature = "verbose-syscalls")]
        log::trace!(
            "[SYSCALL] pid {} selector {} ({:#x}, {:#x}, {:#x})",
            self.scheduler.current_pid(),
            selector,
            frame.arg0(),
            frame.arg1(),
            frame.arg2()
        );

        let result = match SyscallNumber::from_u64(selector) {
            Some(SyscallNumber::Alloc) => self.sys_alloc(frame.arg0() as usize),
            Some(SyscallNumber::Free) => self.sys_free(frame.arg0() as usize),
            // SAFETY: pointer validity forwarded from our caller.
            Some(SyscallNumber::Send) => unsafe {
                self.sys_send(
                    frame.arg0() as Pid,
                    frame.arg1() as usize,
                    frame.arg2() as usize,
                )
            },
            // SAFETY: pointer validity forwarded from our caller.
            Some(SyscallNumber::Receive) => unsafe {
                self.sys_receive(
                    frame.arg0() as Pid,
                    frame.arg1() as usize,
                    frame.arg2() as usize,
                )
            },
            None => {
                log::warn!("[SYSCALL] unknown selector {selector}");
                errno::ENOSYS
            }
        };
        frame.set_return(result);
    }
}

impl<H: ?Sized> Kernel<'_, ProcessTable, H> {
    /// Register `pid` and give it an empty queue.
    pub fn spawn_process(&self, pid: Pid) -> bool {
        if !self.scheduler.spawn(pid) {
            return false;
        }
        self.queues.create(pid);
        true
    }

    /// Remove `pid` and drop its queue with any unread messages.
    pub fn exit_process(&self, pid: Pid) -> bool {
        if !self.scheduler.exit(pid) {
            return false;
        }
        self.queues.destroy(pid);
        true
    }
}
