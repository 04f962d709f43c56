//! Single-CPU process table with a FIFO ready queue.
//!
//! Tracks which pids exist, their run state, and who is current. Switching
//! stacks is delegated to an optional hook so the same table drives both the
//! real kernel and host tests.

use super::{Pid, Scheduler};
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;
use mos_hal::IrqSafeLock;

/// Pid reported when nothing is running.
pub const IDLE_PID: Pid = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
}

/// Called with `(prev, next)` when `yield_now` picks a different process.
pub type SwitchHook = fn(Pid, Pid);

struct TableInner {
    // BTreeMap for deterministic iteration order.
    states: BTreeMap<Pid, ProcessState>,
    ready: VecDeque<Pid>,
    current: Option<Pid>,
    switch_hook: Option<SwitchHook>,
}

pub struct ProcessTable {
    inner: IrqSafeLock<TableInner>,
}

impl ProcessTable {
    pub const fn new() -> Self {
        Self {
            inner: IrqSafeLock::new(TableInner {
                states: BTreeMap::new(),
                ready: VecDeque::new(),
                current: None,
                switch_hook: None,
            }),
        }
    }

    /// Install the context switch used by `yield_now`.
    pub fn set_switch_hook(&self, hook: SwitchHook) {
        self.inner.lock().switch_hook = Some(hook);
    }

    /// Register `pid` as ready. Returns false if it already exists.
    pub fn spawn(&self, pid: Pid) -> bool {
        let mut inner = self.inner.lock();
        if inner.states.contains_key(&pid) {
            return false;
        }
        inner.states.insert(pid, ProcessState::Ready);
        inner.ready.push_back(pid);
        true
    }

    /// Forget `pid`. Returns false if it was unknown.
    pub fn exit(&self, pid: Pid) -> bool {
        let mut inner = self.inner.lock();
        if inner.states.remove(&pid).is_none() {
            return false;
        }
        inner.ready.retain(|&ready| ready != pid);
        if inner.current == Some(pid) {
            inner.current = None;
        }
        true
    }

    /// Make `pid` the running process without going through the ready queue
    /// (boot, or a switch performed outside the table).
    pub fn set_current(&self, pid: Pid) -> bool {
        let mut inner = self.inner.lock();
        if !inner.states.contains_key(&pid) {
            return false;
        }
        if let Some(prev) = inner.current {
            if prev != pid && inner.states.get(&prev) == Some(&ProcessState::Running) {
                inner.states.insert(prev, ProcessState::Ready);
                inner.ready.push_back(prev);
            }
        }
        inner.ready.retain(|&ready| ready != pid);
        inner.states.insert(pid, ProcessState::Running);
        inner.current = Some(pid);
        true
    }

    pub fn state(&self, pid: Pid) -> Option<ProcessState> {
        self.inner.lock().states.get(&pid).copied()
    }

    /// Ready queue, front first.
    pub fn ready_pids(&self) -> Vec<Pid> {
        self.inner.lock().ready.iter().copied().collect()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ProcessTable {
    type Process = Pid;

    fn current_pid(&self) -> Pid {
        self.inner.lock().current.unwrap_or(IDLE_PID)
    }

    fn lookup(&self, pid: Pid) -> Option<Pid> {
        self.inner.lock().states.contains_key(&pid).then_some(pid)
    }

    fn block(&self, pid: &Pid) {
        let mut inner = self.inner.lock();
        if let Some(state) = inner.states.get_mut(pid) {
            *state = ProcessState::Blocked;
            inner.ready.retain(|ready| ready != pid);
        }
    }

    fn unblock(&self, pid: &Pid) {
        let mut inner = self.inner.lock();
        if inner.states.get(pid) == Some(&ProcessState::Blocked) {
            inner.states.insert(*pid, ProcessState::Ready);
            inner.ready.push_back(*pid);
        }
    }

    fn yield_now(&self) {
        let (prev, next, hook) = {
            let mut inner = self.inner.lock();
            let prev = inner.current;
            if let Some(pid) = prev {
                if inner.states.get(&pid) == Some(&ProcessState::Running) {
                    inner.states.insert(pid, ProcessState::Ready);
                    inner.ready.push_back(pid);
                }
            }
            let next = inner.ready.pop_front();
            if let Some(pid) = next {
                inner.states.insert(pid, ProcessState::Running);
            }
            inner.current = next;
            (prev, next, inner.switch_hook)
        };

        // Switch with the table unlocked; the next process may take it.
        if let (Some(prev), Some(next), Some(hook)) = (prev, next, hook) {
            if prev != next {
                hook(prev, next);
            }
        }
    }
}
