//! Pid to queue lookup.

use super::{MessageQueue, QueueRef};
use crate::task::Pid;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use mos_hal::IrqSafeLock;

/// Every live process's queue, keyed by owner.
pub struct MessageQueues {
    queues: IrqSafeLock<BTreeMap<Pid, QueueRef>>,
}

impl MessageQueues {
    pub const fn new() -> Self {
        Self {
            queues: IrqSafeLock::new(BTreeMap::new()),
        }
    }

    /// Create `owner`'s queue. An existing queue is kept and returned.
    pub fn create(&self, owner: Pid) -> QueueRef {
        let mut queues = self.queues.lock();
        if let Some(existing) = queues.get(&owner) {
            log::warn!("[IPC] queue for pid {owner} already exists");
            return existing.clone();
        }
        let queue = Arc::new(IrqSafeLock::new(MessageQueue::new(owner)));
        queues.insert(owner, queue.clone());
        queue
    }

    /// Drop `owner`'s queue and any messages still in it.
    pub fn destroy(&self, owner: Pid) -> Option<QueueRef> {
        self.queues.lock().remove(&owner)
    }

    pub fn get(&self, pid: Pid) -> Option<QueueRef> {
        self.queues.lock().get(&pid).cloned()
    }

    pub fn len(&self) -> usize {
        self.queues.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.lock().is_empty()
    }
}

impl Default for MessageQueues {
    fn default() -> Self {
        Self::new()
    }
}
