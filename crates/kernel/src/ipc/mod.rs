//! Message passing between processes.
//!
//! Every process owns one [`MessageQueue`]. Any process may [`send`] to it;
//! only the owner [`receive`]s, parking in the scheduler until the sender it
//! asked for has queued enough bytes.

pub mod queue;
pub mod registry;

#[cfg(all(test, feature = "std"))]
mod tests_prop;

pub use queue::{Message, MessageQueue, WaitState};
pub use registry::MessageQueues;

use crate::task::{Pid, Scheduler};
use alloc::sync::Arc;
use mos_error::define_kernel_error;
use mos_hal::IrqSafeLock;

define_kernel_error! {
    /// Message queue failures.
    pub enum IpcError(0x02) {
        /// Payload copy could not be allocated; the message was dropped
        OutOfMemory = 0x01 => "Out of memory for message",
        NoSuchQueue = 0x02 => "No message queue for pid",
        NoSuchProcess = 0x03 => "No such process",
        /// Null or wrapping user pointer
        BadUserBuffer = 0x04 => "Invalid user buffer",
    }
}

/// Shared handle to one process's queue.
pub type QueueRef = Arc<IrqSafeLock<MessageQueue>>;

/// Queue `payload` from `sender` on `queue`, waking the owner if this send
/// completes the receive it is blocked in.
pub fn send<S: Scheduler>(
    queue: &QueueRef,
    scheduler: &S,
    sender: Pid,
    payload: &[u8],
) -> Result<(), IpcError> {
    let (wake, owner) = {
        let mut queue = queue.lock();
        (queue.enqueue(sender, payload)?, queue.owner())
    };
    if wake {
        // The message is queued either way; a vanished owner just never reads it.
        match scheduler.lookup(owner) {
            Some(process) => scheduler.unblock(&process),
            None => log::warn!("[IPC] owner {owner} of woken queue is gone"),
        }
    }
    Ok(())
}

/// Fill `dest` with the next `dest.len()` bytes `sender` queued for the owner
/// of `queue`, blocking until that many are available.
///
/// Must be called by the queue's owner.
pub fn receive<S: Scheduler>(
    queue: &QueueRef,
    scheduler: &S,
    sender: Pid,
    dest: &mut [u8],
) -> Result<(), IpcError> {
    loop {
        {
            let mut queue = queue.lock();
            if queue.has_available(sender, dest.len()) {
                queue.clear_wait();
                queue.drain_into(sender, dest);
                return Ok(());
            }

            queue.wait_for(sender, dest.len());
            let Some(owner) = scheduler.lookup(queue.owner()) else {
                queue.clear_wait();
                return Err(IpcError::NoSuchProcess);
            };
            // Blocked before the queue unlocks, so a send in between still
            // sees the wait and wakes us.
            scheduler.block(&owner);
        }
        scheduler.yield_now();
    }
}
