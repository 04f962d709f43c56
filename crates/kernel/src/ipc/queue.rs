//! Per-process inbound message queue.
//!
//! Messages from every sender share one FIFO. A receive names a sender and a
//! byte count and consumes only that sender's messages, oldest first, so each
//! sender's stream stays ordered while other senders' messages keep their
//! place in line.

use super::IpcError;
use crate::task::Pid;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::alloc::Layout;
use intrusive_collections::{LinkedList, LinkedListLink, intrusive_adapter};

/// One queued send. The payload is a private copy of the sender's bytes.
pub struct Message {
    link: LinkedListLink,
    sender: Pid,
    payload: Vec<u8>,
}

intrusive_adapter!(MessageAdapter = Box<Message>: Message { link: LinkedListLink });

impl Message {
    fn new(sender: Pid, payload: Vec<u8>) -> Self {
        Self {
            link: LinkedListLink::new(),
            sender,
            payload,
        }
    }

    pub fn sender(&self) -> Pid {
        self.sender
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// The owner is parked until `required` bytes from `sender` are queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitState {
    pub sender: Pid,
    pub required: usize,
}

pub struct MessageQueue {
    owner: Pid,
    messages: LinkedList<MessageAdapter>,
    waiting: Option<WaitState>,
}

impl MessageQueue {
    pub fn new(owner: Pid) -> Self {
        Self {
            owner,
            messages: LinkedList::new(MessageAdapter::new()),
            waiting: None,
        }
    }

    /// The process that receives from this queue.
    pub fn owner(&self) -> Pid {
        self.owner
    }

    pub fn waiting(&self) -> Option<WaitState> {
        self.waiting
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of queued messages, all senders.
    pub fn pending(&self) -> usize {
        self.messages.iter().count()
    }

    /// Queued messages in arrival order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter()
    }

    /// Append a copy of `payload` from `sender`.
    ///
    /// Returns `true` if this send satisfied the owner's pending receive; the
    /// wait is cleared at that point and the caller must wake the owner.
    /// Out of memory drops the message and leaves the queue as it was.
    pub fn enqueue(&mut self, sender: Pid, payload: &[u8]) -> Result<bool, IpcError> {
        // SAFETY: `Message` is not zero-sized.
        self.enqueue_with(sender, payload, |layout| unsafe { alloc::alloc::alloc(layout) })
    }

    /// `enqueue` with the message node taken from `alloc_node`, which must
    /// return memory from the global allocator or null.
    fn enqueue_with(
        &mut self,
        sender: Pid,
        payload: &[u8],
        alloc_node: impl FnOnce(Layout) -> *mut u8,
    ) -> Result<bool, IpcError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(payload.len())
            .map_err(|_| IpcError::OutOfMemory)?;
        bytes.extend_from_slice(payload);

        // Box::new would abort the kernel on an exhausted heap.
        let node = alloc_node(Layout::new::<Message>()).cast::<Message>();
        if node.is_null() {
            return Err(IpcError::OutOfMemory);
        }
        // SAFETY: `node` is a fresh global-allocator block laid out for a
        // `Message`, so it can be initialized and owned by a `Box`.
        let message = unsafe {
            node.write(Message::new(sender, bytes));
            Box::from_raw(node)
        };
        self.messages.push_back(message);

        match self.waiting {
            Some(wait) if wait.sender == sender && self.has_available(sender, wait.required) => {
                self.waiting = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Bytes queued from `sender`, counting stops once `target` is reached.
    pub fn available_from(&self, sender: Pid, target: usize) -> usize {
        let mut total = 0;
        for message in self.messages.iter().filter(|m| m.sender == sender) {
            if total >= target {
                break;
            }
            total += message.payload.len();
        }
        total
    }

    pub fn has_available(&self, sender: Pid, len: usize) -> bool {
        self.available_from(sender, len) >= len
    }

    pub fn wait_for(&mut self, sender: Pid, required: usize) {
        self.waiting = Some(WaitState { sender, required });
    }

    pub fn clear_wait(&mut self) {
        self.waiting = None;
    }

    /// Copy up to `dest.len()` bytes from `sender`'s messages into `dest`.
    ///
    /// Whole messages are unlinked and freed; a message longer than what is
    /// left of `dest` loses its consumed prefix and stays where it was.
    /// Returns the number of bytes copied.
    pub fn drain_into(&mut self, sender: Pid, dest: &mut [u8]) -> usize {
        let mut copied = 0;
        let mut cursor = self.messages.front_mut();
        while copied < dest.len() {
            let Some(message) = cursor.get() else {
                break;
            };
            if message.sender != sender {
                cursor.move_next();
                continue;
            }

            let remaining = dest.len() - copied;
            let len = message.payload.len();
            if len <= remaining {
                dest[copied..copied + len].copy_from_slice(&message.payload);
                copied += len;
                cursor.remove();
            } else {
                // Items in the list are shared; take the node out to edit it.
                let Some(mut message) = cursor.remove() else {
                    break;
                };
                dest[copied..].copy_from_slice(&message.payload[..remaining]);
                message.payload.drain(..remaining);
                copied += remaining;
                cursor.insert_before(message);
                break;
            }
        }
        copied
    }

    /// Remove the oldest whole message from `sender`, if any.
    pub fn take_message(&mut self, sender: Pid) -> Option<Message> {
        let mut cursor = self.messages.front_mut();
        while let Some(message) = cursor.get() {
            if message.sender == sender {
                return cursor.remove().map(|message| *message);
            }
            cursor.move_next();
        }
        None
    }
}
