//! Property tests for message ordering.

use super::{MessageQueue, QueueRef, receive, send};
use crate::task::{Pid, Scheduler};
use alloc::sync::Arc;
use mos_hal::IrqSafeLock;
use proptest::prelude::*;

/// Never blocks for real: every receive in these tests is satisfiable.
struct NoWait;

impl Scheduler for NoWait {
    type Process = Pid;

    fn current_pid(&self) -> Pid {
        1
    }

    fn lookup(&self, pid: Pid) -> Option<Pid> {
        Some(pid)
    }

    fn block(&self, _: &Pid) {}

    fn unblock(&self, _: &Pid) {}

    fn yield_now(&self) {
        unreachable!("receive blocked with data pending");
    }
}

fn arb_sends() -> impl Strategy<Value = Vec<(Pid, Vec<u8>)>> {
    prop::collection::vec(
        (2usize..5, prop::collection::vec(any::<u8>(), 0..24)),
        0..16,
    )
}

proptest! {
    #[test]
    fn receive_returns_one_senders_bytes_in_send_order(sends in arb_sends(), sender in 2usize..5) {
        let queue: QueueRef = Arc::new(IrqSafeLock::new(MessageQueue::new(1)));
        for (from, payload) in &sends {
            send(&queue, &NoWait, *from, payload).unwrap();
        }

        let expected: Vec<u8> = sends
            .iter()
            .filter(|(from, _)| *from == sender)
            .flat_map(|(_, payload)| payload.iter().copied())
            .collect();
        let mut dest = vec![0u8; expected.len()];
        receive(&queue, &NoWait, sender, &mut dest).unwrap();
        prop_assert_eq!(&dest, &expected);

        // Other senders' messages survive untouched and in order. Empty
        // messages from `sender` past the last byte read may remain.
        let rest: Vec<(Pid, Vec<u8>)> = queue
            .lock()
            .messages()
            .map(|m| (m.sender(), m.payload().to_vec()))
            .collect();
        prop_assert!(rest.iter().all(|(from, payload)| *from != sender || payload.is_empty()));
        let rest: Vec<(Pid, Vec<u8>)> = rest.into_iter().filter(|(from, _)| *from != sender).collect();
        let others: Vec<(Pid, Vec<u8>)> = sends
            .iter()
            .filter(|(from, _)| *from != sender)
            .cloned()
            .collect();
        prop_assert_eq!(rest, others);
    }

    #[test]
    fn partial_receive_leaves_the_suffix(payload in prop::collection::vec(any::<u8>(), 1..64), split in any::<prop::sample::Index>()) {
        let mut queue = MessageQueue::new(1);
        queue.enqueue(9, &payload).unwrap();

        let cut = split.index(payload.len());
        let mut head = vec![0u8; cut];
        queue.drain_into(9, &mut head);
        prop_assert_eq!(&head[..], &payload[..cut]);
        prop_assert_eq!(queue.pending(), 1);

        let mut tail = vec![0u8; payload.len() - cut];
        queue.drain_into(9, &mut tail);
        prop_assert_eq!(&tail[..], &payload[cut..]);
        prop_assert!(queue.is_empty());
    }
}
