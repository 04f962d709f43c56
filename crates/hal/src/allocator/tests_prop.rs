//! Property tests for the buddy allocator.
//!
//! A random sequence of allocate/release calls runs against a 4 KiB window
//! with 128-byte leaves. After every step the tree is checked against the
//! set of live allocations the test keeps on the side.

use super::{BufferWindow, BuddyAllocator, BuddyConfig, HEADER_SIZE};
use proptest::prelude::*;

const BASE: usize = 0x0100_0000;
const MIN_LOG2: usize = 7;
const MAX_LOG2: usize = 12;
const MAX_ALLOC: usize = 1 << MAX_LOG2;

type TestAllocator = BuddyAllocator<BufferWindow, Vec<u8>>;

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    /// Index into the live set, taken modulo its length.
    Release(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..1200).prop_map(Op::Allocate),
        2 => any::<usize>().prop_map(Op::Release),
    ]
}

fn create_allocator() -> TestAllocator {
    let config = BuddyConfig::new(MIN_LOG2, MAX_LOG2).unwrap();
    let window = BufferWindow::new(BASE, config.max_alloc());
    BuddyAllocator::new(config, window, vec![0; config.split_bytes()])
}

fn block_size_for(request: usize) -> usize {
    (request + HEADER_SIZE).next_power_of_two().max(1 << MIN_LOG2)
}

fn step(alloc: &mut TestAllocator, live: &mut Vec<(usize, usize)>, op: &Op) {
    match *op {
        Op::Allocate(request) => {
            if let Ok(addr) = alloc.allocate(request) {
                live.push((addr, request));
            }
        }
        Op::Release(index) => {
            if !live.is_empty() {
                let (addr, _) = live.swap_remove(index % live.len());
                alloc.release(addr);
            }
        }
    }
}

/// Run `ops`, returning the live `(addr, request)` pairs.
fn apply(alloc: &mut TestAllocator, ops: &[Op]) -> Vec<(usize, usize)> {
    let mut live = Vec::new();
    for op in ops {
        step(alloc, &mut live, op);
    }
    live
}

fn overlaps_live(live: &[(usize, usize)], start: usize, len: usize) -> bool {
    live.iter()
        .any(|&(addr, request)| addr - HEADER_SIZE < start + len && start < addr + request)
}

/// Free blocks, split bits, and the tree size all agree with `live`.
fn check_tree(alloc: &TestAllocator, live: &[(usize, usize)]) -> Result<(), TestCaseError> {
    let config = alloc.config();
    let limit = alloc.bucket_limit();

    let mut accounted = 0;
    for bucket in limit..config.bucket_count() {
        let size = config.block_size(bucket);
        for ptr in alloc.free_blocks(bucket) {
            prop_assert_eq!((ptr - BASE) % size, 0);
            prop_assert!(!overlaps_live(live, ptr, size), "free block {:#x} is in use", ptr);

            let node = alloc.node_for_ptr(ptr, bucket);
            if node != 0 {
                let parent_bit = alloc.is_split((node - 1) / 2);
                if bucket == limit {
                    prop_assert!(!parent_bit, "free root marked used");
                } else {
                    let sibling = alloc.ptr_for_node(((node - 1) ^ 1) + 1, bucket);
                    prop_assert_eq!(parent_bit, overlaps_live(live, sibling, size));
                }
            }
            accounted += size;
        }
    }
    for &(_, request) in live {
        accounted += block_size_for(request);
    }
    if alloc.is_initialized() {
        prop_assert_eq!(accounted, config.block_size(limit));
    }
    Ok(())
}

fn snapshot(alloc: &TestAllocator) -> (usize, Vec<u8>, Vec<Vec<usize>>) {
    let lists = (0..alloc.config().bucket_count())
        .map(|bucket| alloc.free_blocks(bucket).collect())
        .collect();
    (alloc.bucket_limit(), alloc.split_bits().to_vec(), lists)
}

proptest! {
    #[test]
    fn free_lists_and_split_bits_match_live_set(ops in prop::collection::vec(arb_op(), 1..64)) {
        let mut alloc = create_allocator();
        let mut live = Vec::new();
        for op in &ops {
            step(&mut alloc, &mut live, op);
            check_tree(&alloc, &live)?;
        }
    }

    #[test]
    fn live_allocations_are_disjoint_and_in_window(ops in prop::collection::vec(arb_op(), 1..64)) {
        let mut alloc = create_allocator();
        let live = apply(&mut alloc, &ops);
        for (i, &(a, a_len)) in live.iter().enumerate() {
            prop_assert!(a - HEADER_SIZE >= BASE);
            prop_assert!(a + a_len <= BASE + MAX_ALLOC);
            for &(b, b_len) in &live[i + 1..] {
                let disjoint = a + a_len <= b - HEADER_SIZE || b + b_len <= a - HEADER_SIZE;
                prop_assert!(disjoint, "{:#x}+{} overlaps {:#x}+{}", a, a_len, b, b_len);
            }
        }
        check_tree(&alloc, &live)?;
    }

    #[test]
    fn release_undoes_allocate(ops in prop::collection::vec(arb_op(), 0..32), request in 0usize..1200) {
        let mut alloc = create_allocator();
        apply(&mut alloc, &ops);
        let was_initialized = alloc.is_initialized();
        let before = snapshot(&alloc);
        if let Ok(addr) = alloc.allocate(request) {
            // Growing the tree is not undone by release; only compare when
            // the request fit the existing tree.
            if was_initialized && alloc.bucket_limit() == before.0 {
                alloc.release(addr);
                prop_assert_eq!(snapshot(&alloc), before);
            }
        }
    }
}
