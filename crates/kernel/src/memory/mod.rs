//! Kernel memory: the buddy-backed kernel heap.

pub mod heap;

pub use heap::{KERNEL_HEAP, KernelHeap, UserHeap};
