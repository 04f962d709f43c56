//! Doubly linked free lists threaded through the free blocks themselves.
//!
//! A free block's first word is its `prev` link and its second word is its
//! `next` link, both as window addresses. The list head/tail live in the
//! allocator, one pair per bucket, so pushing, popping the back, and removing
//! an arbitrary block are all O(1).

use super::window::Window;

const NONE: usize = usize::MAX;
const WORD: usize = core::mem::size_of::<usize>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct FreeList {
    head: usize,
    tail: usize,
    len: usize,
}

impl FreeList {
    pub const fn new() -> Self {
        Self {
            head: NONE,
            tail: NONE,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Append `block` as the newest entry.
    pub fn push_back<W: Window + ?Sized>(&mut self, window: &mut W, block: usize) {
        set_prev(window, block, self.tail);
        set_next(window, block, NONE);
        if self.tail == NONE {
            self.head = block;
        } else {
            set_next(window, self.tail, block);
        }
        self.tail = block;
        self.len += 1;
    }

    /// Remove and return the newest entry.
    pub fn pop_back<W: Window + ?Sized>(&mut self, window: &mut W) -> Option<usize> {
        if self.tail == NONE {
            return None;
        }
        let block = self.tail;
        self.remove(window, block);
        Some(block)
    }

    /// Unlink `block`, which must currently be on this list.
    pub fn remove<W: Window + ?Sized>(&mut self, window: &mut W, block: usize) {
        let prev = prev_of(window, block);
        let next = next_of(window, block);
        if prev == NONE {
            self.head = next;
        } else {
            set_next(window, prev, next);
        }
        if next == NONE {
            self.tail = prev;
        } else {
            set_prev(window, next, prev);
        }
        self.len -= 1;
    }

    pub fn iter<'a, W: Window + ?Sized>(&self, window: &'a W) -> FreeBlocks<'a, W> {
        FreeBlocks {
            window,
            cursor: self.head,
            remaining: self.len,
        }
    }
}

fn prev_of<W: Window + ?Sized>(window: &W, block: usize) -> usize {
    window.read_word(block)
}

fn next_of<W: Window + ?Sized>(window: &W, block: usize) -> usize {
    window.read_word(block + WORD)
}

fn set_prev<W: Window + ?Sized>(window: &mut W, block: usize, prev: usize) {
    window.write_word(block, prev);
}

fn set_next<W: Window + ?Sized>(window: &mut W, block: usize, next: usize) {
    window.write_word(block + WORD, next);
}

/// Addresses on one bucket's free list, oldest first.
pub struct FreeBlocks<'a, W: ?Sized> {
    window: &'a W,
    cursor: usize,
    remaining: usize,
}

impl<W: Window + ?Sized> Iterator for FreeBlocks<'_, W> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.cursor == NONE || self.remaining == 0 {
            return None;
        }
        let block = self.cursor;
        self.cursor = next_of(self.window, block);
        self.remaining -= 1;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<W: Window + ?Sized> ExactSizeIterator for FreeBlocks<'_, W> {}
