//! User buffer access for syscalls.
//!
//! The kernel and every process share one flat address space, so a user
//! buffer is just an address and a length. `UserSlice` rejects the shapes
//! that can never be valid before anything is dereferenced.

use crate::ipc::IpcError;

/// A validated `(addr, len)` byte range handed in by userland.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSlice {
    addr: usize,
    len: usize,
}

impl UserSlice {
    /// Null is only accepted for an empty buffer.
    pub fn new(addr: usize, len: usize) -> Result<Self, IpcError> {
        if len == 0 {
            return Ok(Self { addr, len });
        }
        if addr == 0 || len > isize::MAX as usize || addr.checked_add(len).is_none() {
            return Err(IpcError::BadUserBuffer);
        }
        Ok(Self { addr, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// # Safety
    /// `[addr, addr + len)` must be readable and not mutated for `'a`.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: non-null and non-wrapping per `new`; validity per caller.
        unsafe { core::slice::from_raw_parts(self.addr as *const u8, self.len) }
    }

    /// # Safety
    /// `[addr, addr + len)` must be writable and not otherwise accessed for `'a`.
    pub unsafe fn as_mut_slice<'a>(&self) -> &'a mut [u8] {
        if self.len == 0 {
            return &mut [];
        }
        // SAFETY: non-null and non-wrapping per `new`; exclusivity per caller.
        unsafe { core::slice::from_raw_parts_mut(self.addr as *mut u8, self.len) }
    }
}
