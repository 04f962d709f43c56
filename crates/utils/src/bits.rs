//! Packed bit array over caller-provided byte storage.
//!
//! Bit `i` lives in byte `i / 8` at bit position `i % 8`, so the layout is
//! identical to a plain `u8` array indexed by hand. Storage is generic so the
//! same type works over a `static` array in the kernel and a `Vec<u8>` in
//! host tests.

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub const fn bytes_for(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// A fixed-size array of bits.
///
/// Indexing past the end of the storage panics, the same way slice indexing
/// does. Owners size the storage once and validate it up front.
pub struct BitArray<S> {
    storage: S,
}

impl<S> BitArray<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: AsRef<[u8]>> BitArray<S> {
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        (self.storage.as_ref()[index / 8] >> (index % 8)) & 1 != 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_ref()
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> BitArray<S> {
    /// Toggle bit `index` and return its new value.
    #[inline]
    pub fn flip(&mut self, index: usize) -> bool {
        let byte = &mut self.storage.as_mut()[index / 8];
        *byte ^= 1 << (index % 8);
        (*byte >> (index % 8)) & 1 != 0
    }

    pub fn clear_all(&mut self) {
        self.storage.as_mut().fill(0);
    }
}
