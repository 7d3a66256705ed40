//! Occupancy bitmap for slotted pages.
//!
//! One bit per slot, packed most-significant-bit first: slot `i` lives in byte `i / 8`
//! at bit position `7 - i % 8`. This ordering is part of the on-disk page format.

/// A fixed-length bitset view over a byte buffer.
#[derive(Debug)]
pub struct SlotBitmap<B> {
    bytes: B,
    len: usize,
}

/// Number of bytes needed to hold `len` bits.
pub const fn bytes_for(len: usize) -> usize {
    len.div_ceil(8)
}

#[inline]
fn mask(index: usize) -> u8 {
    0x80 >> (index % 8)
}

impl<B: AsRef<[u8]>> SlotBitmap<B> {
    /// Wrap `bytes` as a bitmap of `len` bits. `bytes` must hold at least
    /// `bytes_for(len)` bytes.
    pub fn new(bytes: B, len: usize) -> Self {
        debug_assert!(bytes.as_ref().len() >= bytes_for(len));
        Self { bytes, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        self.bytes.as_ref()[index / 8] & mask(index) != 0
    }

    /// First set bit at or after `from`, if any.
    pub fn first_set(&self, from: usize) -> Option<usize> {
        self.scan(from, |byte| byte != 0, true)
    }

    /// First clear bit, if any.
    pub fn first_clear(&self) -> Option<usize> {
        self.scan(0, |byte| byte != 0xFF, false)
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        let bytes = self.bytes.as_ref();
        let full = self.len / 8;
        let mut count: usize = bytes[..full].iter().map(|b| b.count_ones() as usize).sum();
        for index in full * 8..self.len {
            if self.get(index) {
                count += 1;
            }
        }
        count
    }

    // Walks bits from `from`, skipping whole bytes that `interesting` rejects.
    fn scan(&self, from: usize, interesting: impl Fn(u8) -> bool, want: bool) -> Option<usize> {
        let bytes = self.bytes.as_ref();
        let mut index = from;
        while index < self.len {
            if index % 8 == 0 && !interesting(bytes[index / 8]) {
                index += 8;
                continue;
            }
            if self.get(index) == want {
                return Some(index);
            }
            index += 1;
        }
        None
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SlotBitmap<B> {
    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len);
        let byte = &mut self.bytes.as_mut()[index / 8];
        if value {
            *byte |= mask(index);
        } else {
            *byte &= !mask(index);
        }
    }
}
