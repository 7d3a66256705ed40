//! Slotted page format for fixed-length records.
//!
//! # Page Layout
//!
//! ```text
//! +----------------------+  offset 0
//! |  Occupancy bitmap    |  ceil(capacity / 8) bytes, MSB-first, 1 = occupied
//! +----------------------+
//! |  Unused              |  leftover bytes from flooring the capacity
//! +----------------------+  page_size - capacity * record_length
//! |  [slot 0]            |
//! |  [slot 1]            |  capacity fixed-length records
//! |  ...                 |
//! +----------------------+  page_size
//! ```
//!
//! `capacity = floor(8 * page_size / (8 * record_length + 1))`: each slot costs its
//! record bytes plus one header bit.

use crate::access::schema::TupleDesc;
use crate::access::tuple::Tuple;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::bitmap::{self, SlotBitmap};

/// Number of slots a page of `page_size` bytes holds for records of `record_length` bytes.
pub const fn capacity_for(page_size: usize, record_length: usize) -> usize {
    8 * page_size / (8 * record_length + 1)
}

/// A slotted view over a page buffer, interpreted with one tuple descriptor.
pub struct HeapPage<'d, B> {
    data: B,
    desc: &'d TupleDesc,
    capacity: usize,
    header_len: usize,
    data_start: usize,
}

impl<'d, B: AsRef<[u8]>> HeapPage<'d, B> {
    pub fn new(data: B, desc: &'d TupleDesc) -> Self {
        let page_size = data.as_ref().len();
        let capacity = capacity_for(page_size, desc.length());
        Self {
            data,
            desc,
            capacity,
            header_len: bitmap::bytes_for(capacity),
            data_start: page_size - capacity * desc.length(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First occupied slot, or `end()` if the page is empty.
    pub fn begin(&self) -> usize {
        self.header().first_set(0).unwrap_or(self.capacity)
    }

    /// End-of-page sentinel, equal to the capacity.
    pub fn end(&self) -> usize {
        self.capacity
    }

    /// First occupied slot strictly after `slot`, or `end()`.
    pub fn next(&self, slot: usize) -> usize {
        self.header().first_set(slot.saturating_add(1)).unwrap_or(self.capacity)
    }

    pub fn is_empty(&self, slot: usize) -> StorageResult<bool> {
        self.check_slot(slot)?;
        Ok(!self.header().get(slot))
    }

    pub fn get(&self, slot: usize) -> StorageResult<Tuple> {
        if self.is_empty(slot)? {
            return Err(StorageError::SlotNotOccupied { slot });
        }
        self.desc.deserialize(&self.data.as_ref()[self.slot_range(slot)])
    }

    /// Number of occupied slots.
    pub fn num_occupied(&self) -> usize {
        self.header().count_set()
    }

    fn header(&self) -> SlotBitmap<&[u8]> {
        SlotBitmap::new(&self.data.as_ref()[..self.header_len], self.capacity)
    }

    fn slot_range(&self, slot: usize) -> std::ops::Range<usize> {
        let start = self.data_start + slot * self.desc.length();
        start..start + self.desc.length()
    }

    fn check_slot(&self, slot: usize) -> StorageResult<()> {
        if slot >= self.capacity {
            return Err(StorageError::InvalidSlot {
                slot,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl<'d, B: AsRef<[u8]> + AsMut<[u8]>> HeapPage<'d, B> {
    /// Store `tuple` in the first free slot. Returns `None` when the page is full.
    pub fn insert(&mut self, tuple: &Tuple) -> StorageResult<Option<usize>> {
        if !self.desc.compatible(tuple) {
            return Err(StorageError::SchemaMismatch);
        }
        let Some(slot) = self.header().first_clear() else {
            return Ok(None);
        };

        let range = self.slot_range(slot);
        self.desc.serialize(&mut self.data.as_mut()[range], tuple)?;
        self.header_mut().set(slot, true);
        Ok(Some(slot))
    }

    /// Free `slot`. The record bytes are left in place.
    pub fn delete(&mut self, slot: usize) -> StorageResult<()> {
        if self.is_empty(slot)? {
            return Err(StorageError::SlotNotOccupied { slot });
        }
        self.header_mut().set(slot, false);
        Ok(())
    }

    fn header_mut(&mut self) -> SlotBitmap<&mut [u8]> {
        let header_len = self.header_len;
        SlotBitmap::new(&mut self.data.as_mut()[..header_len], self.capacity)
    }
}
