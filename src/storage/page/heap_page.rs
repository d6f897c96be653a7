use std::sync::Arc;

use bytes::BufMut;

use crate::common::{config, DbError, PageId, RecordId, Result, SlotId, TransactionId};
use crate::tuple::{Schema, Tuple};

/// One fixed-size page of a heap file: a tuple-presence bitmap followed by a
/// packed array of fixed-width tuple slots.
///
/// On-disk layout:
///
/// ```text
/// +--------------------------+----------------------------+---------+
/// | presence bitmap          | tuple slots                | padding |
/// | ceil(num_slots / 8) B    | num_slots * tuple_size B   |         |
/// +--------------------------+----------------------------+---------+
/// ```
///
/// Bit `i` of the bitmap (LSB-first within each byte) is set iff slot `i`
/// holds a live tuple. `num_slots` is the largest count such that bitmap and
/// slots fit in one page: `floor(page_size * 8 / (tuple_size * 8 + 1))`.
///
/// A page also tracks, in memory only, whether it has been modified since it
/// was last loaded or flushed, and which transaction did the modifying. The
/// dirtying transaction is meaningful only while the page is dirty.
pub struct HeapPage {
    pid: PageId,
    schema: Arc<Schema>,
    slots: Vec<Option<Tuple>>,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// Number of tuple slots a page holds under the given schema.
    pub fn slots_per_page(schema: &Schema) -> usize {
        let page_bits = config::page_size() * 8;
        let slot_bits = schema.tuple_size() * 8 + 1;
        page_bits / slot_bits
    }

    /// Size in bytes of the presence bitmap for the given schema.
    pub fn header_size(schema: &Schema) -> usize {
        Self::slots_per_page(schema).div_ceil(8)
    }

    /// Creates an empty in-memory page (all slots free).
    pub fn new_empty(pid: PageId, schema: Arc<Schema>) -> Self {
        let num_slots = Self::slots_per_page(&schema);
        Self {
            pid,
            schema,
            slots: vec![None; num_slots],
            dirtied_by: None,
        }
    }

    /// Parses a page from exactly `page_size` raw bytes. Tuples read from
    /// occupied slots get their record ids set to this page.
    pub fn from_bytes(pid: PageId, schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        if data.len() != config::page_size() {
            return Err(DbError::CorruptPage(pid));
        }

        let num_slots = Self::slots_per_page(&schema);
        let header_size = Self::header_size(&schema);
        let tuple_size = schema.tuple_size();

        let mut slots = Vec::with_capacity(num_slots);
        for i in 0..num_slots {
            if data[i / 8] & (1 << (i % 8)) == 0 {
                slots.push(None);
                continue;
            }
            let offset = header_size + i * tuple_size;
            let mut tuple = Tuple::from_bytes(Arc::clone(&schema), &data[offset..])
                .ok_or(DbError::CorruptPage(pid))?;
            tuple.set_rid(Some(RecordId::new(pid, SlotId::new(i as u16))));
            slots.push(Some(tuple));
        }

        Ok(Self {
            pid,
            schema,
            slots,
            dirtied_by: None,
        })
    }

    /// Serializes the page to exactly `page_size` bytes. Free slots are
    /// zero-filled so the image is deterministic.
    pub fn to_bytes(&self) -> Vec<u8> {
        let page_size = config::page_size();
        let header_size = Self::header_size(&self.schema);
        let tuple_size = self.schema.tuple_size();

        let mut buf = Vec::with_capacity(page_size);

        let mut bitmap = vec![0u8; header_size];
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.is_some() {
                bitmap[i / 8] |= 1 << (i % 8);
            }
        }
        buf.put_slice(&bitmap);

        for slot in &self.slots {
            match slot {
                Some(tuple) => tuple.encode(&mut buf),
                None => buf.put_bytes(0, tuple_size),
            }
        }

        buf.resize(page_size, 0);
        buf
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently free slots.
    pub fn empty_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    pub fn slot_in_use(&self, slot: SlotId) -> bool {
        self.slots
            .get(slot.as_usize())
            .is_some_and(|s| s.is_some())
    }

    /// Stores `tuple` in the first free slot and stamps its record id.
    /// Fails with `PageFull` if every slot is occupied. The caller is
    /// responsible for marking the page dirty.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<()> {
        if *tuple.schema().as_ref() != *self.schema {
            return Err(DbError::SchemaMismatch);
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(DbError::PageFull(self.pid))?;
        tuple.set_rid(Some(RecordId::new(self.pid, SlotId::new(slot as u16))));
        self.slots[slot] = Some(tuple);
        Ok(())
    }

    /// Clears the slot named by `rid`, removing its tuple. The caller is
    /// responsible for marking the page dirty.
    pub fn delete_tuple(&mut self, rid: &RecordId) -> Result<()> {
        if rid.page_id != self.pid {
            return Err(DbError::WrongTable(self.pid.table_id));
        }
        let slot = self
            .slots
            .get_mut(rid.slot.as_usize())
            .ok_or(DbError::InvalidSlot(rid.slot, self.pid))?;
        if slot.take().is_none() {
            return Err(DbError::EmptySlot(rid.slot, self.pid));
        }
        Ok(())
    }

    /// Iterates over the live tuples on this page, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().flatten()
    }

    /// Marks the page dirty on behalf of `txn`, or clean with `None`.
    /// Flushing clears both the flag and the dirtying transaction.
    pub fn mark_dirty(&mut self, txn: Option<TransactionId>) {
        self.dirtied_by = txn;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }

    /// The transaction that last dirtied this page, while it is dirty.
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }
}
