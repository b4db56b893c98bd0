use crate::access::error::CodecError;
use crate::access::schema::Schema;
use crate::access::tuple::{RecordId, Tuple};
use crate::storage::error::StorageError;
use crate::storage::page::PageId;
use std::fmt;
use std::sync::Arc;

// Page layout:
//   [used-slot bitmap: ceil(N / 8) bytes][slot 0]...[slot N - 1][zero padding]
// with N = floor(8 * page_size / (8 * tuple_size + 1)). Bit i lives in byte
// i / 8 at position i % 8, least significant bit first.

/// A parsed page of fixed-width tuples.
///
/// The page keeps the raw image it was built from alongside the decoded
/// tuples of every used slot.
pub struct HeapPage {
    page_id: PageId,
    schema: Arc<Schema>,
    tuples: Vec<Option<Tuple>>,
    data: Box<[u8]>,
}

impl HeapPage {
    /// Number of tuple slots a page can hold, counting one header bit per slot.
    pub fn slots_per_page(page_size: usize, tuple_size: usize) -> usize {
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    /// Size in bytes of the used-slot bitmap for `num_slots` slots.
    pub fn header_size(num_slots: usize) -> usize {
        num_slots.div_ceil(8)
    }

    /// Parse a page image of exactly `page_size` bytes.
    pub fn new(
        page_id: PageId,
        schema: Arc<Schema>,
        page_size: usize,
        data: Vec<u8>,
    ) -> Result<Self, StorageError> {
        if data.len() != page_size {
            return Err(StorageError::InvalidPageSize {
                expected: page_size,
                actual: data.len(),
            });
        }

        let tuple_size = schema.byte_size();
        let num_slots = Self::slots_per_page(page_size, tuple_size);

        if num_slots == 0 {
            return Err(corrupt(
                page_id,
                format!("{tuple_size}-byte tuples do not fit in a {page_size}-byte page"),
            ));
        }
        if num_slots > u16::MAX as usize + 1 {
            return Err(corrupt(
                page_id,
                format!("{num_slots} slots exceed the addressable slot range"),
            ));
        }

        let header_size = Self::header_size(num_slots);
        let header = &data[..header_size];

        // Padding bits after the last slot must be clear.
        if let Some(slot) = (num_slots..header_size * 8).find(|&s| bit_is_set(header, s)) {
            return Err(corrupt(
                page_id,
                format!("bitmap marks slot {slot} used but the page has {num_slots} slots"),
            ));
        }

        let mut tuples = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            if !bit_is_set(header, slot) {
                tuples.push(None);
                continue;
            }

            let offset = header_size + slot * tuple_size;
            let mut reader = &data[offset..offset + tuple_size];
            let mut tuple = Tuple::read_from(schema.clone(), &mut reader)
                .map_err(|e| corrupt(page_id, format!("slot {slot}: {e}")))?;
            tuple.set_record_id(Some(RecordId::new(page_id, slot as u16)));
            tuples.push(Some(tuple));
        }

        Ok(Self {
            page_id,
            schema,
            tuples,
            data: data.into_boxed_slice(),
        })
    }

    /// Build a page image from an explicit slot assignment: slot `i` is used
    /// iff `slots[i]` is `Some`.
    pub fn encode(
        page_size: usize,
        schema: &Schema,
        slots: &[Option<Tuple>],
    ) -> Result<Vec<u8>, CodecError> {
        let tuple_size = schema.byte_size();
        let num_slots = Self::slots_per_page(page_size, tuple_size);
        if slots.len() > num_slots {
            return Err(CodecError::TooManySlots {
                requested: slots.len(),
                capacity: num_slots,
            });
        }

        let header_size = Self::header_size(num_slots);
        let mut data = Self::empty_page_data(page_size);

        for (slot, tuple) in slots.iter().enumerate() {
            let Some(tuple) = tuple else {
                continue;
            };
            if tuple.schema().as_ref() != schema {
                return Err(CodecError::SchemaMismatch {
                    expected: schema.to_string(),
                    actual: tuple.schema().to_string(),
                });
            }

            data[slot / 8] |= 1 << (slot % 8);
            let offset = header_size + slot * tuple_size;
            let mut writer = &mut data[offset..offset + tuple_size];
            tuple.write_to(&mut writer)?;
        }

        Ok(data)
    }

    /// An image with every slot empty.
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn num_slots(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.tuples.get(slot).is_some_and(Option::is_some)
    }

    pub fn num_used_slots(&self) -> usize {
        self.tuples.iter().filter(|t| t.is_some()).count()
    }

    pub fn num_empty_slots(&self) -> usize {
        self.num_slots() - self.num_used_slots()
    }

    /// The tuple in `slot`, if that slot is used.
    pub fn tuple(&self, slot: usize) -> Option<&Tuple> {
        self.tuples.get(slot)?.as_ref()
    }

    /// First used slot at or after `from`.
    pub fn next_used_slot(&self, from: usize) -> Option<usize> {
        (from..self.tuples.len()).find(|&slot| self.tuples[slot].is_some())
    }

    /// Tuples of the used slots in increasing slot order.
    pub fn iter(&self) -> HeapPageIter<'_> {
        HeapPageIter {
            page: self,
            next_slot: 0,
        }
    }

    /// The raw image this page was parsed from.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for HeapPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapPage")
            .field("page_id", &self.page_id)
            .field("num_slots", &self.num_slots())
            .field("used_slots", &self.num_used_slots())
            .finish()
    }
}

impl<'a> IntoIterator for &'a HeapPage {
    type Item = &'a Tuple;
    type IntoIter = HeapPageIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the used slots of a single page.
pub struct HeapPageIter<'a> {
    page: &'a HeapPage,
    next_slot: usize,
}

impl<'a> Iterator for HeapPageIter<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.page.next_used_slot(self.next_slot)?;
        self.next_slot = slot + 1;
        self.page.tuple(slot)
    }
}

fn bit_is_set(header: &[u8], slot: usize) -> bool {
    (header[slot / 8] >> (slot % 8)) & 1 == 1
}

fn corrupt(page_id: PageId, reason: String) -> StorageError {
    StorageError::CorruptPage { page_id, reason }
}
