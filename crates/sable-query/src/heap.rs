//! In-memory table heap.
//!
//! Stand-in for the storage manager's table heap: it hands out rids with the
//! usual page/slot shape and fetches tuples by rid. Tuples are never moved
//! or deleted, so a rid stays valid for the life of the table.

use sable_vector::Rid;

use crate::value::Tuple;

/// Slots per heap page.
const PAGE_CAPACITY: usize = 256;

#[derive(Debug, Default)]
pub struct TableHeap {
    tuples: Vec<Tuple>,
}

impl TableHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tuple, returning its rid.
    pub fn insert_tuple(&mut self, tuple: Tuple) -> Rid {
        let position = self.tuples.len();
        self.tuples.push(tuple);
        Rid::new(
            (position / PAGE_CAPACITY) as u32,
            (position % PAGE_CAPACITY) as u32,
        )
    }

    pub fn get_tuple(&self, rid: Rid) -> Option<&Tuple> {
        let position = rid.page_id() as usize * PAGE_CAPACITY + rid.slot() as usize;
        self.tuples.get(position)
    }

    /// Iterate all tuples in rid order.
    pub fn iter(&self) -> impl Iterator<Item = (Rid, &Tuple)> {
        self.tuples.iter().enumerate().map(|(position, tuple)| {
            (
                Rid::new(
                    (position / PAGE_CAPACITY) as u32,
                    (position % PAGE_CAPACITY) as u32,
                ),
                tuple,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}
