//! String-keyed sorted table backed entirely by the guarded heap.
//!
//! Rows, key copies, and iterator state all live in chunks: the row array
//! is a child of the table chunk, every key string is duplicated into its
//! own chunk under the table, and the iterator keeps its position in a
//! chunk of its own. Destroying the table unlinks one chunk and lets the
//! ownership cascade release everything else.

use std::cmp::Ordering;

use tracing::debug;

use crate::heap::ChunkAllocator;
use crate::types::{CallSite, ChunkHandle};

/// Header record kept in the table chunk: capacity, used count, row-array
/// handle.
const HEADER_LEN: usize = 16;

/// One row: key chunk handle plus value slot, little-endian.
const ROW_SIZE: usize = 16;

/// Row capacity of a freshly created table.
const INITIAL_CAPACITY: usize = 10;

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_le_bytes([
        bytes[at],
        bytes[at + 1],
        bytes[at + 2],
        bytes[at + 3],
        bytes[at + 4],
        bytes[at + 5],
        bytes[at + 6],
        bytes[at + 7],
    ])
}

fn write_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_u64(bytes: &mut [u8], at: usize, value: u64) {
    bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn read_row<A: ChunkAllocator>(heap: &A, rows: ChunkHandle, index: usize) -> (ChunkHandle, u64) {
    let bytes = heap.payload(rows);
    let at = index * ROW_SIZE;
    (
        ChunkHandle::from_raw(read_u64(bytes, at)),
        read_u64(bytes, at + 8),
    )
}

fn write_row<A: ChunkAllocator>(
    heap: &mut A,
    rows: ChunkHandle,
    index: usize,
    key: ChunkHandle,
    slot: u64,
) {
    let bytes = heap.payload_mut(rows);
    let at = index * ROW_SIZE;
    write_u64(bytes, at, key.raw());
    write_u64(bytes, at + 8, slot);
}

fn key_bytes<A: ChunkAllocator>(heap: &A, key: ChunkHandle) -> &[u8] {
    &heap.payload(key)[..heap.requested_len(key)]
}

struct Header {
    capacity: usize,
    used: usize,
    rows: ChunkHandle,
}

/// Sorted dynamic table keyed by text.
///
/// Keys are compared byte-wise and kept in ascending order after every
/// insert, so reads are a plain binary search. Values are caller-owned:
/// they sit in an append-only slot list the table never disposes of, and
/// rows refer to them by slot index.
pub struct IndexedTable<V> {
    table: ChunkHandle,
    values: Vec<V>,
}

impl<V> IndexedTable<V> {
    /// New empty table with capacity for [`INITIAL_CAPACITY`] rows. The
    /// table chunk owns the row array; both are allocated right here.
    pub fn create<A: ChunkAllocator>(heap: &mut A) -> Self {
        let table = heap.alloc_bytes(None, HEADER_LEN, CallSite::here());
        let rows = heap.allocate(Some(table), None, ROW_SIZE, INITIAL_CAPACITY, CallSite::here());
        let created = Self {
            table,
            values: Vec::new(),
        };
        created.write_header(
            heap,
            &Header {
                capacity: INITIAL_CAPACITY,
                used: 0,
                rows,
            },
        );
        created
    }

    /// Inserts a row, doubling the row array first when full. The key is
    /// duplicated into its own chunk under the table; all rows are re-sorted
    /// afterwards. Duplicate keys are permitted; a read for one returns an
    /// unspecified matching row.
    pub fn insert<A: ChunkAllocator>(&mut self, heap: &mut A, key: &str, value: V) {
        let mut header = self.header(heap);
        if header.used == header.capacity {
            header.capacity *= 2;
            header.rows = heap.allocate(
                Some(self.table),
                Some(header.rows),
                ROW_SIZE,
                header.capacity,
                CallSite::here(),
            );
        }

        let key_chunk = heap.strdup(Some(self.table), key, CallSite::here());
        let slot = self.values.len() as u64;
        self.values.push(value);
        write_row(heap, header.rows, header.used, key_chunk, slot);
        header.used += 1;

        // Full re-sort after every insert; read's binary search depends on it.
        let mut decoded: Vec<(Vec<u8>, ChunkHandle, u64)> = Vec::with_capacity(header.used);
        for index in 0..header.used {
            let (key_chunk, slot) = read_row(heap, header.rows, index);
            decoded.push((key_bytes(heap, key_chunk).to_vec(), key_chunk, slot));
        }
        decoded.sort_by(|a, b| a.0.cmp(&b.0));
        for (index, (_, key_chunk, slot)) in decoded.iter().enumerate() {
            write_row(heap, header.rows, index, *key_chunk, *slot);
        }

        heap.checkpoint(header.rows, CallSite::here());
        self.write_header(heap, &header);
    }

    /// Binary search by byte-wise key comparison. Absence is a normal
    /// outcome, not an error.
    pub fn read<A: ChunkAllocator>(&self, heap: &A, key: &str) -> Option<&V> {
        let header = self.header(heap);
        let mut lo = 0usize;
        let mut hi = header.used;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (key_chunk, slot) = read_row(heap, header.rows, mid);
            match key_bytes(heap, key_chunk).cmp(key.as_bytes()) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(&self.values[slot as usize]),
            }
        }
        None
    }

    /// Number of rows.
    pub fn len<A: ChunkAllocator>(&self, heap: &A) -> usize {
        self.header(heap).used
    }

    /// True when no rows have been inserted.
    pub fn is_empty<A: ChunkAllocator>(&self, heap: &A) -> bool {
        self.len(heap) == 0
    }

    /// Forward-only pass over the rows in ascending key order.
    ///
    /// The iterator keeps its position in its own chunk and releases it when
    /// advancing past the last row; it is not restartable. Inserting during
    /// iteration invalidates it.
    pub fn iter<'t, A: ChunkAllocator>(&'t self, heap: &mut A) -> TableIter<'t, V> {
        let header = self.header(heap);
        let state = if header.used > 0 {
            let state = heap.alloc_bytes(None, 8, CallSite::here());
            write_u64(heap.payload_mut(state), 0, 0);
            heap.checkpoint(state, CallSite::here());
            Some(state)
        } else {
            None
        };
        TableIter { table: self, state }
    }

    /// Debug-level trace of every row.
    pub fn dump<A: ChunkAllocator>(&self, heap: &A) {
        let header = self.header(heap);
        for index in 0..header.used {
            let (key_chunk, slot) = read_row(heap, header.rows, index);
            debug!(
                key = %String::from_utf8_lossy(key_bytes(heap, key_chunk)),
                slot,
                "table.row"
            );
        }
    }

    /// Unlinks the table chunk; the ownership cascade releases the row
    /// array and every key chunk transitively. Values are left to the
    /// caller, as always.
    pub fn destroy<A: ChunkAllocator>(self, heap: &mut A) {
        heap.unlink(self.table, CallSite::here());
    }

    fn header<A: ChunkAllocator>(&self, heap: &A) -> Header {
        let bytes = heap.payload(self.table);
        Header {
            capacity: read_u32(bytes, 0) as usize,
            used: read_u32(bytes, 4) as usize,
            rows: ChunkHandle::from_raw(read_u64(bytes, 8)),
        }
    }

    fn write_header<A: ChunkAllocator>(&self, heap: &mut A, header: &Header) {
        let bytes = heap.payload_mut(self.table);
        write_u32(bytes, 0, header.capacity as u32);
        write_u32(bytes, 4, header.used as u32);
        write_u64(bytes, 8, header.rows.raw());
        heap.checkpoint(self.table, CallSite::here());
    }
}

/// Forward-only table iterator; see [`IndexedTable::iter`].
pub struct TableIter<'t, V> {
    table: &'t IndexedTable<V>,
    state: Option<ChunkHandle>,
}

impl<'t, V> TableIter<'t, V> {
    /// Yields the next (key, value) pair, or `None` once exhausted. The
    /// backing position chunk is unlinked when the pass moves beyond the
    /// last row.
    pub fn next<A: ChunkAllocator>(&mut self, heap: &mut A) -> Option<(String, &'t V)> {
        let state = self.state?;
        let table = self.table;
        let pos = read_u64(heap.payload(state), 0) as usize;
        let header = table.header(heap);
        let (key_chunk, slot) = read_row(heap, header.rows, pos);
        let key = String::from_utf8_lossy(key_bytes(heap, key_chunk)).into_owned();
        let value = &table.values[slot as usize];
        if pos + 1 < header.used {
            write_u64(heap.payload_mut(state), 0, (pos + 1) as u64);
            heap.checkpoint(state, CallSite::here());
        } else {
            self.state = heap.unlink(state, CallSite::here());
        }
        Some((key, value))
    }
}
