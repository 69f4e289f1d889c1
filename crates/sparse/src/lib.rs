//! # Sparse - address index over a hex document
//!
//! A derived, cache-only view of a [`Document`]'s data records that answers
//! "which record holds address X" in O(log n) and fills gaps with new
//! records.
//!
//! ## Layout
//!
//! ```text
//! positions: [ p0,        p1,        p2        ]   document positions, ascending by start
//! bounds:    [ s0, e0,    s1, e1,    s2, e2    ]   inclusive endpoints, flat
//!
//! binary_search(bounds, addr)
//!   Ok(slot)             -> record slot / 2   (hit on a start or an end)
//!   Err(i), i odd        -> record i / 2      (strictly between s and e)
//!   Err(i), i even       -> gap               (between e(k) and s(k+1))
//! ```
//!
//! ## Staleness
//!
//! The index never refreshes itself. Only [`SparseIndex::insert_into_gap`]
//! keeps it in step with the document; after any other document change call
//! [`SparseIndex::build`] again.
//!
//! Zero-length data records cover no address and are left out. Documents
//! with overlapping data records are accepted; the index detects them and
//! answers lookups with a first-match scan in sorted order so the lowest
//! slot wins.

mod gap;

pub use gap::Gap;

use record::{AddressError, Document};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error(transparent)]
    Address(#[from] AddressError),

    /// `insert_into_gap` was asked to fill an address some record covers.
    #[error("address {0:#x} is already covered by a data record")]
    NotAGap(u64),

    /// The index refers to a document position that no longer exists.
    #[error("index entry points at missing document position {0}; rebuild the index")]
    StalePosition(usize),
}

/// One indexed data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Position of the record in the document.
    pub position: usize,
    /// Absolute address of its first byte.
    pub start: u64,
    /// Absolute address of its last byte (inclusive).
    pub end: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseIndex {
    /// Document positions of the indexed data records, ascending by start.
    positions: Vec<usize>,
    /// `[start0, end0, start1, end1, ...]`, parallel to `positions`.
    bounds: Vec<u64>,
    /// Set when two data records share at least one address.
    overlapping: bool,
}

impl SparseIndex {
    /// Builds the index from the data records of `doc`.
    ///
    /// Records with equal start addresses keep their document order.
    ///
    /// # Errors
    ///
    /// Fails if a data record's extension link cannot be resolved.
    pub fn build(doc: &Document) -> Result<Self, IndexError> {
        let mut spans = Vec::new();
        for pos in doc.data_positions() {
            let Some(r) = doc.get(pos) else { continue };
            if r.is_empty() {
                continue;
            }
            let start = doc.absolute_address(r)?;
            spans.push((start, start + r.len() as u64 - 1, pos));
        }
        spans.sort_by_key(|(start, _, _)| *start);

        let mut positions = Vec::with_capacity(spans.len());
        let mut bounds = Vec::with_capacity(spans.len() * 2);
        let mut overlapping = false;
        let mut max_end: Option<u64> = None;
        for (start, end, pos) in spans {
            if max_end.is_some_and(|e| start <= e) {
                overlapping = true;
            }
            max_end = Some(max_end.map_or(end, |e| e.max(end)));
            positions.push(pos);
            bounds.push(start);
            bounds.push(end);
        }

        Ok(Self {
            positions,
            bounds,
            overlapping,
        })
    }

    /// Number of indexed data records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn is_overlapping(&self) -> bool {
        self.overlapping
    }

    /// Document positions in ascending start order.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// The flat endpoint array.
    #[must_use]
    pub fn bounds(&self) -> &[u64] {
        &self.bounds
    }

    /// Entry at sorted `slot`.
    #[must_use]
    pub fn entry(&self, slot: usize) -> Option<Entry> {
        let position = *self.positions.get(slot)?;
        Some(Entry {
            position,
            start: self.bounds[slot * 2],
            end: self.bounds[slot * 2 + 1],
        })
    }

    /// All entries in ascending start order.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        (0..self.positions.len()).filter_map(|slot| self.entry(slot))
    }

    /// Finds the data record holding `address`.
    #[must_use]
    pub fn find_enclosing(&self, address: u64) -> Option<Entry> {
        self.find_slot(address).and_then(|slot| self.entry(slot))
    }

    /// Sorted slot of the record holding `address`.
    fn find_slot(&self, address: u64) -> Option<usize> {
        if self.overlapping {
            return self.scan_slot(address);
        }
        match self.bounds.binary_search(&address) {
            Ok(slot) => Some(slot / 2),
            Err(i) if i % 2 == 1 => Some(i / 2),
            Err(_) => None,
        }
    }

    /// First slot (lowest start) whose range holds `address`.
    fn scan_slot(&self, address: u64) -> Option<usize> {
        self.bounds
            .chunks_exact(2)
            .take_while(|span| span[0] <= address)
            .position(|span| address <= span[1])
    }

    /// Number of records starting at or below `address`, which is also the
    /// slot a new record starting at `address` belongs in.
    fn first_start_after(&self, address: u64) -> usize {
        let (mut lo, mut hi) = (0, self.positions.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.bounds[mid * 2] <= address {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Moves every stored position at or past `pos` up by one, mirroring a
    /// [`Document::insert`] at `pos`.
    fn shift_positions(&mut self, pos: usize) {
        for p in &mut self.positions {
            if *p >= pos {
                *p += 1;
            }
        }
    }

    /// Records a new data record at sorted `slot`.
    fn insert_entry(&mut self, slot: usize, position: usize, start: u64, end: u64) {
        self.positions.insert(slot, position);
        self.bounds.splice(slot * 2..slot * 2, [start, end]);
    }
}

#[cfg(test)]
mod tests;
