//! Walking the defined bytes in address order.
//!
//! Both walkers follow the index's sorted slots, byte by byte within each
//! record. Overlapping records are not merged: an address held by two
//! records is visited twice, once per record.

use std::borrow::Cow;

use record::{Document, Record};
use sparse::{Entry, SparseIndex};

use crate::{ByteSpace, SpaceError};

/// Byte at `offset` of the record behind `entry`, if the record is still
/// there and that long.
fn byte_at(doc: &Document, entry: Entry, offset: usize) -> Option<u8> {
    doc.get(entry.position)
        .filter(|r| r.is_data())
        .and_then(|r| r.payload.get(offset).copied())
}

/// Iterator over `(absolute address, byte)` for every defined byte.
///
/// Created by [`ByteSpace::defined_bytes`].
#[derive(Debug, Clone)]
pub struct DefinedBytes<'a> {
    document: &'a Document,
    index: Cow<'a, SparseIndex>,
    slot: usize,
    offset: usize,
}

impl Iterator for DefinedBytes<'_> {
    type Item = (u64, u8);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.index.entry(self.slot)?;
            if let Some(byte) = byte_at(self.document, entry, self.offset) {
                let address = entry.start + self.offset as u64;
                self.offset += 1;
                return Some((address, byte));
            }
            self.slot += 1;
            self.offset = 0;
        }
    }
}

/// A position over the defined bytes that can also change them.
///
/// [`set`](ByteCursor::set) replaces the byte but leaves the record's
/// checksum as it was; call [`Record::update_metadata`] (or write through
/// [`ByteSpace::update_bytes`]) to make the record valid again.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    document: &'a mut Document,
    index: &'a SparseIndex,
    slot: usize,
    offset: usize,
}

impl ByteCursor<'_> {
    /// Address and value under the cursor, `None` once exhausted.
    #[must_use]
    pub fn current(&self) -> Option<(u64, u8)> {
        let entry = self.index.entry(self.slot)?;
        byte_at(self.document, entry, self.offset).map(|b| (entry.start + self.offset as u64, b))
    }

    /// Moves to the next defined byte. Returns `false` when there is none.
    pub fn advance(&mut self) -> bool {
        self.offset += 1;
        self.settle()
    }

    /// Overwrites the byte under the cursor without touching the record's
    /// length or checksum. Returns `false` when the cursor is exhausted.
    pub fn set(&mut self, value: u8) -> bool {
        let Some(entry) = self.index.entry(self.slot) else {
            return false;
        };
        match self
            .document
            .get_mut(entry.position)
            .filter(|r| r.is_data())
            .and_then(|r| r.payload.get_mut(self.offset))
        {
            Some(byte) => {
                *byte = value;
                true
            }
            None => false,
        }
    }

    /// The record under the cursor.
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        let entry = self.index.entry(self.slot)?;
        self.document.get(entry.position)
    }

    /// Skips forward past slots with no byte at the current offset.
    fn settle(&mut self) -> bool {
        while let Some(entry) = self.index.entry(self.slot) {
            if byte_at(self.document, entry, self.offset).is_some() {
                return true;
            }
            self.slot += 1;
            self.offset = 0;
        }
        false
    }
}

impl ByteSpace {
    /// Iterates every defined byte in ascending start order of the records.
    ///
    /// Uses the cached index when there is one and builds a private copy
    /// otherwise; the cache is not filled. Call again to restart.
    ///
    /// # Errors
    ///
    /// [`SpaceError::Address`] if the index has to be built and cannot be.
    pub fn defined_bytes(&self) -> Result<DefinedBytes<'_>, SpaceError> {
        let index = match &self.index {
            Some(index) => Cow::Borrowed(index),
            None => Cow::Owned(SparseIndex::build(&self.document)?),
        };
        Ok(DefinedBytes {
            document: &self.document,
            index,
            slot: 0,
            offset: 0,
        })
    }

    /// A cursor on the lowest defined byte. Builds the index if missing.
    ///
    /// # Errors
    ///
    /// [`SpaceError::Address`] if the index cannot be built.
    pub fn cursor(&mut self) -> Result<ByteCursor<'_>, SpaceError> {
        let (index, document) = self.indexed()?;
        let mut cursor = ByteCursor {
            document,
            index,
            slot: 0,
            offset: 0,
        };
        cursor.settle();
        Ok(cursor)
    }
}
