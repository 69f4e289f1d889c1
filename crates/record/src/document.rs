//! Ordered record sequence, the source of truth for a hex image.
//!
//! Order matters twice: it is the serialization order, and it decides which
//! extension record governs each record (the nearest earlier one). Links are
//! stored as positions, so every splice goes through [`Document::insert`],
//! which shifts the links that point at or past the insertion point.

use crate::address::{contribution, AddressError};
use crate::{HexFormat, Record, RecordKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    records: Vec<Record>,
    format: HexFormat,
}

impl Document {
    /// Creates an empty document of the given address family.
    #[must_use]
    pub fn new(format: HexFormat) -> Self {
        Self {
            records: Vec::new(),
            format,
        }
    }

    /// Wraps records whose `extension` links are already consistent.
    ///
    /// Use [`relink`](Document::relink) if they are not.
    #[must_use]
    pub fn from_records(records: Vec<Record>, format: HexFormat) -> Self {
        Self { records, format }
    }

    #[must_use]
    pub fn format(&self) -> HexFormat {
        self.format
    }

    pub fn set_format(&mut self, format: HexFormat) {
        self.format = format;
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Direct access for caller edits. Any cached index over this document
    /// must be rebuilt afterwards.
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&Record> {
        self.records.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut Record> {
        self.records.get_mut(pos)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Appends `record` as-is; its link is not touched.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Splices `record` in at `pos` (clamped to the end).
    ///
    /// Existing links at or past `pos` move up by one so they keep pointing
    /// at the same extension record. The inserted record's own link must
    /// already refer to a position before `pos`.
    pub fn insert(&mut self, pos: usize, record: Record) -> usize {
        let pos = pos.min(self.records.len());
        for r in &mut self.records {
            if let Some(link) = r.extension.as_mut() {
                if *link >= pos {
                    *link += 1;
                }
            }
        }
        self.records.insert(pos, record);
        pos
    }

    /// Position of `record`'s extension when it really is one.
    fn linked_extension(&self, record: &Record) -> Result<Option<&Record>, AddressError> {
        match record.extension {
            None => Ok(None),
            Some(pos) => match self.records.get(pos) {
                Some(ext) if ext.kind.is_extension() => Ok(Some(ext)),
                _ => Err(AddressError::DanglingExtension(pos)),
            },
        }
    }

    /// Offset contributed to `record` by its linked extension (0 without one).
    ///
    /// # Errors
    ///
    /// [`AddressError::DanglingExtension`] if the link does not resolve to an
    /// extension record, [`AddressError::MalformedExtension`] if that record's
    /// payload is not two bytes.
    pub fn link_offset(&self, record: &Record) -> Result<u64, AddressError> {
        match self.linked_extension(record)? {
            Some(ext) => contribution(ext.kind, &ext.payload),
            None => Ok(0),
        }
    }

    /// Offset in effect for the record at `pos`: its own contribution for an
    /// extension record, its linked extension's contribution otherwise.
    ///
    /// # Errors
    ///
    /// [`AddressError::DanglingExtension`] if `pos` is out of range or the
    /// link does not resolve.
    pub fn extension_offset(&self, pos: usize) -> Result<u64, AddressError> {
        let record = self
            .records
            .get(pos)
            .ok_or(AddressError::DanglingExtension(pos))?;
        if record.kind.is_extension() {
            contribution(record.kind, &record.payload)
        } else {
            self.link_offset(record)
        }
    }

    /// Absolute address of the first payload byte of `record`.
    ///
    /// # Errors
    ///
    /// Same as [`link_offset`](Document::link_offset), plus
    /// [`AddressError::AddressOutOfRange`] if the sum does not fit a `u64`.
    pub fn absolute_address(&self, record: &Record) -> Result<u64, AddressError> {
        let offset = self.link_offset(record)?;
        offset
            .checked_add(u64::from(record.address))
            .ok_or(AddressError::AddressOutOfRange {
                kind: record.kind,
                address: offset,
            })
    }

    /// Whether data record `record` holds a byte for `address`.
    #[must_use]
    pub fn contains(&self, record: &Record, address: u64) -> bool {
        if !record.is_data() {
            return false;
        }
        match self.absolute_address(record) {
            Ok(start) => start <= address && address - start < record.len() as u64,
            Err(_) => false,
        }
    }

    /// Kind of the first extension record in document order.
    #[must_use]
    pub fn first_extension_kind(&self) -> Option<RecordKind> {
        self.records
            .iter()
            .map(|r| r.kind)
            .find(RecordKind::is_extension)
    }

    /// Position of the nearest extension record strictly before `pos`.
    #[must_use]
    pub fn extension_before(&self, pos: usize) -> Option<usize> {
        let end = pos.min(self.records.len());
        self.records[..end]
            .iter()
            .rposition(|r| r.kind.is_extension())
    }

    /// Recomputes every link from document order, the way parsing assigns
    /// them. Use after reordering or removing records directly.
    pub fn relink(&mut self) {
        let mut latest = None;
        for (pos, r) in self.records.iter_mut().enumerate() {
            r.extension = latest;
            if r.kind.is_extension() {
                latest = Some(pos);
            }
        }
    }

    /// Positions of all data records, in document order.
    pub fn data_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_data())
            .map(|(pos, _)| pos)
    }
}
