//! Gap detection and gap filling.
//!
//! A chunk written into a gap needs an extension record whose 64 KiB window
//! holds the chunk's address. The candidates are tried in this order:
//!
//! ```text
//! 1. lower's extension      insert right after lower
//!    (no lower, addr <= 0xFFFF: insert at the head, unextended)
//! 2. upper's extension      insert right after that extension record
//! 3. a new extension        spliced after lower (or at the head); the new
//!                           data record follows it
//! ```
//!
//! A new extension changes the offset of every record after it up to the
//! next extension record. If any data record sits in that run, a copy of the
//! extension that governed it is put back after the new chunk.

use record::{
    contribution, extension_payload, AddressError, Document, HexFormat, Record, RecordKind,
    LOCAL_ADDRESS_MAX,
};
use tracing::debug;

use crate::{Entry, IndexError, SparseIndex};

/// An address range covered by no data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    /// Nearest record ending before the gap.
    pub lower: Option<Entry>,
    /// Nearest record starting after the gap.
    pub upper: Option<Entry>,
    /// Bytes from the probed address up to `upper`; `None` when nothing
    /// follows, i.e. the gap is unbounded.
    pub size: Option<u64>,
}

/// Where the next chunk goes and which extension governs it.
struct Placement {
    position: usize,
    extension: Option<usize>,
    offset: u64,
    local: u16,
}

/// Local address of `address` under `offset`, if it fits a record.
fn local_in(offset: u64, address: u64) -> Option<u16> {
    address
        .checked_sub(offset)
        .and_then(|d| u16::try_from(d).ok())
}

impl SparseIndex {
    /// Describes the gap holding `address`, or `None` if a record covers it.
    #[must_use]
    pub fn locate_gap(&self, address: u64) -> Option<Gap> {
        if self.find_slot(address).is_some() {
            return None;
        }
        let upper_slot = self.first_start_after(address);
        let lower = if self.overlapping {
            self.entries().take(upper_slot).max_by_key(|e| e.end)
        } else {
            upper_slot.checked_sub(1).and_then(|slot| self.entry(slot))
        };
        let upper = self.entry(upper_slot);
        // Not covered, so lower.end < address and the lower bound is address.
        let size = upper.map(|u| u.start - address);
        Some(Gap { lower, upper, size })
    }

    /// Fills the gap at `address` with bytes from `source[offset..]`, split
    /// into data records of at most `max_record_len` bytes.
    ///
    /// Both `doc` and the index are updated, so the index stays valid.
    /// Returns the number of bytes placed, which stops at the end of the
    /// source or at the next record, whichever comes first.
    ///
    /// A chunk that needs a new extension record usually adds exactly one.
    /// When that record lands in front of data records still governed by an
    /// earlier extension, a copy of the earlier one (or a zero-offset record
    /// when there is none) follows the chunk. One fill then adds two
    /// extension records, and the serialized document keeps every existing
    /// record at its address.
    ///
    /// # Errors
    ///
    /// - [`IndexError::NotAGap`] if `address` is already covered.
    /// - [`IndexError::StalePosition`] if the index no longer matches `doc`.
    /// - [`IndexError::Address`] if a new extension cannot express the
    ///   needed offset. Chunks placed before the failure stay in `doc`.
    pub fn insert_into_gap(
        &mut self,
        doc: &mut Document,
        address: u64,
        source: &[u8],
        offset: usize,
        max_record_len: u8,
    ) -> Result<usize, IndexError> {
        let first = self.locate_gap(address).ok_or(IndexError::NotAGap(address))?;
        let source = source.get(offset..).unwrap_or_default();
        let budget = first
            .size
            .map_or(source.len() as u64, |size| size.min(source.len() as u64));
        if max_record_len == 0 {
            return Ok(0);
        }

        let mut written = 0u64;
        while written < budget {
            let cursor = address + written;
            let Some(gap) = self.locate_gap(cursor) else {
                break;
            };
            let placement = self.place(doc, cursor, &gap)?;

            let window_left = placement.offset + LOCAL_ADDRESS_MAX + 1 - cursor;
            let len = (budget - written)
                .min(window_left)
                .min(u64::from(max_record_len));
            let from = written as usize;
            let bytes = source[from..from + len as usize].to_vec();

            let slot = self.first_start_after(cursor);
            let pos = doc.insert(
                placement.position,
                Record::data(placement.local, bytes, placement.extension),
            );
            self.shift_positions(pos);
            self.insert_entry(slot, pos, cursor, cursor + len - 1);
            written += len;
        }
        Ok(written as usize)
    }

    /// Picks the extension for a chunk at `address`, synthesizing one if
    /// neither neighbour's extension reaches it.
    fn place(
        &mut self,
        doc: &mut Document,
        address: u64,
        gap: &Gap,
    ) -> Result<Placement, IndexError> {
        match gap.lower {
            Some(lower) => {
                let extension = linked(doc, lower.position)?;
                let offset = doc.extension_offset(lower.position)?;
                if let Some(local) = local_in(offset, address) {
                    return Ok(Placement {
                        position: lower.position + 1,
                        extension,
                        offset,
                        local,
                    });
                }
            }
            None => {
                if let Some(local) = local_in(0, address) {
                    return Ok(Placement {
                        position: 0,
                        extension: None,
                        offset: 0,
                        local,
                    });
                }
            }
        }

        if let Some(upper) = gap.upper {
            let extension = linked(doc, upper.position)?;
            let offset = doc.extension_offset(upper.position)?;
            if let Some(local) = local_in(offset, address) {
                return Ok(Placement {
                    position: extension.map_or(0, |e| e + 1),
                    extension,
                    offset,
                    local,
                });
            }
        }

        self.synthesize_extension(doc, address, gap.lower.map(|l| l.position))
    }

    /// Splices a new extension record covering `address` after `after` (or
    /// at the head) and returns the placement right behind it.
    fn synthesize_extension(
        &mut self,
        doc: &mut Document,
        address: u64,
        after: Option<usize>,
    ) -> Result<Placement, IndexError> {
        let kind = doc
            .first_extension_kind()
            .or_else(|| doc.format().extension_kind())
            .unwrap_or(RecordKind::ExtensionLinear);
        let payload = extension_payload(kind, address)?;
        let offset = contribution(kind, &payload)?;
        let local =
            local_in(offset, address).ok_or(AddressError::AddressOutOfRange { kind, address })?;

        let at = after.map_or(0, |p| p + 1);
        let previous = doc.extension_before(at);
        let pos = doc.insert(at, Record::new(kind, 0, payload, previous));
        self.shift_positions(pos);
        if doc.format() == HexFormat::I8Hex {
            doc.set_format(HexFormat::classify(kind));
        }
        debug!(?kind, offset, position = pos, "synthesized extension record");

        self.reanchor(doc, pos, previous, kind);
        Ok(Placement {
            position: pos + 1,
            extension: Some(pos),
            offset,
            local,
        })
    }

    /// Puts the extension that governed the records after `ext_pos` back in
    /// front of them, so serialized order resolves them as before.
    fn reanchor(
        &mut self,
        doc: &mut Document,
        ext_pos: usize,
        previous: Option<usize>,
        kind: RecordKind,
    ) {
        let tail = &doc.records()[ext_pos + 1..];
        let run = tail
            .iter()
            .position(|r| r.kind.is_extension())
            .unwrap_or(tail.len());
        if !tail[..run].iter().any(Record::is_data) {
            return;
        }

        let anchor = match previous.and_then(|p| doc.get(p)) {
            Some(prev) => Record::new(prev.kind, prev.address, prev.payload.clone(), Some(ext_pos)),
            None => Record::new(kind, 0, vec![0, 0], Some(ext_pos)),
        };
        let at = doc.insert(ext_pos + 1, anchor);
        self.shift_positions(at);
        for r in &mut doc.records_mut()[at + 1..at + 1 + run] {
            r.extension = Some(at);
        }
        debug!(position = at, records = run, "re-anchored records behind new extension");
    }
}

/// Extension link of the data record at `pos`.
fn linked(doc: &Document, pos: usize) -> Result<Option<usize>, IndexError> {
    doc.get(pos)
        .filter(|r| r.is_data())
        .map(|r| r.extension)
        .ok_or(IndexError::StalePosition(pos))
}
