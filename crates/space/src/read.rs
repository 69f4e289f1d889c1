/// Read path: read_bytes(), find_record(), is_defined().
///
/// `read_bytes` goes through the cached index and jumps over gaps in one
/// step. `find_record` is the index-free first-match scan in document order,
/// useful right after direct document edits.

use record::Record;

use crate::{ByteSpace, SpaceError};

impl ByteSpace {
    /// Reads `count` bytes starting at `address`.
    ///
    /// Addresses covered by no data record read as `0x00`. Builds the index
    /// on first use.
    ///
    /// # Errors
    ///
    /// [`SpaceError::NegativeAddress`] / [`SpaceError::NegativeLength`] for
    /// negative arguments, [`SpaceError::Address`] if the index cannot be
    /// built.
    pub fn read_bytes(&mut self, address: i64, count: i64) -> Result<Vec<u8>, SpaceError> {
        let start = u64::try_from(address).map_err(|_| SpaceError::NegativeAddress(address))?;
        let count = usize::try_from(count).map_err(|_| SpaceError::NegativeLength(count))?;
        let (index, doc) = self.indexed()?;

        let mut out = vec![0u8; count];
        let mut done = 0;
        while done < count {
            let at = start + done as u64;
            let hit = index.find_enclosing(at).and_then(|entry| {
                doc.get(entry.position)
                    .filter(|r| r.is_data())
                    .map(|r| (entry, r))
            });
            match hit {
                Some((entry, record)) => {
                    let n = record.read_into((at - entry.start) as usize, &mut out[done..]);
                    done += n.max(1);
                }
                None => {
                    let rest = (count - done) as u64;
                    // A missing record behind a stale slot skips one byte.
                    let skip = match index.locate_gap(at) {
                        Some(gap) => gap.size.map_or(rest, |size| size.min(rest)),
                        None => 1,
                    };
                    done += skip as usize;
                }
            }
        }
        Ok(out)
    }

    /// First data record in document order holding `address`.
    ///
    /// Scans the whole document and ignores the index, so it is always in
    /// step with direct edits.
    #[must_use]
    pub fn find_record(&self, address: u64) -> Option<&Record> {
        self.document
            .iter()
            .find(|r| self.document.contains(r, address))
    }

    /// Whether any data record holds `address`.
    #[must_use]
    pub fn is_defined(&self, address: u64) -> bool {
        self.find_record(address).is_some()
    }
}
