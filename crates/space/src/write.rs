/// Write path: update_bytes() and serialization.
///
/// `update_bytes` walks the input once. Covered runs are overwritten in
/// place (each touched record gets a fresh length and checksum); uncovered
/// runs go to `SparseIndex::insert_into_gap`, which keeps the cached index
/// in step. Saving writes to a temp file, fsyncs it, then renames it over
/// the target.

use std::ffi::OsString;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigError, LineTerminator};
use record::serialize_line;
use tracing::debug;

use crate::{ByteSpace, SpaceError};

impl ByteSpace {
    /// Writes `bytes` at `address`, overwriting covered bytes and filling
    /// gaps with new records.
    ///
    /// Afterwards `read_bytes(address, bytes.len())` returns `bytes`.
    ///
    /// # Errors
    ///
    /// - [`SpaceError::NegativeAddress`] before anything is changed.
    /// - [`SpaceError::StaleIndex`] if the cached index points at records
    ///   that are gone.
    /// - [`SpaceError::Address`] if a gap needs an extension offset the
    ///   document's extension kind cannot express. Bytes written before
    ///   that point stay written.
    pub fn update_bytes(&mut self, address: i64, bytes: &[u8]) -> Result<(), SpaceError> {
        let start = u64::try_from(address).map_err(|_| SpaceError::NegativeAddress(address))?;
        let max_record_len = self.config.max_record_len;
        let (index, doc) = self.indexed()?;

        let records_before = doc.len();
        let mut done = 0;
        while done < bytes.len() {
            let at = start + done as u64;
            match index.find_enclosing(at) {
                Some(entry) => {
                    let record = doc
                        .get_mut(entry.position)
                        .filter(|r| r.is_data())
                        .ok_or(SpaceError::StaleIndex(entry.position))?;
                    let n = record.overwrite((at - entry.start) as usize, &bytes[done..]);
                    if n == 0 {
                        return Err(SpaceError::StaleIndex(entry.position));
                    }
                    done += n;
                }
                None => {
                    let n = index.insert_into_gap(doc, at, bytes, done, max_record_len)?;
                    if n == 0 {
                        return Err(ConfigError::ZeroRecordLen.into());
                    }
                    done += n;
                }
            }
        }
        debug!(
            address = start,
            len = bytes.len(),
            new_records = doc.len() - records_before,
            "updated bytes"
        );
        Ok(())
    }

    /// One line per record in document order, each followed by
    /// `terminator`.
    #[must_use]
    pub fn serialize(&self, terminator: LineTerminator) -> String {
        let mut out = String::new();
        for record in self.document.iter() {
            out.push_str(&serialize_line(record));
            out.push_str(terminator.as_str());
        }
        out
    }

    /// [`serialize`](ByteSpace::serialize) with the configured terminator.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        self.serialize(self.config.line_terminator)
    }

    /// Streams the serialized document into `out`.
    ///
    /// # Errors
    ///
    /// [`SpaceError::Io`] on any write failure.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), SpaceError> {
        let terminator = self.config.line_terminator.as_str();
        for record in self.document.iter() {
            out.write_all(serialize_line(record).as_bytes())?;
            out.write_all(terminator.as_bytes())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Saves the document to `path` atomically.
    ///
    /// # Crash Safety
    ///
    /// Writes to `<path>.tmp`, calls `sync_all()`, then renames over `path`.
    /// A crash mid-write leaves the old file untouched.
    ///
    /// # Errors
    ///
    /// Returns an error on any I/O failure; the temp file is removed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = tmp_path_for(path);

        let result = self.save_via(path, &tmp_path);
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        result
    }

    fn save_via(&self, path: &Path, tmp_path: &Path) -> Result<()> {
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        let mut file = BufWriter::new(raw_file);
        self.write_to(&mut file)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        file.into_inner()?.sync_all()?;

        rename(tmp_path, path)
            .with_context(|| format!("failed to rename into {}", path.display()))?;

        // Best effort: make the rename itself durable.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

/// `image.hex` -> `image.hex.tmp`, next to the target.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
