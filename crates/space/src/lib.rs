//! # Space - a sparse byte space backed by a hex document
//!
//! [`ByteSpace`] ties the [`record`] model and the [`sparse`] index together
//! into the user-facing API: parse a hex image, read and write bytes by
//! absolute address, iterate the defined bytes, and write the image back.
//!
//! ## Architecture
//!
//! ```text
//!  text / file
//!      |
//!      v
//!  parse.rs ──► Document (records, in file order)  ◄── source of truth
//!                  |
//!                  |  built lazily, cached
//!                  v
//!              SparseIndex  ◄── read.rs   read_bytes()
//!                  |        ◄── write.rs  update_bytes() → overwrite / insert_into_gap
//!                  |        ◄── iter.rs   defined_bytes(), cursor()
//!                  v
//!  write.rs ──► serialize() / write_to() / save()
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                   |
//! |-------------|-----------------------------------------------------------|
//! | [`lib.rs`]  | `ByteSpace`, constructors, accessors, index control, `Debug` |
//! | [`parse`]   | `parse()`, `parse_with()`, `from_reader()`, `load()`         |
//! | [`read`]    | `read_bytes()`, `find_record()`, `is_defined()`              |
//! | [`write`]   | `update_bytes()`, `serialize()`, `write_to()`, `save()`      |
//! | [`iter`]    | `DefinedBytes`, `ByteCursor`                                 |
//!
//! ## Index Cache
//!
//! The index is a cache over the document. Reads and writes build it on first
//! use and keep it in step with their own changes. Edits made through
//! [`ByteSpace::document_mut`] do not touch it: call
//! [`ByteSpace::refresh_index`] (or [`ByteSpace::invalidate_index`]) after
//! them, or lookups run against the old layout.
//!
//! ## Example
//!
//! ```
//! use space::ByteSpace;
//!
//! let mut image = ByteSpace::parse(":020000040001F9\n:0400100001020304E2\n:00000001FF\n");
//! assert_eq!(image.read_bytes(0x1_0010, 5).unwrap(), vec![1, 2, 3, 4, 0]);
//!
//! image.update_bytes(0x1_0014, &[5, 6]).unwrap();
//! assert_eq!(image.read_bytes(0x1_0010, 6).unwrap(), vec![1, 2, 3, 4, 5, 6]);
//! ```
mod error;
mod iter;
mod parse;
mod read;
mod write;

pub use config::{LineTerminator, SpaceConfig};
pub use error::SpaceError;
pub use iter::{ByteCursor, DefinedBytes};
pub use record::{
    DiagnosticSink, Discard, Document, HexFormat, Record, RecordKind, StartAddress, TracingSink,
};
pub use sparse::{Entry, Gap, SparseIndex};

/// A sparse, byte-addressable view of one hex document.
///
/// Unprogrammed addresses read as `0x00`. Writes overwrite covered bytes in
/// place and fill gaps with new records of at most
/// [`SpaceConfig::max_record_len`] bytes.
///
/// Not thread-safe by design of its API: every mutating call takes
/// `&mut self`.
pub struct ByteSpace {
    pub(crate) document: Document,
    pub(crate) index: Option<SparseIndex>,
    pub(crate) config: SpaceConfig,
}

impl std::fmt::Debug for ByteSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSpace")
            .field("format", &self.document.format())
            .field("records", &self.document.len())
            .field("indexed", &self.index.as_ref().map(SparseIndex::len))
            .field("max_record_len", &self.config.max_record_len)
            .field("line_terminator", &self.config.line_terminator)
            .finish()
    }
}

impl Default for ByteSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSpace {
    /// Creates an empty 32-bit (linear extension) space.
    #[must_use]
    pub fn new() -> Self {
        Self::with_format(HexFormat::I32Hex)
    }

    /// Creates an empty space of the given address family.
    #[must_use]
    pub fn with_format(format: HexFormat) -> Self {
        Self::from_document(Document::new(format))
    }

    /// Wraps an existing document. Its links must already be consistent;
    /// see [`Document::relink`].
    #[must_use]
    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            index: None,
            config: SpaceConfig::default(),
        }
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// [`SpaceError::Config`] if `config` fails validation.
    pub fn with_config(mut self, config: SpaceConfig) -> Result<Self, SpaceError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Hands out the document for direct edits. The cached index is left as
    /// it is; refresh it afterwards.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Consumes the space, returning its document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    #[must_use]
    pub fn format(&self) -> HexFormat {
        self.document.format()
    }

    #[must_use]
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// The cached index, if one has been built.
    #[must_use]
    pub fn index(&self) -> Option<&SparseIndex> {
        self.index.as_ref()
    }

    /// Rebuilds the index from the current document.
    ///
    /// # Errors
    ///
    /// [`SpaceError::Address`] if a data record's extension link does not
    /// resolve. The previous index is dropped either way.
    pub fn refresh_index(&mut self) -> Result<&SparseIndex, SpaceError> {
        self.index = None;
        let index = SparseIndex::build(&self.document)?;
        Ok(self.index.insert(index))
    }

    /// Drops the cached index; the next read or write rebuilds it.
    pub fn invalidate_index(&mut self) {
        self.index = None;
    }

    /// The index (built if missing) alongside the document it describes.
    pub(crate) fn indexed(&mut self) -> Result<(&mut SparseIndex, &mut Document), SpaceError> {
        let index = match self.index.take() {
            Some(index) => index,
            None => SparseIndex::build(&self.document)?,
        };
        Ok((self.index.insert(index), &mut self.document))
    }
}

#[cfg(test)]
mod tests;
