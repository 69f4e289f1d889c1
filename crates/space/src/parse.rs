//! Text to document.
//!
//! Input is read one physical line at a time, and every line is split on the
//! `:` marker, so several records glued onto one line all survive. Bad
//! records are reported to the sink and left out; parsing itself never
//! fails.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use record::{parse_line, DiagnosticSink, Discard, Document, HexFormat, Record, TracingSink, RECORD_MARK};
use tracing::debug;

use crate::{ByteSpace, SpaceError};

/// Accumulates records across lines.
struct Parser<'a> {
    sink: &'a mut dyn DiagnosticSink,
    records: Vec<Record>,
    /// Position of the latest extension record.
    latest: Option<usize>,
    format: HexFormat,
    dropped: usize,
}

impl<'a> Parser<'a> {
    fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            sink,
            records: Vec::new(),
            latest: None,
            format: HexFormat::I8Hex,
            dropped: 0,
        }
    }

    fn line(&mut self, number: u64, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        for (i, piece) in raw.split(RECORD_MARK).enumerate() {
            let candidate = if i == 0 {
                // Text before the first marker: a record missing its ':'.
                if piece.trim().is_empty() {
                    continue;
                }
                Cow::Borrowed(piece)
            } else {
                Cow::Owned(format!("{RECORD_MARK}{piece}"))
            };
            match parse_line(number, &candidate, self.latest, &mut *self.sink) {
                Some(record) => self.push(number, raw, record),
                None => self.dropped += 1,
            }
        }
    }

    fn push(&mut self, number: u64, raw: &str, record: Record) {
        let implied = HexFormat::classify(record.kind);
        if implied != HexFormat::I8Hex {
            if self.format == HexFormat::I8Hex {
                self.format = implied;
            } else if implied != self.format {
                let message = format!(
                    "document looks like {} but this record belongs to {}",
                    self.format, implied
                );
                self.sink.log(number, raw, &message);
            }
        }
        if record.kind.is_extension() {
            self.latest = Some(self.records.len());
        }
        self.records.push(record);
    }

    fn finish(self) -> ByteSpace {
        debug!(
            records = self.records.len(),
            dropped = self.dropped,
            format = %self.format,
            "parsed hex document"
        );
        ByteSpace::from_document(Document::from_records(self.records, self.format))
    }
}

impl ByteSpace {
    /// Parses hex text, silently dropping records that cannot be decoded.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, &mut Discard)
    }

    /// Parses hex text, reporting every repaired or dropped record to `sink`.
    ///
    /// The format is taken from the first record that implies one; records
    /// implying a different family later on are kept and reported.
    pub fn parse_with(text: &str, sink: &mut dyn DiagnosticSink) -> Self {
        let mut parser = Parser::new(sink);
        for (i, line) in text.lines().enumerate() {
            parser.line(i as u64 + 1, line);
        }
        parser.finish()
    }

    /// Parses hex text from a buffered reader.
    ///
    /// # Errors
    ///
    /// [`SpaceError::Io`] if reading fails. Malformed records are not
    /// errors; they go to `sink`.
    pub fn from_reader<R: BufRead>(
        reader: R,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self, SpaceError> {
        let mut parser = Parser::new(sink);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            parser.line(i as u64 + 1, &line);
        }
        Ok(parser.finish())
    }

    /// Loads a hex file, forwarding parse diagnostics to `tracing`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open hex file {}", path.display()))?;
        Self::from_reader(BufReader::new(file), &mut TracingSink)
            .with_context(|| format!("failed to read hex file {}", path.display()))
    }
}
