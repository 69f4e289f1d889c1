mod gap_tests;

use record::{Document, HexFormat, Record, RecordKind};

pub(crate) fn linear(value: u16) -> Record {
    Record::new(RecordKind::ExtensionLinear, 0, value.to_be_bytes().to_vec(), None)
}

pub(crate) fn filled(address: u16, len: usize, extension: Option<usize>) -> Record {
    Record::data(address, (0..len).map(|i| i as u8).collect(), extension)
}

/// ext 0, four 8-byte records at 0x00..0x1F, EOF.
pub(crate) fn contiguous() -> Document {
    let mut doc = Document::new(HexFormat::I32Hex);
    doc.push(linear(0));
    for i in 0..4u16 {
        doc.push(filled(i * 8, 8, Some(0)));
    }
    doc.push(Record::end_of_file());
    doc.relink();
    doc
}

/// Records at 0x1_0010..0x1_001F and 0x1_0040..0x1_004F under one linear
/// extension, with a gap between them.
pub(crate) fn split() -> Document {
    let mut doc = Document::new(HexFormat::I32Hex);
    doc.push(linear(1));
    doc.push(filled(0x0010, 16, None));
    doc.push(filled(0x0040, 16, None));
    doc.push(Record::end_of_file());
    doc.relink();
    doc
}
