use std::fmt;

use crate::RecordKind;

/// Address width family of a document, decided by the extension and start
/// kinds it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HexFormat {
    /// Data and end-of-file only; 16-bit addresses.
    I8Hex,
    /// Segment extension / start segment records.
    I16Hex,
    /// Linear extension / start linear records.
    #[default]
    I32Hex,
}

impl HexFormat {
    /// Family implied by a single record kind. Kinds that say nothing about
    /// addressing (data, end of file) map to [`HexFormat::I8Hex`].
    #[must_use]
    pub fn classify(kind: RecordKind) -> Self {
        match kind {
            RecordKind::ExtensionLinear | RecordKind::StartLinearAddress => HexFormat::I32Hex,
            RecordKind::ExtensionSegment | RecordKind::StartSegmentAddress => HexFormat::I16Hex,
            RecordKind::Data | RecordKind::EndOfFile => HexFormat::I8Hex,
        }
    }

    /// Extension kind this family writes, if it has one.
    #[must_use]
    pub fn extension_kind(&self) -> Option<RecordKind> {
        match self {
            HexFormat::I8Hex => None,
            HexFormat::I16Hex => Some(RecordKind::ExtensionSegment),
            HexFormat::I32Hex => Some(RecordKind::ExtensionLinear),
        }
    }
}

impl fmt::Display for HexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HexFormat::I8Hex => "I8HEX",
            HexFormat::I16Hex => "I16HEX",
            HexFormat::I32Hex => "I32HEX",
        };
        f.write_str(name)
    }
}
