/// Linear extension 0, 32 bytes at 0x00..0x1F in four records, EOF.
pub const FILE_A: &str = "\
:020000040000FA
:080000001234567812345678D0
:080008001234567812345678C8
:080010001234567812345678C0
:080018001234567812345678B8
:00000001FF
";

/// 40 bytes at 0x1_FFD8..0x1_FFFF and 40 bytes at 0x3_0000..0x3_0027,
/// with the whole 0x2_xxxx window empty.
pub const FILE_B: &str = "\
:020000040001F9
:08FFD8001234567812345678F9
:08FFE0001234567812345678F1
:08FFE8001234567812345678E9
:08FFF0001234567812345678E1
:08FFF8001234567812345678D9
:020000040003F7
:080000001234567812345678D0
:080008001234567812345678C8
:080010001234567812345678C0
:080018001234567812345678B8
:080020001234567812345678B0
:00000001FF
";

/// The repeating payload of both files.
pub const PATTERN: [u8; 4] = [0x12, 0x34, 0x56, 0x78];

/// Collects every `(line, raw, message)` handed to a sink.
#[derive(Debug, Default)]
pub struct Collected(pub Vec<(u64, String, String)>);

impl record::DiagnosticSink for Collected {
    fn log(&mut self, line: u64, raw: &str, message: &str) {
        self.0.push((line, raw.to_string(), message.to_string()));
    }
}

pub fn count_kind(space: &crate::ByteSpace, kind: crate::RecordKind) -> usize {
    space.document().iter().filter(|r| r.kind == kind).count()
}
