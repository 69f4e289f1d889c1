//! # Config - ByteSpace tuning knobs
//!
//! Settings shared by the [`sparse`] index and the [`space`] facade:
//! how long a synthesized data record may get, and which line terminator
//! serialization uses when the caller does not pick one.
//!
//! ## Environment
//!
//! ```text
//! HEXSPACE_RECORD_LEN   max payload bytes per new record (default: 32, 1..=255)
//! HEXSPACE_LINE_ENDING  "lf" or "crlf"                   (default: "lf")
//! ```
//!
//! Unparseable or out-of-range values fall back to the default.
//!
//! [`sparse`]: ../sparse/index.html
//! [`space`]: ../space/index.html

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Payload length of 16 bytes per record.
pub const RECORD_LEN_16: u8 = 0x10;
/// Payload length of 32 bytes per record (the default).
pub const RECORD_LEN_32: u8 = 0x20;
/// Largest payload a single record can declare.
pub const RECORD_LEN_MAX: u8 = 0xFF;

/// Environment variable overriding [`SpaceConfig::max_record_len`].
pub const ENV_RECORD_LEN: &str = "HEXSPACE_RECORD_LEN";
/// Environment variable overriding [`SpaceConfig::line_terminator`].
pub const ENV_LINE_ENDING: &str = "HEXSPACE_LINE_ENDING";

/// Errors reported by [`SpaceConfig::validate`] and the parsers in this crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A zero record length would never make progress across a gap.
    #[error("max_record_len must be at least 1")]
    ZeroRecordLen,

    #[error("unknown line ending '{0}' (expected lf or crlf)")]
    UnknownLineEnding(String),
}

/// Line terminator appended after every serialized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    #[default]
    Lf,
    CrLf,
}

impl LineTerminator {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Lf => "\n",
            LineTerminator::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineTerminator::Lf => f.write_str("lf"),
            LineTerminator::CrLf => f.write_str("crlf"),
        }
    }
}

impl FromStr for LineTerminator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lf" | "\n" => Ok(LineTerminator::Lf),
            "crlf" | "\r\n" => Ok(LineTerminator::CrLf),
            other => Err(ConfigError::UnknownLineEnding(other.to_string())),
        }
    }
}

/// Tuning for a single `ByteSpace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceConfig {
    /// Upper bound on the payload of every data record created while
    /// filling a gap. Existing records are never re-chunked.
    pub max_record_len: u8,
    /// Terminator used by `ByteSpace::to_hex_string` and `write_to`.
    pub line_terminator: LineTerminator,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            max_record_len: RECORD_LEN_32,
            line_terminator: LineTerminator::Lf,
        }
    }
}

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl SpaceConfig {
    /// Builds a config from `HEXSPACE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_record_len = env_or(ENV_RECORD_LEN, "")
            .parse::<u8>()
            .ok()
            .filter(|len| *len > 0)
            .unwrap_or(defaults.max_record_len);
        let line_terminator = env_or(ENV_LINE_ENDING, "lf")
            .parse()
            .unwrap_or(defaults.line_terminator);

        Self {
            max_record_len,
            line_terminator,
        }
    }

    #[must_use]
    pub fn with_max_record_len(mut self, len: u8) -> Self {
        self.max_record_len = len;
        self
    }

    #[must_use]
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    /// Checks the invariants the gap-filling loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_record_len == 0 {
            return Err(ConfigError::ZeroRecordLen);
        }
        Ok(())
    }
}
