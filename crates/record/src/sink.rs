//! Diagnostic sinks for parse-time problems.
//!
//! Parsing never fails on a bad line; it reports the line to a sink and
//! moves on. Any `FnMut(u64, &str, &str)` closure is a sink.

/// Receives one message per repaired or dropped input line.
pub trait DiagnosticSink {
    fn log(&mut self, line: u64, raw: &str, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(u64, &str, &str),
{
    fn log(&mut self, line: u64, raw: &str, message: &str) {
        self(line, raw, message)
    }
}

/// Drops every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl DiagnosticSink for Discard {
    fn log(&mut self, _line: u64, _raw: &str, _message: &str) {}
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&mut self, line: u64, raw: &str, message: &str) {
        tracing::warn!(line, raw, "{message}");
    }
}
