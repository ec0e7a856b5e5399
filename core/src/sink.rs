//! Diagnostic sinks for request/response summaries.
//!
//! A session writes one line per outgoing request and one per response.
//! Sinks decide where those lines go; the default drops them.

/// Receives diagnostic lines from a session.
pub trait DiagnosticSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Drops every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl DiagnosticSink for Discard {
    fn line(&self, _line: &str) {}
}

/// Forwards lines as `tracing` debug events on the `bento_core::wire` target.
///
/// Lines include request and response bodies, which may contain card data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn line(&self, line: &str) {
        tracing::debug!(target: "bento_core::wire", "{line}");
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn line(&self, line: &str) {
        self(line)
    }
}
