//! Structured span definitions for tracing.

use std::time::Instant;
use tracing::{Level, Span, field, span};

/// Span around one tool dispatch.
///
/// `is_error` and `duration_ms` are filled in by [`finish`](Self::finish).
pub struct DispatchSpan {
    span: Span,
    start: Instant,
}

impl DispatchSpan {
    pub fn new(tool_name: &str) -> Self {
        let span = span!(
            Level::INFO,
            "tool.dispatch",
            tool_name = tool_name,
            is_error = field::Empty,
            duration_ms = field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Records the result and returns the elapsed time in milliseconds.
    pub fn finish(self, is_error: bool) -> f64 {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.span.record("is_error", is_error);
        self.span.record("duration_ms", elapsed_ms as u64);
        elapsed_ms
    }
}
