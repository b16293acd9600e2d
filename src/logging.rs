use std::fmt;

use crate::error::PublishError;

/// Trace-scoped logging interface used by the capture pipeline.
///
/// Every event carries the `trace_id` of the request context it was created
/// from (or `-` when the context has none) and is emitted under the
/// `audit_trail` target. Logging never fails the caller.
#[derive(Debug, Clone, Copy)]
pub struct TraceLog<'a> {
    trace_id: Option<&'a str>,
}

impl<'a> TraceLog<'a> {
    /// Creates a logger bound to `trace_id`.
    pub fn new(trace_id: Option<&'a str>) -> Self {
        Self { trace_id }
    }

    /// Returns the trace id associated with this logger.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id
    }

    fn trace_field(&self) -> &str {
        self.trace_id.unwrap_or("-")
    }

    /// Logs a debug-level message with trace id.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "audit_trail", trace_id = %self.trace_field(), "{}", args);
    }

    /// Logs a warning-level message with trace id.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "audit_trail", trace_id = %self.trace_field(), "{}", args);
    }

    /// Logs an error-level message with trace id.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "audit_trail", trace_id = %self.trace_field(), "{}", args);
    }

    /// Records an outgoing transaction before it is handed to the publisher.
    pub fn publishing(&self, event_id: &str, topic: &str, record: &[u8]) {
        tracing::debug!(
            target: "audit_trail",
            trace_id = %self.trace_field(),
            event_id = %event_id,
            topic = %topic,
            record = %String::from_utf8_lossy(record),
            "publishing activity log"
        );
    }

    /// Records a publish attempt the transport rejected.
    pub fn publish_failed(&self, event_id: &str, topic: &str, error: &PublishError) {
        tracing::error!(
            target: "audit_trail",
            trace_id = %self.trace_field(),
            event_id = %event_id,
            topic = %topic,
            error = %error,
            "error publishing activity log"
        );
    }
}
