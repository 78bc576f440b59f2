//! Span instrumentation for client operations.

use crate::context::{TraceState, generate_span_id};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome recorded on a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error(String),
}

/// One traced client operation.
///
/// Acquired at entry and finalized exactly once on every exit path:
/// explicitly through [`OperationSpan::ok`] / [`OperationSpan::error`],
/// or by `Drop` if the owner unwinds first.
#[derive(Debug)]
pub struct OperationSpan {
    name: String,
    operation: String,
    trace_id: String,
    span_id: String,
    started: Instant,
    status: SpanStatus,
    finished: bool,
}

impl OperationSpan {
    pub fn start(state: &TraceState, name: impl Into<String>, operation: impl Into<String>) -> Self {
        let name = name.into();
        let operation = operation.into();
        let span_id = generate_span_id();

        debug!(
            name = %name,
            operation = %operation,
            trace_id = %state.trace_id(),
            span_id = %span_id,
            "Span started"
        );

        Self {
            name,
            operation,
            trace_id: state.trace_id().to_string(),
            span_id,
            started: Instant::now(),
            status: SpanStatus::Unset,
            finished: false,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn status(&self) -> &SpanStatus {
        &self.status
    }

    /// Record a successful outcome and finalize.
    pub fn ok(mut self) {
        self.status = SpanStatus::Ok;
        self.finish();
    }

    /// Record a failed outcome and finalize.
    pub fn error(mut self, message: impl Into<String>) {
        self.status = SpanStatus::Error(message.into());
        self.finish();
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match &self.status {
            SpanStatus::Ok => debug!(
                name = %self.name,
                operation = %self.operation,
                trace_id = %self.trace_id,
                span_id = %self.span_id,
                elapsed_ms,
                status = "ok",
                "Span ended"
            ),
            SpanStatus::Error(message) => warn!(
                name = %self.name,
                operation = %self.operation,
                trace_id = %self.trace_id,
                span_id = %self.span_id,
                elapsed_ms,
                status = "error",
                message = %message,
                "Span ended"
            ),
            SpanStatus::Unset => warn!(
                name = %self.name,
                operation = %self.operation,
                trace_id = %self.trace_id,
                span_id = %self.span_id,
                elapsed_ms,
                "Span dropped without a recorded status"
            ),
        }
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Run `fut` inside a new span bound to `state`'s trace id.
///
/// The result passes through untouched: success records an OK status,
/// failure records the error's message, and the original value or error
/// is returned to the caller unchanged.
pub async fn traced<T, E, Fut>(
    state: &TraceState,
    name: &str,
    operation: &str,
    fut: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let span = OperationSpan::start(state, name, operation);
    match fut.await {
        Ok(value) => {
            span.ok();
            Ok(value)
        }
        Err(err) => {
            span.error(err.to_string());
            Err(err)
        }
    }
}
