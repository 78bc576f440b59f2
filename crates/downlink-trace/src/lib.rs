//! Trace identity and span instrumentation for Downlink.
//!
//! Provides the process-stable trace context injected into every
//! outbound request (W3C traceparent format) and the span wrapper that
//! records exactly one outcome per traced operation.

pub mod context;
pub mod span;

pub use context::{TraceContext, TraceState, generate_span_id, generate_trace_id};
pub use span::{OperationSpan, SpanStatus, traced};
