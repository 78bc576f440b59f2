//! Error reporting for Downlink.
//!
//! Failures in the request pipeline are forwarded to an external
//! telemetry sink together with the trace id that correlates them to
//! the client operation that produced them.

pub mod sink;

pub use sink::{ErrorEvent, ErrorSink, LogSink, ReportError, WebhookSink};
