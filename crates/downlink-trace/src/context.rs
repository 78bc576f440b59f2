//! Trace context propagation (W3C format).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// W3C Trace Context for one outbound call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    pub trace_flags: String,
}

impl TraceContext {
    /// Create a new trace context.
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            trace_flags: "01".to_string(), // sampled
        }
    }

    /// Create from a W3C traceparent header value.
    pub fn from_traceparent(header: &str) -> Option<Self> {
        let parts: Vec<&str> = header.split('-').collect();
        if parts.len() < 4 {
            return None;
        }

        let version = parts[0];
        if version != "00" {
            return None; // Unsupported version
        }
        if parts[1].len() != 32 || parts[2].len() != 16 {
            return None;
        }

        Some(Self {
            trace_id: parts[1].to_string(),
            span_id: parts[2].to_string(),
            trace_flags: parts[3].to_string(),
        })
    }

    /// Convert to a W3C traceparent header value.
    pub fn to_traceparent(&self) -> String {
        format!("00-{}-{}-{}", self.trace_id, self.span_id, self.trace_flags)
    }

    /// Check if this trace is sampled.
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.ends_with('1')
    }
}

/// Process-stable trace identity.
///
/// Created once at startup and threaded explicitly through everything
/// that makes outbound calls; there is no ambient global to reset
/// between test cases. The trace id never changes for the life of the
/// value; span ids are minted fresh per call.
#[derive(Debug, Clone)]
pub struct TraceState {
    trace_id: String,
    sampled: bool,
}

impl TraceState {
    pub fn new() -> Self {
        Self {
            trace_id: generate_trace_id(),
            sampled: true,
        }
    }

    pub fn with_sampled(sampled: bool) -> Self {
        Self {
            trace_id: generate_trace_id(),
            sampled,
        }
    }

    /// The stable identifier correlating every call this process makes.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// A per-call context sharing the stable trace id.
    pub fn child_context(&self) -> TraceContext {
        let mut ctx = TraceContext::new(self.trace_id.clone(), generate_span_id());
        if !self.sampled {
            ctx.trace_flags = "00".to_string();
        }
        ctx
    }

    /// Headers attached to every outbound request.
    ///
    /// `traceparent` carries a fresh span id per call; `x-trace-id`
    /// duplicates the stable trace id for convenience lookups.
    pub fn outbound_headers(&self) -> HashMap<String, String> {
        let ctx = self.child_context();
        let mut headers = HashMap::new();
        headers.insert("traceparent".to_string(), ctx.to_traceparent());
        headers.insert("x-trace-id".to_string(), self.trace_id.clone());
        headers
    }
}

impl Default for TraceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a new random trace id (32 hex chars).
pub fn generate_trace_id() -> String {
    format!("{:032x}", Uuid::new_v4().as_u128())
}

/// Generate a new random span id (16 hex chars).
pub fn generate_span_id() -> String {
    format!("{:016x}", Uuid::new_v4().as_u128() as u64)
}
