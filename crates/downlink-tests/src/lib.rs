//! Integration test infrastructure for Downlink.

pub mod helpers;

pub use helpers::{RecordingSink, fast_config, test_client, test_poller};
