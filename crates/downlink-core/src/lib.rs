//! Downlink Core
//!
//! Core domain types, events, and error handling for Downlink.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used across all other crates.

pub mod error;
pub mod events;
pub mod ids;
pub mod job;

pub use error::{Error, Result};
pub use ids::{FileId, JobId};
