//! Downlink client.
//!
//! The request pipeline (trace header injection + error reporting), the
//! typed API client for the download backend, and the job poller that
//! drives each job's state machine to a terminal state.

pub mod api;
pub mod config;
pub mod poller;
pub mod tracker;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use poller::JobPoller;
pub use tracker::JobTracker;
