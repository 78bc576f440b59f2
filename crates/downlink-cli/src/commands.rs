//! CLI command definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Probe backend health.
    Health {
        /// Keep probing at the configured refresh interval.
        #[arg(long)]
        watch: bool,
    },
    /// Check whether a file is available for download.
    Check {
        file_id: u64,
        /// Deliberately provoke a backend error to exercise the
        /// reporting path.
        #[arg(long)]
        probe_telemetry: bool,
    },
    /// Start a download job and print its id.
    Start { file_id: u64 },
    /// Fetch the latest status for a job.
    Status { job_id: String },
    /// Start a download job and follow it to a terminal state.
    Watch { file_id: u64 },
}
