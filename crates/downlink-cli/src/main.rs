//! Downlink CLI entrypoint.

use clap::Parser;

mod commands;
mod handlers;

use commands::Commands;
use downlink_client::ClientConfig;

#[derive(Parser)]
#[command(name = "downlink")]
#[command(author, version, about = "Download-service monitoring client", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config).
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Path to a YAML config file.
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Health { watch } => handlers::health(&config, watch).await?,
        Commands::Check {
            file_id,
            probe_telemetry,
        } => handlers::check(&config, file_id, probe_telemetry).await?,
        Commands::Start { file_id } => handlers::start(&config, file_id).await?,
        Commands::Status { job_id } => handlers::status(&config, &job_id).await?,
        Commands::Watch { file_id } => handlers::watch(&config, file_id).await?,
    }

    Ok(())
}
