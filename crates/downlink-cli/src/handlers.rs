//! Command handlers.

use downlink_client::{ApiClient, ClientConfig, JobPoller};
use downlink_core::events::JobEvent;
use downlink_core::job::DownloadJob;
use downlink_core::{FileId, JobId};
use downlink_report::{ErrorSink, LogSink, WebhookSink};
use downlink_trace::TraceState;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

fn build_client(config: &ClientConfig) -> anyhow::Result<Arc<ApiClient>> {
    let trace = Arc::new(TraceState::new());
    let sink: Arc<dyn ErrorSink> = match &config.report_webhook {
        Some(endpoint) => Arc::new(WebhookSink::new(endpoint.clone())),
        None => Arc::new(LogSink),
    };
    Ok(Arc::new(ApiClient::new(config, trace, sink)?))
}

pub async fn health(config: &ClientConfig, watch: bool) -> anyhow::Result<()> {
    let api = build_client(config)?;

    loop {
        let report = api.health().await?;
        println!(
            "backend: {}",
            if report.is_healthy() {
                "healthy"
            } else {
                "unhealthy"
            }
        );
        println!("storage: {}", report.checks.storage);

        if !watch {
            return Ok(());
        }
        tokio::time::sleep(std::time::Duration::from_secs(config.health_refresh_secs)).await;
    }
}

pub async fn check(config: &ClientConfig, file_id: u64, probe: bool) -> anyhow::Result<()> {
    let api = build_client(config)?;
    let file_id = FileId::new(file_id)?;
    let availability = api.check_file(file_id, probe).await?;

    if availability.available {
        println!("file {} is available", availability.file_id);
        if let Some(size) = availability.size {
            println!("size: {size} bytes");
        }
    } else {
        println!("file {} is not available", availability.file_id);
    }
    Ok(())
}

pub async fn start(config: &ClientConfig, file_id: u64) -> anyhow::Result<()> {
    let api = build_client(config)?;
    let file_id = FileId::new(file_id)?;
    let started = api.start_download(file_id).await?;

    println!("job:    {}", started.job_id);
    println!("status: {}", started.status);
    println!("trace:  {}", api.trace().trace_id());
    Ok(())
}

pub async fn status(config: &ClientConfig, job_id: &str) -> anyhow::Result<()> {
    let api = build_client(config)?;
    let job = api.job_status(&JobId::new(job_id)).await?;
    print_job(&job);
    Ok(())
}

pub async fn watch(config: &ClientConfig, file_id: u64) -> anyhow::Result<()> {
    let api = build_client(config)?;
    let file_id = FileId::new(file_id)?;

    let poller = JobPoller::new(Arc::clone(&api), config);
    let mut events = poller.subscribe();
    let job_id = poller.start(file_id).await?;
    println!(
        "watching job {job_id} (trace {})",
        api.trace().trace_id()
    );

    loop {
        match events.recv().await {
            Ok(JobEvent::StatusChanged {
                job_id: id,
                status,
                progress,
            }) if id == job_id => match progress {
                Some(p) => println!("{status} ({p}%)"),
                None => println!("{status}"),
            },
            Ok(JobEvent::PollRetried { job_id: id, attempt }) if id == job_id => {
                println!("poll failed, retrying (attempt {attempt})");
            }
            Ok(JobEvent::Completed { job_id: id, result }) if id == job_id => {
                println!("completed");
                if let Some(result) = result {
                    if let Some(url) = result.download_url {
                        println!("download: {url}");
                    }
                    println!("took {} ms", result.processing_time_ms);
                }
                return Ok(());
            }
            Ok(JobEvent::Failed { job_id: id, error }) if id == job_id => {
                anyhow::bail!("job {job_id} failed: {error}");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event stream lagged");
            }
            Err(RecvError::Closed) => {
                anyhow::bail!("event stream closed before job {job_id} finished");
            }
        }
    }
}

fn print_job(job: &DownloadJob) {
    println!("job:    {}", job.job_id);
    println!("file:   {}", job.file_id);
    println!("status: {}", job.status);
    if let Some(progress) = job.progress {
        println!("progress: {progress}%");
    }
    if let Some(result) = &job.result {
        if let Some(url) = &result.download_url {
            println!("download: {url}");
        }
        println!("took {} ms", result.processing_time_ms);
    }
    if let Some(error) = &job.error {
        println!("error:  {error}");
    }
}
