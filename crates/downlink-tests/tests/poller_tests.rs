//! Job poller integration tests.
//!
//! Run with: `cargo test -p downlink-tests --test poller_tests`

use downlink_core::events::JobEvent;
use downlink_core::job::JobStatus;
use downlink_core::{Error, FileId, JobId};
use downlink_tests::{fast_config, test_poller};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENT_WAIT: Duration = Duration::from_secs(5);

fn started_body() -> serde_json::Value {
    json!({
        "jobId": "abc123",
        "status": "queued",
        "file_id": 70000,
        "message": "job accepted",
        "statusUrl": "/v1/download/status/abc123"
    })
}

fn processing_body(progress: u8) -> serde_json::Value {
    json!({
        "jobId": "abc123",
        "status": "processing",
        "file_id": 70000,
        "startTime": 1754000000000u64,
        "progress": progress
    })
}

fn completed_body() -> serde_json::Value {
    json!({
        "jobId": "abc123",
        "status": "completed",
        "file_id": 70000,
        "startTime": 1754000000000u64,
        "endTime": 1754000008421u64,
        "result": {
            "file_id": 70000,
            "status": "completed",
            "downloadUrl": "https://downloads.example.com/70000",
            "size": 1048576,
            "processingTimeMs": 8421,
            "message": "ready"
        }
    })
}

fn failed_body() -> serde_json::Value {
    json!({
        "jobId": "abc123",
        "status": "failed",
        "file_id": 70000,
        "startTime": 1754000000000u64,
        "error": "source unavailable"
    })
}

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/download/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(started_body()))
        .mount(server)
        .await;
}

async fn status_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .filter(|r| r.url.path().starts_with("/v1/download/status/"))
        .count()
}

/// Wait for the next event concerning `job_id`, skipping others.
async fn next_event(
    events: &mut broadcast::Receiver<JobEvent>,
    job_id: &JobId,
) -> JobEvent {
    loop {
        let event = timeout(EVENT_WAIT, events.recv())
            .await
            .expect("event arrives in time")
            .expect("event stream open");
        if event.job_id() == job_id {
            return event;
        }
    }
}

#[tokio::test]
async fn test_poll_loop_stops_at_completed() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/download/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processing_body(42)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/download/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed_body()))
        .mount(&server)
        .await;

    let config = fast_config(&server.uri());
    let (poller, _api, sink) = test_poller(&config);
    let mut events = poller.subscribe();
    let tracker = poller.tracker();

    let job_id = poller
        .start(FileId::new(70_000).expect("valid file id"))
        .await
        .expect("start succeeds");
    assert_eq!(job_id.as_str(), "abc123");

    // Initial snapshot is queued before the first poll lands
    let snapshot = tracker.snapshot(&job_id).await.expect("snapshot present");
    assert_eq!(snapshot.status, JobStatus::Queued);

    // Started -> StatusChanged(processing) -> StatusChanged(completed)
    // -> Completed
    let mut statuses = Vec::new();
    loop {
        match next_event(&mut events, &job_id).await {
            JobEvent::StatusChanged { status, progress, .. } => {
                statuses.push((status, progress));
            }
            JobEvent::Completed { result, .. } => {
                let result = result.expect("completed jobs carry a result");
                assert_eq!(result.processing_time_ms, 8421);
                break;
            }
            JobEvent::Started { .. } => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(
        statuses,
        vec![
            (JobStatus::Processing, Some(42)),
            (JobStatus::Completed, None)
        ]
    );

    // The loop stops: no further polls are issued after the terminal
    // observation.
    let polls = status_request_count(&server).await;
    assert_eq!(polls, 2);
    sleep(Duration::from_millis(config.poll_interval_ms * 5)).await;
    assert_eq!(status_request_count(&server).await, polls);

    assert!(!tracker.is_active(&job_id).await);
    let snapshot = tracker.snapshot(&job_id).await.expect("snapshot kept");
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_transient_poll_failures_retry_then_surface_terminal_failure() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/download/status/abc123"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/download/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(failed_body()))
        .mount(&server)
        .await;

    let config = fast_config(&server.uri());
    let (poller, _api, sink) = test_poller(&config);
    let mut events = poller.subscribe();
    let tracker = poller.tracker();

    let started_at = Instant::now();
    let job_id = poller
        .start(FileId::new(70_000).expect("valid file id"))
        .await
        .expect("start succeeds");

    let mut retries = Vec::new();
    let error = loop {
        match next_event(&mut events, &job_id).await {
            JobEvent::PollRetried { attempt, .. } => retries.push(attempt),
            JobEvent::Failed { error, .. } => break error,
            JobEvent::Started { .. } | JobEvent::StatusChanged { .. } => {}
            other => panic!("unexpected event: {other:?}"),
        }
    };

    assert_eq!(retries, vec![1, 2], "one retry per transport failure");
    assert_eq!(error, "source unavailable");

    // Each retry waited out the longer backoff before re-polling
    let floor = Duration::from_millis(
        config.poll_interval_ms + 2 * config.retry_backoff_ms,
    );
    assert!(
        started_at.elapsed() >= floor,
        "retries are spaced by the backoff interval"
    );

    assert_eq!(status_request_count(&server).await, 3);
    assert!(!tracker.is_active(&job_id).await);
    let snapshot = tracker.snapshot(&job_id).await.expect("snapshot kept");
    assert_eq!(snapshot.status, JobStatus::Failed);
    assert_eq!(snapshot.error.as_deref(), Some("source unavailable"));

    // Both 500s went through the pipeline's reporting path
    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn test_cancel_releases_job_without_terminal_response() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/download/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processing_body(10)))
        .mount(&server)
        .await;

    let config = fast_config(&server.uri());
    let (poller, _api, _sink) = test_poller(&config);
    let mut events = poller.subscribe();
    let tracker = poller.tracker();

    let job_id = poller
        .start(FileId::new(70_000).expect("valid file id"))
        .await
        .expect("start succeeds");

    // Let at least one poll land, then cancel mid-loop
    loop {
        if let JobEvent::StatusChanged { .. } = next_event(&mut events, &job_id).await {
            break;
        }
    }
    assert!(poller.cancel(&job_id).await);

    // The loop exits promptly and the active entry is released
    timeout(EVENT_WAIT, async {
        while tracker.is_active(&job_id).await {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("cancellation releases the job");

    let polls = status_request_count(&server).await;
    sleep(Duration::from_millis(config.poll_interval_ms * 5)).await;
    assert_eq!(
        status_request_count(&server).await,
        polls,
        "no polls after cancellation"
    );

    // Cancelling again is a no-op
    assert!(!poller.cancel(&job_id).await);

    // The last snapshot stays readable
    let snapshot = tracker.snapshot(&job_id).await.expect("snapshot kept");
    assert_eq!(snapshot.status, JobStatus::Processing);
}

#[tokio::test]
async fn test_start_failure_never_enters_active_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/download/start"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = fast_config(&server.uri());
    let (poller, _api, sink) = test_poller(&config);
    let tracker = poller.tracker();

    let err = poller
        .start(FileId::new(70_000).expect("valid file id"))
        .await
        .expect_err("start fails");
    assert!(matches!(err, Error::PipelineHttp { status: 500, .. }));

    assert_eq!(tracker.active_count().await, 0);
    assert!(tracker.snapshots().await.is_empty());

    // The start call is not retried
    sleep(Duration::from_millis(config.retry_backoff_ms * 2)).await;
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_concurrent_jobs_are_isolated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/download/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobId": "job-a",
            "status": "queued",
            "file_id": 70000,
            "message": "job accepted",
            "statusUrl": "/v1/download/status/job-a"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/download/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobId": "job-b",
            "status": "queued",
            "file_id": 70001,
            "message": "job accepted",
            "statusUrl": "/v1/download/status/job-b"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/download/status/job-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobId": "job-a",
            "status": "completed",
            "file_id": 70000,
            "startTime": 1754000000000u64,
            "result": {
                "file_id": 70000,
                "status": "completed",
                "processingTimeMs": 100,
                "message": "ready"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/download/status/job-b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobId": "job-b",
            "status": "processing",
            "file_id": 70001,
            "startTime": 1754000000000u64,
            "progress": 5
        })))
        .mount(&server)
        .await;

    let config = fast_config(&server.uri());
    let (poller, _api, _sink) = test_poller(&config);
    let mut events = poller.subscribe();
    let tracker = poller.tracker();

    let job_a = poller
        .start(FileId::new(70_000).expect("valid file id"))
        .await
        .expect("job a starts");
    let job_b = poller
        .start(FileId::new(70_001).expect("valid file id"))
        .await
        .expect("job b starts");

    // Job A finishing does not disturb job B's loop
    loop {
        if let JobEvent::Completed { .. } = next_event(&mut events, &job_a).await {
            break;
        }
    }

    assert!(!tracker.is_active(&job_a).await);
    assert!(tracker.is_active(&job_b).await);
    let b = tracker.snapshot(&job_b).await.expect("snapshot present");
    assert_eq!(b.status, JobStatus::Processing);
    assert_eq!(b.file_id.get(), 70_001);

    poller.shutdown().await;
    timeout(EVENT_WAIT, async {
        while tracker.active_count().await > 0 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("shutdown drains the active set");
}
