use std::time::{Duration, Instant};

use vidgen_core::{GenerationRequest, JobState, PollOutcome};
use vidgen_engine::{ClientSettings, EngineEvent, EngineHandle, PollEvent, PollSettings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn collect_until<F>(engine: &EngineHandle, timeout: Duration, mut done: F) -> Vec<EngineEvent>
where
    F: FnMut(&EngineEvent) -> bool,
{
    let deadline = Instant::now() + timeout;
    let mut events = Vec::new();
    while Instant::now() < deadline {
        match engine.try_recv() {
            Some(event) => {
                let finished = done(&event);
                events.push(event);
                if finished {
                    break;
                }
            }
            None => tokio::time::sleep(Duration::from_millis(5)).await,
        }
    }
    events
}

fn engine_for(server: &MockServer) -> EngineHandle {
    EngineHandle::new(
        ClientSettings {
            base_url: server.uri(),
            ..ClientSettings::default()
        },
        PollSettings {
            interval: Duration::from_millis(10),
            ..PollSettings::default()
        },
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_reports_receipt_with_ticket() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "video_id": "v-3"
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.submit(4, GenerationRequest::new("waves"));

    let events = collect_until(&engine, Duration::from_secs(5), |_| true).await;
    match events.as_slice() {
        [EngineEvent::Submitted { ticket, receipt }] => {
            assert_eq!(*ticket, 4);
            assert_eq!(receipt.job_id, "v-3");
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.submit(1, GenerationRequest::new("waves"));

    let events = collect_until(&engine, Duration::from_secs(5), |_| true).await;
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::SubmitFailed { ticket: 1, error }] if error.message == "API error: 500 - boom"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn polling_runs_to_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "video_url": "https://cdn.example/job-1.mp4"
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.start_polling("job-1".to_string(), None);

    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::Poll(PollEvent::Finished { .. }))
    })
    .await;

    assert!(matches!(
        events.first(),
        Some(EngineEvent::Poll(PollEvent::Status { report, .. }))
            if report.state == JobState::Completed
    ));
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Poll(PollEvent::Finished {
            outcome: PollOutcome::Completed { video_url: Some(url) },
            ..
        })) if url == "https://cdn.example/job-1.mp4"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_polling_silences_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/status/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "processing",
            "progress": 10
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.start_polling("job-2".to_string(), None);
    let first = collect_until(&engine, Duration::from_secs(5), |_| true).await;
    assert_eq!(first.len(), 1);

    engine.stop_polling("job-2".to_string());
    tokio::time::sleep(Duration::from_millis(100)).await;
    while engine.try_recv().is_some() {}
    let requests = server.received_requests().await.unwrap_or_default().len();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.try_recv().is_none());
    assert_eq!(
        server.received_requests().await.unwrap_or_default().len(),
        requests
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_once_returns_single_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/status/job-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "Queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.fetch_once("job-3".to_string());

    let events = collect_until(&engine, Duration::from_secs(5), |_| true).await;
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::StatusFetched { job_id, result: Ok(report) }]
            if job_id == "job-3" && report.state == JobState::Queued
    ));
}
