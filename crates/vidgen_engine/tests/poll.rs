use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vidgen_core::{JobState, PollOutcome, StatusReport};
use vidgen_engine::{
    spawn_poller, BackendError, FailureKind, PollEvent, PollSettings, PollSink, StatusSource,
};

/// Replays scripted responses, then keeps reporting `processing`.
struct ScriptedSource {
    script: Mutex<VecDeque<Result<StatusReport, BackendError>>>,
    delay: Duration,
    calls: AtomicU32,
}

impl ScriptedSource {
    fn new(script: Vec<Result<StatusReport, BackendError>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    fn with_delay(script: Vec<Result<StatusReport, BackendError>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            delay,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch_status(&self, _job_id: &str) -> Result<StatusReport, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::new(JobState::Processing).with_progress(50.0)))
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<PollEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<PollEvent> {
        self.events.lock().unwrap().clone()
    }

    fn finished(&self) -> Vec<PollOutcome> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PollEvent::Finished { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect()
    }
}

impl PollSink for RecordingSink {
    fn emit(&self, event: PollEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn fast() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(10),
        ..PollSettings::default()
    }
}

fn network_error() -> BackendError {
    BackendError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    }
}

#[tokio::test]
async fn stops_after_completed_status() {
    let source = ScriptedSource::new(vec![
        Ok(StatusReport::new(JobState::Queued)),
        Ok(StatusReport::new(JobState::Processing).with_progress(60.0)),
        Ok(StatusReport::new(JobState::Completed).with_video_url("https://cdn.example/v.mp4")),
    ]);
    let sink = Arc::new(RecordingSink::default());

    let handle = spawn_poller("job-1".into(), None, source.clone(), fast(), sink.clone());
    let outcome = handle.wait().await;

    assert_eq!(
        outcome,
        PollOutcome::Completed {
            video_url: Some("https://cdn.example/v.mp4".to_string())
        }
    );
    assert_eq!(source.calls(), 3);
    let statuses = sink
        .events()
        .iter()
        .filter(|event| matches!(event, PollEvent::Status { .. }))
        .count();
    assert_eq!(statuses, 3);
    assert_eq!(sink.finished(), vec![outcome]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn failed_status_finishes_with_backend_message() {
    let source = ScriptedSource::new(vec![Ok(StatusReport::new(JobState::Failed)
        .with_error("CUDA out of memory"))]);
    let sink = Arc::new(RecordingSink::default());

    let outcome = spawn_poller("job-2".into(), None, source, fast(), sink)
        .wait()
        .await;
    assert_eq!(
        outcome,
        PollOutcome::Failed {
            message: "CUDA out of memory".to_string()
        }
    );
}

#[tokio::test]
async fn transient_errors_keep_polling() {
    let source = ScriptedSource::new(vec![
        Err(network_error()),
        Ok(StatusReport::new(JobState::Completed)),
    ]);
    let sink = Arc::new(RecordingSink::default());

    let outcome = spawn_poller("job-3".into(), None, source.clone(), fast(), sink.clone())
        .wait()
        .await;

    assert_eq!(outcome, PollOutcome::Completed { video_url: None });
    assert_eq!(source.calls(), 2);
    assert!(matches!(
        sink.events().first(),
        Some(PollEvent::TransientError { error, .. }) if error.kind == FailureKind::Network
    ));
}

#[tokio::test]
async fn error_after_known_result_completes_with_it() {
    let source = ScriptedSource::new(vec![Err(network_error())]);
    let sink = Arc::new(RecordingSink::default());

    let outcome = spawn_poller(
        "job-4".into(),
        Some("https://cdn.example/known.mp4".to_string()),
        source,
        fast(),
        sink.clone(),
    )
    .wait()
    .await;

    assert_eq!(
        outcome,
        PollOutcome::Completed {
            video_url: Some("https://cdn.example/known.mp4".to_string())
        }
    );
    assert!(!sink
        .events()
        .iter()
        .any(|event| matches!(event, PollEvent::TransientError { .. })));
}

#[tokio::test]
async fn attempt_budget_times_out() {
    let source = ScriptedSource::new(Vec::new());
    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings {
        max_attempts: Some(3),
        ..fast()
    };

    let outcome = spawn_poller("job-5".into(), None, source.clone(), settings, sink.clone())
        .wait()
        .await;

    assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 3, .. }));
    assert_eq!(source.calls(), 3);
    assert_eq!(sink.finished().len(), 1);
}

#[tokio::test]
async fn duration_budget_times_out() {
    let source = ScriptedSource::new(Vec::new());
    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings {
        max_attempts: None,
        max_duration: Some(Duration::from_millis(40)),
        ..fast()
    };

    let outcome = spawn_poller("job-6".into(), None, source, settings, sink)
        .wait()
        .await;
    match outcome {
        PollOutcome::TimedOut { elapsed_ms, .. } => assert!(elapsed_ms >= 40),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_stops_requests_and_emits_nothing_further() {
    let source = ScriptedSource::new(Vec::new());
    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings {
        max_attempts: None,
        max_duration: None,
        ..fast()
    };

    let handle = spawn_poller("job-7".into(), None, source.clone(), settings, sink.clone());
    tokio::time::sleep(Duration::from_millis(45)).await;
    handle.cancel();
    let outcome = handle.wait().await;
    assert_eq!(outcome, PollOutcome::Cancelled);

    let calls = source.calls();
    let events = sink.events().len();
    assert!(calls >= 1);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(source.calls(), calls);
    assert_eq!(sink.events().len(), events);
    assert!(sink.finished().is_empty());
}

#[tokio::test]
async fn cancel_discards_in_flight_response() {
    let source = ScriptedSource::with_delay(
        vec![Ok(StatusReport::new(JobState::Completed))],
        Duration::from_millis(200),
    );
    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings {
        poll_immediately: true,
        ..fast()
    };

    let handle = spawn_poller("job-8".into(), None, source.clone(), settings, sink.clone());
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(source.calls(), 1);
    handle.cancel();

    let outcome = tokio::time::timeout(Duration::from_millis(100), handle.wait())
        .await
        .expect("cancellation is prompt");
    assert_eq!(outcome, PollOutcome::Cancelled);
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn dropping_the_handle_cancels() {
    let source = ScriptedSource::new(Vec::new());
    let sink = Arc::new(RecordingSink::default());

    let handle = spawn_poller("job-9".into(), None, source.clone(), fast(), sink);
    tokio::time::sleep(Duration::from_millis(35)).await;
    drop(handle);
    tokio::time::sleep(Duration::from_millis(15)).await;

    let calls = source.calls();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(source.calls(), calls);
}

#[tokio::test]
async fn custom_terminal_predicate_is_honoured() {
    let source = ScriptedSource::new(vec![Ok(StatusReport::new(JobState::Unknown(
        "archived".to_string(),
    ))
    .with_message("moved to cold storage"))]);
    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings {
        is_terminal: |state| state.is_terminal() || matches!(state, JobState::Unknown(_)),
        ..fast()
    };

    let outcome = spawn_poller("job-10".into(), None, source, settings, sink)
        .wait()
        .await;
    assert_eq!(
        outcome,
        PollOutcome::Failed {
            message: "moved to cold storage".to_string()
        }
    );
}
