use std::sync::{mpsc, Arc};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vidgen_core::{JobId, JobState, PollOutcome, StatusReport};
use vidgen_logging::{vg_debug, vg_info, vg_warn};

use crate::{BackendError, EngineEvent, PollEvent};

#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusReport, BackendError>;
}

pub trait PollSink: Send + Sync {
    fn emit(&self, event: PollEvent);
}

/// Forwards poll events into the engine's event channel.
pub struct ChannelPollSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelPollSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl PollSink for ChannelPollSink {
    fn emit(&self, event: PollEvent) {
        let _ = self.tx.send(EngineEvent::Poll(event));
    }
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Delay between the end of one status fetch and the start of the next.
    pub interval: Duration,
    /// `None` polls until a terminal state or cancellation.
    pub max_attempts: Option<u32>,
    pub max_duration: Option<Duration>,
    /// Fetch once before the first delay.
    pub poll_immediately: bool,
    pub is_terminal: fn(&JobState) -> bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: Some(900),
            max_duration: Some(Duration::from_secs(30 * 60)),
            poll_immediately: false,
            is_terminal: JobState::is_terminal,
        }
    }
}

/// Owner of one polling run. Dropping the handle cancels the run.
pub struct PollHandle {
    job_id: JobId,
    token: CancellationToken,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stops the run and discards any fetch still in flight. One event that
    /// was already being emitted on another worker may still arrive, so
    /// consumers match it against the job id they are tracking.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub async fn wait(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Starts polling `job_id` on the current Tokio runtime.
///
/// `known_video_url` is a result URL the backend already handed out; if a
/// status fetch fails while one is known the run finishes as completed.
pub fn spawn_poller(
    job_id: JobId,
    known_video_url: Option<String>,
    source: Arc<dyn StatusSource>,
    settings: PollSettings,
    sink: Arc<dyn PollSink>,
) -> PollHandle {
    let token = CancellationToken::new();
    let run = PollRun {
        job_id: job_id.clone(),
        known_video_url,
        source,
        settings,
        sink,
        token: token.clone(),
    };
    let task = tokio::spawn(run.run());
    PollHandle {
        job_id,
        token,
        task: Some(task),
    }
}

struct PollRun {
    job_id: JobId,
    known_video_url: Option<String>,
    source: Arc<dyn StatusSource>,
    settings: PollSettings,
    sink: Arc<dyn PollSink>,
    token: CancellationToken,
}

impl PollRun {
    async fn run(self) -> PollOutcome {
        vg_info!("Polling job {} every {:?}", self.job_id, self.settings.interval);
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if attempts > 0 || !self.settings.poll_immediately {
                tokio::select! {
                    _ = self.token.cancelled() => return self.cancelled(),
                    _ = tokio::time::sleep(self.settings.interval) => {}
                }
            }

            attempts += 1;
            let result = tokio::select! {
                _ = self.token.cancelled() => return self.cancelled(),
                result = self.source.fetch_status(&self.job_id) => result,
            };
            if self.token.is_cancelled() {
                return self.cancelled();
            }

            match result {
                Ok(report) => {
                    let outcome = (self.settings.is_terminal)(&report.state)
                        .then(|| self.terminal_outcome(&report));
                    vg_debug!(
                        "Job {} attempt {attempts}: {} {:?}",
                        self.job_id,
                        report.state,
                        report.progress
                    );
                    self.sink.emit(PollEvent::Status {
                        job_id: self.job_id.clone(),
                        report,
                    });
                    if let Some(outcome) = outcome {
                        return self.finish(outcome);
                    }
                }
                Err(error) => {
                    if let Some(url) = self.known_video_url.clone() {
                        vg_info!(
                            "Status check for finished job {} failed ({}); keeping known result",
                            self.job_id,
                            error.kind
                        );
                        return self.finish(PollOutcome::Completed {
                            video_url: Some(url),
                        });
                    }
                    vg_warn!("Status check for job {} failed: {error}", self.job_id);
                    self.sink.emit(PollEvent::TransientError {
                        job_id: self.job_id.clone(),
                        error,
                    });
                }
            }

            let elapsed = started.elapsed();
            let attempts_spent = self
                .settings
                .max_attempts
                .is_some_and(|max| attempts >= max);
            let time_spent = self
                .settings
                .max_duration
                .is_some_and(|max| elapsed >= max);
            if attempts_spent || time_spent {
                return self.finish(PollOutcome::TimedOut {
                    attempts,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }
    }

    fn terminal_outcome(&self, report: &StatusReport) -> PollOutcome {
        match report.state {
            JobState::Completed => PollOutcome::Completed {
                video_url: report
                    .video_url
                    .clone()
                    .or_else(|| self.known_video_url.clone()),
            },
            _ => PollOutcome::Failed {
                message: report.failure_message(),
            },
        }
    }

    fn finish(&self, outcome: PollOutcome) -> PollOutcome {
        vg_info!("Polling job {} finished: {outcome:?}", self.job_id);
        self.sink.emit(PollEvent::Finished {
            job_id: self.job_id.clone(),
            outcome: outcome.clone(),
        });
        outcome
    }

    fn cancelled(&self) -> PollOutcome {
        vg_debug!("Polling job {} cancelled", self.job_id);
        PollOutcome::Cancelled
    }
}
