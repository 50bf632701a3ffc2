use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use vidgen_core::{GenerationRequest, JobId, Ticket};
use vidgen_logging::{vg_debug, vg_info};

use crate::client::{ClientSettings, ReqwestBackend, Submitter};
use crate::poll::{spawn_poller, ChannelPollSink, PollHandle, PollSettings, StatusSource};
use crate::{BackendError, EngineEvent};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to build backend client: {0}")]
    Backend(#[from] BackendError),
}

enum EngineCommand {
    Submit {
        ticket: Ticket,
        request: GenerationRequest,
    },
    StartPolling {
        job_id: JobId,
        known_video_url: Option<String>,
    },
    StopPolling {
        job_id: JobId,
    },
    FetchOnce {
        job_id: JobId,
    },
}

/// Runs backend IO on a dedicated thread and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(client: ClientSettings, poll: PollSettings) -> Result<Self, EngineError> {
        let backend = Arc::new(ReqwestBackend::new(client)?);
        Self::with_backend(backend, poll)
    }

    pub fn with_backend<B>(backend: Arc<B>, poll: PollSettings) -> Result<Self, EngineError>
    where
        B: Submitter + StatusSource + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let mut pollers: HashMap<JobId, PollHandle> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                let _guard = runtime.enter();
                pollers.retain(|_, handle| !handle.is_finished());
                handle_command(&backend, &poll, &mut pollers, command, &event_tx);
            }
            vg_debug!("Engine command channel closed; cancelling {} pollers", pollers.len());
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit(&self, ticket: Ticket, request: GenerationRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { ticket, request });
    }

    /// Starts polling `job_id`, replacing any poller already running for it.
    pub fn start_polling(&self, job_id: JobId, known_video_url: Option<String>) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling {
            job_id,
            known_video_url,
        });
    }

    pub fn stop_polling(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling { job_id });
    }

    /// One status fetch outside any polling run.
    pub fn fetch_once(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::FetchOnce { job_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command<B>(
    backend: &Arc<B>,
    poll: &PollSettings,
    pollers: &mut HashMap<JobId, PollHandle>,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) where
    B: Submitter + StatusSource + 'static,
{
    match command {
        EngineCommand::Submit { ticket, request } => {
            let backend = backend.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let event = match backend.submit(&request).await {
                    Ok(receipt) => EngineEvent::Submitted { ticket, receipt },
                    Err(error) => EngineEvent::SubmitFailed { ticket, error },
                };
                let _ = event_tx.send(event);
            });
        }
        EngineCommand::StartPolling {
            job_id,
            known_video_url,
        } => {
            let source: Arc<dyn StatusSource> = backend.clone();
            let sink = Arc::new(ChannelPollSink::new(event_tx.clone()));
            let handle = spawn_poller(job_id.clone(), known_video_url, source, poll.clone(), sink);
            if let Some(previous) = pollers.insert(job_id, handle) {
                vg_info!("Replacing poller for job {}", previous.job_id());
                previous.cancel();
            }
        }
        EngineCommand::StopPolling { job_id } => {
            if let Some(handle) = pollers.remove(&job_id) {
                handle.cancel();
            }
        }
        EngineCommand::FetchOnce { job_id } => {
            let backend = backend.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let result = backend.fetch_status(&job_id).await;
                let _ = event_tx.send(EngineEvent::StatusFetched { job_id, result });
            });
        }
    }
}
