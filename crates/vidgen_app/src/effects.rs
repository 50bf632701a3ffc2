use std::time::{Duration, SystemTime, UNIX_EPOCH};

use vidgen_core::{Effect, Msg};
use vidgen_engine::{EngineEvent, EngineHandle, PollEvent};
use vidgen_logging::{vg_info, vg_warn};

use crate::persistence::LedgerStore;

/// Executes core effects against the engine and turns engine events back
/// into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
    ledger: LedgerStore,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, ledger: LedgerStore) -> Self {
        Self { engine, ledger }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitRequest { ticket, request } => {
                    vg_info!(
                        "SubmitRequest ticket={} prompt_len={}",
                        ticket,
                        request.trimmed_prompt().len()
                    );
                    self.engine.submit(ticket, request);
                }
                Effect::StartPolling {
                    job_id,
                    known_video_url,
                } => {
                    vg_info!("StartPolling job_id={}", job_id);
                    self.engine.start_polling(job_id, known_video_url);
                }
                Effect::StopPolling { job_id } => {
                    vg_info!("StopPolling job_id={}", job_id);
                    self.engine.stop_polling(job_id);
                }
                Effect::RecordSession { cost } => {
                    let ledger = self.ledger.record_session(cost, now_ms());
                    vg_info!(
                        "Recorded session: {} calls, {} total across {} sessions",
                        cost.api_calls,
                        ledger.total(),
                        ledger.entries().len()
                    );
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event that maps to a message.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).and_then(map_event)
    }
}

pub fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Submitted { ticket, receipt } => Some(Msg::SubmitAccepted { ticket, receipt }),
        EngineEvent::SubmitFailed { ticket, error } => {
            vg_warn!("Submission {} failed ({}): {}", ticket, error.kind, error);
            Some(Msg::SubmitFailed {
                ticket,
                message: error.message,
            })
        }
        EngineEvent::Poll(PollEvent::Status { job_id, report }) => {
            Some(Msg::StatusReceived { job_id, report })
        }
        EngineEvent::Poll(PollEvent::TransientError { job_id, error }) => Some(Msg::PollErrored {
            job_id,
            message: error.message,
        }),
        EngineEvent::Poll(PollEvent::Finished { job_id, outcome }) => {
            Some(Msg::PollFinished { job_id, outcome })
        }
        EngineEvent::StatusFetched { .. } => None,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidgen_core::{JobState, PollOutcome, StatusReport};
    use vidgen_engine::{BackendError, FailureKind};

    #[test]
    fn engine_events_map_to_messages() {
        let msg = map_event(EngineEvent::SubmitFailed {
            ticket: 3,
            error: BackendError {
                kind: FailureKind::HttpStatus(500),
                message: "API error: 500 - boom".to_string(),
            },
        });
        assert_eq!(
            msg,
            Some(Msg::SubmitFailed {
                ticket: 3,
                message: "API error: 500 - boom".to_string()
            })
        );

        let msg = map_event(EngineEvent::Poll(PollEvent::Finished {
            job_id: "j".to_string(),
            outcome: PollOutcome::Cancelled,
        }));
        assert!(matches!(msg, Some(Msg::PollFinished { .. })));
    }

    #[test]
    fn one_off_status_is_not_a_message() {
        let msg = map_event(EngineEvent::StatusFetched {
            job_id: "j".to_string(),
            result: Ok(StatusReport::new(JobState::Queued)),
        });
        assert_eq!(msg, None);
    }
}
