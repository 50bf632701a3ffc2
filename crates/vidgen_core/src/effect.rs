use crate::{GenerationRequest, JobId, SessionCost, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitRequest {
        ticket: Ticket,
        request: GenerationRequest,
    },
    StartPolling {
        job_id: JobId,
        /// Result URL already handed out by the backend, if any.
        known_video_url: Option<String>,
    },
    StopPolling { job_id: JobId },
    /// A session ended; persist its cost.
    RecordSession { cost: SessionCost },
}
