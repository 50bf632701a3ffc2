use crate::{GenerationRequest, JobId, PollOutcome, StatusReport, SubmitReceipt, Ticket};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked for a new generation; supersedes any running one.
    Submit(GenerationRequest),
    /// Backend accepted the submission identified by `ticket`.
    SubmitAccepted {
        ticket: Ticket,
        receipt: SubmitReceipt,
    },
    /// Submission failed before a job id was handed out.
    SubmitFailed { ticket: Ticket, message: String },
    /// One poll tick returned a status snapshot.
    StatusReceived { job_id: JobId, report: StatusReport },
    /// One poll tick failed; polling continues.
    PollErrored { job_id: JobId, message: String },
    /// The poller for `job_id` stopped on its own.
    PollFinished { job_id: JobId, outcome: PollOutcome },
    /// User (or owning view teardown) cancelled the current generation.
    CancelRequested,
    /// Render tick.
    Tick,
    NoOp,
}
