use std::fmt;

use thiserror::Error;
use vidgen_core::{JobId, PollOutcome, StatusReport, SubmitReceipt, Ticket};

/// Failure talking to the generation backend or the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// 2xx response whose body carried an `error` field.
    Rejected,
    MissingJobId,
    InvalidResponse,
    TooLarge { max_bytes: u64, actual: Option<u64> },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Rejected => write!(f, "rejected by backend"),
            FailureKind::MissingJobId => write!(f, "missing job id"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
        }
    }
}

/// Emitted by a running poller. A run ends with exactly one `Finished`,
/// unless it was cancelled, in which case nothing further is emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Status {
        job_id: JobId,
        report: StatusReport,
    },
    TransientError {
        job_id: JobId,
        error: BackendError,
    },
    Finished {
        job_id: JobId,
        outcome: PollOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Submitted {
        ticket: Ticket,
        receipt: SubmitReceipt,
    },
    SubmitFailed {
        ticket: Ticket,
        error: BackendError,
    },
    Poll(PollEvent),
    StatusFetched {
        job_id: JobId,
        result: Result<StatusReport, BackendError>,
    },
}
