//! Job status snapshots reported by the video backend.
use std::fmt;

/// Opaque identifier handed out by the backend on submission.
pub type JobId = String;

const DIFFUSION_MARKER: &str = "Diffusion step";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
    /// Anything the backend reports that is not recognised. Never terminal.
    Unknown(String),
}

impl JobState {
    /// Case-insensitive parse; `pending`, `running` and `succeeded` are
    /// accepted as aliases.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => JobState::Queued,
            "processing" | "running" => JobState::Processing,
            "completed" | "succeeded" => JobState::Completed,
            "failed" => JobState::Failed,
            _ => JobState::Unknown(raw.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobState::Queued => "queued",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One poll response.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub state: JobState,
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub video_url: Option<String>,
    pub error: Option<String>,
}

impl StatusReport {
    pub fn new(state: JobState) -> Self {
        Self {
            state,
            progress: None,
            message: None,
            video_url: None,
            error: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn failure_message(&self) -> String {
        non_empty(self.message.as_deref())
            .or_else(|| non_empty(self.error.as_deref()))
            .unwrap_or("Unknown error")
            .to_string()
    }

    pub fn diffusion_step(&self) -> Option<(u32, u32)> {
        self.message.as_deref().and_then(parse_diffusion_step)
    }
}

/// Decoded submit response.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub state: Option<JobState>,
    pub video_url: Option<String>,
}

impl SubmitReceipt {
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            state: None,
            video_url: None,
        }
    }

    /// The backend finished synchronously and no polling is needed.
    pub fn is_immediately_complete(&self) -> bool {
        matches!(self.state, Some(JobState::Completed)) && self.video_url.is_some()
    }
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed { video_url: Option<String> },
    Failed { message: String },
    TimedOut { attempts: u32, elapsed_ms: u64 },
    Cancelled,
}

/// User-facing narration for a non-terminal report. Terminal and
/// unrecognised states return `None`.
pub fn describe(report: &StatusReport) -> Option<String> {
    match &report.state {
        JobState::Queued => {
            Some("Your video is queued and will start processing soon...".to_string())
        }
        JobState::Processing => Some(match report.progress {
            Some(progress) => match report.message.as_deref() {
                Some(message) if message.contains(DIFFUSION_MARKER) => message.to_string(),
                message => format!(
                    "Processing your video... {}% complete. {}",
                    progress.round() as i64,
                    message.unwrap_or_default()
                )
                .trim_end()
                .to_string(),
            },
            None => "Processing your video...".to_string(),
        }),
        JobState::Completed | JobState::Failed | JobState::Unknown(_) => None,
    }
}

/// Extracts `(current, total)` from a message such as
/// `"Diffusion step 12/50 (network call 3)"`.
pub fn parse_diffusion_step(message: &str) -> Option<(u32, u32)> {
    let start = message.find(DIFFUSION_MARKER)? + DIFFUSION_MARKER.len();
    let rest = message[start..].trim_start();
    let (current, rest) = split_leading_digits(rest)?;
    let rest = rest.strip_prefix('/')?;
    let (total, _) = split_leading_digits(rest)?;
    Some((current.parse().ok()?, total.parse().ok()?))
}

fn split_leading_digits(input: &str) -> Option<(&str, &str)> {
    let end = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(input.len());
    if end == 0 {
        None
    } else {
        Some(input.split_at(end))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_parse_case_insensitively() {
        assert_eq!(JobState::parse("COMPLETED"), JobState::Completed);
        assert_eq!(JobState::parse("completed"), JobState::Completed);
        assert_eq!(JobState::parse("Processing"), JobState::Processing);
        assert_eq!(JobState::parse("QUEUED"), JobState::Queued);
        assert_eq!(JobState::parse("failed"), JobState::Failed);
        assert_eq!(JobState::parse("pending"), JobState::Queued);
        assert_eq!(JobState::parse("succeeded"), JobState::Completed);
        assert_eq!(
            JobState::parse("cancelling"),
            JobState::Unknown("cancelling".to_string())
        );
        assert!(!JobState::parse("cancelling").is_terminal());
    }

    #[test]
    fn failure_message_prefers_message_then_error() {
        let report = StatusReport::new(JobState::Failed)
            .with_message("out of memory")
            .with_error("ignored");
        assert_eq!(report.failure_message(), "out of memory");

        let report = StatusReport::new(JobState::Failed).with_error("gpu lost");
        assert_eq!(report.failure_message(), "gpu lost");

        let report = StatusReport::new(JobState::Failed).with_message("  ");
        assert_eq!(report.failure_message(), "Unknown error");
    }

    #[test]
    fn describes_processing_reports() {
        let report = StatusReport::new(JobState::Processing)
            .with_progress(41.6)
            .with_message("warming up");
        assert_eq!(
            describe(&report).as_deref(),
            Some("Processing your video... 42% complete. warming up")
        );

        let report = StatusReport::new(JobState::Processing).with_progress(10.0);
        assert_eq!(
            describe(&report).as_deref(),
            Some("Processing your video... 10% complete.")
        );

        let report = StatusReport::new(JobState::Processing)
            .with_progress(50.0)
            .with_message("Diffusion step 12/50 (network call 3)");
        assert_eq!(
            describe(&report).as_deref(),
            Some("Diffusion step 12/50 (network call 3)")
        );

        let report = StatusReport::new(JobState::Processing);
        assert_eq!(describe(&report).as_deref(), Some("Processing your video..."));
    }

    #[test]
    fn terminal_reports_have_no_description() {
        assert_eq!(describe(&StatusReport::new(JobState::Completed)), None);
        assert_eq!(describe(&StatusReport::new(JobState::Failed)), None);
    }

    #[test]
    fn diffusion_step_parsing() {
        assert_eq!(parse_diffusion_step("Diffusion step 3/30"), Some((3, 30)));
        assert_eq!(
            parse_diffusion_step("running: Diffusion step 12/50 done"),
            Some((12, 50))
        );
        assert_eq!(parse_diffusion_step("Diffusion step x/30"), None);
        assert_eq!(parse_diffusion_step("Diffusion step 3 of 30"), None);
        assert_eq!(parse_diffusion_step("no steps here"), None);
    }

    #[test]
    fn immediate_completion_needs_url() {
        let mut receipt = SubmitReceipt::new("job-1");
        receipt.state = Some(JobState::Completed);
        assert!(!receipt.is_immediately_complete());
        receipt.video_url = Some("https://cdn.example/v.mp4".to_string());
        assert!(receipt.is_immediately_complete());
    }
}
