use crate::{JobId, LogEntry, Phase, StagePosition};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub phase: Phase,
    pub job_id: Option<JobId>,
    pub progress: f64,
    pub stage: StagePosition,
    pub stages: Vec<StageRowView>,
    pub status_message: String,
    /// `"current/total"` when the backend reported diffusion steps.
    pub diffusion_step: Option<String>,
    pub video_url: Option<String>,
    pub error: Option<String>,
    pub api_calls: u32,
    pub session_cost: u64,
    pub logs: Vec<LogEntry>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageRowView {
    pub label: String,
    pub threshold: f64,
    pub completed: bool,
    pub current: bool,
}
