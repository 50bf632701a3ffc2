use crate::view_model::{AppViewModel, StageRowView};
use crate::{
    stage_completed, GenerationRequest, JobId, JobState, SessionCost, StageTable, Ticket,
};

/// Lifecycle of the current generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Submitting | Phase::Polling)
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            Phase::Completed | Phase::Failed | Phase::TimedOut | Phase::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Success,
    Error,
    Loading,
    Prompt,
    Parameter,
}

/// One line of session narration. `seq` orders entries; wall-clock stamps
/// are added by whoever renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub kind: LogKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    phase: Phase,
    next_ticket: Ticket,
    ticket: Option<Ticket>,
    job_id: Option<JobId>,
    request: Option<GenerationRequest>,
    last_state: Option<JobState>,
    progress: f64,
    status_message: String,
    diffusion_step: Option<(u32, u32)>,
    video_url: Option<String>,
    known_video_url: Option<String>,
    error: Option<String>,
    cost: SessionCost,
    session_recorded: bool,
    logs: Vec<LogEntry>,
    stages: StageTable,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stages(stages: StageTable) -> Self {
        Self {
            stages,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn request(&self) -> Option<&GenerationRequest> {
        self.request.as_ref()
    }

    pub fn cost(&self) -> SessionCost {
        self.cost
    }

    pub fn view(&self) -> AppViewModel {
        let stage = self.stages.position(self.progress);
        let stages = self
            .stages
            .stages()
            .iter()
            .enumerate()
            .map(|(index, row)| StageRowView {
                label: row.label.clone(),
                threshold: row.threshold,
                completed: stage_completed(self.progress, row.threshold),
                current: index == stage.index,
            })
            .collect();

        AppViewModel {
            phase: self.phase,
            job_id: self.job_id.clone(),
            progress: self.progress,
            stage,
            stages,
            status_message: self.status_message.clone(),
            diffusion_step: self
                .diffusion_step
                .map(|(current, total)| format!("{current}/{total}")),
            video_url: self.video_url.clone(),
            error: self.error.clone(),
            api_calls: self.cost.api_calls,
            session_cost: self.cost.amount,
            logs: self.logs.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_current_ticket(&self, ticket: Ticket) -> bool {
        self.phase == Phase::Submitting && self.ticket == Some(ticket)
    }

    pub(crate) fn is_current_job(&self, job_id: &str) -> bool {
        self.phase == Phase::Polling && self.job_id.as_deref() == Some(job_id)
    }

    /// Resets display state for a fresh submission and hands out its ticket.
    pub(crate) fn begin_submission(&mut self, request: GenerationRequest) -> Ticket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.phase = Phase::Submitting;
        self.ticket = Some(ticket);
        self.job_id = None;
        self.request = Some(request);
        self.last_state = None;
        self.progress = 0.0;
        self.status_message = "Submitting your request...".to_string();
        self.diffusion_step = None;
        self.video_url = None;
        self.known_video_url = None;
        self.error = None;
        self.cost = SessionCost::default();
        self.cost.charge_call();
        self.session_recorded = false;
        self.mark_dirty();
        ticket
    }

    pub(crate) fn begin_polling(&mut self, job_id: JobId, known_video_url: Option<String>) {
        self.phase = Phase::Polling;
        self.job_id = Some(job_id);
        self.known_video_url = known_video_url;
        self.status_message =
            "Request submitted successfully. Starting video generation...".to_string();
        self.mark_dirty();
    }

    pub(crate) fn known_video_url(&self) -> Option<String> {
        self.known_video_url.clone()
    }

    pub(crate) fn charge_call(&mut self) {
        self.cost.charge_call();
        self.mark_dirty();
    }

    /// Applies a new progress value. Returns `true` when it moved into a new
    /// 5% bucket, which is when narration is worth appending.
    pub(crate) fn set_progress(&mut self, progress: f64) -> bool {
        if progress.is_nan() {
            return false;
        }
        let progress = progress.clamp(0.0, 100.0);
        let crossed = bucket(progress) != bucket(self.progress);
        self.progress = progress;
        self.mark_dirty();
        crossed
    }

    /// Records the observed backend state; `true` when it differs from the
    /// previous observation.
    pub(crate) fn observe_state(&mut self, state: &JobState) -> bool {
        if self.last_state.as_ref() == Some(state) {
            return false;
        }
        self.last_state = Some(state.clone());
        true
    }

    pub(crate) fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.mark_dirty();
    }

    pub(crate) fn set_diffusion_step(&mut self, step: (u32, u32)) {
        self.diffusion_step = Some(step);
        self.mark_dirty();
    }

    pub(crate) fn complete(&mut self, video_url: Option<String>) {
        self.phase = Phase::Completed;
        self.progress = 100.0;
        self.video_url = video_url.or_else(|| self.known_video_url.clone());
        self.status_message.clear();
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, phase: Phase, error: String) {
        self.phase = phase;
        self.error = Some(error);
        self.status_message.clear();
        self.mark_dirty();
    }

    pub(crate) fn cancel(&mut self) {
        self.phase = Phase::Cancelled;
        self.ticket = None;
        self.status_message.clear();
        self.mark_dirty();
    }

    /// Cost of the session to record, once per session.
    pub(crate) fn take_session_cost(&mut self) -> Option<SessionCost> {
        if self.session_recorded || self.cost.is_empty() {
            return None;
        }
        self.session_recorded = true;
        Some(self.cost)
    }

    pub(crate) fn push_log(&mut self, kind: LogKind, message: impl Into<String>) {
        let seq = self.logs.len() as u64 + 1;
        self.logs.push(LogEntry {
            seq,
            kind,
            message: message.into(),
        });
        self.mark_dirty();
    }
}

fn bucket(progress: f64) -> i64 {
    (progress / 5.0).floor() as i64
}
