use crate::{
    describe, AppState, Effect, GenerationRequest, JobId, JobState, LogKind, Msg, Phase,
    PollOutcome, StatusReport, SubmitReceipt,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that refer to a superseded submission ticket or job id are
/// dropped without touching state.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Submit(request) => submit(&mut state, request),
        Msg::SubmitAccepted { ticket, receipt } => {
            if !state.is_current_ticket(ticket) {
                return (state, Vec::new());
            }
            accept(&mut state, receipt)
        }
        Msg::SubmitFailed { ticket, message } => {
            if !state.is_current_ticket(ticket) {
                return (state, Vec::new());
            }
            let error = format!("An error occurred: {message}");
            state.push_log(LogKind::Error, error.clone());
            state.fail(Phase::Failed, error);
            record_session(&mut state)
        }
        Msg::StatusReceived { job_id, report } => {
            if !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            apply_status(&mut state, report);
            Vec::new()
        }
        Msg::PollErrored { job_id, message } => {
            if !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            state.charge_call();
            state.set_status_message("Checking status...");
            state.push_log(LogKind::Error, format!("Status check failed: {message}"));
            Vec::new()
        }
        Msg::PollFinished { job_id, outcome } => {
            if !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            finish(&mut state, job_id, outcome)
        }
        Msg::CancelRequested => {
            if !state.phase().is_active() {
                return (state, Vec::new());
            }
            let mut effects = stop_current(&state);
            state.cancel();
            state.push_log(LogKind::Info, "Generation cancelled");
            effects.extend(record_session(&mut state));
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState, request: GenerationRequest) -> Vec<Effect> {
    if !request.is_submittable() {
        return Vec::new();
    }

    let mut effects = Vec::with_capacity(3);
    if state.phase().is_active() {
        effects.extend(stop_current(state));
        state.push_log(LogKind::Info, "Superseded by a new request");
        effects.extend(record_session(state));
    }

    state.push_log(
        LogKind::Prompt,
        format!("Prompt: \"{}\"", request.trimmed_prompt()),
    );
    state.push_log(
        LogKind::Parameter,
        format!(
            "Duration: {} {}, quality: {}, style: {}, human focus: {}",
            request.duration,
            request.duration_unit.as_str(),
            request.quality,
            request.style,
            request.human_focus
        ),
    );
    let ticket = state.begin_submission(request.clone());
    effects.push(Effect::SubmitRequest { ticket, request });
    effects
}

fn accept(state: &mut AppState, receipt: SubmitReceipt) -> Vec<Effect> {
    let immediate = receipt.is_immediately_complete();
    let SubmitReceipt {
        job_id, video_url, ..
    } = receipt;

    state.push_log(
        LogKind::Success,
        format!("Request submitted successfully (job {job_id})"),
    );
    state.begin_polling(job_id.clone(), video_url.clone());

    if immediate {
        state.complete(video_url);
        state.push_log(LogKind::Success, "Video generated successfully!");
        return record_session(state);
    }

    vec![Effect::StartPolling {
        job_id,
        known_video_url: state.known_video_url(),
    }]
}

fn apply_status(state: &mut AppState, report: StatusReport) {
    state.charge_call();

    if let Some(progress) = report.progress {
        let crossed = state.set_progress(progress);
        if crossed && report.state == JobState::Processing {
            if let Some(text) = describe(&report) {
                state.push_log(LogKind::Loading, text);
            }
        }
    }

    if let Some(step) = report.diffusion_step() {
        state.set_diffusion_step(step);
    }

    if let Some(text) = describe(&report) {
        state.set_status_message(text);
    }

    if state.observe_state(&report.state) {
        match report.state {
            JobState::Queued => state.push_log(LogKind::Info, "Video generation queued"),
            JobState::Processing => state.push_log(LogKind::Loading, "Video generation started"),
            JobState::Unknown(ref raw) => {
                state.push_log(LogKind::Info, format!("Backend reported status {raw}"))
            }
            JobState::Completed | JobState::Failed => {}
        }
    }
}

fn finish(state: &mut AppState, job_id: JobId, outcome: PollOutcome) -> Vec<Effect> {
    match outcome {
        PollOutcome::Completed { video_url } => {
            state.complete(video_url);
            state.push_log(LogKind::Success, "Video generated successfully!");
        }
        PollOutcome::Failed { message } => {
            let error = format!("Video generation failed: {message}");
            state.push_log(LogKind::Error, error.clone());
            state.fail(Phase::Failed, error);
        }
        PollOutcome::TimedOut { attempts, .. } => {
            let error =
                format!("Gave up waiting for job {job_id} after {attempts} status checks");
            state.push_log(LogKind::Error, error.clone());
            state.fail(Phase::TimedOut, error);
        }
        PollOutcome::Cancelled => {
            state.cancel();
            state.push_log(LogKind::Info, "Generation cancelled");
        }
    }
    record_session(state)
}

fn stop_current(state: &AppState) -> Vec<Effect> {
    match (state.phase(), state.job_id()) {
        (Phase::Polling, Some(job_id)) => vec![Effect::StopPolling {
            job_id: job_id.to_string(),
        }],
        _ => Vec::new(),
    }
}

fn record_session(state: &mut AppState) -> Vec<Effect> {
    state
        .take_session_cost()
        .map(|cost| Effect::RecordSession { cost })
        .into_iter()
        .collect()
}
