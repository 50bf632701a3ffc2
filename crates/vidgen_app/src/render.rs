use chrono::Local;
use vidgen_core::{AppViewModel, LogEntry, LogKind, Phase, StagePosition};

const BAR_WIDTH: usize = 20;

/// Prints view model changes to the terminal: new log entries as they
/// appear, and the progress line whenever it changes.
#[derive(Default)]
pub struct TerminalRenderer {
    printed_seq: u64,
    last_status: Option<String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) {
        let time = Local::now().format("%H:%M:%S").to_string();
        let printed = self.printed_seq;
        for entry in view.logs.iter().filter(|entry| entry.seq > printed) {
            println!("{}", format_log_entry(entry, &time));
            self.printed_seq = entry.seq;
        }

        if !view.phase.is_active() {
            return;
        }
        let status = format_status_line(view);
        if self.last_status.as_deref() != Some(status.as_str()) {
            println!("{status}");
            self.last_status = Some(status);
        }
    }

    pub fn note(&self, message: &str) {
        let time = Local::now().format("%H:%M:%S");
        println!("[{time}] {:<6} {message}", "note");
    }
}

pub fn format_log_entry(entry: &LogEntry, time: &str) -> String {
    let marker = match entry.kind {
        LogKind::Info => "info",
        LogKind::Success => "ok",
        LogKind::Error => "error",
        LogKind::Loading => "...",
        LogKind::Prompt => "prompt",
        LogKind::Parameter => "param",
    };
    format!("[{time}] {marker:<6} {}", entry.message)
}

pub fn format_status_line(view: &AppViewModel) -> String {
    let mut line = format!(
        "{} {:>3.0}% {}",
        progress_bar(view.progress),
        view.progress,
        format_stage(&view.stage)
    );
    if let Some(step) = &view.diffusion_step {
        line.push_str(&format!(" | step {step}"));
    }
    if !view.status_message.is_empty() {
        line.push_str(" | ");
        line.push_str(&view.status_message);
    }
    if view.phase == Phase::Polling {
        line.push_str(&format!(
            " | {} calls, cost {}",
            view.api_calls, view.session_cost
        ));
    }
    line
}

pub fn format_stage(stage: &StagePosition) -> String {
    format!("{} ({:.0}%)", stage.label, stage.sub_progress)
}

fn progress_bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
