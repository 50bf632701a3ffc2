//! Mapping of raw generation progress onto named display stages.
//!
//! A stage table is an ordered list of `(label, threshold)` pairs. A raw
//! progress value `p` belongs to the first stage whose threshold is strictly
//! greater than `p`, so a value sitting exactly on a boundary is reported as
//! the start of the next stage rather than the end of the previous one.

use thiserror::Error;

/// Stage labels and completion thresholds used by the video backend.
pub const GENERATION_STAGES: [(&str, f64); 7] = [
    ("Initializing", 15.0),
    ("Loading Model", 20.0),
    ("Processing Prompt", 25.0),
    ("Generating Latents", 30.0),
    ("Diffusion Steps", 90.0),
    ("Rendering Frames", 95.0),
    ("Finalizing Video", 100.0),
];

const FULL: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub label: String,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageTableError {
    #[error("stage table is empty")]
    Empty,
    #[error("threshold at index {index} is not strictly greater than the previous one")]
    NotIncreasing { index: usize },
    #[error("last threshold must be 100, got {last}")]
    DoesNotEndAtFull { last: f64 },
}

/// Where a raw progress value lands in a stage table.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePosition {
    pub index: usize,
    pub label: String,
    /// Progress within the current stage, in `[0, 100]`.
    pub sub_progress: f64,
}

/// Validated, read-only stage table.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl Default for StageTable {
    fn default() -> Self {
        Self::generation()
    }
}

impl StageTable {
    pub fn new(stages: Vec<Stage>) -> Result<Self, StageTableError> {
        let last = stages.last().ok_or(StageTableError::Empty)?;
        if last.threshold != FULL {
            return Err(StageTableError::DoesNotEndAtFull {
                last: last.threshold,
            });
        }
        let mut previous = 0.0;
        for (index, stage) in stages.iter().enumerate() {
            if !(stage.threshold > previous) {
                return Err(StageTableError::NotIncreasing { index });
            }
            previous = stage.threshold;
        }
        Ok(Self { stages })
    }

    /// The built-in table from [`GENERATION_STAGES`].
    pub fn generation() -> Self {
        Self {
            stages: GENERATION_STAGES
                .iter()
                .map(|(label, threshold)| Stage {
                    label: (*label).to_string(),
                    threshold: *threshold,
                })
                .collect(),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn thresholds(&self) -> Vec<f64> {
        self.stages.iter().map(|stage| stage.threshold).collect()
    }

    pub fn position(&self, progress: f64) -> StagePosition {
        let thresholds = self.thresholds();
        let index = stage_index(progress, &thresholds);
        StagePosition {
            index,
            label: self.stages[index].label.clone(),
            sub_progress: sub_progress(progress, &thresholds),
        }
    }
}

/// Stage position of `progress` in `table`.
pub fn normalize(progress: f64, table: &StageTable) -> StagePosition {
    table.position(progress)
}

/// Index of the first threshold strictly greater than `progress`, or the
/// last index when none is. `thresholds` must be non-empty.
pub fn stage_index(progress: f64, thresholds: &[f64]) -> usize {
    let p = sanitize(progress);
    thresholds
        .iter()
        .position(|threshold| p < *threshold)
        .unwrap_or(thresholds.len().saturating_sub(1))
}

/// Linear position of `progress` between the previous threshold (0 for the
/// first stage) and the current one, as a percentage.
pub fn sub_progress(progress: f64, thresholds: &[f64]) -> f64 {
    if thresholds.is_empty() {
        return 0.0;
    }
    let p = sanitize(progress);
    let index = stage_index(p, thresholds);
    let upper = thresholds[index];
    let lower = if index == 0 { 0.0 } else { thresholds[index - 1] };
    let span = upper - lower;
    if span <= 0.0 {
        return FULL;
    }
    ((p - lower) / span * FULL).clamp(0.0, FULL)
}

/// Whether a stage with `threshold` is finished at `progress`.
pub fn stage_completed(progress: f64, threshold: f64) -> bool {
    sanitize(progress) >= threshold
}

fn sanitize(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, FULL)
    }
}
