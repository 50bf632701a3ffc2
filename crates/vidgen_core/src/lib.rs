//! Vidgen core: pure generation-session state machine, progress stages and
//! prompt enrichment. No IO lives here.
mod effect;
mod enhance;
mod ledger;
mod msg;
mod request;
mod stage;
mod state;
mod status;
mod update;
mod view_model;

/// Monotonic id of one submission attempt, assigned by [`update`].
pub type Ticket = u64;

pub use effect::Effect;
pub use enhance::{
    enhance_prompt, enhance_topic, Category, EnhanceOptions, Enhancement, Theme, Tradition,
    UnknownOption, VisualStyle,
};
pub use ledger::{CostEntry, CostLedger, SessionCost, COST_PER_CALL};
pub use msg::Msg;
pub use request::{DurationUnit, GenerationRequest, Routing};
pub use stage::{
    normalize, stage_completed, stage_index, sub_progress, Stage, StagePosition, StageTable,
    StageTableError, GENERATION_STAGES,
};
pub use state::{AppState, LogEntry, LogKind, Phase};
pub use status::{
    describe, parse_diffusion_step, JobId, JobState, PollOutcome, StatusReport, SubmitReceipt,
};
pub use update::update;
pub use view_model::{AppViewModel, StageRowView};
