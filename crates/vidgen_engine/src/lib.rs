//! Vidgen engine: backend IO, status polling and effect execution.
mod client;
mod engine;
mod enhance;
mod persist;
mod poll;
mod types;

pub use client::{ClientSettings, ReqwestBackend, SubmitEncoding, Submitter};
pub use engine::{EngineError, EngineHandle};
pub use enhance::{
    CompletionEnhancer, CompletionSettings, FallbackEnhancer, PromptEnhancer, RuleBasedEnhancer,
};
pub use persist::{ensure_parent_dir, read_optional, write_atomic, PersistError};
pub use poll::{spawn_poller, ChannelPollSink, PollHandle, PollSettings, PollSink, StatusSource};
pub use types::{BackendError, EngineEvent, FailureKind, PollEvent};
