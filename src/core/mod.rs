//! Core cycle logic.
//!
//! This module contains:
//! - Tally: pure vote reduction over comment text
//! - Poller: publish-completion state machine with bounded retries
//! - Orchestrator: the daily posting and vote cycles

pub mod orchestrator;
pub mod poller;
pub mod tally;

// Re-export commonly used types
pub use orchestrator::{
    Collaborators, CycleError, CycleOutcome, DailyOrchestrator, VoteOutcome,
    DEFAULT_WATER_AMOUNT_ML,
};
pub use poller::{PollerConfig, PublishError, PublishPoller, MEDIA_STILL_PROCESSING};
pub use tally::{tally, TallyResult};
