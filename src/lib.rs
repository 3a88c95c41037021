//! sproutcast - daily plant-watering broadcast orchestrator
//!
//! An unattended device waters a plant once a day, records the watering,
//! publishes the clip to a social feed, and lets the audience vote in
//! the comments on how much water the plant gets tomorrow.
//!
//! # Architecture
//!
//! Two decoupled cycles share a per-date SQLite ledger:
//! - The posting cycle waters, records, uploads, and publishes, then
//!   attaches the published media id to today's ledger row.
//! - The vote cycle reads the comments on the previous post, tallies
//!   the `NNml` votes, and persists tomorrow's winning amount.
//!
//! Hardware and HTTP collaborators sit behind narrow traits in
//! `adapters`, so the cycle logic in `core` runs unchanged against
//! in-memory fakes.
//!
//! # Modules
//!
//! - `adapters`: collaborator traits + pump/camera/graph/file-host impls
//! - `core`: tally engine, publish poller, daily orchestrator
//! - `ledger`: durable per-date post/vote store
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Morning cron: water, record, publish
//! sproutcast daily
//!
//! # Evening cron: tally votes for tomorrow
//! sproutcast votes
//!
//! # Inspect the ledger
//! sproutcast ledger
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod ledger;

// Re-export main types at crate root for convenience
pub use adapters::{Actuator, Comment, FileHost, GraphError, PublishResponse, Recorder, SocialGraph};
pub use self::core::{
    tally, Collaborators, CycleError, CycleOutcome, DailyOrchestrator, PollerConfig,
    PublishError, PublishPoller, TallyResult, VoteOutcome,
};
pub use ledger::{LedgerError, PostDraft, PostLedger, PostRecord};
