//! Daily cycle orchestrator.
//!
//! Owns the two once-a-day sequences: the posting cycle
//! (bootstrap check → water → record → upload → publish → persist id)
//! and the vote cycle (media-id lookup → comment fetch → tally →
//! persist next day's amount). Collaborators come in behind the adapter
//! traits so both cycles run unchanged against fakes in tests.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::adapters::{Actuator, FileHost, Recorder, SocialGraph};
use crate::config::AccountConfig;
use crate::ledger::{LedgerError, PostDraft, PostLedger};

use super::poller::{PublishError, PublishPoller};
use super::tally::{tally, TallyResult};

/// Water amount used when there is no voting history to draw on.
pub const DEFAULT_WATER_AMOUNT_ML: u32 = 25;

/// External collaborators for one cycle run.
pub struct Collaborators {
    pub actuator: Box<dyn Actuator>,
    pub recorder: Box<dyn Recorder>,
    pub file_host: Box<dyn FileHost>,
    pub graph: Box<dyn SocialGraph>,
}

/// Terminal failures of a cycle. All of these are logged and surfaced;
/// none of them panic — a failed cycle degrades to "no post today" or
/// "default amount tomorrow".
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("hardware failure: {0}")]
    Hardware(#[source] anyhow::Error),

    #[error("video upload failed: {0}")]
    Upload(#[source] anyhow::Error),

    #[error("graph API call failed: {0}")]
    Graph(#[source] anyhow::Error),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// How a posting cycle ended when it got all the way to publishing.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Published and the media id is attached to today's ledger row.
    Published { media_id: String },

    /// Published, but the response carried no id. The row stays
    /// unattached; the next vote cycle takes its default branch.
    PublishedWithoutId,
}

/// How a vote cycle decided tomorrow's amount.
#[derive(Debug, Clone, Copy)]
pub enum VoteOutcome {
    /// Comments were tallied and the winner persisted.
    Tallied(TallyResult),

    /// No media id for the previous post; default persisted.
    DefaultedNoPost,

    /// Comments were fetched but none carried a vote; default persisted.
    DefaultedNoVotes,
}

/// Orchestrator for the daily posting and vote cycles.
pub struct DailyOrchestrator {
    ledger: PostLedger,
    collaborators: Collaborators,
    poller: PublishPoller,
    account: AccountConfig,
    default_water_amount: u32,
}

impl DailyOrchestrator {
    pub fn new(
        ledger: PostLedger,
        collaborators: Collaborators,
        poller: PublishPoller,
        account: AccountConfig,
        default_water_amount: u32,
    ) -> Self {
        Self {
            ledger,
            collaborators,
            poller,
            account,
            default_water_amount,
        }
    }

    /// Run the posting cycle for `today`.
    #[instrument(skip(self), fields(date = %today))]
    pub async fn run_posting_cycle(&self, today: NaiveDate) -> Result<CycleOutcome, CycleError> {
        self.ledger.ensure_schema()?;

        if self.ledger.is_first_cycle()? {
            info!("First cycle, creating default ledger entry");
            self.ledger.insert(&PostDraft::new(
                today,
                self.default_water_amount,
                0,
            ))?;
        }

        let amount = self.todays_water_amount(today)?;

        info!(amount_ml = amount, "Watering plant");
        self.collaborators
            .actuator
            .water(amount)
            .await
            .map_err(CycleError::Hardware)?;

        info!("Recording watering video");
        let video = self
            .collaborators
            .recorder
            .record()
            .await
            .map_err(CycleError::Hardware)?;

        let video_url = self
            .collaborators
            .file_host
            .upload(&video)
            .await
            .map_err(CycleError::Upload)?
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                CycleError::Upload(anyhow::anyhow!("file host returned no retrievable URL"))
            })?;
        info!(%video_url, "Video uploaded");

        let caption = self.account.caption();
        let creation_id = self
            .collaborators
            .graph
            .create_container(&self.account.user_id, &video_url, &caption)
            .await
            .map_err(CycleError::Graph)?;

        let response = self
            .poller
            .publish(
                self.collaborators.graph.as_ref(),
                &creation_id,
                &self.account.user_id,
            )
            .await?;

        match response.id {
            Some(media_id) => {
                self.ledger.attach_media_id(today, &media_id)?;
                info!(%media_id, "Media id attached to today's ledger row");
                Ok(CycleOutcome::Published { media_id })
            }
            None => {
                warn!("Publish result carried no media id; leaving row unattached");
                Ok(CycleOutcome::PublishedWithoutId)
            }
        }
    }

    /// Run the vote cycle: read the comments on the post from
    /// `post_date` and persist the winning amount for `next_date`.
    #[instrument(skip(self), fields(post_date = %post_date, next_date = %next_date))]
    pub async fn run_vote_cycle(
        &self,
        post_date: NaiveDate,
        next_date: NaiveDate,
    ) -> Result<VoteOutcome, CycleError> {
        self.ledger.ensure_schema()?;

        let Some(media_id) = self.ledger.get_media_id(post_date)? else {
            info!("No media id for the previous post, skipping vote check");
            self.persist_default(next_date)?;
            return Ok(VoteOutcome::DefaultedNoPost);
        };

        let comments = self
            .collaborators
            .graph
            .fetch_comments(&media_id)
            .await
            .map_err(CycleError::Graph)?;
        info!(count = comments.len(), "Fetched comments");

        let texts: Vec<String> = comments.into_iter().map(|c| c.text).collect();
        let result = tally(&texts);

        if result.vote_count == 0 {
            warn!("No valid votes found, using default amount for tomorrow");
            self.persist_default(next_date)?;
            return Ok(VoteOutcome::DefaultedNoVotes);
        }

        info!(
            water_amount = result.water_amount,
            vote_count = result.vote_count,
            "Vote tally complete"
        );
        self.ledger.insert(&PostDraft::new(
            next_date,
            result.water_amount,
            result.vote_count,
        ))?;

        Ok(VoteOutcome::Tallied(result))
    }

    /// Water amount for today's cycle. Falls back to the default (and
    /// writes the missing row so the later media-id attach has a
    /// target) when the vote cycle never produced one.
    fn todays_water_amount(&self, today: NaiveDate) -> Result<u32, CycleError> {
        if let Some(record) = self.ledger.get_record(today)? {
            return Ok(record.water_amount);
        }

        warn!("No ledger row for today, inserting default amount");
        self.persist_default(today)?;
        Ok(self.default_water_amount)
    }

    fn persist_default(&self, date: NaiveDate) -> Result<(), LedgerError> {
        self.ledger
            .insert(&PostDraft::new(date, self.default_water_amount, 0))
    }

    /// Read-only view of the ledger for diagnostics.
    pub fn ledger(&self) -> &PostLedger {
        &self.ledger
    }
}
