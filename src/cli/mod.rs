//! Command-line interface for sproutcast.
//!
//! One subcommand per scheduled entry point (the device cron runs
//! `daily` and `votes`), plus diagnostics and the one-time account
//! setup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::adapters::{CameraRecorder, FileHostClient, GraphClient, PumpActuator};
use crate::config::{self, Config};
use crate::core::{
    Collaborators, CycleOutcome, DailyOrchestrator, PublishPoller, VoteOutcome,
};
use crate::ledger::PostLedger;

/// sproutcast - daily plant-watering broadcast orchestrator
#[derive(Parser, Debug)]
#[command(name = "sproutcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SPROUTCAST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the daily watering and posting cycle
    Daily,

    /// Tally votes on today's post and persist tomorrow's amount
    Votes,

    /// Print the post ledger
    Ledger,

    /// Discover the account ids behind the access token and write the
    /// account configuration file
    SetupAccount {
        /// Where to write the discovered account JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Daily => run_daily(self.config.as_deref()).await,
            Commands::Votes => run_votes(self.config.as_deref()).await,
            Commands::Ledger => show_ledger(self.config.as_deref()),
            Commands::SetupAccount { output } => {
                setup_account(self.config.as_deref(), output).await
            }
            Commands::Config => show_config(self.config.as_deref()),
        }
    }
}

/// Wire the concrete adapters into an orchestrator.
fn build_orchestrator(config: &Config) -> Result<DailyOrchestrator> {
    let ledger = PostLedger::open(&config.database_path)
        .with_context(|| format!("Failed to open ledger: {}", config.database_path.display()))?;

    let collaborators = Collaborators {
        actuator: Box::new(PumpActuator::new(&config.pump)),
        recorder: Box::new(CameraRecorder::new(&config.camera)),
        file_host: Box::new(FileHostClient::new(&config.file_host)),
        graph: Box::new(GraphClient::new(&config.graph_api)),
    };

    Ok(DailyOrchestrator::new(
        ledger,
        collaborators,
        PublishPoller::default(),
        config.account.clone(),
        config.watering.default_amount_ml,
    ))
}

async fn run_daily(config_path: Option<&Path>) -> Result<()> {
    let config = config::load(config_path)?;
    let orchestrator = build_orchestrator(&config)?;
    let today = Local::now().date_naive();

    match orchestrator.run_posting_cycle(today).await {
        Ok(CycleOutcome::Published { media_id }) => {
            info!(%media_id, "Daily cycle complete");
            println!("Published today's post: {}", media_id);
            Ok(())
        }
        Ok(CycleOutcome::PublishedWithoutId) => {
            println!("Published today's post, but no media id was returned");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Daily cycle failed");
            Err(e.into())
        }
    }
}

async fn run_votes(config_path: Option<&Path>) -> Result<()> {
    let config = config::load(config_path)?;
    let orchestrator = build_orchestrator(&config)?;
    let today = Local::now().date_naive();
    let tomorrow = today.succ_opt().context("Calendar overflow")?;

    match orchestrator.run_vote_cycle(today, tomorrow).await {
        Ok(VoteOutcome::Tallied(result)) => {
            println!(
                "Votes counted: {} ml wins with {} votes; watering {} ml tomorrow",
                result.water_amount, result.vote_count, result.water_amount
            );
            Ok(())
        }
        Ok(VoteOutcome::DefaultedNoPost) => {
            println!("No post to check; defaulting tomorrow's amount");
            Ok(())
        }
        Ok(VoteOutcome::DefaultedNoVotes) => {
            println!("No valid votes; defaulting tomorrow's amount");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Vote cycle failed");
            Err(e.into())
        }
    }
}

fn show_ledger(config_path: Option<&Path>) -> Result<()> {
    let config = config::load(config_path)?;
    let ledger = PostLedger::open(&config.database_path)?;
    ledger.ensure_schema()?;

    let records = ledger.list_all()?;
    if records.is_empty() {
        println!("Ledger is empty (first cycle has not run yet).");
        return Ok(());
    }

    println!(
        "{:<12} {:>6} {:>6}  {}",
        "DATE", "ML", "VOTES", "MEDIA ID"
    );
    for record in records {
        println!(
            "{:<12} {:>6} {:>6}  {}",
            record.date,
            record.water_amount,
            record.vote_count,
            record.media_id.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn setup_account(config_path: Option<&Path>, output: Option<PathBuf>) -> Result<()> {
    let config = config::load(config_path)?;
    let graph = GraphClient::new(&config.graph_api);

    let account = graph.discover_account().await?;

    let output = output.unwrap_or_else(|| {
        let dir = config
            .config_file
            .parent()
            .unwrap_or(Path::new("."))
            .join("accounts");
        dir.join(format!("{}.json", account.user_id))
    });

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&account)?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Account configuration written to {}", output.display());
    println!("Business user id: {}", account.user_id);
    Ok(())
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = config::load(config_path)?;

    println!("Config file:   {}", config.config_file.display());
    println!("Database:      {}", config.database_path.display());
    println!("Graph API:     {}{}", config.graph_api.base_path, config.graph_api.version);
    println!("File host:     {}", config.file_host.base_path);
    println!("Account:       {}", config.account.user_id);
    println!("Default water: {} ml", config.watering.default_amount_ml);
    println!("Pump command:  {}", config.pump.command);
    println!(
        "Camera:        {} ({}s clips into {})",
        config.camera.capture_command, config.camera.duration_secs, config.camera.video_dir
    );
    Ok(())
}
