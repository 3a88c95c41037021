//! Vote cycle integration tests.
//!
//! The vote cycle runs against the media id of the previous post and
//! decides tomorrow's water amount. These tests drive it over a fake
//! graph and an in-memory ledger.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use sproutcast::adapters::{
    Actuator, Comment, FileHost, GraphError, PublishResponse, Recorder, SocialGraph,
};
use sproutcast::config::AccountConfig;
use sproutcast::core::{
    Collaborators, CycleError, DailyOrchestrator, PollerConfig, PublishPoller, VoteOutcome,
};
use sproutcast::ledger::{PostDraft, PostLedger};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

struct NoopPump;

#[async_trait]
impl Actuator for NoopPump {
    async fn water(&self, _amount_ml: u32) -> Result<()> {
        Ok(())
    }
}

struct NoopCamera;

#[async_trait]
impl Recorder for NoopCamera {
    async fn record(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/videos/test.mp4"))
    }
}

struct NoopFileHost;

#[async_trait]
impl FileHost for NoopFileHost {
    async fn upload(&self, _video: &Path) -> Result<Option<String>> {
        Ok(Some("https://files.example/abc".to_string()))
    }
}

/// Graph fake serving canned comments; records which media ids were asked for.
struct CommentGraph {
    comments: Vec<&'static str>,
    fail_fetch: bool,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl CommentGraph {
    fn new(comments: Vec<&'static str>) -> Self {
        Self {
            comments,
            fail_fetch: false,
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl SocialGraph for CommentGraph {
    async fn create_container(&self, _: &str, _: &str, _: &str) -> Result<String> {
        Ok("CREATION1".to_string())
    }

    async fn publish(&self, _: &str, _: &str) -> Result<PublishResponse, GraphError> {
        Ok(PublishResponse {
            id: Some("MEDIA1".to_string()),
        })
    }

    async fn fetch_comments(&self, media_id: &str) -> Result<Vec<Comment>> {
        if self.fail_fetch {
            anyhow::bail!("comment endpoint unavailable");
        }
        self.fetched.lock().unwrap().push(media_id.to_string());
        Ok(self
            .comments
            .iter()
            .map(|text| Comment {
                text: text.to_string(),
            })
            .collect())
    }
}

fn orchestrator_with(graph: CommentGraph) -> (DailyOrchestrator, Arc<Mutex<Vec<String>>>) {
    let fetched = graph.fetched.clone();
    let ledger = PostLedger::open_in_memory().unwrap();
    ledger.ensure_schema().unwrap();

    let collaborators = Collaborators {
        actuator: Box::new(NoopPump),
        recorder: Box::new(NoopCamera),
        file_host: Box::new(NoopFileHost),
        graph: Box::new(graph),
    };

    let poller = PublishPoller::new(PollerConfig {
        pre_publish_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        max_attempts: 5,
    });

    let account = AccountConfig {
        user_id: "USER1".to_string(),
        caption_lines: Vec::new(),
        hashtags: Vec::new(),
    };

    (
        DailyOrchestrator::new(ledger, collaborators, poller, account, 25),
        fetched,
    )
}

#[tokio::test]
async fn test_no_media_id_defaults_tomorrow_without_fetching() {
    let (orchestrator, fetched) = orchestrator_with(CommentGraph::new(vec!["10ml"]));
    let today = date("2024-05-01");
    let tomorrow = date("2024-05-02");

    // Today's post exists but never got an id attached.
    orchestrator
        .ledger()
        .insert(&PostDraft::new(today, 25, 0))
        .unwrap();

    let outcome = orchestrator.run_vote_cycle(today, tomorrow).await.unwrap();
    assert!(matches!(outcome, VoteOutcome::DefaultedNoPost));
    assert!(fetched.lock().unwrap().is_empty());

    let record = orchestrator.ledger().get_record(tomorrow).unwrap().unwrap();
    assert_eq!(record.water_amount, 25);
    assert_eq!(record.vote_count, 0);
}

#[tokio::test]
async fn test_votes_decide_tomorrows_amount() {
    let (orchestrator, fetched) =
        orchestrator_with(CommentGraph::new(vec!["10 ml", "10ml", "15 ml"]));
    let today = date("2024-05-01");
    let tomorrow = date("2024-05-02");

    orchestrator
        .ledger()
        .insert(&PostDraft::new(today, 25, 0))
        .unwrap();
    orchestrator.ledger().attach_media_id(today, "MEDIA1").unwrap();

    let outcome = orchestrator.run_vote_cycle(today, tomorrow).await.unwrap();
    match outcome {
        VoteOutcome::Tallied(result) => {
            assert_eq!(result.water_amount, 10);
            assert_eq!(result.vote_count, 2);
        }
        other => panic!("expected Tallied, got {:?}", other),
    }
    assert_eq!(*fetched.lock().unwrap(), vec!["MEDIA1".to_string()]);

    let record = orchestrator.ledger().get_record(tomorrow).unwrap().unwrap();
    assert_eq!(record.water_amount, 10);
    assert_eq!(record.vote_count, 2);
}

#[tokio::test]
async fn test_tie_resolves_to_first_seen_amount() {
    let (orchestrator, _) = orchestrator_with(CommentGraph::new(vec![
        "7ml", "7ml", "7ml", "9ml", "9ml", "9ml",
    ]));
    let today = date("2024-05-01");
    let tomorrow = date("2024-05-02");

    orchestrator
        .ledger()
        .insert(&PostDraft::new(today, 25, 0))
        .unwrap();
    orchestrator.ledger().attach_media_id(today, "MEDIA1").unwrap();

    orchestrator.run_vote_cycle(today, tomorrow).await.unwrap();

    let record = orchestrator.ledger().get_record(tomorrow).unwrap().unwrap();
    assert_eq!(record.water_amount, 7);
    assert_eq!(record.vote_count, 3);
}

#[tokio::test]
async fn test_no_valid_votes_defaults_tomorrow() {
    let (orchestrator, _) = orchestrator_with(CommentGraph::new(vec![
        "love this plant",
        "water it lots",
    ]));
    let today = date("2024-05-01");
    let tomorrow = date("2024-05-02");

    orchestrator
        .ledger()
        .insert(&PostDraft::new(today, 25, 0))
        .unwrap();
    orchestrator.ledger().attach_media_id(today, "MEDIA1").unwrap();

    let outcome = orchestrator.run_vote_cycle(today, tomorrow).await.unwrap();
    assert!(matches!(outcome, VoteOutcome::DefaultedNoVotes));

    let record = orchestrator.ledger().get_record(tomorrow).unwrap().unwrap();
    assert_eq!(record.water_amount, 25);
    assert_eq!(record.vote_count, 0);
}

#[tokio::test]
async fn test_comment_fetch_failure_surfaces_without_persisting() {
    let mut graph = CommentGraph::new(vec!["10ml"]);
    graph.fail_fetch = true;
    let (orchestrator, _) = orchestrator_with(graph);
    let today = date("2024-05-01");
    let tomorrow = date("2024-05-02");

    orchestrator
        .ledger()
        .insert(&PostDraft::new(today, 25, 0))
        .unwrap();
    orchestrator.ledger().attach_media_id(today, "MEDIA1").unwrap();

    let err = orchestrator
        .run_vote_cycle(today, tomorrow)
        .await
        .unwrap_err();
    assert!(matches!(err, CycleError::Graph(_)));

    // Tomorrow's row was not written.
    assert!(orchestrator.ledger().get_record(tomorrow).unwrap().is_none());
}

#[tokio::test]
async fn test_vote_then_posting_cycle_waters_winning_amount() {
    // Full two-day handoff: votes persist tomorrow's amount, and the
    // next posting run reads it back.
    let (orchestrator, _) =
        orchestrator_with(CommentGraph::new(vec!["30ml", "30 ml", "12ml"]));
    let today = date("2024-05-01");
    let tomorrow = date("2024-05-02");

    orchestrator
        .ledger()
        .insert(&PostDraft::new(today, 25, 0))
        .unwrap();
    orchestrator.ledger().attach_media_id(today, "MEDIA1").unwrap();

    orchestrator.run_vote_cycle(today, tomorrow).await.unwrap();

    let record = orchestrator.ledger().get_record(tomorrow).unwrap().unwrap();
    assert_eq!(record.water_amount, 30);
    assert_eq!(record.vote_count, 2);
}
