//! Adapter interfaces for external collaborators.
//!
//! The orchestrator never talks to hardware or HTTP APIs directly; it
//! goes through these traits so the daily cycle can be tested with
//! in-memory fakes.

pub mod camera;
pub mod filehost;
pub mod graph;
pub mod pump;

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

pub use camera::CameraRecorder;
pub use filehost::FileHostClient;
pub use graph::GraphClient;
pub use pump::PumpActuator;

/// A single audience comment on a published post.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
}

/// Response payload from a successful publish call.
///
/// The upstream API is supposed to return the external media id, but
/// the field is optional on the wire; callers treat a missing id as a
/// warning, not a failure.
#[derive(Debug, Clone)]
pub struct PublishResponse {
    pub id: Option<String>,
}

/// Error from a social graph call.
///
/// API-level failures keep the structured error code from the response
/// body; the publish poller branches on it to decide retryability.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Pump hardware driving the watering.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Run one watering of the given amount. Blocks for the duration
    /// of the pump run.
    async fn water(&self, amount_ml: u32) -> Result<()>;
}

/// Camera capturing the watering evidence.
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Record a clip and return the path of the finished mp4 file.
    async fn record(&self) -> Result<PathBuf>;
}

/// File hosting service that turns a local video into a retrievable URL.
#[async_trait]
pub trait FileHost: Send + Sync {
    /// Upload the file and return its download URL, or `None` when the
    /// host accepted the upload but returned no link.
    async fn upload(&self, video: &Path) -> Result<Option<String>>;
}

/// Social graph API surface consumed by the daily cycle.
#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Create a media container for the uploaded video; returns the
    /// creation id handle for the later publish call.
    async fn create_container(
        &self,
        user_id: &str,
        video_url: &str,
        caption: &str,
    ) -> Result<String>;

    /// Publish a previously created container.
    async fn publish(
        &self,
        creation_id: &str,
        user_id: &str,
    ) -> Result<PublishResponse, GraphError>;

    /// Fetch the comments on a published post.
    async fn fetch_comments(&self, media_id: &str) -> Result<Vec<Comment>>;
}
