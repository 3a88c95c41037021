//! File hosting adapter.
//!
//! Uploads the recorded video to the file host and returns a short-lived
//! download link the graph API can ingest from. Links are created with a
//! ten minute expiry, a single allowed download, and auto-delete, so the
//! clip disappears once the social platform has fetched it.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::FileHostConfig;

use super::FileHost;

/// How long an uploaded link stays valid.
const LINK_EXPIRY_MINUTES: i64 = 10;

/// Client for the file hosting API.
pub struct FileHostClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    link: Option<String>,
    message: Option<String>,
}

impl FileHostClient {
    pub fn new(config: &FileHostConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_path.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl FileHost for FileHostClient {
    async fn upload(&self, video: &Path) -> Result<Option<String>> {
        info!(path = %video.display(), "Uploading video to file host");

        let file_name = video
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let bytes = tokio::fs::read(video)
            .await
            .with_context(|| format!("Failed to read video file: {}", video.display()))?;

        let expires = (Utc::now() + Duration::minutes(LINK_EXPIRY_MINUTES))
            .format("%Y-%m-%dT%H:%M:%S%.fZ")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("expires", expires.as_str()),
                ("maxDownloads", "1"),
                ("autoDelete", "true"),
            ])
            .multipart(form)
            .send()
            .await
            .context("Failed to send upload request")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Video upload failed: {}", body.trim());
        }

        let result: UploadResponse = response
            .json()
            .await
            .context("Failed to parse upload response")?;

        if !result.success {
            warn!(
                message = result.message.as_deref().unwrap_or("unknown"),
                "File host reported an unsuccessful upload"
            );
            return Ok(None);
        }

        Ok(result.link)
    }
}
