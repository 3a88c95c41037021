//! Social graph API client.
//!
//! Thin reqwest wrapper around the handful of graph endpoints the daily
//! cycle needs: media container creation, publishing, comment fetching,
//! and the one-time account discovery used by `setup-account`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::GraphApiConfig;

use super::{Comment, GraphError, PublishResponse, SocialGraph};

/// Client for the social graph HTTP API.
pub struct GraphClient {
    access_token: String,
    /// Base path + API version, normalized to end with a slash.
    base_url: String,
    client: reqwest::Client,
}

/// Envelope for API-level errors: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// `{"id": "..."}` payload returned by container creation and publish.
#[derive(Debug, Deserialize)]
struct IdResult {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    #[serde(default)]
    data: Vec<CommentEntry>,
}

#[derive(Debug, Deserialize)]
struct CommentEntry {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    #[serde(default)]
    data: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BusinessAccountResult {
    instagram_business_account: Option<IdOnly>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

/// Result of account discovery (`setup-account`).
#[derive(Debug, Clone, serde::Serialize)]
pub struct AccountInfo {
    pub page_id: String,
    pub name: Option<String>,
    pub user_id: String,
}

impl GraphClient {
    pub fn new(config: &GraphApiConfig) -> Self {
        let mut base_url = format!("{}{}", config.base_path, config.version);
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            access_token: config.access_token.clone(),
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Build a full API URL for the given path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the page backing the API user, then resolve the business
    /// user id behind it. Used once when configuring a new account.
    pub async fn discover_account(&self) -> Result<AccountInfo> {
        info!("Fetching account information from the graph API");
        let url = self.api_url("me/accounts");
        let accounts: AccountData = self
            .client
            .get(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await
            .context("Failed to fetch accounts")?
            .error_for_status()
            .context("Account listing rejected")?
            .json()
            .await
            .context("Failed to parse account listing")?;

        let page = accounts
            .data
            .into_iter()
            .next()
            .context("No pages found for this access token")?;

        debug!(page_id = %page.id, "Querying business account user id");
        let url = self.api_url(&page.id);
        let result: BusinessAccountResult = self
            .client
            .get(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("fields", "instagram_business_account"),
            ])
            .send()
            .await
            .context("Failed to fetch business account id")?
            .error_for_status()
            .context("Business account lookup rejected")?
            .json()
            .await
            .context("Failed to parse business account response")?;

        let user_id = result
            .instagram_business_account
            .map(|a| a.id)
            .context("Page has no business account attached")?;

        info!(%user_id, "Resolved business user id");
        Ok(AccountInfo {
            page_id: page.id,
            name: page.name,
            user_id,
        })
    }
}

#[async_trait]
impl SocialGraph for GraphClient {
    async fn create_container(
        &self,
        user_id: &str,
        video_url: &str,
        caption: &str,
    ) -> Result<String> {
        info!("Creating media container");
        let url = self.api_url(&format!("{}/media", user_id));

        let response = self
            .client
            .post(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("video_url", video_url),
                ("caption", caption),
            ])
            .send()
            .await
            .context("Failed to send container creation request")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Media container creation failed: {}", body.trim());
        }

        let result: IdResult = response
            .json()
            .await
            .context("Failed to parse container creation response")?;

        result
            .id
            .context("Container creation response is missing a creation id")
    }

    async fn publish(
        &self,
        creation_id: &str,
        user_id: &str,
    ) -> Result<PublishResponse, GraphError> {
        debug!(%creation_id, "Attempting media publish");
        let url = self.api_url(&format!("{}/media_publish", user_id));

        let response = self
            .client
            .post(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("creation_id", creation_id),
            ])
            .send()
            .await
            .context("Failed to send publish request")?;

        if response.status().is_success() {
            let result: IdResult = response
                .json()
                .await
                .context("Failed to parse publish response")?;
            return Ok(PublishResponse { id: result.id });
        }

        // Keep the structured code so the poller can tell "still
        // processing" apart from permanent failures.
        let body = response
            .text()
            .await
            .context("Failed to read publish error body")?;
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(GraphError::Api {
                code: envelope.error.code,
                message: envelope.error.message,
            }),
            Err(_) => Err(GraphError::Transport(anyhow::anyhow!(
                "Unrecognized publish error response: {}",
                body.trim()
            ))),
        }
    }

    async fn fetch_comments(&self, media_id: &str) -> Result<Vec<Comment>> {
        info!(%media_id, "Fetching comments for post");
        let url = self.api_url(&format!("{}/comments", media_id));

        let comments: CommentData = self
            .client
            .get(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await
            .context("Failed to fetch comments")?
            .error_for_status()
            .context("Comment fetch rejected")?
            .json()
            .await
            .context("Failed to parse comments response")?;

        Ok(comments
            .data
            .into_iter()
            .map(|c| Comment { text: c.text })
            .collect())
    }
}
