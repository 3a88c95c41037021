//! Publish-completion poller.
//!
//! A freshly created media container is not publishable until the
//! upstream system has ingested the video. The poller waits out the
//! ingestion delay, then drives the publish call to completion with a
//! bounded retry budget on the "media still processing" error code.
//! Any other error code fails immediately.

use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapters::{GraphError, PublishResponse, SocialGraph};

/// Structured error code meaning the media container is still being
/// processed upstream and the publish call should be retried.
pub const MEDIA_STILL_PROCESSING: i64 = 9007;

/// Timing and budget for the publish loop.
///
/// Defaults match the device deployment; tests inject zero delays.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait before the first publish attempt, giving the upstream
    /// system time to ingest the video.
    pub pre_publish_delay: Duration,
    /// Wait between retries while the media is still processing.
    pub retry_delay: Duration,
    /// Total publish attempts before giving up.
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            pre_publish_delay: Duration::from_secs(15),
            retry_delay: Duration::from_secs(40),
            max_attempts: 5,
        }
    }
}

/// Terminal outcomes of the publish loop.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The retry budget ran out while the media was still processing.
    #[error("publish retries exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// The API returned an error code other than "still processing".
    #[error("publish failed with non-retryable error {code}: {message}")]
    NonRetryable { code: i64, message: String },

    #[error("publish transport failure: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Drives the publish call for one creation id to a terminal state.
#[derive(Debug, Clone, Default)]
pub struct PublishPoller {
    config: PollerConfig,
}

impl PublishPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    /// Publish the container, retrying on the "still processing" code.
    ///
    /// Strictly sequential: attempts never overlap, and the waits are
    /// suspensions, not busy-polling.
    pub async fn publish(
        &self,
        graph: &dyn SocialGraph,
        creation_id: &str,
        user_id: &str,
    ) -> Result<PublishResponse, PublishError> {
        info!(
            %creation_id,
            delay_secs = self.config.pre_publish_delay.as_secs(),
            "Waiting for upstream ingestion before publishing"
        );
        tokio::time::sleep(self.config.pre_publish_delay).await;

        let mut remaining = self.config.max_attempts;

        loop {
            match graph.publish(creation_id, user_id).await {
                Ok(response) => {
                    info!(%creation_id, "Post successfully published");
                    return Ok(response);
                }
                Err(GraphError::Api { code, message }) if code == MEDIA_STILL_PROCESSING => {
                    remaining -= 1;
                    if remaining == 0 {
                        error!(
                            %creation_id,
                            attempts = self.config.max_attempts,
                            "Media never finished processing, giving up"
                        );
                        return Err(PublishError::Exhausted {
                            attempts: self.config.max_attempts,
                        });
                    }

                    warn!(
                        %creation_id,
                        remaining,
                        retry_secs = self.config.retry_delay.as_secs(),
                        %message,
                        "Media still processing, will retry"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(GraphError::Api { code, message }) => {
                    error!(%creation_id, code, %message, "Publish failed with non-retryable error");
                    return Err(PublishError::NonRetryable { code, message });
                }
                Err(GraphError::Transport(e)) => {
                    error!(%creation_id, error = %e, "Publish transport failure");
                    return Err(PublishError::Transport(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::adapters::Comment;

    /// Graph stub replaying a scripted sequence of publish outcomes.
    struct ScriptedGraph {
        responses: Mutex<Vec<Result<PublishResponse, GraphError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedGraph {
        fn new(responses: Vec<Result<PublishResponse, GraphError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl SocialGraph for ScriptedGraph {
        async fn create_container(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Ok("CREATION".to_string())
        }

        async fn publish(&self, _: &str, _: &str) -> Result<PublishResponse, GraphError> {
            *self.calls.lock().unwrap() += 1;
            self.responses.lock().unwrap().remove(0)
        }

        async fn fetch_comments(&self, _: &str) -> Result<Vec<Comment>> {
            Ok(Vec::new())
        }
    }

    fn fast_poller() -> PublishPoller {
        PublishPoller::new(PollerConfig {
            pre_publish_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            max_attempts: 5,
        })
    }

    fn still_processing() -> GraphError {
        GraphError::Api {
            code: MEDIA_STILL_PROCESSING,
            message: "Media is not ready for publishing".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_succeeds_first_try() {
        let graph = ScriptedGraph::new(vec![Ok(PublishResponse {
            id: Some("MEDIA1".to_string()),
        })]);

        let result = fast_poller().publish(&graph, "C1", "U1").await.unwrap();
        assert_eq!(result.id.as_deref(), Some("MEDIA1"));
        assert_eq!(graph.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_through_still_processing() {
        let graph = ScriptedGraph::new(vec![
            Err(still_processing()),
            Err(still_processing()),
            Ok(PublishResponse {
                id: Some("MEDIA2".to_string()),
            }),
        ]);

        let result = fast_poller().publish(&graph, "C1", "U1").await.unwrap();
        assert_eq!(result.id.as_deref(), Some("MEDIA2"));
        assert_eq!(graph.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_after_five_attempts() {
        let graph = ScriptedGraph::new(vec![
            Err(still_processing()),
            Err(still_processing()),
            Err(still_processing()),
            Err(still_processing()),
            Err(still_processing()),
            // A sixth attempt would succeed; the poller must not get here.
            Ok(PublishResponse {
                id: Some("MEDIA3".to_string()),
            }),
        ]);

        let err = fast_poller().publish(&graph, "C1", "U1").await.unwrap_err();
        assert!(matches!(err, PublishError::Exhausted { attempts: 5 }));
        assert_eq!(graph.call_count(), 5);
    }

    #[tokio::test]
    async fn test_non_retryable_code_fails_immediately() {
        let graph = ScriptedGraph::new(vec![Err(GraphError::Api {
            code: 190,
            message: "Invalid OAuth access token".to_string(),
        })]);

        let err = fast_poller().publish(&graph, "C1", "U1").await.unwrap_err();
        match err {
            PublishError::NonRetryable { code, message } => {
                assert_eq!(code, 190);
                assert!(message.contains("OAuth"));
            }
            other => panic!("expected NonRetryable, got {:?}", other),
        }
        assert_eq!(graph.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let graph = ScriptedGraph::new(vec![Err(GraphError::Transport(anyhow::anyhow!(
            "connection reset"
        )))]);

        let err = fast_poller().publish(&graph, "C1", "U1").await.unwrap_err();
        assert!(matches!(err, PublishError::Transport(_)));
        assert_eq!(graph.call_count(), 1);
    }
}
