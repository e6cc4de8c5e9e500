use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::api_client::ApiClient;
use crate::error::SubmitError;
use crate::protocol::{SCORE_ENDPOINT, ScoreSubmission};

/// Accepts the final score of a completed session.
#[async_trait]
pub trait ScoreSink: Send + Sync {
    /// Submits a final score.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError` when the submission could not be delivered.
    /// Callers log this and move on; the score is not retried or queued.
    async fn submit_score(&self, score: u32) -> Result<(), SubmitError>;
}

/// HTTP sink backed by the progress endpoint. Authentication rides on the
/// shared [`ApiClient`] credential lookup.
pub struct HttpScoreSink {
    client: Arc<ApiClient>,
}

impl HttpScoreSink {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScoreSink for HttpScoreSink {
    async fn submit_score(&self, score: u32) -> Result<(), SubmitError> {
        self.client
            .post_json(SCORE_ENDPOINT, &ScoreSubmission { score })
            .await?;
        info!(target: "rush_score", score, "final score submitted");
        Ok(())
    }
}
