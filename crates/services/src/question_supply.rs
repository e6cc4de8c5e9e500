use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};

use rush_core::model::{LanguageCode, Question};
use storage::repository::SeenQuestionRepository;

use crate::api_client::ApiClient;
use crate::error::SupplyError;
use crate::protocol::{QUESTION_ENDPOINT, QuestionWire, decode_question};

//
// ─── RETRY POLICY ──────────────────────────────────────────────────────────────
//

/// Bounded retry with exponential backoff and jitter.
///
/// The original client retried question fetches at some call sites and not
/// others; here every fetch goes through one policy and exhaustion surfaces
/// a visible error instead of a silent stall.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before retry number `attempt` (1-based), jittered so
    /// stampeding clients spread out.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(exp))
            .min(self.max_delay);
        let jitter_cap = backoff.as_millis() as u64 / 2;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_cap)
        };
        backoff + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250), Duration::from_secs(2))
    }
}

//
// ─── SUPPLY ────────────────────────────────────────────────────────────────────
//

/// One random question of the learned language.
#[async_trait]
pub trait QuestionSupply: Send + Sync {
    /// Fetches the next question.
    ///
    /// # Errors
    ///
    /// Returns `SupplyError` when no question could be obtained.
    async fn next_question(&self, language: &LanguageCode) -> Result<Question, SupplyError>;
}

/// HTTP supply backed by the mixed-rush random-question endpoint.
pub struct HttpQuestionSupply {
    client: Arc<ApiClient>,
    retry: RetryPolicy,
}

impl HttpQuestionSupply {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl QuestionSupply for HttpQuestionSupply {
    async fn next_question(&self, language: &LanguageCode) -> Result<Question, SupplyError> {
        let mut last_error = String::new();
        for attempt in 1..=self.retry.max_attempts() {
            if attempt > 1 {
                tokio::time::sleep(self.retry.delay_for(attempt)).await;
            }
            match self
                .client
                .get_json::<QuestionWire>(QUESTION_ENDPOINT, &[("lang", language.as_str())])
                .await
            {
                // Decode problems are server bugs, not transient transport
                // failures; retrying them would just re-fetch the same shape.
                Ok(wire) => return decode_question(wire),
                Err(err) => {
                    warn!(
                        target: "rush_supply",
                        %language,
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        error = %err,
                        "question fetch failed"
                    );
                    last_error = err.to_string();
                }
            }
        }
        Err(SupplyError::RetriesExhausted {
            attempts: self.retry.max_attempts(),
            last_error,
        })
    }
}

//
// ─── SEEN FILTER ───────────────────────────────────────────────────────────────
//

/// How many fresh draws to attempt before giving up on novelty; matches the
/// per-widget retry count of the original client.
const DEFAULT_MAX_DRAWS: u32 = 5;

/// Decorator that redraws questions the player has already solved.
///
/// When every draw comes back already-seen, the last draw is served anyway:
/// a repeated question beats a stalled countdown.
pub struct UnseenQuestionSupply<S> {
    inner: S,
    seen: Arc<dyn SeenQuestionRepository>,
    max_draws: u32,
}

impl<S: QuestionSupply> UnseenQuestionSupply<S> {
    #[must_use]
    pub fn new(inner: S, seen: Arc<dyn SeenQuestionRepository>) -> Self {
        Self {
            inner,
            seen,
            max_draws: DEFAULT_MAX_DRAWS,
        }
    }

    #[must_use]
    pub fn with_max_draws(mut self, max_draws: u32) -> Self {
        self.max_draws = max_draws.max(1);
        self
    }
}

#[async_trait]
impl<S: QuestionSupply> QuestionSupply for UnseenQuestionSupply<S> {
    async fn next_question(&self, language: &LanguageCode) -> Result<Question, SupplyError> {
        let mut last_draw = None;
        for draw in 1..=self.max_draws {
            let question = self.inner.next_question(language).await?;
            match question.id() {
                Some(id) if self.seen.is_seen(language, id).await? => {
                    debug!(target: "rush_supply", %language, %id, draw, "redrawing seen question");
                    last_draw = Some(question);
                }
                // Unidentified questions cannot be tracked; serve them as-is.
                _ => return Ok(question),
            }
        }
        match last_draw {
            Some(question) => {
                debug!(target: "rush_supply", %language, "every draw was seen, serving repeat");
                Ok(question)
            }
            None => self.inner.next_question(language).await,
        }
    }
}
