use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::SessionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RushSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("total answered ({total}) does not match outcome counts ({sum})")]
    CountMismatch { total: u32, sum: u32 },
}

/// Aggregate result of one finished rush session, backing the game-over
/// screen and the single score submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RushSummary {
    session_id: SessionId,
    final_score: u32,
    correct: u32,
    wrong: u32,
    passed: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl RushSummary {
    /// Builds a summary from per-outcome counts.
    ///
    /// # Errors
    ///
    /// Returns `RushSummaryError::InvalidTimeRange` if `completed_at` is
    /// before `started_at`.
    pub fn new(
        session_id: SessionId,
        final_score: u32,
        correct: u32,
        wrong: u32,
        passed: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, RushSummaryError> {
        if completed_at < started_at {
            return Err(RushSummaryError::InvalidTimeRange);
        }
        Ok(Self {
            session_id,
            final_score,
            correct,
            wrong,
            passed,
            started_at,
            completed_at,
        })
    }

    /// Rehydrates a summary carrying a precomputed total.
    ///
    /// # Errors
    ///
    /// Returns `RushSummaryError::CountMismatch` if the total does not equal
    /// the sum of the per-outcome counts.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        session_id: SessionId,
        final_score: u32,
        total_answered: u32,
        correct: u32,
        wrong: u32,
        passed: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, RushSummaryError> {
        let sum = correct + wrong + passed;
        if sum != total_answered {
            return Err(RushSummaryError::CountMismatch {
                total: total_answered,
                sum,
            });
        }
        Self::new(
            session_id,
            final_score,
            correct,
            wrong,
            passed,
            started_at,
            completed_at,
        )
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn final_score(&self) -> u32 {
        self.final_score
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn passed(&self) -> u32 {
        self.passed
    }

    #[must_use]
    pub fn total_answered(&self) -> u32 {
        self.correct + self.wrong + self.passed
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
