use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use rush_core::model::{LanguageCode, QuestionId, QuestionKind};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for one solved question.
///
/// The browser build of this game keeps the same data in `localStorage`
/// under `seenIds:<kind>`; here it is a proper ledger keyed by
/// (question, language) so switching the learned language keeps separate
/// histories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenQuestionRecord {
    pub question_id: QuestionId,
    pub language: LanguageCode,
    pub kind: QuestionKind,
    pub seen_at: DateTime<Utc>,
}

/// Repository contract for the seen-question ledger.
#[async_trait]
pub trait SeenQuestionRepository: Send + Sync {
    /// Record a solved question. Idempotent: marking the same question
    /// twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn mark_seen(&self, record: &SeenQuestionRecord) -> Result<(), StorageError>;

    /// Whether the player has already solved this question in this language.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on lookup failures.
    async fn is_seen(
        &self,
        language: &LanguageCode,
        question_id: &QuestionId,
    ) -> Result<bool, StorageError>;

    /// Number of solved questions recorded for a language.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on lookup failures.
    async fn seen_count(&self, language: &LanguageCode) -> Result<u64, StorageError>;

    /// Forget every solved question for a language; returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear_language(&self, language: &LanguageCode) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and ephemeral play.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    seen: Arc<Mutex<HashMap<(String, String), SeenQuestionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(language: &LanguageCode, question_id: &QuestionId) -> (String, String) {
        (language.as_str().to_string(), question_id.as_str().to_string())
    }
}

#[async_trait]
impl SeenQuestionRepository for InMemoryRepository {
    async fn mark_seen(&self, record: &SeenQuestionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .seen
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .entry(Self::key(&record.language, &record.question_id))
            .or_insert_with(|| record.clone());
        Ok(())
    }

    async fn is_seen(
        &self,
        language: &LanguageCode,
        question_id: &QuestionId,
    ) -> Result<bool, StorageError> {
        let guard = self
            .seen
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.contains_key(&Self::key(language, question_id)))
    }

    async fn seen_count(&self, language: &LanguageCode) -> Result<u64, StorageError> {
        let guard = self
            .seen
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let count = guard
            .keys()
            .filter(|(lang, _)| lang == language.as_str())
            .count();
        Ok(count as u64)
    }

    async fn clear_language(&self, language: &LanguageCode) -> Result<u64, StorageError> {
        let mut guard = self
            .seen
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|(lang, _), _| lang != language.as_str());
        Ok((before - guard.len()) as u64)
    }
}

/// Aggregates the ledger behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub seen: Arc<dyn SeenQuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            seen: Arc::new(InMemoryRepository::new()),
        }
    }
}
