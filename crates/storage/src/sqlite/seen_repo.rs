use sqlx::Row;

use rush_core::model::{LanguageCode, QuestionId};

use super::SqliteRepository;
use crate::repository::{SeenQuestionRecord, SeenQuestionRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl SeenQuestionRepository for SqliteRepository {
    async fn mark_seen(&self, record: &SeenQuestionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO seen_questions (question_id, language, kind, seen_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(question_id, language) DO NOTHING
            ",
        )
        .bind(record.question_id.as_str())
        .bind(record.language.as_str())
        .bind(record.kind.as_tag())
        .bind(record.seen_at)
        .execute(self.pool())
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn is_seen(
        &self,
        language: &LanguageCode,
        question_id: &QuestionId,
    ) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r"
            SELECT 1 FROM seen_questions
            WHERE question_id = ?1 AND language = ?2
            ",
        )
        .bind(question_id.as_str())
        .bind(language.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        Ok(row.is_some())
    }

    async fn seen_count(&self, language: &LanguageCode) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS n FROM seen_questions WHERE language = ?1
            ",
        )
        .bind(language.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(|e| StorageError::Serialization(e.to_string()))?;
        u64::try_from(n).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn clear_language(&self, language: &LanguageCode) -> Result<u64, StorageError> {
        let res = sqlx::query(
            r"
            DELETE FROM seen_questions WHERE language = ?1
            ",
        )
        .bind(language.as_str())
        .execute(self.pool())
        .await
        .map_err(conn)?;

        Ok(res.rows_affected())
    }
}
