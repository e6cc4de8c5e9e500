mod ids;
mod language;
mod question;
mod summary;

pub use ids::{QuestionId, SessionId};
pub use language::{LanguageCode, LanguageError};
pub use question::{
    FillInTheBlank, ImageMatch, Level, Question, QuestionError, QuestionKind, QuestionPayload,
    SentenceScramble,
};
pub use summary::{RushSummary, RushSummaryError};
