use thiserror::Error;

use crate::model::{LanguageError, QuestionError, RushSummaryError};
use crate::session::{RushConfigError, RushError};

/// Umbrella error for callers that do not care which core rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Rush(#[from] RushError),
    #[error(transparent)]
    Config(#[from] RushConfigError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error(transparent)]
    Summary(#[from] RushSummaryError),
}
