use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("language code cannot be empty")]
    Empty,

    #[error("invalid language code: {0}")]
    Invalid(String),
}

/// Learned-language code as the backend expects it (`en`, `de`, `tr-TR`, ...).
///
/// Lowercased on construction; only ASCII letters and `-` are accepted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Validates and normalizes a language code.
    ///
    /// # Errors
    ///
    /// Returns `LanguageError` if the code is empty or contains characters
    /// other than ASCII letters and `-`.
    pub fn new(code: impl AsRef<str>) -> Result<Self, LanguageError> {
        let trimmed = code.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LanguageError::Empty);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return Err(LanguageError::Invalid(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageCode {
    /// The original client starts every player on English.
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = LanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageCode({})", self.0)
    }
}
