use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("sentence scramble needs at least two words")]
    NotEnoughWords,

    #[error("correct sentence cannot be empty")]
    EmptySentence,

    #[error("choice question needs at least two options")]
    NotEnoughOptions,

    #[error("answer {answer:?} is not among the options")]
    AnswerNotInOptions { answer: String },

    #[error("invalid image url: {0}")]
    InvalidImageUrl(String),

    #[error("unknown question kind: {0}")]
    UnknownKind(String),
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// Difficulty tag attached to every question.
///
/// Levels 1–5 map to score and time-bonus table entries; any other value is
/// representable but scores nothing (see [`crate::scoring`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    #[must_use]
    pub const fn new(level: u8) -> Self {
        Self(level)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// The three mini-game kinds sharing the correct/incorrect reporting contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SentenceScramble,
    ImageMatch,
    FillInTheBlank,
}

impl QuestionKind {
    /// Wire tag used by the question-supply endpoint.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            QuestionKind::SentenceScramble => "sentence-scramble",
            QuestionKind::ImageMatch => "image-match",
            QuestionKind::FillInTheBlank => "fill-in-the-blank",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sentence-scramble" => Ok(QuestionKind::SentenceScramble),
            "image-match" => Ok(QuestionKind::ImageMatch),
            "fill-in-the-blank" => Ok(QuestionKind::FillInTheBlank),
            other => Err(QuestionError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

//
// ─── PAYLOADS ──────────────────────────────────────────────────────────────────
//

/// Word-ordering payload: the player rebuilds the sentence from a shuffled bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceScramble {
    shuffled_words: Vec<String>,
    correct_sentence: String,
}

impl SentenceScramble {
    /// Validates a scramble payload.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the word bank has fewer than two words or
    /// the reference sentence is empty.
    pub fn new(
        shuffled_words: Vec<String>,
        correct_sentence: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let correct_sentence = correct_sentence.into();
        if shuffled_words.len() < 2 {
            return Err(QuestionError::NotEnoughWords);
        }
        if correct_sentence.trim().is_empty() {
            return Err(QuestionError::EmptySentence);
        }
        Ok(Self {
            shuffled_words,
            correct_sentence,
        })
    }

    #[must_use]
    pub fn shuffled_words(&self) -> &[String] {
        &self.shuffled_words
    }

    #[must_use]
    pub fn correct_sentence(&self) -> &str {
        &self.correct_sentence
    }

    /// Whitespace-insensitive comparison of a candidate sentence against the
    /// reference. The original widget joins the dragged words with single
    /// spaces; normalizing here keeps typed input equivalent.
    #[must_use]
    pub fn is_correct(&self, candidate: &str) -> bool {
        normalize_sentence(candidate) == normalize_sentence(&self.correct_sentence)
    }
}

fn normalize_sentence(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Picture payload: the player names what the image shows from fixed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch {
    image_url: Url,
    options: Vec<String>,
    answer: String,
}

impl ImageMatch {
    /// Validates an image-match payload.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the url does not parse, fewer than two
    /// options are given, or the answer is not among them.
    pub fn new(
        image_url: &str,
        options: Vec<String>,
        answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let image_url = Url::parse(image_url)
            .map_err(|_| QuestionError::InvalidImageUrl(image_url.to_string()))?;
        let answer = answer.into();
        validate_options(&options, &answer)?;
        Ok(Self {
            image_url,
            options,
            answer,
        })
    }

    #[must_use]
    pub fn image_url(&self) -> &Url {
        &self.image_url
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        option == self.answer
    }

    /// Revealed on the game-over / feedback screen.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// Gap-fill payload: a sentence split around one blank plus answer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillInTheBlank {
    sentence_parts: [String; 2],
    options: Vec<String>,
    answer: String,
}

impl FillInTheBlank {
    /// Validates a gap-fill payload.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if fewer than two options are given or the
    /// answer is not among them.
    pub fn new(
        sentence_parts: [String; 2],
        options: Vec<String>,
        answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let answer = answer.into();
        validate_options(&options, &answer)?;
        Ok(Self {
            sentence_parts,
            options,
            answer,
        })
    }

    #[must_use]
    pub fn sentence_parts(&self) -> &[String; 2] {
        &self.sentence_parts
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        option == self.answer
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }
}

fn validate_options(options: &[String], answer: &str) -> Result<(), QuestionError> {
    if options.len() < 2 {
        return Err(QuestionError::NotEnoughOptions);
    }
    if !options.iter().any(|o| o == answer) {
        return Err(QuestionError::AnswerNotInOptions {
            answer: answer.to_string(),
        });
    }
    Ok(())
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Per-kind question payload.
///
/// `Unsupported` keeps questions with a type tag this client does not know,
/// so callers can skip them visibly instead of dropping them at decode time.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionPayload {
    SentenceScramble(SentenceScramble),
    ImageMatch(ImageMatch),
    FillInTheBlank(FillInTheBlank),
    Unsupported { kind: String },
}

impl QuestionPayload {
    /// The recognized kind, or `None` for an unsupported tag.
    #[must_use]
    pub fn kind(&self) -> Option<QuestionKind> {
        match self {
            QuestionPayload::SentenceScramble(_) => Some(QuestionKind::SentenceScramble),
            QuestionPayload::ImageMatch(_) => Some(QuestionKind::ImageMatch),
            QuestionPayload::FillInTheBlank(_) => Some(QuestionKind::FillInTheBlank),
            QuestionPayload::Unsupported { .. } => None,
        }
    }

    /// The wire tag, including unrecognized ones.
    #[must_use]
    pub fn kind_tag(&self) -> &str {
        match self {
            QuestionPayload::Unsupported { kind } => kind,
            other => other
                .kind()
                .map(QuestionKind::as_tag)
                .unwrap_or("unsupported"),
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.kind().is_some()
    }
}

/// One question as served by the supply endpoint: an optional server id, a
/// difficulty level, and the per-kind payload. Replaced, never mutated, as
/// the session advances.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: Option<QuestionId>,
    level: Level,
    payload: QuestionPayload,
}

impl Question {
    #[must_use]
    pub fn new(id: Option<QuestionId>, level: Level, payload: QuestionPayload) -> Self {
        Self { id, level, payload }
    }

    #[must_use]
    pub fn id(&self) -> Option<&QuestionId> {
        self.id.as_ref()
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn payload(&self) -> &QuestionPayload {
        &self.payload
    }

    #[must_use]
    pub fn kind(&self) -> Option<QuestionKind> {
        self.payload.kind()
    }
}
