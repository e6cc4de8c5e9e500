//! Wire shapes for the two backend endpoints this client calls.
//!
//! The supply response is `{ type, data, level, id? }` where `data` is an
//! opaque per-kind object. Unknown `type` tags decode into
//! [`QuestionPayload::Unsupported`] so the controller can skip them
//! visibly; only malformed JSON is a decode error.

use serde::{Deserialize, Serialize};

use rush_core::model::{
    FillInTheBlank, ImageMatch, Level, Question, QuestionId, QuestionKind, QuestionPayload,
    SentenceScramble,
};

use crate::error::SupplyError;

/// Path of the random-question endpoint, relative to the API base URL.
pub const QUESTION_ENDPOINT: &str = "api/games/mixed-rush/random-question";

/// Path of the score-submission endpoint, relative to the API base URL.
pub const SCORE_ENDPOINT: &str = "api/progress/submit-score";

fn default_level() -> u8 {
    1
}

/// Raw supply response before per-kind decoding.
#[derive(Debug, Deserialize)]
pub struct QuestionWire {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_level")]
    pub level: u8,
    pub data: serde_json::Value,
    // The backend is not consistent about which id field it sets.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default, rename = "_id")]
    pub document_id: Option<String>,
}

impl QuestionWire {
    fn question_id(&self) -> Option<QuestionId> {
        self.id
            .as_deref()
            .or(self.game_id.as_deref())
            .or(self.document_id.as_deref())
            .map(QuestionId::new)
    }
}

#[derive(Debug, Deserialize)]
struct SentenceScrambleWire {
    shuffled_words: Vec<String>,
    correct_sentence: String,
}

#[derive(Debug, Deserialize)]
struct ImageMatchWire {
    image_url: String,
    options: Vec<String>,
    answer: String,
}

#[derive(Debug, Deserialize)]
struct FillInTheBlankWire {
    sentence_parts: [String; 2],
    options: Vec<String>,
    answer: String,
}

/// Decodes a supply response into a domain question.
///
/// # Errors
///
/// Returns `SupplyError::Json` when `data` does not match the shape the
/// type tag promises, and `SupplyError::Question` when it fails domain
/// validation. An unrecognized tag is not an error.
pub fn decode_question(wire: QuestionWire) -> Result<Question, SupplyError> {
    let id = wire.question_id();
    let level = Level::new(wire.level);
    let payload = match wire.kind.parse::<QuestionKind>() {
        Ok(QuestionKind::SentenceScramble) => {
            let data: SentenceScrambleWire = serde_json::from_value(wire.data)?;
            QuestionPayload::SentenceScramble(SentenceScramble::new(
                data.shuffled_words,
                data.correct_sentence,
            )?)
        }
        Ok(QuestionKind::ImageMatch) => {
            let data: ImageMatchWire = serde_json::from_value(wire.data)?;
            QuestionPayload::ImageMatch(ImageMatch::new(
                &data.image_url,
                data.options,
                data.answer,
            )?)
        }
        Ok(QuestionKind::FillInTheBlank) => {
            let data: FillInTheBlankWire = serde_json::from_value(wire.data)?;
            QuestionPayload::FillInTheBlank(FillInTheBlank::new(
                data.sentence_parts,
                data.options,
                data.answer,
            )?)
        }
        Err(_) => QuestionPayload::Unsupported { kind: wire.kind },
    };
    Ok(Question::new(id, level, payload))
}

/// Body of the score-submission POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSubmission {
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Question {
        let wire: QuestionWire = serde_json::from_str(json).unwrap();
        decode_question(wire).unwrap()
    }

    #[test]
    fn decodes_sentence_scramble() {
        let question = decode(
            r#"{
                "type": "sentence-scramble",
                "level": 3,
                "id": "abc123",
                "data": {
                    "shuffled_words": ["geht", "sie", "heim"],
                    "correct_sentence": "sie geht heim"
                }
            }"#,
        );
        assert_eq!(question.level(), Level::new(3));
        assert_eq!(question.id().map(QuestionId::as_str), Some("abc123"));
        match question.payload() {
            QuestionPayload::SentenceScramble(scramble) => {
                assert!(scramble.is_correct("sie geht heim"));
            }
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn decodes_image_match_and_fill_in_the_blank() {
        let image = decode(
            r#"{
                "type": "image-match",
                "level": 2,
                "game_id": "img-7",
                "data": {
                    "image_url": "https://cdn.example.com/apfel.png",
                    "options": ["Apfel", "Birne"],
                    "answer": "Apfel"
                }
            }"#,
        );
        assert_eq!(image.kind(), Some(QuestionKind::ImageMatch));
        assert_eq!(image.id().map(QuestionId::as_str), Some("img-7"));

        let blank = decode(
            r#"{
                "type": "fill-in-the-blank",
                "level": 5,
                "_id": "65f1c0de",
                "data": {
                    "sentence_parts": ["Ich ", " Wasser."],
                    "options": ["trinke", "esse"],
                    "answer": "trinke"
                }
            }"#,
        );
        assert_eq!(blank.kind(), Some(QuestionKind::FillInTheBlank));
        assert_eq!(blank.id().map(QuestionId::as_str), Some("65f1c0de"));
    }

    #[test]
    fn unknown_kind_is_kept_not_dropped() {
        let question = decode(
            r#"{ "type": "word-duel", "level": 4, "data": { "whatever": true } }"#,
        );
        assert_eq!(question.kind(), None);
        assert_eq!(question.payload().kind_tag(), "word-duel");
    }

    #[test]
    fn missing_level_defaults_to_one() {
        let question = decode(
            r#"{
                "type": "fill-in-the-blank",
                "data": {
                    "sentence_parts": ["a", "b"],
                    "options": ["x", "y"],
                    "answer": "x"
                }
            }"#,
        );
        assert_eq!(question.level(), Level::new(1));
    }

    #[test]
    fn mismatched_data_shape_is_a_decode_error() {
        let wire: QuestionWire = serde_json::from_str(
            r#"{ "type": "image-match", "level": 1, "data": { "options": [] } }"#,
        )
        .unwrap();
        assert!(matches!(
            decode_question(wire),
            Err(SupplyError::Json(_))
        ));
    }

    #[test]
    fn score_submission_serializes_as_plain_object() {
        let body = serde_json::to_string(&ScoreSubmission { score: 42 }).unwrap();
        assert_eq!(body, r#"{"score":42}"#);
    }
}
