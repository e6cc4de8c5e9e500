//! Terminal widgets, one per question kind.
//!
//! Each widget turns a payload into lines for the terminal and a typed
//! answer line into a verdict. Widgets know nothing about the countdown or
//! the score; the session controller owns those.

mod fill_blank;
mod image_match;
mod sentence_scramble;

use rush_core::model::QuestionPayload;

/// What a widget reports back for an answer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// Renders the current question for the terminal.
///
/// Unknown kinds get an explicit error card; they are never dropped
/// silently.
#[must_use]
pub fn render(payload: &QuestionPayload) -> String {
    match payload {
        QuestionPayload::SentenceScramble(scramble) => sentence_scramble::render(scramble),
        QuestionPayload::ImageMatch(image) => image_match::render(image),
        QuestionPayload::FillInTheBlank(blank) => fill_blank::render(blank),
        QuestionPayload::Unsupported { kind } => {
            format!("This client cannot play '{kind}' questions yet.")
        }
    }
}

/// Evaluates a typed answer against the current question.
///
/// Returns `None` for unsupported kinds, which have no answers to check.
#[must_use]
pub fn evaluate(payload: &QuestionPayload, input: &str) -> Option<Verdict> {
    let verdict = match payload {
        QuestionPayload::SentenceScramble(scramble) => sentence_scramble::check(scramble, input),
        QuestionPayload::ImageMatch(image) => image_match::check(image, input),
        QuestionPayload::FillInTheBlank(blank) => fill_blank::check(blank, input),
        QuestionPayload::Unsupported { .. } => return None,
    };
    Some(verdict)
}

/// Resolves `input` as either a 1-based option number or the option text.
fn pick_option<'a>(options: &'a [String], input: &str) -> Option<&'a str> {
    let input = input.trim();
    if let Ok(number) = input.parse::<usize>() {
        if (1..=options.len()).contains(&number) {
            return options.get(number - 1).map(String::as_str);
        }
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(input))
        .map(String::as_str)
}

fn numbered(options: &[String]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("  {}. {option}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
