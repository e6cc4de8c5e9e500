use rush_core::model::FillInTheBlank;

use super::{Verdict, numbered, pick_option};

pub fn render(blank: &FillInTheBlank) -> String {
    let [before, after] = blank.sentence_parts();
    format!(
        "Fill in the blank:\n\n    {before}____{after}\n\n{}\n\nAnswer with the option number or the word itself.",
        numbered(blank.options())
    )
}

pub fn check(blank: &FillInTheBlank, input: &str) -> Verdict {
    match pick_option(blank.options(), input) {
        Some(option) if blank.is_correct(option) => Verdict::Correct,
        _ => Verdict::Incorrect,
    }
}
