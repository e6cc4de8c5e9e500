use rush_core::model::ImageMatch;

use super::{Verdict, numbered, pick_option};

pub fn render(image: &ImageMatch) -> String {
    format!(
        "What does this picture show?\n\n    {}\n\n{}\n\nAnswer with the option number or the word itself.",
        image.image_url(),
        numbered(image.options())
    )
}

pub fn check(image: &ImageMatch, input: &str) -> Verdict {
    match pick_option(image.options(), input) {
        Some(option) if image.is_correct(option) => Verdict::Correct,
        _ => Verdict::Incorrect,
    }
}
