use rush_core::model::SentenceScramble;

use super::Verdict;

pub fn render(scramble: &SentenceScramble) -> String {
    let bank = scramble
        .shuffled_words()
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("  ");
    format!("Build the sentence from these words:\n\n    {bank}\n\nType the full sentence in the right order.")
}

pub fn check(scramble: &SentenceScramble, input: &str) -> Verdict {
    if scramble.is_correct(input) {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}
