//! Sentence splitting for captions.
//!
//! A sentence is a run of text up to and including a run of terminal
//! punctuation (`.`, `!`, `?`) plus any closing quotes that follow it. Text
//! after the last terminator becomes a final sentence of its own.

use regex::Regex;
use std::sync::OnceLock;

const SENTENCE_PATTERN: &str = "[^.!?]*[.!?]+[\"'\u{201D}\u{2019}\u{00BB}]*";

/// Global sentence matcher (lazy initialization).
static SENTENCE: OnceLock<Regex> = OnceLock::new();

fn sentence_regex() -> &'static Regex {
    SENTENCE.get_or_init(|| Regex::new(SENTENCE_PATTERN).expect("sentence pattern should compile"))
}

/// Split scene text into trimmed, non-empty sentences in reading order.
///
/// Blank text yields no sentences.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut consumed = 0;

    for m in sentence_regex().find_iter(text) {
        push_trimmed(&mut sentences, m.as_str());
        consumed = m.end();
    }
    push_trimmed(&mut sentences, &text[consumed..]);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
