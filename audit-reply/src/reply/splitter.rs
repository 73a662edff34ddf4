//! Positional splitting for completions that ignored every delimiter.

use super::RESPONSE_COUNT;
use super::segmenter::MIN_SEGMENT_CHARS;
use super::sentence::{char_len, is_terminal, split_sentences, terminated_sentences};

/// With fewer sentences than this, split by character windows instead.
const MIN_SENTENCES_FOR_GROUPING: usize = 6;

/// A window is cut back to its last terminal mark only when that mark sits
/// at or past 7/10 of the window.
const CLEAN_BREAK_NUM: usize = 7;
const CLEAN_BREAK_DEN: usize = 10;

/// Partition `raw` into at most three pieces of roughly equal size.
///
/// Pieces of [`MIN_SEGMENT_CHARS`] characters or fewer are dropped, so the
/// result may hold fewer than three entries.
pub fn split_evenly(raw: &str) -> Vec<String> {
    let text = raw.trim();

    let pieces = if split_sentences(text).len() < MIN_SENTENCES_FOR_GROUPING {
        split_by_windows(text)
    } else {
        split_by_sentences(text)
    };

    pieces
        .into_iter()
        .filter(|p| char_len(p) > MIN_SEGMENT_CHARS)
        .collect()
}

fn split_by_windows(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let width = chars.len() / RESPONSE_COUNT;

    (0..RESPONSE_COUNT)
        .map(|i| {
            let start = i * width;
            let end = if i == RESPONSE_COUNT - 1 {
                chars.len()
            } else {
                (i + 1) * width
            };
            let window: String = chars[start..end].iter().collect();
            let window = window.trim();

            if i == RESPONSE_COUNT - 1 {
                window.to_string()
            } else {
                cut_at_clean_break(window)
            }
        })
        .collect()
}

fn cut_at_clean_break(window: &str) -> String {
    let chars: Vec<char> = window.chars().collect();
    match chars.iter().rposition(|&c| is_terminal(c)) {
        Some(pos) if pos * CLEAN_BREAK_DEN >= chars.len() * CLEAN_BREAK_NUM => {
            chars[..=pos].iter().collect()
        }
        _ => window.to_string(),
    }
}

fn split_by_sentences(text: &str) -> Vec<String> {
    let sentences = terminated_sentences(text);
    let per_group = sentences.len().div_ceil(RESPONSE_COUNT);

    sentences
        .chunks(per_group.max(1))
        .take(RESPONSE_COUNT)
        .map(|group| group.concat())
        .collect()
}
