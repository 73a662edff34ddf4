//! Sentence helpers shared by the splitter and the validator.
//!
//! Lengths are counted in characters, never bytes: the replies are CJK text.

/// Sentence-terminal punctuation of the target language.
pub const TERMINALS: [char; 3] = ['。', '！', '？'];

/// Terminator appended when a reply or sentence group lacks one.
pub const DEFAULT_TERMINAL: char = '。';

pub fn is_terminal(c: char) -> bool {
    TERMINALS.contains(&c)
}

/// Length in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn ends_with_terminal(text: &str) -> bool {
    text.chars().next_back().is_some_and(is_terminal)
}

/// Sentence bodies between terminal marks, trimmed, empties dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(is_terminal)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sentences with their own terminal mark kept attached.
///
/// A trailing fragment without a mark gets [`DEFAULT_TERMINAL`]. Pieces
/// that are nothing but punctuation (e.g. the second mark of `？！`) are dropped.
pub fn terminated_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(is_terminal)
        .filter_map(|piece| {
            let piece = piece.trim();
            let body = piece.trim_end_matches(is_terminal).trim();
            if body.is_empty() {
                return None;
            }
            let mut sentence = piece.to_string();
            if !ends_with_terminal(&sentence) {
                sentence.push(DEFAULT_TERMINAL);
            }
            Some(sentence)
        })
        .collect()
}
