//! Final per-slot checks: minimum length, terminal mark, no repeated sentence.

use log::debug;
use std::collections::HashSet;

use super::fallback::fallback_response;
use super::sentence::{DEFAULT_TERMINAL, char_len, ends_with_terminal, split_sentences};

/// Replies shorter than this many characters are replaced by a fallback.
pub const MIN_RESPONSE_CHARS: usize = 30;

/// Apply the final reply checks to the candidate for a 1-based slot.
///
/// The result is at least [`MIN_RESPONSE_CHARS`] characters long, ends in a
/// terminal mark and holds no sentence twice.
pub fn validate_response(candidate: &str, slot: usize) -> String {
    let text = candidate.trim();
    if char_len(text) < MIN_RESPONSE_CHARS {
        debug!("Slot {} too short ({} chars), using fallback", slot, char_len(text));
        return fallback_response(slot).to_string();
    }

    let mut text = text.to_string();
    if !ends_with_terminal(&text) {
        text.push(DEFAULT_TERMINAL);
    }

    let text = collapse_duplicate_sentences(&text);

    // Dropping repeats can push a reply back under the minimum
    if char_len(&text) < MIN_RESPONSE_CHARS {
        debug!("Slot {} too short after removing repeats, using fallback", slot);
        return fallback_response(slot).to_string();
    }

    text
}

/// Keep only the first occurrence of each sentence.
///
/// Text without repeats is returned unchanged; otherwise the unique
/// sentences are re-joined with `。`.
pub fn collapse_duplicate_sentences(text: &str) -> String {
    let sentences = split_sentences(text);

    let mut seen = HashSet::new();
    let unique: Vec<&str> = sentences
        .iter()
        .copied()
        .filter(|s| seen.insert(*s))
        .collect();

    if unique.len() == sentences.len() {
        return text.to_string();
    }

    let mut rebuilt = unique.join("。");
    rebuilt.push(DEFAULT_TERMINAL);
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_repeated_sentence() {
        assert_eq!(
            collapse_duplicate_sentences("问题很严重。问题很严重。需要整改。"),
            "问题很严重。需要整改。"
        );
    }

    #[test]
    fn test_collapse_ignores_surrounding_whitespace() {
        assert_eq!(
            collapse_duplicate_sentences("请补充材料。 请补充材料！\n下周反馈。"),
            "请补充材料。下周反馈。"
        );
    }

    #[test]
    fn test_no_repeats_keeps_original_marks() {
        let text = "请说明原因！为什么没有审批？";
        assert_eq!(collapse_duplicate_sentences(text), text);
    }

    #[test]
    fn test_short_candidate_replaced() {
        assert_eq!(validate_response("太短了。", 2), fallback_response(2));
        assert_eq!(validate_response("", 3), fallback_response(3));
        assert_eq!(validate_response("   ", 1), fallback_response(1));
    }

    #[test]
    fn test_appends_terminal() {
        let text = "您提到的情况我们已经了解，但是相关支出仍然缺少审批依据，请在本周内补充提交";
        let validated = validate_response(text, 1);
        assert_eq!(validated, format!("{text}。"));
    }

    #[test]
    fn test_keeps_existing_terminal() {
        let text = "您提到的情况我们已经了解，但是相关支出仍然缺少审批依据，请在本周内补充提交！";
        assert_eq!(validate_response(text, 1), text);
    }

    #[test]
    fn test_trims_candidate() {
        let text = "您提到的情况我们已经了解，但是相关支出仍然缺少审批依据，请在本周内补充提交。";
        assert_eq!(validate_response(&format!("\n  {text}  \n"), 1), text);
    }

    #[test]
    fn test_validate_collapses_repeats() {
        let repeated = "该笔支出缺少审批手续，不符合财务管理制度。";
        let candidate = format!("{repeated}{repeated}请在月底前完成整改并提交书面说明。");
        assert_eq!(
            validate_response(&candidate, 1),
            "该笔支出缺少审批手续，不符合财务管理制度。请在月底前完成整改并提交书面说明。"
        );
    }

    #[test]
    fn test_collapse_below_minimum_falls_back() {
        // 31 chars with the repeat, 20 without
        let candidate = "问题非常严重必须整改。".repeat(2) + "立即整改。请配合。";
        assert!(char_len(&candidate) >= MIN_RESPONSE_CHARS);
        assert_eq!(validate_response(&candidate, 3), fallback_response(3));
    }

    #[test]
    fn test_fallback_passes_unchanged() {
        for slot in 1..=3 {
            assert_eq!(validate_response(fallback_response(slot), slot), fallback_response(slot));
        }
    }
}
