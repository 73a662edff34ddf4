//! Turn one unstructured completion into exactly three usable replies.
//!
//! Pipeline: delimiter cascade, then either prefix cleaning (enough segments)
//! or positional splitting of the whole text, then fallback padding, then
//! per-slot validation. Every input, including the empty string, produces a
//! [`ResponseTriple`].

pub mod cleaner;
pub mod fallback;
pub mod segmenter;
pub mod sentence;
pub mod splitter;
pub mod validator;

use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Index;

pub use cleaner::clean_segment;
pub use fallback::fallback_response;
pub use segmenter::{Segment, Segmentation, StartHint, Strategy, segment};
pub use splitter::split_evenly;
pub use validator::{collapse_duplicate_sentences, validate_response};

/// Number of reply variants produced per completion.
pub const RESPONSE_COUNT: usize = 3;

/// Three validated replies, in the order they appeared in the completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTriple([String; RESPONSE_COUNT]);

impl ResponseTriple {
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_inner(self) -> [String; RESPONSE_COUNT] {
        self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }
}

impl Index<usize> for ResponseTriple {
    type Output = String;

    fn index(&self, index: usize) -> &String {
        &self.0[index]
    }
}

impl IntoIterator for ResponseTriple {
    type Item = String;
    type IntoIter = std::array::IntoIter<String, RESPONSE_COUNT>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResponseTriple {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Normalize a raw completion into three replies.
pub fn normalize(raw: &str) -> ResponseTriple {
    let text = raw.trim();
    let segmentation = segment(text);

    let mut candidates: Vec<String> = if segmentation.is_complete() {
        debug!(
            "Segmented with {:?} ({} segments)",
            segmentation.strategy,
            segmentation.segments.len()
        );
        segmentation
            .segments
            .iter()
            .take(RESPONSE_COUNT)
            .map(|s| clean_segment(&s.text))
            .collect()
    } else {
        let pieces = split_evenly(text);
        debug!("No delimiter matched, split into {} pieces", pieces.len());
        pieces
    };

    let padded = RESPONSE_COUNT.saturating_sub(candidates.len());
    while candidates.len() < RESPONSE_COUNT {
        candidates.push(fallback_response(candidates.len() + 1).to_string());
    }
    if padded > 0 {
        debug!("Padded {} slot(s) with fallback text", padded);
    }

    ResponseTriple(std::array::from_fn(|i| {
        validate_response(&candidates[i], i + 1)
    }))
}

/// Normalize a raw completion into a plain array of three replies.
pub fn normalize_to_triple(raw: &str) -> [String; RESPONSE_COUNT] {
    normalize(raw).into_inner()
}

#[cfg(test)]
mod tests {
    use super::sentence::{char_len, ends_with_terminal, split_sentences};
    use super::validator::MIN_RESPONSE_CHARS;
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const A: &str = "您提到的预算调整确实存在客观原因，但调整程序必须符合预算管理办法的规定。";
    const B: &str = "从审计角度看，未经审批的资金调剂属于程序性违规，需要补办相关审批手续。";
    const C: &str = "建议贵单位在月底前完成自查，完善预算调整审批流程，并向我们提交书面整改报告。";

    fn assert_invariants(triple: &[String]) {
        assert_eq!(triple.len(), RESPONSE_COUNT);
        for reply in triple {
            assert!(char_len(reply) >= MIN_RESPONSE_CHARS, "too short: {reply}");
            assert!(ends_with_terminal(reply), "no terminal: {reply}");
            let sentences = split_sentences(reply);
            let unique: HashSet<&str> = sentences.iter().copied().collect();
            assert_eq!(unique.len(), sentences.len(), "repeated sentence: {reply}");
        }
    }

    #[test]
    fn test_well_formed_completion_preserves_order() {
        let raw = format!("{A}---{B}---{C}");
        assert_eq!(normalize_to_triple(&raw), [A, B, C]);
    }

    #[test]
    fn test_extra_segments_are_dropped() {
        let raw = format!("{A}\n---\n{B}\n---\n{C}\n---\n{A}");
        assert_eq!(normalize_to_triple(&raw), [A, B, C]);
    }

    #[test]
    fn test_labels_are_cleaned() {
        let raw = format!("回复1：{A}\n回复2：{B}\n回复3：{C}");
        assert_eq!(normalize_to_triple(&raw), [A, B, C]);
    }

    #[test]
    fn test_bracket_titles_are_cleaned() {
        let raw = format!("【平衡沟通型】{A}\n---\n【事实分析型】{B}\n---\n【解决方案型】{C}");
        assert_eq!(normalize_to_triple(&raw), [A, B, C]);
    }

    #[test]
    fn test_missing_terminal_is_added() {
        let a = A.trim_end_matches('。');
        let raw = format!("{a}---{B}---{C}");
        let triple = normalize_to_triple(&raw);
        assert_eq!(triple[0], A);
    }

    #[test]
    fn test_empty_input_yields_fallbacks() {
        let triple = normalize_to_triple("");
        assert_eq!(
            triple,
            [fallback_response(1), fallback_response(2), fallback_response(3)]
        );
        assert_invariants(&triple);
    }

    #[test]
    fn test_single_short_sentence_falls_through() {
        let triple = normalize_to_triple("只有一句话。");
        assert_eq!(
            triple,
            [fallback_response(1), fallback_response(2), fallback_response(3)]
        );
    }

    #[test]
    fn test_partial_split_padded_at_end() {
        // No delimiters and a blank middle window: two real pieces survive
        let raw = format!("{}{}{}", "甲".repeat(40), " ".repeat(40), "乙".repeat(40));
        let triple = normalize_to_triple(&raw);
        assert_eq!(triple[0], "甲".repeat(40) + "。");
        assert_eq!(triple[1], "乙".repeat(40) + "。");
        assert_eq!(triple[2], fallback_response(3));
    }

    #[test]
    fn test_two_segments_fall_back_to_splitting() {
        let raw = format!("{A}---{B}");
        assert_invariants(&normalize_to_triple(&raw));
    }

    #[test]
    fn test_unstructured_text_uses_sentence_groups() {
        let raw = "第一点，我们注意到报销单据缺少经办人签字。第二点，部分发票抬头与单位名称不一致。\
                   第三点，差旅标准超出了制度规定的上限。第四点，审批流程存在事后补签的情况。\
                   第五点，资金支付未履行集体决策程序。第六点，固定资产台账与实物不符。";
        let triple = normalize_to_triple(raw);
        assert_eq!(
            triple[0],
            "第一点，我们注意到报销单据缺少经办人签字。第二点，部分发票抬头与单位名称不一致。"
        );
        assert_eq!(
            triple[2],
            "第五点，资金支付未履行集体决策程序。第六点，固定资产台账与实物不符。"
        );
    }

    #[test]
    fn test_long_dash_lines_leave_no_stray_dashes() {
        let raw = format!("{A}\n-----\n{B}\n----------\n{C}");
        assert_eq!(normalize_to_triple(&raw), [A, B, C]);
    }

    #[test]
    fn test_triple_dash_wins_over_brackets() {
        let raw = format!("【一】\n{A}\n---\n【二】\n{B}\n---\n【三】\n{C}");
        assert_eq!(normalize_to_triple(&raw), [A, B, C]);
    }

    #[test]
    fn test_repeated_sentences_collapsed() {
        let repeated = "该项费用的列支依据不足，不符合财务报销制度的相关要求。";
        let raw = format!("{repeated}{repeated}请补充说明。---{B}---{C}");
        let triple = normalize_to_triple(&raw);
        assert_eq!(triple[0], format!("{repeated}请补充说明。"));
    }

    #[test]
    fn test_triple_iteration() {
        let triple = normalize(&format!("{A}---{B}---{C}"));
        let collected: Vec<&String> = triple.iter().collect();
        assert_eq!(collected.len(), 3);
        assert_eq!(triple.to_vec(), vec![A, B, C]);
        assert_eq!(triple.into_iter().count(), 3);
    }

    proptest! {
        #[test]
        fn prop_any_input_yields_valid_triple(s in "\\PC{0,300}") {
            let triple = normalize_to_triple(&s);
            assert_invariants(&triple);
        }

        #[test]
        fn prop_cjk_with_punctuation_yields_valid_triple(
            s in "[一-龥，。！？\n【】1-3、：-]{0,400}"
        ) {
            let triple = normalize_to_triple(&s);
            assert_invariants(&triple);
        }
    }
}
