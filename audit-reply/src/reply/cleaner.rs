//! Strip structural markup left at the start of a delimiter-split segment.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading markup, highest priority first.
static PREFIXES: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        // 【平衡沟通型】 / [Option A]
        Regex::new(r"^[【\[].*?[】\]]\s*").unwrap(),
        // 1. / 2、 / 3：
        Regex::new(r"^[1-3][\.、：:]\s*").unwrap(),
        // 回复1：
        Regex::new(r"(?i)^回复[1-3][：:]\s*").unwrap(),
        // 第一个回复： / 第二回答:
        Regex::new(r"(?i)^第[一二三1-3]个?(?:回答|回复)[：:]\s*").unwrap(),
    ]
});

// "2.5万元" opens with an amount, not a list marker
static DECIMAL_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-3]\.\d").unwrap());

/// Remove the highest-priority leading marker, if any, and trim.
///
/// Markers are removed one at a time until none is left at the front, so
/// cleaning an already cleaned segment changes nothing.
pub fn clean_segment(segment: &str) -> String {
    let mut text = segment.trim();
    while let Some(rest) = strip_prefix(text) {
        text = rest.trim();
    }
    text.to_string()
}

fn strip_prefix(text: &str) -> Option<&str> {
    let decimal = DECIMAL_START.is_match(text);

    PREFIXES
        .iter()
        .enumerate()
        .filter(|(i, _)| !(decimal && *i == 1))
        .find_map(|(_, re)| re.find(text))
        .filter(|m| m.end() > 0)
        .map(|m| &text[m.end()..])
}
