//! Delimiter-based segmentation of a raw completion.
//!
//! Strategies are tried in a fixed order; the first one that yields at least
//! [`RESPONSE_COUNT`] usable segments wins.

use once_cell::sync::Lazy;
use regex::Regex;

use super::RESPONSE_COUNT;
use super::sentence::char_len;

/// Segments at or below this many characters are delimiter noise.
pub const MIN_SEGMENT_CHARS: usize = 20;

// A longer run counts as one delimiter so no stray dashes stay attached
static TRIPLE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{3,}").unwrap());

static DASH_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*-{3,}\s*\n").unwrap());

static ORDINAL_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\n\s*第[一二三1-3]个?(?:回答|回复)\s*[：:]\s*").unwrap());

static NUMBERED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*[1-3][\.、][：:]?\s*").unwrap());

static REPLY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\n\s*回复[1-3][：:]?\s*").unwrap());

static BRACKET_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*【[^】]*】\s*").unwrap());

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// What kind of header preceded a segment in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartHint {
    None,
    Numbered,
    Bracketed,
    Labeled,
}

/// A candidate reply cut out of the raw completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub start_hint: StartHint,
}

/// Delimiter strategies, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `---`, or any longer run of dashes
    TripleDash,
    /// A line made of three or more dashes
    DashRule,
    /// `第一个回复：`, `第二回答:` ...
    OrdinalLabel,
    /// `1.`, `2、`, optionally followed by a colon
    NumberedMarker,
    /// `回复1:`
    ReplyLabel,
    /// `【...】` header line
    BracketHeader,
    /// Blank-line paragraph breaks
    ParagraphBreak,
}

impl Strategy {
    pub const CASCADE: [Strategy; 7] = [
        Strategy::TripleDash,
        Strategy::DashRule,
        Strategy::OrdinalLabel,
        Strategy::NumberedMarker,
        Strategy::ReplyLabel,
        Strategy::BracketHeader,
        Strategy::ParagraphBreak,
    ];

    pub fn start_hint(self) -> StartHint {
        match self {
            Strategy::NumberedMarker => StartHint::Numbered,
            Strategy::BracketHeader => StartHint::Bracketed,
            Strategy::OrdinalLabel | Strategy::ReplyLabel => StartHint::Labeled,
            Strategy::TripleDash | Strategy::DashRule | Strategy::ParagraphBreak => StartHint::None,
        }
    }

    fn pieces(self, text: &str) -> Vec<&str> {
        let pattern: &Regex = match self {
            Strategy::TripleDash => &TRIPLE_DASH,
            Strategy::DashRule => &DASH_RULE,
            Strategy::OrdinalLabel => &ORDINAL_LABEL,
            Strategy::NumberedMarker => &NUMBERED_MARKER,
            Strategy::ReplyLabel => &REPLY_LABEL,
            Strategy::BracketHeader => &BRACKET_HEADER,
            Strategy::ParagraphBreak => &PARAGRAPH_BREAK,
        };
        pattern.split(text).collect()
    }

    /// Split `text` with this strategy, keeping only substantial pieces.
    pub fn segments(self, text: &str) -> Vec<Segment> {
        self.pieces(text)
            .into_iter()
            .map(str::trim)
            .filter(|piece| char_len(piece) > MIN_SEGMENT_CHARS)
            .map(|piece| Segment {
                text: piece.to_string(),
                start_hint: self.start_hint(),
            })
            .collect()
    }
}

/// Outcome of running the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// The strategy that cleared the bar, if any did.
    pub strategy: Option<Strategy>,
    pub segments: Vec<Segment>,
}

impl Segmentation {
    /// Whether some strategy produced enough segments to fill every slot.
    pub fn is_complete(&self) -> bool {
        self.strategy.is_some()
    }
}

/// Run the strategy cascade over a raw completion.
///
/// When no strategy reaches the bar the triple-dash result is returned as-is,
/// possibly with fewer than three (or zero) segments.
pub fn segment(raw: &str) -> Segmentation {
    let text = raw.trim();

    for strategy in Strategy::CASCADE {
        let segments = strategy.segments(text);
        if segments.len() >= RESPONSE_COUNT {
            return Segmentation {
                strategy: Some(strategy),
                segments,
            };
        }
    }

    Segmentation {
        strategy: None,
        segments: Strategy::TripleDash.segments(text),
    }
}
