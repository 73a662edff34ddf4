//! Prompt construction: tone intensity, reply styles and stance detection.

use anyhow::{Result, bail};
use llm_client::LlmRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// System prompt sent with every generation request.
pub const SYSTEM_PROMPT: &str = "你是一位经验丰富的审计专家，具备优秀的沟通技巧和深厚的专业素养。请根据要求生成专业、实用的审计沟通回复。";

const MAX_TOKENS: u32 = 2000;

/// Tone descriptions for levels 1 through 10.
const INTENSITY_DESCRIPTIONS: [&str; 10] = [
    "极其温和，以理解和引导为主，营造合作氛围",
    "温和友善，重视对方感受，循序渐进地指出问题",
    "温和但明确，既保持礼貌又清晰表达专业立场",
    "适度坚定，平衡专业要求与沟通效果",
    "中等强度，直接明确地指出问题，保持专业客观",
    "较为坚定，重点突出问题的重要性和紧迫性",
    "坚定直接，强调合规要求的不可妥协性",
    "强硬专业，明确指出严重性，要求立即整改",
    "非常强硬，直接指出严重违规，态度不容商榷",
    "极其强硬，涉及重大违规，必须立即纠正，后果严重",
];

/// Requested tone, from 1 (most conciliatory) to 10 (most forceful).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(level: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&level) {
            bail!(
                "Intensity must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                level
            );
        }
        Ok(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn band(self) -> Band {
        match self.0 {
            1..=3 => Band::Gentle,
            4..=6 => Band::Balanced,
            _ => Band::Firm,
        }
    }

    /// Human description of the tone for this level.
    pub fn describe(self) -> &'static str {
        INTENSITY_DESCRIPTIONS[usize::from(self.0 - 1)]
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for Intensity {
    type Error = anyhow::Error;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<Intensity> for u8 {
    fn from(intensity: Intensity) -> u8 {
        intensity.0
    }
}

impl FromStr for Intensity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let level: u8 = s
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Intensity must be a number from 1 to 10, got '{}'", s))?;
        Self::new(level)
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse tone bands; styles and sampling are chosen per band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Gentle,
    Balanced,
    Firm,
}

/// One of the three reply styles requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyStyle {
    pub name: &'static str,
    pub approach: &'static str,
    pub focus: &'static str,
    pub tone: &'static str,
}

const fn style(
    name: &'static str,
    approach: &'static str,
    focus: &'static str,
    tone: &'static str,
) -> ReplyStyle {
    ReplyStyle {
        name,
        approach,
        focus,
        tone,
    }
}

const GENTLE_STYLES: [ReplyStyle; 3] = [
    style("建议引导型", "温和建议", "共同寻找解决方案", "亲和、理解、建设性"),
    style("协作沟通型", "协作讨论", "双方合作改进", "友善、开放、支持性"),
    style("专业指导型", "专业指导", "提供专业建议", "专业、耐心、详细"),
];

const BALANCED_STYLES: [ReplyStyle; 3] = [
    style("平衡沟通型", "既友善又明确", "平衡关系与要求", "专业、友善、明确"),
    style("事实分析型", "基于事实分析", "客观分析问题", "客观、理性、专业"),
    style("解决方案型", "聚焦解决方案", "具体可行的改进措施", "务实、专业、积极"),
];

const FIRM_STYLES: [ReplyStyle; 3] = [
    style("直接明确型", "直接指出问题", "问题的严重性", "坚定、直接、权威"),
    style("规范要求型", "强调合规要求", "法规要求和风险", "严肃、专业、不容商榷"),
    style("权威指导型", "权威性指导", "必须执行的整改措施", "权威、坚决、明确"),
];

impl Band {
    pub fn styles(self) -> &'static [ReplyStyle; 3] {
        match self {
            Band::Gentle => &GENTLE_STYLES,
            Band::Balanced => &BALANCED_STYLES,
            Band::Firm => &FIRM_STYLES,
        }
    }
}

/// How the audited party is responding, judged from keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Resistant,
    Struggling,
    Cooperative,
    Explaining,
    Neutral,
}

/// Keyword groups checked in order; the first group with a hit wins.
const STANCE_KEYWORDS: [(Stance, &[&str]); 4] = [
    (
        Stance::Resistant,
        &["不是", "没有", "不对", "不存在", "不可能", "推脱", "拒绝"],
    ),
    (
        Stance::Struggling,
        &["困难", "难以", "无法", "不好", "复杂", "麻烦"],
    ),
    (
        Stance::Cooperative,
        &["会", "好的", "明白", "理解", "配合", "支持", "改进"],
    ),
    (
        Stance::Explaining,
        &["因为", "由于", "原因", "情况", "实际", "现实"],
    ),
];

impl Stance {
    pub fn detect(message: &str) -> Self {
        STANCE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k)))
            .map(|(stance, _)| *stance)
            .unwrap_or(Stance::Neutral)
    }

    /// Communication strategy line for the prompt.
    pub fn strategy(self) -> &'static str {
        match self {
            Stance::Resistant => {
                "对方表现出抗拒或否认态度，需要用事实和耐心来说服，避免直接对抗。"
            }
            Stance::Struggling => "对方表达了困难，需要理解其处境的同时，提供可行的解决方案。",
            Stance::Cooperative => "对方表现出配合态度，应该给予肯定并提供具体的指导建议。",
            Stance::Explaining => "对方在解释情况，需要认真听取并基于实际情况提供专业建议。",
            Stance::Neutral => {
                "根据对方的回应，需要保持专业客观的态度，既要坚持审计原则，又要促进有效沟通。"
            }
        }
    }
}

/// Build the user prompt asking for three `---`-separated replies.
pub fn build_prompt(message: &str, intensity: Intensity) -> String {
    let stance = Stance::detect(message);
    let styles = intensity.band().styles();

    let style_blocks: Vec<String> = styles
        .iter()
        .map(|s| {
            format!(
                "【{}】\n- 采用{}的方式\n- 重点关注{}\n- 语言风格：{}",
                s.name, s.approach, s.focus, s.tone
            )
        })
        .collect();

    format!(
        r#"你是一位经验丰富的审计专家，具有优秀的沟通技巧和深厚的专业素养。请根据审计对象的回应，生成专业而有效的沟通回复。

<对方回应>
"{message}"

<沟通策略>
{strategy}
沟通语气: {description}（强度级别：{level}/10）

<回复要求>
请生成3种不同风格的专业回复：

{styles}

<专业要求>
每个回复都应该：
✓ 体现专业水准，但避免过度专业术语
✓ 根据情况适当引用相关规定（不强制）
✓ 提供建设性的解决思路
✓ 保持审计人员的权威性和可信度
✓ 语言自然流畅，符合实际沟通习惯

<输出格式>
直接输出3个回复内容，每个回复之间用"---"分隔，不需要标题或编号：

第一个回复内容
---
第二个回复内容
---
第三个回复内容"#,
        message = message,
        strategy = stance.strategy(),
        description = intensity.describe(),
        level = intensity.level(),
        styles = style_blocks.join("\n\n"),
    )
}

/// Sampling parameters per tone band; firmer tones sample more conservatively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingProfile {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
}

impl SamplingProfile {
    pub fn for_intensity(intensity: Intensity) -> Self {
        let (temperature, top_p, frequency_penalty, presence_penalty) = match intensity.band() {
            Band::Gentle => (0.8, 0.9, 0.3, 0.2),
            Band::Balanced => (0.7, 0.85, 0.4, 0.3),
            Band::Firm => (0.6, 0.8, 0.5, 0.4),
        };

        Self {
            temperature,
            top_p,
            frequency_penalty,
            presence_penalty,
            max_tokens: MAX_TOKENS,
        }
    }

    pub fn apply(&self, request: LlmRequest) -> LlmRequest {
        LlmRequest {
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            frequency_penalty: Some(self.frequency_penalty),
            presence_penalty: Some(self.presence_penalty),
            max_tokens: Some(self.max_tokens),
            ..request
        }
    }
}

/// Full generation request for a message at the given intensity.
pub fn generation_request(message: &str, intensity: Intensity) -> LlmRequest {
    let request = LlmRequest::new(build_prompt(message, intensity)).with_system_prompt(SYSTEM_PROMPT);
    SamplingProfile::for_intensity(intensity).apply(request)
}
