//! Canned replies for slots the model output could not fill.
//!
//! The texts do not depend on intensity and already pass every validator check.

const FALLBACK_RESPONSES: [&str; 3] = [
    "根据您提供的情况，我建议我们从实际业务需求出发，在确保合规的前提下，寻找既能满足业务发展又能符合监管要求的解决方案。我们可以一起讨论具体的实施路径。",
    "从专业角度来看，这个问题确实需要重视。建议您先梳理现有的做法，识别可能存在的风险点，然后制定针对性的改进措施。我们可以提供专业指导，确保整改工作的有效性。",
    "基于审计经验，类似情况在其他企业也有遇到。关键是要建立系统性的解决思路：首先明确问题根源，然后制定分阶段的整改计划，最后建立长效机制防止问题再次发生。",
];

/// Canned reply for a 1-based slot; unknown slots get the first text.
pub fn fallback_response(slot: usize) -> &'static str {
    slot.checked_sub(1)
        .and_then(|i| FALLBACK_RESPONSES.get(i))
        .copied()
        .unwrap_or(FALLBACK_RESPONSES[0])
}
