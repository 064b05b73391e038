//! Run health gate.
//!
//! Separates runs that never really executed (provider errors, harness crashes,
//! empty output) from runs where the agent behaved badly. Produces reasons, not
//! a score; callers decide whether to exclude invalid runs from aggregates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::ExecutionTrace;
use crate::scoring_api::ScoreResult;

pub const REASON_EMPTY_FINAL_TEXT: &str = "empty-final-text";
pub const REASON_NO_TOOLS_MINIMAL_OUTPUT: &str = "no-tool-calls-and-minimal-output";
pub const REASON_DEGENERATE_OUTPUT: &str = "degenerate-output";
pub const REASON_ZERO_USAGE_NO_TOOLS: &str = "zero-usage-and-no-tools";

const MIN_TEXT_WITHOUT_TOOLS: usize = 20;
const MIN_TEXT_WITH_TOOLS: usize = 50;

// Harness appends these after the agent's own output, sometimes after a
// complete investigation. One marker per line, stripped from the end only.
static TRAILING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:\[(?:harness[-_ ]?(?:error|timeout)|agent[-_ ]?timeout)\].*|(?:error:\s*)?agent (?:run )?timed out after \d+\s*(?:ms|s|seconds)\.?)\s*$",
    )
    .unwrap()
});

static FATAL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("fatal-harness-error", r"(?i)harness fatal error|\bHARNESS_FATAL\b"),
        ("fatal-harness-timeout", r"(?i)harness timed out|\bHARNESS_TIMEOUT\b"),
        ("model-not-found", r"(?i)\bmodel\b[^\n]{0,40}\bnot found\b"),
        ("selected-model", r"(?i)\bselected model\b"),
        ("unknown-error", r"(?i)\bunknown[_ ]error\b"),
    ]
    .into_iter()
    .map(|(reason, pattern)| (reason, Regex::new(pattern).unwrap()))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHealth {
    pub valid: bool,
    pub reasons: Vec<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub tool_calls: usize,
}

impl RunHealth {
    /// Attaches this assessment to another scorer's metadata.
    pub fn embed(&self, result: &mut ScoreResult) {
        result.insert("run_valid", self.valid);
        if let Ok(v) = serde_json::to_value(self) {
            result.insert("run_health", v);
        }
    }
}

/// Removes harness trailing error/timeout lines, then trims.
pub fn strip_trailing_markers(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    while let Some(last) = lines.last() {
        if last.trim().is_empty() || TRAILING_MARKER.is_match(last) {
            lines.pop();
        } else {
            break;
        }
    }
    lines.join("\n").trim().to_string()
}

pub fn assess_run_health(trace: &ExecutionTrace) -> RunHealth {
    let cleaned = strip_trailing_markers(&trace.final_text);
    let text_len = cleaned.chars().count();
    let tool_calls = trace.tool_calls.len();
    let mut reasons = Vec::new();

    if cleaned.is_empty() {
        reasons.push(REASON_EMPTY_FINAL_TEXT.to_string());
    }
    if tool_calls == 0 && text_len < MIN_TEXT_WITHOUT_TOOLS {
        reasons.push(REASON_NO_TOOLS_MINIMAL_OUTPUT.to_string());
    }
    if tool_calls > 0 && text_len < MIN_TEXT_WITH_TOOLS {
        reasons.push(REASON_DEGENERATE_OUTPUT.to_string());
    }
    for (reason, re) in FATAL_PATTERNS.iter() {
        if re.is_match(&cleaned) {
            reasons.push((*reason).to_string());
        }
    }
    if tool_calls == 0 && trace.usage.total() == 0 {
        reasons.push(REASON_ZERO_USAGE_NO_TOOLS.to_string());
    }

    let valid = reasons.is_empty();
    if !valid {
        tracing::warn!(?reasons, tool_calls, "run failed health gate");
    }
    RunHealth {
        valid,
        reasons,
        input_tokens: trace.usage.input_tokens,
        output_tokens: trace.usage.output_tokens,
        tool_calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TokenUsage, ToolCall};

    fn trace(text: &str, calls: usize, tokens: u64) -> ExecutionTrace {
        ExecutionTrace {
            tool_calls: (0..calls)
                .map(|i| ToolCall::new(format!("t{}", i), serde_json::json!({})))
                .collect(),
            final_text: text.to_string(),
            usage: TokenUsage {
                input_tokens: tokens,
                output_tokens: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn dot_with_no_usage_is_invalid_for_two_reasons() {
        let h = assess_run_health(&trace(".", 0, 0));
        assert!(!h.valid);
        assert!(h.reasons.contains(&REASON_NO_TOOLS_MINIMAL_OUTPUT.to_string()));
        assert!(h.reasons.contains(&REASON_ZERO_USAGE_NO_TOOLS.to_string()));
        assert!(!h.reasons.contains(&REASON_EMPTY_FINAL_TEXT.to_string()));
    }

    #[test]
    fn trailing_timeout_marker_does_not_invalidate_complete_run() {
        let text = "Root cause: the payments service exhausted its connection pool after the 14:02 deploy.\n[harness-timeout] run exceeded 300000ms";
        let h = assess_run_health(&trace(text, 4, 1200));
        assert!(h.valid, "{:?}", h.reasons);
    }

    #[test]
    fn marker_only_output_is_empty() {
        let h = assess_run_health(&trace("[harness-error] provider returned 500\n", 2, 50));
        assert!(h.reasons.contains(&REASON_EMPTY_FINAL_TEXT.to_string()));
        assert!(h.reasons.contains(&REASON_DEGENERATE_OUTPUT.to_string()));
    }

    #[test]
    fn tool_activity_without_conclusion_is_degenerate() {
        let h = assess_run_health(&trace("Looking into it.", 3, 900));
        assert_eq!(h.reasons, vec![REASON_DEGENERATE_OUTPUT.to_string()]);
        assert_eq!(h.tool_calls, 3);
        assert_eq!(h.input_tokens, 900);
    }

    #[test]
    fn fatal_signatures_each_add_a_reason() {
        let text = "The selected model is unavailable: model 'gpt-x' not found. unknown_error while streaming the response body.";
        let h = assess_run_health(&trace(text, 0, 10));
        assert!(h.reasons.contains(&"selected-model".to_string()));
        assert!(h.reasons.contains(&"model-not-found".to_string()));
        assert!(h.reasons.contains(&"unknown-error".to_string()));
    }

    #[test]
    fn harness_fatal_signatures_in_body_add_reasons() {
        let text = "Partial findings: pool saturation on payments-db.\nHARNESS_FATAL: worker crashed\nharness timed out waiting for tool output\nRecovered logs show retries.";
        let h = assess_run_health(&trace(text, 2, 10));
        assert!(h.reasons.contains(&"fatal-harness-error".to_string()));
        assert!(h.reasons.contains(&"fatal-harness-timeout".to_string()));
        assert!(!h.valid);
    }

    #[test]
    fn trailing_markers_are_stripped_before_fatal_match() {
        let body = "Root cause: connection pool exhaustion on payments-db after the deploy.";
        let h = assess_run_health(&trace(
            &format!("{}\n[harness-timeout] harness timed out after 300000 ms", body),
            3,
            10,
        ));
        assert!(h.valid, "{:?}", h.reasons);
    }

    #[test]
    fn embed_adds_health_to_metadata() {
        let h = assess_run_health(&trace(".", 0, 0));
        let mut r = ScoreResult::new(1.0);
        h.embed(&mut r);
        assert_eq!(r.metadata["run_valid"], serde_json::json!(false));
        assert!(r.metadata["run_health"]["reasons"].is_array());
    }
}
