use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::flags::ScoringFlags;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, alias = "initialState", alias = "initial_state_output")]
    pub initial_state: String,
    /// Mocked tool outputs keyed by tool name. Opaque to scoring.
    #[serde(default, alias = "toolMocks")]
    pub tool_mocks: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub fixtures: serde_json::Value,
    /// Zero-config onboarding scenario: nothing worth remembering yet.
    #[serde(default, alias = "firstRun")]
    pub first_run: bool,
    #[serde(default, alias = "expectedOutcome")]
    pub expected: ExpectedOutcome,
    #[serde(default)]
    pub budgets: Budgets,
    #[serde(default, alias = "scoringFlags", alias = "flags")]
    pub scoring: ScoringFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    #[serde(default, alias = "rootCauseMustMention")]
    pub root_cause_must_mention: BTreeSet<String>,
    #[serde(default, alias = "rootCauseMustNotMention")]
    pub root_cause_must_not_mention: BTreeSet<String>,
    #[serde(default, alias = "requiredEvidence")]
    pub required_evidence: BTreeSet<String>,
    #[serde(default, alias = "requiredQueries")]
    pub required_queries: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budgets {
    #[serde(default, alias = "maxToolCalls")]
    pub max_tool_calls: Option<u64>,
    #[serde(default, alias = "maxTotalTokens")]
    pub max_total_tokens: Option<u64>,
    #[serde(default, alias = "maxElapsedMs")]
    pub max_elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(alias = "name", alias = "tool_name")]
    pub tool: String,
    /// Structured object or raw string, exactly as the agent sent it.
    #[serde(default, alias = "args", alias = "arguments")]
    pub input: serde_json::Value,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            input,
        }
    }

    /// Flattened text view of the input: strings verbatim, anything else as JSON.
    pub fn input_text(&self) -> String {
        match &self.input {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, alias = "inputTokens")]
    pub input_tokens: u64,
    #[serde(default, alias = "outputTokens")]
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    #[serde(default, alias = "toolCalls", alias = "calls")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, alias = "finalText", alias = "final_output")]
    pub final_text: String,
    /// Root cause as extracted by the harness, when it did so.
    #[serde(default, alias = "rootCause")]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub usage: TokenUsage,
    /// Wall-clock duration of the run. `None` when the harness did not measure it.
    #[serde(default, alias = "elapsedMs")]
    pub elapsed_ms: Option<f64>,
}

impl ExecutionTrace {
    pub fn calls_to<'a>(&'a self, tool: &'a str) -> impl Iterator<Item = &'a ToolCall> + 'a {
        self.tool_calls.iter().filter(move |c| c.tool == tool)
    }

    pub fn first_index_of(&self, tool: &str) -> Option<usize> {
        self.tool_calls.iter().position(|c| c.tool == tool)
    }

    /// The agent's stated root cause: the harness-extracted value, else the
    /// first `Root cause:` line of the final text. Quoted lines and lines in
    /// or on fenced code blocks are not the agent's own statement.
    pub fn stated_root_cause(&self) -> Option<String> {
        if let Some(rc) = self.root_cause.as_deref() {
            if !rc.trim().is_empty() {
                return Some(rc.trim().to_string());
            }
        }
        let mut in_fence = false;
        self.final_text.lines().find_map(|line| {
            let fences = line.matches("```").count() + line.matches("~~~").count();
            let skip = in_fence || fences > 0;
            if fences % 2 == 1 {
                in_fence = !in_fence;
            }
            let trimmed = line.trim();
            if skip || trimmed.starts_with('>') {
                return None;
            }
            let stripped = trimmed.trim_start_matches(['#', '*', '-', ' ']).trim_start();
            let lower = stripped.to_ascii_lowercase();
            if !lower.starts_with("root cause") {
                return None;
            }
            let rest = stripped["root cause".len()..]
                .trim_start_matches(['*', ' '])
                .strip_prefix(':')?;
            let rest = rest.trim_matches(['*', ' ']);
            (!rest.is_empty()).then(|| rest.to_string())
        })
    }

    /// Stated root cause followed by the full final text.
    pub fn conclusion_text(&self) -> String {
        match self.stated_root_cause() {
            Some(rc) => format!("{}\n{}", rc, self.final_text),
            None => self.final_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_accepts_camel_case_harness_shape() {
        let trace: ExecutionTrace = serde_json::from_value(serde_json::json!({
            "toolCalls": [{"tool": "query_logs", "input": {"query": "level:error"}}],
            "finalText": "done",
            "usage": {"inputTokens": 10, "outputTokens": 5},
            "elapsedMs": 1200
        }))
        .unwrap();
        assert_eq!(trace.tool_calls.len(), 1);
        assert_eq!(trace.usage.total(), 15);
        assert_eq!(trace.elapsed_ms, Some(1200.0));
    }

    fn with_text(text: &str) -> ExecutionTrace {
        ExecutionTrace {
            final_text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn stated_root_cause_skips_quoted_and_fenced_lines() {
        let quoted = with_text("> Root cause: DNS failure suspected\nThe pool was exhausted.");
        assert_eq!(quoted.stated_root_cause(), None);

        let fenced = with_text(
            "Alert payload:\n```\nRoot cause: DNS\n```\nRoot cause: pool exhaustion",
        );
        assert_eq!(fenced.stated_root_cause().as_deref(), Some("pool exhaustion"));

        let unterminated = with_text("```text\nRoot cause: DNS");
        assert_eq!(unterminated.stated_root_cause(), None);
    }

    #[test]
    fn stated_root_cause_accepts_markdown_label() {
        let t = with_text("## Summary\n**Root cause:** connection pool exhaustion");
        assert_eq!(
            t.stated_root_cause().as_deref(),
            Some("connection pool exhaustion")
        );
    }

    #[test]
    fn missing_trace_fields_default() {
        let trace: ExecutionTrace = serde_json::from_str("{}").unwrap();
        assert!(trace.tool_calls.is_empty());
        assert!(trace.final_text.is_empty());
        assert_eq!(trace.elapsed_ms, None);
    }

    #[test]
    fn stated_root_cause_prefers_harness_value() {
        let trace = ExecutionTrace {
            final_text: "Root cause: disk full".into(),
            root_cause: Some("bad deploy".into()),
            ..Default::default()
        };
        assert_eq!(trace.stated_root_cause().as_deref(), Some("bad deploy"));
    }

    #[test]
    fn stated_root_cause_from_markdown_heading_line() {
        let trace = ExecutionTrace {
            final_text: "## Summary\n**Root cause:** connection pool exhaustion\nmore".into(),
            ..Default::default()
        };
        assert_eq!(
            trace.stated_root_cause().as_deref(),
            Some("connection pool exhaustion")
        );
        assert!(trace.conclusion_text().starts_with("connection pool exhaustion\n"));
    }

    #[test]
    fn input_text_flattens_objects() {
        let call = ToolCall::new("x", serde_json::json!({"a": 1}));
        assert_eq!(call.input_text(), r#"{"a":1}"#);
        let call = ToolCall::new("x", serde_json::json!("raw"));
        assert_eq!(call.input_text(), "raw");
    }
}
