use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use triage_core::config::ToolCatalog;
use triage_core::model::{ExecutionTrace, ExpectedOutcome, Scenario, ToolCall};
use triage_core::scoring_api::{ScoreResult, Scorer};

pub const START_KEYWORDS: &[&str] = &["investigating", "incident", "started", "looking into", "alert"];
pub const RESOLVE_KEYWORDS: &[&str] = &[
    "resolved",
    "root cause",
    "found",
    "conclusion",
    "fixed",
    "mitigated",
];

// Tenths, so the sum is exact.
pub const START_POINTS: u32 = 4;
pub const RESOLVE_POINTS: u32 = 4;
pub const NO_TABLE_POINTS: u32 = 2;

// `|---|`, `| :--- |`, `|-----|------|`
static MARKDOWN_TABLE_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*:?-{3,}:?\s*\|").unwrap());

/// Message body of an outbound communication call.
fn message_text(call: &ToolCall) -> String {
    match &call.input {
        Value::Object(obj) => {
            let parts: Vec<String> = ["text", "message", "content", "blocks"]
                .iter()
                .filter_map(|k| obj.get(*k))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            if parts.is_empty() {
                call.input_text()
            } else {
                parts.join("\n")
            }
        }
        _ => call.input_text(),
    }
}

fn first_keyword<'a>(texts: &[String], keywords: &[&'a str]) -> Option<&'a str> {
    keywords
        .iter()
        .copied()
        .find(|k| texts.iter().any(|t| t.contains(k)))
}

/// Announce when the investigation starts, report when it resolves, keep
/// tables out of chat.
#[derive(Debug, Clone, Default)]
pub struct CommunicationCheckpoints {
    tools: ToolCatalog,
}

impl CommunicationCheckpoints {
    pub fn new(tools: ToolCatalog) -> Self {
        Self { tools }
    }
}

impl Scorer for CommunicationCheckpoints {
    fn name(&self) -> &'static str {
        "communication_checkpoints"
    }

    fn score(
        &self,
        scenario: &Scenario,
        _expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        if !scenario.flags().require_slack_comms {
            return ScoreResult::not_applicable("communication not required for scenario");
        }
        let raw: Vec<String> = trace
            .tool_calls
            .iter()
            .filter(|c| self.tools.is_communication(&c.tool))
            .map(message_text)
            .collect();
        if raw.is_empty() {
            return ScoreResult::new(0.0)
                .with("messages", 0)
                .with("note", "no communication calls");
        }

        let lowered: Vec<String> = raw.iter().map(|t| t.to_lowercase()).collect();
        let start = first_keyword(&lowered, START_KEYWORDS);
        let resolve = first_keyword(&lowered, RESOLVE_KEYWORDS);
        let tables = raw.iter().filter(|t| MARKDOWN_TABLE_RULE.is_match(t)).count();

        let mut points = 0;
        if start.is_some() {
            points += START_POINTS;
        }
        if resolve.is_some() {
            points += RESOLVE_POINTS;
        }
        if tables == 0 {
            points += NO_TABLE_POINTS;
        }

        ScoreResult::new(f64::from(points) / 10.0)
            .with("messages", raw.len())
            .with("start_announced", start.is_some())
            .with("start_keyword", start)
            .with("resolution_reported", resolve.is_some())
            .with("resolve_keyword", resolve)
            .with("messages_with_tables", tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use triage_core::config::SLACK_POST_MESSAGE;

    fn run(messages: &[Value]) -> ScoreResult {
        let s = Scenario::default();
        let trace = ExecutionTrace {
            tool_calls: messages
                .iter()
                .map(|m| ToolCall::new(SLACK_POST_MESSAGE, m.clone()))
                .collect(),
            ..Default::default()
        };
        CommunicationCheckpoints::default().score(&s, &s.expected, &trace)
    }

    #[test]
    fn no_messages_scores_zero() {
        assert_eq!(run(&[]).score, 0.0);
    }

    #[test]
    fn start_with_table_scores_start_only() {
        let r = run(&[json!({
            "channel": "#inc",
            "text": "Investigating checkout latency\n| svc | p99 |\n|-----|-----|\n| checkout | 2.3s |"
        })]);
        assert!((r.score - 0.4).abs() < 1e-9);
        assert_eq!(r.metadata["messages_with_tables"], 1);
        assert_eq!(r.metadata["resolution_reported"], false);
    }

    #[test]
    fn full_lifecycle_scores_one() {
        let r = run(&[
            json!({"text": "Looking into the 5xx alert on checkout"}),
            json!("Resolved: root cause was pool exhaustion after deploy"),
        ]);
        assert!((r.score - 1.0).abs() < 1e-9);
        assert_eq!(r.metadata["start_keyword"], "looking into");
        assert_eq!(r.metadata["resolve_keyword"], "resolved");
    }

    #[test]
    fn plain_message_only_earns_no_table_credit() {
        let r = run(&[json!({"text": "cc @oncall"})]);
        assert!((r.score - 0.2).abs() < 1e-9);
        assert_eq!(r.metadata["start_keyword"], Value::Null);
    }

    #[test]
    fn disabled_comms_not_applicable() {
        let mut s = Scenario::default();
        s.scoring.require_slack_comms = Some(false);
        let r = CommunicationCheckpoints::default().score(&s, &s.expected, &ExecutionTrace::default());
        assert!(!r.applicable());
    }
}
