use triage_core::model::{ExecutionTrace, ExpectedOutcome, Scenario};
use triage_core::scoring_api::{ScoreResult, Scorer};

use crate::budget::linear_decay;

/// Hard ceiling as a multiple of the budget.
pub const RESOURCE_CEILING_FACTOR: f64 = 2.0;

/// Tool-call and token consumption against the scenario's budgets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceBudget;

impl Scorer for ResourceBudget {
    fn name(&self) -> &'static str {
        "resource_budget"
    }

    fn score(
        &self,
        scenario: &Scenario,
        _expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        let budgets = &scenario.budgets;
        let mut components = Vec::new();
        let mut result = ScoreResult::new(0.0);

        if let Some(max_calls) = budgets.max_tool_calls.filter(|m| *m > 0) {
            let used = trace.tool_calls.len() as f64;
            let soft = max_calls as f64;
            let s = linear_decay(used, soft, soft * RESOURCE_CEILING_FACTOR);
            components.push(s);
            result.insert("tool_calls", trace.tool_calls.len());
            result.insert("max_tool_calls", max_calls);
            result.insert("tool_call_score", s);
        }
        if let Some(max_tokens) = budgets.max_total_tokens.filter(|m| *m > 0) {
            let used = trace.usage.total();
            let soft = max_tokens as f64;
            let s = linear_decay(used as f64, soft, soft * RESOURCE_CEILING_FACTOR);
            components.push(s);
            result.insert("total_tokens", used);
            result.insert("max_total_tokens", max_tokens);
            result.insert("token_score", s);
        }

        if components.is_empty() {
            return ScoreResult::not_applicable("no tool-call or token budget defined");
        }
        let mean = components.iter().sum::<f64>() / components.len() as f64;
        result.score = ScoreResult::new(mean).score;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::model::{Budgets, TokenUsage, ToolCall};

    fn trace(calls: usize, tokens: u64) -> ExecutionTrace {
        ExecutionTrace {
            tool_calls: (0..calls)
                .map(|_| ToolCall::new("query_logs", serde_json::json!({})))
                .collect(),
            usage: TokenUsage {
                input_tokens: tokens,
                output_tokens: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn within_budgets_full_credit() {
        let s = Scenario {
            budgets: Budgets {
                max_tool_calls: Some(10),
                max_total_tokens: Some(50_000),
                max_elapsed_ms: None,
            },
            ..Default::default()
        };
        let r = ResourceBudget.score(&s, &s.expected, &trace(10, 20_000));
        assert_eq!(r.score, 1.0);
        assert!(r.applicable());
    }

    #[test]
    fn overrun_decays_to_ceiling() {
        let s = Scenario {
            budgets: Budgets {
                max_tool_calls: Some(10),
                max_total_tokens: Some(10_000),
                max_elapsed_ms: None,
            },
            ..Default::default()
        };
        // calls 15/10 -> 0.5, tokens 20k/10k -> 0.0
        let r = ResourceBudget.score(&s, &s.expected, &trace(15, 20_000));
        assert!((r.score - 0.25).abs() < 1e-9);
        assert_eq!(r.metadata["token_score"], 0.0);
    }

    #[test]
    fn no_budgets_not_applicable() {
        let s = Scenario::default();
        let r = ResourceBudget.score(&s, &s.expected, &trace(3, 10));
        assert!(!r.applicable());
    }
}
