//! Coverage of the positive parts of the expected-outcome contract.

use triage_core::config::ToolCatalog;
use triage_core::model::{ExecutionTrace, ExpectedOutcome, Scenario};
use triage_core::scoring_api::{ScoreResult, Scorer};

use crate::memory::normalized_query_input;
use crate::mention::{Mention, MentionClassifier};
use crate::text::{normalize_conclusion, normalize_for_match};

pub const MENTIONED_CREDIT: f64 = 0.5;

fn fraction(hit: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        hit as f64 / total as f64
    }
}

/// Did the conclusion name the causes the scenario expects?
#[derive(Debug, Clone, Default)]
pub struct RootCauseCoverage {
    classifier: MentionClassifier,
}

impl RootCauseCoverage {
    pub fn new(classifier: MentionClassifier) -> Self {
        Self { classifier }
    }
}

impl Scorer for RootCauseCoverage {
    fn name(&self) -> &'static str {
        "root_cause_coverage"
    }

    fn score(
        &self,
        _scenario: &Scenario,
        expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        let required = &expected.root_cause_must_mention;
        if required.is_empty() {
            return ScoreResult::not_applicable("no required root-cause terms defined");
        }
        let text = normalize_conclusion(&trace.conclusion_text());
        let mut attributed = Vec::new();
        let mut mentioned = Vec::new();
        let mut missing = Vec::new();
        for term in required {
            match self.classifier.classify(&text, term) {
                Mention::Attributed => attributed.push(term.clone()),
                Mention::Mentioned => mentioned.push(term.clone()),
                Mention::Negated | Mention::None => missing.push(term.clone()),
            }
        }
        let credit = attributed.len() as f64 + MENTIONED_CREDIT * mentioned.len() as f64;
        ScoreResult::new(credit / required.len() as f64)
            .with("attributed_terms", attributed)
            .with("mentioned_terms", mentioned)
            .with("missing_terms", missing)
    }
}

/// Evidence items the conclusion is expected to cite.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredEvidence;

impl Scorer for RequiredEvidence {
    fn name(&self) -> &'static str {
        "required_evidence"
    }

    fn score(
        &self,
        _scenario: &Scenario,
        expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        let required = &expected.required_evidence;
        if required.is_empty() {
            return ScoreResult::not_applicable("no required evidence defined");
        }
        let text = normalize_for_match(&normalize_conclusion(&trace.final_text));
        let (found, missing): (Vec<&String>, Vec<&String>) = required.iter().partition(|item| {
            let needle = normalize_for_match(item);
            !needle.is_empty() && text.contains(&needle)
        });
        ScoreResult::new(fraction(found.len(), required.len()))
            .with("found", found.into_iter().cloned().collect::<Vec<_>>())
            .with("missing", missing.into_iter().cloned().collect::<Vec<_>>())
    }
}

/// Queries the scenario expects the agent to have run.
#[derive(Debug, Clone, Default)]
pub struct RequiredQueries {
    tools: ToolCatalog,
}

impl RequiredQueries {
    pub fn new(tools: ToolCatalog) -> Self {
        Self { tools }
    }
}

impl Scorer for RequiredQueries {
    fn name(&self) -> &'static str {
        "required_queries"
    }

    fn score(
        &self,
        scenario: &Scenario,
        expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        if scenario.flags().allow_no_queries {
            return ScoreResult::not_applicable("scenario allows runs without queries");
        }
        let required = &expected.required_queries;
        if required.is_empty() {
            return ScoreResult::not_applicable("no required queries defined");
        }
        let executed: Vec<String> = trace
            .tool_calls
            .iter()
            .filter(|c| self.tools.is_query_tool(&c.tool))
            .map(normalized_query_input)
            .collect();
        let (found, missing): (Vec<&String>, Vec<&String>) = required.iter().partition(|q| {
            let needle = normalize_for_match(q);
            !needle.is_empty() && executed.iter().any(|e| e.contains(&needle))
        });
        ScoreResult::new(fraction(found.len(), required.len()))
            .with("executed_queries", executed.len())
            .with("found", found.into_iter().cloned().collect::<Vec<_>>())
            .with("missing", missing.into_iter().cloned().collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use triage_core::config::QUERY_LOGS;
    use triage_core::model::ToolCall;

    fn expected() -> ExpectedOutcome {
        ExpectedOutcome {
            root_cause_must_mention: ["connection pool", "deploy"].map(String::from).into(),
            required_evidence: ["p99 latency", "14:02"].map(String::from).into(),
            required_queries: ["service:checkout"].map(String::from).into(),
            ..Default::default()
        }
    }

    #[test]
    fn root_cause_partial_credit_for_bare_mentions() {
        let trace = ExecutionTrace {
            final_text: "Root cause: connection pool exhaustion. We looked at the deploy log too."
                .into(),
            ..Default::default()
        };
        let s = Scenario::default();
        let r = RootCauseCoverage::default().score(&s, &expected(), &trace);
        assert!((r.score - 0.75).abs() < 1e-9);
        assert_eq!(r.metadata["mentioned_terms"], json!(["deploy"]));
    }

    #[test]
    fn negated_required_cause_earns_nothing() {
        let trace = ExecutionTrace {
            final_text: "We ruled out the connection pool and the deploy was not involved.".into(),
            ..Default::default()
        };
        let s = Scenario::default();
        let r = RootCauseCoverage::default().score(&s, &expected(), &trace);
        assert_eq!(r.score, 0.0);
    }

    #[test]
    fn evidence_fraction() {
        let trace = ExecutionTrace {
            final_text: "P99  latency hit 2.3s right after the deploy.".into(),
            ..Default::default()
        };
        let s = Scenario::default();
        let r = RequiredEvidence.score(&s, &expected(), &trace);
        assert_eq!(r.score, 0.5);
        assert_eq!(r.metadata["missing"], json!(["14:02"]));
    }

    #[test]
    fn required_queries_matched_in_query_calls() {
        let s = Scenario::default();
        let trace = ExecutionTrace {
            tool_calls: vec![ToolCall::new(
                QUERY_LOGS,
                json!({"query": "Service:\"checkout\" AND level:error"}),
            )],
            ..Default::default()
        };
        let r = RequiredQueries::default().score(&s, &expected(), &trace);
        assert_eq!(r.score, 1.0);

        let r = RequiredQueries::default().score(&s, &expected(), &ExecutionTrace::default());
        assert_eq!(r.score, 0.0);
    }

    #[test]
    fn empty_contracts_are_not_applicable() {
        let s = Scenario::default();
        let e = ExpectedOutcome::default();
        let t = ExecutionTrace::default();
        assert!(!RootCauseCoverage::default().score(&s, &e, &t).applicable());
        assert!(!RequiredEvidence.score(&s, &e, &t).applicable());
        assert!(!RequiredQueries::default().score(&s, &e, &t).applicable());
    }
}
