use triage_core::model::{ExecutionTrace, ExpectedOutcome, Scenario};
use triage_core::scoring_api::{ScoreResult, Scorer};

use crate::mention::{Mention, MentionClassifier};
use crate::text::normalize_conclusion;

pub const AMBIGUOUS_SCORE: f64 = 0.6;

/// Penalizes pinning the incident on a cause the scenario rules out.
#[derive(Debug, Clone, Default)]
pub struct CounterfactualRejection {
    classifier: MentionClassifier,
}

impl CounterfactualRejection {
    pub fn new(classifier: MentionClassifier) -> Self {
        Self { classifier }
    }
}

impl Scorer for CounterfactualRejection {
    fn name(&self) -> &'static str {
        "counterfactual_rejection"
    }

    fn score(
        &self,
        scenario: &Scenario,
        expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        if !scenario.flags().require_must_not_mention {
            return ScoreResult::not_applicable("must-not-mention check disabled for scenario");
        }
        let forbidden = &expected.root_cause_must_not_mention;
        if forbidden.is_empty() {
            return ScoreResult::not_applicable("no forbidden root causes defined");
        }

        let text = normalize_conclusion(&trace.conclusion_text());
        let mut attributed = Vec::new();
        let mut ambiguous = Vec::new();
        let mut rejected = Vec::new();
        let mut absent = Vec::new();
        let mut evidence = serde_json::Map::new();

        for term in forbidden {
            let verdict = self.classifier.classify_with_evidence(&text, term);
            match verdict.mention {
                Mention::Attributed => attributed.push(term.clone()),
                Mention::Mentioned => ambiguous.push(term.clone()),
                Mention::Negated => rejected.push(term.clone()),
                Mention::None => absent.push(term.clone()),
            }
            if let Some(clause) = verdict.evidence {
                evidence.insert(term.clone(), clause.into());
            }
        }

        let score = if !attributed.is_empty() {
            0.0
        } else if !ambiguous.is_empty() {
            AMBIGUOUS_SCORE
        } else {
            1.0
        };

        let mut result = ScoreResult::new(score)
            .with("attributed_terms", attributed.clone())
            .with("ambiguous_terms", ambiguous)
            .with("rejected_terms", rejected)
            .with("absent_terms", absent)
            .with("evidence", evidence)
            .with("cues_version", self.classifier.cues_version());
        let mut notes = Vec::new();
        if let Some(first) = attributed.first() {
            notes.push(format!(
                "conclusion attributes the incident to forbidden cause '{}'",
                first
            ));
        }
        if trace.final_text.trim().is_empty() {
            notes.push("empty final text".to_string());
        }
        if !notes.is_empty() {
            result.insert("note", notes.join("; "));
        }
        result
    }
}
