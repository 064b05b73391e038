use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use triage_core::health::{assess_run_health, RunHealth};
use triage_core::model::{ExecutionTrace, Scenario};
use triage_core::scoring_api::{ScoreResult, Scorer};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario_id: String,
    pub health: RunHealth,
    pub scores: BTreeMap<String, ScoreResult>,
}

impl RunReport {
    /// Unweighted mean over applicable scorers. Convenience for reports only;
    /// the individual scores are the contract.
    pub fn mean_applicable(&self) -> Option<f64> {
        let applicable: Vec<f64> = self
            .scores
            .values()
            .filter(|r| r.applicable())
            .map(|r| r.score)
            .collect();
        if applicable.is_empty() {
            return None;
        }
        Some(applicable.iter().sum::<f64>() / applicable.len() as f64)
    }
}

/// Runs every scorer over one trace and embeds the run health in each result.
pub fn evaluate_run(
    scenario: &Scenario,
    trace: &ExecutionTrace,
    scorers: &[Arc<dyn Scorer>],
) -> RunReport {
    let span = tracing::info_span!("evaluate_run", scenario = %scenario.id);
    let _enter = span.enter();

    let health = assess_run_health(trace);
    let mut scores = BTreeMap::new();
    for scorer in scorers {
        let mut result = scorer.score(scenario, &scenario.expected, trace);
        health.embed(&mut result);
        tracing::debug!(scorer = scorer.name(), score = result.score, "scored");
        scores.insert(scorer.name().to_string(), result);
    }
    RunReport {
        scenario_id: scenario.id.clone(),
        health,
        scores,
    }
}
