//! Time budget scoring.
//!
//! Scores follow a budget curve: full credit up to a soft limit, then linear
//! decay to zero at a hard ceiling.

use serde::Serialize;
use triage_core::model::{ExecutionTrace, ExpectedOutcome, Scenario};
use triage_core::scoring_api::{ScoreResult, Scorer};

/// Harness kills the run here.
pub const ABSOLUTE_TIMEOUT_MS: f64 = 300_000.0;
pub const MIN_BUDGET_MS: f64 = 45_000.0;
pub const MAX_BUDGET_MS: f64 = 295_000.0;

pub const TIME_WEIGHT: f64 = 0.75;
pub const CADENCE_WEIGHT: f64 = 0.25;
pub const CADENCE_CEILING_FACTOR: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct BudgetProfile {
    base_ms: f64,
    per_call_ms: f64,
    fallback_ms: f64,
    cadence_target_ms: f64,
}

const NO_QUERY_PROFILE: BudgetProfile = BudgetProfile {
    base_ms: 20_000.0,
    per_call_ms: 12_000.0,
    fallback_ms: 90_000.0,
    cadence_target_ms: 40_000.0,
};

const QUERY_PROFILE: BudgetProfile = BudgetProfile {
    base_ms: 45_000.0,
    per_call_ms: 15_000.0,
    fallback_ms: 220_000.0,
    cadence_target_ms: 22_000.0,
};

fn profile(allow_no_queries: bool) -> BudgetProfile {
    if allow_no_queries {
        NO_QUERY_PROFILE
    } else {
        QUERY_PROFILE
    }
}

/// 1 at or below `soft`, 0 at or beyond `hard`, linear in between.
pub fn linear_decay(actual: f64, soft: f64, hard: f64) -> f64 {
    if !actual.is_finite() {
        return 0.0;
    }
    if actual <= soft {
        return 1.0;
    }
    if hard <= soft || actual >= hard {
        return 0.0;
    }
    (1.0 - (actual - soft) / (hard - soft)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSource {
    Explicit,
    DerivedFromToolCalls,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedBudget {
    pub budget_ms: f64,
    pub source: BudgetSource,
}

/// Explicit positive budget, else derived from the tool-call budget; always
/// clamped into `[MIN_BUDGET_MS, MAX_BUDGET_MS]`.
pub fn resolve_time_budget(scenario: &Scenario) -> ResolvedBudget {
    let p = profile(scenario.flags().allow_no_queries);
    let (raw, source) = match (scenario.budgets.max_elapsed_ms, scenario.budgets.max_tool_calls) {
        (Some(ms), _) if ms > 0 => (ms as f64, BudgetSource::Explicit),
        (_, Some(calls)) => (
            p.base_ms + p.per_call_ms * calls as f64,
            BudgetSource::DerivedFromToolCalls,
        ),
        _ => (p.fallback_ms, BudgetSource::Fallback),
    };
    ResolvedBudget {
        budget_ms: raw.clamp(MIN_BUDGET_MS, MAX_BUDGET_MS),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedTier {
    Fast,
    Nominal,
    Slow,
    Critical,
}

impl SpeedTier {
    pub fn from_utilization(ratio: f64) -> Self {
        if ratio <= 0.70 {
            SpeedTier::Fast
        } else if ratio <= 1.0 {
            SpeedTier::Nominal
        } else if ratio <= 1.20 {
            SpeedTier::Slow
        } else {
            SpeedTier::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedTier::Fast => "fast",
            SpeedTier::Nominal => "nominal",
            SpeedTier::Slow => "slow",
            SpeedTier::Critical => "critical",
        }
    }
}

fn secs(ms: f64) -> f64 {
    (ms / 10.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeBudget;

impl Scorer for TimeBudget {
    fn name(&self) -> &'static str {
        "time_budget"
    }

    fn score(
        &self,
        scenario: &Scenario,
        _expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        let elapsed_ms = match trace.elapsed_ms {
            Some(ms) if ms.is_finite() && ms > 0.0 => ms,
            Some(_) => return ScoreResult::invalid("elapsed time is not positive"),
            None => return ScoreResult::invalid("elapsed time missing from trace"),
        };

        let allow_no_queries = scenario.flags().allow_no_queries;
        let budget = resolve_time_budget(scenario);
        let time_score = linear_decay(elapsed_ms, budget.budget_ms, ABSOLUTE_TIMEOUT_MS);

        let calls = trace.tool_calls.len().max(1) as f64;
        let cadence_ms = elapsed_ms / calls;
        let target = profile(allow_no_queries).cadence_target_ms;
        let cadence_score = linear_decay(cadence_ms, target, target * CADENCE_CEILING_FACTOR);

        let utilization = elapsed_ms / budget.budget_ms;
        let tier = SpeedTier::from_utilization(utilization);
        let score = TIME_WEIGHT * time_score + CADENCE_WEIGHT * cadence_score;
        tracing::debug!(elapsed_ms, budget_ms = budget.budget_ms, tier = tier.as_str(), "time budget evaluated");

        ScoreResult::new(score)
            .with("elapsed_ms", elapsed_ms)
            .with("elapsed_s", secs(elapsed_ms))
            .with("budget_ms", budget.budget_ms)
            .with("budget_s", secs(budget.budget_ms))
            .with("budget_source", serde_json::to_value(budget.source).unwrap_or_default())
            .with("hard_ceiling_ms", ABSOLUTE_TIMEOUT_MS)
            .with("utilization_pct", (utilization * 1000.0).round() / 10.0)
            .with("speed_tier", tier.as_str())
            .with("time_score", time_score)
            .with("cadence_ms_per_call", cadence_ms.round())
            .with("cadence_target_ms", target)
            .with("cadence_score", cadence_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::model::{Budgets, ToolCall};

    fn trace(elapsed_ms: Option<f64>, calls: usize) -> ExecutionTrace {
        ExecutionTrace {
            tool_calls: (0..calls)
                .map(|_| ToolCall::new("query_logs", serde_json::json!({})))
                .collect(),
            elapsed_ms,
            ..Default::default()
        }
    }

    fn scenario(budgets: Budgets) -> Scenario {
        Scenario {
            budgets,
            ..Default::default()
        }
    }

    #[test]
    fn decay_curve_edges() {
        assert_eq!(linear_decay(100.0, 100.0, 300.0), 1.0);
        assert_eq!(linear_decay(200.0, 100.0, 300.0), 0.5);
        assert_eq!(linear_decay(300.0, 100.0, 300.0), 0.0);
        assert_eq!(linear_decay(900.0, 100.0, 300.0), 0.0);
        assert_eq!(linear_decay(f64::NAN, 100.0, 300.0), 0.0);
        assert_eq!(linear_decay(150.0, 300.0, 100.0), 1.0);
    }

    #[test]
    fn budget_resolution() {
        let explicit = scenario(Budgets {
            max_elapsed_ms: Some(120_000),
            max_tool_calls: Some(3),
            ..Default::default()
        });
        assert_eq!(resolve_time_budget(&explicit).budget_ms, 120_000.0);
        assert_eq!(resolve_time_budget(&explicit).source, BudgetSource::Explicit);

        let derived = scenario(Budgets {
            max_tool_calls: Some(6),
            ..Default::default()
        });
        assert_eq!(resolve_time_budget(&derived).budget_ms, 45_000.0 + 6.0 * 15_000.0);

        let mut no_query = scenario(Budgets {
            max_tool_calls: Some(1),
            ..Default::default()
        });
        no_query.scoring.allow_no_queries = Some(true);
        // 20s + 12s = 32s, clamped up.
        assert_eq!(resolve_time_budget(&no_query).budget_ms, MIN_BUDGET_MS);

        let huge = scenario(Budgets {
            max_tool_calls: Some(40),
            ..Default::default()
        });
        assert_eq!(resolve_time_budget(&huge).budget_ms, MAX_BUDGET_MS);

        let zero = scenario(Budgets {
            max_elapsed_ms: Some(0),
            ..Default::default()
        });
        let r = resolve_time_budget(&zero);
        assert_eq!(r.budget_ms, 220_000.0);
        assert_eq!(r.source, BudgetSource::Fallback);
    }

    #[test]
    fn missing_or_non_positive_elapsed_scores_zero() {
        let s = Scenario::default();
        let r = TimeBudget.score(&s, &s.expected, &trace(None, 3));
        assert_eq!(r.score, 0.0);
        assert!(r.note().is_some());
        let r = TimeBudget.score(&s, &s.expected, &trace(Some(-5.0), 3));
        assert_eq!(r.score, 0.0);
    }

    #[test]
    fn elapsed_equal_to_budget_gets_full_time_credit() {
        let s = scenario(Budgets {
            max_elapsed_ms: Some(100_000),
            ..Default::default()
        });
        let r = TimeBudget.score(&s, &s.expected, &trace(Some(100_000.0), 10));
        assert_eq!(r.metadata["time_score"], 1.0);
        assert_eq!(r.metadata["cadence_score"], 1.0);
        assert_eq!(r.score, 1.0);
        assert_eq!(r.metadata["speed_tier"], "nominal");
        assert_eq!(r.metadata["utilization_pct"], 100.0);
    }

    #[test]
    fn modest_overrun_is_slow_tier() {
        let s = scenario(Budgets {
            max_elapsed_ms: Some(100_000),
            ..Default::default()
        });
        let r = TimeBudget.score(&s, &s.expected, &trace(Some(110_000.0), 10));
        assert_eq!(r.metadata["speed_tier"], "slow");
        let time_score = r.metadata["time_score"].as_f64().unwrap();
        assert!((time_score - 0.95).abs() < 1e-9);

        let r = TimeBudget.score(&s, &s.expected, &trace(Some(120_000.0), 10));
        assert_eq!(r.metadata["speed_tier"], "slow");
        let r = TimeBudget.score(&s, &s.expected, &trace(Some(120_500.0), 10));
        assert_eq!(r.metadata["speed_tier"], "critical");
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(SpeedTier::from_utilization(0.70), SpeedTier::Fast);
        assert_eq!(SpeedTier::from_utilization(1.0), SpeedTier::Nominal);
        assert_eq!(SpeedTier::from_utilization(1.000_1), SpeedTier::Slow);
        assert_eq!(SpeedTier::from_utilization(1.20), SpeedTier::Slow);
        assert_eq!(SpeedTier::from_utilization(1.21), SpeedTier::Critical);
    }

    #[test]
    fn at_ceiling_time_component_is_zero() {
        let s = Scenario::default();
        let r = TimeBudget.score(&s, &s.expected, &trace(Some(300_000.0), 100));
        assert_eq!(r.metadata["time_score"], 0.0);
        // cadence 3s/call is well under target, so only the cadence weight remains.
        assert!((r.score - CADENCE_WEIGHT).abs() < 1e-9);
        assert_eq!(r.metadata["speed_tier"], "critical");
    }

    #[test]
    fn slow_cadence_with_few_calls() {
        let s = Scenario::default();
        // fallback budget 220s; one call taking 66s is 3x the 22s cadence target.
        let r = TimeBudget.score(&s, &s.expected, &trace(Some(66_000.0), 1));
        assert_eq!(r.metadata["time_score"], 1.0);
        assert_eq!(r.metadata["cadence_score"], 0.0);
        assert!((r.score - TIME_WEIGHT).abs() < 1e-9);
        assert_eq!(r.metadata["speed_tier"], "fast");
    }
}
