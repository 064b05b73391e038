#![no_main]

use libfuzzer_sys::fuzz_target;
use triage_core::config::ScoringConfig;
use triage_core::loader::parse_trace;
use triage_core::model::Scenario;
use triage_metrics::{default_scorers, evaluate_run};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(trace) = parse_trace(s) else {
        return;
    };
    let scenario = Scenario {
        id: "fuzz".into(),
        ..Default::default()
    };
    let report = evaluate_run(&scenario, &trace, &default_scorers(&ScoringConfig::default()));
    for r in report.scores.values() {
        assert!((0.0..=1.0).contains(&r.score));
    }
});
