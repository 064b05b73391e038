use triage_core::config::ScoringConfig;
use triage_metrics::default_scorers;

use crate::exit_codes;

pub fn cmd_scorers() -> anyhow::Result<i32> {
    for scorer in default_scorers(&ScoringConfig::default()) {
        println!("{}", scorer.name());
    }
    Ok(exit_codes::EXIT_SUCCESS)
}
