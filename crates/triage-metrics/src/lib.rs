use std::sync::Arc;

use triage_core::config::ScoringConfig;
use triage_core::scoring_api::Scorer;

pub mod budget;
pub mod comms;
pub mod counterfactual;
pub mod coverage;
pub mod cues;
pub mod discovery;
pub mod engine;
pub mod memory;
pub mod mention;
pub mod resources;
pub mod text;

pub use engine::{evaluate_run, RunReport};
pub use mention::{classify_mention, Mention, MentionClassifier};

pub fn default_scorers(config: &ScoringConfig) -> Vec<Arc<dyn Scorer>> {
    let classifier = mention::MentionClassifier::with_overrides(&config.cues);
    let tools = &config.tools;
    vec![
        Arc::new(counterfactual::CounterfactualRejection::new(classifier.clone())),
        Arc::new(discovery::DiscoveryOrdering::new(tools.clone())),
        Arc::new(memory::MemoryDistillation::new(tools.clone())),
        Arc::new(memory::MemoryWrite::new(tools.clone())),
        Arc::new(comms::CommunicationCheckpoints::new(tools.clone())),
        Arc::new(budget::TimeBudget),
        Arc::new(resources::ResourceBudget),
        Arc::new(coverage::RootCauseCoverage::new(classifier)),
        Arc::new(coverage::RequiredEvidence),
        Arc::new(coverage::RequiredQueries::new(tools.clone())),
    ]
}

/// Looks up one default scorer by name.
pub fn scorer_by_name(config: &ScoringConfig, name: &str) -> Option<Arc<dyn Scorer>> {
    default_scorers(config)
        .into_iter()
        .find(|s| s.name() == name)
}
