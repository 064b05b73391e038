pub mod config;
pub mod errors;
pub mod flags;
pub mod health;
pub mod loader;
pub mod model;
pub mod scoring_api;

pub use errors::TriageError;
pub use flags::{ResolvedFlags, ScoringFlags};
pub use health::{assess_run_health, RunHealth};
pub use model::{Budgets, ExecutionTrace, ExpectedOutcome, Scenario, TokenUsage, ToolCall};
pub use scoring_api::{ScoreResult, Scorer};
