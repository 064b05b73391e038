use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{ExecutionTrace, ExpectedOutcome, Scenario};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub metadata: Map<String, Value>,
}

impl ScoreResult {
    /// Clamps into `[0, 1]`; NaN and infinities collapse to 0.
    pub fn new(score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut metadata = Map::new();
        metadata.insert("applicable".into(), Value::Bool(true));
        Self { score, metadata }
    }

    /// Check did not apply to this scenario: full credit, but marked untested.
    pub fn not_applicable(note: &str) -> Self {
        Self::new(1.0)
            .with("applicable", false)
            .with("note", note)
    }

    /// Measurement was unusable: lowest score plus the reason.
    pub fn invalid(note: &str) -> Self {
        Self::new(0.0).with("note", note)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn applicable(&self) -> bool {
        self.metadata
            .get("applicable")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn note(&self) -> Option<&str> {
        self.metadata.get("note").and_then(Value::as_str)
    }
}

/// A single trace check. Implementations must be pure: the same inputs always
/// yield the same result, and nothing is mutated.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(
        &self,
        scenario: &Scenario,
        expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult;
}
