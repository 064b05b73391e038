use std::path::Path;

use crate::errors::TriageError;
use crate::model::{ExecutionTrace, Scenario};

fn read(path: &Path) -> Result<String, TriageError> {
    std::fs::read_to_string(path).map_err(|e| TriageError::Read {
        path: path.display().to_string(),
        source: e,
    })
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Scenarios are authored in YAML; `.json` files are read as JSON.
pub fn load_scenario(path: &Path) -> Result<Scenario, TriageError> {
    let raw = read(path)?;
    let parsed = if is_json(path) {
        serde_json::from_str(&raw).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&raw).map_err(|e| e.to_string())
    };
    let scenario: Scenario = parsed.map_err(|message| TriageError::Scenario {
        path: path.display().to_string(),
        message,
    })?;
    if scenario.id.trim().is_empty() {
        return Err(TriageError::Scenario {
            path: path.display().to_string(),
            message: "missing id".into(),
        });
    }
    Ok(scenario)
}

pub fn parse_trace(raw: &str) -> Result<ExecutionTrace, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

pub fn load_trace(path: &Path) -> Result<ExecutionTrace, TriageError> {
    let raw = read(path)?;
    parse_trace(&raw).map_err(|message| TriageError::Trace {
        path: path.display().to_string(),
        message,
    })
}
