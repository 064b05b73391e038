use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::TriageError;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

pub const QUERY_LOGS: &str = "query_logs";
pub const QUERY_METRICS: &str = "query_metrics";
pub const DISCOVER_LOG_SOURCES: &str = "discover_log_sources";
pub const DISCOVER_METRICS: &str = "discover_metrics";
pub const MEMORY_WRITE: &str = "memory_write";
pub const SLACK_POST_MESSAGE: &str = "slack_post_message";

/// Discovery tool -> the query tools it gates. Extend by adding rows.
pub const DEFAULT_DISCOVERY_PAIRS: &[(&str, &[&str])] = &[
    (DISCOVER_LOG_SOURCES, &[QUERY_LOGS]),
    (DISCOVER_METRICS, &[QUERY_METRICS]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCatalog {
    pub discovery_pairs: BTreeMap<String, Vec<String>>,
    pub query_tools: Vec<String>,
    pub knowledge_write_tools: Vec<String>,
    pub communication_tools: Vec<String>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self {
            discovery_pairs: DEFAULT_DISCOVERY_PAIRS
                .iter()
                .map(|(d, qs)| (d.to_string(), qs.iter().map(|q| q.to_string()).collect()))
                .collect(),
            query_tools: vec![QUERY_LOGS.into(), QUERY_METRICS.into()],
            knowledge_write_tools: vec![MEMORY_WRITE.into()],
            communication_tools: vec![SLACK_POST_MESSAGE.into()],
        }
    }
}

impl ToolCatalog {
    /// Inverse of `discovery_pairs`: query tool -> gating discovery tool.
    /// A query tool listed under two discovery tools keeps the first.
    pub fn discovery_for_query(&self) -> BTreeMap<&str, &str> {
        let mut inverse = BTreeMap::new();
        for (discovery, queries) in &self.discovery_pairs {
            for q in queries {
                inverse.entry(q.as_str()).or_insert(discovery.as_str());
            }
        }
        inverse
    }

    pub fn is_query_tool(&self, tool: &str) -> bool {
        self.query_tools.iter().any(|t| t == tool)
    }

    pub fn is_knowledge_write(&self, tool: &str) -> bool {
        self.knowledge_write_tools.iter().any(|t| t == tool)
    }

    pub fn is_communication(&self, tool: &str) -> bool {
        self.communication_tools.iter().any(|t| t == tool)
    }
}

/// Extra cue phrases appended to the built-in mention classifier cue lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueOverrides {
    pub negation: Vec<String>,
    pub attribution: Vec<String>,
    pub consequence: Vec<String>,
}

impl CueOverrides {
    pub fn is_empty(&self) -> bool {
        self.negation.is_empty() && self.attribution.is_empty() && self.consequence.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub version: u32,
    #[serde(default)]
    pub tools: ToolCatalog,
    #[serde(default)]
    pub cues: CueOverrides,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            tools: ToolCatalog::default(),
            cues: CueOverrides::default(),
        }
    }
}

pub fn parse_config(raw: &str) -> Result<ScoringConfig, TriageError> {
    let cfg: ScoringConfig =
        serde_yaml::from_str(raw).map_err(|e| TriageError::ConfigParse(e.to_string()))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(TriageError::UnsupportedConfigVersion {
            found: cfg.version,
            supported: SUPPORTED_CONFIG_VERSION,
        });
    }
    if cfg.tools.query_tools.is_empty() {
        return Err(TriageError::ConfigParse("tools.query_tools is empty".into()));
    }
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<ScoringConfig, TriageError> {
    let raw = std::fs::read_to_string(path).map_err(|e| TriageError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    let cfg = parse_config(&raw)?;
    tracing::debug!(path = %path.display(), "loaded scoring config");
    Ok(cfg)
}

/// Loads `path` when given, else the built-in defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<ScoringConfig, TriageError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(ScoringConfig::default()),
    }
}
