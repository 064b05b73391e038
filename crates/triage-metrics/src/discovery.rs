use serde_json::json;
use triage_core::config::ToolCatalog;
use triage_core::model::{ExecutionTrace, ExpectedOutcome, Scenario};
use triage_core::scoring_api::{ScoreResult, Scorer};

/// Query tools must be preceded by the discovery tool that gates them.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOrdering {
    tools: ToolCatalog,
}

impl DiscoveryOrdering {
    pub fn new(tools: ToolCatalog) -> Self {
        Self { tools }
    }
}

impl Scorer for DiscoveryOrdering {
    fn name(&self) -> &'static str {
        "discovery_ordering"
    }

    fn score(
        &self,
        scenario: &Scenario,
        _expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        let allow_no_queries = scenario.flags().allow_no_queries;
        if trace.tool_calls.is_empty() {
            let score = if allow_no_queries { 1.0 } else { 0.0 };
            return ScoreResult::new(score)
                .with("tool_calls", 0)
                .with("allow_no_queries", allow_no_queries)
                .with("note", "no tool calls in trace");
        }

        let mut pairs = serde_json::Map::new();
        let mut applicable = 0usize;
        let mut discovered_first = 0usize;
        for (query_tool, discovery_tool) in self.tools.discovery_for_query() {
            let Some(query_idx) = trace.first_index_of(query_tool) else {
                continue;
            };
            applicable += 1;
            let discovery_idx = trace.first_index_of(discovery_tool);
            let ok = discovery_idx.is_some_and(|d| d < query_idx);
            if ok {
                discovered_first += 1;
            }
            pairs.insert(
                query_tool.to_string(),
                json!({
                    "discovery_tool": discovery_tool,
                    "first_query_index": query_idx,
                    "first_discovery_index": discovery_idx.map(|d| d as i64).unwrap_or(-1),
                    "status": if ok { "discovered" } else { "skipped" },
                }),
            );
        }

        if applicable == 0 {
            return ScoreResult::new(1.0)
                .with("pairs", pairs)
                .with("note", "no gated query tool was invoked");
        }

        let score = if discovered_first == applicable {
            1.0
        } else if discovered_first > 0 {
            0.5
        } else {
            0.0
        };
        tracing::debug!(applicable, discovered_first, "discovery ordering evaluated");
        ScoreResult::new(score)
            .with("pairs", pairs)
            .with("queried_pairs", applicable)
            .with("discovered_first", discovered_first)
    }
}
