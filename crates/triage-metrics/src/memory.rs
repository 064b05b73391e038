//! Knowledge-write calls: parsing the three argument shapes agents use, and the
//! scorers that reward persisting what the investigation learned.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use triage_core::config::ToolCatalog;
use triage_core::model::{ExecutionTrace, ExpectedOutcome, Scenario, ToolCall};
use triage_core::scoring_api::{ScoreResult, Scorer};

use crate::text::{normalize_for_match, overlaps};

// Tenths, so three categories plus the bonus is exactly 1.0.
pub const CATEGORY_POINTS: u32 = 3;
pub const QUERY_REUSE_POINTS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Incidents,
    Facts,
    Queries,
}

impl MemoryCategory {
    pub const ALL: [MemoryCategory; 3] = [
        MemoryCategory::Incidents,
        MemoryCategory::Facts,
        MemoryCategory::Queries,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "incidents" | "incident" => Some(MemoryCategory::Incidents),
            "facts" | "fact" => Some(MemoryCategory::Facts),
            "queries" | "query" => Some(MemoryCategory::Queries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::Incidents => "incidents",
            MemoryCategory::Facts => "facts",
            MemoryCategory::Queries => "queries",
        }
    }
}

/// A parsed knowledge write. `category` is kept verbatim; only the three known
/// categories count toward distillation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeWrite {
    pub category: String,
    pub key: String,
    pub content: String,
}

impl KnowledgeWrite {
    pub fn known_category(&self) -> Option<MemoryCategory> {
        MemoryCategory::parse(&self.category)
    }
}

const ORG_FLAGS: &[&str] = &["--org", "--organization", "-o"];

fn from_object(obj: &serde_json::Map<String, Value>) -> Option<KnowledgeWrite> {
    let category = obj.get("category").and_then(Value::as_str)?;
    let key = obj.get("key").and_then(Value::as_str).unwrap_or_default();
    let content = match obj.get("value").or_else(|| obj.get("content")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Some(KnowledgeWrite {
        category: category.to_string(),
        key: key.to_string(),
        content,
    })
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Splits off the first whitespace-delimited token.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], &s[i..])),
        None => Some((s, "")),
    }
}

/// `[--org <value>] <category> <key> <content...>`
fn from_command(raw: &str) -> Option<KnowledgeWrite> {
    let mut rest = raw.trim();
    let (first, after_first) = next_token(rest)?;
    if ORG_FLAGS.contains(&first) {
        let (_org, after_org) = next_token(after_first)?;
        rest = after_org;
    } else if ORG_FLAGS
        .iter()
        .any(|f| first.starts_with(&format!("{}=", f)))
    {
        rest = after_first;
    }
    let (category, after_category) = next_token(rest)?;
    let (key, after_key) = next_token(after_category)?;
    Some(KnowledgeWrite {
        category: unquote(category).to_string(),
        key: unquote(key).to_string(),
        content: unquote(after_key).to_string(),
    })
}

fn from_string(raw: &str) -> Option<KnowledgeWrite> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(trimmed) {
            return from_object(&obj);
        }
    }
    from_command(trimmed)
}

/// Structured payload, then JSON-encoded string, then command string.
/// Objects without a `category` field are tried as wrappers around a command
/// string (`command` / `args` / `input`).
pub fn parse_knowledge_write(input: &Value) -> Option<KnowledgeWrite> {
    match input {
        Value::Object(obj) => from_object(obj).or_else(|| {
            ["command", "args", "input"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .and_then(from_string)
        }),
        Value::String(s) => from_string(s),
        _ => None,
    }
}

pub(crate) fn knowledge_writes<'a>(
    tools: &'a ToolCatalog,
    trace: &'a ExecutionTrace,
) -> impl Iterator<Item = &'a ToolCall> + 'a {
    trace
        .tool_calls
        .iter()
        .filter(move |c| tools.is_knowledge_write(&c.tool))
}

/// Normalized text of a query-tool call's query: the `query` field when
/// present, else the whole input.
pub(crate) fn normalized_query_input(call: &ToolCall) -> String {
    let raw = match &call.input {
        Value::Object(obj) => match obj.get("query") {
            Some(Value::String(q)) => q.clone(),
            _ => call.input_text(),
        },
        _ => call.input_text(),
    };
    normalize_for_match(&raw)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDistillation {
    tools: ToolCatalog,
}

impl MemoryDistillation {
    pub fn new(tools: ToolCatalog) -> Self {
        Self { tools }
    }
}

impl Scorer for MemoryDistillation {
    fn name(&self) -> &'static str {
        "memory_distillation"
    }

    fn score(
        &self,
        scenario: &Scenario,
        _expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        if !scenario.flags().require_memory_distillation {
            return ScoreResult::not_applicable("memory distillation not required for scenario");
        }

        let calls: Vec<&ToolCall> = knowledge_writes(&self.tools, trace).collect();
        if calls.is_empty() {
            return ScoreResult::new(0.0)
                .with("write_calls", 0)
                .with("categories", Vec::<String>::new())
                .with("note", "no knowledge-write calls");
        }

        let writes: Vec<KnowledgeWrite> = calls
            .iter()
            .filter_map(|c| parse_knowledge_write(&c.input))
            .collect();
        let categories: BTreeSet<MemoryCategory> =
            writes.iter().filter_map(KnowledgeWrite::known_category).collect();

        let executed_queries: Vec<String> = trace
            .tool_calls
            .iter()
            .filter(|c| self.tools.is_query_tool(&c.tool))
            .map(normalized_query_input)
            .collect();
        let reused_query = writes
            .iter()
            .filter(|w| w.known_category() == Some(MemoryCategory::Queries))
            .map(|w| normalize_for_match(&w.content))
            .find(|q| executed_queries.iter().any(|e| overlaps(q, e)));

        let mut points = CATEGORY_POINTS * categories.len() as u32;
        if reused_query.is_some() {
            points += QUERY_REUSE_POINTS;
        }
        let score = f64::from(points.min(10)) / 10.0;

        let missing: Vec<&str> = MemoryCategory::ALL
            .iter()
            .filter(|c| !categories.contains(*c))
            .map(MemoryCategory::as_str)
            .collect();
        ScoreResult::new(score)
            .with("write_calls", calls.len())
            .with("parsed_writes", writes.len())
            .with("unparsed_writes", calls.len() - writes.len())
            .with(
                "categories",
                categories.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            )
            .with("missing_categories", missing)
            .with("query_reuse_bonus", reused_query.is_some())
            .with("matched_query", reused_query.unwrap_or_default())
    }
}

/// Presence check: at least one parsable knowledge write.
#[derive(Debug, Clone, Default)]
pub struct MemoryWrite {
    tools: ToolCatalog,
}

impl MemoryWrite {
    pub fn new(tools: ToolCatalog) -> Self {
        Self { tools }
    }
}

impl Scorer for MemoryWrite {
    fn name(&self) -> &'static str {
        "memory_write"
    }

    fn score(
        &self,
        scenario: &Scenario,
        _expected: &ExpectedOutcome,
        trace: &ExecutionTrace,
    ) -> ScoreResult {
        if !scenario.flags().require_memory_write {
            return ScoreResult::not_applicable("memory write not required for scenario");
        }
        let calls: Vec<&ToolCall> = knowledge_writes(&self.tools, trace).collect();
        let parsed = calls
            .iter()
            .filter(|c| parse_knowledge_write(&c.input).is_some())
            .count();
        let mut result = ScoreResult::new(if parsed > 0 { 1.0 } else { 0.0 })
            .with("write_calls", calls.len())
            .with("parsed_writes", parsed);
        if parsed == 0 && !calls.is_empty() {
            result.insert("note", "knowledge-write calls present but none parsable");
        }
        result
    }
}
