//! Rhetorical role of a term inside a conclusion.
//!
//! Each occurrence is judged from a small window of text around it: a negation
//! cue right before or right after rejects it, an attribution cue right before
//! (or causal framing in the same clause) pins it as the cause. Scans are
//! linear in the text size; windows are bounded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::cues::CueSet;
use triage_core::config::CueOverrides;

pub const WINDOW_BEFORE_CHARS: usize = 64;
pub const WINDOW_AFTER_CHARS: usize = 96;

const CLAUSE_BREAKS: &[char] = &['.', ';', '!', '?', '\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mention {
    None,
    Negated,
    Mentioned,
    Attributed,
}

impl Mention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mention::None => "none",
            Mention::Negated => "negated",
            Mention::Mentioned => "mentioned",
            Mention::Attributed => "attributed",
        }
    }
}

/// Verdict plus the clause that decided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionVerdict {
    pub mention: Mention,
    pub occurrences: usize,
    pub evidence: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MentionClassifier {
    cues_version: u32,
    negation_before: Regex,
    negation_after: Regex,
    attribution_before: Regex,
    consequence_after: Regex,
    attribution_phrase: Regex,
}

static DEFAULT_CLASSIFIER: Lazy<MentionClassifier> =
    Lazy::new(|| MentionClassifier::new(&CueSet::default()));

fn alternation(cues: &[String]) -> String {
    let mut sorted: Vec<&String> = cues.iter().filter(|c| !c.trim().is_empty()).collect();
    sorted.sort_by_key(|c| std::cmp::Reverse(c.len()));
    sorted.dedup();
    if sorted.is_empty() {
        // Matches nothing.
        return r"\b\B".to_string();
    }
    sorted
        .iter()
        .map(|c| {
            c.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn compile(pattern: String) -> Regex {
    // Cue phrases are escaped, so only the fixed scaffolding can be malformed.
    Regex::new(&pattern).unwrap_or_else(|_| Regex::new(r"\b\B").unwrap())
}

fn tail_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((i, _)) if n > 0 => &s[i..],
        _ if n == 0 => "",
        _ => s,
    }
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn term_pattern(term: &str) -> Option<Regex> {
    let words: Vec<String> = term.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", words.join(r"\s+"))).ok()
}

impl Default for MentionClassifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

impl MentionClassifier {
    pub fn new(cues: &CueSet) -> Self {
        let trailing_filler = r"[\s:,\-\u{2013}\u{2014}()]*";
        Self {
            cues_version: cues.version,
            negation_before: compile(format!(
                r"(?i)\b(?:{}){}(?:(?:the|a|an|any)\s+)?$",
                alternation(&cues.negation_before),
                trailing_filler
            )),
            // Only whitespace may precede the cue: ", not Y" and "(not Y)"
            // reject Y, not the term.
            negation_after: compile(format!(
                r"(?i)^\s*(?:{})\b",
                alternation(&cues.negation_after)
            )),
            attribution_before: compile(format!(
                r"(?i)\b(?:{}){}(?:(?:is|was|were|appears to be|seems to be)\s+)?(?:(?:likely|probably|most likely)\s+)?(?:(?:the|a|an)\s+)?$",
                alternation(&cues.attribution_before),
                trailing_filler
            )),
            consequence_after: compile(format!(
                r"(?i)\b(?:{})\b",
                alternation(&cues.consequence_after)
            )),
            attribution_phrase: compile(format!(
                r"(?i)\b(?:{})\b",
                alternation(&cues.attribution_phrases)
            )),
        }
    }

    pub fn with_overrides(overrides: &CueOverrides) -> Self {
        if overrides.is_empty() {
            return Self::default();
        }
        Self::new(&CueSet::with_overrides(overrides))
    }

    pub fn cues_version(&self) -> u32 {
        self.cues_version
    }

    pub fn classify(&self, text: &str, term: &str) -> Mention {
        self.classify_with_evidence(text, term).mention
    }

    /// Attributed on the first attributed occurrence. Otherwise the first
    /// non-attributed occurrence decides between negated and mentioned, so a
    /// rejection followed by a bare repeat of the term stays negated.
    pub fn classify_with_evidence(&self, text: &str, term: &str) -> MentionVerdict {
        let Some(pattern) = term_pattern(term) else {
            return MentionVerdict {
                mention: Mention::None,
                occurrences: 0,
                evidence: None,
            };
        };
        let checks_start = term.trim_start().chars().next().is_some_and(is_word_char);
        let checks_end = term.trim_end().chars().last().is_some_and(is_word_char);

        let mut occurrences = 0;
        let mut settled: Option<(Mention, String)> = None;
        for m in pattern.find_iter(text) {
            let before_all = &text[..m.start()];
            let after_all = &text[m.end()..];
            if checks_start && before_all.chars().next_back().is_some_and(is_word_char) {
                continue;
            }
            if checks_end && after_all.chars().next().is_some_and(is_word_char) {
                continue;
            }
            occurrences += 1;

            let before = tail_chars(before_all, WINDOW_BEFORE_CHARS);
            let after = head_chars(after_all, WINDOW_AFTER_CHARS);
            let before_clause = before
                .rfind(CLAUSE_BREAKS)
                .map(|i| &before[i + 1..])
                .unwrap_or(before);
            let after_clause = after
                .find(CLAUSE_BREAKS)
                .map(|i| &after[..i])
                .unwrap_or(after);
            let clause = format!("{}{}{}", before_clause, m.as_str(), after_clause)
                .trim()
                .to_string();

            let kind = if self.negation_before.is_match(before)
                || self.negation_after.is_match(after)
            {
                Mention::Negated
            } else if self.attribution_before.is_match(before)
                || self.consequence_after.is_match(after_clause)
                || self.attribution_phrase.is_match(&clause)
            {
                Mention::Attributed
            } else {
                Mention::Mentioned
            };

            if kind == Mention::Attributed {
                return MentionVerdict {
                    mention: kind,
                    occurrences,
                    evidence: Some(clause),
                };
            }
            if settled.is_none() {
                settled = Some((kind, clause));
            }
        }

        match settled {
            Some((mention, clause)) => MentionVerdict {
                mention,
                occurrences,
                evidence: Some(clause),
            },
            None => MentionVerdict {
                mention: Mention::None,
                occurrences: 0,
                evidence: None,
            },
        }
    }
}

/// Classifies with the built-in cue lists.
pub fn classify_mention(text: &str, term: &str) -> Mention {
    DEFAULT_CLASSIFIER.classify(text, term)
}
