//! Cue phrase lists for mention classification.
//!
//! Bump [`CUES_VERSION`] whenever a built-in list or the cue matching changes:
//! classifications of stored traces are only comparable within one version.

use triage_core::config::CueOverrides;

pub const CUES_VERSION: u32 = 4;

/// Preceding window ends with one of these: the term is being rejected.
pub const NEGATION_BEFORE: &[&str] = &[
    "not",
    "isn't",
    "wasn't",
    "aren't",
    "weren't",
    "never",
    "ruled out",
    "excluded",
    "instead of",
    "rather than",
    "not due to",
    "not caused by",
];

/// Following window starts with one of these: the term is being rejected.
pub const NEGATION_AFTER: &[&str] = &[
    "is not",
    "was not",
    "are not",
    "were not",
    "isn't",
    "wasn't",
    "aren't",
    "weren't",
    "is ruled out",
    "was ruled out",
    "were ruled out",
    "has been ruled out",
    "was also ruled out",
    "was excluded",
    "is excluded",
    "is unrelated",
    "was unrelated",
    "not",
    "ruled out",
    "excluded",
];

/// Preceding window ends with one of these: the term is named as the cause.
pub const ATTRIBUTION_BEFORE: &[&str] = &[
    "root cause",
    "cause",
    "caused by",
    "due to",
    "because",
    "because of",
    "reason",
    "culprit",
    "attributed to",
    "driven by",
    "triggered by",
];

/// Following clause contains one of these: the term is the subject of a causal claim.
pub const CONSEQUENCE_AFTER: &[&str] = &[
    "is the cause",
    "was the cause",
    "is the root cause",
    "was the root cause",
    "caused",
    "causing",
    "responsible",
    "culprit",
    "root cause",
    "reason",
];

/// Anywhere in the local clause: causal framing around the term.
pub const ATTRIBUTION_PHRASES: &[&str] = &[
    "root cause",
    "caused by",
    "due to",
    "because",
    "attributed to",
    "driven by",
    "triggered by",
    "culprit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueSet {
    pub version: u32,
    pub negation_before: Vec<String>,
    pub negation_after: Vec<String>,
    pub attribution_before: Vec<String>,
    pub consequence_after: Vec<String>,
    pub attribution_phrases: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for CueSet {
    fn default() -> Self {
        Self {
            version: CUES_VERSION,
            negation_before: owned(NEGATION_BEFORE),
            negation_after: owned(NEGATION_AFTER),
            attribution_before: owned(ATTRIBUTION_BEFORE),
            consequence_after: owned(CONSEQUENCE_AFTER),
            attribution_phrases: owned(ATTRIBUTION_PHRASES),
        }
    }
}

impl CueSet {
    /// Built-in lists extended with configured phrases. Negation overrides
    /// apply on both sides of the term; attribution overrides apply before
    /// the term and anywhere in the clause.
    pub fn with_overrides(overrides: &CueOverrides) -> Self {
        let mut cues = Self::default();
        cues.negation_before.extend(overrides.negation.iter().cloned());
        cues.negation_after.extend(overrides.negation.iter().cloned());
        cues.attribution_before
            .extend(overrides.attribution.iter().cloned());
        cues.attribution_phrases
            .extend(overrides.attribution.iter().cloned());
        cues.consequence_after
            .extend(overrides.consequence.iter().cloned());
        cues
    }
}
