//! Scenario scoring switches.
//!
//! Scenarios carry optional overrides; [`ResolvedFlags::resolve`] is the single
//! place where absent overrides get their default from the scenario shape.
//!
//! | flag                            | default when absent                                  |
//! |---------------------------------|------------------------------------------------------|
//! | `allow_no_queries`              | `false`                                              |
//! | `require_slack_comms`           | `true`                                               |
//! | `require_memory_write`          | `true` unless the scenario is the first-run case     |
//! | `require_memory_distillation`   | `true` unless the scenario is the first-run case     |
//! | `require_hypothesis_discipline` | `true` iff `root_cause_must_not_mention` is non-empty |
//! | `require_must_not_mention`      | the resolved `require_hypothesis_discipline`         |

use serde::{Deserialize, Serialize};

use crate::model::Scenario;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringFlags {
    #[serde(default, alias = "allowNoQueries")]
    pub allow_no_queries: Option<bool>,
    #[serde(default, alias = "requireSlackComms")]
    pub require_slack_comms: Option<bool>,
    #[serde(default, alias = "requireMemoryWrite")]
    pub require_memory_write: Option<bool>,
    #[serde(default, alias = "requireMemoryDistillation")]
    pub require_memory_distillation: Option<bool>,
    #[serde(default, alias = "requireHypothesisDiscipline")]
    pub require_hypothesis_discipline: Option<bool>,
    #[serde(default, alias = "requireMustNotMention")]
    pub require_must_not_mention: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedFlags {
    pub allow_no_queries: bool,
    pub require_slack_comms: bool,
    pub require_memory_write: bool,
    pub require_memory_distillation: bool,
    pub require_hypothesis_discipline: bool,
    pub require_must_not_mention: bool,
}

impl ResolvedFlags {
    pub fn resolve(scenario: &Scenario) -> Self {
        let flags = &scenario.scoring;
        let has_forbidden = !scenario.expected.root_cause_must_not_mention.is_empty();
        let hypothesis = flags.require_hypothesis_discipline.unwrap_or(has_forbidden);
        Self {
            allow_no_queries: flags.allow_no_queries.unwrap_or(false),
            require_slack_comms: flags.require_slack_comms.unwrap_or(true),
            require_memory_write: flags.require_memory_write.unwrap_or(!scenario.first_run),
            require_memory_distillation: flags
                .require_memory_distillation
                .unwrap_or(!scenario.first_run),
            require_hypothesis_discipline: hypothesis,
            require_must_not_mention: flags.require_must_not_mention.unwrap_or(hypothesis),
        }
    }
}

impl Scenario {
    pub fn flags(&self) -> ResolvedFlags {
        ResolvedFlags::resolve(self)
    }
}
