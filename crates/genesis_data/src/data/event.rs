use super::entity::OrganismId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Short tag identifying the kind of a [`SimEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    Unlock,
    Death,
    Birth,
    Depletion,
    Teaching,
    Care,
    Trade,
    Migration,
    Interface,
    ParamChange,
    ShadowTrial,
    PatchKept,
    PatchDiscarded,
    Rollback,
    SandboxViolation,
    Advice,
    Fallback,
    SourceExhausted,
    Terminated,
    Modulation,
    Summary,
}

impl EventTag {
    /// Tags that are aggregated into periodic summaries instead of being
    /// emitted one by one.
    #[must_use]
    pub fn is_high_frequency(self) -> bool {
        matches!(
            self,
            EventTag::Birth
                | EventTag::Depletion
                | EventTag::Teaching
                | EventTag::Care
                | EventTag::Trade
                | EventTag::Migration
                | EventTag::Interface
                | EventTag::Advice
                | EventTag::SourceExhausted
        )
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EventTag::Unlock => "unlock",
            EventTag::Death => "death",
            EventTag::Birth => "birth",
            EventTag::Depletion => "depletion",
            EventTag::Teaching => "teaching",
            EventTag::Care => "care",
            EventTag::Trade => "trade",
            EventTag::Migration => "migration",
            EventTag::Interface => "interface",
            EventTag::ParamChange => "param_change",
            EventTag::ShadowTrial => "shadow_trial",
            EventTag::PatchKept => "patch_kept",
            EventTag::PatchDiscarded => "patch_discarded",
            EventTag::Rollback => "rollback",
            EventTag::SandboxViolation => "sandbox_violation",
            EventTag::Advice => "advice",
            EventTag::Fallback => "fallback",
            EventTag::SourceExhausted => "source_exhausted",
            EventTag::Terminated => "terminated",
            EventTag::Modulation => "modulation",
            EventTag::Summary => "summary",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A structured, human-readable notice.
///
/// Carries no wall-clock data, so identical runs produce identical logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub tag: EventTag,
    pub entities: Vec<OrganismId>,
    pub description: String,
}

impl SimEvent {
    #[must_use]
    pub fn new(tick: u64, tag: EventTag, entities: Vec<OrganismId>, description: String) -> Self {
        Self {
            tick,
            tag,
            entities,
            description,
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] #{} {}", self.tag, self.tick, self.description)
    }
}
