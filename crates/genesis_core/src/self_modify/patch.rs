use genesis_data::{BehaviorDiff, BehaviorParams, OrganismId, Tunable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    Trial,
    Kept,
    Discarded,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    BehaviorModification,
    EfficiencyImprovement,
    SurvivalAdaptation,
    LearningEnhancement,
}

impl ModificationKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ModificationKind::BehaviorModification => "behavior_modification",
            ModificationKind::EfficiencyImprovement => "efficiency_improvement",
            ModificationKind::SurvivalAdaptation => "survival_adaptation",
            ModificationKind::LearningEnhancement => "learning_enhancement",
        }
    }
}

/// Survival and energy bookkeeping for one organism under observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: OrganismId,
    pub start_tick: u64,
    pub start_energy: f64,
    pub last_energy: f64,
    pub death_tick: Option<u64>,
}

impl TrialRecord {
    #[must_use]
    pub fn new(id: OrganismId, tick: u64, energy: f64) -> Self {
        Self {
            id,
            start_tick: tick,
            start_energy: energy,
            last_energy: energy,
            death_tick: None,
        }
    }

    /// Fraction of the observation span survived plus half the relative energy
    /// trend, the latter clamped to `[-1, 1]`.
    #[must_use]
    pub fn fitness(&self, now: u64) -> f64 {
        let span = now.saturating_sub(self.start_tick).max(1) as f64;
        let survived = match self.death_tick {
            Some(t) => t.saturating_sub(self.start_tick) as f64 / span,
            None => 1.0,
        };
        let trend =
            ((self.last_energy - self.start_energy) / self.start_energy.max(1.0)).clamp(-1.0, 1.0);
        survived.min(1.0) + 0.5 * trend
    }
}

#[must_use]
pub fn mean_fitness(records: &[TrialRecord], now: u64) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(records.iter().map(|r| r.fitness(now)).sum::<f64>() / records.len() as f64)
}

/// A versioned behavior change under trial. Only offspring born inside the
/// window ever run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowPatch {
    pub id: Uuid,
    pub lineage: Uuid,
    pub proposer: OrganismId,
    pub kind: ModificationKind,
    pub diff: BehaviorDiff,
    /// Proposer's behavior when the patch was packaged.
    pub baseline: BehaviorParams,
    pub proposed_tick: u64,
    pub window_end: u64,
    pub status: PatchStatus,
    pub subjects: Vec<TrialRecord>,
    /// Unpatched lineage members tracked over the same span.
    pub cohort: Vec<TrialRecord>,
}

impl ShadowPatch {
    #[must_use]
    pub fn in_window(&self, tick: u64) -> bool {
        self.status == PatchStatus::Trial && tick >= self.proposed_tick && tick < self.window_end
    }

    #[must_use]
    pub fn is_due(&self, tick: u64, delay: u64) -> bool {
        self.status == PatchStatus::Trial && tick >= self.window_end + delay
    }

    pub fn record_mut(&mut self, id: OrganismId) -> Option<&mut TrialRecord> {
        self.subjects
            .iter_mut()
            .chain(self.cohort.iter_mut())
            .find(|r| r.id == id)
    }
}

/// Applies a diff, clamping every touched tunable to its range.
#[must_use]
pub fn apply_diff(params: &BehaviorParams, diff: &BehaviorDiff) -> BehaviorParams {
    let mut out = *params;
    for (tunable, delta) in &diff.deltas {
        let (lo, hi) = tunable.range();
        out.set(*tunable, (out.get(*tunable) + delta).clamp(lo, hi));
    }
    if let Some(strategy) = diff.strategy {
        out.strategy = strategy;
    }
    out
}

/// Moves one tunable by `delta` inside its range. Returns `(before, after)`.
pub fn tweak(params: &mut BehaviorParams, tunable: Tunable, delta: f32) -> (f32, f32) {
    let before = params.get(tunable);
    let (lo, hi) = tunable.range();
    let after = (before + delta).clamp(lo, hi);
    params.set(tunable, after);
    (before, after)
}
