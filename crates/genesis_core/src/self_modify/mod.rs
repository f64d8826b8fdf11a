//! Capability-gated self-modification.
//!
//! Organisms may read their own behavior hooks (`read_self`), nudge a single
//! tunable (`modify_param`), or package a [`patch::ShadowPatch`]
//! (`modify_logic`, `write_code`). A shadow patch never touches its proposer:
//! it rides on offspring born during the trial window and is judged against
//! the unpatched lineage before it may reach the lineage's static logic.

pub mod logic;
pub mod patch;
pub mod sandbox;

use crate::config::SelfModifyConfig;
use genesis_data::{
    BehaviorDiff, BehaviorParams, Capability, EventTag, FailureKind, ForagingStrategy, Organism,
    OrganismId, SimEvent, Tunable,
};
use logic::{range_smoke_test, LogicRegistry, SmokeTest};
use patch::{apply_diff, mean_fitness, ModificationKind, PatchStatus, ShadowPatch, TrialRecord};
use rand::seq::SliceRandom;
use rand::Rng;
use sandbox::SandboxViolation;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelfModError {
    #[error("capability `{0}` not unlocked")]
    Locked(Capability),
    #[error("lineage already has a patch under trial")]
    TrialActive,
    #[error("active patch limit reached")]
    TooManyPatches,
    #[error("patch changes nothing")]
    EmptyDiff,
    #[error(transparent)]
    Sandbox(#[from] SandboxViolation),
}

/// What an organism sees of itself once `read_self` is unlocked.
#[derive(Debug, Clone, PartialEq)]
pub struct Introspection {
    pub behavior: BehaviorParams,
    pub sensors: usize,
    pub actuators: usize,
    pub hidden: usize,
    pub logic_version: u32,
}

pub fn introspect(organism: &Organism) -> Result<Introspection, SelfModError> {
    if !organism.capabilities.contains(Capability::ReadSelf) {
        return Err(SelfModError::Locked(Capability::ReadSelf));
    }
    let genome = &organism.intel.genome;
    Ok(Introspection {
        behavior: organism.intel.behavior,
        sensors: genome.sensors.len(),
        actuators: genome.actuators.len(),
        hidden: genome.hidden,
        logic_version: organism.intel.logic_version,
    })
}

/// Bounded tweak of one tunable on the organism itself, logged as a
/// `ParamChange` event.
pub fn tweak_param(
    organism: &mut Organism,
    tunable: Tunable,
    delta: f32,
    reason: &str,
    tick: u64,
) -> Result<SimEvent, SelfModError> {
    if !organism.capabilities.contains(Capability::ModifyParam) {
        return Err(SelfModError::Locked(Capability::ModifyParam));
    }
    let (before, after) = patch::tweak(&mut organism.intel.behavior, tunable, delta);
    Ok(SimEvent::new(
        tick,
        EventTag::ParamChange,
        vec![organism.id()],
        format!("#{} {tunable} {before:.3} -> {after:.3} ({reason})", organism.id()),
    ))
}

/// Tunable an organism reaches for given its most recent failure.
#[must_use]
pub fn tunable_for(failure: Option<FailureKind>) -> (Tunable, f32, ModificationKind) {
    match failure {
        Some(FailureKind::EmptyForage) | None => (
            Tunable::ExplorationBias,
            1.0,
            ModificationKind::SurvivalAdaptation,
        ),
        Some(FailureKind::Indigestible) => (
            Tunable::LearningRate,
            1.0,
            ModificationKind::LearningEnhancement,
        ),
        Some(FailureKind::Isolation) => (
            Tunable::TeachThreshold,
            -1.0,
            ModificationKind::BehaviorModification,
        ),
        Some(FailureKind::Stagnation) => (
            Tunable::ConserveBias,
            1.0,
            ModificationKind::EfficiencyImprovement,
        ),
    }
}

/// A small diff aimed at the organism's latest failure, sometimes with a
/// strategy swap.
pub fn draft_diff<R: Rng>(organism: &Organism, step: f32, rng: &mut R) -> (BehaviorDiff, ModificationKind) {
    let (tunable, sign, kind) = tunable_for(organism.psyche.last_failure);
    let (lo, hi) = tunable.range();
    let magnitude = step * (hi - lo) * rng.gen_range(0.5..1.5);
    let mut deltas = vec![(tunable, sign * magnitude)];
    if rng.gen_bool(0.3) {
        let extra = Tunable::ALL[rng.gen_range(0..Tunable::ALL.len())];
        if extra != tunable {
            let (lo, hi) = extra.range();
            deltas.push((extra, step * (hi - lo) * rng.gen_range(-1.0..1.0)));
        }
    }
    let strategy = if rng.gen_bool(0.2) {
        ForagingStrategy::ALL
            .choose(rng)
            .copied()
            .filter(|s| *s != organism.intel.behavior.strategy)
    } else {
        None
    };
    (BehaviorDiff { deltas, strategy }, kind)
}

/// A snippet an organism with `write_code` composes for itself.
pub fn draft_snippet<R: Rng>(organism: &Organism, step: f32, rng: &mut R) -> String {
    let (tunable, sign, _) = tunable_for(organism.psyche.last_failure);
    let (lo, hi) = tunable.range();
    let delta = sign * step * (hi - lo) * rng.gen_range(0.5..1.5);
    format!("load {tunable}; push {delta:.4}; add; store {tunable}")
}

pub struct SelfModifyManager {
    config: SelfModifyConfig,
    active: Vec<ShadowPatch>,
    resolved: BTreeMap<Uuid, PatchStatus>,
    registry: LogicRegistry,
    smoke_test: SmokeTest,
}

impl SelfModifyManager {
    #[must_use]
    pub fn new(config: SelfModifyConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
            resolved: BTreeMap::new(),
            registry: LogicRegistry::default(),
            smoke_test: range_smoke_test,
        }
    }

    #[must_use]
    pub fn with_smoke_test(mut self, smoke_test: SmokeTest) -> Self {
        self.smoke_test = smoke_test;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &LogicRegistry {
        &self.registry
    }

    pub fn active(&self) -> impl Iterator<Item = &ShadowPatch> {
        self.active.iter()
    }

    #[must_use]
    pub fn status(&self, id: &Uuid) -> Option<PatchStatus> {
        self.active
            .iter()
            .find(|p| p.id == *id)
            .map(|p| p.status)
            .or_else(|| self.resolved.get(id).copied())
    }

    /// Packages `diff` as a shadow patch for the proposer's lineage. The
    /// proposer's own behavior is left untouched.
    pub fn propose<R: Rng>(
        &mut self,
        proposer: &Organism,
        diff: BehaviorDiff,
        kind: ModificationKind,
        cohort: Vec<TrialRecord>,
        tick: u64,
        rng: &mut R,
    ) -> Result<SimEvent, SelfModError> {
        let caps = &proposer.capabilities;
        if !caps.contains(Capability::ModifyLogic) && !caps.contains(Capability::WriteCode) {
            return Err(SelfModError::Locked(Capability::ModifyLogic));
        }
        if diff.is_empty() {
            return Err(SelfModError::EmptyDiff);
        }
        let lineage = proposer.identity.lineage_id;
        if self.active.iter().any(|p| p.lineage == lineage) {
            return Err(SelfModError::TrialActive);
        }
        if self.active.len() >= self.config.max_active_patches {
            return Err(SelfModError::TooManyPatches);
        }

        self.registry
            .seed(lineage, proposer.intel.behavior, tick);
        let id = Uuid::from_u128(rng.gen::<u128>());
        let event = SimEvent::new(
            tick,
            EventTag::ShadowTrial,
            vec![proposer.id()],
            format!(
                "#{} proposed {} patch {} ({} deltas)",
                proposer.id(),
                kind.label(),
                short(&id),
                diff.deltas.len()
            ),
        );
        debug!(patch = %id, proposer = proposer.id(), "Shadow patch proposed");
        self.active.push(ShadowPatch {
            id,
            lineage,
            proposer: proposer.id(),
            kind,
            diff,
            baseline: proposer.intel.behavior,
            proposed_tick: tick,
            window_end: tick + self.config.trial_window_ticks,
            status: PatchStatus::Trial,
            subjects: Vec::new(),
            cohort,
        });
        Ok(event)
    }

    /// Runs a snippet in the sandbox and proposes the resulting diff.
    pub fn propose_snippet<R: Rng>(
        &mut self,
        proposer: &Organism,
        source: &str,
        cohort: Vec<TrialRecord>,
        tick: u64,
        rng: &mut R,
    ) -> Result<SimEvent, SelfModError> {
        if !proposer.capabilities.contains(Capability::WriteCode) {
            return Err(SelfModError::Locked(Capability::WriteCode));
        }
        let diff = sandbox::evaluate(source, &proposer.intel.behavior, self.config.sandbox_op_budget)?;
        self.propose(
            proposer,
            diff,
            ModificationKind::EfficiencyImprovement,
            cohort,
            tick,
            rng,
        )
    }

    /// Decides what behavior a newborn runs.
    ///
    /// In order: revert to the pre-patch baseline if the parent carried a
    /// patch that has since been dropped, adopt a newer lineage logic version,
    /// then layer any patch currently under trial on top.
    pub fn on_birth(&mut self, parent: &Organism, child: &mut Organism, tick: u64) {
        if let Some(pid) = parent.intel.shadow_patch {
            match self.status(&pid) {
                Some(PatchStatus::Discarded | PatchStatus::RolledBack) => {
                    child.intel.behavior = parent.intel.baseline_behavior.unwrap_or(parent.intel.behavior);
                }
                Some(PatchStatus::Trial) => {
                    child.intel.shadow_patch = Some(pid);
                    child.intel.baseline_behavior = parent.intel.baseline_behavior;
                }
                Some(PatchStatus::Kept) | None => {}
            }
        }

        let lineage = child.identity.lineage_id;
        if let Some(head) = self.registry.head(&lineage) {
            if head.version > child.intel.logic_version {
                child.intel.behavior = head.behavior;
                child.intel.logic_version = head.version;
                child.intel.shadow_patch = None;
                child.intel.baseline_behavior = None;
            }
        }

        if let Some(patch) = self
            .active
            .iter_mut()
            .find(|p| p.lineage == lineage && p.in_window(tick))
        {
            // A child of a subject already runs the patched behavior and
            // carries the subject's baseline.
            if child.intel.shadow_patch != Some(patch.id) {
                child.intel.baseline_behavior = Some(child.intel.behavior);
                child.intel.behavior = apply_diff(&child.intel.behavior, &patch.diff);
                child.intel.shadow_patch = Some(patch.id);
            }
            patch
                .subjects
                .push(TrialRecord::new(child.id(), tick, child.vitals.energy));
        }
    }

    /// Refreshes energy readings of every tracked organism and forgets
    /// verdicts no living organism still carries.
    pub fn observe(&mut self, organisms: &[Organism]) {
        for patch in &mut self.active {
            for org in organisms {
                if let Some(rec) = patch.record_mut(org.id()) {
                    rec.last_energy = org.vitals.energy;
                }
            }
        }
        if !self.resolved.is_empty() {
            self.resolved.retain(|id, _| {
                organisms
                    .iter()
                    .any(|o| o.intel.shadow_patch.as_ref() == Some(id))
            });
        }
    }

    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn record_death(&mut self, id: OrganismId, tick: u64) {
        for patch in &mut self.active {
            if let Some(rec) = patch.record_mut(id) {
                rec.death_tick.get_or_insert(tick);
                rec.last_energy = 0.0;
            }
        }
    }

    /// Judges due patches, oldest first, at most `trial_budget_per_tick` of
    /// them. The rest wait for a later tick.
    pub fn evaluate_due(&mut self, tick: u64) -> Vec<SimEvent> {
        let delay = self.config.evaluation_delay;
        let mut events = Vec::new();
        let mut budget = self.config.trial_budget_per_tick;
        let mut idx = 0;
        while idx < self.active.len() && budget > 0 {
            if !self.active[idx].is_due(tick, delay) {
                idx += 1;
                continue;
            }
            budget -= 1;
            let mut patch = self.active.remove(idx);
            events.push(self.judge(&mut patch, tick));
            self.resolved.insert(patch.id, patch.status);
        }
        events
    }

    fn judge(&mut self, patch: &mut ShadowPatch, tick: u64) -> SimEvent {
        let entities = vec![patch.proposer];
        let tag_id = short(&patch.id);
        if patch.subjects.len() < self.config.min_subjects {
            patch.status = PatchStatus::Discarded;
            return SimEvent::new(
                tick,
                EventTag::PatchDiscarded,
                entities,
                format!(
                    "patch {tag_id} discarded: {} of {} subjects",
                    patch.subjects.len(),
                    self.config.min_subjects
                ),
            );
        }

        let treated = mean_fitness(&patch.subjects, tick).unwrap_or(0.0);
        let control = mean_fitness(&patch.cohort, tick).unwrap_or(0.0);
        if treated < control + self.config.keep_margin {
            patch.status = PatchStatus::Discarded;
            return SimEvent::new(
                tick,
                EventTag::PatchDiscarded,
                entities,
                format!("patch {tag_id} discarded: fitness {treated:.3} vs {control:.3}"),
            );
        }

        match self.registry.promote(
            patch.lineage,
            patch.id,
            &patch.diff,
            patch.baseline,
            tick,
            self.smoke_test,
        ) {
            Ok(version) => {
                patch.status = PatchStatus::Kept;
                info!(patch = %patch.id, version, "Shadow patch kept");
                SimEvent::new(
                    tick,
                    EventTag::PatchKept,
                    entities,
                    format!("patch {tag_id} kept as logic v{version}: fitness {treated:.3} vs {control:.3}"),
                )
            }
            Err(e) => {
                patch.status = PatchStatus::RolledBack;
                warn!(patch = %patch.id, error = %e, "Rolled back lineage logic");
                SimEvent::new(
                    tick,
                    EventTag::Rollback,
                    entities,
                    format!("patch {tag_id} rolled back: {e}"),
                )
            }
        }
    }
}

fn short(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
