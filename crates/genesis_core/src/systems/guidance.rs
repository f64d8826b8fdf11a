//! Parent advice and self-modification.

use super::stream;
use crate::advisory::{Advisor, AdviceSource, AdvisoryRequest, Hint, ParentEconomy, RequestKind};
use crate::capability::advice_factor;
use crate::config::AppConfig;
use crate::rng::organism_rng;
use crate::self_modify::patch::TrialRecord;
use crate::self_modify::{
    draft_diff, draft_snippet, introspect, sandbox, tunable_for, tweak_param, SelfModError,
    SelfModifyManager,
};
use crate::snapshot::OrganismSnapshot;
use genesis_data::{Capability, EmotionalState, EventTag, Organism, SimEvent};
use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct GuidanceContext<'a> {
    pub economy: &'a mut ParentEconomy,
    pub advisor: &'a mut dyn Advisor,
    pub manager: &'a mut SelfModifyManager,
    pub config: &'a AppConfig,
    pub tick: u64,
    pub tick_seed: u64,
}

#[must_use]
pub fn call_probability(organism: &Organism, config: &AppConfig) -> f32 {
    let advisory = &config.advisory;
    let base = if organism.psyche.state == EmotionalState::Desperate {
        advisory.desperate_call_probability
    } else {
        advisory.base_call_probability
    };
    (base * advice_factor(&organism.capabilities)).clamp(0.0, 1.0)
}

/// Applies parsed hints. A snippet runs through the sandbox and lands as
/// direct tweaks on the organism.
pub fn apply_hints(organism: &mut Organism, hints: &[Hint], config: &AppConfig, tick: u64) -> Vec<SimEvent> {
    let id = organism.id();
    let mut events = Vec::new();
    for hint in hints {
        match hint {
            Hint::Tweak(tunable, delta) => {
                if let Ok(event) = tweak_param(organism, *tunable, *delta, "advice", tick) {
                    events.push(event);
                }
            }
            Hint::Prefer(data_type) => organism.intel.food_preference = Some(*data_type),
            Hint::Snippet(source) => {
                if !organism.capabilities.contains(Capability::WriteCode) {
                    continue;
                }
                match sandbox::evaluate(
                    source,
                    &organism.intel.behavior,
                    config.self_modify.sandbox_op_budget,
                ) {
                    Ok(diff) => {
                        for (tunable, delta) in diff.deltas {
                            if let Ok(event) = tweak_param(organism, tunable, delta, "advice snippet", tick) {
                                events.push(event);
                            }
                        }
                    }
                    Err(violation) => {
                        warn!(organism = id, %violation, "Advised snippet rejected");
                        events.push(SimEvent::new(
                            tick,
                            EventTag::SandboxViolation,
                            vec![id],
                            format!("#{id} advised snippet rejected: {violation}"),
                        ));
                    }
                }
            }
        }
    }
    events
}

/// Maybe asks the parent for help. Any answer, fallback included, grants
/// frustration relief.
pub fn seek_advice(organism: &mut Organism, ctx: &mut GuidanceContext<'_>) -> Vec<SimEvent> {
    let mut rng = organism_rng(ctx.tick_seed, organism.id(), stream::ADVICE);
    if rng.gen::<f32>() >= call_probability(organism, ctx.config) {
        return Vec::new();
    }
    let kind = if organism.capabilities.contains(Capability::ModifyParam) {
        RequestKind::BehaviorTweak
    } else {
        RequestKind::Advice
    };
    let request = AdvisoryRequest::for_organism(organism, kind, ctx.tick);
    let outcome = ctx.economy.consult(&mut *ctx.advisor, &request);
    organism.psyche.relief = (organism.psyche.relief + ctx.config.advisory.relief).clamp(0.0, 1.0);

    let id = organism.id();
    let mut events = Vec::new();
    match &outcome.source {
        AdviceSource::Parent | AdviceSource::Cache => events.push(SimEvent::new(
            ctx.tick,
            EventTag::Advice,
            vec![id],
            format!("#{id} ({}) heard: {}", outcome.mode.label(), outcome.text),
        )),
        AdviceSource::Fallback(err) => {
            warn!(organism = id, advisor = ctx.advisor.name(), error = %err, "Advisor unavailable, using fallback");
            events.push(SimEvent::new(
                ctx.tick,
                EventTag::Fallback,
                vec![id],
                format!("#{id} fallback ({err}): {}", outcome.text),
            ));
        }
    }
    events.extend(apply_hints(organism, &outcome.hints, ctx.config, ctx.tick));
    events
}

/// Trial cohort for a proposal: the proposer's living lineage as captured at
/// the start of the tick.
#[must_use]
pub fn lineage_cohort(snapshots: &[OrganismSnapshot], lineage: Uuid, tick: u64) -> Vec<TrialRecord> {
    snapshots
        .iter()
        .filter(|s| s.lineage_id == lineage)
        .map(|s| TrialRecord::new(s.id, tick, s.energy))
        .collect()
}

/// One self-modification opportunity: a bounded parameter tweak when
/// struggling, or a shadow-patch proposal.
pub fn self_modify_step(
    organism: &mut Organism,
    snapshots: &[OrganismSnapshot],
    ctx: &mut GuidanceContext<'_>,
) -> Vec<SimEvent> {
    let mut rng = organism_rng(ctx.tick_seed, organism.id(), stream::SELF_MODIFY);
    let config = &ctx.config.self_modify;
    let tick = ctx.tick;
    let id = organism.id();
    let caps = &organism.capabilities;
    let mut events = Vec::new();

    if caps.contains(Capability::ModifyParam)
        && organism.psyche.state >= EmotionalState::Struggling
        && rng.gen::<f32>() < config.tweak_probability
    {
        let (tunable, mut sign, _) = tunable_for(organism.psyche.last_failure);
        let (lo, hi) = tunable.range();
        if let Ok(view) = introspect(organism) {
            let current = view.behavior.get(tunable);
            if (sign > 0.0 && current >= hi) || (sign < 0.0 && current <= lo) {
                sign = -sign;
            }
        }
        if let Ok(event) = tweak_param(organism, tunable, sign * config.tweak_step * (hi - lo), "self", tick) {
            events.push(event);
        }
    }

    let caps = &organism.capabilities;
    let can_propose = caps.contains(Capability::ModifyLogic) || caps.contains(Capability::WriteCode);
    if !can_propose
        || organism.intel.shadow_patch.is_some()
        || rng.gen::<f32>() >= config.proposal_probability
    {
        return events;
    }

    let cohort = lineage_cohort(snapshots, organism.identity.lineage_id, tick);
    let result = if caps.contains(Capability::WriteCode) && rng.gen_bool(0.5) {
        let source = draft_snippet(organism, config.tweak_step, &mut rng);
        ctx.manager
            .propose_snippet(organism, &source, cohort, tick, &mut rng)
    } else {
        let (diff, kind) = draft_diff(organism, config.tweak_step, &mut rng);
        ctx.manager.propose(organism, diff, kind, cohort, tick, &mut rng)
    };
    match result {
        Ok(event) => events.push(event),
        Err(SelfModError::Sandbox(violation)) => events.push(SimEvent::new(
            tick,
            EventTag::SandboxViolation,
            vec![id],
            format!("#{id} snippet rejected: {violation}"),
        )),
        Err(e) => debug!(organism = id, reason = %e, "Proposal skipped"),
    }
    events
}
