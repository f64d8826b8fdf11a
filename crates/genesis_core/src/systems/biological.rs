//! Metabolism, frustration, capability unlocks and reproduction.

use super::foraging::ForageOutcome;
use super::stream;
use crate::brain::InterfaceChange;
use crate::config::AppConfig;
use crate::interaction::{observation, record_observation};
use crate::lifecycle::{
    can_reproduce, is_stagnating, metabolism_cost, record_mood, register_failure,
    reproduce_with_rng, update_emotional_state,
};
use crate::rng::organism_rng;
use genesis_data::{
    EventTag, FailureKind, MoodSample, ObservationKind, Organism, OrganismId, SimEvent,
};
use tracing::debug;

/// Pays upkeep, folds the tick into the mood window and the failure counters,
/// then ages the organism. Returns one `Unlock` event per new capability.
pub fn process_vitals(
    organism: &mut Organism,
    outcome: &ForageOutcome,
    region_population: usize,
    config: &AppConfig,
    tick: u64,
) -> Vec<SimEvent> {
    let cost = metabolism_cost(organism, config);
    organism.vitals.energy = (organism.vitals.energy - cost).max(0.0);

    let frustration = &config.frustration;
    record_mood(
        &mut organism.psyche,
        MoodSample {
            energy_delta: outcome.gained - outcome.spent - cost,
            success: outcome.success,
        },
        frustration.mood_window,
    );

    let mut failures = outcome.failures.clone();
    if region_population <= 1 {
        failures.push(FailureKind::Isolation);
    }
    if is_stagnating(&organism.psyche, frustration.mood_window) {
        failures.push(FailureKind::Stagnation);
    }

    let id = organism.id();
    let mut events = Vec::new();
    for kind in failures {
        if let Some(capability) = register_failure(organism, kind, frustration) {
            events.push(SimEvent::new(
                tick,
                EventTag::Unlock,
                vec![id],
                format!("#{id} unlocked {} after repeated {}", capability.label(), kind.label()),
            ));
        }
    }

    if let Some((from, to)) = update_emotional_state(&mut organism.psyche, frustration) {
        debug!(organism = id, from = from.label(), to = to.label(), "Emotional state changed");
    }
    organism.vitals.age += 1;
    events
}

/// Offspring with its `Birth` event and any interface changes from mutation.
pub struct Birth {
    pub child: Organism,
    pub changes: Vec<InterfaceChange>,
    pub events: Vec<SimEvent>,
}

/// Splits off a child when the parent is over the reproduction threshold.
pub fn try_reproduce(
    parent: &mut Organism,
    child_id: OrganismId,
    config: &AppConfig,
    tick: u64,
    tick_seed: u64,
) -> Option<Birth> {
    if !can_reproduce(parent, config) {
        return None;
    }
    let mut rng = organism_rng(tick_seed, parent.id(), stream::REPRODUCE);
    let (mut child, changes) = reproduce_with_rng(parent, child_id, tick, config, &mut rng);
    record_observation(
        &mut child.social,
        observation(tick, parent.id(), ObservationKind::Inherited),
        config.social.observation_capacity,
    );

    let mut events = vec![SimEvent::new(
        tick,
        EventTag::Birth,
        vec![parent.id(), child_id],
        format!(
            "#{} born to #{} (generation {})",
            child_id,
            parent.id(),
            child.identity.generation
        ),
    )];
    if !changes.is_empty() {
        let summary: Vec<String> = changes.iter().map(InterfaceChange::describe).collect();
        events.push(SimEvent::new(
            tick,
            EventTag::Interface,
            vec![child_id],
            format!("#{child_id} {}", summary.join(", ")),
        ));
    }
    Some(Birth {
        child,
        changes,
        events,
    })
}
