use crate::brain::{BrainLogic, InterfaceChange};
use crate::capability::next_unlock;
use crate::config::{AppConfig, FrustrationConfig};
use genesis_data::{
    BehaviorParams, Capability, CapabilitySet, Diet, Drives, EmotionalState, FailureKind, Genome,
    Identity, Intel, KnowledgeBase, MemoryLog, MoodSample, Organism, OrganismId, Position, Psyche,
    SocialState, Vitals,
};
use rand::Rng;
use uuid::Uuid;

/// A founder: random genome, starting capabilities, its own lineage.
pub fn create_organism_with_rng<R: Rng>(
    id: OrganismId,
    position: Position,
    tick: u64,
    config: &AppConfig,
    rng: &mut R,
) -> Organism {
    let genome = Genome::new_random_with_rng(&config.brain, rng);
    Organism {
        identity: Identity {
            id,
            parent_id: None,
            lineage_id: Uuid::from_u128(rng.gen::<u128>()),
            generation: 0,
        },
        position,
        vitals: Vitals {
            energy: config.metabolism.initial_energy,
            age: 0,
            birth_tick: tick,
            offspring_count: 0,
            care_received: 0,
        },
        capabilities: CapabilitySet::starting(),
        psyche: Psyche::default(),
        memory: MemoryLog::with_capacity(config.metabolism.initial_memory_capacity),
        intel: Intel {
            genome,
            drives: Drives::default(),
            behavior: BehaviorParams::default(),
            baseline_behavior: None,
            shadow_patch: None,
            logic_version: 0,
            food_preference: None,
        },
        social: SocialState::default(),
        diet: Diet::default(),
        knowledge: KnowledgeBase::default(),
    }
}

/// Per-tick upkeep: base plus a term proportional to memory capacity.
#[must_use]
pub fn metabolism_cost(organism: &Organism, config: &AppConfig) -> f64 {
    config.metabolism.base_cost + config.metabolism.memory_cost * organism.memory.capacity as f64
}

/// Appends to the rolling mood window, dropping the oldest sample when full.
pub fn record_mood(psyche: &mut Psyche, sample: MoodSample, window: usize) {
    while psyche.mood.len() >= window.max(1) {
        psyche.mood.pop_front();
    }
    psyche.mood.push_back(sample);
}

/// `0.7 * failure_rate + 0.3 * decline - relief`, clamped to `[0, 1]`.
#[must_use]
pub fn frustration_level(psyche: &Psyche, config: &FrustrationConfig) -> f32 {
    if psyche.mood.is_empty() {
        return (-psyche.relief).max(0.0);
    }
    let n = psyche.mood.len() as f64;
    let failures = psyche.mood.iter().filter(|m| !m.success).count() as f64;
    let failure_rate = failures / n;
    let mean_delta = psyche.mood.iter().map(|m| m.energy_delta).sum::<f64>() / n;
    let decline = (-mean_delta / config.decline_scale).clamp(0.0, 1.0);
    ((0.7 * failure_rate + 0.3 * decline) as f32 - psyche.relief).clamp(0.0, 1.0)
}

#[must_use]
pub fn emotional_state_for(level: f32, config: &FrustrationConfig) -> EmotionalState {
    if level > config.desperate {
        EmotionalState::Desperate
    } else if level > config.frustrated {
        EmotionalState::Frustrated
    } else if level > config.struggling {
        EmotionalState::Struggling
    } else {
        EmotionalState::Content
    }
}

/// Recomputes frustration and state. Returns the transition, if any.
pub fn update_emotional_state(
    psyche: &mut Psyche,
    config: &FrustrationConfig,
) -> Option<(EmotionalState, EmotionalState)> {
    psyche.frustration = frustration_level(psyche, config);
    let next = emotional_state_for(psyche.frustration, config);
    let prev = psyche.state;
    psyche.state = next;
    psyche.relief = (psyche.relief - config.relief_decay).max(0.0);
    (prev != next).then_some((prev, next))
}

/// `true` when the window is full and its mean energy delta is not positive.
#[must_use]
pub fn is_stagnating(psyche: &Psyche, window: usize) -> bool {
    if psyche.mood.len() < window.max(1) {
        return false;
    }
    let mean = psyche.mood.iter().map(|m| m.energy_delta).sum::<f64>() / psyche.mood.len() as f64;
    mean <= 0.0
}

/// Bumps the counter for `kind`. On crossing its threshold the counter resets
/// and the next capability on that kind's ladder unlocks.
pub fn register_failure(
    organism: &mut Organism,
    kind: FailureKind,
    config: &FrustrationConfig,
) -> Option<Capability> {
    organism.psyche.last_failure = Some(kind);
    let count = organism.psyche.failures.increment(kind);
    if count < config.threshold(kind) {
        return None;
    }
    organism.psyche.failures.reset(kind);
    let capability = next_unlock(kind, &organism.capabilities)?;
    organism.capabilities.unlock(capability);
    Some(capability)
}

#[must_use]
pub fn can_reproduce(organism: &Organism, config: &AppConfig) -> bool {
    organism.is_alive() && organism.vitals.energy >= config.metabolism.reproduction_threshold
}

/// Splits off a child. The parent pays exactly `reproduction_cost`, which the
/// child receives as its starting energy.
pub fn reproduce_with_rng<R: Rng>(
    parent: &mut Organism,
    child_id: OrganismId,
    tick: u64,
    config: &AppConfig,
    rng: &mut R,
) -> (Organism, Vec<InterfaceChange>) {
    let cost = config.metabolism.reproduction_cost;
    parent.vitals.energy = (parent.vitals.energy - cost).max(0.0);
    parent.vitals.offspring_count += 1;

    let mut genome = parent.intel.genome.clone();
    let changes = genome.mutate_with_config(config, rng);

    let capacity = if rng.gen_bool(0.5) {
        parent.memory.capacity + 1
    } else {
        parent.memory.capacity.saturating_sub(1)
    };

    let mut social = SocialState::default();
    social.trust.insert(parent.id(), config.social.initial_trust);

    let child = Organism {
        identity: Identity {
            id: child_id,
            parent_id: Some(parent.id()),
            lineage_id: parent.identity.lineage_id,
            generation: parent.identity.generation + 1,
        },
        position: parent.position.clone(),
        vitals: Vitals {
            energy: cost,
            age: 0,
            birth_tick: tick,
            offspring_count: 0,
            care_received: 0,
        },
        capabilities: CapabilitySet::starting(),
        psyche: Psyche::default(),
        memory: MemoryLog::with_capacity(capacity),
        intel: Intel {
            genome,
            drives: Drives::default(),
            behavior: parent.intel.behavior,
            baseline_behavior: None,
            shadow_patch: None,
            logic_version: parent.intel.logic_version,
            food_preference: parent.intel.food_preference,
        },
        social,
        diet: Diet::default(),
        knowledge: KnowledgeBase::default(),
    };
    (child, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn organism(config: &AppConfig) -> Organism {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pos = Position {
            x: 0,
            y: 0,
            region: "default".into(),
        };
        create_organism_with_rng(1, pos, 0, config, &mut rng)
    }

    #[test]
    fn test_metabolism_scales_with_memory() {
        let config = AppConfig::default();
        let mut org = organism(&config);
        assert!((metabolism_cost(&org, &config) - 1.5).abs() < 1e-12);
        org.memory.capacity = 0;
        assert!((metabolism_cost(&org, &config) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_emotional_bands() {
        let config = FrustrationConfig::default();
        let mut psyche = Psyche::default();
        for _ in 0..10 {
            record_mood(
                &mut psyche,
                MoodSample {
                    energy_delta: -10.0,
                    success: false,
                },
                config.mood_window,
            );
        }
        assert_eq!(psyche.mood.len(), 10);
        let change = update_emotional_state(&mut psyche, &config);
        assert_eq!(
            change,
            Some((EmotionalState::Content, EmotionalState::Desperate))
        );

        psyche.relief = 0.5;
        update_emotional_state(&mut psyche, &config);
        assert_eq!(psyche.state, EmotionalState::Struggling);
        assert!((psyche.relief - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_failure_threshold_unlocks_same_capability() {
        let config = AppConfig::default();
        for _ in 0..3 {
            let mut org = organism(&config);
            let mut unlocked = Vec::new();
            for _ in 0..config.frustration.indigestible_threshold {
                unlocked.extend(register_failure(
                    &mut org,
                    FailureKind::Indigestible,
                    &config.frustration,
                ));
            }
            assert_eq!(unlocked, vec![Capability::Abstract]);
            assert_eq!(org.psyche.failures.get(FailureKind::Indigestible), 0);
        }
    }

    #[test]
    fn test_reproduction_transfers_fixed_cost() {
        let config = AppConfig::default();
        let mut parent = organism(&config);
        parent.vitals.energy = 90.0;
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let (child, _) = reproduce_with_rng(&mut parent, 2, 5, &config, &mut rng);
        assert!((parent.vitals.energy - 60.0).abs() < 1e-12);
        assert!((child.vitals.energy - config.metabolism.reproduction_cost).abs() < 1e-12);
        assert_eq!(child.identity.parent_id, Some(1));
        assert_eq!(child.identity.generation, 1);
        assert_eq!(child.identity.lineage_id, parent.identity.lineage_id);
        let diff = child.memory.capacity as i64 - parent.memory.capacity as i64;
        assert!(diff == 1 || diff == -1);
        assert_eq!(child.capabilities, CapabilitySet::starting());
    }

    #[test]
    fn test_zero_capacity_parent_child_is_clamped() {
        let config = AppConfig::default();
        let mut parent = organism(&config);
        parent.memory.capacity = 0;
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            parent.vitals.energy = 90.0;
            let (child, _) = reproduce_with_rng(&mut parent, 2, 0, &config, &mut rng);
            assert!(child.memory.capacity <= 1);
        }
    }
}
