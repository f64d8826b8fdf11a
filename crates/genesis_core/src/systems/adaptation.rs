//! Periodic growth and pruning of the sensor/actuator interface.

use super::perception::success_rate;
use super::stream;
use crate::brain::mutation::{grow_actuator, grow_sensor};
use crate::brain::topology::least_used_sensor;
use crate::brain::{BrainLogic, InterfaceChange};
use crate::config::BrainConfig;
use crate::rng::organism_rng;
use genesis_data::{
    ActuatorGene, Capability, EventTag, FailureKind, Organism, SensorGene, SimEvent,
};
use rand::Rng;

/// Sensors worth growing after a run of `kind` failures, preferred first.
#[must_use]
pub fn sensors_for_failure(kind: Option<FailureKind>) -> &'static [SensorGene] {
    match kind {
        Some(FailureKind::EmptyForage) | None => {
            &[SensorGene::LeadAvailability, SensorGene::NoveltyHunger]
        }
        Some(FailureKind::Indigestible) => &[
            SensorGene::StructuredAvailability,
            SensorGene::CodeAvailability,
        ],
        Some(FailureKind::Isolation) => &[SensorGene::TrustLevel, SensorGene::ImitationPull],
        Some(FailureKind::Stagnation) => &[SensorGene::RecentSuccess, SensorGene::NoveltyHunger],
    }
}

const CAPABILITY_ACTUATORS: [(Capability, ActuatorGene); 6] = [
    (Capability::Teach, ActuatorGene::Teach),
    (Capability::Share, ActuatorGene::Teach),
    (Capability::Trade, ActuatorGene::Trade),
    (Capability::Signal, ActuatorGene::Trade),
    (Capability::Receive, ActuatorGene::Social),
    (Capability::Abstract, ActuatorGene::PreferStructured),
];

fn apply<R: Rng>(
    organism: &mut Organism,
    config: &BrainConfig,
    rng: &mut R,
) -> Vec<InterfaceChange> {
    let mut changes = Vec::new();
    let struggling = success_rate(organism) < config.low_success_threshold;
    let genome = &mut organism.intel.genome;

    if struggling {
        let wanted = sensors_for_failure(organism.psyche.last_failure)
            .iter()
            .copied()
            .find(|g| !genome.sensors.contains(g));
        if let Some(gene) = wanted {
            if let Some(c) = grow_sensor(genome, gene, config.max_sensors, rng) {
                changes.extend(c);
            }
        }
    }

    for (capability, gene) in CAPABILITY_ACTUATORS {
        if organism.capabilities.contains(capability) && !genome.actuators.contains(&gene) {
            if let Some(c) = grow_actuator(genome, gene, config.max_actuators, rng) {
                changes.extend(c);
            }
        }
    }

    if changes.is_empty() {
        if let Some(idx) = least_used_sensor(genome) {
            if genome.sensor_usage[idx] < config.prune_threshold {
                if let Ok(gene) = genome.remove_sensor(idx) {
                    changes.push(InterfaceChange::RemovedSensor(gene));
                }
            }
        }
    }
    changes
}

/// Runs every `adapt_interval` ticks of age. Returns one `Interface` event
/// when anything changed.
pub fn adapt_interface(
    organism: &mut Organism,
    config: &BrainConfig,
    tick: u64,
    tick_seed: u64,
) -> Option<SimEvent> {
    let age = organism.vitals.age;
    if config.adapt_interval == 0 || age == 0 || age % config.adapt_interval != 0 {
        return None;
    }
    let mut rng = organism_rng(tick_seed, organism.id(), stream::ADAPT);
    let changes = apply(organism, config, &mut rng);
    if changes.is_empty() {
        return None;
    }
    let id = organism.id();
    let summary: Vec<String> = changes.iter().map(InterfaceChange::describe).collect();
    Some(SimEvent::new(
        tick,
        EventTag::Interface,
        vec![id],
        format!("#{id} {}", summary.join(", ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::lifecycle::create_organism_with_rng;
    use genesis_data::{MoodSample, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn organism(config: &AppConfig) -> Organism {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let pos = Position {
            x: 0,
            y: 0,
            region: "default".into(),
        };
        create_organism_with_rng(1, pos, 0, config, &mut rng)
    }

    #[test]
    fn test_only_on_interval() {
        let config = AppConfig::default();
        let mut org = organism(&config);
        org.vitals.age = config.brain.adapt_interval - 1;
        assert!(adapt_interface(&mut org, &config.brain, 1, 5).is_none());
    }

    #[test]
    fn test_failure_grows_matching_sensor() {
        let config = AppConfig::default();
        let mut org = organism(&config);
        org.vitals.age = config.brain.adapt_interval;
        org.psyche.last_failure = Some(FailureKind::Isolation);
        org.psyche.mood.push_back(MoodSample {
            energy_delta: -1.0,
            success: false,
        });
        let event = adapt_interface(&mut org, &config.brain, 1, 5).unwrap();
        assert_eq!(event.tag, EventTag::Interface);
        assert!(org.intel.genome.sensors.contains(&SensorGene::TrustLevel));
        assert!(org.intel.genome.validate().is_ok());
    }

    #[test]
    fn test_capability_grows_actuator() {
        let config = AppConfig::default();
        let mut org = organism(&config);
        org.vitals.age = config.brain.adapt_interval;
        org.psyche.mood.push_back(MoodSample {
            energy_delta: 1.0,
            success: true,
        });
        org.capabilities.unlock(Capability::Receive);
        adapt_interface(&mut org, &config.brain, 1, 5).unwrap();
        assert!(org.intel.genome.actuators.contains(&ActuatorGene::Social));
    }

    #[test]
    fn test_unused_sensor_is_pruned() {
        let config = AppConfig::default();
        let mut org = organism(&config);
        org.vitals.age = config.brain.adapt_interval;
        org.psyche.mood.push_back(MoodSample {
            energy_delta: 1.0,
            success: true,
        });
        let idx = org
            .intel
            .genome
            .sensor_index(SensorGene::Competition)
            .unwrap();
        org.intel.genome.sensor_usage[idx] = 0.0;
        adapt_interface(&mut org, &config.brain, 1, 5).unwrap();
        assert!(!org.intel.genome.sensors.contains(&SensorGene::Competition));
        assert!(org.intel.genome.sensors.contains(&SensorGene::Energy));
    }
}
