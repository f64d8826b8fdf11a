use super::topology::{self, least_used_actuator, least_used_sensor};
use super::InterfaceChange;
use crate::config::AppConfig;
use crate::rng::gaussian;
use genesis_data::{ActuatorGene, Genome, SensorGene};
use rand::seq::SliceRandom;
use rand::Rng;

fn perturb<R: Rng>(values: &mut [f32], rate: f32, sigma: f32, clamp: f32, rng: &mut R) {
    for v in values.iter_mut() {
        if rng.gen::<f32>() < rate {
            *v = (*v + gaussian(rng) * sigma).clamp(-clamp, clamp);
        }
    }
}

/// Reproduction-time mutation: Gaussian weight noise, then (rarely) a hidden
/// width change, then (more rarely) a gene add/remove.
pub fn mutate_with_config<R: Rng>(
    genome: &mut Genome,
    config: &AppConfig,
    rng: &mut R,
) -> Vec<InterfaceChange> {
    let evo = &config.evolution;
    let mut changes = Vec::new();

    perturb(
        &mut genome.w_in,
        evo.weight_mutation_rate,
        evo.weight_sigma,
        evo.weight_clamp,
        rng,
    );
    perturb(
        &mut genome.b_hidden,
        evo.weight_mutation_rate,
        evo.weight_sigma,
        evo.weight_clamp,
        rng,
    );
    perturb(
        &mut genome.w_out,
        evo.weight_mutation_rate,
        evo.weight_sigma,
        evo.weight_clamp,
        rng,
    );
    perturb(
        &mut genome.b_out,
        evo.weight_mutation_rate,
        evo.weight_sigma,
        evo.weight_clamp,
        rng,
    );

    if rng.gen::<f32>() < evo.hidden_resize_rate {
        let from = genome.hidden;
        let to = if rng.gen_bool(0.5) { from + 1 } else { from.saturating_sub(1) };
        let to = to.clamp(config.brain.min_hidden.max(1), config.brain.max_hidden);
        if to != from && topology::resize_hidden(genome, to).is_ok() {
            changes.push(InterfaceChange::Hidden { from, to });
        }
    }

    if rng.gen::<f32>() < evo.gene_mutation_rate {
        let grow = rng.gen_bool(0.5);
        let change = if rng.gen_bool(0.5) {
            if grow {
                let candidates: Vec<SensorGene> = SensorGene::OPTIONAL
                    .into_iter()
                    .filter(|g| !genome.sensors.contains(g))
                    .collect();
                candidates
                    .choose(rng)
                    .copied()
                    .and_then(|g| grow_sensor(genome, g, config.brain.max_sensors, rng))
            } else {
                random_optional_sensor(genome, rng).and_then(|i| {
                    topology::remove_sensor(genome, i)
                        .ok()
                        .map(|g| vec![InterfaceChange::RemovedSensor(g)])
                })
            }
        } else if grow {
            let candidates: Vec<ActuatorGene> = ActuatorGene::OPTIONAL
                .into_iter()
                .filter(|g| !genome.actuators.contains(g))
                .collect();
            candidates
                .choose(rng)
                .copied()
                .and_then(|g| grow_actuator(genome, g, config.brain.max_actuators, rng))
        } else {
            random_optional_actuator(genome, rng).and_then(|i| {
                topology::remove_actuator(genome, i)
                    .ok()
                    .map(|g| vec![InterfaceChange::RemovedActuator(g)])
            })
        };
        if let Some(c) = change {
            changes.extend(c);
        }
    }

    changes
}

fn random_optional_sensor<R: Rng>(genome: &Genome, rng: &mut R) -> Option<usize> {
    let idx: Vec<usize> = (0..genome.sensors.len())
        .filter(|&i| !genome.sensors[i].is_core())
        .collect();
    idx.choose(rng).copied()
}

fn random_optional_actuator<R: Rng>(genome: &Genome, rng: &mut R) -> Option<usize> {
    let idx: Vec<usize> = (0..genome.actuators.len())
        .filter(|&i| !genome.actuators[i].is_core())
        .collect();
    idx.choose(rng).copied()
}

/// Adds a sensor, evicting the least-used optional one first when at the cap.
pub fn grow_sensor<R: Rng>(
    genome: &mut Genome,
    gene: SensorGene,
    cap: usize,
    rng: &mut R,
) -> Option<Vec<InterfaceChange>> {
    if genome.sensors.contains(&gene) {
        return None;
    }
    let mut changes = Vec::new();
    if genome.sensors.len() >= cap {
        let victim = least_used_sensor(genome)?;
        let removed = topology::remove_sensor(genome, victim).ok()?;
        changes.push(InterfaceChange::RemovedSensor(removed));
    }
    topology::add_sensor(genome, gene, rng).ok()?;
    changes.push(InterfaceChange::AddedSensor(gene));
    Some(changes)
}

/// Adds an actuator, evicting the least-used optional one first when at the cap.
pub fn grow_actuator<R: Rng>(
    genome: &mut Genome,
    gene: ActuatorGene,
    cap: usize,
    rng: &mut R,
) -> Option<Vec<InterfaceChange>> {
    if genome.actuators.contains(&gene) {
        return None;
    }
    let mut changes = Vec::new();
    if genome.actuators.len() >= cap {
        let victim = least_used_actuator(genome)?;
        let removed = topology::remove_actuator(genome, victim).ok()?;
        changes.push(InterfaceChange::RemovedActuator(removed));
    }
    topology::add_actuator(genome, gene, rng).ok()?;
    changes.push(InterfaceChange::AddedActuator(gene));
    Some(changes)
}
