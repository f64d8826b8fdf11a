use super::GenomeError;
use crate::config::BrainConfig;
use genesis_data::{ActuatorGene, Genome, SensorGene};
use rand::Rng;

/// Optional genes every founder starts with, on top of the core ones.
const FOUNDER_SENSORS: [SensorGene; 2] = [SensorGene::RecentSuccess, SensorGene::Competition];
const FOUNDER_ACTUATORS: [ActuatorGene; 3] =
    [ActuatorGene::Migrate, ActuatorGene::Teach, ActuatorGene::Trade];

const INIT_SPAN: f32 = 0.5;
const BIAS_SPAN: f32 = 0.1;
const NEW_GENE_SPAN: f32 = 0.1;
/// Utilization a freshly added gene starts with, so it survives a few checks.
const NEW_GENE_USAGE: f32 = 0.5;

pub fn create_genome_random_with_rng<R: Rng>(config: &BrainConfig, rng: &mut R) -> Genome {
    let mut sensors: Vec<SensorGene> = SensorGene::CORE.to_vec();
    for gene in FOUNDER_SENSORS {
        if sensors.len() < config.max_sensors {
            sensors.push(gene);
        }
    }
    let mut actuators: Vec<ActuatorGene> = ActuatorGene::CORE.to_vec();
    for gene in FOUNDER_ACTUATORS {
        if actuators.len() < config.max_actuators {
            actuators.push(gene);
        }
    }
    let hidden = config.initial_hidden.max(1);

    let w_in = (0..sensors.len() * hidden)
        .map(|_| rng.gen_range(-INIT_SPAN..INIT_SPAN))
        .collect();
    let b_hidden = (0..hidden)
        .map(|_| rng.gen_range(-BIAS_SPAN..BIAS_SPAN))
        .collect();
    let w_out = (0..hidden * actuators.len())
        .map(|_| rng.gen_range(-INIT_SPAN..INIT_SPAN))
        .collect();
    let b_out = (0..actuators.len())
        .map(|_| rng.gen_range(-BIAS_SPAN..BIAS_SPAN))
        .collect();

    Genome {
        sensor_usage: vec![NEW_GENE_USAGE; sensors.len()],
        actuator_usage: vec![NEW_GENE_USAGE; actuators.len()],
        sensors,
        actuators,
        hidden,
        w_in,
        b_hidden,
        w_out,
        b_out,
    }
}

fn check_len(tensor: &'static str, values: &[f32], expected: usize) -> Result<(), GenomeError> {
    if values.len() != expected {
        return Err(GenomeError::DimensionMismatch {
            tensor,
            expected,
            actual: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(GenomeError::NonFinite(tensor));
    }
    Ok(())
}

pub fn validate(genome: &Genome) -> Result<(), GenomeError> {
    if genome.hidden == 0 {
        return Err(GenomeError::EmptyHidden);
    }
    let (n_in, n_out, h) = (genome.n_inputs(), genome.n_outputs(), genome.hidden);
    check_len("w_in", &genome.w_in, n_in * h)?;
    check_len("b_hidden", &genome.b_hidden, h)?;
    check_len("w_out", &genome.w_out, h * n_out)?;
    check_len("b_out", &genome.b_out, n_out)?;
    check_len("sensor_usage", &genome.sensor_usage, n_in)?;
    check_len("actuator_usage", &genome.actuator_usage, n_out)?;
    Ok(())
}

/// Rebuilds a row-major matrix for a new shape.
///
/// `row_map[r]` / `col_map[c]` name the source row/column a destination cell
/// is copied from; `None` cells are produced by `fill`. Retained cells are
/// copied bit for bit.
pub fn remap_matrix<F: FnMut() -> f32>(
    src: &[f32],
    src_cols: usize,
    row_map: &[Option<usize>],
    col_map: &[Option<usize>],
    mut fill: F,
) -> Vec<f32> {
    let mut out = Vec::with_capacity(row_map.len() * col_map.len());
    for r in row_map {
        for c in col_map {
            match (r, c) {
                (Some(r), Some(c)) => out.push(src[r * src_cols + c]),
                _ => out.push(fill()),
            }
        }
    }
    out
}

fn identity_map(len: usize) -> Vec<Option<usize>> {
    (0..len).map(Some).collect()
}

fn without(len: usize, removed: usize) -> Vec<Option<usize>> {
    (0..len).filter(|&i| i != removed).map(Some).collect()
}

fn with_appended(len: usize) -> Vec<Option<usize>> {
    let mut map = identity_map(len);
    map.push(None);
    map
}

/// Changes the hidden width. Overlapping slices are kept, new units start at zero.
pub fn resize_hidden(genome: &mut Genome, width: usize) -> Result<(), GenomeError> {
    if width == 0 {
        return Err(GenomeError::EmptyHidden);
    }
    let old = genome.hidden;
    let col_map: Vec<Option<usize>> = (0..width).map(|h| (h < old).then_some(h)).collect();
    genome.w_in = remap_matrix(
        &genome.w_in,
        old,
        &identity_map(genome.n_inputs()),
        &col_map,
        || 0.0,
    );
    genome.w_out = remap_matrix(
        &genome.w_out,
        genome.n_outputs(),
        &col_map,
        &identity_map(genome.n_outputs()),
        || 0.0,
    );
    genome.b_hidden.resize(width, 0.0);
    genome.hidden = width;
    Ok(())
}

pub fn add_sensor<R: Rng>(
    genome: &mut Genome,
    gene: SensorGene,
    rng: &mut R,
) -> Result<(), GenomeError> {
    if genome.sensors.contains(&gene) {
        return Err(GenomeError::DuplicateGene(gene.label()));
    }
    let n_in = genome.n_inputs();
    genome.w_in = remap_matrix(
        &genome.w_in,
        genome.hidden,
        &with_appended(n_in),
        &identity_map(genome.hidden),
        || rng.gen_range(-NEW_GENE_SPAN..NEW_GENE_SPAN),
    );
    genome.sensors.push(gene);
    genome.sensor_usage.push(NEW_GENE_USAGE);
    Ok(())
}

pub fn remove_sensor(genome: &mut Genome, index: usize) -> Result<SensorGene, GenomeError> {
    let gene = *genome
        .sensors
        .get(index)
        .ok_or(GenomeError::OutOfRange(index))?;
    if gene.is_core() {
        return Err(GenomeError::CoreGene(gene.label()));
    }
    genome.w_in = remap_matrix(
        &genome.w_in,
        genome.hidden,
        &without(genome.n_inputs(), index),
        &identity_map(genome.hidden),
        || 0.0,
    );
    genome.sensors.remove(index);
    genome.sensor_usage.remove(index);
    Ok(gene)
}

pub fn add_actuator<R: Rng>(
    genome: &mut Genome,
    gene: ActuatorGene,
    rng: &mut R,
) -> Result<(), GenomeError> {
    if genome.actuators.contains(&gene) {
        return Err(GenomeError::DuplicateGene(gene.label()));
    }
    let n_out = genome.n_outputs();
    genome.w_out = remap_matrix(
        &genome.w_out,
        n_out,
        &identity_map(genome.hidden),
        &with_appended(n_out),
        || rng.gen_range(-NEW_GENE_SPAN..NEW_GENE_SPAN),
    );
    genome.b_out.push(0.0);
    genome.actuators.push(gene);
    genome.actuator_usage.push(NEW_GENE_USAGE);
    Ok(())
}

pub fn remove_actuator(genome: &mut Genome, index: usize) -> Result<ActuatorGene, GenomeError> {
    let gene = *genome
        .actuators
        .get(index)
        .ok_or(GenomeError::OutOfRange(index))?;
    if gene.is_core() {
        return Err(GenomeError::CoreGene(gene.label()));
    }
    let n_out = genome.n_outputs();
    genome.w_out = remap_matrix(
        &genome.w_out,
        n_out,
        &identity_map(genome.hidden),
        &without(n_out, index),
        || 0.0,
    );
    genome.b_out.remove(index);
    genome.actuators.remove(index);
    genome.actuator_usage.remove(index);
    Ok(gene)
}

/// Index of the least-utilized removable sensor.
#[must_use]
pub fn least_used_sensor(genome: &Genome) -> Option<usize> {
    genome
        .sensors
        .iter()
        .zip(&genome.sensor_usage)
        .enumerate()
        .filter(|(_, (g, _))| !g.is_core())
        .min_by(|(_, (_, a)), (_, (_, b))| a.total_cmp(b))
        .map(|(i, _)| i)
}

/// Index of the least-utilized removable actuator.
#[must_use]
pub fn least_used_actuator(genome: &Genome) -> Option<usize> {
    genome
        .actuators
        .iter()
        .zip(&genome.actuator_usage)
        .enumerate()
        .filter(|(_, (g, _))| !g.is_core())
        .min_by(|(_, (_, a)), (_, (_, b))| a.total_cmp(b))
        .map(|(i, _)| i)
}
