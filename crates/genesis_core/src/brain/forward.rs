use super::GenomeError;
use genesis_data::Genome;

/// Actuator magnitude above which an output counts as acted upon.
const ACTIVE_OUTPUT: f32 = 0.25;

/// One pass through the tanh hidden layer into linear outputs.
pub fn forward(genome: &Genome, inputs: &[f32]) -> Result<Vec<f32>, GenomeError> {
    let n_in = genome.n_inputs();
    if inputs.len() != n_in {
        return Err(GenomeError::InputMismatch {
            expected: n_in,
            actual: inputs.len(),
        });
    }
    super::topology::validate(genome)?;

    let h = genome.hidden;
    let n_out = genome.n_outputs();

    let mut hidden = genome.b_hidden.clone();
    for (s, x) in inputs.iter().enumerate() {
        if *x == 0.0 {
            continue;
        }
        let row = &genome.w_in[s * h..(s + 1) * h];
        for (acc, w) in hidden.iter_mut().zip(row) {
            *acc += x * w;
        }
    }
    for v in hidden.iter_mut() {
        *v = v.tanh();
    }

    let mut outputs = genome.b_out.clone();
    for (j, a) in hidden.iter().enumerate() {
        let row = &genome.w_out[j * n_out..(j + 1) * n_out];
        for (acc, w) in outputs.iter_mut().zip(row) {
            *acc += a * w;
        }
    }
    Ok(outputs)
}

/// Exponential moving average of how much each gene carries.
///
/// Sensors score by input magnitude, actuators by whether their output was
/// strong enough to matter.
pub fn record_usage(genome: &mut Genome, inputs: &[f32], outputs: &[f32], decay: f32) {
    let keep = 1.0 - decay;
    for (usage, x) in genome.sensor_usage.iter_mut().zip(inputs) {
        *usage = *usage * keep + x.abs().min(1.0) * decay;
    }
    for (usage, y) in genome.actuator_usage.iter_mut().zip(outputs) {
        let active = if y.abs() > ACTIVE_OUTPUT { 1.0 } else { 0.0 };
        *usage = *usage * keep + active * decay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::topology::create_genome_random_with_rng;
    use crate::config::BrainConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_weights_pass_biases_through() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut g = create_genome_random_with_rng(&BrainConfig::default(), &mut rng);
        g.w_in.iter_mut().for_each(|w| *w = 0.0);
        g.w_out.iter_mut().for_each(|w| *w = 0.0);
        g.b_out = (0..g.n_outputs()).map(|i| i as f32).collect();
        let out = forward(&g, &vec![1.0; g.n_inputs()]).unwrap();
        assert_eq!(out, g.b_out);
    }

    #[test]
    fn test_corrupt_genome_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut g = create_genome_random_with_rng(&BrainConfig::default(), &mut rng);
        g.w_out.pop();
        assert!(matches!(
            forward(&g, &vec![0.0; g.n_inputs()]),
            Err(GenomeError::DimensionMismatch { tensor: "w_out", .. })
        ));
    }

    #[test]
    fn test_silent_sensor_usage_decays() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut g = create_genome_random_with_rng(&BrainConfig::default(), &mut rng);
        let inputs = vec![0.0; g.n_inputs()];
        let outputs = vec![1.0; g.n_outputs()];
        let start = g.sensor_usage[0];
        for _ in 0..50 {
            record_usage(&mut g, &inputs, &outputs, 0.1);
        }
        assert!(g.sensor_usage[0] < start * 0.01);
        assert!(g.actuator_usage[0] > 0.9);
    }
}
