use genesis_data::{ActuatorGene, Drives, Genome};

/// Maps a raw output into `[0, 1]` around a neutral 0.5.
#[must_use]
pub fn squash(x: f32) -> f32 {
    (0.5 + x / 4.0).clamp(0.0, 1.0)
}

/// Names raw actuator outputs. Actuators missing from the genome leave their
/// drive at zero.
#[must_use]
pub fn drives_from_outputs(genome: &Genome, outputs: &[f32]) -> Drives {
    let mut drives = Drives::default();
    for (gene, raw) in genome.actuators.iter().zip(outputs) {
        let v = squash(*raw);
        match gene {
            ActuatorGene::Explore => drives.explore = v,
            ActuatorGene::Conserve => drives.conserve = v,
            ActuatorGene::Risk => drives.risk = v,
            ActuatorGene::Migrate => drives.migrate = v,
            ActuatorGene::Teach => drives.teach = v,
            ActuatorGene::Trade => drives.trade = v,
            ActuatorGene::PreferStructured => drives.prefer_structured = v,
            ActuatorGene::Social => drives.social = v,
        }
    }
    drives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash_bounds() {
        assert_eq!(squash(0.0), 0.5);
        assert_eq!(squash(10.0), 1.0);
        assert_eq!(squash(-10.0), 0.0);
    }

    #[test]
    fn test_missing_actuator_is_zero() {
        let genome = Genome {
            sensors: vec![],
            actuators: vec![ActuatorGene::Explore, ActuatorGene::Teach],
            hidden: 1,
            w_in: vec![],
            b_hidden: vec![0.0],
            w_out: vec![0.0, 0.0],
            b_out: vec![0.0, 0.0],
            sensor_usage: vec![],
            actuator_usage: vec![0.0, 0.0],
        };
        let drives = drives_from_outputs(&genome, &[0.0, 2.0]);
        assert_eq!(drives.explore, 0.5);
        assert_eq!(drives.teach, 1.0);
        assert_eq!(drives.trade, 0.0);
    }
}
