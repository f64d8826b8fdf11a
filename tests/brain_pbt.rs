use genesis_data::{Genome, SensorGene};
use genesis_lib::model::brain::BrainLogic;
use genesis_lib::model::config::{AppConfig, BrainConfig, EnvironmentConfig};
use genesis_lib::model::environment::PatchGrid;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn genome_from_seed(seed: u64) -> Genome {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Genome::new_random_with_rng(&BrainConfig::default(), &mut rng)
}

#[derive(Debug, Clone)]
enum GridOp {
    Regrow(u64),
    Deplete { x: u16, y: u16, amount: f64 },
    Set { x: u16, y: u16, stock: f64 },
}

fn grid_op() -> impl Strategy<Value = GridOp> {
    prop_oneof![
        any::<u64>().prop_map(GridOp::Regrow),
        (0u16..4, 0u16..4, -50.0f64..500.0)
            .prop_map(|(x, y, amount)| GridOp::Deplete { x, y, amount }),
        (0u16..4, 0u16..4, -50.0f64..500.0).prop_map(|(x, y, stock)| GridOp::Set { x, y, stock }),
    ]
}

proptest! {
    #[test]
    fn test_forward_yields_one_value_per_actuator(
        seed in any::<u64>(),
        raw in prop::collection::vec(-10.0f32..10.0, 32),
    ) {
        let genome = genome_from_seed(seed);
        let inputs = &raw[..genome.n_inputs()];
        let outputs = genome.forward(inputs).unwrap();
        prop_assert_eq!(outputs.len(), genome.n_outputs());
        prop_assert!(outputs.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_forward_rejects_wrong_input_width(seed in any::<u64>(), extra in 1usize..4) {
        let genome = genome_from_seed(seed);
        let inputs = vec![0.5; genome.n_inputs() + extra];
        prop_assert!(genome.forward(&inputs).is_err());
    }

    #[test]
    fn test_removing_a_sensor_keeps_other_rows(seed in any::<u64>()) {
        let mut genome = genome_from_seed(seed);
        let before = genome.clone();
        let h = genome.hidden;
        let idx = genome
            .sensors
            .iter()
            .position(|g| !g.is_core())
            .unwrap();

        genome.remove_sensor(idx).unwrap();

        let kept: Vec<f32> = before
            .w_in
            .chunks(h)
            .enumerate()
            .filter(|(s, _)| *s != idx)
            .flat_map(|(_, row)| row.iter().copied())
            .collect();
        prop_assert_eq!(&genome.w_in, &kept);
        prop_assert_eq!(&genome.w_out, &before.w_out);
        prop_assert_eq!(&genome.b_hidden, &before.b_hidden);
        prop_assert!(genome.validate().is_ok());
    }

    #[test]
    fn test_add_then_remove_sensor_is_lossless(seed in any::<u64>()) {
        let mut genome = genome_from_seed(seed);
        let before = genome.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xA5A5);

        genome.add_sensor(SensorGene::TrustLevel, &mut rng).unwrap();
        prop_assert_eq!(genome.n_inputs(), before.n_inputs() + 1);
        let idx = genome.sensors.len() - 1;
        genome.remove_sensor(idx).unwrap();

        prop_assert_eq!(&genome.sensors, &before.sensors);
        prop_assert_eq!(&genome.w_in, &before.w_in);
    }

    #[test]
    fn test_widening_hidden_keeps_overlap(seed in any::<u64>(), grow in 1usize..6) {
        let mut genome = genome_from_seed(seed);
        let before = genome.clone();
        let h = before.hidden;
        let width = h + grow;

        genome.resize_hidden(width).unwrap();

        for s in 0..before.n_inputs() {
            for j in 0..h {
                prop_assert_eq!(genome.w_in[s * width + j], before.w_in[s * h + j]);
            }
        }
        for j in 0..h {
            prop_assert_eq!(genome.b_hidden[j], before.b_hidden[j]);
        }
        prop_assert!(genome.validate().is_ok());
    }

    #[test]
    fn test_mutation_leaves_a_valid_genome(seed in any::<u64>(), rounds in 1usize..20) {
        let config = AppConfig::default();
        let mut genome = genome_from_seed(seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
        for _ in 0..rounds {
            genome.mutate_with_config(&config, &mut rng);
        }
        prop_assert!(genome.validate().is_ok());
        prop_assert!(genome.hidden >= config.brain.min_hidden);
        prop_assert!(genome.hidden <= config.brain.max_hidden);
    }

    #[test]
    fn test_stock_stays_within_capacity(ops in prop::collection::vec(grid_op(), 1..60)) {
        let config = EnvironmentConfig::default();
        let mut grid = PatchGrid::new(&config, 4, 4);
        for op in ops {
            match op {
                GridOp::Regrow(seed) => grid.regrow(&mut ChaCha8Rng::seed_from_u64(seed)),
                GridOp::Deplete { x, y, amount } => {
                    let before = grid.stock(x, y);
                    let taken = grid.deplete(x, y, amount);
                    prop_assert!(taken >= 0.0 && taken <= before);
                }
                GridOp::Set { x, y, stock } => grid.set_stock(x, y, stock),
            }
            for y in 0..4 {
                for x in 0..4 {
                    let k = grid.params_at(x, y).capacity;
                    let s = grid.stock(x, y);
                    prop_assert!((0.0..=k).contains(&s), "stock {} outside [0, {}]", s, k);
                }
            }
        }
    }
}
