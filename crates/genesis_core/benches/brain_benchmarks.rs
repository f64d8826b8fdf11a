use criterion::{black_box, criterion_group, criterion_main, Criterion};
use genesis_core::brain::BrainLogic;
use genesis_core::config::{AppConfig, BrainConfig};
use genesis_data::Genome;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Benchmark a forward pass through a founder genome.
fn bench_genome_forward(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let genome = Genome::new_random_with_rng(&BrainConfig::default(), &mut rng);
    let inputs = vec![0.5; genome.n_inputs()];

    c.bench_function("genome_forward", |b| {
        b.iter(|| {
            let result = genome.forward(black_box(&inputs));
            black_box(result)
        })
    });
}

/// Benchmark a forward pass at the widest configured topology.
fn bench_genome_forward_wide(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let config = BrainConfig::default();
    let mut genome = Genome::new_random_with_rng(&config, &mut rng);
    let _ = genome.resize_hidden(config.max_hidden);
    let inputs = vec![1.0; genome.n_inputs()];

    c.bench_function("genome_forward_wide", |b| {
        b.iter(|| {
            let result = genome.forward(black_box(&inputs));
            black_box(result)
        })
    });
}

/// Benchmark founder genome creation.
fn bench_genome_creation(c: &mut Criterion) {
    let config = BrainConfig::default();
    c.bench_function("genome_creation", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| {
            let genome = Genome::new_random_with_rng(black_box(&config), &mut rng);
            black_box(genome)
        })
    });
}

/// Benchmark mutation with structural changes enabled.
fn bench_genome_mutation(c: &mut Criterion) {
    let mut config = AppConfig::default();
    config.evolution.gene_mutation_rate = 0.2;
    config.evolution.hidden_resize_rate = 0.2;
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let base = Genome::new_random_with_rng(&config.brain, &mut rng);

    c.bench_function("genome_mutation", |b| {
        b.iter(|| {
            let mut genome = base.clone();
            let changes = genome.mutate_with_config(black_box(&config), &mut rng);
            black_box((genome, changes))
        })
    });
}

criterion_group!(
    benches,
    bench_genome_forward,
    bench_genome_forward_wide,
    bench_genome_creation,
    bench_genome_mutation
);
criterion_main!(benches);
