//! # Genesis Core
//!
//! Deterministic engine behind the Genesis digital-organism simulation.
//!
//! This crate contains:
//! - Evolvable feed-forward controllers with growable sensor/actuator genes
//! - The patch grid with logistic regrowth and named regions
//! - Capability unlock ladders driven by frustration counters
//! - Feed digestion shaped by scarcity, diet and expertise
//! - Parents feeding their dependent young
//! - Teaching, trade leads and trust, planned against a tick snapshot
//! - Parent advice under a call budget, with local fallbacks
//! - Capability-gated self-modification judged by shadow trials
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use genesis_core::brain::BrainLogic;
//! use genesis_core::config::BrainConfig;
//! use genesis_data::Genome;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let genome = Genome::new_random_with_rng(&BrainConfig::default(), &mut rng);
//!
//! let inputs = vec![0.5; genome.n_inputs()];
//! let outputs = genome.forward(&inputs).unwrap();
//! assert_eq!(outputs.len(), genome.n_outputs());
//! ```

/// Parent advisory economy, caching and fallbacks
pub mod advisory;
/// Shared lead board for trade
pub mod board;
/// Evolvable controller: forward pass, mutation, topology
pub mod brain;
/// Capability ladders and behavior adjustments
pub mod capability;
/// Configuration management for simulation parameters
pub mod config;
/// External food supply seam
pub mod data_source;
/// Patch grid, regrowth and regions
pub mod environment;
/// Low-noise event feed
pub mod history;
/// Deferred peer effects and trust bookkeeping
pub mod interaction;
/// Organism creation, metabolism, frustration and reproduction
pub mod lifecycle;
/// Performance metrics collection and logging
pub mod metrics;
/// Feed digestion, diet and knowledge
pub mod nutrition;
/// Seed derivation for reproducible runs
pub mod rng;
/// Shadow patches, sandbox and lineage logic versions
pub mod self_modify;
/// Organism snapshots for parallel processing
pub mod snapshot;
/// Per-tick systems (perception, foraging, biology, social, guidance)
pub mod systems;

pub use brain::BrainLogic;
pub use metrics::{init_logging, Metrics};
