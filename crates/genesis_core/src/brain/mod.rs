pub mod drives;
pub mod forward;
pub mod mutation;
pub mod topology;

pub use drives::drives_from_outputs;
pub use genesis_data::{ActuatorGene, Genome, SensorGene};
use rand::Rng;
use thiserror::Error;

pub use topology::create_genome_random_with_rng;

/// Structural problems with a genome. Any of these terminates the organism.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenomeError {
    #[error("{tensor} has {actual} values, expected {expected}")]
    DimensionMismatch {
        tensor: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("input vector has {actual} values, genome has {expected} sensors")]
    InputMismatch { expected: usize, actual: usize },
    #[error("hidden width must be at least 1")]
    EmptyHidden,
    #[error("gene `{0}` is already present")]
    DuplicateGene(&'static str),
    #[error("gene `{0}` is core and cannot be removed")]
    CoreGene(&'static str),
    #[error("gene index {0} out of range")]
    OutOfRange(usize),
    #[error("non-finite parameter in {0}")]
    NonFinite(&'static str),
}

/// One structural change applied to a genome, reported for the event feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceChange {
    AddedSensor(SensorGene),
    RemovedSensor(SensorGene),
    AddedActuator(ActuatorGene),
    RemovedActuator(ActuatorGene),
    Hidden { from: usize, to: usize },
}

impl InterfaceChange {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            InterfaceChange::AddedSensor(g) => format!("+sensor {}", g.label()),
            InterfaceChange::RemovedSensor(g) => format!("-sensor {}", g.label()),
            InterfaceChange::AddedActuator(g) => format!("+actuator {}", g.label()),
            InterfaceChange::RemovedActuator(g) => format!("-actuator {}", g.label()),
            InterfaceChange::Hidden { from, to } => format!("hidden {from}->{to}"),
        }
    }
}

/// Core logic of the evolvable controller.
pub trait BrainLogic {
    fn new_random_with_rng<R: Rng>(config: &crate::config::BrainConfig, rng: &mut R) -> Self;

    /// Pure map from sensor values to raw actuator values.
    fn forward(&self, inputs: &[f32]) -> Result<Vec<f32>, GenomeError>;

    /// Checks that every tensor matches the gene lists.
    fn validate(&self) -> Result<(), GenomeError>;

    fn mutate_with_config<R: Rng>(
        &mut self,
        config: &crate::config::AppConfig,
        rng: &mut R,
    ) -> Vec<InterfaceChange>;

    fn resize_hidden(&mut self, width: usize) -> Result<(), GenomeError>;
    fn add_sensor<R: Rng>(&mut self, gene: SensorGene, rng: &mut R) -> Result<(), GenomeError>;
    fn remove_sensor(&mut self, index: usize) -> Result<SensorGene, GenomeError>;
    fn add_actuator<R: Rng>(&mut self, gene: ActuatorGene, rng: &mut R)
        -> Result<(), GenomeError>;
    fn remove_actuator(&mut self, index: usize) -> Result<ActuatorGene, GenomeError>;

    /// Folds one forward pass into the running utilization of each gene.
    fn record_usage(&mut self, inputs: &[f32], outputs: &[f32], decay: f32);
}

impl BrainLogic for Genome {
    fn new_random_with_rng<R: Rng>(config: &crate::config::BrainConfig, rng: &mut R) -> Self {
        topology::create_genome_random_with_rng(config, rng)
    }

    fn forward(&self, inputs: &[f32]) -> Result<Vec<f32>, GenomeError> {
        forward::forward(self, inputs)
    }

    fn validate(&self) -> Result<(), GenomeError> {
        topology::validate(self)
    }

    fn mutate_with_config<R: Rng>(
        &mut self,
        config: &crate::config::AppConfig,
        rng: &mut R,
    ) -> Vec<InterfaceChange> {
        mutation::mutate_with_config(self, config, rng)
    }

    fn resize_hidden(&mut self, width: usize) -> Result<(), GenomeError> {
        topology::resize_hidden(self, width)
    }

    fn add_sensor<R: Rng>(&mut self, gene: SensorGene, rng: &mut R) -> Result<(), GenomeError> {
        topology::add_sensor(self, gene, rng)
    }

    fn remove_sensor(&mut self, index: usize) -> Result<SensorGene, GenomeError> {
        topology::remove_sensor(self, index)
    }

    fn add_actuator<R: Rng>(
        &mut self,
        gene: ActuatorGene,
        rng: &mut R,
    ) -> Result<(), GenomeError> {
        topology::add_actuator(self, gene, rng)
    }

    fn remove_actuator(&mut self, index: usize) -> Result<ActuatorGene, GenomeError> {
        topology::remove_actuator(self, index)
    }

    fn record_usage(&mut self, inputs: &[f32], outputs: &[f32], decay: f32) {
        forward::record_usage(self, inputs, outputs, decay)
    }
}
