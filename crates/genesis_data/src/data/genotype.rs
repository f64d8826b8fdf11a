use serde::{Deserialize, Serialize};

/// An input channel of the brain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorGene {
    Energy,
    Frustration,
    MemoryLoad,
    Scarcity,
    Age,
    CapabilityDensity,
    RecentSuccess,
    Competition,
    StructuredAvailability,
    CodeAvailability,
    NoveltyHunger,
    LeadAvailability,
    ImitationPull,
    TrustLevel,
}

impl SensorGene {
    /// Never pruned by interface adaptation.
    pub const CORE: [SensorGene; 6] = [
        SensorGene::Energy,
        SensorGene::Frustration,
        SensorGene::MemoryLoad,
        SensorGene::Scarcity,
        SensorGene::Age,
        SensorGene::CapabilityDensity,
    ];

    pub const OPTIONAL: [SensorGene; 8] = [
        SensorGene::RecentSuccess,
        SensorGene::Competition,
        SensorGene::StructuredAvailability,
        SensorGene::CodeAvailability,
        SensorGene::NoveltyHunger,
        SensorGene::LeadAvailability,
        SensorGene::ImitationPull,
        SensorGene::TrustLevel,
    ];

    #[must_use]
    pub fn is_core(self) -> bool {
        Self::CORE.contains(&self)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SensorGene::Energy => "energy",
            SensorGene::Frustration => "frustration",
            SensorGene::MemoryLoad => "memory_load",
            SensorGene::Scarcity => "scarcity",
            SensorGene::Age => "age",
            SensorGene::CapabilityDensity => "capability_density",
            SensorGene::RecentSuccess => "recent_success",
            SensorGene::Competition => "competition",
            SensorGene::StructuredAvailability => "structured_availability",
            SensorGene::CodeAvailability => "code_availability",
            SensorGene::NoveltyHunger => "novelty_hunger",
            SensorGene::LeadAvailability => "lead_availability",
            SensorGene::ImitationPull => "imitation_pull",
            SensorGene::TrustLevel => "trust_level",
        }
    }
}

/// An output channel of the brain. Each one feeds a named drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorGene {
    Explore,
    Conserve,
    Risk,
    Migrate,
    Teach,
    Trade,
    PreferStructured,
    Social,
}

impl ActuatorGene {
    /// Never pruned by interface adaptation.
    pub const CORE: [ActuatorGene; 3] =
        [ActuatorGene::Explore, ActuatorGene::Conserve, ActuatorGene::Risk];

    pub const OPTIONAL: [ActuatorGene; 5] = [
        ActuatorGene::Migrate,
        ActuatorGene::Teach,
        ActuatorGene::Trade,
        ActuatorGene::PreferStructured,
        ActuatorGene::Social,
    ];

    #[must_use]
    pub fn is_core(self) -> bool {
        Self::CORE.contains(&self)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ActuatorGene::Explore => "explore",
            ActuatorGene::Conserve => "conserve",
            ActuatorGene::Risk => "risk",
            ActuatorGene::Migrate => "migrate",
            ActuatorGene::Teach => "teach",
            ActuatorGene::Trade => "trade",
            ActuatorGene::PreferStructured => "prefer_structured",
            ActuatorGene::Social => "social",
        }
    }
}

/// Evolvable feed-forward controller: gene lists plus parameters sized to them.
///
/// Layout is row-major by source: `w_in[s * hidden + h]` connects sensor `s`
/// to hidden unit `h`, `w_out[h * actuators + a]` connects hidden unit `h` to
/// actuator `a`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Input genes, in input order.
    pub sensors: Vec<SensorGene>,
    /// Output genes, in output order.
    pub actuators: Vec<ActuatorGene>,
    /// Hidden layer width.
    pub hidden: usize,
    /// Sensor to hidden weights.
    pub w_in: Vec<f32>,
    /// Hidden biases.
    pub b_hidden: Vec<f32>,
    /// Hidden to actuator weights.
    pub w_out: Vec<f32>,
    /// Actuator biases.
    pub b_out: Vec<f32>,
    /// Running utilization per sensor, aligned with `sensors`.
    #[serde(default)]
    pub sensor_usage: Vec<f32>,
    /// Running utilization per actuator, aligned with `actuators`.
    #[serde(default)]
    pub actuator_usage: Vec<f32>,
}

impl Genome {
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.sensors.len()
    }

    #[must_use]
    pub fn n_outputs(&self) -> usize {
        self.actuators.len()
    }

    #[must_use]
    pub fn sensor_index(&self, gene: SensorGene) -> Option<usize> {
        self.sensors.iter().position(|g| *g == gene)
    }

    #[must_use]
    pub fn actuator_index(&self, gene: ActuatorGene) -> Option<usize> {
        self.actuators.iter().position(|g| *g == gene)
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.w_in.len() + self.b_hidden.len() + self.w_out.len() + self.b_out.len()
    }
}
