//! Configuration management for simulation parameters.
//!
//! Strongly-typed, sectioned structures that map onto a `config.toml` file.
//! Every section falls back to its defaults when omitted, and the whole
//! configuration is immutable for the duration of a run. The single runtime
//! exception is region regrowth modulation, see
//! [`crate::environment::PatchGrid::modulate_region`].
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! width = 32
//! height = 16
//! initial_population = 24
//! seed = 42
//! deterministic = true
//!
//! [environment]
//! capacity = 100.0
//! regrowth_rate = 0.1
//!
//! [[environment.regions]]
//! name = "archive"
//! x0 = 0
//! y0 = 0
//! x1 = 8
//! y1 = 8
//! regrowth_rate = 0.05
//! preferred_data = "code"
//!
//! [frustration]
//! empty_forage_threshold = 8
//! ```

use genesis_data::{DataType, FailureKind};
use serde::{Deserialize, Serialize};

/// World-level configuration: grid dimensions, founders and seeding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u16,
    pub height: u16,
    pub initial_population: usize,
    pub seed: Option<u64>,
    /// Reseed every tick from `seed`, making runs reproducible.
    pub deterministic: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 24,
            height: 16,
            initial_population: 20,
            seed: None,
            deterministic: false,
        }
    }
}

/// A named rectangular zone overriding patch parameters.
///
/// The rectangle is half-open: `x0 <= x < x1`, `y0 <= y < y1`. The first
/// matching region wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RegionOverride {
    pub name: String,
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    #[serde(default)]
    pub capacity: Option<f64>,
    #[serde(default)]
    pub regrowth_rate: Option<f64>,
    #[serde(default)]
    pub noise: Option<f64>,
    /// Data type the region's feeds lean toward.
    #[serde(default)]
    pub preferred_data: Option<DataType>,
}

impl RegionOverride {
    #[must_use]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Resource patch dynamics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Default capacity K.
    pub capacity: f64,
    /// Default logistic regrowth rate r.
    pub regrowth_rate: f64,
    /// Default noise magnitude; per-tick noise is uniform in `[-noise, noise]`.
    pub noise: f64,
    /// Starting stock as a fraction of K.
    pub initial_stock_fraction: f64,
    /// Requested bite per eating action.
    pub bite: f64,
    /// Chebyshev radius scanned by greedy foraging.
    pub sense_radius: u16,
    pub regions: Vec<RegionOverride>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            capacity: 100.0,
            regrowth_rate: 0.1,
            noise: 0.5,
            initial_stock_fraction: 0.5,
            bite: 10.0,
            sense_radius: 2,
            regions: Vec::new(),
        }
    }
}

/// Energy economy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MetabolismConfig {
    pub base_cost: f64,
    /// Added per unit of memory capacity.
    pub memory_cost: f64,
    pub initial_energy: f64,
    pub initial_memory_capacity: usize,
    pub reproduction_threshold: f64,
    /// Energy moved from parent to child at birth.
    pub reproduction_cost: f64,
    pub migrate_cost: f64,
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            base_cost: 1.0,
            memory_cost: 0.1,
            initial_energy: 40.0,
            initial_memory_capacity: 5,
            reproduction_threshold: 80.0,
            reproduction_cost: 30.0,
            migrate_cost: 2.0,
        }
    }
}

/// Brain topology bounds and interface adaptation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BrainConfig {
    pub initial_hidden: usize,
    pub min_hidden: usize,
    pub max_hidden: usize,
    /// Hard cap on sensor genes.
    pub max_sensors: usize,
    /// Hard cap on actuator genes.
    pub max_actuators: usize,
    /// Ticks between interface adaptation checks.
    pub adapt_interval: u64,
    /// Exponential decay used for gene utilization.
    pub usage_decay: f32,
    /// Utilization under which an optional gene counts as unused.
    pub prune_threshold: f32,
    /// Success rate under which a scarcity sensor is requested.
    pub low_success_threshold: f32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            initial_hidden: 6,
            min_hidden: 1,
            max_hidden: 16,
            max_sensors: 10,
            max_actuators: 7,
            adapt_interval: 25,
            usage_decay: 0.05,
            prune_threshold: 0.01,
            low_success_threshold: 0.2,
        }
    }
}

/// Genome mutation rates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Per-parameter probability of Gaussian perturbation.
    pub weight_mutation_rate: f32,
    pub weight_sigma: f32,
    pub weight_clamp: f32,
    /// Probability of a ±1 hidden-width change per mutation.
    pub hidden_resize_rate: f32,
    /// Probability of a sensor/actuator gene add or remove per mutation.
    pub gene_mutation_rate: f32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            weight_mutation_rate: 0.2,
            weight_sigma: 0.1,
            weight_clamp: 4.0,
            hidden_resize_rate: 0.05,
            gene_mutation_rate: 0.02,
        }
    }
}

/// Frustration counters, unlock thresholds and emotional state bands.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FrustrationConfig {
    pub mood_window: usize,
    pub empty_forage_threshold: u32,
    pub indigestible_threshold: u32,
    pub isolation_threshold: u32,
    pub stagnation_threshold: u32,
    pub struggling: f32,
    pub frustrated: f32,
    pub desperate: f32,
    /// Mean energy loss per tick that counts as full decline.
    pub decline_scale: f64,
    pub relief_decay: f32,
}

impl Default for FrustrationConfig {
    fn default() -> Self {
        Self {
            mood_window: 10,
            empty_forage_threshold: 8,
            indigestible_threshold: 5,
            isolation_threshold: 12,
            stagnation_threshold: 20,
            struggling: 0.3,
            frustrated: 0.6,
            desperate: 0.8,
            decline_scale: 5.0,
            relief_decay: 0.05,
        }
    }
}

impl FrustrationConfig {
    #[must_use]
    pub fn threshold(&self, kind: FailureKind) -> u32 {
        match kind {
            FailureKind::EmptyForage => self.empty_forage_threshold,
            FailureKind::Indigestible => self.indigestible_threshold,
            FailureKind::Isolation => self.isolation_threshold,
            FailureKind::Stagnation => self.stagnation_threshold,
        }
    }
}

/// Teaching, trade, trust and competition. Probabilities here are tunable
/// heuristics, not invariants.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SocialConfig {
    pub teach_insight_threshold: u32,
    pub teach_min_energy: f64,
    /// Teach probability is `gain * drive / teach_threshold`, capped.
    pub teach_drive_gain: f32,
    pub max_teach_probability: f32,
    pub teach_cost: f64,
    /// Fidelity multiplier applied to taught memory copies.
    pub fade_factor: f32,
    pub imitation_strength: f32,
    pub imitation_horizon: u32,
    pub trade_min_outcome: f64,
    pub trade_drive_gain: f32,
    pub lead_degrade_probability: f32,
    /// Maximum leads held per region.
    pub board_capacity: usize,
    /// Leads older than this many ticks expire.
    pub lead_window: u64,
    pub trust_step: f32,
    pub initial_trust: f32,
    pub observation_capacity: usize,
    pub trust_capacity: usize,
    pub competition_population_scale: f32,
    /// Weight of scarcity in the competition signal; population gets the rest.
    pub competition_blend: f32,
    pub diffuse_on_death: bool,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            teach_insight_threshold: 3,
            teach_min_energy: 20.0,
            teach_drive_gain: 0.3,
            max_teach_probability: 0.95,
            teach_cost: 1.0,
            fade_factor: 0.6,
            imitation_strength: 0.5,
            imitation_horizon: 10,
            trade_min_outcome: 5.0,
            trade_drive_gain: 0.6,
            lead_degrade_probability: 0.3,
            board_capacity: 50,
            lead_window: 20,
            trust_step: 0.1,
            initial_trust: 0.5,
            observation_capacity: 20,
            trust_capacity: 32,
            competition_population_scale: 5.0,
            competition_blend: 0.5,
            diffuse_on_death: true,
        }
    }
}

/// Parent advisory economy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub calls_per_period: u32,
    pub period_ticks: u64,
    pub timeout_ms: u64,
    pub base_call_probability: f32,
    pub desperate_call_probability: f32,
    pub cache_capacity: usize,
    pub max_response_len: usize,
    /// Frustration relief granted by any answer.
    pub relief: f32,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            calls_per_period: 10,
            period_ticks: 1000,
            timeout_ms: 2000,
            base_call_probability: 0.0,
            desperate_call_probability: 0.3,
            cache_capacity: 64,
            max_response_len: 280,
            relief: 0.3,
        }
    }
}

/// Shadow trials, parameter tweaks and sandbox limits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SelfModifyConfig {
    /// Patches evaluated per tick at most.
    pub trial_budget_per_tick: usize,
    /// Ticks during which offspring receive a pending patch.
    pub trial_window_ticks: u64,
    /// Ticks after the window closes before evaluation.
    pub evaluation_delay: u64,
    pub min_subjects: usize,
    pub keep_margin: f64,
    pub proposal_probability: f32,
    pub tweak_probability: f32,
    pub tweak_step: f32,
    pub sandbox_op_budget: usize,
    pub max_active_patches: usize,
}

impl Default for SelfModifyConfig {
    fn default() -> Self {
        Self {
            trial_budget_per_tick: 2,
            trial_window_ticks: 50,
            evaluation_delay: 30,
            min_subjects: 2,
            keep_margin: 0.05,
            proposal_probability: 0.02,
            tweak_probability: 0.05,
            tweak_step: 0.05,
            sandbox_op_budget: 64,
            max_active_patches: 16,
        }
    }
}

/// Offline feed sampler used when no live source is wired in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub supply_probability: f32,
    pub energy_scale: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            supply_probability: 0.3,
            energy_scale: 1.0,
        }
    }
}

/// Digestion of feed items: scarcity, diet and knowledge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NutritionConfig {
    /// How strongly region scarcity cuts feed yield, in `[0, 1]`.
    pub scarcity_weight: f64,
    /// Floor on the scarcity multiplier.
    pub min_yield: f64,
    /// Meals kept for the variety measure.
    pub diet_window: usize,
    /// Toxins cleared after every meal.
    pub detox: f64,
    pub knowledge_capacity: usize,
    /// Expertise gained per unit of usefulness.
    pub expertise_rate: f32,
    /// Extra yield at full expertise.
    pub expertise_bonus: f64,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            scarcity_weight: 0.5,
            min_yield: 0.25,
            diet_window: 20,
            detox: 0.01,
            knowledge_capacity: 50,
            expertise_rate: 0.1,
            expertise_bonus: 0.25,
        }
    }
}

/// Parents feeding their young.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CareConfig {
    pub enabled: bool,
    /// Below this age a child is fed whenever it runs low.
    pub dependency_age: u64,
    /// Below this age a child is only fed in emergencies.
    pub independence_age: u64,
    pub need_energy: f64,
    pub emergency_energy: f64,
    /// Energy a parent gives up per meal.
    pub feed_amount: f64,
    /// A parent never feeds below this energy.
    pub parent_reserve: f64,
    /// Fraction of the meal that reaches the child.
    pub transfer_efficiency: f64,
    /// Past this many meals the portion is halved.
    pub care_limit: u32,
}

impl Default for CareConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dependency_age: 50,
            independence_age: 150,
            need_energy: 25.0,
            emergency_energy: 10.0,
            feed_amount: 8.0,
            parent_reserve: 40.0,
            transfer_efficiency: 0.8,
            care_limit: 20,
        }
    }
}

/// Event feed and progress logging.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub summary_interval: u64,
    pub log_interval: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            summary_interval: 50,
            log_interval: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub environment: EnvironmentConfig,
    pub metabolism: MetabolismConfig,
    pub brain: BrainConfig,
    pub evolution: EvolutionConfig,
    pub frustration: FrustrationConfig,
    pub social: SocialConfig,
    pub advisory: AdvisoryConfig,
    pub self_modify: SelfModifyConfig,
    pub feed: FeedConfig,
    pub nutrition: NutritionConfig,
    pub care: CareConfig,
    pub observability: ObservabilityConfig,
}

fn unit(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

impl AppConfig {
    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        // World
        anyhow::ensure!(self.world.width > 0, "World width must be positive");
        anyhow::ensure!(self.world.height > 0, "World height must be positive");

        // Environment
        let env = &self.environment;
        anyhow::ensure!(env.capacity > 0.0, "Capacity must be positive");
        anyhow::ensure!(env.regrowth_rate >= 0.0, "Regrowth rate must be non-negative");
        anyhow::ensure!(env.noise >= 0.0, "Noise must be non-negative");
        anyhow::ensure!(
            (0.0..=1.0).contains(&env.initial_stock_fraction),
            "Initial stock fraction must be in [0.0, 1.0]"
        );
        anyhow::ensure!(env.bite >= 0.0, "Bite must be non-negative");
        for region in &env.regions {
            anyhow::ensure!(!region.name.is_empty(), "Region name must not be empty");
            anyhow::ensure!(
                region.name != crate::environment::DEFAULT_REGION,
                "Region name `{}` is reserved",
                region.name
            );
            anyhow::ensure!(
                region.x0 < region.x1 && region.y0 < region.y1,
                "Region `{}` has an empty rectangle",
                region.name
            );
            anyhow::ensure!(
                region.capacity.map_or(true, |k| k > 0.0),
                "Region `{}` capacity must be positive",
                region.name
            );
            anyhow::ensure!(
                region.regrowth_rate.map_or(true, |r| r >= 0.0),
                "Region `{}` regrowth rate must be non-negative",
                region.name
            );
            anyhow::ensure!(
                region.noise.map_or(true, |n| n >= 0.0),
                "Region `{}` noise must be non-negative",
                region.name
            );
        }

        // Metabolism
        let met = &self.metabolism;
        anyhow::ensure!(met.base_cost >= 0.0, "Base cost must be non-negative");
        anyhow::ensure!(met.memory_cost >= 0.0, "Memory cost must be non-negative");
        anyhow::ensure!(met.initial_energy > 0.0, "Initial energy must be positive");
        anyhow::ensure!(
            met.reproduction_cost >= 0.0,
            "Reproduction cost must be non-negative"
        );
        anyhow::ensure!(
            met.reproduction_threshold > met.reproduction_cost,
            "Reproduction threshold must exceed reproduction cost"
        );

        // Brain
        let brain = &self.brain;
        anyhow::ensure!(
            brain.min_hidden >= 1 && brain.min_hidden <= brain.initial_hidden,
            "Min hidden must be in [1, initial_hidden]"
        );
        anyhow::ensure!(
            brain.initial_hidden <= brain.max_hidden,
            "Initial hidden exceeds max hidden"
        );
        anyhow::ensure!(
            brain.max_sensors >= genesis_data::SensorGene::CORE.len(),
            "Max sensors must hold every core sensor"
        );
        anyhow::ensure!(
            brain.max_actuators >= genesis_data::ActuatorGene::CORE.len(),
            "Max actuators must hold every core actuator"
        );
        anyhow::ensure!(brain.adapt_interval > 0, "Adapt interval must be positive");
        anyhow::ensure!(unit(brain.usage_decay), "Usage decay must be in [0.0, 1.0]");

        // Evolution
        let evo = &self.evolution;
        anyhow::ensure!(
            unit(evo.weight_mutation_rate),
            "Weight mutation rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(evo.weight_sigma >= 0.0, "Weight sigma must be non-negative");
        anyhow::ensure!(evo.weight_clamp > 0.0, "Weight clamp must be positive");
        anyhow::ensure!(
            unit(evo.hidden_resize_rate),
            "Hidden resize rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            unit(evo.gene_mutation_rate),
            "Gene mutation rate must be in [0.0, 1.0]"
        );

        // Frustration
        let fr = &self.frustration;
        anyhow::ensure!(fr.mood_window > 0, "Mood window must be positive");
        for kind in FailureKind::ALL {
            anyhow::ensure!(
                fr.threshold(kind) > 0,
                "Unlock threshold for {} must be positive",
                kind.label()
            );
        }
        anyhow::ensure!(
            fr.struggling < fr.frustrated && fr.frustrated < fr.desperate && fr.desperate <= 1.0,
            "Emotional thresholds must be increasing and at most 1.0"
        );
        anyhow::ensure!(fr.decline_scale > 0.0, "Decline scale must be positive");

        // Social
        let social = &self.social;
        anyhow::ensure!(
            unit(social.max_teach_probability),
            "Max teach probability must be in [0.0, 1.0]"
        );
        anyhow::ensure!(social.teach_cost >= 0.0, "Teach cost must be non-negative");
        anyhow::ensure!(unit(social.fade_factor), "Fade factor must be in [0.0, 1.0]");
        anyhow::ensure!(
            unit(social.imitation_strength),
            "Imitation strength must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            unit(social.lead_degrade_probability),
            "Lead degrade probability must be in [0.0, 1.0]"
        );
        anyhow::ensure!(social.board_capacity > 0, "Board capacity must be positive");
        anyhow::ensure!(unit(social.trust_step), "Trust step must be in [0.0, 1.0]");
        anyhow::ensure!(unit(social.initial_trust), "Initial trust must be in [0.0, 1.0]");
        anyhow::ensure!(
            unit(social.competition_blend),
            "Competition blend must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            social.competition_population_scale > 0.0,
            "Competition population scale must be positive"
        );

        // Advisory
        let adv = &self.advisory;
        anyhow::ensure!(adv.period_ticks > 0, "Advisory period must be positive");
        anyhow::ensure!(
            unit(adv.base_call_probability) && unit(adv.desperate_call_probability),
            "Advisory call probabilities must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            adv.max_response_len > 0,
            "Max response length must be positive"
        );

        // Self-modification
        let sm = &self.self_modify;
        anyhow::ensure!(
            sm.trial_budget_per_tick > 0,
            "Trial budget per tick must be positive"
        );
        anyhow::ensure!(sm.trial_window_ticks > 0, "Trial window must be positive");
        anyhow::ensure!(sm.min_subjects > 0, "Min subjects must be positive");
        anyhow::ensure!(
            unit(sm.proposal_probability) && unit(sm.tweak_probability),
            "Self-modification probabilities must be in [0.0, 1.0]"
        );
        anyhow::ensure!(sm.sandbox_op_budget > 0, "Sandbox op budget must be positive");

        // Feed
        anyhow::ensure!(
            unit(self.feed.supply_probability),
            "Feed supply probability must be in [0.0, 1.0]"
        );

        // Nutrition
        let nut = &self.nutrition;
        anyhow::ensure!(
            (0.0..=1.0).contains(&nut.scarcity_weight),
            "Scarcity weight must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&nut.min_yield),
            "Min yield must be in [0.0, 1.0]"
        );
        anyhow::ensure!(nut.diet_window > 0, "Diet window must be positive");
        anyhow::ensure!(nut.detox >= 0.0, "Detox must be non-negative");
        anyhow::ensure!(unit(nut.expertise_rate), "Expertise rate must be in [0.0, 1.0]");
        anyhow::ensure!(
            nut.expertise_bonus >= 0.0,
            "Expertise bonus must be non-negative"
        );

        // Care
        let care = &self.care;
        anyhow::ensure!(
            care.dependency_age <= care.independence_age,
            "Dependency age must not exceed independence age"
        );
        anyhow::ensure!(
            care.emergency_energy <= care.need_energy,
            "Emergency energy must not exceed need energy"
        );
        anyhow::ensure!(care.feed_amount >= 0.0, "Feed amount must be non-negative");
        anyhow::ensure!(
            care.parent_reserve >= 0.0,
            "Parent reserve must be non-negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&care.transfer_efficiency),
            "Transfer efficiency must be in [0.0, 1.0]"
        );

        // Observability
        anyhow::ensure!(
            self.observability.summary_interval > 0,
            "Summary interval must be positive"
        );
        anyhow::ensure!(
            self.observability.log_interval > 0,
            "Log interval must be positive"
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stable hash of every section that affects simulation outcomes.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.environment).as_bytes());
        hasher.update(format!("{:?}", self.metabolism).as_bytes());
        hasher.update(format!("{:?}", self.brain).as_bytes());
        hasher.update(format!("{:?}", self.evolution).as_bytes());
        hasher.update(format!("{:?}", self.frustration).as_bytes());
        hasher.update(format!("{:?}", self.social).as_bytes());
        hasher.update(format!("{:?}", self.advisory).as_bytes());
        hasher.update(format!("{:?}", self.self_modify).as_bytes());
        hasher.update(format!("{:?}", self.nutrition).as_bytes());
        hasher.update(format!("{:?}", self.care).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_world_width() {
        let config = AppConfig {
            world: WorldConfig {
                width: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reproduction_cost_must_be_below_threshold() {
        let config = AppConfig {
            metabolism: MetabolismConfig {
                reproduction_threshold: 10.0,
                reproduction_cost: 20.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_region_rejected() {
        let config = AppConfig {
            environment: EnvironmentConfig {
                regions: vec![RegionOverride {
                    name: "void".into(),
                    x0: 4,
                    x1: 4,
                    y0: 0,
                    y1: 2,
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_unlock_threshold_rejected() {
        let config = AppConfig {
            frustration: FrustrationConfig {
                isolation_threshold: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_partial_sections() {
        let toml = r#"
            [world]
            width = 8
            height = 4
            seed = 7
            deterministic = true

            [[environment.regions]]
            name = "archive"
            x0 = 0
            y0 = 0
            x1 = 4
            y1 = 4
            regrowth_rate = 0.05
            preferred_data = "code"
        "#;
        let config = AppConfig::from_toml(toml).unwrap();
        assert_eq!(config.world.width, 8);
        assert_eq!(config.world.initial_population, 20);
        assert_eq!(config.environment.regions.len(), 1);
        assert_eq!(
            config.environment.regions[0].preferred_data,
            Some(DataType::Code)
        );
        assert!(config.environment.regions[0].contains(3, 3));
        assert!(!config.environment.regions[0].contains(4, 0));
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(AppConfig::from_toml("[social]\nfade_factor = 2.0\n").is_err());
    }

    #[test]
    fn test_fingerprint_consistency() {
        let config1 = AppConfig::default();
        let mut config2 = AppConfig::default();
        assert_eq!(config1.fingerprint(), config2.fingerprint());
        config2.metabolism.base_cost = 2.0;
        assert_ne!(config1.fingerprint(), config2.fingerprint());
    }

    #[test]
    fn test_care_ages_must_be_ordered() {
        let mut config = AppConfig::default();
        config.care.dependency_age = 200;
        assert!(config.validate().is_err());
        config.care.dependency_age = 50;
        config.care.transfer_efficiency = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nutrition_section_from_toml() {
        let config = AppConfig::from_toml(
            r#"
            [nutrition]
            scarcity_weight = 0.9

            [care]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.nutrition.scarcity_weight, 0.9);
        assert_eq!(config.nutrition.diet_window, 20);
        assert!(!config.care.enabled);
    }
}
