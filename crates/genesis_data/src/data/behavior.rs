use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumerated foraging routines a behavior patch may point at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ForagingStrategy {
    /// Richest visible patch.
    #[default]
    Greedy,
    /// Random neighbouring patch.
    Explorer,
    /// Best remembered source.
    MemoryFirst,
    /// Board leads, same region first.
    LeadFollower,
}

impl ForagingStrategy {
    pub const ALL: [ForagingStrategy; 4] = [
        ForagingStrategy::Greedy,
        ForagingStrategy::Explorer,
        ForagingStrategy::MemoryFirst,
        ForagingStrategy::LeadFollower,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ForagingStrategy::Greedy => "greedy",
            ForagingStrategy::Explorer => "explorer",
            ForagingStrategy::MemoryFirst => "memory_first",
            ForagingStrategy::LeadFollower => "lead_follower",
        }
    }
}

/// A named numeric decision point that self-modification may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tunable {
    LearningRate,
    ExplorationBias,
    MigrateThreshold,
    TeachThreshold,
    TradeThreshold,
    ConserveBias,
}

impl Tunable {
    pub const ALL: [Tunable; 6] = [
        Tunable::LearningRate,
        Tunable::ExplorationBias,
        Tunable::MigrateThreshold,
        Tunable::TeachThreshold,
        Tunable::TradeThreshold,
        Tunable::ConserveBias,
    ];

    /// Inclusive allowed range.
    #[must_use]
    pub fn range(self) -> (f32, f32) {
        match self {
            Tunable::LearningRate => (0.001, 0.5),
            Tunable::ExplorationBias => (0.0, 1.0),
            Tunable::MigrateThreshold => (0.1, 0.95),
            Tunable::TeachThreshold => (0.05, 0.95),
            Tunable::TradeThreshold => (0.05, 0.95),
            Tunable::ConserveBias => (0.0, 1.0),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tunable::LearningRate => "learning_rate",
            Tunable::ExplorationBias => "exploration_bias",
            Tunable::MigrateThreshold => "migrate_threshold",
            Tunable::TeachThreshold => "teach_threshold",
            Tunable::TradeThreshold => "trade_threshold",
            Tunable::ConserveBias => "conserve_bias",
        }
    }
}

impl fmt::Display for Tunable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tunable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tunable::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| format!("unknown tunable `{s}`"))
    }
}

/// Data-driven behavior hooks. Everything a patch can reach is in here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorParams {
    pub learning_rate: f32,
    pub exploration_bias: f32,
    pub migrate_threshold: f32,
    pub teach_threshold: f32,
    pub trade_threshold: f32,
    pub conserve_bias: f32,
    pub strategy: ForagingStrategy,
}

impl Default for BehaviorParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            exploration_bias: 0.2,
            migrate_threshold: 0.7,
            teach_threshold: 0.3,
            trade_threshold: 0.4,
            conserve_bias: 0.3,
            strategy: ForagingStrategy::Greedy,
        }
    }
}

impl BehaviorParams {
    #[must_use]
    pub fn get(&self, tunable: Tunable) -> f32 {
        match tunable {
            Tunable::LearningRate => self.learning_rate,
            Tunable::ExplorationBias => self.exploration_bias,
            Tunable::MigrateThreshold => self.migrate_threshold,
            Tunable::TeachThreshold => self.teach_threshold,
            Tunable::TradeThreshold => self.trade_threshold,
            Tunable::ConserveBias => self.conserve_bias,
        }
    }

    /// Raw setter. Range enforcement is the caller's decision.
    pub fn set(&mut self, tunable: Tunable, value: f32) {
        let slot = match tunable {
            Tunable::LearningRate => &mut self.learning_rate,
            Tunable::ExplorationBias => &mut self.exploration_bias,
            Tunable::MigrateThreshold => &mut self.migrate_threshold,
            Tunable::TeachThreshold => &mut self.teach_threshold,
            Tunable::TradeThreshold => &mut self.trade_threshold,
            Tunable::ConserveBias => &mut self.conserve_bias,
        };
        *slot = value;
    }
}

/// Typed diff over [`BehaviorParams`]: additive deltas plus an optional
/// strategy swap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorDiff {
    pub deltas: Vec<(Tunable, f32)>,
    pub strategy: Option<ForagingStrategy>,
}

impl BehaviorDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.strategy.is_none()
    }
}
