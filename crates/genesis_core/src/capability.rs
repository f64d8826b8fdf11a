//! Capability unlock ladders and the capability-to-behavior lookup table.

use genesis_data::{Capability, CapabilitySet, FailureKind, ForagingStrategy};

const EMPTY_FORAGE_LADDER: [Capability; 5] = [
    Capability::Remember,
    Capability::Associate,
    Capability::StoreEnergy,
    Capability::Predict,
    Capability::Plan,
];

const INDIGESTIBLE_LADDER: [Capability; 3] =
    [Capability::Abstract, Capability::Forget, Capability::Create];

const ISOLATION_LADDER: [Capability; 6] = [
    Capability::Signal,
    Capability::Receive,
    Capability::Share,
    Capability::Trade,
    Capability::Teach,
    Capability::AskParent,
];

const STAGNATION_LADDER: [Capability; 6] = [
    Capability::ReadSelf,
    Capability::ModifyParam,
    Capability::ModifyLogic,
    Capability::WriteCode,
    Capability::DebugSelf,
    Capability::BirthChild,
];

/// Fixed unlock order for a failure kind.
#[must_use]
pub fn unlock_ladder(kind: FailureKind) -> &'static [Capability] {
    match kind {
        FailureKind::EmptyForage => &EMPTY_FORAGE_LADDER,
        FailureKind::Indigestible => &INDIGESTIBLE_LADDER,
        FailureKind::Isolation => &ISOLATION_LADDER,
        FailureKind::Stagnation => &STAGNATION_LADDER,
    }
}

/// First ladder entry not yet owned. `None` once the ladder is exhausted.
#[must_use]
pub fn next_unlock(kind: FailureKind, owned: &CapabilitySet) -> Option<Capability> {
    unlock_ladder(kind)
        .iter()
        .copied()
        .find(|c| !owned.contains(*c))
}

/// Additive weights over the foraging strategies.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrategyWeights {
    pub greedy: f32,
    pub explore: f32,
    pub memory_first: f32,
    pub lead: f32,
}

impl StrategyWeights {
    #[must_use]
    pub fn get(&self, strategy: ForagingStrategy) -> f32 {
        match strategy {
            ForagingStrategy::Greedy => self.greedy,
            ForagingStrategy::Explorer => self.explore,
            ForagingStrategy::MemoryFirst => self.memory_first,
            ForagingStrategy::LeadFollower => self.lead,
        }
    }

    fn add(mut self, other: StrategyWeights) -> Self {
        self.greedy += other.greedy;
        self.explore += other.explore;
        self.memory_first += other.memory_first;
        self.lead += other.lead;
        self
    }
}

/// Behavior-weight adjustment granted by one capability.
#[must_use]
pub fn adjustment(capability: Capability) -> StrategyWeights {
    let zero = StrategyWeights::default();
    match capability {
        Capability::Remember => StrategyWeights {
            memory_first: 0.3,
            ..zero
        },
        Capability::Associate => StrategyWeights {
            memory_first: 0.1,
            lead: 0.1,
            ..zero
        },
        Capability::Predict => StrategyWeights {
            greedy: 0.2,
            ..zero
        },
        Capability::Plan => StrategyWeights {
            greedy: 0.1,
            explore: -0.1,
            ..zero
        },
        Capability::Receive => StrategyWeights { lead: 0.3, ..zero },
        Capability::Trade | Capability::Signal => StrategyWeights { lead: 0.1, ..zero },
        _ => zero,
    }
}

/// Sum of adjustments over every owned capability.
#[must_use]
pub fn strategy_adjustments(owned: &CapabilitySet) -> StrategyWeights {
    owned
        .iter()
        .map(adjustment)
        .fold(StrategyWeights::default(), StrategyWeights::add)
}

/// Multiplier on the energy a teacher pays per lesson.
#[must_use]
pub fn teach_cost_factor(owned: &CapabilitySet) -> f64 {
    if owned.contains(Capability::Teach) {
        0.5
    } else {
        1.0
    }
}

/// Multiplier on the chance that a posted lead loses specificity.
#[must_use]
pub fn lead_degrade_factor(owned: &CapabilitySet) -> f32 {
    if owned.contains(Capability::Trade) {
        0.5
    } else {
        1.0
    }
}

/// Multiplier on the chance of calling the parent.
#[must_use]
pub fn advice_factor(owned: &CapabilitySet) -> f32 {
    if owned.contains(Capability::AskParent) {
        2.0
    } else {
        1.0
    }
}

/// Multiplier on energy gained from feed items.
#[must_use]
pub fn feed_bonus(owned: &CapabilitySet) -> f64 {
    if owned.contains(Capability::StoreEnergy) {
        1.1
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladders_are_disjoint_and_cover_unlockables() {
        let mut seen = std::collections::BTreeSet::new();
        for kind in FailureKind::ALL {
            for cap in unlock_ladder(kind) {
                assert!(seen.insert(*cap), "{cap} appears twice");
                assert!(!Capability::STARTING.contains(cap));
            }
        }
        assert_eq!(seen.len(), Capability::ALL.len() - Capability::STARTING.len());
    }

    #[test]
    fn test_next_unlock_walks_ladder() {
        let mut owned = CapabilitySet::starting();
        assert_eq!(
            next_unlock(FailureKind::Indigestible, &owned),
            Some(Capability::Abstract)
        );
        owned.unlock(Capability::Abstract);
        owned.unlock(Capability::Forget);
        assert_eq!(
            next_unlock(FailureKind::Indigestible, &owned),
            Some(Capability::Create)
        );
        owned.unlock(Capability::Create);
        assert_eq!(next_unlock(FailureKind::Indigestible, &owned), None);
    }

    #[test]
    fn test_adjustments_accumulate() {
        let owned: CapabilitySet = [Capability::Remember, Capability::Associate, Capability::Plan]
            .into_iter()
            .collect();
        let w = strategy_adjustments(&owned);
        assert!((w.memory_first - 0.4).abs() < 1e-6);
        assert!((w.lead - 0.1).abs() < 1e-6);
        assert!((w.explore + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_capability_modifiers() {
        let mut owned = CapabilitySet::starting();
        assert_eq!(teach_cost_factor(&owned), 1.0);
        owned.unlock(Capability::Teach);
        owned.unlock(Capability::StoreEnergy);
        assert_eq!(teach_cost_factor(&owned), 0.5);
        assert!((feed_bonus(&owned) - 1.1).abs() < 1e-12);
    }
}
