use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A permanently unlockable ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SenseData,
    EatText,
    Move,
    StoreEnergy,
    PatternMatch,
    Remember,
    Forget,
    Associate,
    Signal,
    Receive,
    Share,
    Trade,
    AskParent,
    Abstract,
    Predict,
    Plan,
    Create,
    Teach,
    ReadSelf,
    ModifyParam,
    ModifyLogic,
    WriteCode,
    DebugSelf,
    BirthChild,
}

/// Coarse grouping of capabilities, used to key advisory fallbacks and caches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTier {
    #[default]
    Basic,
    Cognitive,
    Social,
    Reflective,
}

impl Capability {
    pub const ALL: [Capability; 24] = [
        Capability::SenseData,
        Capability::EatText,
        Capability::Move,
        Capability::StoreEnergy,
        Capability::PatternMatch,
        Capability::Remember,
        Capability::Forget,
        Capability::Associate,
        Capability::Signal,
        Capability::Receive,
        Capability::Share,
        Capability::Trade,
        Capability::AskParent,
        Capability::Abstract,
        Capability::Predict,
        Capability::Plan,
        Capability::Create,
        Capability::Teach,
        Capability::ReadSelf,
        Capability::ModifyParam,
        Capability::ModifyLogic,
        Capability::WriteCode,
        Capability::DebugSelf,
        Capability::BirthChild,
    ];

    /// Every organism is born with exactly these.
    pub const STARTING: [Capability; 4] = [
        Capability::SenseData,
        Capability::EatText,
        Capability::PatternMatch,
        Capability::Move,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Capability::SenseData => "sense_data",
            Capability::EatText => "eat_text",
            Capability::Move => "move",
            Capability::StoreEnergy => "store_energy",
            Capability::PatternMatch => "pattern_match",
            Capability::Remember => "remember",
            Capability::Forget => "forget",
            Capability::Associate => "associate",
            Capability::Signal => "signal",
            Capability::Receive => "receive",
            Capability::Share => "share",
            Capability::Trade => "trade",
            Capability::AskParent => "ask_parent",
            Capability::Abstract => "abstract",
            Capability::Predict => "predict",
            Capability::Plan => "plan",
            Capability::Create => "create",
            Capability::Teach => "teach",
            Capability::ReadSelf => "read_self",
            Capability::ModifyParam => "modify_param",
            Capability::ModifyLogic => "modify_logic",
            Capability::WriteCode => "write_code",
            Capability::DebugSelf => "debug_self",
            Capability::BirthChild => "birth_child",
        }
    }

    #[must_use]
    pub fn tier(self) -> CapabilityTier {
        match self {
            Capability::SenseData
            | Capability::EatText
            | Capability::Move
            | Capability::StoreEnergy
            | Capability::PatternMatch => CapabilityTier::Basic,
            Capability::Remember
            | Capability::Forget
            | Capability::Associate
            | Capability::Abstract
            | Capability::Predict
            | Capability::Plan
            | Capability::Create => CapabilityTier::Cognitive,
            Capability::Signal
            | Capability::Receive
            | Capability::Share
            | Capability::Trade
            | Capability::AskParent
            | Capability::Teach => CapabilityTier::Social,
            Capability::ReadSelf
            | Capability::ModifyParam
            | Capability::ModifyLogic
            | Capability::WriteCode
            | Capability::DebugSelf
            | Capability::BirthChild => CapabilityTier::Reflective,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Append-only set of unlocked capabilities.
///
/// There is deliberately no removal API: a capability, once unlocked, stays for
/// the rest of the organism's life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::starting()
    }
}

impl CapabilitySet {
    #[must_use]
    pub fn starting() -> Self {
        Self(Capability::STARTING.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Returns `true` if the capability was newly added.
    pub fn unlock(&mut self, capability: Capability) -> bool {
        self.0.insert(capability)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Highest tier reached by any owned capability.
    #[must_use]
    pub fn tier(&self) -> CapabilityTier {
        self.iter()
            .map(Capability::tier)
            .max()
            .unwrap_or(CapabilityTier::Basic)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An unmet need. Each kind accumulates its own frustration counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Foraging returned no energy at all.
    EmptyForage,
    /// Food was found but its data type needed a missing capability.
    Indigestible,
    /// No peers shared the region.
    Isolation,
    /// A full mood window without net energy gain.
    Stagnation,
}

impl FailureKind {
    pub const ALL: [FailureKind; 4] = [
        FailureKind::EmptyForage,
        FailureKind::Indigestible,
        FailureKind::Isolation,
        FailureKind::Stagnation,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::EmptyForage => "empty_forage",
            FailureKind::Indigestible => "indigestible",
            FailureKind::Isolation => "isolation",
            FailureKind::Stagnation => "stagnation",
        }
    }
}

/// Frustration counters, one per [`FailureKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounters {
    pub empty_forage: u32,
    pub indigestible: u32,
    pub isolation: u32,
    pub stagnation: u32,
}

impl FailureCounters {
    #[must_use]
    pub fn get(&self, kind: FailureKind) -> u32 {
        match kind {
            FailureKind::EmptyForage => self.empty_forage,
            FailureKind::Indigestible => self.indigestible,
            FailureKind::Isolation => self.isolation,
            FailureKind::Stagnation => self.stagnation,
        }
    }

    pub fn slot_mut(&mut self, kind: FailureKind) -> &mut u32 {
        match kind {
            FailureKind::EmptyForage => &mut self.empty_forage,
            FailureKind::Indigestible => &mut self.indigestible,
            FailureKind::Isolation => &mut self.isolation,
            FailureKind::Stagnation => &mut self.stagnation,
        }
    }

    pub fn increment(&mut self, kind: FailureKind) -> u32 {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(1);
        *slot
    }

    pub fn reset(&mut self, kind: FailureKind) {
        *self.slot_mut(kind) = 0;
    }
}

/// Label carried by every externally supplied food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    SimpleText,
    StructuredJson,
    XmlData,
    Code,
    RealTimeStream,
    Binary,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        DataType::SimpleText,
        DataType::StructuredJson,
        DataType::XmlData,
        DataType::Code,
        DataType::RealTimeStream,
        DataType::Binary,
    ];

    /// Capability needed to digest this type.
    #[must_use]
    pub fn required_capability(self) -> Capability {
        match self {
            DataType::SimpleText => Capability::EatText,
            DataType::StructuredJson | DataType::XmlData => Capability::PatternMatch,
            DataType::Code => Capability::Abstract,
            DataType::RealTimeStream => Capability::Predict,
            DataType::Binary => Capability::Create,
        }
    }

    #[must_use]
    pub fn is_structured(self) -> bool {
        matches!(self, DataType::StructuredJson | DataType::XmlData)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DataType::SimpleText => "simple_text",
            DataType::StructuredJson => "structured_json",
            DataType::XmlData => "xml_data",
            DataType::Code => "code",
            DataType::RealTimeStream => "real_time_stream",
            DataType::Binary => "binary",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| format!("unknown data type `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_set() {
        let set = CapabilitySet::starting();
        assert_eq!(set.len(), 4);
        assert!(set.contains(Capability::EatText));
        assert!(!set.contains(Capability::Abstract));
        assert_eq!(set.tier(), CapabilityTier::Basic);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut set = CapabilitySet::starting();
        assert!(set.unlock(Capability::Teach));
        assert!(!set.unlock(Capability::Teach));
        assert_eq!(set.tier(), CapabilityTier::Social);
    }

    #[test]
    fn test_counters_reset_per_kind() {
        let mut counters = FailureCounters::default();
        counters.increment(FailureKind::Isolation);
        counters.increment(FailureKind::Isolation);
        counters.increment(FailureKind::EmptyForage);
        counters.reset(FailureKind::Isolation);
        assert_eq!(counters.get(FailureKind::Isolation), 0);
        assert_eq!(counters.get(FailureKind::EmptyForage), 1);
    }

    #[test]
    fn test_data_type_parse() {
        assert_eq!("code".parse::<DataType>(), Ok(DataType::Code));
        assert!("video".parse::<DataType>().is_err());
    }

    #[test]
    fn test_capability_serde_is_snake_case() {
        let json = serde_json::to_string(&Capability::ModifyParam).unwrap();
        assert_eq!(json, "\"modify_param\"");
    }
}
