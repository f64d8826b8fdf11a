use super::behavior::BehaviorParams;
use super::capability::{CapabilitySet, DataType, FailureCounters, FailureKind};
use super::environment::FoodSource;
use super::genotype::Genome;
use super::nutrition::{Diet, KnowledgeBase};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use uuid::Uuid;

/// Stable, monotonically assigned organism id. Tick processing order follows it.
pub type OrganismId = u64;

/// Unique identification of an organism.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: OrganismId,
    pub parent_id: Option<OrganismId>,
    pub lineage_id: Uuid,
    pub generation: u32,
}

/// Grid cell plus the region label it falls in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub region: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalState {
    #[default]
    Content,
    Struggling,
    Frustrated,
    Desperate,
}

impl EmotionalState {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EmotionalState::Content => "content",
            EmotionalState::Struggling => "struggling",
            EmotionalState::Frustrated => "frustrated",
            EmotionalState::Desperate => "desperate",
        }
    }
}

/// Energy economy and age.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Never negative. Zero means the organism dies this tick.
    pub energy: f64,
    pub age: u64,
    pub birth_tick: u64,
    pub offspring_count: u32,
    /// Meals received from a parent so far.
    #[serde(default)]
    pub care_received: u32,
}

/// One sample of the rolling mood window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoodSample {
    pub energy_delta: f64,
    pub success: bool,
}

/// Frustration bookkeeping and derived emotional state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Psyche {
    pub state: EmotionalState,
    /// Last computed frustration level in `[0, 1]`.
    pub frustration: f32,
    /// Temporary reduction granted by advice, decays every tick.
    pub relief: f32,
    pub failures: FailureCounters,
    pub last_failure: Option<FailureKind>,
    pub mood: VecDeque<MoodSample>,
    /// Successful meals from sources not seen before.
    pub insights: u32,
    pub known_sources: BTreeSet<String>,
}

/// An observed (source -> outcome) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub tick: u64,
    pub source: FoodSource,
    /// Energy gained. Zero records a miss.
    pub outcome: f64,
    /// 1.0 for first-hand entries, lower for taught copies.
    pub fidelity: f32,
    pub taught_by: Option<OrganismId>,
}

/// Bounded FIFO of recent observations. `entries.len() <= capacity` always.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryLog {
    pub capacity: usize,
    pub entries: VecDeque<MemoryEntry>,
}

impl MemoryLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends, evicting the oldest entries. A zero-capacity log stores nothing.
    pub fn push(&mut self, entry: MemoryEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fraction of capacity in use.
    #[must_use]
    pub fn load(&self) -> f32 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.entries.len() as f32 / self.capacity as f32
    }

    /// Highest-outcome successful entry, latest wins on ties.
    #[must_use]
    pub fn best_success(&self) -> Option<&MemoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome > 0.0)
            .fold(None, |best: Option<&MemoryEntry>, e| match best {
                Some(b) if b.outcome * f64::from(b.fidelity) > e.outcome * f64::from(e.fidelity) => {
                    Some(b)
                }
                _ => Some(e),
            })
    }
}

/// What an organism recorded about a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Taught,
    Learned,
    LeadUsed,
    Inherited,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocialObservation {
    pub tick: u64,
    pub peer: OrganismId,
    pub kind: ObservationKind,
    pub source: Option<FoodSource>,
}

/// Short-lived pull toward a source a peer shared.
///
/// Strength decays linearly: `strength * remaining / horizon`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImitationBias {
    pub peer: OrganismId,
    pub source: FoodSource,
    pub strength: f32,
    pub remaining: u32,
    pub horizon: u32,
}

impl ImitationBias {
    #[must_use]
    pub fn current(&self) -> f32 {
        if self.horizon == 0 {
            return 0.0;
        }
        self.strength * self.remaining as f32 / self.horizon as f32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialState {
    pub observations: VecDeque<SocialObservation>,
    /// Per-neighbor trust in `[0, 1]`.
    pub trust: BTreeMap<OrganismId, f32>,
    pub imitation: Option<ImitationBias>,
    /// Lead the organism is currently following, used to credit its poster.
    pub followed_lead: Option<OrganismId>,
}

/// Brain outputs mapped onto named behavior weights, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Drives {
    pub explore: f32,
    pub conserve: f32,
    pub risk: f32,
    pub migrate: f32,
    pub teach: f32,
    pub trade: f32,
    pub prefer_structured: f32,
    pub social: f32,
}

/// Cognitive state of an organism.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intel {
    pub genome: Genome,
    /// Drives from the most recent decision pass.
    #[serde(default)]
    pub drives: Drives,
    pub behavior: BehaviorParams,
    /// Pre-patch behavior for organisms born into a shadow trial.
    #[serde(default)]
    pub baseline_behavior: Option<BehaviorParams>,
    #[serde(default)]
    pub shadow_patch: Option<Uuid>,
    /// Lineage logic version this organism's behavior descends from.
    #[serde(default)]
    pub logic_version: u32,
    #[serde(default)]
    pub food_preference: Option<DataType>,
}

/// A digital organism.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub identity: Identity,
    pub position: Position,
    pub vitals: Vitals,
    pub capabilities: CapabilitySet,
    pub psyche: Psyche,
    pub memory: MemoryLog,
    pub intel: Intel,
    pub social: SocialState,
    #[serde(default)]
    pub diet: Diet,
    #[serde(default)]
    pub knowledge: KnowledgeBase,
}

impl Organism {
    #[must_use]
    pub fn id(&self) -> OrganismId {
        self.identity.id
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.vitals.energy > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tick: u64, outcome: f64) -> MemoryEntry {
        MemoryEntry {
            tick,
            source: FoodSource::Patch { x: 0, y: 0 },
            outcome,
            fidelity: 1.0,
            taught_by: None,
        }
    }

    #[test]
    fn test_memory_never_exceeds_capacity() {
        let mut log = MemoryLog::with_capacity(3);
        for t in 0..10 {
            log.push(entry(t, 1.0));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries.front().map(|e| e.tick), Some(7));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut log = MemoryLog::with_capacity(0);
        log.push(entry(1, 5.0));
        assert!(log.is_empty());
        assert!((log.load() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_best_success_ignores_misses() {
        let mut log = MemoryLog::with_capacity(5);
        log.push(entry(1, 0.0));
        log.push(entry(2, 4.0));
        log.push(entry(3, 2.0));
        assert_eq!(log.best_success().map(|e| e.tick), Some(2));
    }

    #[test]
    fn test_imitation_decays_linearly() {
        let mut bias = ImitationBias {
            peer: 1,
            source: FoodSource::Patch { x: 1, y: 1 },
            strength: 0.4,
            remaining: 4,
            horizon: 4,
        };
        assert!((bias.current() - 0.4).abs() < 1e-6);
        bias.remaining = 2;
        assert!((bias.current() - 0.2).abs() < 1e-6);
        bias.remaining = 0;
        assert_eq!(bias.current(), 0.0);
    }
}
