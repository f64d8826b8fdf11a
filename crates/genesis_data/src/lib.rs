//! # Genesis Data
//!
//! Plain serializable records shared by every Genesis crate. Behavior lives in
//! `genesis_core`; this crate only describes shapes and their trivial accessors.

pub mod data;

pub use data::behavior::{BehaviorDiff, BehaviorParams, ForagingStrategy, Tunable};
pub use data::capability::{
    Capability, CapabilitySet, CapabilityTier, DataType, FailureCounters, FailureKind,
};
pub use data::entity::{
    Drives, EmotionalState, Identity, ImitationBias, Intel, MemoryEntry, MemoryLog, MoodSample,
    ObservationKind, Organism, OrganismId, Position, Psyche, SocialObservation, SocialState,
    Vitals,
};
pub use data::environment::{FoodItem, FoodSource, Lead, LeadHint};
pub use data::event::{EventTag, SimEvent};
pub use data::genotype::{ActuatorGene, Genome, SensorGene};
pub use data::nutrition::{Diet, KnowledgeBase, KnowledgeItem};
