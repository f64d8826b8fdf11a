//! Read-only view of the population taken at the start of a tick.
//!
//! Every peer read inside a tick goes through these records, never through
//! live organisms, so no organism sees another's same-tick update.

use crate::config::SocialConfig;
use crate::environment::PatchGrid;
use genesis_data::{BehaviorParams, CapabilitySet, Drives, MemoryEntry, Organism, OrganismId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrganismSnapshot {
    pub id: OrganismId,
    pub parent_id: Option<OrganismId>,
    pub lineage_id: Uuid,
    pub region: String,
    pub x: u16,
    pub y: u16,
    pub energy: f64,
    pub age: u64,
    /// Parent meals received so far.
    pub care_received: u32,
    pub insights: u32,
    pub capabilities: CapabilitySet,
    pub best_memory: Option<MemoryEntry>,
    pub drives: Drives,
    pub behavior: BehaviorParams,
    pub trust: BTreeMap<OrganismId, f32>,
    /// Still under a peer's imitation bias.
    pub imitating: bool,
}

impl OrganismSnapshot {
    #[must_use]
    pub fn capture(organism: &Organism) -> Self {
        Self {
            id: organism.id(),
            parent_id: organism.identity.parent_id,
            lineage_id: organism.identity.lineage_id,
            region: organism.position.region.clone(),
            x: organism.position.x,
            y: organism.position.y,
            energy: organism.vitals.energy,
            age: organism.vitals.age,
            care_received: organism.vitals.care_received,
            insights: organism.psyche.insights,
            capabilities: organism.capabilities.clone(),
            best_memory: organism.memory.best_success().cloned(),
            drives: organism.intel.drives,
            behavior: organism.intel.behavior,
            trust: organism.social.trust.clone(),
            imitating: organism.social.imitation.is_some(),
        }
    }

    /// Trust this organism places in `peer`, `default` when never met.
    #[must_use]
    pub fn trust_in(&self, peer: OrganismId, default: f32) -> f32 {
        self.trust.get(&peer).copied().unwrap_or(default)
    }
}

/// Per-region aggregates exposed to the next sensing pass.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct RegionStats {
    pub population: usize,
    pub scarcity: f64,
    pub competition: f32,
}

/// `blend * scarcity + (1 - blend) * crowding`, where crowding grows with
/// every peer beyond the first and saturates at `population_scale` peers.
#[must_use]
pub fn competition_signal(population: usize, scarcity: f64, config: &SocialConfig) -> f32 {
    let crowding = (population.saturating_sub(1) as f32
        / config.competition_population_scale.max(f32::EPSILON))
    .clamp(0.0, 1.0);
    let blend = config.competition_blend;
    (blend * scarcity as f32 + (1.0 - blend) * crowding).clamp(0.0, 1.0)
}

#[must_use]
pub fn capture_all(organisms: &[Organism]) -> Vec<OrganismSnapshot> {
    organisms.iter().map(OrganismSnapshot::capture).collect()
}

/// Partitions the snapshot by region. Every configured region is present,
/// populated or not.
#[must_use]
pub fn region_stats(
    snapshots: &[OrganismSnapshot],
    grid: &PatchGrid,
    config: &SocialConfig,
) -> BTreeMap<String, RegionStats> {
    let mut population: BTreeMap<String, usize> = grid
        .region_names()
        .into_iter()
        .map(|name| (name, 0))
        .collect();
    for snap in snapshots {
        *population.entry(snap.region.clone()).or_insert(0) += 1;
    }
    population
        .into_iter()
        .map(|(name, population)| {
            let scarcity = grid.region_scarcity(&name);
            let stats = RegionStats {
                population,
                scarcity,
                competition: competition_signal(population, scarcity, config),
            };
            (name, stats)
        })
        .collect()
}

/// Snapshot indices grouped by region, in id order.
#[must_use]
pub fn by_region(snapshots: &[OrganismSnapshot]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, snap) in snapshots.iter().enumerate() {
        groups.entry(snap.region.as_str()).or_default().push(idx);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competition_blends_crowding_and_scarcity() {
        let config = SocialConfig {
            competition_population_scale: 4.0,
            competition_blend: 0.5,
            ..SocialConfig::default()
        };
        assert_eq!(competition_signal(1, 0.0, &config), 0.0);
        assert!((competition_signal(3, 0.0, &config) - 0.25).abs() < 1e-6);
        assert!((competition_signal(3, 1.0, &config) - 0.75).abs() < 1e-6);
        assert_eq!(competition_signal(100, 1.0, &config), 1.0);
    }

    #[test]
    fn test_lone_organism_feels_only_scarcity() {
        let config = SocialConfig {
            competition_blend: 1.0,
            ..SocialConfig::default()
        };
        assert!((competition_signal(1, 0.4, &config) - 0.4).abs() < 1e-6);
    }
}
