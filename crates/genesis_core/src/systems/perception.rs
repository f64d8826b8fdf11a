use crate::board::TradeBoard;
use crate::config::AppConfig;
use crate::environment::PatchGrid;
use crate::snapshot::RegionStats;
use genesis_data::{Capability, DataType, Organism, SensorGene};
use std::collections::BTreeMap;

/// Everything a sensing pass may read besides the organism itself.
pub struct SenseContext<'a> {
    pub grid: &'a PatchGrid,
    pub regions: &'a BTreeMap<String, RegionStats>,
    pub board: &'a TradeBoard,
    pub config: &'a AppConfig,
}

impl SenseContext<'_> {
    fn region(&self, name: &str) -> RegionStats {
        self.regions.get(name).copied().unwrap_or(RegionStats {
            population: 1,
            scarcity: self.grid.region_scarcity(name),
            competition: 0.0,
        })
    }
}

#[must_use]
pub fn sensor_value(gene: SensorGene, organism: &Organism, ctx: &SenseContext<'_>) -> f32 {
    let region = organism.position.region.as_str();
    match gene {
        SensorGene::Energy => {
            let threshold = ctx.config.metabolism.reproduction_threshold.max(1.0);
            (organism.vitals.energy / threshold).min(2.0) as f32
        }
        SensorGene::Frustration => organism.psyche.frustration,
        SensorGene::MemoryLoad => organism.memory.load(),
        SensorGene::Scarcity => ctx.region(region).scarcity as f32,
        SensorGene::Age => (organism.vitals.age as f32 / 1000.0).min(1.0),
        SensorGene::CapabilityDensity => {
            organism.capabilities.len() as f32 / Capability::ALL.len() as f32
        }
        SensorGene::RecentSuccess => success_rate(organism),
        SensorGene::Competition => ctx.region(region).competition,
        SensorGene::StructuredAvailability => match ctx.grid.preferred_data(region) {
            Some(t) if t.is_structured() => 1.0,
            _ => 0.0,
        },
        SensorGene::CodeAvailability => match ctx.grid.preferred_data(region) {
            Some(DataType::Code) => 1.0,
            _ => 0.0,
        },
        SensorGene::NoveltyHunger => 1.0 / (1.0 + organism.psyche.known_sources.len() as f32),
        SensorGene::LeadAvailability => ctx
            .board
            .best_for(region, organism.id())
            .map_or(0.0, |l| (l.score / (l.score + 10.0)) as f32),
        SensorGene::ImitationPull => organism
            .social
            .imitation
            .as_ref()
            .map_or(0.0, |b| b.current()),
        SensorGene::TrustLevel => {
            let trust = &organism.social.trust;
            if trust.is_empty() {
                0.0
            } else {
                trust.values().sum::<f32>() / trust.len() as f32
            }
        }
    }
}

/// Fraction of successful samples in the mood window, zero when empty.
#[must_use]
pub fn success_rate(organism: &Organism) -> f32 {
    let mood = &organism.psyche.mood;
    if mood.is_empty() {
        return 0.0;
    }
    mood.iter().filter(|m| m.success).count() as f32 / mood.len() as f32
}

/// Input vector in the genome's sensor order.
#[must_use]
pub fn sense(organism: &Organism, ctx: &SenseContext<'_>) -> Vec<f32> {
    organism
        .intel
        .genome
        .sensors
        .iter()
        .map(|gene| sensor_value(*gene, organism, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::create_organism_with_rng;
    use genesis_data::{MoodSample, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sense_follows_gene_order() {
        let config = AppConfig::default();
        let grid = PatchGrid::new(&config.environment, 4, 4);
        let board = TradeBoard::new(4, 10);
        let regions = BTreeMap::new();
        let ctx = SenseContext {
            grid: &grid,
            regions: &regions,
            board: &board,
            config: &config,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pos = Position {
            x: 0,
            y: 0,
            region: grid.region_of(0, 0).to_string(),
        };
        let mut org = create_organism_with_rng(1, pos, 0, &config, &mut rng);
        org.vitals.energy = 40.0;
        org.psyche.mood.push_back(MoodSample {
            energy_delta: 1.0,
            success: true,
        });
        let inputs = sense(&org, &ctx);
        assert_eq!(inputs.len(), org.intel.genome.sensors.len());
        let energy_idx = org
            .intel
            .genome
            .sensor_index(SensorGene::Energy)
            .unwrap();
        assert!((inputs[energy_idx] - 0.5).abs() < 1e-6);
        assert_eq!(sensor_value(SensorGene::RecentSuccess, &org, &ctx), 1.0);
        assert_eq!(sensor_value(SensorGene::LeadAvailability, &org, &ctx), 0.0);
    }
}
