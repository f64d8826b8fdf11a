pub mod macros;

use genesis_data::{Capability, FoodSource, MemoryEntry, Organism, OrganismId, Position};
use genesis_lib::model::config::AppConfig;
use genesis_lib::model::data_source::{DataSource, NullDataSource};
use genesis_lib::model::lifecycle;
use genesis_lib::model::world::World;
use rand::SeedableRng;

type GridMod = Box<dyn FnOnce(&mut World)>;

/// Builds small worlds with hand-placed organisms.
#[allow(dead_code)]
pub struct SimulationBuilder {
    config: AppConfig,
    organisms: Vec<Organism>,
    source: Option<Box<dyn DataSource>>,
    grid_mods: Vec<GridMod>,
}

#[allow(dead_code)]
impl SimulationBuilder {
    /// A 1x1 noiseless grid, no founders, no external food.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.width = 1;
        config.world.height = 1;
        config.world.initial_population = 0;
        config.world.seed = Some(1);
        config.world.deterministic = true;
        config.environment.noise = 0.0;
        Self {
            config,
            organisms: Vec::new(),
            source: None,
            grid_mods: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_grid(mut self, width: u16, height: u16) -> Self {
        self.config.world.width = width;
        self.config.world.height = height;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_stock(mut self, x: u16, y: u16, stock: f64) -> Self {
        self.grid_mods
            .push(Box::new(move |world| world.grid.set_stock(x, y, stock)));
        self
    }

    pub fn with_source(mut self, source: Box<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_organism(mut self, organism: OrganismBuilder) -> Self {
        let organism = organism.build(&self.config);
        self.organisms.push(organism);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build(self) -> World {
        let source = self.source.unwrap_or_else(|| Box::new(NullDataSource));
        let mut world = World::with_organisms(self.config, self.organisms)
            .expect("Failed to create world in test builder")
            .with_data_source(source);
        for modifier in self.grid_mods {
            modifier(&mut world);
        }
        world
    }
}

/// Hand-tuned organism for scenario tests.
#[allow(dead_code)]
pub struct OrganismBuilder {
    id: OrganismId,
    x: u16,
    y: u16,
    energy: Option<f64>,
    insights: u32,
    memories: Vec<MemoryEntry>,
    capabilities: Vec<Capability>,
    parent: Option<OrganismId>,
}

#[allow(dead_code)]
impl OrganismBuilder {
    pub fn new(id: OrganismId) -> Self {
        Self {
            id,
            x: 0,
            y: 0,
            energy: None,
            insights: 0,
            memories: Vec::new(),
            capabilities: Vec::new(),
            parent: None,
        }
    }

    pub fn child_of(mut self, parent: OrganismId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn at(mut self, x: u16, y: u16) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn insights(mut self, insights: u32) -> Self {
        self.insights = insights;
        self
    }

    /// Adds a first-hand successful meal at a patch.
    pub fn remembers(mut self, x: u16, y: u16, outcome: f64) -> Self {
        self.memories.push(MemoryEntry {
            tick: 0,
            source: FoodSource::Patch { x, y },
            outcome,
            fidelity: 1.0,
            taught_by: None,
        });
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn build(self, config: &AppConfig) -> Organism {
        // Genome weights derive from the id so every run builds the same brain.
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(self.id.wrapping_mul(0x517C_C1B7_2722_0A95));
        let position = Position {
            x: self.x,
            y: self.y,
            region: "default".into(),
        };
        let mut org = lifecycle::create_organism_with_rng(self.id, position, 0, config, &mut rng);
        if let Some(energy) = self.energy {
            org.vitals.energy = energy;
        }
        org.psyche.insights = self.insights;
        org.identity.parent_id = self.parent;
        for entry in self.memories {
            org.memory.push(entry);
        }
        for capability in self.capabilities {
            org.capabilities.unlock(capability);
        }
        org
    }
}
