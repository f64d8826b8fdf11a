use crate::model::advisory::{NoAdvisor, ParentEconomy};
use crate::model::board::TradeBoard;
use crate::model::config::AppConfig;
use crate::model::data_source::OfflineDataSource;
use crate::model::environment::PatchGrid;
use crate::model::history::EventFeed;
use crate::model::lifecycle;
use crate::model::rng::create_rng;
use crate::model::self_modify::SelfModifyManager;
use crate::model::world::World;
use genesis_core::Metrics;
use genesis_data::{Organism, Position};
use genesis_io::WorldRecord;
use rand::Rng;
use tracing::{info, warn};

impl World {
    /// Empty grid and collaborators, no organisms.
    fn bare(config: AppConfig, seed: u64) -> Self {
        let grid = PatchGrid::new(&config.environment, config.world.width, config.world.height);
        Self {
            tick: 0,
            seed,
            grid,
            organisms: Vec::new(),
            board: TradeBoard::new(config.social.board_capacity, config.social.lead_window),
            next_id: 1,
            manager: SelfModifyManager::new(config.self_modify.clone()),
            economy: ParentEconomy::new(config.advisory.clone()),
            feed: EventFeed::new(config.observability.summary_interval),
            metrics: Metrics::new(config.observability.log_interval),
            data_source: Box::new(OfflineDataSource::new(seed, config.feed.clone())),
            advisor: Box::new(NoAdvisor),
            source_exhausted_reported: false,
            pending: Vec::new(),
            notices: Vec::new(),
            config,
        }
    }

    /// Creates a world with `config.world.initial_population` founders placed
    /// at random cells.
    ///
    /// The offline feed and no parent are wired in; swap them with
    /// [`World::with_data_source`] and [`World::with_advisor`].
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        anyhow::ensure!(
            !config.world.deterministic || config.world.seed.is_some(),
            "A deterministic run needs `world.seed`"
        );
        let seed = config.world.seed.unwrap_or_else(rand::random);
        let mut world = Self::bare(config, seed);

        let mut rng = create_rng(seed);
        let (width, height) = (world.grid.width, world.grid.height);
        for _ in 0..world.config.world.initial_population {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            let position = Position {
                x,
                y,
                region: world.grid.region_of(x, y).to_string(),
            };
            let organism =
                lifecycle::create_organism_with_rng(world.next_id, position, 0, &world.config, &mut rng);
            world.organisms.push(organism);
            world.next_id += 1;
        }
        info!(
            seed,
            founders = world.organisms.len(),
            width,
            height,
            "World created"
        );
        Ok(world)
    }

    /// Creates a world with exactly the given organisms, for scenario setup.
    /// Ids must be unique; the list is sorted here.
    pub fn with_organisms(config: AppConfig, mut organisms: Vec<Organism>) -> anyhow::Result<Self> {
        config.validate()?;
        let seed = config.world.seed.unwrap_or(0);
        organisms.sort_by_key(Organism::id);
        anyhow::ensure!(
            organisms.windows(2).all(|w| w[0].id() != w[1].id()),
            "Duplicate organism ids"
        );
        let mut world = Self::bare(config, seed);
        world.next_id = organisms.last().map_or(1, |o| o.id() + 1);
        world.organisms = organisms;
        Ok(world)
    }

    /// Resumes from a save. Patches that were under trial are not restored.
    pub fn from_record(config: AppConfig, record: WorldRecord) -> anyhow::Result<Self> {
        config.validate()?;
        anyhow::ensure!(
            record.width == config.world.width && record.height == config.world.height,
            "Save is {}x{} but the configured grid is {}x{}",
            record.width,
            record.height,
            config.world.width,
            config.world.height
        );
        anyhow::ensure!(
            record.stocks.len() == record.width as usize * record.height as usize,
            "Save holds {} patch stocks for a {}x{} grid",
            record.stocks.len(),
            record.width,
            record.height
        );
        if record.config_fingerprint != config.fingerprint() {
            warn!(
                save = %record.config_fingerprint,
                current = %config.fingerprint(),
                "Resuming under a different configuration"
            );
        }

        let mut world = Self::bare(config, record.seed);
        for (idx, stock) in record.stocks.iter().enumerate() {
            let x = (idx % record.width as usize) as u16;
            let y = (idx / record.width as usize) as u16;
            world.grid.set_stock(x, y, *stock);
        }
        world.tick = record.tick;
        world.organisms = record.organisms;
        world.organisms.sort_by_key(Organism::id);
        let max_id = world.organisms.last().map_or(0, Organism::id);
        world.next_id = record.next_id.max(max_id + 1);
        info!(
            tick = world.tick,
            organisms = world.organisms.len(),
            save = record.save_seq,
            "World restored"
        );
        Ok(world)
    }
}
