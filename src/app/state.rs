use anyhow::{Context, Result};
use genesis_io::{HistoryLogger, SaveStore};
use genesis_observer::Chronicle;
use std::path::{Path, PathBuf};

use crate::app::ShutdownManager;
use crate::model::config::AppConfig;
use crate::model::world::World;

/// Headless runner state: the world plus everything that records it.
pub struct App {
    pub world: World,
    pub store: Option<SaveStore>,
    pub history: HistoryLogger,
    pub chronicle: Chronicle,
    pub shutdown: ShutdownManager,
    /// Save every this many ticks; 0 saves only on exit.
    pub save_interval: u64,
    /// Absolute tick to stop at.
    pub stop_at: Option<u64>,
}

impl App {
    /// Reads `path`. A missing file is created with the defaults; a file that
    /// exists but does not parse is an error.
    pub fn load_config(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            let default = AppConfig::default();
            tracing::info!(path = %path.display(), "No config file, writing defaults");
            let content = toml::to_string(&default).context("Failed to render default config")?;
            if let Err(e) = std::fs::write(path, content) {
                tracing::warn!(path = %path.display(), error = %e, "Could not write default config");
            }
            return Ok(default);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        AppConfig::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Creates a runner. With a save directory, history goes to
    /// `<dir>/events.jsonl` and `resume` continues from the latest save there.
    pub fn new(config: AppConfig, save_dir: Option<PathBuf>, resume: bool) -> Result<Self> {
        let (world, store, history) = match save_dir {
            Some(dir) => {
                let store = SaveStore::open(&dir)?;
                let world = match store.load_latest()? {
                    Some(record) if resume => World::from_record(config, record)?,
                    _ => World::new(config)?,
                };
                let history = HistoryLogger::new_at(&dir)?;
                (world, Some(store), history)
            }
            None => {
                anyhow::ensure!(!resume, "Resuming needs a save directory");
                (World::new(config)?, None, HistoryLogger::new_dummy())
            }
        };

        Ok(Self {
            world,
            store,
            history,
            chronicle: Chronicle::default(),
            shutdown: ShutdownManager::new(),
            save_interval: 0,
            stop_at: None,
        })
    }

    /// Wraps an already built world, with no save store and no history file.
    pub fn with_world(world: World) -> Self {
        Self {
            world,
            store: None,
            history: HistoryLogger::new_dummy(),
            chronicle: Chronicle::default(),
            shutdown: ShutdownManager::new(),
            save_interval: 0,
            stop_at: None,
        }
    }

    /// Runs `ticks` more ticks from the current one.
    pub fn set_tick_budget(&mut self, ticks: u64) {
        self.stop_at = Some(self.world.tick + ticks);
    }

    /// Writes a save. I/O failures are returned as-is; the world is not
    /// rolled back and the store does not skip a sequence number.
    pub fn save_state(&mut self) -> Result<Option<PathBuf>> {
        let Some(store) = self.store.as_mut() else {
            return Ok(None);
        };
        let path = store
            .save(self.world.to_record())
            .with_context(|| format!("Failed to save tick {}", self.world.tick))?;
        Ok(Some(path))
    }
}
