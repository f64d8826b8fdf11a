use crate::model::advisory::{Advisor, ParentEconomy};
use crate::model::board::TradeBoard;
use crate::model::config::AppConfig;
use crate::model::data_source::DataSource;
use crate::model::environment::{PatchGrid, RegionModulation};
use crate::model::history::EventFeed;
use crate::model::self_modify::SelfModifyManager;
use genesis_core::Metrics;
use genesis_data::{EventTag, Organism, OrganismId, SimEvent};
use genesis_io::WorldRecord;

pub mod finalize;
pub mod init;
pub mod update;

/// The whole simulation state plus its collaborators.
///
/// `organisms` is kept sorted by id; every pass walks it in that order.
pub struct World {
    pub tick: u64,
    /// Run seed every tick seed derives from.
    pub seed: u64,
    pub config: AppConfig,
    pub grid: PatchGrid,
    pub organisms: Vec<Organism>,
    pub board: TradeBoard,
    pub next_id: OrganismId,
    pub manager: SelfModifyManager,
    pub economy: ParentEconomy,
    pub feed: EventFeed,
    pub metrics: Metrics,
    data_source: Box<dyn DataSource>,
    advisor: Box<dyn Advisor>,
    source_exhausted_reported: bool,
    /// Events raised between ticks, emitted with the next one.
    pending: Vec<SimEvent>,
    /// Feed output of the last tick.
    notices: Vec<SimEvent>,
}

impl World {
    #[must_use]
    pub fn with_data_source(mut self, source: Box<dyn DataSource>) -> Self {
        self.data_source = source;
        self.source_exhausted_reported = false;
        self
    }

    #[must_use]
    pub fn with_advisor(mut self, advisor: Box<dyn Advisor>) -> Self {
        self.advisor = advisor;
        self
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.organisms.len()
    }

    #[must_use]
    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.organisms
            .binary_search_by_key(&id, Organism::id)
            .ok()
            .map(|idx| &self.organisms[idx])
    }

    pub fn organism_mut(&mut self, id: OrganismId) -> Option<&mut Organism> {
        self.organisms
            .binary_search_by_key(&id, Organism::id)
            .ok()
            .map(|idx| &mut self.organisms[idx])
    }

    /// Low-noise notices produced by the last tick, summaries included.
    pub fn take_notices(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.notices)
    }

    /// Forces out whatever high-frequency events are still being counted.
    pub fn flush_summary(&mut self) -> Option<SimEvent> {
        self.feed.flush(self.tick)
    }

    /// Changes a region's regrowth at runtime. The change is reported with the
    /// next tick's events.
    pub fn modulate_region(&mut self, region: &str, modulation: RegionModulation) -> anyhow::Result<()> {
        self.grid.modulate_region(region, modulation)?;
        let mut parts = Vec::new();
        if let Some(r) = modulation.regrowth_rate {
            parts.push(format!("regrowth={r}"));
        }
        if let Some(n) = modulation.noise {
            parts.push(format!("noise={n}"));
        }
        tracing::info!(region, change = %parts.join(" "), "Region modulated");
        self.pending.push(SimEvent::new(
            self.tick,
            EventTag::Modulation,
            Vec::new(),
            format!("region {region} modulated: {}", parts.join(" ")),
        ));
        Ok(())
    }

    /// Save record of the current state.
    #[must_use]
    pub fn to_record(&self) -> WorldRecord {
        WorldRecord::new(
            self.tick,
            self.seed,
            self.config.fingerprint(),
            (self.grid.width, self.grid.height),
            self.grid.cells.iter().map(|c| c.stock).collect(),
            &self.organisms,
            self.next_id,
        )
    }
}
