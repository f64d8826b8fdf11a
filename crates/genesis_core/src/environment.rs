//! Resource patch grid.
//!
//! Each cell holds a stock `S` in `[0, K]`. Regrowth is logistic with additive
//! noise and is resolved per cell from the parameters of the region the cell
//! falls in. Depletion and regrowth are the only stock mutators.

use crate::config::{EnvironmentConfig, RegionOverride};
use genesis_data::DataType;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Label of cells outside every configured region.
pub const DEFAULT_REGION: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResourceState {
    Abundant,
    Strained,
    Scarce,
    Famine,
}

impl ResourceState {
    #[must_use]
    pub fn from_scarcity(scarcity: f64) -> Self {
        if scarcity < 0.4 {
            ResourceState::Abundant
        } else if scarcity < 0.7 {
            ResourceState::Strained
        } else if scarcity < 0.9 {
            ResourceState::Scarce
        } else {
            ResourceState::Famine
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ResourceState::Abundant => "abundant",
            ResourceState::Strained => "strained",
            ResourceState::Scarce => "scarce",
            ResourceState::Famine => "famine",
        }
    }
}

/// Effective (K, r, noise) of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchParams {
    pub capacity: f64,
    pub regrowth_rate: f64,
    pub noise: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub stock: f64,
    /// Set while the cell sits at zero; cleared once it regrows.
    pub depleted: bool,
}

/// Emitted once each time a cell's stock crosses into zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DepletionNotice {
    pub x: u16,
    pub y: u16,
    pub region: String,
}

/// Runtime change to a region's regrowth parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionModulation {
    pub regrowth_rate: Option<f64>,
    pub noise: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchGrid {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Patch>,
    base: PatchParams,
    regions: Vec<RegionOverride>,
    #[serde(skip)]
    pending: Vec<DepletionNotice>,
}

/// Logistic step with noise, clamped to `[0, K]`.
#[must_use]
pub fn regrow_value(stock: f64, params: &PatchParams, noise: f64) -> f64 {
    let k = params.capacity;
    let growth = params.regrowth_rate * stock * (1.0 - stock / k);
    (stock + growth + noise).clamp(0.0, k)
}

impl PatchGrid {
    #[must_use]
    pub fn new(config: &EnvironmentConfig, width: u16, height: u16) -> Self {
        let base = PatchParams {
            capacity: config.capacity,
            regrowth_rate: config.regrowth_rate,
            noise: config.noise,
        };
        let mut grid = Self {
            width,
            height,
            cells: Vec::with_capacity(width as usize * height as usize),
            base,
            regions: config.regions.clone(),
            pending: Vec::new(),
        };
        for y in 0..height {
            for x in 0..width {
                let k = grid.params_at(x, y).capacity;
                grid.cells.push(Patch {
                    stock: k * config.initial_stock_fraction,
                    depleted: false,
                });
            }
        }
        grid
    }

    #[must_use]
    pub fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    fn region_at(&self, x: u16, y: u16) -> Option<&RegionOverride> {
        self.regions.iter().find(|r| r.contains(x, y))
    }

    #[must_use]
    pub fn params_at(&self, x: u16, y: u16) -> PatchParams {
        match self.region_at(x, y) {
            Some(r) => PatchParams {
                capacity: r.capacity.unwrap_or(self.base.capacity),
                regrowth_rate: r.regrowth_rate.unwrap_or(self.base.regrowth_rate),
                noise: r.noise.unwrap_or(self.base.noise),
            },
            None => self.base,
        }
    }

    #[must_use]
    pub fn region_of(&self, x: u16, y: u16) -> &str {
        self.region_at(x, y)
            .map_or(DEFAULT_REGION, |r| r.name.as_str())
    }

    /// Every region label in a stable order, default first.
    #[must_use]
    pub fn region_names(&self) -> Vec<String> {
        let mut names = vec![DEFAULT_REGION.to_string()];
        for r in &self.regions {
            if !names.contains(&r.name) {
                names.push(r.name.clone());
            }
        }
        names
    }

    #[must_use]
    pub fn preferred_data(&self, region: &str) -> Option<DataType> {
        self.regions
            .iter()
            .find(|r| r.name == region)
            .and_then(|r| r.preferred_data)
    }

    #[must_use]
    pub fn stock(&self, x: u16, y: u16) -> f64 {
        self.cells[self.index(x, y)].stock
    }

    /// Overwrites a cell's stock, clamped to its capacity. Used when restoring
    /// saved worlds and in scenario setup.
    pub fn set_stock(&mut self, x: u16, y: u16, stock: f64) {
        let k = self.params_at(x, y).capacity;
        let idx = self.index(x, y);
        let cell = &mut self.cells[idx];
        cell.stock = stock.clamp(0.0, k);
        cell.depleted = cell.stock <= 0.0;
    }

    /// One regrowth pass. Each cell reads only its own pre-tick stock.
    pub fn regrow<R: Rng>(&mut self, rng: &mut R) {
        for y in 0..self.height {
            for x in 0..self.width {
                let params = self.params_at(x, y);
                let noise = if params.noise > 0.0 {
                    rng.gen_range(-params.noise..=params.noise)
                } else {
                    0.0
                };
                let idx = self.index(x, y);
                let next = regrow_value(self.cells[idx].stock, &params, noise);
                self.cells[idx].stock = next;
                self.track_depletion(x, y);
            }
        }
    }

    /// Consumes `min(requested, S)` and returns the amount taken.
    pub fn deplete(&mut self, x: u16, y: u16, requested: f64) -> f64 {
        let idx = self.index(x, y);
        let taken = requested.max(0.0).min(self.cells[idx].stock);
        self.cells[idx].stock -= taken;
        self.track_depletion(x, y);
        taken
    }

    fn track_depletion(&mut self, x: u16, y: u16) {
        let idx = self.index(x, y);
        let cell = &mut self.cells[idx];
        if cell.stock <= 0.0 {
            cell.stock = 0.0;
            if !cell.depleted {
                cell.depleted = true;
                let region = self.region_of(x, y).to_string();
                self.pending.push(DepletionNotice { x, y, region });
            }
        } else {
            cell.depleted = false;
        }
    }

    pub fn drain_notices(&mut self) -> Vec<DepletionNotice> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn total_stock(&self) -> f64 {
        self.cells.iter().map(|c| c.stock).sum()
    }

    fn cells_of<'a>(&'a self, region: &'a str) -> impl Iterator<Item = (u16, u16)> + 'a {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(move |(x, y)| self.region_of(*x, *y) == region)
    }

    /// `1 - stock / capacity` over the whole grid.
    #[must_use]
    pub fn scarcity(&self) -> f64 {
        let (mut stock, mut cap) = (0.0, 0.0);
        for y in 0..self.height {
            for x in 0..self.width {
                stock += self.stock(x, y);
                cap += self.params_at(x, y).capacity;
            }
        }
        if cap <= 0.0 {
            return 1.0;
        }
        (1.0 - stock / cap).clamp(0.0, 1.0)
    }

    /// Scarcity restricted to one region; unknown regions read as fully scarce.
    #[must_use]
    pub fn region_scarcity(&self, region: &str) -> f64 {
        let (mut stock, mut cap) = (0.0, 0.0);
        for (x, y) in self.cells_of(region) {
            stock += self.stock(x, y);
            cap += self.params_at(x, y).capacity;
        }
        if cap <= 0.0 {
            return 1.0;
        }
        (1.0 - stock / cap).clamp(0.0, 1.0)
    }

    /// Richest cell of a region, ties broken by scan order.
    #[must_use]
    pub fn richest_in_region(&self, region: &str) -> Option<(u16, u16)> {
        self.cells_of(region)
            .fold(None, |best: Option<(u16, u16, f64)>, (x, y)| {
                let s = self.stock(x, y);
                match best {
                    Some((_, _, b)) if b >= s => best,
                    _ => Some((x, y, s)),
                }
            })
            .map(|(x, y, _)| (x, y))
    }

    /// Richest cell within a Chebyshev radius, ties broken by scan order.
    #[must_use]
    pub fn richest_near(&self, x: u16, y: u16, radius: u16) -> (u16, u16) {
        let r = i32::from(radius);
        let mut best = (x, y, self.stock(x, y));
        for dy in -r..=r {
            for dx in -r..=r {
                let (nx, ny) = (i32::from(x) + dx, i32::from(y) + dy);
                if !self.in_bounds(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as u16, ny as u16);
                let s = self.stock(nx, ny);
                if s > best.2 {
                    best = (nx, ny, s);
                }
            }
        }
        (best.0, best.1)
    }

    /// Neighbouring in-bounds cell offset by `(dx, dy)`, clamped to the grid.
    #[must_use]
    pub fn step_towards(&self, x: u16, y: u16, dx: i32, dy: i32) -> (u16, u16) {
        let nx = (i32::from(x) + dx).clamp(0, i32::from(self.width) - 1);
        let ny = (i32::from(y) + dy).clamp(0, i32::from(self.height) - 1);
        (nx as u16, ny as u16)
    }

    /// Changes regrowth parameters of a region at runtime. Capacity stays fixed.
    pub fn modulate_region(
        &mut self,
        region: &str,
        modulation: RegionModulation,
    ) -> anyhow::Result<()> {
        if let Some(r) = modulation.regrowth_rate {
            anyhow::ensure!(r >= 0.0, "Regrowth rate must be non-negative");
        }
        if let Some(n) = modulation.noise {
            anyhow::ensure!(n >= 0.0, "Noise must be non-negative");
        }
        if region == DEFAULT_REGION {
            if let Some(r) = modulation.regrowth_rate {
                self.base.regrowth_rate = r;
            }
            if let Some(n) = modulation.noise {
                self.base.noise = n;
            }
            return Ok(());
        }
        let mut found = false;
        for r in self.regions.iter_mut().filter(|r| r.name == region) {
            found = true;
            if modulation.regrowth_rate.is_some() {
                r.regrowth_rate = modulation.regrowth_rate;
            }
            if modulation.noise.is_some() {
                r.noise = modulation.noise;
            }
        }
        anyhow::ensure!(found, "Unknown region `{region}`");
        Ok(())
    }
}
