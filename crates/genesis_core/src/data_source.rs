//! External food supply.
//!
//! The engine only pulls from a [`DataSource`]; harvesting from real feeds is
//! the implementor's business. Every source here is deterministic given its
//! construction arguments.

use crate::config::FeedConfig;
use crate::nutrition::profile;
use genesis_data::{CapabilitySet, DataType, FoodItem};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Search hints relayed to the source. Derived from the asking organism only.
#[derive(Debug, Clone, Copy)]
pub struct ForageQuery<'a> {
    pub tick: u64,
    pub capabilities: &'a CapabilitySet,
    pub region: &'a str,
    /// Data type the organism or its region leans toward.
    pub preferred: Option<DataType>,
}

pub trait DataSource: Send {
    /// Next available item, if any. Never blocks.
    fn fetch_next(&mut self, query: &ForageQuery<'_>) -> Option<FoodItem>;

    /// `true` once the source will never yield again.
    fn is_exhausted(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

const TYPE_WEIGHTS: [(DataType, f32); 6] = [
    (DataType::SimpleText, 0.45),
    (DataType::StructuredJson, 0.22),
    (DataType::XmlData, 0.08),
    (DataType::Code, 0.12),
    (DataType::RealTimeStream, 0.08),
    (DataType::Binary, 0.05),
];

/// Seeded synthetic feed with fixed type weights.
///
/// A preferred type in the query doubles that type's weight.
pub struct OfflineDataSource {
    rng: ChaCha8Rng,
    config: FeedConfig,
}

impl OfflineDataSource {
    #[must_use]
    pub fn new(seed: u64, config: FeedConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    fn pick_type(&mut self, preferred: Option<DataType>) -> DataType {
        let weight = |t: DataType, w: f32| if Some(t) == preferred { w * 2.0 } else { w };
        let total: f32 = TYPE_WEIGHTS.iter().map(|(t, w)| weight(*t, *w)).sum();
        let mut roll = self.rng.gen::<f32>() * total;
        for (t, w) in TYPE_WEIGHTS {
            let w = weight(t, w);
            if roll < w {
                return t;
            }
            roll -= w;
        }
        DataType::SimpleText
    }
}

impl DataSource for OfflineDataSource {
    fn fetch_next(&mut self, query: &ForageQuery<'_>) -> Option<FoodItem> {
        if self.rng.gen::<f32>() >= self.config.supply_probability {
            return None;
        }
        let data_type = self.pick_type(query.preferred);
        Some(FoodItem {
            data_type,
            origin: format!("offline/{}", query.region),
            energy: profile(data_type).base_energy * self.config.energy_scale,
        })
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Fixed queue of items handed out in order, one per call.
#[derive(Default)]
pub struct ScriptedDataSource {
    queue: VecDeque<FoodItem>,
}

impl ScriptedDataSource {
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = FoodItem>) -> Self {
        Self {
            queue: items.into_iter().collect(),
        }
    }

    pub fn push(&mut self, item: FoodItem) {
        self.queue.push_back(item);
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DataSource for ScriptedDataSource {
    fn fetch_next(&mut self, _query: &ForageQuery<'_>) -> Option<FoodItem> {
        self.queue.pop_front()
    }

    fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Never yields anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDataSource;

impl DataSource for NullDataSource {
    fn fetch_next(&mut self, _query: &ForageQuery<'_>) -> Option<FoodItem> {
        None
    }

    fn name(&self) -> &str {
        "null"
    }
}
