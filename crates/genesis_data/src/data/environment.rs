use super::capability::DataType;
use super::entity::OrganismId;
use serde::{Deserialize, Serialize};

/// A discrete item handed over by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub data_type: DataType,
    /// Free-form origin label, e.g. a feed name.
    pub origin: String,
    /// Intrinsic energy value.
    pub energy: f64,
}

/// Where a remembered meal came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FoodSource {
    Patch { x: u16, y: u16 },
    Feed { data_type: DataType, origin: String },
}

impl FoodSource {
    /// Stable key used for novelty tracking.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            FoodSource::Patch { x, y } => format!("patch:{x}:{y}"),
            FoodSource::Feed { data_type, origin } => format!("feed:{data_type}:{origin}"),
        }
    }
}

/// How much of a source a lead still reveals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeadHint {
    /// Exact patch coordinates.
    Patch { x: u16, y: u16 },
    /// Exact feed.
    Feed { data_type: DataType, origin: String },
    /// Degraded feed lead: only the data type survives.
    DataKind { data_type: DataType },
    /// Degraded patch lead: only the region survives.
    Region,
}

/// A hint posted to a region's trade board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub poster: OrganismId,
    pub region: String,
    pub hint: LeadHint,
    /// Energy the poster got out of the source.
    pub score: f64,
    pub tick: u64,
}
