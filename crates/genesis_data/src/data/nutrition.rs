use super::capability::DataType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Recent meals and accumulated toxins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diet {
    /// Data types of the latest feed meals, oldest first.
    pub recent: VecDeque<DataType>,
    pub toxins: f64,
    pub meals: u64,
}

impl Diet {
    /// Number of distinct types among the recent meals.
    #[must_use]
    pub fn variety(&self) -> usize {
        let mut seen = [false; DataType::ALL.len()];
        for t in &self.recent {
            if let Some(idx) = DataType::ALL.iter().position(|x| x == t) {
                seen[idx] = true;
            }
        }
        seen.iter().filter(|s| **s).count()
    }
}

/// Something an organism took away from a digested feed item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub tick: u64,
    pub data_type: DataType,
    pub origin: String,
    /// In `[0, 1]`.
    pub usefulness: f32,
}

/// Bounded store of knowledge items plus per-type expertise in `[0, 1]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub items: Vec<KnowledgeItem>,
    pub expertise: BTreeMap<DataType, f32>,
}

impl KnowledgeBase {
    #[must_use]
    pub fn expertise_in(&self, data_type: DataType) -> f32 {
        self.expertise.get(&data_type).copied().unwrap_or(0.0)
    }

    /// Type with the highest expertise, earliest type wins on ties.
    #[must_use]
    pub fn strongest(&self) -> Option<(DataType, f32)> {
        self.expertise
            .iter()
            .fold(None, |best: Option<(DataType, f32)>, (t, e)| match best {
                Some((_, b)) if b >= *e => best,
                _ => Some((*t, *e)),
            })
    }
}
