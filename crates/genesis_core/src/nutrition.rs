//! Feed digestion.
//!
//! A feed item's energy is scaled by the organism's capabilities, by how
//! scarce its region is, by the variety and toxin load of its recent diet and
//! by its expertise in the item's data type. Every digested item also leaves
//! a knowledge item behind.

use crate::capability::feed_bonus;
use crate::config::NutritionConfig;
use genesis_data::{
    Capability, CapabilitySet, DataType, Diet, FoodItem, KnowledgeBase, KnowledgeItem, Organism,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutritionProfile {
    pub base_energy: f64,
    /// Added to the toxin load per meal, before expertise.
    pub toxicity: f64,
    /// Usefulness of the knowledge item a meal leaves, in `[0, 1]`.
    pub usefulness: f32,
}

#[must_use]
pub fn profile(data_type: DataType) -> NutritionProfile {
    let (base_energy, toxicity, usefulness) = match data_type {
        DataType::SimpleText => (5.0, 0.0, 0.5),
        DataType::StructuredJson => (12.0, 0.0, 0.6),
        DataType::XmlData => (10.0, 0.0, 0.55),
        DataType::Code => (25.0, 0.0, 0.8),
        DataType::RealTimeStream => (15.0, 0.1, 0.7),
        DataType::Binary => (30.0, 0.2, 0.6),
    };
    NutritionProfile {
        base_energy,
        toxicity,
        usefulness,
    }
}

/// Multiplier in `[min_yield, 1]`. Organisms with more capabilities lose less
/// to competition when their region runs low.
#[must_use]
pub fn scarcity_yield(scarcity: f64, capabilities: &CapabilitySet, config: &NutritionConfig) -> f64 {
    let advantage = capabilities.len() as f64 / Capability::ALL.len() as f64;
    let pressure = scarcity.clamp(0.0, 1.0) * config.scarcity_weight * (1.0 - advantage);
    (1.0 - pressure).clamp(config.min_yield, 1.0)
}

/// `0.7 + 0.3 * variety - min(0.3, 0.1 * toxins)`, at least 0.3. An organism
/// that has not eaten yet digests at full efficiency.
#[must_use]
pub fn diet_efficiency(diet: &Diet) -> f64 {
    if diet.recent.is_empty() {
        return 1.0;
    }
    let variety = diet.variety() as f64 / DataType::ALL.len() as f64;
    let penalty = (diet.toxins * 0.1).min(0.3);
    (0.7 + 0.3 * variety - penalty).max(0.3)
}

pub fn record_meal(diet: &mut Diet, data_type: DataType, toxins: f64, config: &NutritionConfig) {
    while diet.recent.len() >= config.diet_window.max(1) {
        diet.recent.pop_front();
    }
    diet.recent.push_back(data_type);
    diet.meals += 1;
    diet.toxins = (diet.toxins + toxins - config.detox).max(0.0);
}

/// Files a knowledge item and raises expertise in its type, evicting the
/// least useful item (oldest on ties) when full. Returns the new expertise.
pub fn learn(kb: &mut KnowledgeBase, item: &FoodItem, tick: u64, config: &NutritionConfig) -> f32 {
    let usefulness = profile(item.data_type).usefulness;
    kb.items.push(KnowledgeItem {
        tick,
        data_type: item.data_type,
        origin: item.origin.clone(),
        usefulness,
    });
    while kb.items.len() > config.knowledge_capacity {
        let weakest = kb
            .items
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.usefulness.total_cmp(&b.usefulness).then(a.tick.cmp(&b.tick)))
            .map(|(idx, _)| idx);
        match weakest {
            Some(idx) => {
                kb.items.remove(idx);
            }
            None => break,
        }
    }
    let slot = kb.expertise.entry(item.data_type).or_insert(0.0);
    *slot = (*slot + usefulness * config.expertise_rate).min(1.0);
    *slot
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Digestion {
    pub gain: f64,
    pub toxins: f64,
    /// Expertise in the item's type after the meal.
    pub expertise: f32,
}

/// Eats an item the organism is able to digest. Energy is credited here; the
/// meal and the lesson are recorded.
pub fn digest(
    organism: &mut Organism,
    item: &FoodItem,
    scarcity: f64,
    tick: u64,
    config: &NutritionConfig,
) -> Digestion {
    let before = organism.knowledge.expertise_in(item.data_type);
    let gain = item.energy.max(0.0)
        * feed_bonus(&organism.capabilities)
        * scarcity_yield(scarcity, &organism.capabilities, config)
        * diet_efficiency(&organism.diet)
        * (1.0 + config.expertise_bonus * f64::from(before));
    let toxins = profile(item.data_type).toxicity * f64::from(1.0 - before);
    organism.vitals.energy += gain;
    record_meal(&mut organism.diet, item.data_type, toxins, config);
    let expertise = learn(&mut organism.knowledge, item, tick, config);
    Digestion {
        gain,
        toxins,
        expertise,
    }
}
