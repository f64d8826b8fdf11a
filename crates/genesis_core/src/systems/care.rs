//! Parents feeding their young.
//!
//! Planned against the tick snapshot like teaching. A child is fed by its own
//! parent only, and only when both share a region.

use crate::config::CareConfig;
use crate::interaction::InteractionCommand;
use crate::snapshot::OrganismSnapshot;
use genesis_data::OrganismId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarePhase {
    /// Fed whenever it runs low.
    Dependent,
    /// Fed only in emergencies, in smaller portions.
    Learning,
    Independent,
}

#[must_use]
pub fn phase(age: u64, config: &CareConfig) -> CarePhase {
    if age < config.dependency_age {
        CarePhase::Dependent
    } else if age < config.independence_age {
        CarePhase::Learning
    } else {
        CarePhase::Independent
    }
}

/// Energy the parent should give up for this child, if the child needs it.
/// Portions halve once the child has had `care_limit` meals.
#[must_use]
pub fn portion(child: &OrganismSnapshot, config: &CareConfig) -> Option<f64> {
    let (threshold, share) = match phase(child.age, config) {
        CarePhase::Dependent => (config.need_energy, 1.0),
        CarePhase::Learning => (config.emergency_energy, 0.75),
        CarePhase::Independent => return None,
    };
    if child.energy >= threshold {
        return None;
    }
    let mut amount = config.feed_amount * share;
    if child.care_received >= config.care_limit {
        amount *= 0.5;
    }
    (amount > 0.0).then_some(amount)
}

fn find(snapshots: &[OrganismSnapshot], id: OrganismId) -> Option<&OrganismSnapshot> {
    snapshots
        .binary_search_by_key(&id, |s| s.id)
        .ok()
        .map(|idx| &snapshots[idx])
}

/// One `Feed` command per child in need, in child id order. A parent spends at
/// most its energy above `parent_reserve` across all of its children.
#[must_use]
pub fn plan_care(snapshots: &[OrganismSnapshot], config: &CareConfig) -> Vec<InteractionCommand> {
    if !config.enabled {
        return Vec::new();
    }
    let mut spare: BTreeMap<OrganismId, f64> = BTreeMap::new();
    let mut commands = Vec::new();
    for child in snapshots {
        let Some(parent_id) = child.parent_id else {
            continue;
        };
        let Some(cost) = portion(child, config) else {
            continue;
        };
        let Some(parent) = find(snapshots, parent_id) else {
            continue;
        };
        if parent.region != child.region {
            continue;
        }
        let budget = spare
            .entry(parent_id)
            .or_insert(parent.energy - config.parent_reserve);
        if *budget < cost {
            continue;
        }
        *budget -= cost;
        commands.push(InteractionCommand::Feed {
            parent: parent_id,
            child: child.id,
            cost,
            amount: cost * config.transfer_efficiency,
        });
    }
    commands
}
