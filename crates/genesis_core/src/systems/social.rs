//! Teaching and trade planning.
//!
//! Everything here reads the tick snapshot only and returns
//! [`InteractionCommand`]s. Nothing is applied until the tick boundary.

use super::stream;
use crate::capability::{lead_degrade_factor, teach_cost_factor};
use crate::config::SocialConfig;
use crate::interaction::InteractionCommand;
use crate::rng::organism_rng;
use crate::snapshot::{by_region, OrganismSnapshot};
use genesis_data::{FoodSource, Lead, LeadHint, MemoryEntry, Organism, OrganismId};
use rand::seq::SliceRandom;
use rand::Rng;

/// Copy of `entry` as a student would receive it.
#[must_use]
pub fn faded(entry: &MemoryEntry, teacher: OrganismId, fade: f32, tick: u64) -> MemoryEntry {
    MemoryEntry {
        tick,
        source: entry.source.clone(),
        outcome: entry.outcome,
        fidelity: (entry.fidelity * fade).clamp(0.0, 1.0),
        taught_by: Some(teacher),
    }
}

#[must_use]
pub fn teach_probability(snap: &OrganismSnapshot, config: &SocialConfig) -> f32 {
    let threshold = snap.behavior.teach_threshold.max(f32::EPSILON);
    (config.teach_drive_gain * snap.drives.teach / threshold).clamp(0.0, config.max_teach_probability)
}

#[must_use]
pub fn trade_probability(snap: &OrganismSnapshot, config: &SocialConfig) -> f32 {
    let threshold = snap.behavior.trade_threshold.max(f32::EPSILON);
    (config.trade_drive_gain * snap.drives.trade / threshold).clamp(0.0, 1.0)
}

fn plan_teaching<R: Rng>(
    teacher: &OrganismSnapshot,
    peers: &[usize],
    snapshots: &[OrganismSnapshot],
    config: &SocialConfig,
    tick: u64,
    rng: &mut R,
) -> Option<InteractionCommand> {
    if teacher.insights < config.teach_insight_threshold || teacher.energy < config.teach_min_energy {
        return None;
    }
    let best = teacher.best_memory.as_ref()?;
    if rng.gen::<f32>() >= teach_probability(teacher, config) {
        return None;
    }
    let students: Vec<OrganismId> = peers
        .iter()
        .map(|&i| &snapshots[i])
        .filter(|s| s.id != teacher.id && !s.imitating)
        .map(|s| s.id)
        .collect();
    let student = *students.choose(rng)?;
    Some(InteractionCommand::Teach {
        teacher: teacher.id,
        student,
        entry: faded(best, teacher.id, config.fade_factor, tick),
        cost: config.teach_cost * teach_cost_factor(&teacher.capabilities),
    })
}

/// Lead for `entry`, possibly with its location blurred.
pub fn lead_for<R: Rng>(
    snap: &OrganismSnapshot,
    entry: &MemoryEntry,
    config: &SocialConfig,
    tick: u64,
    rng: &mut R,
) -> Lead {
    let degrade = config.lead_degrade_probability * lead_degrade_factor(&snap.capabilities);
    let blurred = rng.gen::<f32>() < degrade;
    let hint = match (&entry.source, blurred) {
        (FoodSource::Patch { .. }, true) => LeadHint::Region,
        (FoodSource::Patch { x, y }, false) => LeadHint::Patch { x: *x, y: *y },
        (FoodSource::Feed { data_type, .. }, true) => LeadHint::DataKind {
            data_type: *data_type,
        },
        (FoodSource::Feed { data_type, origin }, false) => LeadHint::Feed {
            data_type: *data_type,
            origin: origin.clone(),
        },
    };
    Lead {
        poster: snap.id,
        region: snap.region.clone(),
        hint,
        score: entry.outcome * f64::from(entry.fidelity),
        tick,
    }
}

fn plan_trade<R: Rng>(
    snap: &OrganismSnapshot,
    config: &SocialConfig,
    tick: u64,
    rng: &mut R,
) -> Option<InteractionCommand> {
    let best = snap.best_memory.as_ref()?;
    if best.outcome < config.trade_min_outcome {
        return None;
    }
    if rng.gen::<f32>() >= trade_probability(snap, config) {
        return None;
    }
    Some(InteractionCommand::PostLead(lead_for(snap, best, config, tick, rng)))
}

/// Teaching and trade commands for the whole population, region by region in
/// id order.
#[must_use]
pub fn plan_interactions(
    snapshots: &[OrganismSnapshot],
    config: &SocialConfig,
    tick: u64,
    tick_seed: u64,
) -> Vec<InteractionCommand> {
    let mut commands = Vec::new();
    for members in by_region(snapshots).values() {
        for &idx in members {
            let snap = &snapshots[idx];
            let mut rng = organism_rng(tick_seed, snap.id, stream::SOCIAL);
            if let Some(cmd) = plan_teaching(snap, members, snapshots, config, tick, &mut rng) {
                commands.push(cmd);
            }
            if let Some(cmd) = plan_trade(snap, config, tick, &mut rng) {
                commands.push(cmd);
            }
        }
    }
    commands
}

/// Free lessons from an organism that just died to every survivor sharing
/// its region.
#[must_use]
pub fn diffuse_knowledge(
    dead: &Organism,
    survivors: &[Organism],
    config: &SocialConfig,
    tick: u64,
) -> Vec<InteractionCommand> {
    if !config.diffuse_on_death {
        return Vec::new();
    }
    let Some(best) = dead.memory.best_success() else {
        return Vec::new();
    };
    survivors
        .iter()
        .filter(|s| s.is_alive() && s.id() != dead.id() && s.position.region == dead.position.region)
        .map(|s| InteractionCommand::Teach {
            teacher: dead.id(),
            student: s.id(),
            entry: faded(best, dead.id(), config.fade_factor, tick),
            cost: 0.0,
        })
        .collect()
}
