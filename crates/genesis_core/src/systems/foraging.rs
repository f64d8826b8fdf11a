//! Decide and act.
//!
//! [`decide`] is a pure function of the organism and the tick snapshot, so
//! the world runs it in parallel. [`act`] mutates the grid and the data source
//! and therefore runs sequentially in id order.

use super::perception::{sense, SenseContext};
use super::stream;
use crate::brain::{drives_from_outputs, BrainLogic, GenomeError};
use crate::capability::strategy_adjustments;
use crate::config::AppConfig;
use crate::data_source::{DataSource, ForageQuery};
use crate::environment::PatchGrid;
use crate::interaction::{observation, record_observation, InteractionCommand};
use crate::nutrition;
use crate::rng::organism_rng;
use genesis_data::{
    Capability, DataType, Drives, EventTag, FailureKind, FoodSource, ForagingStrategy, LeadHint,
    MemoryEntry, ObservationKind, Organism, OrganismId, SimEvent,
};
use rand::Rng;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub region: String,
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForagePlan {
    pub strategy: ForagingStrategy,
    pub target: (u16, u16),
    pub migration: Option<Migration>,
    pub preferred: Option<DataType>,
    /// Poster of the lead being followed.
    pub lead: Option<OrganismId>,
    /// Peer whose shared source overrides the strategy this tick.
    pub imitating: Option<OrganismId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub id: OrganismId,
    pub inputs: Vec<f32>,
    pub outputs: Vec<f32>,
    pub drives: Drives,
    pub plan: ForagePlan,
}

/// What the strategy roll draws on besides the brain's drives.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrategyOptions {
    pub has_memory: bool,
    pub has_lead: bool,
    /// Scarcity of the organism's region, in `[0, 1]`.
    pub scarcity: f64,
    /// Expertise in the data type of the remembered source, in `[0, 1]`.
    pub expertise: f32,
}

/// Samples a strategy in proportion to its weight. Memory-first needs a
/// successful memory and lead-following needs a visible lead. Scarcity moves
/// weight from greedy to exploring and following; expertise backs memory.
pub fn choose_strategy<R: Rng>(
    organism: &Organism,
    drives: &Drives,
    options: &StrategyOptions,
    rng: &mut R,
) -> ForagingStrategy {
    let adj = strategy_adjustments(&organism.capabilities);
    let behavior = &organism.intel.behavior;
    let scarcity = options.scarcity.clamp(0.0, 1.0) as f32;
    let weight = |s: ForagingStrategy| -> f32 {
        let base = match s {
            ForagingStrategy::Greedy => 0.4 + 0.3 * drives.risk + adj.greedy - 0.4 * scarcity,
            ForagingStrategy::Explorer => {
                behavior.exploration_bias + 0.5 * drives.explore + adj.explore + 0.4 * scarcity
            }
            ForagingStrategy::MemoryFirst if options.has_memory => {
                0.2 + 0.3 * (1.0 - drives.explore) + adj.memory_first + 0.5 * options.expertise
            }
            ForagingStrategy::LeadFollower if options.has_lead => {
                0.1 + 0.4 * drives.social + adj.lead + 0.3 * scarcity
            }
            _ => return 0.0,
        };
        let bonus = if s == behavior.strategy { 0.3 } else { 0.0 };
        (base + bonus).max(0.0)
    };

    let weights: Vec<(ForagingStrategy, f32)> = ForagingStrategy::ALL
        .into_iter()
        .map(|s| (s, weight(s)))
        .collect();
    let total: f32 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return ForagingStrategy::Greedy;
    }
    let mut roll = rng.gen::<f32>() * total;
    for (s, w) in &weights {
        if roll < *w {
            return *s;
        }
        roll -= w;
    }
    ForagingStrategy::Greedy
}

/// Best other region when the migrate drive, net of conservation, clears the
/// organism's threshold and the gain outweighs its risk aversion.
#[must_use]
pub fn plan_migration(organism: &Organism, drives: &Drives, grid: &PatchGrid) -> Option<Migration> {
    if !organism.capabilities.contains(Capability::Move) {
        return None;
    }
    let behavior = &organism.intel.behavior;
    let pressure = drives.migrate - drives.conserve * behavior.conserve_bias;
    if pressure <= behavior.migrate_threshold {
        return None;
    }
    let score = |region: &str| -> f64 {
        let structured = match grid.preferred_data(region) {
            Some(t) if t.is_structured() => 1.0,
            _ => 0.0,
        };
        (1.0 - grid.region_scarcity(region)) + 0.5 * f64::from(drives.prefer_structured) * structured
    };
    let here = organism.position.region.as_str();
    let required_gain = 0.1 * f64::from(1.0 - drives.risk);
    let current = score(here);

    let mut best: Option<(String, f64)> = None;
    for name in grid.region_names() {
        if name == here {
            continue;
        }
        let s = score(&name);
        if s <= current + required_gain {
            continue;
        }
        if best.as_ref().map_or(true, |(_, b)| s > *b) {
            best = Some((name, s));
        }
    }
    let (region, _) = best?;
    let (x, y) = grid.richest_in_region(&region)?;
    Some(Migration { region, x, y })
}

fn approach(grid: &PatchGrid, from: (u16, u16), to: (u16, u16), radius: u16) -> (u16, u16) {
    let r = i32::from(radius.max(1));
    let dx = (i32::from(to.0) - i32::from(from.0)).clamp(-r, r);
    let dy = (i32::from(to.1) - i32::from(from.1)).clamp(-r, r);
    grid.step_towards(from.0, from.1, dx, dy)
}

/// Sense, think, and pick a plan. Touches nothing outside the return value.
pub fn decide(
    organism: &Organism,
    ctx: &SenseContext<'_>,
    tick_seed: u64,
) -> Result<Decision, GenomeError> {
    let inputs = sense(organism, ctx);
    let outputs = organism.intel.genome.forward(&inputs)?;
    let drives = drives_from_outputs(&organism.intel.genome, &outputs);
    let plan = plan_forage(organism, &drives, ctx, tick_seed);
    Ok(Decision {
        id: organism.id(),
        inputs,
        outputs,
        drives,
        plan,
    })
}

/// Expertise at which an organism starts asking for its specialty.
const EXPERT_PREFERENCE: f32 = 0.5;

fn plan_forage(
    organism: &Organism,
    drives: &Drives,
    ctx: &SenseContext<'_>,
    tick_seed: u64,
) -> ForagePlan {
    let mut rng = organism_rng(tick_seed, organism.id(), stream::DECIDE);
    let grid = ctx.grid;
    let pos = &organism.position;
    let here = (pos.x, pos.y);
    let radius = ctx.config.environment.sense_radius;
    let can_move = organism.capabilities.contains(Capability::Move);

    let region_pref = grid.preferred_data(&pos.region);
    let drive_pref = (drives.prefer_structured > 0.6).then_some(DataType::StructuredJson);
    let expert_pref = organism
        .knowledge
        .strongest()
        .and_then(|(t, e)| (e >= EXPERT_PREFERENCE).then_some(t));
    let mut plan = ForagePlan {
        strategy: organism.intel.behavior.strategy,
        target: here,
        migration: None,
        preferred: organism
            .intel
            .food_preference
            .or(drive_pref)
            .or(expert_pref)
            .or(region_pref),
        lead: None,
        imitating: None,
    };
    if !can_move {
        return plan;
    }

    if let Some(migration) = plan_migration(organism, drives, grid) {
        plan.target = (migration.x, migration.y);
        plan.migration = Some(migration);
        return plan;
    }

    if let Some(bias) = &organism.social.imitation {
        if rng.gen::<f32>() < bias.current() {
            plan.imitating = Some(bias.peer);
            match &bias.source {
                FoodSource::Patch { x, y } => plan.target = approach(grid, here, (*x, *y), radius),
                FoodSource::Feed { data_type, .. } => {
                    plan.preferred = Some(*data_type);
                    plan.target = grid.richest_near(pos.x, pos.y, radius);
                }
            }
            return plan;
        }
    }

    let memory = organism.memory.best_success();
    let lead = ctx.board.best_for(&pos.region, organism.id());
    let options = StrategyOptions {
        has_memory: memory.is_some(),
        has_lead: lead.is_some(),
        scarcity: grid.region_scarcity(&pos.region),
        expertise: match memory.map(|m| &m.source) {
            Some(FoodSource::Feed { data_type, .. }) => organism.knowledge.expertise_in(*data_type),
            _ => 0.0,
        },
    };
    plan.strategy = choose_strategy(organism, drives, &options, &mut rng);
    match plan.strategy {
        ForagingStrategy::Greedy => plan.target = grid.richest_near(pos.x, pos.y, radius),
        ForagingStrategy::Explorer => {
            let dx = rng.gen_range(-1..=1);
            let dy = rng.gen_range(-1..=1);
            plan.target = grid.step_towards(pos.x, pos.y, dx, dy);
        }
        ForagingStrategy::MemoryFirst => match memory.map(|m| &m.source) {
            Some(FoodSource::Patch { x, y }) => plan.target = approach(grid, here, (*x, *y), radius),
            Some(FoodSource::Feed { data_type, .. }) => plan.preferred = Some(*data_type),
            None => {}
        },
        ForagingStrategy::LeadFollower => {
            if let Some(lead) = lead {
                plan.lead = Some(lead.poster);
                match &lead.hint {
                    LeadHint::Patch { x, y } => plan.target = approach(grid, here, (*x, *y), radius),
                    LeadHint::Region => {
                        if lead.region != pos.region {
                            if let Some((x, y)) = grid.richest_in_region(&lead.region) {
                                plan.target = (x, y);
                                plan.migration = Some(Migration {
                                    region: lead.region.clone(),
                                    x,
                                    y,
                                });
                            }
                        } else {
                            plan.target = grid.richest_near(pos.x, pos.y, radius);
                        }
                    }
                    LeadHint::Feed { data_type, .. } | LeadHint::DataKind { data_type } => {
                        plan.preferred = Some(*data_type);
                        plan.target = grid.richest_near(pos.x, pos.y, radius);
                    }
                }
            }
        }
    }
    plan
}

/// Decides for the whole population in parallel. Output order follows
/// `organisms`; a genome error is kept per organism.
pub fn decide_all(
    organisms: &[Organism],
    ctx: &SenseContext<'_>,
    tick_seed: u64,
) -> Vec<Result<Decision, GenomeError>> {
    organisms
        .par_iter()
        .map(|org| decide(org, ctx, tick_seed))
        .collect()
}

/// What one act pass did to an organism.
#[derive(Debug, Default)]
pub struct ForageOutcome {
    pub gained: f64,
    /// Energy spent on movement.
    pub spent: f64,
    pub success: bool,
    pub failures: Vec<FailureKind>,
    pub new_sources: u32,
    pub commands: Vec<InteractionCommand>,
    pub events: Vec<SimEvent>,
    pub source_exhausted: bool,
}

pub struct ForageContext<'a> {
    pub grid: &'a mut PatchGrid,
    pub source: &'a mut dyn DataSource,
    pub config: &'a AppConfig,
    pub tick: u64,
}

fn remember(organism: &mut Organism, source: FoodSource, outcome: f64, tick: u64) -> bool {
    let novel = outcome > 0.0 && organism.psyche.known_sources.insert(source.key());
    organism.memory.push(MemoryEntry {
        tick,
        source,
        outcome,
        fidelity: 1.0,
        taught_by: None,
    });
    novel
}

/// Moves, bites, and pulls one feed item. Never fails: misses are reported as
/// failures for the frustration counters.
pub fn act(organism: &mut Organism, plan: &ForagePlan, ctx: &mut ForageContext<'_>) -> ForageOutcome {
    let mut out = ForageOutcome::default();
    let tick = ctx.tick;
    let id = organism.id();

    if let Some(m) = &plan.migration {
        let cost = ctx.config.metabolism.migrate_cost;
        organism.vitals.energy = (organism.vitals.energy - cost).max(0.0);
        out.spent = cost;
        out.events.push(SimEvent::new(
            tick,
            EventTag::Migration,
            vec![id],
            format!("#{id} migrated {} -> {}", organism.position.region, m.region),
        ));
    }
    let (x, y) = plan.target;
    organism.position.x = x;
    organism.position.y = y;
    organism.position.region = ctx.grid.region_of(x, y).to_string();

    let taken = ctx.grid.deplete(x, y, ctx.config.environment.bite);
    organism.vitals.energy += taken;
    out.gained += taken;
    if remember(organism, FoodSource::Patch { x, y }, taken, tick) {
        out.new_sources += 1;
    }

    let query = ForageQuery {
        tick,
        capabilities: &organism.capabilities,
        region: &organism.position.region,
        preferred: plan.preferred,
    };
    match ctx.source.fetch_next(&query) {
        Some(item) => {
            let source = FoodSource::Feed {
                data_type: item.data_type,
                origin: item.origin.clone(),
            };
            if organism
                .capabilities
                .contains(item.data_type.required_capability())
            {
                let scarcity = ctx.grid.region_scarcity(&organism.position.region);
                let meal = nutrition::digest(organism, &item, scarcity, tick, &ctx.config.nutrition);
                let gain = meal.gain;
                out.gained += gain;
                if remember(organism, source, gain, tick) {
                    out.new_sources += 1;
                }
            } else {
                remember(organism, source, 0.0, tick);
                out.failures.push(FailureKind::Indigestible);
            }
        }
        None => out.source_exhausted = ctx.source.is_exhausted(),
    }

    out.success = out.gained > 0.0;
    if !out.success && !out.failures.contains(&FailureKind::Indigestible) {
        out.failures.push(FailureKind::EmptyForage);
    }
    organism.psyche.insights += out.new_sources;

    let social = &ctx.config.social;
    let delta = if out.success {
        social.trust_step
    } else {
        -social.trust_step
    };
    organism.social.followed_lead = plan.lead;
    for (peer, kind) in [
        (plan.lead, ObservationKind::LeadUsed),
        (plan.imitating, ObservationKind::Learned),
    ] {
        if let Some(peer) = peer {
            out.commands.push(InteractionCommand::AdjustTrust {
                truster: id,
                peer,
                delta,
            });
            if kind == ObservationKind::LeadUsed {
                record_observation(
                    &mut organism.social,
                    observation(tick, peer, kind),
                    social.observation_capacity,
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TradeBoard;
    use crate::data_source::{NullDataSource, ScriptedDataSource};
    use crate::lifecycle::create_organism_with_rng;
    use genesis_data::{FoodItem, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeMap;

    fn setup(width: u16, height: u16) -> (AppConfig, PatchGrid, Organism) {
        let mut config = AppConfig::default();
        config.environment.noise = 0.0;
        let grid = PatchGrid::new(&config.environment, width, height);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let pos = Position {
            x: 0,
            y: 0,
            region: grid.region_of(0, 0).to_string(),
        };
        let org = create_organism_with_rng(1, pos, 0, &config, &mut rng);
        (config, grid, org)
    }

    fn stay(org: &Organism) -> ForagePlan {
        ForagePlan {
            strategy: ForagingStrategy::Greedy,
            target: (org.position.x, org.position.y),
            migration: None,
            preferred: None,
            lead: None,
            imitating: None,
        }
    }

    #[test]
    fn test_bite_moves_energy_from_patch() {
        let (config, mut grid, mut org) = setup(1, 1);
        grid.set_stock(0, 0, 50.0);
        org.vitals.energy = 40.0;
        let plan = stay(&org);
        let mut source = NullDataSource;
        let mut ctx = ForageContext {
            grid: &mut grid,
            source: &mut source,
            config: &config,
            tick: 1,
        };
        let out = act(&mut org, &plan, &mut ctx);
        assert!(out.success);
        assert_eq!(out.gained, 10.0);
        assert_eq!(org.vitals.energy, 50.0);
        assert_eq!(grid.stock(0, 0), 40.0);
        assert_eq!(out.new_sources, 1);
        assert_eq!(org.psyche.insights, 1);
    }

    #[test]
    fn test_indigestible_feed_is_a_failure() {
        let (config, mut grid, mut org) = setup(1, 1);
        grid.set_stock(0, 0, 0.0);
        let plan = stay(&org);
        let mut source = ScriptedDataSource::new(vec![FoodItem {
            data_type: DataType::Code,
            origin: "repo".into(),
            energy: 25.0,
        }]);
        let mut ctx = ForageContext {
            grid: &mut grid,
            source: &mut source,
            config: &config,
            tick: 1,
        };
        let out = act(&mut org, &plan, &mut ctx);
        assert!(!out.success);
        assert_eq!(out.failures, vec![FailureKind::Indigestible]);
    }

    #[test]
    fn test_empty_forage_reports_exhausted_source() {
        let (config, mut grid, mut org) = setup(1, 1);
        grid.set_stock(0, 0, 0.0);
        let plan = stay(&org);
        let mut source = ScriptedDataSource::default();
        let mut ctx = ForageContext {
            grid: &mut grid,
            source: &mut source,
            config: &config,
            tick: 1,
        };
        let out = act(&mut org, &plan, &mut ctx);
        assert_eq!(out.failures, vec![FailureKind::EmptyForage]);
        assert!(out.source_exhausted);
    }

    #[test]
    fn test_decide_is_pure_and_repeatable() {
        let (config, grid, org) = setup(6, 6);
        let board = TradeBoard::new(4, 10);
        let regions = BTreeMap::new();
        let ctx = SenseContext {
            grid: &grid,
            regions: &regions,
            board: &board,
            config: &config,
        };
        let a = decide(&org, &ctx, 99).unwrap();
        let b = decide(&org, &ctx, 99).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.inputs.len(), org.intel.genome.sensors.len());
    }

    #[test]
    fn test_strategy_needs_memory_and_lead() {
        let (_, _, org) = setup(1, 1);
        let drives = Drives::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            let s = choose_strategy(&org, &drives, &StrategyOptions::default(), &mut rng);
            assert!(matches!(s, ForagingStrategy::Greedy | ForagingStrategy::Explorer));
        }
    }

    fn tally(org: &Organism, options: &StrategyOptions) -> BTreeMap<ForagingStrategy, u32> {
        let drives = Drives::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut counts = BTreeMap::new();
        for _ in 0..2000 {
            *counts
                .entry(choose_strategy(org, &drives, options, &mut rng))
                .or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_scarcity_shifts_strategy_away_from_greedy() {
        let (_, _, org) = setup(1, 1);
        let plenty = StrategyOptions {
            has_lead: true,
            ..StrategyOptions::default()
        };
        let famine = StrategyOptions {
            scarcity: 1.0,
            ..plenty
        };
        let calm = tally(&org, &plenty);
        let hard = tally(&org, &famine);
        let count = |c: &BTreeMap<ForagingStrategy, u32>, s| c.get(&s).copied().unwrap_or(0);
        assert!(count(&hard, ForagingStrategy::Greedy) < count(&calm, ForagingStrategy::Greedy));
        assert!(count(&hard, ForagingStrategy::Explorer) > count(&calm, ForagingStrategy::Explorer));
        assert!(
            count(&hard, ForagingStrategy::LeadFollower) > count(&calm, ForagingStrategy::LeadFollower)
        );
    }

    #[test]
    fn test_expertise_backs_memory_first() {
        let (_, _, org) = setup(1, 1);
        let novice = StrategyOptions {
            has_memory: true,
            ..StrategyOptions::default()
        };
        let expert = StrategyOptions {
            expertise: 1.0,
            ..novice
        };
        let memory_first = |c: BTreeMap<ForagingStrategy, u32>| {
            c.get(&ForagingStrategy::MemoryFirst).copied().unwrap_or(0)
        };
        assert!(memory_first(tally(&org, &expert)) > memory_first(tally(&org, &novice)));
    }

    #[test]
    fn test_feed_meal_is_recorded_and_scaled_by_scarcity() {
        let (config, mut grid, mut org) = setup(1, 1);
        grid.set_stock(0, 0, 0.0);
        org.vitals.energy = 10.0;
        let plan = stay(&org);
        let mut source = ScriptedDataSource::new(vec![FoodItem {
            data_type: DataType::SimpleText,
            origin: "feed".into(),
            energy: 10.0,
        }]);
        let mut ctx = ForageContext {
            grid: &mut grid,
            source: &mut source,
            config: &config,
            tick: 3,
        };
        let out = act(&mut org, &plan, &mut ctx);
        assert!(out.success);
        assert!(out.gained > 0.0 && out.gained < 10.0);
        assert_eq!(org.diet.meals, 1);
        assert_eq!(org.knowledge.items.len(), 1);
        assert!(org.knowledge.expertise_in(DataType::SimpleText) > 0.0);
    }

    #[test]
    fn test_expertise_sets_food_preference() {
        let (config, grid, mut org) = setup(4, 4);
        org.knowledge.expertise.insert(DataType::Code, 0.9);
        let board = TradeBoard::new(4, 10);
        let regions = BTreeMap::new();
        let ctx = SenseContext {
            grid: &grid,
            regions: &regions,
            board: &board,
            config: &config,
        };
        let decision = decide(&org, &ctx, 1).unwrap();
        if decision.drives.prefer_structured <= 0.6 {
            assert_eq!(decision.plan.preferred, Some(DataType::Code));
        }
    }

    #[test]
    fn test_migration_targets_richer_region() {
        let mut config = AppConfig::default();
        config.environment.noise = 0.0;
        config.environment.regions.push(crate::config::RegionOverride {
            name: "east".into(),
            x0: 2,
            y0: 0,
            x1: 4,
            y1: 2,
            ..Default::default()
        });
        let mut grid = PatchGrid::new(&config.environment, 4, 2);
        for x in 0..2 {
            for y in 0..2 {
                grid.set_stock(x, y, 0.0);
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pos = Position {
            x: 0,
            y: 0,
            region: grid.region_of(0, 0).to_string(),
        };
        let org = create_organism_with_rng(1, pos, 0, &config, &mut rng);
        let drives = Drives {
            migrate: 1.0,
            ..Drives::default()
        };
        let m = plan_migration(&org, &drives, &grid).unwrap();
        assert_eq!(m.region, "east");
        assert!(m.x >= 2);
        let calm = Drives::default();
        assert!(plan_migration(&org, &calm, &grid).is_none());
    }
}
