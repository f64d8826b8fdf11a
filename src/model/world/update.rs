use crate::model::brain::forward::record_usage;
use crate::model::brain::GenomeError;
use crate::model::interaction::InteractionCommand;
use crate::model::rng::{create_rng, tick_seed};
use crate::model::snapshot::{self, OrganismSnapshot, RegionStats};
use crate::model::systems::foraging::{self, Decision, ForageContext};
use crate::model::systems::guidance::{self, GuidanceContext};
use crate::model::systems::perception::SenseContext;
use crate::model::systems::{adaptation, biological, care, social};
use crate::model::world::World;
use genesis_data::{Organism, OrganismId, SimEvent};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, warn};

/// Everything a tick accumulates before the boundary pass applies it.
pub(super) struct TickState {
    pub started: Instant,
    pub tick_seed: u64,
    pub snapshots: Vec<OrganismSnapshot>,
    pub events: Vec<SimEvent>,
    pub commands: Vec<InteractionCommand>,
    pub newborns: Vec<Organism>,
    /// Organisms removed for an invariant violation rather than starvation.
    pub terminated: BTreeSet<OrganismId>,
    pub source_exhausted: bool,
}

impl World {
    /// Advances the simulation by one tick.
    ///
    /// Passes, in order:
    /// - regrowth of every patch from its pre-tick stock
    /// - parallel decisions against the start-of-tick snapshot
    /// - sequential acting, vitals, adaptation, guidance and births in id order
    /// - interaction and parent care planning from the snapshot
    /// - the boundary pass in [`World::finalize`]
    ///
    /// Returns every event raised this tick. The low-noise feed output is
    /// available through [`World::take_notices`].
    pub fn update(&mut self) -> anyhow::Result<Vec<SimEvent>> {
        let started = Instant::now();
        self.tick += 1;
        let tick = self.tick;
        let seed = tick_seed(self.seed, tick);
        self.grid.regrow(&mut create_rng(seed));

        let mut state = TickState {
            started,
            tick_seed: seed,
            snapshots: snapshot::capture_all(&self.organisms),
            events: Vec::new(),
            commands: Vec::new(),
            newborns: Vec::new(),
            terminated: BTreeSet::new(),
            source_exhausted: false,
        };
        let regions = snapshot::region_stats(&state.snapshots, &self.grid, &self.config.social);

        let decisions = {
            let ctx = SenseContext {
                grid: &self.grid,
                regions: &regions,
                board: &self.board,
                config: &self.config,
            };
            foraging::decide_all(&self.organisms, &ctx, seed)
        };
        let decisions = self.resolve_decisions(decisions, &mut state);

        self.act_all(decisions, &regions, &mut state);

        state.commands.extend(social::plan_interactions(
            &state.snapshots,
            &self.config.social,
            tick,
            seed,
        ));
        state
            .commands
            .extend(care::plan_care(&state.snapshots, &self.config.care));

        Ok(self.finalize(state))
    }

    /// Keeps the successful decisions and terminates organisms whose genome
    /// failed. Snapshot drives are refreshed so interaction planning sees
    /// this tick's brain output.
    fn resolve_decisions(
        &mut self,
        decisions: Vec<Result<Decision, GenomeError>>,
        state: &mut TickState,
    ) -> Vec<Option<Decision>> {
        decisions
            .into_iter()
            .zip(self.organisms.iter_mut())
            .zip(state.snapshots.iter_mut())
            .map(|((decision, org), snap)| match decision {
                Ok(decision) => {
                    snap.drives = decision.drives;
                    Some(decision)
                }
                Err(err) => {
                    let id = org.id();
                    warn!(organism = id, error = %err, "Genome invariant violated, terminating organism");
                    org.vitals.energy = 0.0;
                    state.terminated.insert(id);
                    None
                }
            })
            .collect()
    }

    fn act_all(
        &mut self,
        decisions: Vec<Option<Decision>>,
        regions: &BTreeMap<String, RegionStats>,
        state: &mut TickState,
    ) {
        let tick = self.tick;
        let config = &self.config;

        for ((org, decision), snap) in self
            .organisms
            .iter_mut()
            .zip(decisions)
            .zip(&state.snapshots)
        {
            let Some(decision) = decision else {
                continue;
            };

            let outcome = {
                let mut ctx = ForageContext {
                    grid: &mut self.grid,
                    source: self.data_source.as_mut(),
                    config,
                    tick,
                };
                foraging::act(org, &decision.plan, &mut ctx)
            };
            org.intel.drives = decision.drives;
            record_usage(
                &mut org.intel.genome,
                &decision.inputs,
                &decision.outputs,
                config.brain.usage_decay,
            );
            state.source_exhausted |= outcome.source_exhausted;

            let population = regions.get(&snap.region).map_or(0, |r| r.population);
            state
                .events
                .extend(biological::process_vitals(org, &outcome, population, config, tick));
            state.events.extend(outcome.events);
            state.commands.extend(outcome.commands);
            if !org.is_alive() {
                debug!(organism = org.id(), "Starved this tick");
                continue;
            }

            state
                .events
                .extend(adaptation::adapt_interface(org, &config.brain, tick, state.tick_seed));

            {
                let mut ctx = GuidanceContext {
                    economy: &mut self.economy,
                    advisor: self.advisor.as_mut(),
                    manager: &mut self.manager,
                    config,
                    tick,
                    tick_seed: state.tick_seed,
                };
                state.events.extend(guidance::seek_advice(org, &mut ctx));
                state
                    .events
                    .extend(guidance::self_modify_step(org, &state.snapshots, &mut ctx));
            }

            if let Some(mut birth) =
                biological::try_reproduce(org, self.next_id, config, tick, state.tick_seed)
            {
                self.next_id += 1;
                self.manager.on_birth(org, &mut birth.child, tick);
                state.events.extend(birth.events);
                state.newborns.push(birth.child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::AppConfig;
    use crate::model::data_source::NullDataSource;
    use genesis_data::EventTag;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.world.width = 8;
        config.world.height = 8;
        config.world.initial_population = 12;
        config.world.seed = Some(21);
        config.world.deterministic = true;
        config
    }

    #[test]
    fn test_tick_advances_and_ages() {
        let mut world = World::new(config()).unwrap();
        world.update().unwrap();
        assert_eq!(world.tick, 1);
        assert!(world.organisms.iter().all(|o| o.vitals.age == 1));
    }

    #[test]
    fn test_population_stays_sorted_with_births() {
        let mut cfg = config();
        cfg.metabolism.reproduction_threshold = 12.0;
        cfg.metabolism.reproduction_cost = 10.0;
        let mut world = World::new(cfg).unwrap().with_data_source(Box::new(NullDataSource));
        for _ in 0..3 {
            world.update().unwrap();
        }
        let ids: Vec<_> = world.organisms.iter().map(Organism::id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_same_seed_same_events() {
        let mut a = World::new(config()).unwrap();
        let mut b = World::new(config()).unwrap();
        for _ in 0..10 {
            assert_eq!(a.update().unwrap(), b.update().unwrap());
        }
        assert_eq!(a.organisms, b.organisms);
    }

    #[test]
    fn test_energy_never_negative() {
        let mut world = World::new(config()).unwrap().with_data_source(Box::new(NullDataSource));
        for _ in 0..30 {
            world.update().unwrap();
            assert!(world.organisms.iter().all(|o| o.vitals.energy >= 0.0));
        }
    }

    #[test]
    fn test_death_tag_is_emitted_once_per_organism() {
        let mut cfg = config();
        cfg.world.initial_population = 4;
        let mut world = World::new(cfg).unwrap().with_data_source(Box::new(NullDataSource));
        for org in &mut world.organisms {
            org.vitals.energy = 0.5;
        }
        let mut deaths = Vec::new();
        for _ in 0..3 {
            for event in world.update().unwrap() {
                if event.tag == EventTag::Death {
                    deaths.extend(event.entities);
                }
            }
        }
        let unique: BTreeSet<_> = deaths.iter().copied().collect();
        assert_eq!(unique.len(), deaths.len());
    }
}
