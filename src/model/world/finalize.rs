use crate::model::interaction::decay_imitation;
use crate::model::systems::interaction::{apply_interaction_commands, InteractionContext};
use crate::model::systems::social::diffuse_knowledge;
use crate::model::world::update::TickState;
use crate::model::world::World;
use genesis_data::{EventTag, Organism, SimEvent};
use tracing::{debug, info};

impl World {
    /// Tick boundary: applies the deferred interaction commands, removes the
    /// dead, admits newborns and judges due shadow trials.
    pub(super) fn finalize(&mut self, mut state: TickState) -> Vec<SimEvent> {
        let tick = self.tick;

        // Imitation ticks down before this tick's lessons land, so a fresh
        // lesson starts at full horizon.
        for org in &mut self.organisms {
            decay_imitation(&mut org.social);
        }
        let commands = std::mem::take(&mut state.commands);
        let interaction_events = {
            let mut ctx = InteractionContext {
                board: &mut self.board,
                config: &self.config.social,
                tick,
            };
            apply_interaction_commands(&mut self.organisms, commands, &mut ctx)
        };
        state.events.extend(interaction_events);

        self.remove_dead(&mut state);

        // Newborn ids are above every living id, so the list stays sorted.
        self.organisms.append(&mut state.newborns);

        self.board.prune(tick);
        self.manager.observe(&self.organisms);
        state.events.extend(self.manager.evaluate_due(tick));

        for notice in self.grid.drain_notices() {
            state.events.push(SimEvent::new(
                tick,
                EventTag::Depletion,
                Vec::new(),
                format!("patch {},{} in {} ran dry", notice.x, notice.y, notice.region),
            ));
        }
        if state.source_exhausted && !self.source_exhausted_reported {
            self.source_exhausted_reported = true;
            info!(source = self.data_source.name(), "Data source exhausted");
            state.events.push(SimEvent::new(
                tick,
                EventTag::SourceExhausted,
                Vec::new(),
                format!("data source {} exhausted", self.data_source.name()),
            ));
        }

        let mut events = std::mem::take(&mut self.pending);
        events.append(&mut state.events);
        self.notices = self.feed.ingest(events.clone(), tick);
        self.metrics.record_events(&events);
        self.metrics.record_tick(
            tick,
            state.started.elapsed(),
            self.organisms.len(),
            self.grid.total_stock(),
        );
        events
    }

    /// Drops every organism at zero energy with exactly one `Death` or
    /// `Terminated` event, then lets the starved pass their best memory on.
    fn remove_dead(&mut self, state: &mut TickState) {
        let tick = self.tick;
        if self.organisms.iter().all(Organism::is_alive) {
            return;
        }
        let (alive, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.organisms)
            .into_iter()
            .partition(Organism::is_alive);
        self.organisms = alive;

        let mut lessons = Vec::new();
        for org in &dead {
            let id = org.id();
            self.manager.record_death(id, tick);
            if state.terminated.contains(&id) {
                state.events.push(SimEvent::new(
                    tick,
                    EventTag::Terminated,
                    vec![id],
                    format!("#{id} terminated after a genome fault"),
                ));
                continue;
            }
            debug!(organism = id, age = org.vitals.age, "Organism died");
            state.events.push(SimEvent::new(
                tick,
                EventTag::Death,
                vec![id],
                format!(
                    "#{id} starved at age {} (generation {}, {} offspring)",
                    org.vitals.age, org.identity.generation, org.vitals.offspring_count
                ),
            ));
            lessons.extend(diffuse_knowledge(org, &self.organisms, &self.config.social, tick));
        }

        if !lessons.is_empty() {
            let mut ctx = InteractionContext {
                board: &mut self.board,
                config: &self.config.social,
                tick,
            };
            state
                .events
                .extend(apply_interaction_commands(&mut self.organisms, lessons, &mut ctx));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::config::AppConfig;
    use crate::model::data_source::NullDataSource;
    use crate::model::lifecycle::create_organism_with_rng;
    use crate::model::world::World;
    use genesis_data::{EventTag, FoodSource, MemoryEntry, Organism, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn barren_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.world.width = 1;
        config.world.height = 1;
        config.world.seed = Some(5);
        config.environment.noise = 0.0;
        config.environment.initial_stock_fraction = 0.0;
        config
    }

    fn organism(id: u64, energy: f64, config: &AppConfig) -> Organism {
        let mut rng = ChaCha8Rng::seed_from_u64(id);
        let pos = Position {
            x: 0,
            y: 0,
            region: "default".into(),
        };
        let mut org = create_organism_with_rng(id, pos, 0, config, &mut rng);
        org.vitals.energy = energy;
        org
    }

    #[test]
    fn test_starved_organism_leaves_with_one_death() {
        let config = barren_config();
        let orgs = vec![organism(1, 0.5, &config), organism(2, 40.0, &config)];
        let mut world = World::with_organisms(config, orgs)
            .unwrap()
            .with_data_source(Box::new(NullDataSource));

        let events = world.update().unwrap();
        let deaths: Vec<_> = events.iter().filter(|e| e.tag == EventTag::Death).collect();
        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].entities, vec![1]);
        assert!(world.organism(1).is_none());

        let events = world.update().unwrap();
        assert!(events
            .iter()
            .all(|e| e.tag != EventTag::Death || !e.entities.contains(&1)));
        assert_eq!(world.metrics.event_count(EventTag::Death), 1);
    }

    #[test]
    fn test_dying_organism_teaches_neighbours() {
        let config = barren_config();
        let mut dying = organism(1, 0.5, &config);
        dying.memory.push(MemoryEntry {
            tick: 0,
            source: FoodSource::Patch { x: 0, y: 0 },
            outcome: 9.0,
            fidelity: 1.0,
            taught_by: None,
        });
        let orgs = vec![dying, organism(2, 40.0, &config)];
        let mut world = World::with_organisms(config, orgs)
            .unwrap()
            .with_data_source(Box::new(NullDataSource));

        let events = world.update().unwrap();
        assert!(events
            .iter()
            .any(|e| e.tag == EventTag::Teaching && e.entities == vec![1, 2]));
        let survivor = world.organism(2).unwrap();
        assert!(survivor.memory.entries.iter().any(|e| e.taught_by == Some(1)));
        assert!(survivor.social.imitation.is_some());
    }

    #[test]
    fn test_source_exhaustion_reported_once() {
        let mut config = barren_config();
        config.environment.initial_stock_fraction = 1.0;
        let orgs = vec![organism(1, 40.0, &config)];
        let mut world = World::with_organisms(config, orgs)
            .unwrap()
            .with_data_source(Box::new(crate::model::data_source::ScriptedDataSource::new(Vec::new())));

        let mut reported = 0;
        for _ in 0..5 {
            reported += world
                .update()
                .unwrap()
                .iter()
                .filter(|e| e.tag == EventTag::SourceExhausted)
                .count();
        }
        assert!(reported <= 1);
    }
}
