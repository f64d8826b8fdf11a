use crate::board::TradeBoard;
use crate::config::SocialConfig;
use crate::interaction::{adjust_trust, observation, record_observation, InteractionCommand};
use genesis_data::{
    EventTag, ImitationBias, LeadHint, ObservationKind, Organism, OrganismId, SimEvent,
};
use tracing::trace;

pub struct InteractionContext<'a> {
    pub board: &'a mut TradeBoard,
    pub config: &'a SocialConfig,
    pub tick: u64,
}

fn find(organisms: &[Organism], id: OrganismId) -> Option<usize> {
    organisms.binary_search_by_key(&id, Organism::id).ok()
}

/// Applies commands in order against an id-sorted population. Commands that
/// name a missing organism are dropped.
pub fn apply_interaction_commands(
    organisms: &mut [Organism],
    commands: Vec<InteractionCommand>,
    ctx: &mut InteractionContext<'_>,
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let config = ctx.config;
    let tick = ctx.tick;
    for cmd in commands {
        match cmd {
            InteractionCommand::Teach {
                teacher,
                student,
                entry,
                cost,
            } => {
                let Some(s_idx) = find(organisms, student) else {
                    trace!(student, "Lesson for missing student dropped");
                    continue;
                };
                if let Some(t_idx) = find(organisms, teacher) {
                    let t = &mut organisms[t_idx];
                    t.vitals.energy = (t.vitals.energy - cost).max(0.0);
                    record_observation(
                        &mut t.social,
                        observation(tick, student, ObservationKind::Taught),
                        config.observation_capacity,
                    );
                }

                let s = &mut organisms[s_idx];
                let mut learned = observation(tick, teacher, ObservationKind::Learned);
                learned.source = Some(entry.source.clone());
                record_observation(&mut s.social, learned, config.observation_capacity);
                if s.social.imitation.is_none() {
                    let trust = s
                        .social
                        .trust
                        .get(&teacher)
                        .copied()
                        .unwrap_or(config.initial_trust);
                    s.social.imitation = Some(ImitationBias {
                        peer: teacher,
                        source: entry.source.clone(),
                        strength: (config.imitation_strength * trust).clamp(0.0, 1.0),
                        remaining: config.imitation_horizon,
                        horizon: config.imitation_horizon,
                    });
                }
                let source = entry.source.key();
                s.memory.push(entry);
                events.push(SimEvent::new(
                    tick,
                    EventTag::Teaching,
                    vec![teacher, student],
                    format!("#{teacher} taught #{student} {source}"),
                ));
            }
            InteractionCommand::Feed {
                parent,
                child,
                cost,
                amount,
            } => {
                let (Some(p_idx), Some(c_idx)) = (find(organisms, parent), find(organisms, child))
                else {
                    trace!(parent, child, "Meal for a missing organism dropped");
                    continue;
                };
                // A parent never starves itself and the dead are not revived.
                if organisms[p_idx].vitals.energy <= cost || !organisms[c_idx].is_alive() {
                    continue;
                }
                organisms[p_idx].vitals.energy -= cost;
                let c = &mut organisms[c_idx];
                c.vitals.energy += amount;
                c.vitals.care_received += 1;
                events.push(SimEvent::new(
                    tick,
                    EventTag::Care,
                    vec![parent, child],
                    format!("#{parent} fed #{child} {amount:.1} energy"),
                ));
            }
            InteractionCommand::PostLead(lead) => {
                let detail = match &lead.hint {
                    LeadHint::Patch { x, y } => format!("patch {x},{y}"),
                    LeadHint::Feed { data_type, origin } => format!("feed {data_type} from {origin}"),
                    LeadHint::DataKind { data_type } => format!("some {data_type}"),
                    LeadHint::Region => format!("region {}", lead.region),
                };
                events.push(SimEvent::new(
                    tick,
                    EventTag::Trade,
                    vec![lead.poster],
                    format!("#{} posted lead: {detail}", lead.poster),
                ));
                ctx.board.post(lead);
            }
            InteractionCommand::AdjustTrust {
                truster,
                peer,
                delta,
            } => {
                if let Some(idx) = find(organisms, truster) {
                    adjust_trust(
                        &mut organisms[idx].social,
                        peer,
                        delta,
                        config.initial_trust,
                        config.trust_capacity,
                    );
                }
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::lifecycle::create_organism_with_rng;
    use genesis_data::{FoodSource, Lead, MemoryEntry, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn population(n: u64) -> Vec<Organism> {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        (1..=n)
            .map(|id| {
                let pos = Position {
                    x: 0,
                    y: 0,
                    region: "default".into(),
                };
                create_organism_with_rng(id, pos, 0, &config, &mut rng)
            })
            .collect()
    }

    fn lesson(teacher: OrganismId, student: OrganismId) -> InteractionCommand {
        InteractionCommand::Teach {
            teacher,
            student,
            entry: MemoryEntry {
                tick: 3,
                source: FoodSource::Patch { x: 4, y: 4 },
                outcome: 10.0,
                fidelity: 0.6,
                taught_by: Some(teacher),
            },
            cost: 1.0,
        }
    }

    #[test]
    fn test_teach_sets_memory_and_bias() {
        let config = SocialConfig::default();
        let mut board = TradeBoard::new(8, 10);
        let mut orgs = population(2);
        let mut ctx = InteractionContext {
            board: &mut board,
            config: &config,
            tick: 3,
        };
        let events = apply_interaction_commands(&mut orgs, vec![lesson(1, 2)], &mut ctx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tag, EventTag::Teaching);
        assert_eq!(orgs[0].vitals.energy, 39.0);
        assert_eq!(orgs[1].memory.len(), 1);
        let bias = orgs[1].social.imitation.as_ref().unwrap();
        assert_eq!(bias.peer, 1);
        assert!((bias.strength - 0.25).abs() < 1e-6);
        assert_eq!(bias.remaining, config.imitation_horizon);
        assert_eq!(orgs[0].social.observations[0].kind, ObservationKind::Taught);
        assert_eq!(orgs[1].social.observations[0].kind, ObservationKind::Learned);
    }

    #[test]
    fn test_existing_bias_is_kept() {
        let config = SocialConfig::default();
        let mut board = TradeBoard::new(8, 10);
        let mut orgs = population(3);
        let mut ctx = InteractionContext {
            board: &mut board,
            config: &config,
            tick: 3,
        };
        apply_interaction_commands(&mut orgs, vec![lesson(1, 3), lesson(2, 3)], &mut ctx);
        assert_eq!(orgs[2].social.imitation.as_ref().unwrap().peer, 1);
        assert_eq!(orgs[2].memory.len(), 2);
    }

    #[test]
    fn test_lead_and_trust_commands() {
        let config = SocialConfig::default();
        let mut board = TradeBoard::new(8, 10);
        let mut orgs = population(2);
        let lead = Lead {
            poster: 1,
            region: "default".into(),
            hint: LeadHint::Region,
            score: 5.0,
            tick: 3,
        };
        let commands = vec![
            InteractionCommand::PostLead(lead),
            InteractionCommand::AdjustTrust {
                truster: 2,
                peer: 1,
                delta: 0.1,
            },
            lesson(9, 42),
        ];
        let mut ctx = InteractionContext {
            board: &mut board,
            config: &config,
            tick: 3,
        };
        let events = apply_interaction_commands(&mut orgs, commands, &mut ctx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tag, EventTag::Trade);
        assert_eq!(board.len(), 1);
        assert!((orgs[1].social.trust[&1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_feed_moves_energy_from_parent_to_child() {
        let config = SocialConfig::default();
        let mut board = TradeBoard::new(8, 10);
        let mut orgs = population(3);
        orgs[0].vitals.energy = 50.0;
        orgs[1].vitals.energy = 5.0;
        orgs[2].vitals.energy = 0.0;
        let feed = |child, cost| InteractionCommand::Feed {
            parent: 1,
            child,
            cost,
            amount: cost * 0.5,
        };
        let mut ctx = InteractionContext {
            board: &mut board,
            config: &config,
            tick: 3,
        };
        let events = apply_interaction_commands(
            &mut orgs,
            vec![feed(2, 8.0), feed(3, 8.0), feed(2, 60.0)],
            &mut ctx,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tag, EventTag::Care);
        assert_eq!(orgs[0].vitals.energy, 42.0);
        assert_eq!(orgs[1].vitals.energy, 9.0);
        assert_eq!(orgs[1].vitals.care_received, 1);
        assert_eq!(orgs[2].vitals.energy, 0.0);
    }
}
