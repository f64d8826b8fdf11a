use genesis_data::{Lead, MemoryEntry, ObservationKind, OrganismId, SocialObservation, SocialState};

/// Deferred peer effect. Planned against the tick snapshot, applied at the
/// tick boundary in the order produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionCommand {
    Teach {
        teacher: OrganismId,
        student: OrganismId,
        /// Already faded copy.
        entry: MemoryEntry,
        cost: f64,
    },
    /// Parent gives up `cost`, child receives `amount`.
    Feed {
        parent: OrganismId,
        child: OrganismId,
        cost: f64,
        amount: f64,
    },
    PostLead(Lead),
    AdjustTrust {
        truster: OrganismId,
        peer: OrganismId,
        delta: f32,
    },
}

/// Appends to the observation log, dropping the oldest beyond `capacity`.
pub fn record_observation(social: &mut SocialState, observation: SocialObservation, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while social.observations.len() >= capacity {
        social.observations.pop_front();
    }
    social.observations.push_back(observation);
}

/// Moves trust in `peer` by `delta` inside `[0, 1]`. A new peer starts at
/// `initial` and, once the map is full, replaces the least trusted entry.
pub fn adjust_trust(
    social: &mut SocialState,
    peer: OrganismId,
    delta: f32,
    initial: f32,
    capacity: usize,
) -> f32 {
    if capacity == 0 {
        return initial;
    }
    if !social.trust.contains_key(&peer) {
        while social.trust.len() >= capacity {
            let weakest = social
                .trust
                .iter()
                .min_by(|a, b| a.1.total_cmp(b.1).then(a.0.cmp(b.0)))
                .map(|(id, _)| *id);
            match weakest {
                Some(id) => {
                    social.trust.remove(&id);
                }
                None => break,
            }
        }
    }
    let slot = social.trust.entry(peer).or_insert(initial);
    *slot = (*slot + delta).clamp(0.0, 1.0);
    *slot
}

/// Ages the imitation bias by one tick, clearing it at zero.
pub fn decay_imitation(social: &mut SocialState) {
    if let Some(bias) = social.imitation.as_mut() {
        bias.remaining = bias.remaining.saturating_sub(1);
        if bias.remaining == 0 {
            social.imitation = None;
        }
    }
}

#[must_use]
pub fn observation(tick: u64, peer: OrganismId, kind: ObservationKind) -> SocialObservation {
    SocialObservation {
        tick,
        peer,
        kind,
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_data::{FoodSource, ImitationBias};

    #[test]
    fn test_trust_is_bounded() {
        let mut social = SocialState::default();
        assert!((adjust_trust(&mut social, 1, 0.9, 0.5, 4) - 1.0).abs() < 1e-6);
        assert_eq!(adjust_trust(&mut social, 2, -0.9, 0.5, 4), 0.0);
    }

    #[test]
    fn test_trust_map_evicts_weakest() {
        let mut social = SocialState::default();
        adjust_trust(&mut social, 1, 0.3, 0.5, 2);
        adjust_trust(&mut social, 2, -0.3, 0.5, 2);
        adjust_trust(&mut social, 3, 0.0, 0.5, 2);
        assert_eq!(social.trust.len(), 2);
        assert!(!social.trust.contains_key(&2));
    }

    #[test]
    fn test_observations_bounded() {
        let mut social = SocialState::default();
        for t in 0..10 {
            record_observation(&mut social, observation(t, 1, ObservationKind::Learned), 3);
        }
        assert_eq!(social.observations.len(), 3);
        assert_eq!(social.observations.front().map(|o| o.tick), Some(7));
    }

    #[test]
    fn test_imitation_decays_to_none() {
        let mut social = SocialState {
            imitation: Some(ImitationBias {
                peer: 1,
                source: FoodSource::Patch { x: 0, y: 0 },
                strength: 0.5,
                remaining: 2,
                horizon: 2,
            }),
            ..SocialState::default()
        };
        decay_imitation(&mut social);
        assert_eq!(social.imitation.as_ref().map(|b| b.remaining), Some(1));
        decay_imitation(&mut social);
        assert!(social.imitation.is_none());
    }
}
