//! Region-sharded trade board.
//!
//! Each region owns a bounded, time-windowed, append-only log of leads. The
//! only mutators are [`TradeBoard::post`] and [`TradeBoard::prune`]; both run
//! at the tick boundary, so every reader within a tick sees the same board.

use genesis_data::{Lead, OrganismId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeBoard {
    capacity: usize,
    window: u64,
    shards: BTreeMap<String, VecDeque<Lead>>,
}

impl TradeBoard {
    #[must_use]
    pub fn new(capacity: usize, window: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            window,
            shards: BTreeMap::new(),
        }
    }

    /// Appends to the lead's region, evicting the oldest when full.
    pub fn post(&mut self, lead: Lead) {
        let shard = self.shards.entry(lead.region.clone()).or_default();
        while shard.len() >= self.capacity {
            shard.pop_front();
        }
        shard.push_back(lead);
    }

    /// Drops leads older than the window.
    pub fn prune(&mut self, now: u64) {
        let window = self.window;
        for shard in self.shards.values_mut() {
            while shard
                .front()
                .is_some_and(|l| now.saturating_sub(l.tick) > window)
            {
                shard.pop_front();
            }
        }
        self.shards.retain(|_, shard| !shard.is_empty());
    }

    pub fn region(&self, region: &str) -> impl Iterator<Item = &Lead> {
        self.shards.get(region).into_iter().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.values().map(VecDeque::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best lead for a reader: its own region first, then every other region.
    /// The reader's own posts are skipped; newer leads win score ties.
    #[must_use]
    pub fn best_for(&self, region: &str, reader: OrganismId) -> Option<&Lead> {
        let local = Self::best_of(self.region(region), reader);
        if local.is_some() {
            return local;
        }
        Self::best_of(
            self.shards
                .iter()
                .filter(|(name, _)| name.as_str() != region)
                .flat_map(|(_, shard)| shard.iter()),
            reader,
        )
    }

    fn best_of<'a>(leads: impl Iterator<Item = &'a Lead>, reader: OrganismId) -> Option<&'a Lead> {
        leads
            .filter(|l| l.poster != reader)
            .fold(None, |best: Option<&Lead>, l| match best {
                Some(b) if b.score > l.score => Some(b),
                _ => Some(l),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_data::LeadHint;

    fn lead(poster: OrganismId, region: &str, score: f64, tick: u64) -> Lead {
        Lead {
            poster,
            region: region.into(),
            hint: LeadHint::Region,
            score,
            tick,
        }
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut board = TradeBoard::new(2, 100);
        board.post(lead(1, "a", 1.0, 0));
        board.post(lead(2, "a", 2.0, 1));
        board.post(lead(3, "a", 3.0, 2));
        let posters: Vec<_> = board.region("a").map(|l| l.poster).collect();
        assert_eq!(posters, vec![2, 3]);
    }

    #[test]
    fn test_window_expires_leads() {
        let mut board = TradeBoard::new(10, 5);
        board.post(lead(1, "a", 1.0, 0));
        board.post(lead(2, "a", 1.0, 4));
        board.prune(6);
        assert_eq!(board.len(), 1);
        board.prune(20);
        assert!(board.is_empty());
    }

    #[test]
    fn test_same_region_preferred_over_global() {
        let mut board = TradeBoard::new(10, 100);
        board.post(lead(1, "far", 50.0, 0));
        board.post(lead(2, "home", 5.0, 0));
        assert_eq!(board.best_for("home", 9).map(|l| l.poster), Some(2));
        assert_eq!(board.best_for("elsewhere", 9).map(|l| l.poster), Some(1));
        assert_eq!(board.best_for("home", 2).map(|l| l.poster), Some(1));
    }
}
