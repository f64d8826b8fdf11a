//! Low-noise event feed.
//!
//! Rare events (unlocks, deaths, patch outcomes, fallbacks...) pass straight
//! through. High-frequency tags are only counted and come out as one
//! `summary` notice every `summary_interval` ticks.

use genesis_data::{EventTag, OrganismId, SimEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTally {
    pub count: u64,
    /// First few entities seen for this tag in the window.
    pub sample: Vec<OrganismId>,
}

const SAMPLE_SIZE: usize = 3;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventFeed {
    interval: u64,
    window_start: u64,
    tallies: BTreeMap<EventTag, TagTally>,
}

impl EventFeed {
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            window_start: 0,
            tallies: BTreeMap::new(),
        }
    }

    /// Routes one event. Returns it back when it should be emitted now.
    pub fn push(&mut self, event: SimEvent) -> Option<SimEvent> {
        if !event.tag.is_high_frequency() {
            return Some(event);
        }
        let tally = self.tallies.entry(event.tag).or_default();
        tally.count += 1;
        for id in event.entities {
            if tally.sample.len() >= SAMPLE_SIZE {
                break;
            }
            if !tally.sample.contains(&id) {
                tally.sample.push(id);
            }
        }
        None
    }

    /// Feeds a whole tick and returns what should be emitted, summary last.
    pub fn ingest(&mut self, events: impl IntoIterator<Item = SimEvent>, tick: u64) -> Vec<SimEvent> {
        let mut out: Vec<SimEvent> = events.into_iter().filter_map(|e| self.push(e)).collect();
        if let Some(summary) = self.flush_due(tick) {
            out.push(summary);
        }
        out
    }

    /// Summary for the closing window once `interval` ticks have passed.
    pub fn flush_due(&mut self, tick: u64) -> Option<SimEvent> {
        if tick.saturating_sub(self.window_start) < self.interval {
            return None;
        }
        self.flush(tick)
    }

    /// Summarizes and clears whatever has been counted, regardless of timing.
    pub fn flush(&mut self, tick: u64) -> Option<SimEvent> {
        self.window_start = tick;
        if self.tallies.is_empty() {
            return None;
        }
        let tallies = std::mem::take(&mut self.tallies);
        let mut entities = Vec::new();
        let parts: Vec<String> = tallies
            .iter()
            .map(|(tag, tally)| {
                for id in &tally.sample {
                    if !entities.contains(id) {
                        entities.push(*id);
                    }
                }
                format!("{tag}={}", tally.count)
            })
            .collect();
        Some(SimEvent::new(
            tick,
            EventTag::Summary,
            entities,
            parts.join(" "),
        ))
    }

    #[must_use]
    pub fn pending(&self, tag: EventTag) -> u64 {
        self.tallies.get(&tag).map_or(0, |t| t.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(tick: u64, tag: EventTag, id: OrganismId) -> SimEvent {
        SimEvent::new(tick, tag, vec![id], String::new())
    }

    #[test]
    fn test_rare_events_pass_through() {
        let mut feed = EventFeed::new(10);
        assert!(feed.push(ev(1, EventTag::Death, 4)).is_some());
        assert!(feed.push(ev(1, EventTag::Unlock, 4)).is_some());
        assert!(feed.push(ev(1, EventTag::Birth, 4)).is_none());
        assert_eq!(feed.pending(EventTag::Birth), 1);
    }

    #[test]
    fn test_summary_every_interval() {
        let mut feed = EventFeed::new(10);
        for t in 1..10 {
            let out = feed.ingest(vec![ev(t, EventTag::Depletion, t)], t);
            assert!(out.is_empty());
        }
        let out = feed.ingest(vec![ev(10, EventTag::Teaching, 1)], 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag, EventTag::Summary);
        assert_eq!(out[0].description, "depletion=9 teaching=1");
        assert_eq!(out[0].entities, vec![1, 2, 3]);
        assert_eq!(feed.pending(EventTag::Depletion), 0);
    }

    #[test]
    fn test_empty_window_emits_nothing() {
        let mut feed = EventFeed::new(5);
        assert!(feed.ingest(Vec::new(), 5).is_empty());
        assert!(feed.flush(6).is_none());
    }
}
