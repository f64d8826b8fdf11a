use genesis_data::{EventTag, SimEvent};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narration {
    pub tick: u64,
    pub tag: EventTag,
    pub text: String,
    pub severity: f32,
}

/// How notable an event is, in `[0, 1]`.
#[must_use]
pub fn severity(tag: EventTag) -> f32 {
    match tag {
        EventTag::Death | EventTag::Terminated | EventTag::Rollback => 0.9,
        EventTag::SandboxViolation | EventTag::PatchKept | EventTag::PatchDiscarded => 0.7,
        EventTag::Unlock | EventTag::ShadowTrial | EventTag::Modulation => 0.6,
        EventTag::ParamChange | EventTag::Fallback => 0.4,
        _ => 0.2,
    }
}

fn prefix(severity: f32) -> &'static str {
    if severity > 0.8 {
        "◈"
    } else if severity > 0.5 {
        "◇"
    } else {
        "○"
    }
}

/// Turns feed output into narrated lines with a bounded history.
pub struct Chronicle {
    narrations: VecDeque<Narration>,
    max_history: usize,
}

impl Default for Chronicle {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Chronicle {
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            narrations: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Summaries go to `debug`, everything else is narrated at `info`.
    pub fn narrate(&mut self, event: &SimEvent) -> Narration {
        let severity = severity(event.tag);
        let text = match event.tag {
            EventTag::Death => format!("{} A life ends: {}", prefix(severity), event.description),
            EventTag::Unlock => format!("{} Something new stirs: {}", prefix(severity), event.description),
            EventTag::PatchKept => format!("{} A lineage rewrites itself: {}", prefix(severity), event.description),
            EventTag::Rollback => format!("{} A change is undone: {}", prefix(severity), event.description),
            _ => format!("{} {}", prefix(severity), event.description),
        };
        if event.tag == EventTag::Summary {
            debug!(tick = event.tick, "{}", text);
        } else {
            info!(tick = event.tick, tag = %event.tag, "{}", text);
        }

        let narration = Narration {
            tick: event.tick,
            tag: event.tag,
            text,
            severity,
        };
        if self.max_history > 0 {
            if self.narrations.len() >= self.max_history {
                self.narrations.pop_front();
            }
            self.narrations.push_back(narration.clone());
        }
        narration
    }

    pub fn narrate_all(&mut self, events: &[SimEvent]) {
        for event in events {
            self.narrate(event);
        }
    }

    pub fn consume_narrations(&mut self) -> Vec<Narration> {
        self.narrations.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut chronicle = Chronicle::new(2);
        for tick in 0..5 {
            chronicle.narrate(&SimEvent::new(tick, EventTag::Unlock, vec![1], "#1 unlocked remember".into()));
        }
        let lines = chronicle.consume_narrations();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].tick, 3);
        assert!(chronicle.consume_narrations().is_empty());
    }

    #[test]
    fn test_death_is_severe() {
        let mut chronicle = Chronicle::default();
        let line = chronicle.narrate(&SimEvent::new(4, EventTag::Death, vec![2], "#2 starved".into()));
        assert!(line.text.starts_with('◈'));
        assert!(line.text.contains("#2 starved"));
    }
}
