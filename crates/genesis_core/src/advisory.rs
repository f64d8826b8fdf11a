//! Sparse "parent" advice.
//!
//! The engine talks to an [`Advisor`] through a [`ParentEconomy`] that owns the
//! call budget, a response cache and the local fallback lines. Whatever the
//! advisor does, `consult` always returns usable text and never blocks longer
//! than the advisor itself allows.

use crate::config::AdvisoryConfig;
use genesis_data::{
    Capability, CapabilityTier, DataType, EmotionalState, FailureKind, Organism, OrganismId,
    Tunable,
};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryError {
    #[error("advisor timed out after {0} ms")]
    Timeout(u64),
    #[error("advisory quota exhausted")]
    QuotaExhausted,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("empty or unusable response")]
    EmptyResponse,
    #[error("no advisor available")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    Advice,
    BehaviorTweak,
}

impl RequestKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RequestKind::Advice => "advice",
            RequestKind::BehaviorTweak => "behavior_tweak",
        }
    }
}

/// Compact organism summary sent to the advisor.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryRequest {
    pub organism: OrganismId,
    pub tick: u64,
    pub kind: RequestKind,
    pub state: EmotionalState,
    pub tier: CapabilityTier,
    pub failure: Option<FailureKind>,
    pub energy: f64,
    pub capabilities: Vec<Capability>,
}

impl AdvisoryRequest {
    #[must_use]
    pub fn for_organism(organism: &Organism, kind: RequestKind, tick: u64) -> Self {
        Self {
            organism: organism.id(),
            tick,
            kind,
            state: organism.psyche.state,
            tier: organism.capabilities.tier(),
            failure: organism.psyche.last_failure,
            energy: organism.vitals.energy,
            capabilities: organism.capabilities.iter().collect(),
        }
    }

    /// One-line prompt body.
    #[must_use]
    pub fn summary(&self) -> String {
        let caps: Vec<&str> = self.capabilities.iter().map(|c| c.label()).collect();
        format!(
            "organism {} wants {}: state={} energy={:.1} failure={} capabilities=[{}]",
            self.organism,
            self.kind.label(),
            self.state.label(),
            self.energy,
            self.failure.map_or("none", FailureKind::label),
            caps.join(",")
        )
    }

    fn cache_key(&self) -> CacheKey {
        (self.state, self.tier, self.failure)
    }
}

/// Synchronous advisor seam. Implementations enforce their own timeout.
pub trait Advisor: Send {
    fn advise(&mut self, request: &AdvisoryRequest) -> Result<String, AdvisoryError>;

    fn name(&self) -> &str;
}

/// Used when no parent is wired in; every call falls back locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdvisor;

impl Advisor for NoAdvisor {
    fn advise(&mut self, _request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::Unavailable)
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Replays fixed responses in order, cycling. Deterministic by construction.
#[derive(Debug, Clone, Default)]
pub struct CannedAdvisor {
    responses: Vec<Result<String, AdvisoryError>>,
    cursor: usize,
    pub calls: usize,
}

impl CannedAdvisor {
    #[must_use]
    pub fn new(responses: Vec<Result<String, AdvisoryError>>) -> Self {
        Self {
            responses,
            cursor: 0,
            calls: 0,
        }
    }
}

impl Advisor for CannedAdvisor {
    fn advise(&mut self, _request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        self.calls += 1;
        if self.responses.is_empty() {
            return Err(AdvisoryError::EmptyResponse);
        }
        let out = self.responses[self.cursor % self.responses.len()].clone();
        self.cursor += 1;
        out
    }

    fn name(&self) -> &str {
        "canned"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeachingMode {
    Nurturing,
    Socratic,
    Cryptic,
    ToughLove,
    Silent,
}

impl TeachingMode {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TeachingMode::Nurturing => "nurturing",
            TeachingMode::Socratic => "socratic",
            TeachingMode::Cryptic => "cryptic",
            TeachingMode::ToughLove => "tough_love",
            TeachingMode::Silent => "silent",
        }
    }
}

#[must_use]
pub fn mode_for(state: EmotionalState, tier: CapabilityTier) -> TeachingMode {
    match (state, tier) {
        (EmotionalState::Desperate, _) => TeachingMode::ToughLove,
        (EmotionalState::Frustrated, _) => TeachingMode::Socratic,
        (_, CapabilityTier::Basic) => TeachingMode::Nurturing,
        (_, CapabilityTier::Cognitive) => TeachingMode::Socratic,
        (_, CapabilityTier::Social) => TeachingMode::Cryptic,
        (_, CapabilityTier::Reflective) => TeachingMode::Silent,
    }
}

/// Local line used whenever the parent cannot be reached.
#[must_use]
pub fn fallback_line(mode: TeachingMode, failure: Option<FailureKind>) -> &'static str {
    match (mode, failure) {
        (TeachingMode::Nurturing, Some(FailureKind::EmptyForage)) => {
            "The patch you left may have grown back. Look around you first."
        }
        (TeachingMode::Nurturing, _) => "Eat what you can digest and rest when you can.",
        (TeachingMode::Socratic, Some(FailureKind::Indigestible)) => {
            "What did the food you could not eat have in common?"
        }
        (TeachingMode::Socratic, Some(FailureKind::Isolation)) => {
            "Who else lives near you, and what do they know?"
        }
        (TeachingMode::Socratic, _) => "Which of your habits fed you yesterday?",
        (TeachingMode::Cryptic, _) => "The board remembers what the crowd forgets.",
        (TeachingMode::ToughLove, Some(FailureKind::Stagnation)) => {
            "Doing the same thing again will get you the same nothing. prefer simple_text"
        }
        (TeachingMode::ToughLove, _) => "Move. Staying put is starving slowly.",
        (TeachingMode::Silent, _) => "...",
    }
}

/// Structured instructions the parent may embed in its text.
#[derive(Debug, Clone, PartialEq)]
pub enum Hint {
    Tweak(Tunable, f32),
    Prefer(DataType),
    Snippet(String),
}

/// Extracts hints, one per line: `tweak <tunable> <delta>`,
/// `prefer <data_type>`, `snippet: <ops>`. Unparseable lines are ignored.
#[must_use]
pub fn parse_hints(text: &str) -> Vec<Hint> {
    let mut hints = Vec::new();
    for line in text.lines().map(str::trim) {
        if let Some(ops) = line.strip_prefix("snippet:") {
            let ops = ops.trim();
            if !ops.is_empty() {
                hints.push(Hint::Snippet(ops.to_string()));
            }
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        for window in words.windows(3) {
            if window[0] == "tweak" {
                if let (Ok(t), Ok(d)) = (window[1].parse::<Tunable>(), window[2].parse::<f32>()) {
                    if d.is_finite() {
                        hints.push(Hint::Tweak(t, d));
                    }
                }
            }
        }
        for window in words.windows(2) {
            if window[0] == "prefer" {
                if let Ok(t) = window[1].trim_end_matches(['.', ',']).parse::<DataType>() {
                    hints.push(Hint::Prefer(t));
                }
            }
        }
    }
    hints
}

/// Trims, strips control characters, and bounds length. Empty or mostly
/// non-printable text is rejected.
#[must_use]
pub fn sanitize(raw: &str, max_len: usize) -> Option<String> {
    let total = raw.chars().count();
    let control = raw
        .chars()
        .filter(|c| c.is_control() && *c != '\n')
        .count();
    if total == 0 || control * 4 > total {
        return None;
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();
    let bounded: String = cleaned.trim().chars().take(max_len).collect();
    let bounded = bounded.trim_end().to_string();
    (!bounded.is_empty()).then_some(bounded)
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdviceSource {
    Parent,
    Cache,
    Fallback(AdvisoryError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdviceOutcome {
    pub text: String,
    pub hints: Vec<Hint>,
    pub mode: TeachingMode,
    pub source: AdviceSource,
}

type CacheKey = (EmotionalState, CapabilityTier, Option<FailureKind>);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EconomyStats {
    pub calls: u64,
    pub cache_hits: u64,
    pub fallbacks: u64,
}

pub struct ParentEconomy {
    config: AdvisoryConfig,
    period_start: u64,
    calls_in_period: u32,
    cache: BTreeMap<CacheKey, String>,
    cache_order: VecDeque<CacheKey>,
    stats: EconomyStats,
}

impl ParentEconomy {
    #[must_use]
    pub fn new(config: AdvisoryConfig) -> Self {
        Self {
            config,
            period_start: 0,
            calls_in_period: 0,
            cache: BTreeMap::new(),
            cache_order: VecDeque::new(),
            stats: EconomyStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> EconomyStats {
        self.stats
    }

    #[must_use]
    pub fn remaining_calls(&self) -> u32 {
        self.config.calls_per_period.saturating_sub(self.calls_in_period)
    }

    fn roll_period(&mut self, tick: u64) {
        if tick.saturating_sub(self.period_start) >= self.config.period_ticks {
            self.period_start = tick - (tick - self.period_start) % self.config.period_ticks;
            self.calls_in_period = 0;
        }
    }

    fn remember(&mut self, key: CacheKey, text: &str) {
        if self.config.cache_capacity == 0 {
            return;
        }
        if self.cache.insert(key, text.to_string()).is_none() {
            self.cache_order.push_back(key);
        }
        while self.cache_order.len() > self.config.cache_capacity {
            if let Some(old) = self.cache_order.pop_front() {
                self.cache.remove(&old);
            }
        }
    }

    fn outcome(&self, text: String, mode: TeachingMode, source: AdviceSource) -> AdviceOutcome {
        AdviceOutcome {
            hints: parse_hints(&text),
            text,
            mode,
            source,
        }
    }

    /// Cache first, then the advisor if the period budget allows, then the
    /// local fallback line.
    pub fn consult(
        &mut self,
        advisor: &mut dyn Advisor,
        request: &AdvisoryRequest,
    ) -> AdviceOutcome {
        let mode = mode_for(request.state, request.tier);
        let key = request.cache_key();
        if let Some(text) = self.cache.get(&key).cloned() {
            self.stats.cache_hits += 1;
            return self.outcome(text, mode, AdviceSource::Cache);
        }

        self.roll_period(request.tick);
        let result = if self.calls_in_period >= self.config.calls_per_period {
            Err(AdvisoryError::QuotaExhausted)
        } else {
            self.calls_in_period += 1;
            self.stats.calls += 1;
            advisor.advise(request).and_then(|raw| {
                sanitize(&raw, self.config.max_response_len).ok_or(AdvisoryError::EmptyResponse)
            })
        };

        match result {
            Ok(text) => {
                self.remember(key, &text);
                self.outcome(text, mode, AdviceSource::Parent)
            }
            Err(e) => {
                self.stats.fallbacks += 1;
                let text = fallback_line(mode, request.failure).to_string();
                self.outcome(text, mode, AdviceSource::Fallback(e))
            }
        }
    }
}
