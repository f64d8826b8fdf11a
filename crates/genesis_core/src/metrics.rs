//! Run metrics and structured logging.
//!
//! Counters are atomics so the runner and observers can read them without
//! holding the world.

use genesis_data::{EventTag, SimEvent};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Collector for simulation statistics.
pub struct Metrics {
    tick_count: AtomicU64,
    population: AtomicU64,
    /// Total patch stock, stored as `f64` bits.
    total_stock: AtomicU64,
    log_interval: u64,
    /// Events raised over the run, by tag.
    event_counts: Mutex<BTreeMap<EventTag, u64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Metrics {
    /// Creates a collector that logs a progress line every `log_interval` ticks.
    #[must_use]
    pub fn new(log_interval: u64) -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            population: AtomicU64::new(0),
            total_stock: AtomicU64::new(0f64.to_bits()),
            log_interval: log_interval.max(1),
            event_counts: Mutex::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick.
    pub fn record_tick(&self, tick: u64, duration: Duration, population: usize, stock: f64) {
        self.tick_count.store(tick, Ordering::Relaxed);
        self.population.store(population as u64, Ordering::Relaxed);
        self.total_stock.store(stock.to_bits(), Ordering::Relaxed);

        if tick % self.log_interval == 0 {
            tracing::info!(
                tick = tick,
                population = population,
                stock = stock,
                duration_us = duration.as_micros() as u64,
                "Simulation tick"
            );
        }
    }

    /// Counts every event of a tick, summaries included.
    pub fn record_events(&self, events: &[SimEvent]) {
        let mut counts = self.event_counts.lock().unwrap_or_else(|e| e.into_inner());
        for event in events {
            *counts.entry(event.tag).or_insert(0) += 1;
        }
    }

    #[must_use]
    pub fn event_count(&self, tag: EventTag) -> u64 {
        let counts = self.event_counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(&tag).copied().unwrap_or(0)
    }

    /// Non-zero tag counts, in tag order.
    #[must_use]
    pub fn event_totals(&self) -> Vec<(EventTag, u64)> {
        let counts = self.event_counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.iter().map(|(tag, n)| (*tag, *n)).collect()
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn population(&self) -> u64 {
        self.population.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_stock(&self) -> f64 {
        f64::from_bits(self.total_stock.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs the global tracing subscriber. Honors `RUST_LOG`, defaults to
/// `info`. Safe to call more than once.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new(10);
        assert_eq!(metrics.tick_count(), 0);
        assert_eq!(metrics.total_stock(), 0.0);
    }

    #[test]
    fn test_record_tick() {
        let metrics = Metrics::new(10);
        metrics.record_tick(3, Duration::from_millis(2), 12, 420.5);
        assert_eq!(metrics.tick_count(), 3);
        assert_eq!(metrics.population(), 12);
        assert!((metrics.total_stock() - 420.5).abs() < 1e-9);
    }

    #[test]
    fn test_events_are_counted_by_tag() {
        let metrics = Metrics::default();
        let death = SimEvent::new(4, EventTag::Death, vec![1], "#1 starved".into());
        metrics.record_events(&[death.clone(), death]);
        assert_eq!(metrics.event_count(EventTag::Death), 2);
        assert_eq!(metrics.event_count(EventTag::Birth), 0);
        assert_eq!(metrics.event_totals(), vec![(EventTag::Death, 2)]);
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
