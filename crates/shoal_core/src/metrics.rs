//! Step and event counters for the simulation, plus logging setup.

use shoal_data::SimEvent;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Steps between periodic progress lines.
const LOG_EVERY_STEPS: u64 = 3600;

pub struct Metrics {
    step_count: AtomicU64,
    fish_count: AtomicU64,
    food_count: AtomicU64,
    events: Mutex<BTreeMap<&'static str, u64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step_count: AtomicU64::new(0),
            fish_count: AtomicU64::new(0),
            food_count: AtomicU64::new(0),
            events: Mutex::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed simulation step.
    pub fn record_step(&self, duration: Duration, fish: usize, food: usize) {
        let step = self.step_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.fish_count.store(fish as u64, Ordering::Relaxed);
        self.food_count.store(food as u64, Ordering::Relaxed);

        if step % LOG_EVERY_STEPS == 0 {
            tracing::debug!(
                step,
                fish,
                food,
                duration_us = duration.as_micros() as u64,
                "Simulation step"
            );
        }
    }

    /// Counts an event under its kind.
    pub fn record_event(&self, event: &SimEvent) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        *events.entry(event_kind(event)).or_insert(0) += 1;
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn fish_count(&self) -> u64 {
        self.fish_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn food_count(&self) -> u64 {
        self.food_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn event_count(&self, kind: &str) -> u64 {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.get(kind).copied().unwrap_or(0)
    }

    /// All event counters, sorted by kind.
    #[must_use]
    pub fn event_counts(&self) -> Vec<(&'static str, u64)> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Stable snake_case name of an event kind, matching its serde tag.
#[must_use]
pub fn event_kind(event: &SimEvent) -> &'static str {
    match event {
        SimEvent::Ate { .. } => "ate",
        SimEvent::Predation { .. } => "predation",
        SimEvent::Died { .. } => "died",
        SimEvent::BreedingStarted { .. } => "breeding_started",
        SimEvent::GenerationStarted { .. } => "generation_started",
        SimEvent::BreedingFailed { .. } => "breeding_failed",
        SimEvent::Extinction { .. } => "extinction",
        SimEvent::Stopped => "stopped",
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// `info` filter. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .finish(),
    )
    .ok();
}
