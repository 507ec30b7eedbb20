use super::entity::{FishSnapshot, FoodItem};
use serde::{Deserialize, Serialize};

/// Axis-aligned tank rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    /// Length of the diagonal; the largest distance two points can be apart.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }
}

/// Lifecycle state of the population manager.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SimState {
    #[default]
    Initializing,
    Running,
    Breeding,
    Stopped,
}

/// Noteworthy occurrences, drained by whoever presents the simulation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    Ate {
        fish: u64,
        energy: f64,
    },
    Predation {
        predator: u64,
        prey: u64,
        energy: f64,
    },
    Died {
        fish: u64,
        age_ticks: u64,
    },
    BreedingStarted {
        generation: u32,
        parents: usize,
    },
    GenerationStarted {
        generation: u32,
        population: usize,
        offspring: usize,
    },
    BreedingFailed {
        generation: u32,
        reason: String,
    },
    Extinction {
        generation: u32,
    },
    Stopped,
}

/// One periodic sample of population-wide means.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSample {
    pub time: f64,
    pub population: usize,
    pub mean_size: f64,
    pub mean_speed: f64,
    pub mean_energy: f64,
    pub mean_metabolism: f64,
}

/// Aggregate statistics of the live population.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopulationStats {
    pub generation: u32,
    pub population: usize,
    pub food_count: usize,
    pub survival_rate: f64,
    pub mean_size: f64,
    pub mean_speed: f64,
    pub mean_energy: f64,
    pub mean_metabolism: f64,
    pub average_fitness: f64,
    pub best_fitness: f64,
}

/// Outcome of one generation, recorded at its boundary.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub generation: u32,
    pub survivors: usize,
    pub average_fitness: f64,
    pub best_fitness: f64,
    pub breeding_pool: usize,
    pub offspring: usize,
    pub next_population: usize,
    pub bred: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub state: SimState,
    pub generation: u32,
    pub sim_time: f64,
    pub time_to_next_generation: f64,
    pub speed_multiplier: f64,
    pub water_temperature: f64,
    pub bounds: Bounds,
    pub fish: Vec<FishSnapshot>,
    pub food: Vec<FoodItem>,
    pub stats: PopulationStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_geometry() {
        let b = Bounds::new(300.0, 400.0);
        assert_eq!(b.center(), (150.0, 200.0));
        assert_eq!(b.diagonal(), 500.0);
        assert!(b.contains(0.0, 400.0));
        assert!(!b.contains(-0.1, 10.0));
    }

    #[test]
    fn test_event_tagging() {
        let json = serde_json::to_string(&SimEvent::Extinction { generation: 3 }).expect("json");
        assert_eq!(json, r#"{"type":"extinction","generation":3}"#);
    }
}
