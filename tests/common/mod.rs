pub mod macros;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal_core::breeding::{Breeder, BreedingRequest};
use shoal_core::config::AppConfig;
use shoal_core::error::BreedingError;
use shoal_core::population::{PendingBreeding, Population};
use shoal_data::Genome;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Config that keeps a population alive and predation-free unless a test
/// asks otherwise.
#[allow(dead_code)]
pub fn quiet_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.simulation.food_availability = 0.0;
    config.metabolism.basal_coefficient = 1e-7;
    config.fish.can_eat_ratio = 1e-6;
    config
}

struct PlacedFish {
    genome: Genome,
    x: f64,
    y: f64,
}

#[allow(dead_code)]
pub struct PopulationBuilder {
    config: AppConfig,
    fish: Vec<PlacedFish>,
    food: Vec<(f64, f64)>,
    seed: u64,
}

#[allow(dead_code)]
impl PopulationBuilder {
    pub fn new() -> Self {
        Self {
            config: quiet_config(),
            fish: Vec::new(),
            food: Vec::new(),
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_fish(mut self, genome: Genome, x: f64, y: f64) -> Self {
        self.fish.push(PlacedFish { genome, x, y });
        self
    }

    pub fn with_food(mut self, x: f64, y: f64) -> Self {
        self.food.push((x, y));
        self
    }

    /// A started population; placed fish count towards the target size.
    pub fn build(self) -> (Population, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut population = Population::new(self.config).expect("Failed to create population");
        for placed in self.fish {
            population.add_fish(placed.genome, placed.x, placed.y, &mut rng);
        }
        for (x, y) in self.food {
            population.add_food(x, y);
        }
        population.start(&mut rng).expect("Failed to start population");
        (population, rng)
    }
}

/// Feeds frames of `dt` seconds until a breeding request comes out.
#[allow(dead_code)]
pub fn run_until_breeding(
    population: &mut Population,
    rng: &mut ChaCha8Rng,
    dt: f64,
    max_frames: usize,
) -> Option<PendingBreeding> {
    (0..max_frames).find_map(|_| population.advance(dt, rng))
}

/// Answers every request with clones of the first parent, and counts calls.
#[allow(dead_code)]
#[derive(Default)]
pub struct CloningBreeder {
    pub calls: AtomicUsize,
    pub offspring: usize,
    pub delay: Option<Duration>,
}

#[allow(dead_code)]
impl CloningBreeder {
    pub fn new(offspring: usize) -> Self {
        Self {
            offspring,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Breeder for CloningBreeder {
    async fn breed(&self, request: &BreedingRequest) -> Result<Vec<Genome>, BreedingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let parent = request
            .parents
            .first()
            .map(|p| p.genome.clone())
            .ok_or_else(|| BreedingError::invalid_request("no parents"))?;
        Ok(vec![parent; self.offspring])
    }
}

/// Always fails with the given error.
#[allow(dead_code)]
pub struct FailingBreeder(pub BreedingError);

#[async_trait::async_trait]
impl Breeder for FailingBreeder {
    async fn breed(&self, _request: &BreedingRequest) -> Result<Vec<Genome>, BreedingError> {
        Err(self.0.clone())
    }
}
