//! Population & generation manager.
//!
//! Owns the live fish and food, advances them on a fixed step, and runs the
//! generation state machine:
//!
//! ```text
//! Initializing -> Running -> Breeding -> Running -> ... -> Stopped
//! ```
//!
//! Breeding is a hand-off: [`Population::advance`] returns a
//! [`PendingBreeding`] once a generation has run its course and freezes the
//! simulation speed; the caller asks a breeder and hands the outcome back
//! through [`Population::complete_breeding`] with the same ticket. A ticket
//! that no longer matches (after a stop, or one already answered) is ignored.

use crate::breeding::BreedingRequest;
use crate::config::AppConfig;
use crate::error::{BreedingError, Result, SimError};
use crate::fish::{random_genome, Feeding, Fish, Surroundings};
use crate::metrics::Metrics;
use crate::perception::Neighbor;
use crate::selection::{offspring_needed, rank_score, split_pools, BreedingPools};
use rand::Rng;
use shoal_data::{
    Bounds, FoodItem, GenerationSummary, Genome, PopulationStats, SimEvent, SimState,
    StatsSample, WorldSnapshot,
};
use std::collections::VecDeque;
use std::time::Instant;

/// Identifies one breeding hand-off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreedingTicket {
    id: u64,
    generation: u32,
}

impl BreedingTicket {
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A breeding request waiting for the collaborator.
#[derive(Clone, Debug)]
pub struct PendingBreeding {
    pub ticket: BreedingTicket,
    pub request: BreedingRequest,
}

struct InFlight {
    ticket: BreedingTicket,
    pools: BreedingPools,
    average_fitness: f64,
    best_fitness: f64,
    saved_speed: f64,
}

pub struct Population {
    config: AppConfig,
    bounds: Bounds,
    state: SimState,
    fish: Vec<Fish>,
    food: Vec<FoodItem>,
    next_fish_id: u64,
    generation: u32,
    /// Population size when the current generation started.
    generation_population: usize,
    ticks: u64,
    generation_start_tick: u64,
    last_sample_tick: u64,
    step_seconds: f64,
    accumulator: f64,
    speed_multiplier: f64,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    latest_sample: StatsSample,
    history: VecDeque<StatsSample>,
    summaries: Vec<GenerationSummary>,
    events: VecDeque<SimEvent>,
    metrics: Metrics,
}

impl Population {
    /// Validates the configuration; the population stays empty until
    /// [`Population::start`].
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate().map_err(SimError::Config)?;
        let bounds = Bounds::new(config.world.width, config.world.height);
        let step_seconds = config.step_seconds();
        Ok(Self {
            bounds,
            state: SimState::Initializing,
            fish: Vec::new(),
            food: Vec::new(),
            next_fish_id: 1,
            generation: 0,
            generation_population: 0,
            ticks: 0,
            generation_start_tick: 0,
            last_sample_tick: 0,
            step_seconds,
            accumulator: 0.0,
            speed_multiplier: 1.0,
            in_flight: None,
            next_ticket: 1,
            latest_sample: StatsSample::default(),
            history: VecDeque::with_capacity(config.world.stats_history),
            summaries: Vec::new(),
            events: VecDeque::with_capacity(config.world.event_log_capacity),
            metrics: Metrics::new(),
            config,
        })
    }

    /// Spawns the founding population and starts generation 1.
    ///
    /// Fish placed beforehand with [`Population::add_fish`] are kept and
    /// count towards the target size.
    pub fn start<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        if self.state != SimState::Initializing {
            return Err(SimError::invalid_state("start", self.state));
        }
        let missing = self
            .config
            .simulation
            .population_size
            .saturating_sub(self.fish.len());
        self.spawn_founders(missing, rng);

        self.generation = 1;
        self.generation_population = self.fish.len();
        self.generation_start_tick = self.ticks;
        self.last_sample_tick = self.ticks;
        self.state = SimState::Running;
        self.take_sample();
        tracing::info!(
            population = self.fish.len(),
            water_temperature = self.config.simulation.water_temperature,
            "Simulation started"
        );
        Ok(())
    }

    /// Advances by one frame of `real_dt` seconds scaled by the speed
    /// multiplier, in whole fixed steps.
    ///
    /// Returns the breeding request when this frame ended a generation; no
    /// further steps run until the request is answered.
    pub fn advance<R: Rng>(&mut self, real_dt: f64, rng: &mut R) -> Option<PendingBreeding> {
        if self.state != SimState::Running {
            return None;
        }
        let real_dt = if real_dt.is_finite() {
            real_dt.max(0.0)
        } else {
            0.0
        };
        self.accumulator += real_dt * self.speed_multiplier;

        let mut steps = 0;
        while self.accumulator >= self.step_seconds {
            if steps >= self.config.world.max_steps_per_frame {
                // Drop the backlog rather than spiral.
                self.accumulator = 0.0;
                break;
            }
            self.accumulator -= self.step_seconds;
            steps += 1;
            self.step(rng);
            if self.generation_elapsed() {
                self.accumulator = 0.0;
                return self.begin_breeding(rng);
            }
        }
        None
    }

    /// Runs exactly one fixed step: food spawn, fish updates in list order,
    /// removal of the dead, periodic sampling. Ignored unless running.
    pub fn step<R: Rng>(&mut self, rng: &mut R) {
        if self.state != SimState::Running {
            return;
        }
        let started = Instant::now();
        self.ticks += 1;
        self.spawn_food(rng);
        self.update_fish(rng);
        self.fish.retain(|f| !f.is_dead());

        let interval = self.ticks_for(self.config.world.stats_interval);
        if self.ticks - self.last_sample_tick >= interval {
            self.last_sample_tick = self.ticks;
            self.take_sample();
        }
        self.metrics
            .record_step(started.elapsed(), self.fish.len(), self.food.len());
    }

    fn spawn_food<R: Rng>(&mut self, rng: &mut R) {
        if self.food.len() >= self.config.world.max_food {
            return;
        }
        let chance = self.config.simulation.food_availability * self.step_seconds;
        if rng.gen::<f64>() < chance {
            let (x, y) = self.random_point(self.config.fish.edge_padding, rng);
            self.food.push(FoodItem::new(x, y));
        }
    }

    fn update_fish<R: Rng>(&mut self, rng: &mut R) {
        let mut neighbors: Vec<Neighbor> = self
            .fish
            .iter()
            .enumerate()
            .map(|(i, f)| f.as_neighbor(i))
            .collect();

        for i in 0..self.fish.len() {
            if self.fish[i].is_dead() {
                continue;
            }
            let world = Surroundings {
                bounds: &self.bounds,
                food: &self.food,
                neighbors: &neighbors,
                water_temperature: self.config.simulation.water_temperature,
            };
            let outcome = self.fish[i].update(i, &world, &self.config, rng);
            let fish_id = self.fish[i].id();

            match outcome.feeding {
                Some(Feeding::Food { index, energy }) => {
                    self.food.remove(index);
                    tracing::debug!(fish = fish_id, energy, "Fish ate food");
                    self.record(SimEvent::Ate {
                        fish: fish_id,
                        energy,
                    });
                }
                Some(Feeding::Prey { index, energy }) => {
                    if self.fish[index].kill() {
                        neighbors[index].alive = false;
                        let prey = &self.fish[index];
                        let (prey_id, age_ticks) = (prey.id(), prey.age_ticks());
                        tracing::debug!(predator = fish_id, prey = prey_id, energy, "Predation");
                        self.record(SimEvent::Predation {
                            predator: fish_id,
                            prey: prey_id,
                            energy,
                        });
                        self.record(SimEvent::Died {
                            fish: prey_id,
                            age_ticks,
                        });
                    }
                }
                None => {}
            }

            neighbors[i] = self.fish[i].as_neighbor(i);
            if outcome.died {
                let age_ticks = self.fish[i].age_ticks();
                tracing::debug!(fish = fish_id, age_ticks, "Fish died");
                self.record(SimEvent::Died {
                    fish: fish_id,
                    age_ticks,
                });
            }
        }
    }

    fn generation_elapsed(&self) -> bool {
        self.ticks - self.generation_start_tick
            >= self.ticks_for(self.config.simulation.generation_length)
    }

    fn ticks_for(&self, seconds: f64) -> u64 {
        ((seconds / self.step_seconds).round() as u64).max(1)
    }

    fn begin_breeding<R: Rng>(&mut self, rng: &mut R) -> Option<PendingBreeding> {
        let target = self.config.simulation.population_size;
        let pools = split_pools(&self.fish, target, &self.config.selection);
        let (average_fitness, best_fitness) = self.fitness_summary();

        if pools.breeding.is_empty() {
            self.skip_breeding(&pools, average_fitness, best_fitness, rng);
            return None;
        }

        let parents: Vec<Genome> = pools
            .breeding
            .iter()
            .map(|&i| self.fish[i].export_genome())
            .collect();
        let ticket = BreedingTicket {
            id: self.next_ticket,
            generation: self.generation,
        };
        self.next_ticket += 1;

        tracing::info!(
            generation = self.generation,
            survivors = pools.living(),
            parents = parents.len(),
            "Breeding started"
        );
        self.record(SimEvent::BreedingStarted {
            generation: self.generation,
            parents: parents.len(),
        });

        self.in_flight = Some(InFlight {
            ticket,
            pools,
            average_fitness,
            best_fitness,
            saved_speed: self.speed_multiplier,
        });
        self.speed_multiplier = 0.0;
        self.state = SimState::Breeding;

        Some(PendingBreeding {
            ticket,
            request: BreedingRequest::new(parents, &self.config.simulation),
        })
    }

    /// Nobody to breed: keep running at the current speed without asking the
    /// collaborator. An extinct tank is optionally restocked.
    fn skip_breeding<R: Rng>(
        &mut self,
        pools: &BreedingPools,
        average_fitness: f64,
        best_fitness: f64,
        rng: &mut R,
    ) {
        let living = pools.living();
        if living == 0 {
            tracing::warn!(generation = self.generation, "Population extinct");
            self.record(SimEvent::Extinction {
                generation: self.generation,
            });
        } else {
            tracing::warn!(
                generation = self.generation,
                survivors = living,
                "Breeding pool empty, skipping breeding"
            );
            self.record(SimEvent::BreedingFailed {
                generation: self.generation,
                reason: "breeding pool is empty".to_string(),
            });
        }

        let reseed = living == 0 && self.config.simulation.reseed_on_extinction;
        if reseed {
            self.food.clear();
            self.spawn_founders(self.config.simulation.population_size, rng);
        }
        self.summaries.push(GenerationSummary {
            generation: self.generation,
            survivors: living,
            average_fitness,
            best_fitness,
            breeding_pool: 0,
            offspring: if reseed { self.fish.len() } else { 0 },
            next_population: self.fish.len(),
            bred: false,
        });
        if reseed {
            self.open_generation(self.fish.len());
        } else {
            self.generation_start_tick = self.ticks;
        }
    }

    /// Applies the collaborator's answer to the request issued with `ticket`.
    ///
    /// Success rebuilds the population from the kept pool and offspring;
    /// failure keeps everyone alive unbred. Either way the generation
    /// advances and the previous speed returns. Returns `false` when the
    /// ticket is stale and nothing changed.
    pub fn complete_breeding<R: Rng>(
        &mut self,
        ticket: BreedingTicket,
        result: std::result::Result<Vec<Genome>, BreedingError>,
        rng: &mut R,
    ) -> bool {
        let matches = self.state == SimState::Breeding
            && self.in_flight.as_ref().is_some_and(|f| f.ticket == ticket);
        if !matches {
            tracing::debug!(
                generation = ticket.generation,
                state = ?self.state,
                "Discarding stale breeding result"
            );
            return false;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return false;
        };
        let survivors = in_flight.pools.living();
        let breeding_pool = in_flight.pools.breeding.len();

        let (offspring, bred) = match result {
            Ok(genomes) if !genomes.is_empty() => {
                let placed = self.replace_population(&in_flight.pools, genomes, rng);
                (placed, true)
            }
            Ok(_) => {
                self.breeding_failed(&BreedingError::EmptyResponse);
                (0, false)
            }
            Err(err) => {
                self.breeding_failed(&err);
                (0, false)
            }
        };
        self.food.clear();

        self.summaries.push(GenerationSummary {
            generation: self.generation,
            survivors,
            average_fitness: in_flight.average_fitness,
            best_fitness: in_flight.best_fitness,
            breeding_pool,
            offspring,
            next_population: self.fish.len(),
            bred,
        });
        self.speed_multiplier = in_flight.saved_speed;
        self.state = SimState::Running;
        self.open_generation(offspring);
        true
    }

    fn breeding_failed(&mut self, err: &BreedingError) {
        tracing::warn!(
            generation = self.generation,
            error = %err,
            "Breeding failed, parents survive unbred"
        );
        self.record(SimEvent::BreedingFailed {
            generation: self.generation,
            reason: err.to_string(),
        });
    }

    fn replace_population<R: Rng>(
        &mut self,
        pools: &BreedingPools,
        offspring: Vec<Genome>,
        rng: &mut R,
    ) -> usize {
        let target = self.config.simulation.population_size;
        let kept_indices = pools.kept(self.config.simulation.breeding_strategy);

        let mut old: Vec<Option<Fish>> = std::mem::take(&mut self.fish)
            .into_iter()
            .map(Some)
            .collect();
        let kept: Vec<Fish> = kept_indices
            .iter()
            .filter_map(|&i| old.get_mut(i).and_then(Option::take))
            .collect();

        let needed = offspring_needed(kept.len(), offspring.len(), target);
        self.fish = kept;
        for genome in offspring.into_iter().take(needed) {
            let (x, y) = self.random_point(self.config.fish.wall_margin, rng);
            self.add_fish(genome, x, y, rng);
        }
        needed
    }

    fn open_generation(&mut self, offspring: usize) {
        self.generation += 1;
        self.generation_population = self.fish.len();
        self.generation_start_tick = self.ticks;
        tracing::info!(
            generation = self.generation,
            population = self.fish.len(),
            offspring,
            "Generation started"
        );
        self.record(SimEvent::GenerationStarted {
            generation: self.generation,
            population: self.fish.len(),
            offspring,
        });
    }

    /// Stops the simulation for good and invalidates any pending breeding.
    pub fn stop(&mut self) {
        if self.state == SimState::Stopped {
            return;
        }
        if let Some(in_flight) = self.in_flight.take() {
            self.speed_multiplier = in_flight.saved_speed;
        }
        self.state = SimState::Stopped;
        tracing::info!(generation = self.generation, "Simulation stopped");
        self.record(SimEvent::Stopped);
    }

    /// Places a fish with the given genome, head at `(x, y)`. Returns its id.
    pub fn add_fish<R: Rng>(&mut self, genome: Genome, x: f64, y: f64, rng: &mut R) -> u64 {
        let id = self.next_fish_id;
        self.next_fish_id += 1;
        self.fish
            .push(Fish::new(id, genome, x, y, &self.config, rng));
        id
    }

    pub fn add_food(&mut self, x: f64, y: f64) {
        self.food.push(FoodItem::new(x, y));
    }

    fn spawn_founders<R: Rng>(&mut self, count: usize, rng: &mut R) {
        for _ in 0..count {
            let (x, y) = self.spawn_position(rng);
            let genome = random_genome(&self.config.brain, rng);
            self.add_fish(genome, x, y, rng);
        }
    }

    /// Rejection-samples a point at least `spawn_spacing` from every head;
    /// settles for the last candidate when the retry budget runs out.
    fn spawn_position<R: Rng>(&self, rng: &mut R) -> (f64, f64) {
        let spacing = self.config.world.spawn_spacing;
        let margin = self.config.fish.wall_margin;
        let mut candidate = self.random_point(margin, rng);
        for _ in 0..self.config.world.spawn_attempts {
            let clear = self.fish.iter().all(|f| {
                let (x, y) = f.position();
                (x - candidate.0).hypot(y - candidate.1) >= spacing
            });
            if clear {
                break;
            }
            candidate = self.random_point(margin, rng);
        }
        candidate
    }

    fn random_point<R: Rng>(&self, inset: f64, rng: &mut R) -> (f64, f64) {
        let axis = |extent: f64, rng: &mut R| {
            if extent > 2.0 * inset {
                rng.gen_range(inset..extent - inset)
            } else {
                extent / 2.0
            }
        };
        let x = axis(self.bounds.width, rng);
        let y = axis(self.bounds.height, rng);
        (x, y)
    }

    fn record(&mut self, event: SimEvent) {
        self.metrics.record_event(&event);
        let capacity = self.config.world.event_log_capacity;
        if capacity == 0 {
            return;
        }
        while self.events.len() >= capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Removes and returns every logged event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    fn take_sample(&mut self) {
        let stats = self.stats();
        let sample = StatsSample {
            time: self.sim_time(),
            population: stats.population,
            mean_size: stats.mean_size,
            mean_speed: stats.mean_speed,
            mean_energy: stats.mean_energy,
            mean_metabolism: stats.mean_metabolism,
        };
        self.latest_sample = sample;
        let capacity = self.config.world.stats_history;
        if capacity == 0 {
            return;
        }
        while self.history.len() >= capacity {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }

    fn fitness_summary(&self) -> (f64, f64) {
        let living: Vec<f64> = self
            .fish
            .iter()
            .filter(|f| !f.is_dead())
            .map(|f| rank_score(f, &self.config.selection))
            .collect();
        if living.is_empty() {
            return (0.0, 0.0);
        }
        let average = living.iter().sum::<f64>() / living.len() as f64;
        let best = living.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (average, best)
    }

    /// Aggregates over the live population.
    #[must_use]
    pub fn stats(&self) -> PopulationStats {
        let living: Vec<&Fish> = self.fish.iter().filter(|f| !f.is_dead()).collect();
        let count = living.len();
        let mean = |value: fn(&Fish) -> f64| {
            if count == 0 {
                0.0
            } else {
                living.iter().map(|f| value(f)).sum::<f64>() / count as f64
            }
        };
        let (average_fitness, best_fitness) = self.fitness_summary();
        PopulationStats {
            generation: self.generation,
            population: count,
            food_count: self.food.len(),
            survival_rate: if self.generation_population == 0 {
                0.0
            } else {
                count as f64 / self.generation_population as f64
            },
            mean_size: mean(|f| f.genome().size),
            mean_speed: mean(|f| f.genome().speed),
            mean_energy: mean(Fish::energy),
            mean_metabolism: mean(Fish::metabolism),
            average_fitness,
            best_fitness,
        }
    }

    /// Read-only view for renderers and charts.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            state: self.state,
            generation: self.generation,
            sim_time: self.sim_time(),
            time_to_next_generation: self.time_to_next_generation(),
            speed_multiplier: self.speed_multiplier,
            water_temperature: self.config.simulation.water_temperature,
            bounds: self.bounds,
            fish: self
                .fish
                .iter()
                .map(|f| f.snapshot(&self.config.selection))
                .collect(),
            food: self.food.clone(),
            stats: self.stats(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SimState {
        self.state
    }

    #[must_use]
    pub fn is_breeding(&self) -> bool {
        self.state == SimState::Breeding
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Simulated seconds since start.
    #[must_use]
    pub fn sim_time(&self) -> f64 {
        self.ticks as f64 * self.step_seconds
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn time_to_next_generation(&self) -> f64 {
        let elapsed = (self.ticks - self.generation_start_tick) as f64 * self.step_seconds;
        (self.config.simulation.generation_length - elapsed).max(0.0)
    }

    #[must_use]
    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Sets the speed multiplier. While breeding the new value takes effect
    /// once breeding completes.
    pub fn set_speed_multiplier(&mut self, speed: f64) {
        if !speed.is_finite() || speed < 0.0 {
            return;
        }
        match self.in_flight.as_mut() {
            Some(in_flight) => in_flight.saved_speed = speed,
            None => self.speed_multiplier = speed,
        }
    }

    pub fn set_water_temperature(&mut self, temperature: f64) {
        if temperature.is_finite() {
            self.config.simulation.water_temperature = temperature;
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[must_use]
    pub fn fish(&self) -> &[Fish] {
        &self.fish
    }

    pub fn fish_mut(&mut self) -> &mut [Fish] {
        &mut self.fish
    }

    #[must_use]
    pub fn food(&self) -> &[FoodItem] {
        &self.food
    }

    #[must_use]
    pub fn latest_sample(&self) -> &StatsSample {
        &self.latest_sample
    }

    #[must_use]
    pub fn history(&self) -> &VecDeque<StatsSample> {
        &self.history
    }

    #[must_use]
    pub fn summaries(&self) -> &[GenerationSummary] {
        &self.summaries
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
