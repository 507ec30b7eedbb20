//! Frame-driven async driver around the population manager.
//!
//! The driver owns the RNG and the breeder. Breeding requests run as tokio
//! tasks while frames keep coming at speed 0; a finished task is handed back
//! to the population on the next frame.

pub mod shutdown;

pub use shutdown::ShutdownManager;

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal_core::breeding::Breeder;
use shoal_core::config::AppConfig;
use shoal_core::error::BreedingError;
use shoal_core::population::{BreedingTicket, PendingBreeding, Population};
use shoal_data::{Genome, SimEvent, SimState};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

type BreedingTask = JoinHandle<std::result::Result<Vec<Genome>, BreedingError>>;

pub struct App {
    population: Population,
    breeder: Arc<dyn Breeder>,
    rng: ChaCha8Rng,
    pending: Option<(BreedingTicket, BreedingTask)>,
    shutdown: ShutdownManager,
    frame_count: u64,
}

impl App {
    /// Validates `config` and seeds the RNG from `world.seed`, or from
    /// entropy when unset.
    pub fn new(config: AppConfig, breeder: Arc<dyn Breeder>) -> Result<Self> {
        let rng = match config.world.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let population = Population::new(config)?;
        Ok(Self {
            population,
            breeder,
            rng,
            pending: None,
            shutdown: ShutdownManager::new(),
            frame_count: 0,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.population.start(&mut self.rng)?;
        Ok(())
    }

    /// Advances one frame of `real_dt` seconds.
    ///
    /// Hands a finished breeding result back first, then steps the
    /// population; a generation boundary spawns the breeder call.
    pub async fn frame(&mut self, real_dt: f64) {
        self.frame_count += 1;
        self.poll_breeding().await;
        if let Some(pending) = self.population.advance(real_dt, &mut self.rng) {
            self.dispatch(pending);
        }
    }

    fn dispatch(&mut self, pending: PendingBreeding) {
        let PendingBreeding { ticket, request } = pending;
        let breeder = Arc::clone(&self.breeder);
        tracing::debug!(
            generation = ticket.generation(),
            parents = request.parents.len(),
            "Dispatching breeding request"
        );
        let task = tokio::spawn(async move { breeder.breed(&request).await });
        self.pending = Some((ticket, task));
    }

    async fn poll_breeding(&mut self) {
        let finished = match &self.pending {
            Some((_, task)) => task.is_finished(),
            None => return,
        };
        if !finished {
            // Let the breeder task make progress on a single-threaded runtime.
            tokio::task::yield_now().await;
            return;
        }
        let Some((ticket, task)) = self.pending.take() else {
            return;
        };
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(BreedingError::transport(format!("breeding task failed: {e}"))),
        };
        self.population
            .complete_breeding(ticket, result, &mut self.rng);
    }

    /// Stops the population and abandons any breeding in flight.
    pub fn stop(&mut self) {
        if let Some((_, task)) = self.pending.take() {
            task.abort();
        }
        self.population.stop();
    }

    /// Drives frames at `frame_interval` until `sim_seconds` of simulated
    /// time have passed, shutdown is requested, or the simulation stops.
    pub async fn run(&mut self, sim_seconds: f64, frame_interval: Duration) -> Result<()> {
        if self.population.state() == SimState::Initializing {
            self.start()?;
        }
        let ctrl_c = self.shutdown.listen_for_ctrl_c();
        let mut interval = tokio::time::interval(frame_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let real_dt = frame_interval.as_secs_f64();

        while self.population.sim_time() < sim_seconds
            && !self.shutdown.is_shutdown_requested()
            && self.population.state() != SimState::Stopped
        {
            interval.tick().await;
            self.frame(real_dt).await;
        }

        ctrl_c.abort();
        self.stop();
        tracing::info!(
            frames = self.frame_count,
            generation = self.population.generation(),
            sim_time = self.population.sim_time(),
            "Run finished"
        );
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.population.drain_events()
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    #[must_use]
    pub fn is_breeding_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn shutdown(&self) -> &ShutdownManager {
        &self.shutdown
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
