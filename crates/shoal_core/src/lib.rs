//! # Shoal Core
//!
//! The simulation engine for Shoal - an evolving population of procedurally
//! animated fish in a 2D tank.
//!
//! This crate contains the simulation logic, including:
//! - Segmented fish bodies with distance and bend constraints
//! - Perception and pluggable steering policies (heuristic or neural)
//! - Allometric, activity and thermal metabolism
//! - Fitness ranking, breeding pools and generational replacement
//! - The breeding collaborator boundary (in-process or HTTP)
//! - Metrics collection and structured logging
//!
//! ## Architecture
//!
//! - **Fixed-step updates**: [`population::Population`] converts frame time
//!   into whole simulation steps and updates fish sequentially in list order
//! - **Generation hand-off**: breeding is requested with a ticket and answered
//!   later, so the caller decides how the breeder is awaited
//! - **Injectable randomness**: everything that samples takes an `R: Rng`
//!
//! ## Example
//!
//! ```
//! use shoal_core::config::AppConfig;
//! use shoal_core::population::Population;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut population = Population::new(AppConfig::default()).unwrap();
//! population.start(&mut rng).unwrap();
//!
//! // One simulated second of frames.
//! for _ in 0..60 {
//!     let _ = population.advance(1.0 / 60.0, &mut rng);
//! }
//! assert_eq!(population.generation(), 1);
//! ```

/// Segmented body chain and its geometric constraints
pub mod body;
/// Fixed-topology feed-forward controller
pub mod brain;
/// Breeding collaborator trait and implementations
pub mod breeding;
/// Configuration management for simulation parameters
pub mod config;
/// Steering policies
pub mod decision;
/// Error types
pub mod error;
/// The fish agent
pub mod fish;
/// Energy drain model
pub mod metabolism;
/// Step and event counters, logging setup
pub mod metrics;
/// Nearest food / fish sensing
pub mod perception;
/// Population and generation state machine
pub mod population;
/// Fitness ranking and breeding pools
pub mod selection;

pub use brain::BrainLogic;
pub use breeding::{Breeder, BreedingRequest, HttpBreeder, HttpBreederConfig, LocalBreeder};
pub use error::{BreedingError, SimError};
pub use metrics::{init_logging, Metrics};
pub use population::{BreedingTicket, PendingBreeding, Population};
