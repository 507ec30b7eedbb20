//! Plain data shared by the shoal engine, driver and any presentation layer.

pub mod data;

pub use data::entity::{Decision, FishSnapshot, FoodItem};
pub use data::environment::{
    Bounds, GenerationSummary, PopulationStats, SimEvent, SimState, StatsSample, WorldSnapshot,
};
pub use data::genotype::{Genome, NeuralWeights, TraitSet};
