//! Fixed-topology feed-forward controller: one tanh hidden layer, two tanh
//! outputs (turn, speed).
//!
//! The weights themselves are plain data ([`NeuralWeights`]) so they can ride
//! along in a [`shoal_data::Genome`]; the behaviour lives in [`BrainLogic`].

pub mod crossover;
pub mod forward;
pub mod mutation;
pub mod topology;

pub use shoal_data::{NeuralWeights, TraitSet};
use rand::Rng;

/// Trait defining the core logic of the neural controller.
pub trait BrainLogic {
    /// Random weights, scaled per input group by the matching trait.
    fn new_random_with_rng<R: Rng>(
        hidden: usize,
        traits: &TraitSet,
        weight_scale: f32,
        rng: &mut R,
    ) -> Self;

    #[must_use]
    fn forward(&self, inputs: &[f32; BRAIN_INPUTS]) -> [f32; BRAIN_OUTPUTS];

    /// Uniform element-wise crossover; `None` when the shapes differ.
    fn crossover_with_rng<R: Rng>(&self, other: &Self, rng: &mut R) -> Option<Self>
    where
        Self: Sized;

    /// Perturbs each weight with probability `rate` by up to `±amount`.
    fn mutate_with_rng<R: Rng>(&mut self, rate: f64, amount: f32, rng: &mut R);

    /// Mean absolute weight difference, `f32::INFINITY` when shapes differ.
    fn distance(&self, other: &Self) -> f32;

    /// Whether the matrices fit this controller's input/output layout.
    fn is_compatible(&self) -> bool;
}

pub const INPUT_LABELS: [&str; 14] = [
    "FoodAngle",
    "FoodDist",
    "PredatorAngle",
    "PredatorDist",
    "PreyAngle",
    "PreyDist",
    "Energy",
    "Speed",
    "Aggressiveness",
    "Cautiousness",
    "FoodMotivation",
    "EnergyEfficiency",
    "LearningRate",
    "Adaptability",
];

pub const OUTPUT_LABELS: [&str; 2] = ["Turn", "Speed"];

pub const BRAIN_INPUTS: usize = INPUT_LABELS.len();
pub const BRAIN_OUTPUTS: usize = OUTPUT_LABELS.len();
/// Index of the first trait input.
pub const TRAIT_INPUT_START: usize = 8;
/// Clamp applied to every weight after mutation.
pub const WEIGHT_LIMIT: f32 = 5.0;

impl BrainLogic for NeuralWeights {
    fn new_random_with_rng<R: Rng>(
        hidden: usize,
        traits: &TraitSet,
        weight_scale: f32,
        rng: &mut R,
    ) -> Self {
        topology::create_weights_random_with_rng(hidden, traits, weight_scale, rng)
    }

    fn forward(&self, inputs: &[f32; BRAIN_INPUTS]) -> [f32; BRAIN_OUTPUTS] {
        forward::forward(self, inputs)
    }

    fn crossover_with_rng<R: Rng>(&self, other: &Self, rng: &mut R) -> Option<Self> {
        crossover::weights_crossover_with_rng(self, other, rng)
    }

    fn mutate_with_rng<R: Rng>(&mut self, rate: f64, amount: f32, rng: &mut R) {
        mutation::mutate_with_rng(self, rate, amount, rng);
    }

    fn distance(&self, other: &Self) -> f32 {
        crossover::weights_distance(self, other)
    }

    fn is_compatible(&self) -> bool {
        self.has_shape(BRAIN_INPUTS, BRAIN_OUTPUTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_weights_are_compatible() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let brain = NeuralWeights::new_random_with_rng(8, &TraitSet::default(), 1.0, &mut rng);
        assert!(brain.is_compatible());
        assert_eq!(brain.hidden_count(), 8);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let brain = NeuralWeights::new_random_with_rng(4, &TraitSet::default(), 1.0, &mut rng);
        assert_eq!(brain.distance(&brain), 0.0);
    }

    #[test]
    fn test_labels_match_trait_layout() {
        assert_eq!(BRAIN_INPUTS - TRAIT_INPUT_START, TraitSet::COUNT);
        assert_eq!(INPUT_LABELS[TRAIT_INPUT_START], "Aggressiveness");
    }
}
