//! Steering policies. A fish picks one at construction and keeps it for life.

use crate::brain::BrainLogic;
use crate::config::{BrainConfig, FishConfig};
use crate::perception::Perception;
use rand::Rng;
use shoal_data::{Decision, Genome, NeuralWeights, TraitSet};

/// Throttle of a heuristic fish with nothing to chase.
const CRUISE_SPEED: f64 = 0.5;

/// Internal state a policy may read besides what was sensed.
#[derive(Clone, Copy, Debug)]
pub struct DecisionContext<'a> {
    pub perception: &'a Perception,
    /// Energy over the maximum, in `[-1, 1]`.
    pub energy_fraction: f64,
    /// Throttle used on the previous step.
    pub speed_fraction: f64,
    pub traits: &'a TraitSet,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DecisionPolicy {
    /// Steer at food in range, otherwise cruise with jitter and the odd
    /// random turn.
    Heuristic,
    /// Feed-forward controller.
    Neural(NeuralWeights),
}

impl DecisionPolicy {
    /// Neural when the genome carries weights that fit the controller, or when
    /// neural control is enabled and fresh weights can be drawn; heuristic
    /// otherwise.
    pub fn for_genome<R: Rng>(
        genome: &Genome,
        traits: &TraitSet,
        brain: &BrainConfig,
        rng: &mut R,
    ) -> Self {
        match &genome.neural_weights {
            Some(weights) if weights.is_compatible() => Self::Neural(weights.clone()),
            _ if brain.neural_control => Self::Neural(NeuralWeights::new_random_with_rng(
                brain.hidden_nodes,
                traits,
                brain.weight_scale,
                rng,
            )),
            _ => Self::Heuristic,
        }
    }

    #[must_use]
    pub fn is_neural(&self) -> bool {
        matches!(self, Self::Neural(_))
    }

    #[must_use]
    pub fn weights(&self) -> Option<&NeuralWeights> {
        match self {
            Self::Neural(w) => Some(w),
            Self::Heuristic => None,
        }
    }

    pub fn decide<R: Rng>(
        &self,
        ctx: &DecisionContext<'_>,
        config: &FishConfig,
        rng: &mut R,
    ) -> Decision {
        match self {
            Self::Heuristic => heuristic(ctx, config, rng),
            Self::Neural(weights) => {
                let inputs = ctx.perception.to_inputs(
                    ctx.energy_fraction,
                    ctx.speed_fraction,
                    ctx.traits,
                    config.sensing_range,
                );
                let out = weights.forward(&inputs);
                Decision::new(f64::from(out[0]), (f64::from(out[1]) + 1.0) / 2.0)
            }
        }
    }
}

fn heuristic<R: Rng>(ctx: &DecisionContext<'_>, config: &FishConfig, rng: &mut R) -> Decision {
    let max_turn = config.max_turn_rate.max(f64::EPSILON);
    if let Some(food) = ctx
        .perception
        .food
        .filter(|f| f.distance <= config.sensing_range)
    {
        return Decision::new(food.bearing / max_turn, 1.0);
    }

    let mut turn = if config.heading_jitter > 0.0 {
        rng.gen_range(-config.heading_jitter..=config.heading_jitter)
    } else {
        0.0
    };
    if rng.gen::<f64>() < config.wander_chance && config.wander_angle > 0.0 {
        turn = rng.gen_range(-config.wander_angle..=config.wander_angle);
    }
    Decision::new(turn / max_turn, CRUISE_SPEED)
}
