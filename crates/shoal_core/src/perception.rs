//! What a fish senses each step: the nearest pellet and the nearest other
//! fish, the latter tagged by the mass-ratio predation rule.

use crate::body::wrap_angle;
use crate::brain::{BRAIN_INPUTS, TRAIT_INPUT_START};
use shoal_data::{FoodItem, TraitSet};
use std::f64::consts::PI;

/// `prey` can be eaten by `predator` iff its mass is at most `ratio` times
/// the predator's.
#[must_use]
pub fn can_eat(predator_mass: f64, prey_mass: f64, ratio: f64) -> bool {
    prey_mass <= predator_mass * ratio
}

/// Another fish as seen by the sensing fish.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Index into the population's fish list.
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub mass_grams: f64,
    pub alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Predator,
    Prey,
    Peer,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sighting {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub distance: f64,
    /// Angle relative to the current heading, in `(-PI, PI]`.
    pub bearing: f64,
}

impl Sighting {
    fn new(index: usize, from: (f64, f64), heading: f64, x: f64, y: f64) -> Self {
        let dx = x - from.0;
        let dy = y - from.1;
        Self {
            index,
            x,
            y,
            distance: dx.hypot(dy),
            bearing: wrap_angle(dy.atan2(dx) - heading),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Perception {
    pub food: Option<Sighting>,
    pub nearest_fish: Option<(Sighting, Relation)>,
}

impl Perception {
    /// Scans every pellet and neighbour from the head. Ties keep the earliest
    /// entry.
    pub fn sense<I>(
        head: (f64, f64),
        heading: f64,
        own_mass: f64,
        food: &[FoodItem],
        neighbors: I,
        can_eat_ratio: f64,
    ) -> Self
    where
        I: IntoIterator<Item = Neighbor>,
    {
        let food = food
            .iter()
            .enumerate()
            .map(|(i, f)| Sighting::new(i, head, heading, f.x, f.y))
            .fold(None, nearer);

        let nearest_fish = neighbors
            .into_iter()
            .map(|n| {
                let relation = if can_eat(own_mass, n.mass_grams, can_eat_ratio) {
                    Relation::Prey
                } else if can_eat(n.mass_grams, own_mass, can_eat_ratio) {
                    Relation::Predator
                } else {
                    Relation::Peer
                };
                (Sighting::new(n.index, head, heading, n.x, n.y), relation)
            })
            .fold(None, |best: Option<(Sighting, Relation)>, candidate| {
                match best {
                    Some(b) if b.0.distance <= candidate.0.distance => Some(b),
                    _ => Some(candidate),
                }
            });

        Self { food, nearest_fish }
    }

    #[must_use]
    pub fn predator(&self) -> Option<&Sighting> {
        match &self.nearest_fish {
            Some((s, Relation::Predator)) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn prey(&self) -> Option<&Sighting> {
        match &self.nearest_fish {
            Some((s, Relation::Prey)) => Some(s),
            _ => None,
        }
    }

    /// Feature vector for the neural controller.
    ///
    /// Angles are divided by PI into `[-1, 1]`; distances are divided by
    /// `sensing_range` and capped at 1. Absent targets read as angle 0,
    /// distance 1.
    #[must_use]
    pub fn to_inputs(
        &self,
        energy_fraction: f64,
        speed_fraction: f64,
        traits: &TraitSet,
        sensing_range: f64,
    ) -> [f32; BRAIN_INPUTS] {
        let mut inputs = [0.0f32; BRAIN_INPUTS];
        let targets = [self.food.as_ref(), self.predator(), self.prey()];
        for (slot, target) in targets.into_iter().enumerate() {
            let (angle, distance) = encode(target, sensing_range);
            inputs[slot * 2] = angle;
            inputs[slot * 2 + 1] = distance;
        }
        inputs[6] = finite_unit(energy_fraction, -1.0);
        inputs[7] = finite_unit(speed_fraction, 0.0);
        for (i, value) in traits.sanitized().as_array().into_iter().enumerate() {
            inputs[TRAIT_INPUT_START + i] = value as f32;
        }
        inputs
    }
}

fn nearer(best: Option<Sighting>, candidate: Sighting) -> Option<Sighting> {
    match best {
        Some(b) if b.distance <= candidate.distance => Some(b),
        _ => Some(candidate),
    }
}

fn encode(target: Option<&Sighting>, sensing_range: f64) -> (f32, f32) {
    match target {
        Some(s) if sensing_range > 0.0 => (
            (s.bearing / PI) as f32,
            (s.distance / sensing_range).min(1.0) as f32,
        ),
        Some(s) => ((s.bearing / PI) as f32, 1.0),
        None => (0.0, 1.0),
    }
}

fn finite_unit(value: f64, low: f64) -> f32 {
    if value.is_finite() {
        value.clamp(low, 1.0) as f32
    } else {
        0.0
    }
}
