//! The fish agent: genome-derived physique, body chain, steering policy and
//! energy budget behind a single per-step `update`.

use crate::body::Body;
use crate::brain::BrainLogic;
use crate::config::{AppConfig, BrainConfig, FishConfig, SelectionConfig};
use crate::decision::{DecisionContext, DecisionPolicy};
use crate::metabolism::{mass_in_grams, metabolic_rate};
use crate::perception::{can_eat, Neighbor, Perception};
use rand::Rng;
use shoal_data::{Bounds, FishSnapshot, FoodItem, Genome, NeuralWeights, TraitSet};
use std::f64::consts::TAU;

/// Read-only view of the tank handed to each fish for one step.
#[derive(Clone, Copy, Debug)]
pub struct Surroundings<'a> {
    pub bounds: &'a Bounds,
    pub food: &'a [FoodItem],
    /// Every fish of the population at its current position, including the
    /// one being updated; entries with `alive == false` are ignored.
    pub neighbors: &'a [Neighbor],
    pub water_temperature: f64,
}

/// What a fish ate during a step, for the caller to apply to the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Feeding {
    /// Index into the food list.
    Food { index: usize, energy: f64 },
    /// Index into the population.
    Prey { index: usize, energy: f64 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub feeding: Option<Feeding>,
    /// True only on the step the fish died.
    pub died: bool,
}

/// Uniformly sampled genome for a founding fish.
pub fn random_genome<R: Rng>(brain: &BrainConfig, rng: &mut R) -> Genome {
    let mut genome = Genome::new(rng.gen(), rng.gen(), rng.gen());
    if brain.sample_traits {
        genome = genome.with_traits(random_traits(rng));
    }
    if brain.neural_control {
        let traits = genome.traits.unwrap_or_default();
        genome = genome.with_neural_weights(NeuralWeights::new_random_with_rng(
            brain.hidden_nodes,
            &traits,
            brain.weight_scale,
            rng,
        ));
    }
    genome
}

pub fn random_traits<R: Rng>(rng: &mut R) -> TraitSet {
    TraitSet::from_array(std::array::from_fn(|_| rng.gen()))
}

#[derive(Clone, Debug)]
pub struct Fish {
    id: u64,
    genome: Genome,
    traits: Option<TraitSet>,
    mass_grams: f64,
    visual_scale: f64,
    max_speed: f64,
    energy: f64,
    metabolism: f64,
    throttle: f64,
    age_ticks: u64,
    body: Body,
    policy: DecisionPolicy,
}

impl Fish {
    /// Builds a fish at `(x, y)` with a random heading. The genome is
    /// sanitised first; a genome without weights still gets a neural policy
    /// when neural control is enabled.
    pub fn new<R: Rng>(
        id: u64,
        genome: Genome,
        x: f64,
        y: f64,
        config: &AppConfig,
        rng: &mut R,
    ) -> Self {
        let genome = genome.sanitized();
        let traits = genome.traits;
        let policy = DecisionPolicy::for_genome(
            &genome,
            &traits.unwrap_or_default(),
            &config.brain,
            rng,
        );
        let visual_scale = 0.5 + genome.size;
        let heading = rng.gen_range(0.0..TAU);
        let metabolism = metabolic_rate(
            genome.size,
            0.0,
            config.simulation.water_temperature,
            traits.as_ref(),
            &config.metabolism,
        );
        Self {
            id,
            mass_grams: mass_in_grams(genome.size),
            visual_scale,
            max_speed: config.fish.top_speed * (0.3 + 0.7 * genome.speed),
            energy: config.fish.initial_energy.min(config.fish.max_energy),
            metabolism,
            throttle: 0.0,
            age_ticks: 0,
            body: Body::new(x, y, heading, &config.fish, visual_scale),
            traits,
            policy,
            genome,
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    #[must_use]
    pub fn traits(&self) -> Option<&TraitSet> {
        self.traits.as_ref()
    }

    #[must_use]
    pub fn mass_grams(&self) -> f64 {
        self.mass_grams
    }

    #[must_use]
    pub fn visual_scale(&self) -> f64 {
        self.visual_scale
    }

    /// Distance covered per step at full throttle.
    #[must_use]
    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    #[must_use]
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Energy drained on the most recent step.
    #[must_use]
    pub fn metabolism(&self) -> f64 {
        self.metabolism
    }

    #[must_use]
    pub fn age_ticks(&self) -> u64 {
        self.age_ticks
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[must_use]
    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.energy <= 0.0
    }

    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        let head = self.body.head();
        (head.x, head.y)
    }

    /// Overrides the energy level, capped at `max_energy`.
    pub fn set_energy(&mut self, energy: f64, config: &FishConfig) {
        if !energy.is_nan() {
            self.energy = energy.min(config.max_energy);
        }
    }

    /// Zeroes the energy of a live fish. Returns whether it was alive.
    pub fn kill(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        self.energy = 0.0;
        true
    }

    #[must_use]
    pub fn as_neighbor(&self, index: usize) -> Neighbor {
        let (x, y) = self.position();
        Neighbor {
            index,
            x,
            y,
            mass_grams: self.mass_grams,
            alive: !self.is_dead(),
        }
    }

    /// Genome handed to breeding: the original genes plus the weights the
    /// fish actually swims with.
    #[must_use]
    pub fn export_genome(&self) -> Genome {
        let mut genome = self.genome.clone();
        if let Some(weights) = self.policy.weights() {
            genome.neural_weights = Some(weights.clone());
        }
        genome
    }

    /// `energy_weight * energy + efficiency_weight * energy / metabolism`.
    #[must_use]
    pub fn calculate_fitness(&self, selection: &SelectionConfig) -> f64 {
        let efficiency = if self.metabolism > 0.0 {
            self.energy / self.metabolism
        } else {
            0.0
        };
        selection.energy_weight * self.energy + selection.efficiency_weight * efficiency
    }

    /// One step: decide, move, feed, burn, check death. Does nothing once dead.
    pub fn update<R: Rng>(
        &mut self,
        index: usize,
        world: &Surroundings<'_>,
        config: &AppConfig,
        rng: &mut R,
    ) -> StepOutcome {
        if self.is_dead() {
            return StepOutcome::default();
        }
        let fish_cfg = &config.fish;
        self.age_ticks += 1;

        let others = world
            .neighbors
            .iter()
            .copied()
            .filter(|n| n.alive && n.index != index);
        let perception = Perception::sense(
            self.position(),
            self.body.heading(),
            self.mass_grams,
            world.food,
            others.clone(),
            fish_cfg.can_eat_ratio,
        );
        let traits = self.traits.unwrap_or_default();
        let decision = self.policy.decide(
            &DecisionContext {
                perception: &perception,
                energy_fraction: self.energy / fish_cfg.max_energy,
                speed_fraction: self.throttle,
                traits: &traits,
            },
            fish_cfg,
            rng,
        );
        self.throttle = decision.speed;

        self.body.move_head(
            world.bounds,
            Some(decision),
            self.max_speed * decision.speed,
            fish_cfg,
        );
        self.body.follow();

        let feeding = self.find_meal(world.food, others, fish_cfg);
        if let Some(meal) = feeding {
            let gain = match meal {
                Feeding::Food { energy, .. } | Feeding::Prey { energy, .. } => energy,
            };
            self.energy = (self.energy + gain).min(fish_cfg.max_energy);
        }

        self.metabolism = metabolic_rate(
            self.genome.size,
            self.genome.speed * decision.speed,
            world.water_temperature,
            self.traits.as_ref(),
            &config.metabolism,
        );
        self.energy -= self.metabolism;

        StepOutcome {
            feeding,
            died: self.is_dead(),
        }
    }

    fn find_meal(
        &self,
        food: &[FoodItem],
        others: impl Iterator<Item = Neighbor>,
        config: &FishConfig,
    ) -> Option<Feeding> {
        let (x, y) = self.position();
        let reach = config.eat_radius * self.visual_scale;

        let pellet = food
            .iter()
            .position(|f| (f.x - x).hypot(f.y - y) <= reach);
        if let Some(index) = pellet {
            let energy = config.food_energy * (1.0 + config.food_size_bonus * self.genome.size);
            return Some(Feeding::Food { index, energy });
        }

        others
            .filter(|n| can_eat(self.mass_grams, n.mass_grams, config.can_eat_ratio))
            .find(|n| (n.x - x).hypot(n.y - y) <= reach)
            .map(|prey| Feeding::Prey {
                index: prey.index,
                energy: config.predation_energy * prey.mass_grams / self.mass_grams,
            })
    }

    #[must_use]
    pub fn snapshot(&self, selection: &SelectionConfig) -> FishSnapshot {
        let (x, y) = self.position();
        FishSnapshot {
            id: self.id,
            color: self.genome.color,
            speed: self.genome.speed,
            size: self.genome.size,
            mass_grams: self.mass_grams,
            energy: self.energy,
            metabolism: self.metabolism,
            fitness: self.calculate_fitness(selection),
            neural: self.policy.is_neural(),
            x,
            y,
            heading: self.body.heading(),
            segments: self
                .body
                .segments()
                .iter()
                .map(|s| (s.x, s.y, s.radius))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn calm_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.fish.wander_chance = 0.0;
        config.fish.heading_jitter = 0.0;
        config
    }

    fn surroundings<'a>(
        bounds: &'a Bounds,
        food: &'a [FoodItem],
        neighbors: &'a [Neighbor],
    ) -> Surroundings<'a> {
        Surroundings {
            bounds,
            food,
            neighbors,
            water_temperature: 20.0,
        }
    }

    #[test]
    fn test_derived_physique() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let fish = Fish::new(1, Genome::new(0.2, 1.0, 1.0), 100.0, 100.0, &config, &mut rng);
        assert!((fish.mass_grams() - 1000.0).abs() < 1e-6);
        assert_eq!(fish.visual_scale(), 1.5);
        assert!((fish.max_speed() - config.fish.top_speed).abs() < 1e-9);
        assert_eq!(fish.energy(), config.fish.initial_energy);
    }

    #[test]
    fn test_energy_drops_by_metabolism() {
        let config = calm_config();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let bounds = Bounds::new(config.world.width, config.world.height);
        let mut fish = Fish::new(1, Genome::new(0.5, 0.5, 0.5), 400.0, 300.0, &config, &mut rng);
        let before = fish.energy();
        let outcome = fish.update(0, &surroundings(&bounds, &[], &[]), &config, &mut rng);
        assert!(outcome.feeding.is_none());
        assert!(fish.metabolism() > 0.0);
        assert!((fish.energy() - (before - fish.metabolism())).abs() < 1e-12);
    }

    #[test]
    fn test_eats_food_in_reach() {
        let config = calm_config();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let bounds = Bounds::new(config.world.width, config.world.height);
        let mut fish = Fish::new(1, Genome::new(0.5, 0.0, 0.0), 400.0, 300.0, &config, &mut rng);
        fish.set_energy(50.0, &config.fish);
        let (x, y) = fish.position();
        let food = [FoodItem::new(x, y)];
        let outcome = fish.update(0, &surroundings(&bounds, &food, &[]), &config, &mut rng);
        assert!(matches!(
            outcome.feeding,
            Some(Feeding::Food { index: 0, .. })
        ));
        assert!(fish.energy() > 50.0);
    }

    #[test]
    fn test_energy_gain_is_capped() {
        let config = calm_config();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let bounds = Bounds::new(config.world.width, config.world.height);
        let mut fish = Fish::new(1, Genome::new(0.5, 0.0, 0.0), 400.0, 300.0, &config, &mut rng);
        let (x, y) = fish.position();
        let food = [FoodItem::new(x, y)];
        fish.update(0, &surroundings(&bounds, &food, &[]), &config, &mut rng);
        assert!(fish.energy() <= config.fish.max_energy - fish.metabolism() + 1e-12);
    }

    #[test]
    fn test_dead_fish_is_inert() {
        let config = calm_config();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let bounds = Bounds::new(config.world.width, config.world.height);
        let mut fish = Fish::new(1, Genome::new(0.5, 0.5, 0.5), 400.0, 300.0, &config, &mut rng);
        assert!(fish.kill());
        assert!(!fish.kill());
        let (x, y) = fish.position();
        let food = [FoodItem::new(x, y)];
        let outcome = fish.update(0, &surroundings(&bounds, &food, &[]), &config, &mut rng);
        assert_eq!(outcome, StepOutcome::default());
        assert_eq!(fish.energy(), 0.0);
        assert_eq!(fish.position(), (x, y));
    }

    #[test]
    fn test_death_reported_once() {
        let config = calm_config();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let bounds = Bounds::new(config.world.width, config.world.height);
        let mut fish = Fish::new(1, Genome::new(0.5, 1.0, 1.0), 400.0, 300.0, &config, &mut rng);
        fish.set_energy(1e-5, &config.fish);
        let world = surroundings(&bounds, &[], &[]);
        assert!(fish.update(0, &world, &config, &mut rng).died);
        assert!(fish.is_dead());
        assert!(!fish.update(0, &world, &config, &mut rng).died);
    }

    #[test]
    fn test_predation_on_small_neighbor() {
        let config = calm_config();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let bounds = Bounds::new(config.world.width, config.world.height);
        let mut shark = Fish::new(1, Genome::new(0.5, 0.0, 1.0), 400.0, 300.0, &config, &mut rng);
        shark.set_energy(10.0, &config.fish);
        let (x, y) = shark.position();
        let neighbors = [
            shark.as_neighbor(0),
            Neighbor {
                index: 1,
                x,
                y,
                mass_grams: 10.0,
                alive: true,
            },
        ];
        let outcome = shark.update(0, &surroundings(&bounds, &[], &neighbors), &config, &mut rng);
        match outcome.feeding {
            Some(Feeding::Prey { index, energy }) => {
                assert_eq!(index, 1);
                assert!((energy - config.fish.predation_energy * 10.0 / 1000.0).abs() < 1e-9);
            }
            other => panic!("expected predation, got {other:?}"),
        }
    }

    #[test]
    fn test_fitness_rewards_energy_and_efficiency() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut fish = Fish::new(1, Genome::new(0.5, 0.5, 0.5), 400.0, 300.0, &config, &mut rng);
        let high = fish.calculate_fitness(&config.selection);
        fish.set_energy(20.0, &config.fish);
        let low = fish.calculate_fitness(&config.selection);
        assert!(high > low);
        let expected = 20.0 + config.selection.efficiency_weight * 20.0 / fish.metabolism();
        assert!((low - expected).abs() < 1e-9);
    }

    #[test]
    fn test_export_carries_policy_weights() {
        let mut config = AppConfig::default();
        config.brain.neural_control = true;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let fish = Fish::new(1, Genome::new(0.5, 0.5, 0.5), 400.0, 300.0, &config, &mut rng);
        let exported = fish.export_genome();
        assert_eq!(exported.neural_weights.as_ref(), fish.policy().weights());
    }

    #[test]
    fn test_random_genome_respects_brain_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let plain = random_genome(
            &BrainConfig {
                sample_traits: false,
                neural_control: false,
                ..BrainConfig::default()
            },
            &mut rng,
        );
        assert!(plain.traits.is_none() && plain.neural_weights.is_none());
        let rich = random_genome(
            &BrainConfig {
                neural_control: true,
                ..BrainConfig::default()
            },
            &mut rng,
        );
        assert!(rich.traits.is_some());
        assert!(rich.neural_weights.expect("weights").is_compatible());
    }
}
