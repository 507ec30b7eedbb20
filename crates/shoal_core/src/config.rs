//! Configuration management for simulation parameters.
//!
//! Strongly-typed configuration structures that map to a `config.toml` file.
//! Every section has defaults, so a file only needs the keys it overrides.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (`Default` impls)
//! 2. `config.toml` file (overrides defaults)
//! 3. Command-line flags of the `shoal` binary (override individual keys)
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [simulation]
//! population_size = 20
//! water_temperature = 12.0
//! generation_length = 90.0
//! breeding_strategy = "keep_non_breeders"
//!
//! [world]
//! width = 1024.0
//! height = 768.0
//! seed = 42
//!
//! [selection]
//! pool_size = "half_target"
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Upper bound for the stats history and event log ring buffers.
pub const MAX_BUFFER_LEN: usize = 100_000;

/// Which survivors make up the next generation alongside the offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    /// Breeding pool + offspring, up to the target size.
    #[default]
    KeepParents,
    /// Non-breeding pool + offspring, up to the target size.
    KeepNonBreeders,
}

/// How large the breeding pool is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoolSizePolicy {
    /// `ceil(living / 2)`.
    #[default]
    HalfLiving,
    /// `ceil(population_size / 2)`, capped at the number of living fish.
    HalfTarget,
}

/// Scalar used to rank survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Energy combined with metabolic efficiency.
    #[default]
    Fitness,
    /// Raw remaining energy.
    Energy,
}

/// The user-facing parameter set of one simulation run.
///
/// `mutation_rate` and `crossover_rate` are not read by the engine; they are
/// forwarded to the breeding collaborator with every request.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    pub population_size: usize,
    /// Expected food pellets spawned per simulated second.
    pub food_availability: f64,
    /// Water temperature in degrees Celsius.
    pub water_temperature: f64,
    /// Generation length in simulated seconds.
    pub generation_length: f64,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub breeding_strategy: ReplacementPolicy,
    pub reseed_on_extinction: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            food_availability: 0.5,
            water_temperature: 20.0,
            generation_length: 60.0,
            mutation_rate: 0.01,
            crossover_rate: 0.7,
            breeding_strategy: ReplacementPolicy::KeepParents,
            reseed_on_extinction: false,
        }
    }
}

/// Tank geometry and scheduling.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// Fixed number of agent updates per simulated second.
    pub ticks_per_second: f64,
    /// Upper bound on agent updates run by one frame, to avoid spiralling.
    pub max_steps_per_frame: u32,
    /// Minimum distance between freshly spawned fish.
    pub spawn_spacing: f64,
    /// Rejection-sampling budget per spawned fish.
    pub spawn_attempts: u32,
    /// Simulated seconds between statistics samples.
    pub stats_interval: f64,
    pub stats_history: usize,
    pub event_log_capacity: usize,
    pub max_food: usize,
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            ticks_per_second: 60.0,
            max_steps_per_frame: 240,
            spawn_spacing: 20.0,
            spawn_attempts: 50,
            stats_interval: 1.0,
            stats_history: 600,
            event_log_capacity: 256,
            max_food: 200,
            seed: None,
        }
    }
}

/// Body, locomotion and feeding parameters of a fish.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FishConfig {
    pub segment_count: usize,
    pub segment_length: f64,
    pub head_radius: f64,
    pub max_bend_angle: f64,
    /// Radians per tick at `turn = ±1`.
    pub max_turn_rate: f64,
    pub wall_margin: f64,
    /// Hard inset the head is clamped to.
    pub edge_padding: f64,
    pub wave_increment: f64,
    pub wave_amplitude: f64,
    /// Pixels per tick at speed gene 1 and full throttle.
    pub top_speed: f64,
    pub sensing_range: f64,
    pub can_eat_ratio: f64,
    /// Eat radius at visual scale 1.
    pub eat_radius: f64,
    pub food_energy: f64,
    /// Extra food energy fraction per unit of size gene.
    pub food_size_bonus: f64,
    /// Energy gained from prey of equal mass.
    pub predation_energy: f64,
    pub initial_energy: f64,
    pub max_energy: f64,
    /// Continuous heading jitter of the heuristic policy.
    pub heading_jitter: f64,
    /// Per-tick chance of an idle heading change.
    pub wander_chance: f64,
    pub wander_angle: f64,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            segment_count: 6,
            segment_length: 4.0,
            head_radius: 6.0,
            max_bend_angle: PI / 4.0,
            max_turn_rate: 0.2,
            wall_margin: 30.0,
            edge_padding: 5.0,
            wave_increment: 0.1,
            wave_amplitude: 0.3,
            top_speed: 5.0,
            sensing_range: 150.0,
            can_eat_ratio: 0.25,
            eat_radius: 8.0,
            food_energy: 20.0,
            food_size_bonus: 0.5,
            predation_energy: 60.0,
            initial_energy: 100.0,
            max_energy: 100.0,
            heading_jitter: 0.05,
            wander_chance: 0.02,
            wander_angle: PI / 4.0,
        }
    }
}

/// Constants of the allometric / thermal metabolism model.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MetabolismConfig {
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// `a` in `a * mass^b`.
    pub basal_coefficient: f64,
    /// `b` in `a * mass^b`.
    pub allometric_exponent: f64,
    pub activity_coefficient: f64,
    pub activity_exponent: f64,
    /// Fraction of activity cost a size-1 fish is spared.
    pub activity_size_compensation: f64,
    pub q10: f64,
    pub optimal_temperature: f64,
    /// Degrees the optimum drops from the smallest to the largest fish.
    pub optimal_size_shift: f64,
    pub tolerance_base: f64,
    pub tolerance_size_bonus: f64,
    pub stress_coefficient: f64,
    pub cold_threshold: f64,
    pub cold_penalty: f64,
    pub heat_threshold: f64,
    pub heat_penalty: f64,
    /// Fraction of cold/heat step penalty a size-1 fish resists.
    pub size_stress_resistance: f64,
    /// Metabolic saving of a size-1 fish relative to size 0.
    pub size_efficiency: f64,
    /// Metabolic swing across the energy-efficiency trait range.
    pub trait_efficiency: f64,
    pub minimum_fraction: f64,
    pub minimum_fraction_size_reduction: f64,
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            min_temperature: -2.0,
            max_temperature: 35.0,
            basal_coefficient: 0.0004,
            allometric_exponent: 0.75,
            activity_coefficient: 2.0,
            activity_exponent: 2.0,
            activity_size_compensation: 0.3,
            q10: 2.0,
            optimal_temperature: 20.0,
            optimal_size_shift: 6.0,
            tolerance_base: 6.0,
            tolerance_size_bonus: 4.0,
            stress_coefficient: 0.15,
            cold_threshold: 0.0,
            cold_penalty: 0.5,
            heat_threshold: 28.0,
            heat_penalty: 0.8,
            size_stress_resistance: 0.5,
            size_efficiency: 0.5,
            trait_efficiency: 0.2,
            minimum_fraction: 0.1,
            minimum_fraction_size_reduction: 0.02,
        }
    }
}

/// Neural controller settings.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BrainConfig {
    /// Give fish without inherited weights a random network instead of the
    /// heuristic policy.
    pub neural_control: bool,
    /// Sample a trait set for genomes that carry none.
    pub sample_traits: bool,
    pub hidden_nodes: usize,
    pub weight_scale: f32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            neural_control: false,
            sample_traits: true,
            hidden_nodes: 8,
            weight_scale: 1.0,
        }
    }
}

/// Fitness ranking and breeding-pool construction.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SelectionConfig {
    pub ranking: Ranking,
    pub pool_size: PoolSizePolicy,
    /// Drop the weakest parent when the pool is odd.
    pub require_even_pool: bool,
    pub energy_weight: f64,
    pub efficiency_weight: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            ranking: Ranking::Fitness,
            pool_size: PoolSizePolicy::HalfLiving,
            require_even_pool: true,
            energy_weight: 1.0,
            efficiency_weight: 0.01,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub world: WorldConfig,
    pub fish: FishConfig,
    pub metabolism: MetabolismConfig,
    pub brain: BrainConfig,
    pub selection: SelectionConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure. NaN and infinities are always rejected.
    pub fn validate(&self) -> anyhow::Result<()> {
        let sim = &self.simulation;
        anyhow::ensure!(sim.population_size > 0, "Population size must be positive");
        anyhow::ensure!(
            sim.population_size <= 10000,
            "Population size too large (max 10000)"
        );
        anyhow::ensure!(
            sim.food_availability.is_finite() && sim.food_availability >= 0.0,
            "Food availability must be a non-negative number"
        );
        anyhow::ensure!(
            sim.water_temperature.is_finite(),
            "Water temperature must be a number"
        );
        anyhow::ensure!(
            sim.generation_length.is_finite() && sim.generation_length > 0.0,
            "Generation length must be positive"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&sim.mutation_rate),
            "Mutation rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&sim.crossover_rate),
            "Crossover rate must be in [0.0, 1.0]"
        );

        let world = &self.world;
        anyhow::ensure!(
            world.width.is_finite() && world.width > 0.0,
            "Tank width must be positive"
        );
        anyhow::ensure!(
            world.height.is_finite() && world.height > 0.0,
            "Tank height must be positive"
        );
        anyhow::ensure!(
            world.ticks_per_second.is_finite() && world.ticks_per_second > 0.0,
            "Ticks per second must be positive"
        );
        anyhow::ensure!(
            world.max_steps_per_frame > 0,
            "Max steps per frame must be positive"
        );
        anyhow::ensure!(
            world.spawn_spacing.is_finite() && world.spawn_spacing >= 0.0,
            "Spawn spacing must be non-negative"
        );
        anyhow::ensure!(
            world.stats_interval.is_finite() && world.stats_interval > 0.0,
            "Stats interval must be positive"
        );

        let fish = &self.fish;
        anyhow::ensure!(
            (6..=8).contains(&fish.segment_count),
            "Segment count must be in [6, 8]"
        );
        anyhow::ensure!(
            fish.segment_length.is_finite() && fish.segment_length > 0.0,
            "Segment length must be positive"
        );
        anyhow::ensure!(
            fish.max_bend_angle > 0.0 && fish.max_bend_angle <= PI,
            "Max bend angle must be in (0, PI]"
        );
        anyhow::ensure!(
            fish.max_turn_rate.is_finite() && fish.max_turn_rate >= 0.0,
            "Max turn rate must be non-negative"
        );
        anyhow::ensure!(
            fish.edge_padding >= 0.0
                && fish.wall_margin >= fish.edge_padding
                && 2.0 * fish.wall_margin < world.width.min(world.height),
            "Wall margin must fit inside the tank and exceed the edge padding"
        );
        anyhow::ensure!(
            fish.top_speed.is_finite() && fish.top_speed >= 0.0,
            "Top speed must be non-negative"
        );
        anyhow::ensure!(
            fish.can_eat_ratio > 0.0 && fish.can_eat_ratio < 1.0,
            "Can-eat ratio must be in (0.0, 1.0)"
        );
        anyhow::ensure!(
            fish.max_energy.is_finite() && fish.max_energy > 0.0,
            "Max energy must be positive"
        );
        anyhow::ensure!(
            fish.initial_energy > 0.0 && fish.initial_energy <= fish.max_energy,
            "Initial energy must be in (0, max_energy]"
        );
        anyhow::ensure!(
            fish.food_energy.is_finite() && fish.food_energy >= 0.0,
            "Food energy must be non-negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&fish.wander_chance),
            "Wander chance must be in [0.0, 1.0]"
        );

        let met = &self.metabolism;
        anyhow::ensure!(
            met.min_temperature < met.max_temperature,
            "Metabolism temperature range is empty"
        );
        anyhow::ensure!(
            met.basal_coefficient.is_finite() && met.basal_coefficient > 0.0,
            "Basal coefficient must be positive"
        );
        anyhow::ensure!(
            met.q10.is_finite() && met.q10 > 0.0,
            "Q10 must be positive"
        );
        anyhow::ensure!(
            (0.0..1.0).contains(&met.size_efficiency),
            "Size efficiency must be in [0.0, 1.0)"
        );
        anyhow::ensure!(
            met.minimum_fraction > met.minimum_fraction_size_reduction
                && met.minimum_fraction <= 1.0,
            "Minimum metabolism fraction must stay positive and at most 1.0"
        );

        anyhow::ensure!(
            self.brain.hidden_nodes > 0,
            "Hidden node count must be positive"
        );
        anyhow::ensure!(
            self.brain.weight_scale.is_finite() && self.brain.weight_scale > 0.0,
            "Weight scale must be positive"
        );

        anyhow::ensure!(
            self.selection.energy_weight.is_finite() && self.selection.efficiency_weight.is_finite(),
            "Fitness weights must be numbers"
        );

        anyhow::ensure!(
            world.stats_history <= MAX_BUFFER_LEN && world.event_log_capacity <= MAX_BUFFER_LEN,
            "Stats history and event log capacity must be at most {MAX_BUFFER_LEN}"
        );

        let tuning = [
            ("fish.head_radius", fish.head_radius),
            ("fish.wave_increment", fish.wave_increment),
            ("fish.wave_amplitude", fish.wave_amplitude),
            ("fish.sensing_range", fish.sensing_range),
            ("fish.eat_radius", fish.eat_radius),
            ("fish.food_size_bonus", fish.food_size_bonus),
            ("fish.predation_energy", fish.predation_energy),
            ("fish.heading_jitter", fish.heading_jitter),
            ("fish.wander_angle", fish.wander_angle),
            ("metabolism.min_temperature", met.min_temperature),
            ("metabolism.max_temperature", met.max_temperature),
            ("metabolism.allometric_exponent", met.allometric_exponent),
            ("metabolism.activity_coefficient", met.activity_coefficient),
            ("metabolism.activity_exponent", met.activity_exponent),
            ("metabolism.activity_size_compensation", met.activity_size_compensation),
            ("metabolism.optimal_temperature", met.optimal_temperature),
            ("metabolism.optimal_size_shift", met.optimal_size_shift),
            ("metabolism.tolerance_base", met.tolerance_base),
            ("metabolism.tolerance_size_bonus", met.tolerance_size_bonus),
            ("metabolism.stress_coefficient", met.stress_coefficient),
            ("metabolism.cold_threshold", met.cold_threshold),
            ("metabolism.cold_penalty", met.cold_penalty),
            ("metabolism.heat_threshold", met.heat_threshold),
            ("metabolism.heat_penalty", met.heat_penalty),
            ("metabolism.size_stress_resistance", met.size_stress_resistance),
            ("metabolism.trait_efficiency", met.trait_efficiency),
            ("metabolism.minimum_fraction", met.minimum_fraction),
            ("metabolism.minimum_fraction_size_reduction", met.minimum_fraction_size_reduction),
        ];
        for (name, value) in tuning {
            anyhow::ensure!(value.is_finite(), "{name} must be a finite number");
        }

        Ok(())
    }

    /// Parses and validates a `config.toml` document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Seconds of simulated time covered by one agent update.
    #[must_use]
    pub fn step_seconds(&self) -> f64 {
        1.0 / self.world.ticks_per_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_population_rejected() {
        let config = AppConfig {
            simulation: SimulationConfig {
                population_size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_temperature_rejected() {
        let config = AppConfig {
            simulation: SimulationConfig {
                water_temperature: f64::NAN,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_generation_length_rejected() {
        let mut config = AppConfig::default();
        config.simulation.generation_length = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_mutation_rate() {
        let mut config = AppConfig::default();
        config.simulation.mutation_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_segment_count_bounds() {
        let mut config = AppConfig::default();
        config.fish.segment_count = 5;
        assert!(config.validate().is_err());
        config.fish.segment_count = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_can_eat_ratio_bounds() {
        let mut config = AppConfig::default();
        config.fish.can_eat_ratio = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [simulation]
            population_size = 24
            breeding_strategy = "keep_non_breeders"

            [selection]
            pool_size = "half_target"
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.simulation.population_size, 24);
        assert_eq!(
            config.simulation.breeding_strategy,
            ReplacementPolicy::KeepNonBreeders
        );
        assert_eq!(config.selection.pool_size, PoolSizePolicy::HalfTarget);
        assert_eq!(config.world.width, 800.0);
    }

    #[test]
    fn test_nan_tuning_value_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [fish]
            wave_amplitude = nan
            predation_energy = nan
            "#,
        );
        assert!(result.is_err());

        let mut config = AppConfig::default();
        config.metabolism.stress_coefficient = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.fish.sensing_range = f64::NAN;
        let err = config.validate().expect_err("nan sensing range");
        assert!(err.to_string().contains("fish.sensing_range"));
    }

    #[test]
    fn test_oversized_buffers_rejected() {
        let mut config = AppConfig::default();
        config.world.stats_history = usize::MAX;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.world.event_log_capacity = MAX_BUFFER_LEN + 1;
        assert!(config.validate().is_err());
        config.world.event_log_capacity = MAX_BUFFER_LEN;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_value_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [simulation]
            generation_length = -1.0
            "#,
        );
        assert!(result.is_err());
    }
}
