//! Allometric, activity and thermal metabolism model.
//!
//! The result is energy lost per simulation step. Steps run at a fixed rate
//! (`world.ticks_per_second`), so the per-step figure is stable regardless of
//! frame rate.

use crate::config::MetabolismConfig;
use shoal_data::TraitSet;

/// Smallest metabolism ever reported, one unit of the rounding precision.
pub const MIN_METABOLISM: f64 = 1e-4;

/// Body mass for a genome size: 0 maps to 1 g, 1 maps to 1000 g.
#[must_use]
pub fn mass_in_grams(size: f64) -> f64 {
    (unit(size) * 1000f64.ln()).exp()
}

/// `a * mass^b`.
#[must_use]
pub fn basal_rate(mass_grams: f64, config: &MetabolismConfig) -> f64 {
    config.basal_coefficient * mass_grams.max(0.0).powf(config.allometric_exponent)
}

/// Superlinear in speed, partially compensated by size.
#[must_use]
pub fn activity_multiplier(speed: f64, size: f64, config: &MetabolismConfig) -> f64 {
    let compensation = 1.0 - config.activity_size_compensation * unit(size);
    1.0 + config.activity_coefficient * unit(speed).powf(config.activity_exponent) * compensation
}

/// Q10 curve around a size-dependent optimum, with tolerance-window stress and
/// absolute cold/heat penalties.
#[must_use]
pub fn temperature_effect(temperature: f64, size: f64, config: &MetabolismConfig) -> f64 {
    let size = unit(size);
    let temperature = if temperature.is_nan() {
        config.optimal_temperature
    } else {
        temperature.clamp(config.min_temperature, config.max_temperature)
    };

    let optimum = config.optimal_temperature - config.optimal_size_shift * (size - 0.5);
    let tolerance = config.tolerance_base + config.tolerance_size_bonus * size;
    let mut effect = config.q10.powf((temperature - optimum) / 10.0);

    let deviation = (temperature - optimum).abs();
    if deviation > tolerance {
        effect *= (config.stress_coefficient * (deviation - tolerance)).exp();
    }

    let resistance = 1.0 - config.size_stress_resistance * size;
    if temperature < config.cold_threshold {
        effect *= 1.0 + config.cold_penalty * resistance;
    }
    if temperature > config.heat_threshold {
        effect *= 1.0 + config.heat_penalty * resistance;
    }
    effect
}

/// Energy drained per step.
///
/// `speed` is the fraction of top speed swum this step. Always strictly
/// positive and rounded to four decimals.
#[must_use]
pub fn metabolic_rate(
    size: f64,
    speed: f64,
    temperature: f64,
    traits: Option<&TraitSet>,
    config: &MetabolismConfig,
) -> f64 {
    let size = unit(size);
    let basal = basal_rate(mass_in_grams(size), config);

    let size_adjustment = 1.0 - config.size_efficiency * size;
    let trait_adjustment = traits.map_or(1.0, |t| {
        1.0 + config.trait_efficiency * (0.5 - unit(t.energy_efficiency))
    });

    let rate = basal
        * activity_multiplier(speed, size, config)
        * temperature_effect(temperature, size, config)
        * size_adjustment
        * trait_adjustment;

    let floor = basal * (config.minimum_fraction - config.minimum_fraction_size_reduction * size);
    let rate = if rate.is_finite() { rate.max(floor) } else { floor };
    ((rate * 10_000.0).round() / 10_000.0).max(MIN_METABOLISM)
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
