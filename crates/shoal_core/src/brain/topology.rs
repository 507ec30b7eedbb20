use super::*;
use rand::Rng;
use shoal_data::NeuralWeights;

/// Per-input multiplier derived from the trait relevant to that input group.
fn input_gain(input: usize, traits: &TraitSet) -> f32 {
    let trait_value = match input {
        0 | 1 => traits.food_motivation,
        2 | 3 => traits.cautiousness,
        4 | 5 => traits.aggressiveness,
        6 | 7 => traits.energy_efficiency,
        _ => traits.adaptability,
    };
    0.5 + trait_value as f32
}

pub fn create_weights_random_with_rng<R: Rng>(
    hidden: usize,
    traits: &TraitSet,
    weight_scale: f32,
    rng: &mut R,
) -> NeuralWeights {
    let hidden = hidden.max(1);
    let traits = traits.sanitized();

    let input_hidden = (0..hidden)
        .map(|_| {
            (0..BRAIN_INPUTS)
                .map(|i| rng.gen_range(-1.0f32..1.0) * weight_scale * input_gain(i, &traits))
                .collect()
        })
        .collect();
    let hidden_bias = (0..hidden)
        .map(|_| rng.gen_range(-0.5f32..0.5) * weight_scale)
        .collect();

    let output_gain = 0.5 + traits.learning_rate as f32;
    let hidden_output = (0..BRAIN_OUTPUTS)
        .map(|_| {
            (0..hidden)
                .map(|_| rng.gen_range(-1.0f32..1.0) * weight_scale * output_gain)
                .collect()
        })
        .collect();
    let output_bias = (0..BRAIN_OUTPUTS)
        .map(|_| rng.gen_range(-0.5f32..0.5) * weight_scale)
        .collect();

    NeuralWeights {
        input_hidden,
        hidden_bias,
        hidden_output,
        output_bias,
    }
}
