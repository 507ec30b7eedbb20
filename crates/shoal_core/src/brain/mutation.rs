use super::*;
use rand::Rng;
use shoal_data::NeuralWeights;

fn perturb<R: Rng>(weight: &mut f32, rate: f64, amount: f32, rng: &mut R) {
    if rng.gen::<f64>() < rate {
        *weight += rng.gen_range(-amount..=amount);
        *weight = weight.clamp(-WEIGHT_LIMIT, WEIGHT_LIMIT);
    }
}

pub fn mutate_with_rng<R: Rng>(brain: &mut NeuralWeights, rate: f64, amount: f32, rng: &mut R) {
    if rate <= 0.0 || amount.is_nan() || amount <= 0.0 {
        return;
    }
    let rows = brain
        .input_hidden
        .iter_mut()
        .chain(brain.hidden_output.iter_mut())
        .flat_map(|row| row.iter_mut());
    let biases = brain
        .hidden_bias
        .iter_mut()
        .chain(brain.output_bias.iter_mut());
    for weight in rows.chain(biases) {
        perturb(weight, rate, amount, rng);
    }
}
