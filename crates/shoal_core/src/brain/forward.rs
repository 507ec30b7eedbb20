use super::*;
use shoal_data::NeuralWeights;

/// Runs one forward pass. Weight matrices that do not match the input layout
/// contribute nothing for the missing entries instead of panicking.
pub fn forward(brain: &NeuralWeights, inputs: &[f32; BRAIN_INPUTS]) -> [f32; BRAIN_OUTPUTS] {
    let hidden: Vec<f32> = brain
        .input_hidden
        .iter()
        .enumerate()
        .map(|(h, row)| {
            let bias = brain.hidden_bias.get(h).copied().unwrap_or(0.0);
            let sum = row
                .iter()
                .zip(inputs.iter())
                .fold(bias, |acc, (w, x)| acc + w * x);
            sanitize(sum).tanh()
        })
        .collect();

    let mut outputs = [0.0; BRAIN_OUTPUTS];
    for (o, output) in outputs.iter_mut().enumerate() {
        let Some(row) = brain.hidden_output.get(o) else {
            continue;
        };
        let bias = brain.output_bias.get(o).copied().unwrap_or(0.0);
        let sum = row
            .iter()
            .zip(hidden.iter())
            .fold(bias, |acc, (w, h)| acc + w * h);
        *output = sanitize(sum).tanh();
    }
    outputs
}

fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_like() -> NeuralWeights {
        // Hidden node 0 reads FoodAngle, output Turn reads hidden node 0.
        let mut input_hidden = vec![vec![0.0; BRAIN_INPUTS]; 2];
        input_hidden[0][0] = 1.0;
        NeuralWeights {
            input_hidden,
            hidden_bias: vec![0.0; 2],
            hidden_output: vec![vec![1.0, 0.0], vec![0.0, 0.0]],
            output_bias: vec![0.0, 0.5],
        }
    }

    #[test]
    fn test_forward_is_weighted_sum() {
        let brain = identity_like();
        let mut inputs = [0.0; BRAIN_INPUTS];
        inputs[0] = 0.5;
        let out = forward(&brain, &inputs);
        assert!((out[0] - 0.5f32.tanh().tanh()).abs() < 1e-6);
        assert!((out[1] - 0.5f32.tanh()).abs() < 1e-6);

        inputs[0] = -0.5;
        let out = forward(&brain, &inputs);
        assert!(out[0] < 0.0, "output must depend on the input sign");
    }

    #[test]
    fn test_forward_outputs_bounded_for_extreme_inputs() {
        let mut brain = identity_like();
        brain.input_hidden[1] = vec![WEIGHT_LIMIT; BRAIN_INPUTS];
        for &value in &[-1e6f32, 0.0, 1e6, f32::NAN] {
            let out = forward(&brain, &[value; BRAIN_INPUTS]);
            for o in out {
                assert!(o.is_finite() && (-1.0..=1.0).contains(&o));
            }
        }
    }

    #[test]
    fn test_forward_tolerates_malformed_weights() {
        let brain = NeuralWeights {
            input_hidden: vec![vec![1.0; 3]],
            hidden_bias: vec![],
            hidden_output: vec![vec![1.0]],
            output_bias: vec![],
        };
        let out = forward(&brain, &[1.0; BRAIN_INPUTS]);
        assert!(out[0] > 0.0);
        assert_eq!(out[1], 0.0);
    }
}
