use super::*;
use rand::Rng;
use shoal_data::NeuralWeights;

fn pick_rows<R: Rng>(a: &[Vec<f32>], b: &[Vec<f32>], rng: &mut R) -> Vec<Vec<f32>> {
    a.iter()
        .zip(b)
        .map(|(ra, rb)| pick(ra, rb, rng))
        .collect()
}

fn pick<R: Rng>(a: &[f32], b: &[f32], rng: &mut R) -> Vec<f32> {
    a.iter()
        .zip(b)
        .map(|(&wa, &wb)| if rng.gen_bool(0.5) { wa } else { wb })
        .collect()
}

/// Uniform crossover: each weight is inherited from either parent with equal
/// probability. Parents of different shape cannot be combined.
pub fn weights_crossover_with_rng<R: Rng>(
    a: &NeuralWeights,
    b: &NeuralWeights,
    rng: &mut R,
) -> Option<NeuralWeights> {
    if !a.same_shape(b) {
        return None;
    }
    Some(NeuralWeights {
        input_hidden: pick_rows(&a.input_hidden, &b.input_hidden, rng),
        hidden_bias: pick(&a.hidden_bias, &b.hidden_bias, rng),
        hidden_output: pick_rows(&a.hidden_output, &b.hidden_output, rng),
        output_bias: pick(&a.output_bias, &b.output_bias, rng),
    })
}

fn flatten(w: &NeuralWeights) -> impl Iterator<Item = f32> + '_ {
    w.input_hidden
        .iter()
        .flatten()
        .chain(&w.hidden_bias)
        .chain(w.hidden_output.iter().flatten())
        .chain(&w.output_bias)
        .copied()
}

/// Mean absolute difference over all weights and biases.
pub fn weights_distance(a: &NeuralWeights, b: &NeuralWeights) -> f32 {
    if !a.same_shape(b) {
        return f32::INFINITY;
    }
    let (sum, count) = flatten(a)
        .zip(flatten(b))
        .fold((0.0f32, 0usize), |(sum, n), (wa, wb)| {
            (sum + (wa - wb).abs(), n + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn filled(value: f32, hidden: usize) -> NeuralWeights {
        NeuralWeights {
            input_hidden: vec![vec![value; BRAIN_INPUTS]; hidden],
            hidden_bias: vec![value; hidden],
            hidden_output: vec![vec![value; hidden]; BRAIN_OUTPUTS],
            output_bias: vec![value; BRAIN_OUTPUTS],
        }
    }

    #[test]
    fn test_crossover_takes_genes_from_both_parents() {
        let a = filled(1.0, 4);
        let b = filled(-1.0, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let child = weights_crossover_with_rng(&a, &b, &mut rng).expect("same shape");
        assert!(child.is_compatible());
        let values: Vec<f32> = flatten(&child).collect();
        assert!(values.iter().all(|&v| v == 1.0 || v == -1.0));
        assert!(values.contains(&1.0));
        assert!(values.contains(&-1.0));
    }

    #[test]
    fn test_crossover_rejects_mismatched_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert!(weights_crossover_with_rng(&filled(0.0, 4), &filled(0.0, 5), &mut rng).is_none());
    }

    #[test]
    fn test_distance() {
        assert_eq!(weights_distance(&filled(1.0, 3), &filled(0.5, 3)), 0.5);
        assert_eq!(
            weights_distance(&filled(1.0, 3), &filled(1.0, 2)),
            f32::INFINITY
        );
    }
}
