use serde::{Deserialize, Serialize};

/// Behavioral dispositions sampled once per fish.
///
/// Each value lies in `[0, 1]`. They scale neural weight initialisation and
/// metabolic efficiency, and are fed to the neural controller as inputs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraitSet {
    pub aggressiveness: f64,
    pub cautiousness: f64,
    pub food_motivation: f64,
    pub energy_efficiency: f64,
    pub learning_rate: f64,
    pub adaptability: f64,
}

impl TraitSet {
    /// Number of trait values exposed to the neural controller.
    pub const COUNT: usize = 6;

    #[must_use]
    pub fn as_array(&self) -> [f64; Self::COUNT] {
        [
            self.aggressiveness,
            self.cautiousness,
            self.food_motivation,
            self.energy_efficiency,
            self.learning_rate,
            self.adaptability,
        ]
    }

    #[must_use]
    pub fn from_array(values: [f64; Self::COUNT]) -> Self {
        Self {
            aggressiveness: values[0],
            cautiousness: values[1],
            food_motivation: values[2],
            energy_efficiency: values[3],
            learning_rate: values[4],
            adaptability: values[5],
        }
    }

    /// Returns a copy with every value clamped into `[0, 1]`, NaN mapped to 0.5.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self::from_array(self.as_array().map(sanitize_unit))
    }
}

impl Default for TraitSet {
    fn default() -> Self {
        Self::from_array([0.5; Self::COUNT])
    }
}

/// Weights of the single-hidden-layer feed-forward controller.
///
/// Matrices are row-major: `input_hidden[h][i]` connects input `i` to hidden
/// node `h`, `hidden_output[o][h]` connects hidden node `h` to output `o`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NeuralWeights {
    pub input_hidden: Vec<Vec<f32>>,
    pub hidden_bias: Vec<f32>,
    pub hidden_output: Vec<Vec<f32>>,
    pub output_bias: Vec<f32>,
}

impl NeuralWeights {
    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.input_hidden.len()
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.input_hidden.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn output_count(&self) -> usize {
        self.hidden_output.len()
    }

    /// True when every matrix agrees on the `inputs x hidden x outputs` shape.
    #[must_use]
    pub fn has_shape(&self, inputs: usize, outputs: usize) -> bool {
        let hidden = self.hidden_count();
        hidden > 0
            && self.input_hidden.iter().all(|row| row.len() == inputs)
            && self.hidden_bias.len() == hidden
            && self.hidden_output.len() == outputs
            && self.hidden_output.iter().all(|row| row.len() == hidden)
            && self.output_bias.len() == outputs
    }

    /// True when both weight sets share the same shape, making them breedable.
    #[must_use]
    pub fn same_shape(&self, other: &NeuralWeights) -> bool {
        self.has_shape(other.input_count(), other.output_count())
            && self.hidden_count() == other.hidden_count()
    }
}

/// Heritable parameters of a fish.
///
/// Immutable once assigned to a fish. Genes are normalised to `[0, 1]`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Genome {
    pub color: f64,
    pub speed: f64,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neural_weights: Option<NeuralWeights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<TraitSet>,
}

impl Genome {
    #[must_use]
    pub fn new(color: f64, speed: f64, size: f64) -> Self {
        Self {
            color,
            speed,
            size,
            neural_weights: None,
            traits: None,
        }
    }

    #[must_use]
    pub fn with_traits(mut self, traits: TraitSet) -> Self {
        self.traits = Some(traits);
        self
    }

    #[must_use]
    pub fn with_neural_weights(mut self, weights: NeuralWeights) -> Self {
        self.neural_weights = Some(weights);
        self
    }

    /// Clamps genes into `[0, 1]`; malformed (NaN) genes fall back to 0.5.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.color = sanitize_unit(self.color);
        self.speed = sanitize_unit(self.speed);
        self.size = sanitize_unit(self.size);
        self.traits = self.traits.map(|t| t.sanitized());
        self
    }
}

fn sanitize_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}
