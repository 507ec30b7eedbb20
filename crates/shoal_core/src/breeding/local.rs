use super::{BreedingRequest, Breeder};
use crate::brain::BrainLogic;
use crate::error::BreedingError;
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal_data::{Genome, NeuralWeights, TraitSet};
use std::sync::Mutex;

/// Largest perturbation a mutation adds to a gene.
const GENE_MUTATION: f64 = 0.05;
/// Largest perturbation a mutation adds to a neural weight.
const WEIGHT_MUTATION: f32 = 0.1;

/// In-process breeder: pairwise gene averaging or inheritance, then small
/// random mutations.
pub struct LocalBreeder {
    rng: Mutex<ChaCha8Rng>,
}

impl LocalBreeder {
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Pairs consecutive parents, the last of an odd pool with the first, and
    /// cycles through the pairs until `target_population` offspring exist.
    pub fn breed_with_rng<R: Rng>(
        request: &BreedingRequest,
        rng: &mut R,
    ) -> Result<Vec<Genome>, BreedingError> {
        let parents = &request.parents;
        if parents.is_empty() {
            return Err(BreedingError::invalid_request("no parents"));
        }
        if request.target_population == 0 {
            return Err(BreedingError::invalid_request("target population is zero"));
        }
        let rates = Rates::new(request.crossover_rate, request.mutation_rate);

        let pairs: Vec<(usize, usize)> = (0..parents.len())
            .step_by(2)
            .map(|i| (i, (i + 1) % parents.len()))
            .collect();

        let offspring = pairs
            .iter()
            .cycle()
            .take(request.target_population)
            .map(|&(a, b)| breed_pair(&parents[a].genome, &parents[b].genome, &rates, rng))
            .collect();
        Ok(offspring)
    }
}

impl Default for LocalBreeder {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Breeder for LocalBreeder {
    async fn breed(&self, request: &BreedingRequest) -> Result<Vec<Genome>, BreedingError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| BreedingError::transport("local breeder rng poisoned"))?;
        Self::breed_with_rng(request, &mut *rng)
    }
}

struct Rates {
    crossover: f64,
    mutation: f64,
}

impl Rates {
    fn new(crossover: f64, mutation: f64) -> Self {
        let unit = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            crossover: unit(crossover),
            mutation: unit(mutation),
        }
    }
}

fn breed_gene<R: Rng>(a: f64, b: f64, rates: &Rates, rng: &mut R) -> f64 {
    let mut gene = if rng.gen::<f64>() < rates.crossover {
        (a + b) / 2.0
    } else if rng.gen_bool(0.5) {
        a
    } else {
        b
    };
    if rng.gen::<f64>() < rates.mutation {
        gene += rng.gen_range(-GENE_MUTATION..GENE_MUTATION);
    }
    gene.clamp(0.0, 1.0)
}

fn breed_traits<R: Rng>(
    a: Option<&TraitSet>,
    b: Option<&TraitSet>,
    rates: &Rates,
    rng: &mut R,
) -> Option<TraitSet> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let (a, b) = (a.as_array(), b.as_array());
            Some(TraitSet::from_array(std::array::from_fn(|i| {
                breed_gene(a[i], b[i], rates, rng)
            })))
        }
        (Some(t), None) | (None, Some(t)) => Some(*t),
        (None, None) => None,
    }
}

fn breed_weights<R: Rng>(
    a: Option<&NeuralWeights>,
    b: Option<&NeuralWeights>,
    rates: &Rates,
    rng: &mut R,
) -> Option<NeuralWeights> {
    let mut child = match (a, b) {
        (Some(a), Some(b)) => a.crossover_with_rng(b, rng).unwrap_or_else(|| a.clone()),
        (Some(w), None) | (None, Some(w)) => w.clone(),
        (None, None) => return None,
    };
    child.mutate_with_rng(rates.mutation, WEIGHT_MUTATION, rng);
    Some(child)
}

fn breed_pair<R: Rng>(a: &Genome, b: &Genome, rates: &Rates, rng: &mut R) -> Genome {
    Genome {
        color: breed_gene(a.color, b.color, rates, rng),
        speed: breed_gene(a.speed, b.speed, rates, rng),
        size: breed_gene(a.size, b.size, rates, rng),
        neural_weights: breed_weights(
            a.neural_weights.as_ref(),
            b.neural_weights.as_ref(),
            rates,
            rng,
        ),
        traits: breed_traits(a.traits.as_ref(), b.traits.as_ref(), rates, rng),
    }
    .sanitized()
}
