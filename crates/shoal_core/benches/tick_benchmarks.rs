use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal_core::brain::{BrainLogic, BRAIN_INPUTS};
use shoal_core::config::{AppConfig, MetabolismConfig};
use shoal_core::metabolism::metabolic_rate;
use shoal_core::population::Population;
use shoal_data::{NeuralWeights, TraitSet};

/// Benchmark the neural controller with typical inputs.
fn bench_brain_forward(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let brain = NeuralWeights::new_random_with_rng(8, &TraitSet::default(), 1.0, &mut rng);
    let inputs = [0.5; BRAIN_INPUTS];

    c.bench_function("brain_forward", |b| {
        b.iter(|| {
            let result = brain.forward(black_box(&inputs));
            black_box(result)
        })
    });
}

/// Benchmark the metabolism model across a temperature sweep.
fn bench_metabolism(c: &mut Criterion) {
    let config = MetabolismConfig::default();

    c.bench_function("metabolic_rate", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for t in -2..36 {
                total += metabolic_rate(
                    black_box(0.6),
                    black_box(0.8),
                    f64::from(t),
                    None,
                    &config,
                );
            }
            black_box(total)
        })
    });
}

/// Benchmark one population step with a crowded tank.
fn bench_population_step(c: &mut Criterion) {
    let mut config = AppConfig::default();
    config.simulation.population_size = 200;
    config.simulation.food_availability = 50.0;
    config.simulation.generation_length = 1e9;
    config.metabolism.basal_coefficient = 1e-7;
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut population = match Population::new(config) {
        Ok(population) => population,
        Err(e) => panic!("invalid benchmark config: {e}"),
    };
    if let Err(e) = population.start(&mut rng) {
        panic!("failed to start: {e}");
    }

    c.bench_function("population_step_200", |b| {
        b.iter(|| {
            population.step(&mut rng);
            black_box(population.fish().len())
        })
    });
}

criterion_group!(
    benches,
    bench_brain_forward,
    bench_metabolism,
    bench_population_step
);
criterion_main!(benches);
