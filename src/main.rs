use anyhow::{Context, Result};
use clap::Parser;
use shoal_core::breeding::{Breeder, HttpBreeder, HttpBreederConfig, LocalBreeder};
use shoal_core::config::AppConfig;
use shoal_lib::app::App;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless fish evolution simulation", long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(short, long, default_value_t = 300.0)]
    seconds: f64,

    /// Simulation speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Target population size
    #[arg(short, long)]
    population: Option<usize>,

    /// Water temperature in degrees Celsius
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Where offspring come from
    #[arg(long, value_enum, default_value = "local")]
    breeder: BreederKind,

    /// Breeding service endpoint for `--breeder http`
    #[arg(long, default_value = "http://localhost:3000/api/breed")]
    endpoint: String,

    /// Print the final world snapshot as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BreederKind {
    Local,
    Http,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            AppConfig::from_toml(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => AppConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    if let Some(population) = args.population {
        config.simulation.population_size = population;
    }
    if let Some(temperature) = args.temperature {
        config.simulation.water_temperature = temperature;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    shoal_core::init_logging();
    let args = Args::parse();
    anyhow::ensure!(
        args.seconds.is_finite() && args.seconds > 0.0,
        "--seconds must be positive"
    );
    anyhow::ensure!(
        args.speed.is_finite() && args.speed > 0.0,
        "--speed must be positive"
    );

    let config = load_config(&args)?;
    let breeder: Arc<dyn Breeder> = match args.breeder {
        BreederKind::Local => Arc::new(LocalBreeder::new(config.world.seed)),
        BreederKind::Http => Arc::new(HttpBreeder::new(HttpBreederConfig::new(
            args.endpoint.clone(),
        ))),
    };
    let frame_interval = Duration::from_secs_f64(1.0 / config.world.ticks_per_second);

    let mut app = App::new(config, breeder)?;
    app.start()?;
    app.population_mut().set_speed_multiplier(args.speed);
    app.run(args.seconds, frame_interval).await?;

    let population = app.population();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&population.snapshot())?);
    } else {
        println!(
            "{:>4} {:>9} {:>9} {:>9} {:>6} {:>9} {:>5}",
            "gen", "survivors", "avg_fit", "best_fit", "pool", "offspring", "next"
        );
        for s in population.summaries() {
            println!(
                "{:>4} {:>9} {:>9.2} {:>9.2} {:>6} {:>9} {:>5}{}",
                s.generation,
                s.survivors,
                s.average_fitness,
                s.best_fitness,
                s.breeding_pool,
                s.offspring,
                s.next_population,
                if s.bred { "" } else { "  (not bred)" }
            );
        }
        let stats = population.stats();
        println!(
            "generation {} | population {} | mean size {:.3} | mean speed {:.3} | mean energy {:.1}",
            stats.generation, stats.population, stats.mean_size, stats.mean_speed, stats.mean_energy
        );
        for (kind, count) in population.metrics().event_counts() {
            println!("{kind:>18}: {count}");
        }
    }
    Ok(())
}
