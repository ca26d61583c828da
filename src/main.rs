//! ECOSIM - CLI Entry Point
//!
//! Predator-prey and bee foraging simulation.

use clap::{Parser, Subcommand};
use ecosim::replicate::{run_replicates, seeds_from};
use ecosim::{benchmark, Config, Simulation, Species, StopCondition};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ecosim")]
#[command(version)]
#[command(about = "Discrete-tick predator-prey and pheromone foraging simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Maximum number of ticks
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Output directory for metrics
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run independent seeded replicates in parallel
    Replicates {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of replicates
        #[arg(short = 'n', long, default_value = "8")]
        count: usize,

        /// First seed; replicate i uses base_seed + i
        #[arg(long, default_value = "0")]
        base_seed: u64,

        /// Maximum number of ticks per replicate
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Output directory for per-replicate metrics
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Initial sheep
        #[arg(long, default_value = "100")]
        sheep: usize,

        /// Initial wolves
        #[arg(long, default_value = "50")]
        wolves: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,

        /// Write the bee colony preset instead of predator-prey
        #[arg(long)]
        bees: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            output,
            seed,
            quiet,
        } => {
            let config = load_config(&config)?;
            init_logging(&config);
            run_simulation(config, steps, output, seed, quiet)
        }

        Commands::Replicates {
            config,
            count,
            base_seed,
            steps,
            output,
        } => {
            let config = load_config(&config)?;
            init_logging(&config);
            run_replicate_batch(config, count, base_seed, steps, output)
        }

        Commands::Benchmark {
            steps,
            sheep,
            wolves,
        } => {
            init_logging(&Config::default());
            run_benchmark(steps, sheep, wolves)
        }

        Commands::Init { output, bees } => generate_config(output, bees),
    }
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn run_simulation(
    config: Config,
    steps: u64,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match seed {
        Some(s) => {
            println!("Using seed: {}", s);
            config.with_seed(s)
        }
        None => config,
    };

    std::fs::create_dir_all(&output)?;

    let stats_interval = config.logging.stats_interval;
    let mut sim = Simulation::create(config)?;

    let initial = sim.world().counts();
    println!("Starting simulation");
    println!(
        "  Sheep: {}  Wolves: {}  Bees: {}",
        initial.sheep, initial.wolves, initial.bees
    );
    println!(
        "  Grid size: {}x{}",
        sim.world().field.width(),
        sim.world().field.height()
    );
    println!("  Steps: {}", steps);
    println!();

    let start = Instant::now();

    for _ in 0..steps {
        sim.advance()?;

        if !quiet && sim.tick() % stats_interval == 0 {
            println!("{}", sim.snapshot_metrics());
        }

        if sim.should_stop(&StopCondition::AllExtinct) {
            println!("\nAll species extinct at tick {}", sim.tick());
            break;
        }
    }

    let elapsed = start.elapsed();
    let ticks_per_sec = sim.tick() as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", sim.tick());
    println!("Speed: {:.1} ticks/s", ticks_per_sec);
    let last = sim.snapshot_metrics();
    for species in Species::ALL {
        match last.extinction_tick[species] {
            Some(t) => println!("{}: extinct at tick {}", species, t),
            None => println!("{}: {}", species, last.counts[species]),
        }
    }

    let log = sim.into_metrics();
    let json_path = output.join("metrics.json");
    log.save_json(&json_path)?;
    println!("Metrics: {:?}", json_path);

    let csv_path = output.join("metrics.csv");
    log.export_csv(&csv_path)?;
    println!("CSV: {:?}", csv_path);

    Ok(())
}

fn run_replicate_batch(
    config: Config,
    count: usize,
    base_seed: u64,
    steps: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&output)?;

    let seeds = seeds_from(base_seed, count);
    let start = Instant::now();
    let outcomes = run_replicates(&config, &seeds, steps, &StopCondition::collapse(&config))?;

    println!("=== Replicates ({:.2}s) ===", start.elapsed().as_secs_f64());
    println!(
        "{:>8} {:>6} {:>7} {:>7} {:>7} {:>10} {:>10}",
        "seed", "ticks", "sheep", "wolves", "bees", "sheep_ext", "wolf_ext"
    );

    for outcome in &outcomes {
        let ext = |s: Species| {
            outcome.extinction_tick[s]
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{:>8} {:>6} {:>7} {:>7} {:>7} {:>10} {:>10}",
            outcome.seed,
            outcome.ticks_run,
            outcome.final_counts.sheep,
            outcome.final_counts.wolves,
            outcome.final_counts.bees,
            ext(Species::Sheep),
            ext(Species::Wolf),
        );

        outcome
            .log
            .export_csv(output.join(format!("metrics_seed_{}.csv", outcome.seed)))?;
    }

    let collapsed = outcomes
        .iter()
        .filter(|o| o.went_extinct(Species::Sheep) || o.went_extinct(Species::Wolf))
        .count();
    println!();
    println!("Collapsed: {}/{}", collapsed, outcomes.len());

    Ok(())
}

fn run_benchmark(steps: u64, sheep: usize, wolves: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ECOSIM Benchmark ===");
    println!("Ticks: {}", steps);
    println!("Sheep: {}  Wolves: {}", sheep, wolves);
    println!();

    let result = benchmark(steps, sheep, wolves)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf, bees: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = if bees {
        Config::bee_colony()
    } else {
        Config::default()
    };
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
