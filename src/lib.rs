//! # ECOSIM
//!
//! Discrete-tick ecological simulation core: sheep, wolves and grass on a
//! toroidal grid, plus pheromone-following bees.
//!
//! ## Features
//!
//! - **Deterministic**: one seeded RNG drives every random draw
//! - **Toroidal**: agents and chemical wrap at the field edges
//! - **Observable**: per-tick metrics with CSV/JSON export
//! - **Configurable**: YAML configuration files
//! - **Parallel replicates**: independent seeds run across all cores via Rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use ecosim::{Config, Simulation, Species, StopCondition};
//!
//! # fn main() -> ecosim::Result<()> {
//! let mut config = Config::default();
//! config.sheep.initial_count = 50;
//! config.wolves.initial_count = 10;
//!
//! let mut sim = Simulation::create(config)?;
//! let summary = sim.run_until(200, &StopCondition::AllExtinct)?;
//!
//! println!("Ran {} ticks", summary.ticks_run);
//! println!("Sheep: {}", sim.snapshot_metrics().counts.sheep);
//! println!("Wolves extinct: {}", sim.is_extinct(Species::Wolf));
//! # Ok(())
//! # }
//! ```
//!
//! ## Bee colony
//!
//! ```rust
//! use ecosim::{Config, Layer, Simulation};
//!
//! # fn main() -> ecosim::Result<()> {
//! let mut sim = Simulation::create(Config::bee_colony())?;
//! sim.run(50)?;
//!
//! let chemical = sim.render_field(Layer::Chemical);
//! assert_eq!(chemical.len(), 100);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod ecology;
pub mod error;
pub mod grid;
pub mod population;
pub mod replicate;
pub mod simulation;
pub mod stats;
pub mod world;

// Re-export main types
pub use agent::{AgentId, PerSpecies, Species};
pub use config::Config;
pub use error::{Result, SimError};
pub use grid::{Cell, Layer};
pub use simulation::{RunSummary, Simulation, StopCondition};
pub use stats::{MetricsLog, MetricsRecord};
pub use world::{TickReport, World};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark on the default predator-prey setup
pub fn benchmark(ticks: u64, sheep: usize, wolves: usize) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let mut config = Config::default();
    config.sheep.initial_count = sheep;
    config.wolves.initial_count = wolves;

    let mut world = World::new(config)?;
    let initial = world.counts();

    let start = Instant::now();
    for _ in 0..ticks {
        world.advance()?;
    }
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        ticks,
        initial,
        final_counts: world.counts(),
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks: u64,
    pub initial: PerSpecies<usize>,
    pub final_counts: PerSpecies<usize>,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        for species in [Species::Sheep, Species::Wolf] {
            writeln!(
                f,
                "{}: {} -> {}",
                species, self.initial[species], self.final_counts[species]
            )?;
        }
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        Ok(())
    }
}
