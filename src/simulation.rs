//! Driver-facing surface: create, advance, observe.

use crate::agent::Species;
use crate::config::Config;
use crate::error::Result;
use crate::grid::Layer;
use crate::stats::{MetricsCollector, MetricsLog, MetricsRecord};
use crate::world::{TickReport, World};
use serde::{Deserialize, Serialize};

/// When a run may stop before its tick budget
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopCondition {
    /// Always use the full budget
    Never,
    /// Stop once any listed species has no live agents
    AnyExtinct(Vec<Species>),
    /// Stop once no agent of any species is left
    AllExtinct,
}

impl StopCondition {
    /// Stop once one species the configuration starts with has died out
    pub fn collapse(config: &Config) -> Self {
        let counts = config.initial_counts();
        StopCondition::AnyExtinct(
            Species::ALL
                .into_iter()
                .filter(|&s| counts[s] > 0)
                .collect(),
        )
    }
}

/// How a bounded run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks executed by this call
    pub ticks_run: u64,
    /// True if the stop condition fired before the budget ran out
    pub stopped_early: bool,
}

/// A simulation world paired with its metrics collector
pub struct Simulation {
    world: World,
    metrics: MetricsCollector,
}

impl Simulation {
    /// Validate the configuration and build the initial state
    pub fn create(config: Config) -> Result<Self> {
        let world = World::new(config)?;
        let metrics = MetricsCollector::new(&world);
        let initial_counts = world.counts();
        log::info!(
            "Simulation created: {}x{} grid, seed {}, sheep={} wolves={} bees={}",
            world.field.width(),
            world.field.height(),
            world.seed(),
            initial_counts.sheep,
            initial_counts.wolves,
            initial_counts.bees
        );

        Ok(Self { world, metrics })
    }

    /// Apply one tick and record its metrics
    pub fn advance(&mut self) -> Result<TickReport> {
        let report = self.world.advance()?;
        let record = self.metrics.record(&self.world, &report);

        if record.tick % self.world.config.logging.stats_interval == 0 {
            log::debug!("{}", record.summary());
        }

        for species in self.metrics.newly_extinct(report.tick) {
            log::info!("{} extinct at tick {}", species, report.tick);
        }

        Ok(report)
    }

    /// Run simulation for specified number of ticks
    pub fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.advance()?;
        }
        Ok(())
    }

    /// Run up to `max_ticks`, checking `stop` between ticks
    pub fn run_until(&mut self, max_ticks: u64, stop: &StopCondition) -> Result<RunSummary> {
        let mut ticks_run = 0;
        while ticks_run < max_ticks {
            if self.should_stop(stop) {
                return Ok(RunSummary {
                    ticks_run,
                    stopped_early: true,
                });
            }
            self.advance()?;
            ticks_run += 1;
        }
        Ok(RunSummary {
            ticks_run,
            stopped_early: false,
        })
    }

    /// Run with a callback after every tick
    pub fn run_with_callback<F>(&mut self, ticks: u64, mut callback: F) -> Result<()>
    where
        F: FnMut(&Simulation, &TickReport),
    {
        for _ in 0..ticks {
            let report = self.advance()?;
            callback(self, &report);
        }
        Ok(())
    }

    /// Evaluate a stop condition against the current state
    pub fn should_stop(&self, stop: &StopCondition) -> bool {
        match stop {
            StopCondition::Never => false,
            StopCondition::AnyExtinct(species) => species.iter().any(|&s| self.is_extinct(s)),
            StopCondition::AllExtinct => self.world.population.is_empty(),
        }
    }

    /// Metrics for the current state, without appending to the log
    pub fn snapshot_metrics(&self) -> MetricsRecord {
        self.metrics.observe(&self.world)
    }

    /// Check if a species has no live agents
    pub fn is_extinct(&self, species: Species) -> bool {
        self.world.is_extinct(species)
    }

    /// First tick at which a species had no live agents
    pub fn extinction_tick(&self, species: Species) -> Option<u64> {
        self.metrics.extinction_tick(species)
    }

    /// Read-only export of one field layer, rows indexed `[y][x]`
    pub fn render_field(&self, layer: Layer) -> Vec<Vec<f64>> {
        self.world.render_field(layer)
    }

    /// Register a named scalar summary, sampled after every tick
    pub fn register_reporter<F>(&mut self, name: impl Into<String>, reporter: F)
    where
        F: Fn(&World) -> f64 + Send + Sync + 'static,
    {
        self.metrics.register(name, reporter);
    }

    pub fn tick(&self) -> u64 {
        self.world.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn metrics(&self) -> &MetricsLog {
        self.metrics.log()
    }

    pub fn into_metrics(self) -> MetricsLog {
        self.metrics.into_log()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> Config {
        let mut config = Config::default();
        config.world.seed = seed;
        config.sheep.initial_count = 40;
        config.wolves.initial_count = 10;
        config
    }

    #[test]
    fn test_quick_simulation() {
        let mut sim = Simulation::create(small_config(1)).unwrap();
        sim.run(100).unwrap();

        assert_eq!(sim.tick(), 100);
        assert_eq!(sim.metrics().len(), 100);
        assert_eq!(sim.metrics().last().unwrap().tick, 100);
    }

    #[test]
    fn test_snapshot_matches_last_record() {
        let mut sim = Simulation::create(small_config(2)).unwrap();
        sim.run(10).unwrap();
        assert_eq!(&sim.snapshot_metrics(), sim.metrics().last().unwrap());
        assert_eq!(sim.metrics().len(), 10);
    }

    #[test]
    fn test_run_until_extinction() {
        let mut config = small_config(3);
        config.wolves.gain_from_food = 0.0;
        config.wolves.initial_energy = 5.0;
        config.wolves.reproduce = 0.0;
        let mut sim = Simulation::create(config).unwrap();

        let summary = sim
            .run_until(100, &StopCondition::AnyExtinct(vec![Species::Wolf]))
            .unwrap();

        assert!(summary.stopped_early);
        assert_eq!(summary.ticks_run, 5);
        assert_eq!(sim.extinction_tick(Species::Wolf), Some(5));
        assert!(sim.is_extinct(Species::Wolf));
    }

    #[test]
    fn test_failed_advance_records_nothing() {
        use crate::agent::{Body, Grazer};
        use crate::grid::Cell;

        let mut sim = Simulation::create(small_config(8)).unwrap();
        sim.run(3).unwrap();
        let before = sim.snapshot_metrics();

        let stray = sim.world.population.spawn_unindexed(Body::Sheep(Grazer {
            cell: Cell::new(40, 40),
            energy: 5.0,
        }));
        let err = sim.run(5).unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(sim.tick(), 3);
        assert_eq!(sim.metrics().len(), 3);
        assert!(sim.run_until(5, &StopCondition::Never).is_err());
        assert_eq!(sim.metrics().len(), 3);

        sim.world.population.remove(stray);
        let after = sim.snapshot_metrics();
        assert_eq!(after.counts, before.counts);
        assert_eq!(after.total_chemical, before.total_chemical);
        assert_eq!(after.grown_patches, before.grown_patches);
    }

    #[test]
    fn test_run_until_budget() {
        let mut sim = Simulation::create(small_config(4)).unwrap();
        let summary = sim.run_until(7, &StopCondition::Never).unwrap();
        assert_eq!(summary.ticks_run, 7);
        assert!(!summary.stopped_early);
    }

    #[test]
    fn test_collapse_ignores_absent_species() {
        let config = small_config(5);
        let collapse = StopCondition::collapse(&config);
        assert_eq!(
            collapse,
            StopCondition::AnyExtinct(vec![Species::Sheep, Species::Wolf])
        );

        let sim = Simulation::create(config).unwrap();
        assert!(!sim.should_stop(&collapse));
        assert!(sim.should_stop(&StopCondition::AnyExtinct(vec![Species::Bee])));
        assert!(!sim.should_stop(&StopCondition::AllExtinct));
    }

    #[test]
    fn test_callback_sees_each_tick() {
        let mut sim = Simulation::create(small_config(6)).unwrap();
        let mut ticks = Vec::new();
        sim.run_with_callback(3, |s, report| {
            assert_eq!(s.tick(), report.tick);
            ticks.push(report.tick);
        })
        .unwrap();
        assert_eq!(ticks, vec![1, 2, 3]);
    }
}
