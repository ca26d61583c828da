//! Independent seeded runs of one configuration, in parallel.

use crate::agent::{PerSpecies, Species};
use crate::config::Config;
use crate::error::Result;
use crate::simulation::{Simulation, StopCondition};
use crate::stats::MetricsLog;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Result of one replicate run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplicateOutcome {
    pub seed: u64,
    pub ticks_run: u64,
    pub stopped_early: bool,
    pub final_counts: PerSpecies<usize>,
    pub extinction_tick: PerSpecies<Option<u64>>,
    pub log: MetricsLog,
}

impl ReplicateOutcome {
    /// Whether a species that was present at start died out during the run
    pub fn went_extinct(&self, species: Species) -> bool {
        matches!(self.extinction_tick[species], Some(t) if t > 0)
    }
}

/// `count` consecutive seeds starting at `base`
pub fn seeds_from(base: u64, count: usize) -> Vec<u64> {
    (0..count as u64).map(|i| base.wrapping_add(i)).collect()
}

/// Run one configuration under a single seed
pub fn run_replicate(
    config: &Config,
    seed: u64,
    max_ticks: u64,
    stop: &StopCondition,
) -> Result<ReplicateOutcome> {
    let mut sim = Simulation::create(config.with_seed(seed))?;
    let summary = sim.run_until(max_ticks, stop)?;
    if summary.stopped_early {
        log::debug!("Replicate seed {} stopped at tick {}", seed, summary.ticks_run);
    }

    let final_counts = sim.world().counts();
    let extinction_tick = PerSpecies::from_fn(|s| sim.extinction_tick(s));

    Ok(ReplicateOutcome {
        seed,
        ticks_run: summary.ticks_run,
        stopped_early: summary.stopped_early,
        final_counts,
        extinction_tick,
        log: sim.into_metrics(),
    })
}

/// Run one replicate per seed on the rayon pool.
///
/// Outcomes come back in seed order. Each replicate owns its own world and
/// RNG, so results match a sequential run of the same seeds.
pub fn run_replicates(
    config: &Config,
    seeds: &[u64],
    max_ticks: u64,
    stop: &StopCondition,
) -> Result<Vec<ReplicateOutcome>> {
    config.validate()?;

    log::info!(
        "Running {} replicates for up to {} ticks",
        seeds.len(),
        max_ticks
    );

    seeds
        .par_iter()
        .map(|&seed| {
            run_replicate(config, seed, max_ticks, stop).map_err(|e| {
                log::warn!("Replicate with seed {} aborted: {}", seed, e);
                e
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.world.width = 12;
        config.world.height = 12;
        config.sheep.initial_count = 30;
        config.wolves.initial_count = 8;
        config
    }

    #[test]
    fn test_seeds_from() {
        assert_eq!(seeds_from(10, 3), vec![10, 11, 12]);
        assert!(seeds_from(0, 0).is_empty());
        assert_eq!(seeds_from(u64::MAX, 2), vec![u64::MAX, 0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = small_config();
        let seeds = seeds_from(100, 4);

        let parallel = run_replicates(&config, &seeds, 40, &StopCondition::Never).unwrap();
        let sequential: Vec<_> = seeds
            .iter()
            .map(|&s| run_replicate(&config, s, 40, &StopCondition::Never).unwrap())
            .collect();

        assert_eq!(parallel, sequential);
        let order: Vec<u64> = parallel.iter().map(|o| o.seed).collect();
        assert_eq!(order, seeds);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = small_config();
        config.sheep.reproduce = 1.5;
        assert!(run_replicates(&config, &[1, 2], 10, &StopCondition::Never).is_err());
    }

    #[test]
    fn test_outcome_reports_extinction() {
        let mut config = small_config();
        config.wolves.initial_energy = 3.0;
        config.wolves.gain_from_food = 0.0;
        config.wolves.reproduce = 0.0;

        let outcome =
            run_replicate(&config, 9, 50, &StopCondition::AnyExtinct(vec![Species::Wolf])).unwrap();

        assert!(outcome.stopped_early);
        assert_eq!(outcome.ticks_run, 3);
        assert_eq!(outcome.final_counts.wolves, 0);
        assert!(outcome.went_extinct(Species::Wolf));
        assert!(!outcome.went_extinct(Species::Bee));
        assert_eq!(outcome.log.len(), 3);
    }
}
