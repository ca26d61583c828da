//! Simulation state and the tick scheduler.

use crate::agent::{Body, DeathCause, Flyer, Grazer, PerSpecies, Species};
use crate::config::Config;
use crate::ecology::{self, StepContext};
use crate::error::Result;
use crate::grid::{Cell, Field, Layer};
use crate::population::Population;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// What happened during one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick counter after this tick completed
    pub tick: u64,
    pub births: PerSpecies<usize>,
    pub deaths: PerSpecies<usize>,
    pub starved: PerSpecies<usize>,
    pub eaten: PerSpecies<usize>,
    /// Activations skipped because the agent was removed earlier in the tick
    pub skipped: usize,
}

impl TickReport {
    pub fn record_birth(&mut self, species: Species) {
        self.births[species] += 1;
    }

    pub fn record_death(&mut self, species: Species, cause: DeathCause) {
        self.deaths[species] += 1;
        match cause {
            DeathCause::Starvation => self.starved[species] += 1,
            DeathCause::Predation => self.eaten[species] += 1,
        }
    }
}

/// The complete simulation state, owned by the scheduler
pub struct World {
    pub field: Field,
    pub population: Population,

    /// Completed ticks
    pub tick: u64,

    pub config: Config,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl World {
    /// Validate the configuration and build the initial state
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let seed = config.world.seed;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (width, height) = (config.world.width, config.world.height);

        let mut field = Field::new(width, height);
        if config.grass.enabled {
            seed_grass(&mut field, &config, &mut rng);
        }

        let mut population = Population::new(width, height);

        for _ in 0..config.sheep.initial_count {
            let cell = random_cell(&mut rng, width, height);
            population.spawn(Body::Sheep(Grazer {
                cell,
                energy: config.sheep.initial_energy,
            }))?;
        }

        for _ in 0..config.wolves.initial_count {
            let cell = random_cell(&mut rng, width, height);
            population.spawn(Body::Wolf(Grazer {
                cell,
                energy: config.wolves.initial_energy,
            }))?;
        }

        for _ in 0..config.bees.initial_count {
            let x = rng.gen_range(0.0..width as f64);
            let y = rng.gen_range(0.0..height as f64);
            let heading = rng.gen_range(0.0..360.0);
            population.spawn(Body::Bee(Flyer {
                position: [x, y],
                heading,
                speed: config.bees.base_speed,
            }))?;
        }

        Ok(Self {
            field,
            population,
            tick: 0,
            config,
            rng,
            seed,
        })
    }

    /// Advance one tick.
    ///
    /// 1. Environment: diffuse, evaporate, regrow (row-major).
    /// 2. Agents: snapshot live IDs, shuffle with the world RNG, activate each
    ///    one still alive. Offspring born this tick wait for the next one.
    /// 3. Verify population consistency, then increment the tick counter.
    ///
    /// The tick runs on copies of the field, population and RNG, which replace
    /// the live state only if every step succeeds. On error the world is left
    /// exactly as it was. An error is always an
    /// [`crate::SimError::AgentConsistencyViolation`].
    pub fn advance(&mut self) -> Result<TickReport> {
        let mut field = self.field.clone();
        let mut population = self.population.clone();
        let mut rng = self.rng.clone();

        update_environment(&mut field, &self.config);

        let mut order = population.ids();
        order.shuffle(&mut rng);

        let mut report = TickReport::default();
        {
            let mut ctx = StepContext {
                field: &mut field,
                population: &mut population,
                rng: &mut rng,
                config: &self.config,
                report: &mut report,
            };

            for id in order {
                if !ctx.population.contains(id) {
                    ctx.report.skipped += 1;
                    continue;
                }
                ecology::step(&mut ctx, id)?;
            }
        }

        population.check_consistency(field.width(), field.height())?;

        self.field = field;
        self.population = population;
        self.rng = rng;
        self.tick += 1;
        report.tick = self.tick;

        Ok(report)
    }

    /// Live count per species
    pub fn counts(&self) -> PerSpecies<usize> {
        self.population.counts()
    }

    /// Check if a species has no live agents
    pub fn is_extinct(&self, species: Species) -> bool {
        self.population.count(species) == 0
    }

    /// Read-only export of one field layer, rows indexed `[y][x]`
    pub fn render_field(&self, layer: Layer) -> Vec<Vec<f64>> {
        self.field.render(layer)
    }

    /// Verify the population invariants against this field's bounds
    pub fn check_consistency(&self) -> Result<()> {
        self.population
            .check_consistency(self.field.width(), self.field.height())
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Environment update, fixed order: diffuse, evaporate, regrow
fn update_environment(field: &mut Field, config: &Config) {
    field.diffuse(config.chemical.diffusion_rate);
    field.evaporate(config.chemical.retention);
    if config.grass.enabled {
        field.regrow(config.grass.regrowth_time);
    }
}

fn random_cell(rng: &mut ChaCha8Rng, width: usize, height: usize) -> Cell {
    Cell::new(rng.gen_range(0..width), rng.gen_range(0..height))
}

/// Grow a random share of patches; the rest get a random head start
fn seed_grass(field: &mut Field, config: &Config, rng: &mut ChaCha8Rng) {
    let regrowth = config.grass.regrowth_time;
    for y in 0..field.height() {
        for x in 0..field.width() {
            let grown = rng.gen::<f64>() < config.grass.initial_grown_fraction;
            let countdown = if grown || regrowth == 0 {
                regrowth
            } else {
                rng.gen_range(0..regrowth)
            };
            let patch = field.patch_mut(Cell::new(x, y));
            patch.grown = grown;
            patch.countdown = countdown;
        }
    }
}
