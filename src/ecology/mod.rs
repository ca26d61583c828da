//! Per-species behavior rules.
//!
//! Every species is stepped through [`step`], which dispatches on the agent's
//! body:
//! - Sheep wander and graze (`grazing`)
//! - Wolves wander and hunt co-located sheep (`predation`)
//! - Bees steer along the chemical field and deposit pheromone (`foraging`)
//!
//! Rules read and write the world only through [`StepContext`].

pub mod foraging;
pub mod grazing;
pub mod predation;

use crate::agent::{AgentId, Body, DeathCause, Grazer, Species};
use crate::config::{Config, GrazerConfig};
use crate::error::{Result, SimError};
use crate::grid::Field;
use crate::population::Population;
use crate::world::TickReport;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Mutable view of the world handed to one agent activation
pub struct StepContext<'a> {
    pub field: &'a mut Field,
    pub population: &'a mut Population,
    pub rng: &'a mut ChaCha8Rng,
    pub config: &'a Config,
    pub report: &'a mut TickReport,
}

/// Activate one live agent
pub fn step(ctx: &mut StepContext<'_>, id: AgentId) -> Result<()> {
    let agent = *ctx.population.get(id).ok_or_else(|| {
        SimError::AgentConsistencyViolation(format!("{id} activated but not in the population"))
    })?;

    match agent.body {
        Body::Sheep(sheep) => grazing::step_sheep(ctx, id, sheep),
        Body::Wolf(wolf) => predation::step_wolf(ctx, id, wolf),
        Body::Bee(bee) => foraging::step_bee(ctx, id, bee),
    }
}

/// Wrap a grazer body back into its species tag
fn body_of(species: Species, grazer: Grazer) -> Body {
    match species {
        Species::Wolf => Body::Wolf(grazer),
        _ => Body::Sheep(grazer),
    }
}

fn grazer_config(config: &Config, species: Species) -> &GrazerConfig {
    match species {
        Species::Wolf => &config.wolves,
        _ => &config.sheep,
    }
}

/// Move to a uniformly random Moore neighbor. Stays put if there is none.
fn wander(ctx: &mut StepContext<'_>, id: AgentId, mut grazer: Grazer) -> Result<Grazer> {
    let options = ctx.field.neighbor_cells(grazer.cell, 1);
    if let Some(&to) = options.choose(&mut *ctx.rng) {
        ctx.population.relocate(id, to)?;
        grazer.cell = to;
    }
    Ok(grazer)
}

/// Remove a grazer whose energy ran out. Returns true if it died.
fn starve(ctx: &mut StepContext<'_>, id: AgentId, species: Species, grazer: &Grazer) -> bool {
    if grazer.energy > 0.0 {
        return false;
    }
    if ctx.population.remove(id).is_some() {
        ctx.report.record_death(species, DeathCause::Starvation);
    }
    true
}

/// Store the grazer, then roll for offspring.
///
/// Offspring need the parent to be alone on its cell. The parent's energy is
/// split evenly with the offspring.
fn settle_and_reproduce(
    ctx: &mut StepContext<'_>,
    id: AgentId,
    species: Species,
    mut grazer: Grazer,
) -> Result<()> {
    let probability = grazer_config(ctx.config, species).reproduce;
    let roll: f64 = ctx.rng.gen();
    let alone = ctx.population.occupants(grazer.cell) == [id];

    if roll < probability && alone {
        grazer.energy /= 2.0;
        ctx.population.update(id, body_of(species, grazer))?;
        ctx.population.spawn(body_of(species, grazer))?;
        ctx.report.record_birth(species);
    } else {
        ctx.population.update(id, body_of(species, grazer))?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::Config;
    use crate::world::TickReport;
    use rand::SeedableRng;

    /// Owned world parts for driving single activations in tests
    pub struct Harness {
        pub field: Field,
        pub population: Population,
        pub rng: ChaCha8Rng,
        pub config: Config,
        pub report: TickReport,
    }

    impl Harness {
        pub fn new(config: Config) -> Self {
            Self {
                field: Field::new(config.world.width, config.world.height),
                population: Population::new(config.world.width, config.world.height),
                rng: ChaCha8Rng::seed_from_u64(config.world.seed),
                config,
                report: TickReport::default(),
            }
        }

        pub fn step(&mut self, id: AgentId) -> Result<()> {
            let mut ctx = StepContext {
                field: &mut self.field,
                population: &mut self.population,
                rng: &mut self.rng,
                config: &self.config,
                report: &mut self.report,
            };
            step(&mut ctx, id)
        }
    }
}
