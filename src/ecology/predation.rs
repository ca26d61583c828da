//! Wolves: wander, hunt co-located sheep, reproduce.

use super::{settle_and_reproduce, starve, wander, StepContext};
use crate::agent::{AgentId, DeathCause, Grazer, Species};
use crate::error::Result;
use rand::prelude::*;

/// One wolf activation. Wolves always metabolise.
pub fn step_wolf(ctx: &mut StepContext<'_>, id: AgentId, wolf: Grazer) -> Result<()> {
    let mut wolf = wander(ctx, id, wolf)?;
    wolf.energy -= ctx.config.wolves.energy_loss;

    if hunt(ctx, &wolf) {
        wolf.energy += ctx.config.wolves.gain_from_food;
    }

    if starve(ctx, id, Species::Wolf, &wolf) {
        return Ok(());
    }

    settle_and_reproduce(ctx, id, Species::Wolf, wolf)
}

/// Eat one sheep chosen uniformly among those sharing the wolf's cell.
/// Returns true if a sheep was eaten.
fn hunt(ctx: &mut StepContext<'_>, wolf: &Grazer) -> bool {
    let prey = ctx.population.occupants_of(wolf.cell, Species::Sheep);
    let Some(&victim) = prey.choose(&mut *ctx.rng) else {
        return false;
    };

    if ctx.population.remove(victim).is_some() {
        ctx.report.record_death(Species::Sheep, DeathCause::Predation);
        true
    } else {
        false
    }
}
