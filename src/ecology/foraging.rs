//! Bees: chemical-biased flight and pheromone deposit.
//!
//! A bee turns by `turn_rate * c` degrees and flies at
//! `base_speed + c^2 / speed_divisor`, where `c` is the chemical on its
//! current patch, then drops `deposit` on the patch it lands on.

use super::StepContext;
use crate::agent::{AgentId, Body, Flyer, Species};
use crate::config::BeeConfig;
use crate::error::Result;
use crate::grid::{wrap_coord, Field};
use rand::prelude::*;

/// One bee activation. Bees never die.
pub fn step_bee(ctx: &mut StepContext<'_>, id: AgentId, bee: Flyer) -> Result<()> {
    let bee = fly(ctx.field, &ctx.config.bees, bee);
    let landed = ctx.field.cell_of(bee.position);
    ctx.field.deposit(landed, ctx.config.bees.deposit);
    ctx.population.update(id, Body::Bee(bee))?;

    let roll: f64 = ctx.rng.gen();
    if roll < ctx.config.bees.reproduce {
        let heading = ctx.rng.gen_range(0.0..360.0);
        ctx.population.spawn(Body::Bee(Flyer {
            position: bee.position,
            heading,
            speed: ctx.config.bees.base_speed,
        }))?;
        ctx.report.record_birth(Species::Bee);
    }
    Ok(())
}

/// Steer by the chemical under the bee and move, wrapping on the torus
pub fn fly(field: &Field, params: &BeeConfig, mut bee: Flyer) -> Flyer {
    let chemical = field.patch(field.cell_of(bee.position)).chemical;

    bee.heading = wrap_coord(bee.heading + params.turn_rate * chemical, 360.0);
    bee.speed = params.base_speed + chemical * chemical / params.speed_divisor;

    let radians = bee.heading.to_radians();
    bee.position = [
        wrap_coord(bee.position[0] + radians.cos() * bee.speed, field.width() as f64),
        wrap_coord(bee.position[1] + radians.sin() * bee.speed, field.height() as f64),
    ];
    bee
}
