//! Sheep: wander, graze, reproduce.

use super::{settle_and_reproduce, starve, wander, StepContext};
use crate::agent::{AgentId, Grazer, Species};
use crate::error::Result;

/// One sheep activation.
///
/// Without grass sheep are not energy-limited: they neither eat nor starve.
pub fn step_sheep(ctx: &mut StepContext<'_>, id: AgentId, sheep: Grazer) -> Result<()> {
    let mut sheep = wander(ctx, id, sheep)?;

    if ctx.config.grass.enabled {
        sheep.energy -= ctx.config.sheep.energy_loss;

        if ctx.field.graze(sheep.cell, ctx.config.grass.regrowth_time) {
            sheep.energy += ctx.config.sheep.gain_from_food;
        }

        if starve(ctx, id, Species::Sheep, &sheep) {
            return Ok(());
        }
    }

    settle_and_reproduce(ctx, id, Species::Sheep, sheep)
}

#[cfg(test)]
mod tests {
    use crate::agent::{AgentId, Body, Grazer, Species};
    use crate::config::Config;
    use crate::ecology::testing::Harness;
    use crate::grid::Cell;

    fn spawn_sheep(h: &mut Harness, cell: Cell, energy: f64) -> AgentId {
        h.population
            .spawn(Body::Sheep(Grazer { cell, energy }))
            .unwrap()
    }

    fn energy(h: &Harness, id: AgentId) -> f64 {
        h.population.get(id).and_then(|a| a.energy()).unwrap()
    }

    fn no_reproduction() -> Config {
        let mut config = Config::default();
        config.sheep.reproduce = 0.0;
        config
    }

    #[test]
    fn test_sheep_eats_grown_grass() {
        let mut h = Harness::new(no_reproduction());
        for y in 0..20 {
            for x in 0..20 {
                h.field.patch_mut(Cell::new(x, y)).grown = true;
            }
        }
        let id = spawn_sheep(&mut h, Cell::new(5, 5), 8.0);

        h.step(id).unwrap();

        // -1 metabolism, +4 food
        assert_eq!(energy(&h, id), 11.0);
        let cell = h.population.get(id).unwrap().cell().unwrap();
        let patch = h.field.patch(cell);
        assert!(!patch.grown);
        assert_eq!(patch.countdown, 30);
        assert_eq!(h.field.grown_count(), 399);
    }

    #[test]
    fn test_sheep_starves_without_grass() {
        let mut h = Harness::new(no_reproduction());
        let id = spawn_sheep(&mut h, Cell::new(5, 5), 1.0);

        h.step(id).unwrap();

        assert!(!h.population.contains(id));
        assert_eq!(h.report.deaths[Species::Sheep], 1);
        assert_eq!(h.report.starved[Species::Sheep], 1);
        assert_eq!(h.population.occupants_of(Cell::new(5, 5), Species::Sheep).len(), 0);
        assert!(h.population.check_consistency(20, 20).is_ok());
    }

    #[test]
    fn test_sheep_immortal_when_grass_disabled() {
        let mut config = no_reproduction();
        config.grass.enabled = false;
        let mut h = Harness::new(config);
        let id = spawn_sheep(&mut h, Cell::new(0, 0), 0.5);

        for _ in 0..100 {
            h.step(id).unwrap();
        }
        assert_eq!(energy(&h, id), 0.5);
        assert_eq!(h.report.deaths.total(), 0);
    }

    #[test]
    fn test_certain_reproduction_splits_energy() {
        let mut config = Config::default();
        config.grass.enabled = false;
        config.sheep.reproduce = 1.0;
        let mut h = Harness::new(config);
        let id = spawn_sheep(&mut h, Cell::new(3, 3), 10.0);

        h.step(id).unwrap();

        assert_eq!(h.population.len(), 2);
        assert_eq!(h.report.births[Species::Sheep], 1);
        let child = h.population.ids()[1];
        assert_eq!(energy(&h, id), 5.0);
        assert_eq!(energy(&h, child), 5.0);
        assert_eq!(
            h.population.get(child).unwrap().cell(),
            h.population.get(id).unwrap().cell()
        );
    }

    #[test]
    fn test_no_reproduction_on_shared_cell() {
        let mut config = Config::default();
        config.grass.enabled = false;
        config.sheep.reproduce = 1.0;
        config.world.width = 2;
        config.world.height = 1;
        let mut h = Harness::new(config);
        // A wolf on every cell, so wherever the sheep lands it has company
        let id = spawn_sheep(&mut h, Cell::new(0, 0), 10.0);
        for x in 0..2 {
            h.population
                .spawn(Body::Wolf(Grazer {
                    cell: Cell::new(x, 0),
                    energy: 10.0,
                }))
                .unwrap();
        }

        h.step(id).unwrap();

        assert_eq!(h.report.births.total(), 0);
        assert_eq!(energy(&h, id), 10.0);
    }
}
