//! Agent identity, species, and per-instance state.

use crate::grid::Cell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Unique agent identifier, assigned monotonically and never reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of species
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Sheep,
    Wolf,
    Bee,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Sheep, Species::Wolf, Species::Bee];

    pub fn name(&self) -> &'static str {
        match self {
            Species::Sheep => "sheep",
            Species::Wolf => "wolves",
            Species::Bee => "bees",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per species
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSpecies<T> {
    pub sheep: T,
    pub wolves: T,
    pub bees: T,
}

impl<T> PerSpecies<T> {
    pub fn from_fn(mut f: impl FnMut(Species) -> T) -> Self {
        Self {
            sheep: f(Species::Sheep),
            wolves: f(Species::Wolf),
            bees: f(Species::Bee),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, &T)> {
        [
            (Species::Sheep, &self.sheep),
            (Species::Wolf, &self.wolves),
            (Species::Bee, &self.bees),
        ]
        .into_iter()
    }
}

impl PerSpecies<usize> {
    pub fn total(&self) -> usize {
        self.sheep + self.wolves + self.bees
    }
}

impl<T> Index<Species> for PerSpecies<T> {
    type Output = T;

    fn index(&self, species: Species) -> &T {
        match species {
            Species::Sheep => &self.sheep,
            Species::Wolf => &self.wolves,
            Species::Bee => &self.bees,
        }
    }
}

impl<T> IndexMut<Species> for PerSpecies<T> {
    fn index_mut(&mut self, species: Species) -> &mut T {
        match species {
            Species::Sheep => &mut self.sheep,
            Species::Wolf => &mut self.wolves,
            Species::Bee => &mut self.bees,
        }
    }
}

/// Grid-bound, energy-limited body
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grazer {
    pub cell: Cell,
    pub energy: f64,
}

/// Continuous-space body steered by the chemical field
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flyer {
    /// Always within `[0, width) x [0, height)`
    pub position: [f64; 2],
    /// Degrees, kept within `[0, 360)`
    pub heading: f64,
    pub speed: f64,
}

/// Species-tagged agent state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Sheep(Grazer),
    Wolf(Grazer),
    Bee(Flyer),
}

/// Why an agent left the population
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    Predation,
}

/// A live agent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub body: Body,
}

impl Agent {
    pub fn new(id: AgentId, body: Body) -> Self {
        Self { id, body }
    }

    pub fn species(&self) -> Species {
        match self.body {
            Body::Sheep(_) => Species::Sheep,
            Body::Wolf(_) => Species::Wolf,
            Body::Bee(_) => Species::Bee,
        }
    }

    /// Grid cell for grid-bound agents
    pub fn cell(&self) -> Option<Cell> {
        match self.body {
            Body::Sheep(g) | Body::Wolf(g) => Some(g.cell),
            Body::Bee(_) => None,
        }
    }

    pub fn grazer(&self) -> Option<&Grazer> {
        match &self.body {
            Body::Sheep(g) | Body::Wolf(g) => Some(g),
            Body::Bee(_) => None,
        }
    }

    pub fn grazer_mut(&mut self) -> Option<&mut Grazer> {
        match &mut self.body {
            Body::Sheep(g) | Body::Wolf(g) => Some(g),
            Body::Bee(_) => None,
        }
    }

    pub fn energy(&self) -> Option<f64> {
        self.grazer().map(|g| g.energy)
    }

    /// Whether the agent lies within a `width x height` torus
    pub fn in_bounds(&self, width: usize, height: usize) -> bool {
        match &self.body {
            Body::Sheep(g) | Body::Wolf(g) => g.cell.x < width && g.cell.y < height,
            Body::Bee(f) => {
                (0.0..width as f64).contains(&f.position[0])
                    && (0.0..height as f64).contains(&f.position[1])
            }
        }
    }
}
