//! Toroidal patch field and the per-cell occupancy index.

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};

/// Integer cell coordinate, always within the field it came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Moore neighborhood offsets, row-major
pub const MOORE: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// State of one grid cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Pheromone level, never negative
    pub chemical: f64,
    /// Grass available for grazing
    pub grown: bool,
    /// Ticks left until grass grows back
    pub countdown: u32,
}

/// Which scalar to export from the field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Chemical,
    /// 1.0 where grass is grown, 0.0 elsewhere
    Grass,
}

/// Wrap a continuous coordinate into `[0, extent)`.
#[inline]
pub fn wrap_coord(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

/// 2D toroidal field of patches
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    width: usize,
    height: usize,
    /// Row-major: index = y * width + x
    patches: Vec<Patch>,
}

impl Field {
    /// Create a field of empty patches
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            patches: vec![Patch::default(); width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Wrap signed coordinates onto the torus
    #[inline]
    pub fn wrap(&self, x: i64, y: i64) -> Cell {
        Cell {
            x: x.rem_euclid(self.width as i64) as usize,
            y: y.rem_euclid(self.height as i64) as usize,
        }
    }

    /// Cell containing a continuous position
    #[inline]
    pub fn cell_of(&self, position: [f64; 2]) -> Cell {
        self.wrap(position[0].floor() as i64, position[1].floor() as i64)
    }

    /// Cell reached by moving `(dx, dy)` from `cell`
    #[inline]
    pub fn offset(&self, cell: Cell, dx: i64, dy: i64) -> Cell {
        self.wrap(cell.x as i64 + dx, cell.y as i64 + dy)
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        (cell.y % self.height) * self.width + (cell.x % self.width)
    }

    /// Patch at signed coordinates (wrapped)
    pub fn get(&self, x: i64, y: i64) -> Patch {
        self.patch(self.wrap(x, y))
    }

    /// Replace the patch at signed coordinates (wrapped)
    pub fn set(&mut self, x: i64, y: i64, patch: Patch) {
        let cell = self.wrap(x, y);
        *self.patch_mut(cell) = patch;
    }

    #[inline]
    pub fn patch(&self, cell: Cell) -> Patch {
        self.patches[self.index(cell)]
    }

    #[inline]
    pub fn patch_mut(&mut self, cell: Cell) -> &mut Patch {
        let idx = self.index(cell);
        &mut self.patches[idx]
    }

    /// Cells within Chebyshev distance `radius`, center excluded.
    ///
    /// On fields smaller than the neighborhood the wrapped cells repeat;
    /// each distinct cell is reported once, in row-major offset order.
    pub fn neighbor_cells(&self, cell: Cell, radius: usize) -> Vec<Cell> {
        let r = radius as i64;
        let mut cells = Vec::with_capacity(((2 * r + 1) * (2 * r + 1) - 1) as usize);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let c = self.offset(cell, dx, dy);
                if c != cell && !cells.contains(&c) {
                    cells.push(c);
                }
            }
        }
        cells
    }

    /// Neighboring cells with their current state
    pub fn neighbors(&self, x: i64, y: i64, radius: usize) -> Vec<(Cell, Patch)> {
        self.neighbor_cells(self.wrap(x, y), radius)
            .into_iter()
            .map(|c| (c, self.patch(c)))
            .collect()
    }

    /// Add chemical to a cell
    #[inline]
    pub fn deposit(&mut self, cell: Cell, amount: f64) {
        self.patch_mut(cell).chemical += amount;
    }

    /// Spread chemical to the 8 Moore neighbors.
    ///
    /// Reads pre-diffusion values only: each cell sends `rate * old` to every
    /// neighbor direction and keeps `old * (1 - 8 * rate)`. Total chemical is
    /// conserved.
    pub fn diffuse(&mut self, rate: f64) {
        if rate == 0.0 {
            return;
        }
        let snapshot: Vec<f64> = self.patches.iter().map(|p| p.chemical).collect();
        let keep = 1.0 - 8.0 * rate;

        for (patch, &old) in self.patches.iter_mut().zip(&snapshot) {
            patch.chemical = old * keep;
        }

        for y in 0..self.height {
            for x in 0..self.width {
                let share = snapshot[y * self.width + x] * rate;
                if share == 0.0 {
                    continue;
                }
                let from = Cell::new(x, y);
                for &(dx, dy) in &MOORE {
                    let to = self.offset(from, dx, dy);
                    self.patch_mut(to).chemical += share;
                }
            }
        }
    }

    /// Multiply every cell's chemical by `retention`
    pub fn evaporate(&mut self, retention: f64) {
        for patch in &mut self.patches {
            patch.chemical *= retention;
        }
    }

    /// Advance grass regrowth timers by one tick
    pub fn regrow(&mut self, regrowth_time: u32) {
        for patch in &mut self.patches {
            if patch.grown {
                continue;
            }
            if patch.countdown == 0 {
                patch.grown = true;
                patch.countdown = regrowth_time;
            } else {
                patch.countdown -= 1;
            }
        }
    }

    /// Eat the grass on a cell. Returns false if nothing was grown.
    pub fn graze(&mut self, cell: Cell, regrowth_time: u32) -> bool {
        let patch = self.patch_mut(cell);
        if !patch.grown {
            return false;
        }
        patch.grown = false;
        patch.countdown = regrowth_time;
        true
    }

    /// Total chemical in the field
    pub fn total_chemical(&self) -> f64 {
        self.patches.iter().map(|p| p.chemical).sum()
    }

    /// Number of patches with grown grass
    pub fn grown_count(&self) -> usize {
        self.patches.iter().filter(|p| p.grown).count()
    }

    /// Export one layer as rows indexed `[y][x]`
    pub fn render(&self, layer: Layer) -> Vec<Vec<f64>> {
        self.patches
            .chunks(self.width)
            .map(|row| {
                row.iter()
                    .map(|p| match layer {
                        Layer::Chemical => p.chemical,
                        Layer::Grass => {
                            if p.grown {
                                1.0
                            } else {
                                0.0
                            }
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Occupancy index: which grid-bound agents stand on each cell
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    width: usize,
    height: usize,
    /// Row-major, agent IDs in insertion order
    cells: Vec<Vec<AgentId>>,
}

impl SpatialIndex {
    /// Create an empty index for the given grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Vec::new(); width * height],
        }
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < self.width && cell.y < self.height {
            Some(cell.y * self.width + cell.x)
        } else {
            None
        }
    }

    /// Register an agent on a cell. Returns false if the cell is off-grid.
    pub fn insert(&mut self, cell: Cell, id: AgentId) -> bool {
        match self.index(cell) {
            Some(idx) => {
                self.cells[idx].push(id);
                true
            }
            None => false,
        }
    }

    /// Unregister an agent from a cell. Returns false if it was not there.
    pub fn remove(&mut self, cell: Cell, id: AgentId) -> bool {
        let Some(idx) = self.index(cell) else {
            return false;
        };
        let occupants = &mut self.cells[idx];
        match occupants.iter().position(|&o| o == id) {
            Some(pos) => {
                occupants.remove(pos);
                true
            }
            None => false,
        }
    }

    /// All agents on a cell
    #[inline]
    pub fn get(&self, cell: Cell) -> &[AgentId] {
        match self.index(cell) {
            Some(idx) => &self.cells[idx],
            None => &[],
        }
    }

    #[inline]
    pub fn count_at(&self, cell: Cell) -> usize {
        self.get(cell).len()
    }

    /// Total number of indexed agents
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }
}
