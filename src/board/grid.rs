//! The playing surface: a fixed `rows x cols` array of cells.
//!
//! Cells are stored row-major. A cell marked not `valid` is a hole in the
//! board; it is never a neighbor, never purchasable, and never occupied.

use serde::{Deserialize, Serialize};

use super::hex::{Coord, Orientation};
use super::player::Player;
use super::unit::{UnitId, UnitInstance};

/// One board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub owner: Option<Player>,
    pub occupant: Option<UnitInstance>,
    pub valid: bool,
}

impl Cell {
    const fn empty(valid: bool) -> Self {
        Cell {
            owner: None,
            occupant: None,
            valid,
        }
    }
}

/// The board: dimensions, orientation, and row-major cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    orientation: Orientation,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a fully playable, unowned board.
    pub fn new(rows: usize, cols: usize, orientation: Orientation) -> Self {
        Grid {
            rows,
            cols,
            orientation,
            cells: vec![Cell::empty(true); rows * cols],
        }
    }

    /// Creates a board with the given cells removed from play.
    /// Out-of-bounds holes are ignored.
    pub fn with_holes(rows: usize, cols: usize, orientation: Orientation, holes: &[Coord]) -> Self {
        let mut grid = Grid::new(rows, cols, orientation);
        for &h in holes {
            if let Some(cell) = grid.cell_mut(h) {
                cell.valid = false;
            }
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn index(&self, at: Coord) -> Option<usize> {
        (at.row < self.rows && at.col < self.cols).then(|| at.row * self.cols + at.col)
    }

    fn coord_of(&self, idx: usize) -> Coord {
        Coord::new(idx / self.cols, idx % self.cols)
    }

    /// Returns true if `at` lies inside the rectangle and is not a hole.
    pub fn is_playable(&self, at: Coord) -> bool {
        self.cell(at).is_some_and(|c| c.valid)
    }

    pub fn cell(&self, at: Coord) -> Option<&Cell> {
        self.index(at).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, at: Coord) -> Option<&mut Cell> {
        self.index(at).map(move |i| &mut self.cells[i])
    }

    /// Returns the unit standing on `at`, if any.
    pub fn unit_at(&self, at: Coord) -> Option<&UnitInstance> {
        self.cell(at).and_then(|c| c.occupant.as_ref())
    }

    pub fn unit_at_mut(&mut self, at: Coord) -> Option<&mut UnitInstance> {
        self.cell_mut(at).and_then(|c| c.occupant.as_mut())
    }

    /// Playable neighbors of `at`, in the orientation's table order.
    pub fn neighbors(&self, at: Coord) -> Vec<Coord> {
        self.orientation
            .raw_neighbors(at)
            .filter(|&n| self.is_playable(n))
            .collect()
    }

    /// Exact hex distance between two cells.
    pub fn distance(&self, a: Coord, b: Coord) -> u32 {
        self.orientation.distance(a, b)
    }

    /// Iterates over all cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (self.coord_of(i), c))
    }

    /// Iterates over every living unit with its position, row-major.
    pub fn units(&self) -> impl Iterator<Item = (Coord, &UnitInstance)> + '_ {
        self.iter()
            .filter_map(|(at, c)| c.occupant.as_ref().map(|u| (at, u)))
    }

    /// Locates a unit by identity.
    pub fn find_unit(&self, id: UnitId) -> Option<Coord> {
        self.units().find(|(_, u)| u.id() == id).map(|(at, _)| at)
    }

    /// Returns true if both grids describe the same board: dimensions,
    /// orientation, and hole mask. Ownership and units are ignored.
    pub fn same_shape(&self, other: &Grid) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.orientation == other.orientation
            && self.cells.len() == other.cells.len()
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| a.valid == b.valid)
    }

    /// Checks the structural invariants of the board and its units.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.cells.len() != self.rows * self.cols {
            return Err(format!(
                "grid has {} cells, expected {}x{}",
                self.cells.len(),
                self.rows,
                self.cols
            ));
        }
        for (at, cell) in self.iter() {
            let Some(unit) = &cell.occupant else {
                if !cell.valid && cell.owner.is_some() {
                    return Err(format!("hole {} has an owner", at));
                }
                continue;
            };
            if !cell.valid {
                return Err(format!("unit {} stands on hole {}", unit.id(), at));
            }
            if cell.owner != Some(unit.owner) {
                return Err(format!("unit {} stands on foreign cell {}", unit.id(), at));
            }
            if unit.hp == 0 || unit.hp > unit.max_hp {
                return Err(format!("unit {} has hp {}/{}", unit.id(), unit.hp, unit.max_hp));
            }
        }
        Ok(())
    }
}
