//! Offset-coordinate hex geometry.
//!
//! Cells are addressed by `(row, col)` on a rectangular board. The board's
//! [`Orientation`] fixes which rows (pointy-top) or columns (flat-top) are
//! shoved by half a hex, and therefore which offset table yields a cell's six
//! neighbors. Distances are exact: both endpoints are converted to cube
//! coordinates and compared with the Chebyshev metric.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The parity rule shared by every cell of a board.
///
/// `OddR`/`EvenR` are pointy-top layouts where odd/even rows are shoved
/// right; `OddQ`/`EvenQ` are flat-top layouts where odd/even columns are
/// shoved down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    OddR,
    EvenR,
    OddQ,
    EvenQ,
}

/// All supported orientations, in declaration order.
pub const ALL_ORIENTATIONS: [Orientation; 4] = [
    Orientation::OddR,
    Orientation::EvenR,
    Orientation::OddQ,
    Orientation::EvenQ,
];

/// A cell address on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Cube coordinates; `x + y + z == 0` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cube {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Cube {
    /// Hex-grid shortest-path length between two cube positions.
    pub fn distance(self, other: Cube) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        let dz = (self.z - other.z).unsigned_abs();
        dx.max(dy).max(dz) as u32
    }
}

/// Neighbor deltas `(d_row, d_col)` for a row that is not shoved.
const ROW_UNSHOVED: [(isize, isize); 6] = [(0, 1), (-1, 0), (-1, -1), (0, -1), (1, -1), (1, 0)];
/// Neighbor deltas for a row shoved half a hex to the right.
const ROW_SHOVED: [(isize, isize); 6] = [(0, 1), (-1, 1), (-1, 0), (0, -1), (1, 0), (1, 1)];
/// Neighbor deltas for a column that is not shoved.
const COL_UNSHOVED: [(isize, isize); 6] = [(0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, 0)];
/// Neighbor deltas for a column shoved half a hex down.
const COL_SHOVED: [(isize, isize); 6] = [(1, 1), (0, 1), (-1, 0), (0, -1), (1, -1), (1, 0)];

impl Orientation {
    /// Returns the configuration spelling of this orientation.
    pub const fn abbr(self) -> &'static str {
        match self {
            Orientation::OddR => "odd-r",
            Orientation::EvenR => "even-r",
            Orientation::OddQ => "odd-q",
            Orientation::EvenQ => "even-q",
        }
    }

    fn offset_table(self, at: Coord) -> &'static [(isize, isize); 6] {
        let shoved = match self {
            Orientation::OddR => at.row % 2 == 1,
            Orientation::EvenR => at.row % 2 == 0,
            Orientation::OddQ => at.col % 2 == 1,
            Orientation::EvenQ => at.col % 2 == 0,
        };
        match (self, shoved) {
            (Orientation::OddR | Orientation::EvenR, true) => &ROW_SHOVED,
            (Orientation::OddR | Orientation::EvenR, false) => &ROW_UNSHOVED,
            (Orientation::OddQ | Orientation::EvenQ, true) => &COL_SHOVED,
            (Orientation::OddQ | Orientation::EvenQ, false) => &COL_UNSHOVED,
        }
    }

    /// Converts an offset coordinate to cube coordinates.
    pub fn to_cube(self, at: Coord) -> Cube {
        let r = at.row as i64;
        let c = at.col as i64;
        let (x, z) = match self {
            Orientation::OddR => (c - (r - (r & 1)) / 2, r),
            Orientation::EvenR => (c - (r + (r & 1)) / 2, r),
            Orientation::OddQ => (c, r - (c - (c & 1)) / 2),
            Orientation::EvenQ => (c, r - (c + (c & 1)) / 2),
        };
        Cube { x, y: -x - z, z }
    }

    /// Exact hex distance between two offset coordinates.
    pub fn distance(self, a: Coord, b: Coord) -> u32 {
        self.to_cube(a).distance(self.to_cube(b))
    }

    /// Yields the up-to-six neighbor addresses of `at`, before any bounds or
    /// validity filtering. Addresses that would have a negative component are
    /// dropped.
    pub fn raw_neighbors(self, at: Coord) -> impl Iterator<Item = Coord> {
        self.offset_table(at).iter().filter_map(move |&(dr, dc)| {
            let row = at.row.checked_add_signed(dr)?;
            let col = at.col.checked_add_signed(dc)?;
            Some(Coord::new(row, col))
        })
    }
}
