//! Match configuration.
//!
//! Loaded from TOML. `round_limit` and `gold_cap` must be present; every
//! other field falls back to [`MatchConfig::default`]. [`MatchConfig::validate`]
//! rejects the combinations a match cannot start from.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Coord, Grid, Orientation};
use crate::resolve::EconomyRules;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Board shape and starting cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub orientation: Orientation,
    /// Cells that are not part of the board, as `[row, col]`.
    pub holes: Vec<[usize; 2]>,
    pub p1_home: [usize; 2],
    pub p2_home: [usize; 2],
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            rows: 7,
            cols: 9,
            orientation: Orientation::OddR,
            holes: Vec::new(),
            p1_home: [0, 0],
            p2_home: [6, 8],
        }
    }
}

/// Largest board accepted, in cells.
pub const MAX_BOARD_CELLS: usize = 4096;

/// Tunables for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    /// Rounds played before the match is decided on remaining hp.
    pub round_limit: u32,
    pub gold_cap: u32,
    #[serde(default = "default_stipend")]
    pub stipend: u32,
    #[serde(default = "default_starting_gold")]
    pub starting_gold: u32,
    #[serde(default = "default_territory_cost")]
    pub territory_cost: u32,
    #[serde(default)]
    pub board: BoardConfig,
}

fn default_stipend() -> u32 {
    5
}

fn default_starting_gold() -> u32 {
    20
}

fn default_territory_cost() -> u32 {
    3
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            round_limit: 10,
            gold_cap: 100,
            stipend: default_stipend(),
            starting_gold: default_starting_gold(),
            territory_cost: default_territory_cost(),
            board: BoardConfig::default(),
        }
    }
}

fn coord(pair: [usize; 2]) -> Coord {
    Coord::new(pair[0], pair[1])
}

impl MatchConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let b = &self.board;
        if self.round_limit == 0 {
            return invalid("round_limit must be at least 1".into());
        }
        if self.gold_cap == 0 {
            return invalid("gold_cap must be at least 1".into());
        }
        if b.rows == 0 || b.cols == 0 {
            return invalid(format!("board must be non-empty, got {}x{}", b.rows, b.cols));
        }
        match b.rows.checked_mul(b.cols) {
            Some(cells) if cells <= MAX_BOARD_CELLS => {}
            _ => {
                return invalid(format!(
                    "board {}x{} exceeds {} cells",
                    b.rows, b.cols, MAX_BOARD_CELLS
                ))
            }
        }
        if self.gold_cap < self.starting_gold {
            return invalid(format!(
                "gold_cap {} is below starting_gold {}",
                self.gold_cap, self.starting_gold
            ));
        }
        let in_bounds = |c: Coord| c.row < b.rows && c.col < b.cols;
        for &h in &b.holes {
            if !in_bounds(coord(h)) {
                return invalid(format!("hole {} is off the board", coord(h)));
            }
        }
        let [p1, p2] = self.homes();
        for (name, home) in [("p1_home", p1), ("p2_home", p2)] {
            if !in_bounds(home) {
                return invalid(format!("{} {} is off the board", name, home));
            }
            if b.holes.iter().any(|&h| coord(h) == home) {
                return invalid(format!("{} {} is a hole", name, home));
            }
        }
        if p1 == p2 {
            return invalid(format!("both players start on {}", p1));
        }
        Ok(())
    }

    pub fn economy(&self) -> EconomyRules {
        EconomyRules {
            territory_cost: self.territory_cost,
            stipend: self.stipend,
            gold_cap: self.gold_cap,
        }
    }

    /// Home cells indexed by `Player::index()`.
    pub fn homes(&self) -> [Coord; 2] {
        [coord(self.board.p1_home), coord(self.board.p2_home)]
    }

    /// An empty board of the configured shape.
    pub fn build_grid(&self) -> Grid {
        let holes: Vec<Coord> = self.board.holes.iter().map(|&h| coord(h)).collect();
        Grid::with_holes(self.board.rows, self.board.cols, self.board.orientation, &holes)
    }
}
