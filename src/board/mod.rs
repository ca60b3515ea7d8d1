//! Board representation and match-state types.
//!
//! Contains the hex geometry, cells and grid, the unit catalog, the two
//! players, read-only roster queries, and the overall match state.

pub mod grid;
pub mod hex;
pub mod player;
pub mod roster;
pub mod state;
pub mod unit;

pub use grid::{Cell, Grid};
pub use hex::{Coord, Cube, Orientation, ALL_ORIENTATIONS};
pub use player::{Player, PlayerState, ALL_PLAYERS};
pub use state::{Action, ActionKind, ExecFilter, MatchState, Outcome, Phase};
pub use unit::{
    Strategy, UnitId, UnitInstance, UnitKind, UnitTemplate, ALL_UNIT_KINDS, UNIT_CATALOG,
    UNIT_KIND_COUNT,
};
