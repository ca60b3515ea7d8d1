//! Read-only counts and unit listings used by legality checks and status
//! output. Nothing here mutates the grid.

use super::grid::Grid;
use super::hex::Coord;
use super::player::Player;
use super::unit::UnitInstance;

/// Number of cells owned by `player`.
pub fn territory_count(grid: &Grid, player: Player) -> usize {
    grid.iter()
        .filter(|(_, c)| c.owner == Some(player))
        .count()
}

/// Number of owned cells that carry one of `player`'s units.
pub fn occupied_count(grid: &Grid, player: Player) -> usize {
    grid.iter()
        .filter(|(_, c)| {
            c.owner == Some(player) && c.occupant.is_some_and(|u| u.owner == player)
        })
        .count()
}

/// Living units of `player` with their positions, by ascending spawn order.
pub fn living_units(grid: &Grid, player: Player) -> Vec<(Coord, UnitInstance)> {
    let mut units: Vec<(Coord, UnitInstance)> = grid
        .units()
        .filter(|(_, u)| u.owner == player)
        .map(|(at, u)| (at, *u))
        .collect();
    units.sort_by_key(|(_, u)| u.spawn_order);
    units
}

/// All living units sorted by `(owner, spawn_order)`.
pub fn all_living_units(grid: &Grid) -> Vec<(Coord, UnitInstance)> {
    let mut units: Vec<(Coord, UnitInstance)> = grid.units().map(|(at, u)| (at, *u)).collect();
    units.sort_by_key(|(_, u)| (u.owner, u.spawn_order));
    units
}

/// Returns true if `player` still has at least one unit on the board.
pub fn has_units(grid: &Grid, player: Player) -> bool {
    grid.units().any(|(_, u)| u.owner == player)
}

/// Sum of current hit points over `player`'s living units.
pub fn total_hp(grid: &Grid, player: Player) -> u32 {
    grid.units()
        .filter(|(_, u)| u.owner == player)
        .map(|(_, u)| u.hp)
        .sum()
}
