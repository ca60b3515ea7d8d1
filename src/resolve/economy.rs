//! Shopping-phase economy: territory purchases, unit deployment, and
//! end-of-round interest.
//!
//! Every spend is validated by a `check_*` function that only reads state;
//! the mutating entry points run the check first, so a rejected action never
//! leaves a partial change behind.

use thiserror::Error;

use crate::board::roster::{occupied_count, territory_count};
use crate::board::{Coord, MatchState, Phase, Player, UnitId, UnitInstance, UnitKind, ALL_PLAYERS};

/// Interest paid at round end, in percent of current gold (rounded down).
pub const INTEREST_PERCENT: u32 = 10;

/// Prices and payouts for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EconomyRules {
    pub territory_cost: u32,
    pub stipend: u32,
    pub gold_cap: u32,
}

/// A rejected player intent. The match state is untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("cell {0} is not on the board")]
    OffBoard(Coord),

    #[error("cell {0} is already owned")]
    AlreadyOwned(Coord),

    #[error("territory already bought this round")]
    TerritoryAlreadyBought,

    #[error("not enough gold: need {need}, have {have}")]
    InsufficientGold { need: u32, have: u32 },

    #[error("cell {0} does not border owned territory")]
    NotAdjacent(Coord),

    #[error("cell {0} is not owned by the deploying player")]
    NotOwned(Coord),

    #[error("cell {0} is occupied")]
    Occupied(Coord),

    #[error("unit cap reached: {units} units on {territory} cells")]
    UnitCapReached { units: usize, territory: usize },

    #[error("unit {0} is not enabled")]
    TemplateDisabled(UnitKind),

    #[error("{action} is not allowed during {phase}")]
    WrongPhase { action: &'static str, phase: Phase },

    #[error("it is {active}'s turn to shop, not {player}'s")]
    NotYourTurn { player: Player, active: Player },

    #[error("execution still has {remaining} unit(s) to resolve")]
    ExecutionPending { remaining: usize },

    #[error("the match is over")]
    MatchOver,
}

/// Validates a territory purchase without mutating anything.
///
/// The once-per-round limit is checked before gold, so a second purchase is
/// always rejected as `TerritoryAlreadyBought` however rich the player is.
pub fn check_buy(
    state: &MatchState,
    player: Player,
    at: Coord,
    rules: &EconomyRules,
) -> Result<(), IllegalMove> {
    let cell = state
        .grid
        .cell(at)
        .filter(|c| c.valid)
        .ok_or(IllegalMove::OffBoard(at))?;
    if cell.owner.is_some() {
        return Err(IllegalMove::AlreadyOwned(at));
    }
    let ps = state.player(player);
    if ps.territory_bought {
        return Err(IllegalMove::TerritoryAlreadyBought);
    }
    if ps.gold < rules.territory_cost {
        return Err(IllegalMove::InsufficientGold {
            need: rules.territory_cost,
            have: ps.gold,
        });
    }
    let borders_own = state
        .grid
        .neighbors(at)
        .into_iter()
        .any(|n| state.grid.cell(n).is_some_and(|c| c.owner == Some(player)));
    if !borders_own {
        return Err(IllegalMove::NotAdjacent(at));
    }
    Ok(())
}

/// Buys an unowned cell bordering `player`'s territory.
pub fn buy_territory(
    state: &mut MatchState,
    player: Player,
    at: Coord,
    rules: &EconomyRules,
) -> Result<(), IllegalMove> {
    check_buy(state, player, at, rules)?;
    if let Some(cell) = state.grid.cell_mut(at) {
        cell.owner = Some(player);
    }
    let ps = state.player_mut(player);
    ps.gold -= rules.territory_cost;
    ps.territory_bought = true;
    Ok(())
}

/// Validates a deployment without mutating anything.
pub fn check_deploy(
    state: &MatchState,
    player: Player,
    at: Coord,
    kind: UnitKind,
    enabled: &[UnitKind],
) -> Result<(), IllegalMove> {
    if !enabled.contains(&kind) {
        return Err(IllegalMove::TemplateDisabled(kind));
    }
    let cell = state
        .grid
        .cell(at)
        .filter(|c| c.valid)
        .ok_or(IllegalMove::OffBoard(at))?;
    if cell.owner != Some(player) {
        return Err(IllegalMove::NotOwned(at));
    }
    if cell.occupant.is_some() {
        return Err(IllegalMove::Occupied(at));
    }
    let cost = kind.template().cost;
    let have = state.player(player).gold;
    if have < cost {
        return Err(IllegalMove::InsufficientGold { need: cost, have });
    }
    let units = occupied_count(&state.grid, player);
    let territory = territory_count(&state.grid, player);
    if units >= territory {
        return Err(IllegalMove::UnitCapReached { units, territory });
    }
    Ok(())
}

/// Deploys a new unit of `kind` on an empty cell owned by `player`.
/// Returns the new unit's identity.
pub fn deploy_unit(
    state: &mut MatchState,
    player: Player,
    at: Coord,
    kind: UnitKind,
    enabled: &[UnitKind],
) -> Result<UnitId, IllegalMove> {
    check_deploy(state, player, at, kind, enabled)?;
    let ps = state.player_mut(player);
    ps.gold -= kind.template().cost;
    let spawn = ps.next_spawn;
    ps.next_spawn += 1;
    let unit = UnitInstance::spawn(kind, player, spawn);
    if let Some(cell) = state.grid.cell_mut(at) {
        cell.occupant = Some(unit);
    }
    Ok(unit.id())
}

/// Gold after one round of interest and stipend, capped.
pub fn with_interest(gold: u32, rules: &EconomyRules) -> u32 {
    let interest = (u64::from(gold) * u64::from(INTEREST_PERCENT) / 100) as u32;
    gold.saturating_add(interest)
        .saturating_add(rules.stipend)
        .min(rules.gold_cap)
}

/// Pays interest and stipend to both players.
pub fn settle_interest(state: &mut MatchState, rules: &EconomyRules) {
    for p in ALL_PLAYERS {
        let ps = state.player_mut(p);
        ps.gold = with_interest(ps.gold, rules);
    }
}
