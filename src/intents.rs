//! Legal shopping intents.
//!
//! Lists where a player may currently buy territory or deploy units, and
//! plays out a random legal shopping turn. This is a move generator for
//! self-play and front ends, not a strategy.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Coord, MatchState, Player, UnitKind};
use crate::engine::Engine;
use crate::resolve::economy::{check_buy, check_deploy, EconomyRules};

/// Cells `player` could buy right now, row-major.
pub fn territory_options(state: &MatchState, player: Player, rules: &EconomyRules) -> Vec<Coord> {
    state
        .grid
        .iter()
        .map(|(at, _)| at)
        .filter(|&at| check_buy(state, player, at, rules).is_ok())
        .collect()
}

/// Owned, empty cells where `player` could place a unit, row-major.
/// Empty exactly when the unit cap is reached.
pub fn deploy_options(state: &MatchState, player: Player) -> Vec<Coord> {
    state
        .grid
        .iter()
        .filter(|(_, c)| c.valid && c.owner == Some(player) && c.occupant.is_none())
        .map(|(at, _)| at)
        .collect()
}

/// Enabled kinds `player` can afford, in catalog order.
pub fn affordable_units(state: &MatchState, player: Player, enabled: &[UnitKind]) -> Vec<UnitKind> {
    let gold = state.player(player).gold;
    enabled
        .iter()
        .copied()
        .filter(|k| k.template().cost <= gold)
        .collect()
}

/// Every legal `(cell, kind)` deployment for `player`.
pub fn deploy_intents(
    state: &MatchState,
    player: Player,
    enabled: &[UnitKind],
) -> Vec<(Coord, UnitKind)> {
    let kinds = affordable_units(state, player, enabled);
    deploy_options(state, player)
        .into_iter()
        .flat_map(|at| kinds.iter().map(move |&k| (at, k)))
        .filter(|&(at, k)| check_deploy(state, player, at, k, enabled).is_ok())
        .collect()
}

/// What a random shopping turn did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingSummary {
    pub bought: Option<Coord>,
    pub deployed: Vec<(Coord, UnitKind)>,
}

/// Makes random legal purchases for the active shopper: at most one
/// territory, then deployments until the player stops or runs out of
/// options. Does nothing outside a shopping phase. Does not call `done`.
pub fn random_shopping(engine: &mut Engine, rng: &mut impl Rng) -> ShoppingSummary {
    let mut summary = ShoppingSummary::default();
    let Some(player) = engine.active_shopper() else {
        return summary;
    };

    if rng.gen_bool(0.75) {
        let options = territory_options(engine.state(), player, engine.rules());
        if let Some(&at) = options.choose(rng) {
            if engine.buy_territory(player, at).is_ok() {
                summary.bought = Some(at);
            }
        }
    }

    loop {
        let intents = deploy_intents(engine.state(), player, engine.enabled_templates());
        let Some(&(at, kind)) = intents.choose(rng) else {
            break;
        };
        if engine.deploy(player, at, kind).is_err() {
            break;
        }
        summary.deployed.push((at, kind));
        if rng.gen_bool(0.25) {
            break;
        }
    }
    summary
}
