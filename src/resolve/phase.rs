//! Phase sequencing logic.
//!
//! Determines the next phase of a round, builds the execution schedule,
//! resolves scheduled units one at a time, and settles the end of a round.
//!
//! Round flow:
//! - Round 1: Shopping(P1) -> Shopping(P2) -> Executing(all) -> round end
//! - Later:   Shopping(P1) -> Executing(P1) -> Shopping(P2) -> Executing(P2) -> round end
//!
//! Round end either resolves the match on remaining hit points (when the
//! round limit is reached) or pays interest and starts the next round.

use tracing::trace;

use crate::board::roster::{has_units, living_units, total_hp};
use crate::board::{
    Action, ExecFilter, Grid, MatchState, Outcome, Phase, Player, UnitId, ALL_PLAYERS,
};

use super::combat::execute_turn;
use super::economy::{settle_interest, EconomyRules};

/// Where `done` leads from a given phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Enter(Phase),
    RoundEnd,
}

/// What a completed transition did to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved to another phase within the same round.
    Phase(Phase),
    /// Interest was paid and round `round` began with Shopping(P1).
    NewRound { round: u32 },
    /// The round limit was reached; remaining hit points decided the match.
    Final(Outcome),
}

/// Computes where the state machine goes from `phase` in round `round`.
/// Returns `None` once the match is over.
pub fn next_step(round: u32, phase: Phase) -> Option<NextStep> {
    let step = match (round, phase) {
        (_, Phase::GameOver(_)) => return None,
        (1, Phase::Shopping(Player::P1)) => NextStep::Enter(Phase::Shopping(Player::P2)),
        (1, Phase::Shopping(Player::P2)) => NextStep::Enter(Phase::Executing(ExecFilter::All)),
        (_, Phase::Shopping(p)) => NextStep::Enter(Phase::Executing(ExecFilter::Only(p))),
        (_, Phase::Executing(ExecFilter::Only(Player::P1))) => {
            NextStep::Enter(Phase::Shopping(Player::P2))
        }
        (_, Phase::Executing(_)) => NextStep::RoundEnd,
    };
    Some(step)
}

/// The player whose units act first when everyone executes together:
/// player 1 on odd rounds, player 2 on even rounds.
pub fn first_mover(round: u32) -> Player {
    if round % 2 == 1 {
        Player::P1
    } else {
        Player::P2
    }
}

/// Lists the units that act in an execution phase, in acting order.
pub fn build_schedule(grid: &Grid, round: u32, filter: ExecFilter) -> Vec<UnitId> {
    let order = match filter {
        ExecFilter::Only(p) => vec![p],
        ExecFilter::All => {
            let first = first_mover(round);
            vec![first, first.other()]
        }
    };
    order
        .into_iter()
        .flat_map(|p| living_units(grid, p).into_iter().map(|(_, u)| u.id()))
        .collect()
}

/// Returns the outcome if at least one side has no units left.
pub fn check_winner(grid: &Grid) -> Option<Outcome> {
    match (has_units(grid, Player::P1), has_units(grid, Player::P2)) {
        (true, true) => None,
        (true, false) => Some(Outcome::Winner(Player::P1)),
        (false, true) => Some(Outcome::Winner(Player::P2)),
        (false, false) => Some(Outcome::Draw),
    }
}

/// Decides a match that ran out of rounds: higher summed hp wins.
pub fn final_outcome(grid: &Grid) -> Outcome {
    let p1 = total_hp(grid, Player::P1);
    let p2 = total_hp(grid, Player::P2);
    match p1.cmp(&p2) {
        std::cmp::Ordering::Greater => Outcome::Winner(Player::P1),
        std::cmp::Ordering::Less => Outcome::Winner(Player::P2),
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

/// Returns true if finishing `round` exhausts the round limit.
pub fn is_last_round(round: u32, round_limit: u32) -> bool {
    round + 1 > round_limit
}

/// Switches the state into `phase`, preparing the schedule for execution.
pub fn enter_phase(state: &mut MatchState, phase: Phase) {
    state.phase = phase;
    state.cursor = 0;
    state.schedule = match phase {
        Phase::Executing(filter) => build_schedule(&state.grid, state.round, filter),
        _ => Vec::new(),
    };
    trace!(phase = %phase, schedule = ?state.schedule, "entered phase");
}

/// Closes the current round.
pub fn end_round(state: &mut MatchState, rules: &EconomyRules, round_limit: u32) -> Transition {
    if is_last_round(state.round, round_limit) {
        let outcome = final_outcome(&state.grid);
        enter_phase(state, Phase::GameOver(outcome));
        return Transition::Final(outcome);
    }
    settle_interest(state, rules);
    for p in ALL_PLAYERS {
        state.player_mut(p).territory_bought = false;
    }
    state.round += 1;
    enter_phase(state, Phase::Shopping(Player::P1));
    Transition::NewRound { round: state.round }
}

/// Advances the state machine by one `done`. Returns `None` if the match
/// is already over. Callers are responsible for refusing to leave an
/// execution phase that still has units to resolve.
pub fn advance(state: &mut MatchState, rules: &EconomyRules, round_limit: u32) -> Option<Transition> {
    match next_step(state.round, state.phase)? {
        NextStep::Enter(phase) => {
            enter_phase(state, phase);
            Some(Transition::Phase(phase))
        }
        NextStep::RoundEnd => Some(end_round(state, rules, round_limit)),
    }
}

/// Number of scheduled units that are still alive and have not acted yet.
pub fn remaining_in_schedule(state: &MatchState) -> usize {
    state
        .schedule
        .iter()
        .skip(state.cursor)
        .filter(|id| state.grid.find_unit(**id).is_some())
        .count()
}

/// Returns true when no scheduled unit is left to act.
pub fn execution_complete(state: &MatchState) -> bool {
    remaining_in_schedule(state) == 0
}

/// Resolves the next living scheduled unit, appends the action to the log,
/// and ends the match if a side has been wiped out. Units that died before
/// their slot are skipped. Returns `None` when the schedule is exhausted.
pub fn resolve_next(state: &mut MatchState) -> Option<Action> {
    while state.cursor < state.schedule.len() {
        let id = state.schedule[state.cursor];
        state.cursor += 1;
        let Some(at) = state.grid.find_unit(id) else {
            continue;
        };
        let Some(kind) = state.grid.unit_at(at).map(|u| u.kind) else {
            continue;
        };
        let effect = execute_turn(&mut state.grid, at);
        let action = Action {
            round: state.round,
            unit: id,
            kind,
            at,
            effect,
        };
        state.log.push(action);
        if let Some(outcome) = check_winner(&state.grid) {
            enter_phase(state, Phase::GameOver(outcome));
        }
        return Some(action);
    }
    None
}
