//! Match state representation.
//!
//! Holds the complete snapshot of a match: the grid, both players' economy
//! state, the round index, the current phase, the execution schedule of the
//! running phase, and the action log.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::hex::Coord;
use super::player::{Player, PlayerState, ALL_PLAYERS};
use super::roster::{occupied_count, territory_count};
use super::unit::{UnitId, UnitKind};

/// Which units act during an execution phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecFilter {
    Only(Player),
    All,
}

impl ExecFilter {
    pub fn includes(self, player: Player) -> bool {
        match self {
            ExecFilter::Only(p) => p == player,
            ExecFilter::All => true,
        }
    }
}

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner(Player),
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Winner(p) => write!(f, "winner {}", p),
            Outcome::Draw => f.write_str("draw"),
        }
    }
}

/// The phase state machine's current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Shopping(Player),
    Executing(ExecFilter),
    GameOver(Outcome),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Shopping(p) => write!(f, "shopping-{}", p),
            Phase::Executing(ExecFilter::Only(p)) => write!(f, "executing-{}", p),
            Phase::Executing(ExecFilter::All) => f.write_str("executing-all"),
            Phase::GameOver(Outcome::Winner(p)) => write!(f, "gameover-{}", p),
            Phase::GameOver(Outcome::Draw) => f.write_str("gameover-draw"),
        }
    }
}

/// What a unit did with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ActionKind {
    /// No enemies remain.
    Idle,
    Heal {
        target: Coord,
        amount: u32,
        hp_after: u32,
    },
    Hit {
        target: Coord,
        damage: u32,
        hp_after: u32,
    },
    Kill {
        target: Coord,
        victim: UnitId,
        damage: u32,
    },
    Move {
        to: Coord,
    },
    /// Wanted to move but no empty neighbor gets closer.
    Blocked,
}

/// One resolved unit turn, as recorded in the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub round: u32,
    pub unit: UnitId,
    pub kind: UnitKind,
    pub at: Coord,
    pub effect: ActionKind,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{} {} {} {} ", self.round, self.unit, self.kind, self.at)?;
        match self.effect {
            ActionKind::Idle => f.write_str("idle"),
            ActionKind::Heal {
                target,
                amount,
                hp_after,
            } => write!(f, "heal {} +{} hp {}", target, amount, hp_after),
            ActionKind::Hit {
                target,
                damage,
                hp_after,
            } => write!(f, "hit {} dmg {} hp {}", target, damage, hp_after),
            ActionKind::Kill {
                target,
                victim,
                damage,
            } => write!(f, "kill {} {} dmg {}", target, victim, damage),
            ActionKind::Move { to } => write!(f, "move {}", to),
            ActionKind::Blocked => f.write_str("blocked"),
        }
    }
}

/// Complete match state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub grid: Grid,
    /// Indexed by `Player::index()`.
    pub players: [PlayerState; 2],
    /// 1-based round counter.
    pub round: u32,
    pub phase: Phase,
    /// Units scheduled for the running execution phase, in acting order.
    pub schedule: Vec<UnitId>,
    /// Index of the next schedule entry to resolve.
    pub cursor: usize,
    pub log: Vec<Action>,
}

impl MatchState {
    /// Sets up round 1: each player owns its home cell and holds
    /// `starting_gold`; player 1 shops first.
    pub fn new(mut grid: Grid, starting_gold: u32, homes: [Coord; 2]) -> Self {
        for p in ALL_PLAYERS {
            if let Some(cell) = grid.cell_mut(homes[p.index()]) {
                cell.owner = Some(p);
            }
        }
        MatchState {
            grid,
            players: [PlayerState::new(starting_gold); 2],
            round: 1,
            phase: Phase::Shopping(Player::P1),
            schedule: Vec::new(),
            cursor: 0,
            log: Vec::new(),
        }
    }

    pub fn player(&self, p: Player) -> &PlayerState {
        &self.players[p.index()]
    }

    pub fn player_mut(&mut self, p: Player) -> &mut PlayerState {
        &mut self.players[p.index()]
    }

    /// Checks every cross-structure invariant: grid consistency, unit cap,
    /// and spawn-order bookkeeping. Used to vet reloaded snapshots.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.grid.check_invariants()?;
        if self.round == 0 {
            return Err("round index must start at 1".to_string());
        }
        for p in ALL_PLAYERS {
            let units = occupied_count(&self.grid, p);
            let territory = territory_count(&self.grid, p);
            if units > territory {
                return Err(format!("{} has {} units on {} cells", p, units, territory));
            }
            let mut spawns: Vec<u32> = self
                .grid
                .units()
                .filter(|(_, u)| u.owner == p)
                .map(|(_, u)| u.spawn_order)
                .collect();
            spawns.sort_unstable();
            let before = spawns.len();
            spawns.dedup();
            if spawns.len() != before {
                return Err(format!("{} has duplicate spawn orders", p));
            }
            if spawns.last().is_some_and(|&s| s >= self.player(p).next_spawn) {
                return Err(format!("{} spawn counter is behind its units", p));
            }
        }
        if self.cursor > self.schedule.len() {
            return Err("execution cursor past end of schedule".to_string());
        }
        Ok(())
    }
}
