//! The two sides of a match and their per-player economy state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    P1,
    P2,
}

/// Both players, in seat order.
pub const ALL_PLAYERS: [Player; 2] = [Player::P1, Player::P2];

impl Player {
    /// Seat index, usable as an array index.
    pub const fn index(self) -> usize {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }

    /// The opposing player.
    pub const fn other(self) -> Player {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }

    /// Returns the protocol abbreviation (`p1` / `p2`).
    pub const fn abbr(self) -> &'static str {
        match self {
            Player::P1 => "p1",
            Player::P2 => "p2",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbr())
    }
}

/// Mutable economy state for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub gold: u32,
    /// Set by the first territory purchase of a round, cleared at round end.
    pub territory_bought: bool,
    /// Spawn order handed to this player's next deployed unit.
    pub next_spawn: u32,
}

impl PlayerState {
    pub fn new(gold: u32) -> Self {
        PlayerState {
            gold,
            territory_bought: false,
            next_spawn: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_displays_as_abbr() {
        assert_eq!(Player::P1.to_string(), "p1");
        assert_eq!(Player::P2.to_string(), "p2");
    }

    #[test]
    fn other_is_an_involution() {
        for p in ALL_PLAYERS {
            assert_ne!(p.other(), p);
            assert_eq!(p.other().other(), p);
        }
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Player::P2).unwrap(), "\"p2\"");
    }
}
