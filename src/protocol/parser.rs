//! Line command parser.
//!
//! Parses one line of protocol input into a structured `Command` that the
//! main loop dispatches on.

use tracing::{debug, warn};

use crate::board::{Coord, UnitKind};

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Discard the current match and start a fresh one.
    NewMatch,

    /// Print a one-line summary of the match.
    Status,

    /// Buy territory for the active shopper: `buy <row> <col>`.
    Buy { at: Coord },

    /// Deploy a unit for the active shopper: `deploy <row> <col> <unit>`.
    Deploy { at: Coord, kind: UnitKind },

    /// End the current phase.
    Done,

    /// Resolve one scheduled unit.
    Step,

    /// Resolve every remaining scheduled unit.
    Run,

    /// Print the enabled unit roster.
    Roster,

    /// Print the stat template of every enabled unit.
    Catalog,

    /// Replace the enabled roster: `enable <unit> [<unit> ...]`.
    Enable { kinds: Vec<UnitKind> },

    /// Print the match as one line of JSON.
    Snapshot,

    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines and unknown commands. Malformed arguments
/// for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (&head, args) = tokens.split_first()?;

    match head {
        "newmatch" => Some(Command::NewMatch),
        "status" => Some(Command::Status),
        "done" => Some(Command::Done),
        "step" => Some(Command::Step),
        "run" => Some(Command::Run),
        "roster" => Some(Command::Roster),
        "catalog" => Some(Command::Catalog),
        "snapshot" => Some(Command::Snapshot),
        "quit" => Some(Command::Quit),

        "buy" => parse_buy(args),
        "deploy" => parse_deploy(args),
        "enable" => parse_enable(args),

        other => {
            debug!(command = other, "unknown command");
            None
        }
    }
}

fn parse_coord(row: &str, col: &str) -> Option<Coord> {
    match (row.parse::<usize>(), col.parse::<usize>()) {
        (Ok(r), Ok(c)) => Some(Coord::new(r, c)),
        _ => {
            warn!(row, col, "invalid cell");
            None
        }
    }
}

fn parse_unit(id: &str) -> Option<UnitKind> {
    let kind = UnitKind::from_id(id);
    if kind.is_none() {
        warn!(unit = id, "unknown unit");
    }
    kind
}

/// Parses `buy <row> <col>`.
fn parse_buy(args: &[&str]) -> Option<Command> {
    let [row, col] = args else {
        warn!("malformed buy: expected 'buy <row> <col>'");
        return None;
    };
    Some(Command::Buy {
        at: parse_coord(row, col)?,
    })
}

/// Parses `deploy <row> <col> <unit>`.
fn parse_deploy(args: &[&str]) -> Option<Command> {
    let [row, col, unit] = args else {
        warn!("malformed deploy: expected 'deploy <row> <col> <unit>'");
        return None;
    };
    Some(Command::Deploy {
        at: parse_coord(row, col)?,
        kind: parse_unit(unit)?,
    })
}

/// Parses `enable <unit> [<unit> ...]`.
fn parse_enable(args: &[&str]) -> Option<Command> {
    if args.is_empty() {
        warn!("malformed enable: expected at least one unit");
        return None;
    }
    let kinds = args
        .iter()
        .map(|id| parse_unit(id))
        .collect::<Option<Vec<_>>>()?;
    Some(Command::Enable { kinds })
}
