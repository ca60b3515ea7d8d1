//! Protocol handling.
//!
//! Parses the line commands read by the main loop and serializes matches
//! for persistence.

pub mod parser;
pub mod snapshot;

pub use parser::{parse_command, Command};
pub use snapshot::{DirStore, MemoryStore, Snapshot, SnapshotError, SnapshotStore, SNAPSHOT_SCHEMA};
