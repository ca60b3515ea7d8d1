//! Match persistence.
//!
//! A [`Snapshot`] wraps a [`MatchState`] with a schema number and is stored
//! as JSON. Stores also keep the enabled unit roster, a list of unit ids.
//! The engine only talks to storage through [`SnapshotStore`], at phase and
//! round boundaries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Grid, MatchState, UnitKind};

/// The only snapshot layout this build reads or writes.
pub const SNAPSHOT_SCHEMA: u32 = 1;

const MATCH_FILE: &str = "match.json";
const ROSTER_FILE: &str = "roster.json";

/// Errors from reading or writing persisted state.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot schema {found} is not supported")]
    SchemaMismatch { found: u64 },

    #[error("snapshot board does not match the configured board: {0}")]
    ShapeMismatch(String),
}

/// A serialized match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema: u32,
    pub state: MatchState,
}

impl Snapshot {
    pub fn new(state: MatchState) -> Self {
        Snapshot {
            schema: SNAPSHOT_SCHEMA,
            state,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a snapshot, checking the schema number before the body so a
    /// foreign layout is reported as a schema mismatch rather than garbage.
    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        let found = value
            .get("schema")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        if found != u64::from(SNAPSHOT_SCHEMA) {
            return Err(SnapshotError::SchemaMismatch { found });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Rejects a snapshot whose board differs from `expected` in size,
    /// orientation, or hole layout, or whose state is inconsistent.
    pub fn check_against(&self, expected: &Grid) -> Result<(), SnapshotError> {
        let grid = &self.state.grid;
        if !grid.same_shape(expected) {
            return Err(SnapshotError::ShapeMismatch(format!(
                "stored {}x{} {}, configured {}x{} {}",
                grid.rows(),
                grid.cols(),
                grid.orientation().abbr(),
                expected.rows(),
                expected.cols(),
                expected.orientation().abbr()
            )));
        }
        self.state
            .check_invariants()
            .map_err(SnapshotError::ShapeMismatch)
    }
}

/// Where the engine keeps its match and roster between sessions.
pub trait SnapshotStore: Send {
    /// Returns `Ok(None)` when nothing has been saved yet.
    fn load_match(&self) -> Result<Option<Snapshot>, SnapshotError>;

    fn save_match(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError>;

    /// Returns `Ok(None)` when no roster has been saved.
    fn load_roster(&self) -> Result<Option<Vec<UnitKind>>, SnapshotError>;

    fn save_roster(&mut self, roster: &[UnitKind]) -> Result<(), SnapshotError>;
}

/// Keeps serialized state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    match_json: Option<String>,
    roster_json: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with raw match JSON, as if a previous session
    /// had written it.
    pub fn with_match_json(json: impl Into<String>) -> Self {
        MemoryStore {
            match_json: Some(json.into()),
            roster_json: None,
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn load_match(&self) -> Result<Option<Snapshot>, SnapshotError> {
        self.match_json.as_deref().map(Snapshot::from_json).transpose()
    }

    fn save_match(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.match_json = Some(snapshot.to_json()?);
        Ok(())
    }

    fn load_roster(&self) -> Result<Option<Vec<UnitKind>>, SnapshotError> {
        match &self.roster_json {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save_roster(&mut self, roster: &[UnitKind]) -> Result<(), SnapshotError> {
        self.roster_json = Some(serde_json::to_string(roster)?);
        Ok(())
    }
}

/// Keeps `match.json` and `roster.json` in a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Uses `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(DirStore { dir })
    }

    fn read_optional(&self, name: &str) -> Result<Option<String>, SnapshotError> {
        match fs::read_to_string(self.dir.join(name)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes through a temporary file so a crash never leaves half a
    /// snapshot behind.
    fn write_atomic(&self, name: &str, contents: &str) -> Result<(), SnapshotError> {
        let tmp = self.dir.join(format!("{}.tmp", name));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, self.dir.join(name))?;
        Ok(())
    }
}

impl SnapshotStore for DirStore {
    fn load_match(&self) -> Result<Option<Snapshot>, SnapshotError> {
        self.read_optional(MATCH_FILE)?
            .as_deref()
            .map(Snapshot::from_json)
            .transpose()
    }

    fn save_match(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.write_atomic(MATCH_FILE, &snapshot.to_json()?)
    }

    fn load_roster(&self) -> Result<Option<Vec<UnitKind>>, SnapshotError> {
        match self.read_optional(ROSTER_FILE)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_roster(&mut self, roster: &[UnitKind]) -> Result<(), SnapshotError> {
        self.write_atomic(ROSTER_FILE, &serde_json::to_string(roster)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Coord, Orientation};

    fn state() -> MatchState {
        MatchState::new(
            Grid::new(4, 4, Orientation::OddR),
            20,
            [Coord::new(0, 0), Coord::new(3, 3)],
        )
    }

    #[test]
    fn json_roundtrip() {
        let snap = Snapshot::new(state());
        let back = Snapshot::from_json(&snap.to_json().unwrap()).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn schema_checked_before_body() {
        let err = Snapshot::from_json(r#"{"schema": 2, "state": "whatever"}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::SchemaMismatch { found: 2 }));
        let err = Snapshot::from_json(r#"{"state": null}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::SchemaMismatch { found: 0 }));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = Snapshot::from_json("not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
        let err = Snapshot::from_json(r#"{"schema": 1, "state": 7}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
    }

    #[test]
    fn shape_mismatch_detected() {
        let snap = Snapshot::new(state());
        assert!(snap.check_against(&Grid::new(4, 4, Orientation::OddR)).is_ok());
        for other in [
            Grid::new(5, 4, Orientation::OddR),
            Grid::new(4, 4, Orientation::EvenQ),
            Grid::with_holes(4, 4, Orientation::OddR, &[Coord::new(1, 1)]),
        ] {
            let err = snap.check_against(&other).unwrap_err();
            assert!(matches!(err, SnapshotError::ShapeMismatch(_)));
        }
    }

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load_match().unwrap().is_none());
        assert!(store.load_roster().unwrap().is_none());
        let snap = Snapshot::new(state());
        store.save_match(&snap).unwrap();
        assert_eq!(store.load_match().unwrap(), Some(snap));
        store
            .save_roster(&[UnitKind::Healer, UnitKind::Titan])
            .unwrap();
        assert_eq!(
            store.load_roster().unwrap(),
            Some(vec![UnitKind::Healer, UnitKind::Titan])
        );
    }

    #[test]
    fn dir_store_persists_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("saves");
        let snap = Snapshot::new(state());
        {
            let mut store = DirStore::open(&path).unwrap();
            assert!(store.load_match().unwrap().is_none());
            store.save_match(&snap).unwrap();
            store.save_roster(&[UnitKind::Knight]).unwrap();
        }
        let store = DirStore::open(&path).unwrap();
        assert_eq!(store.load_match().unwrap(), Some(snap));
        assert_eq!(store.load_roster().unwrap(), Some(vec![UnitKind::Knight]));
        assert!(path.join("match.json").exists());
        assert!(!path.join("match.json.tmp").exists());
    }

    #[test]
    fn dir_store_reports_corrupt_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("match.json"), "{").unwrap();
        fs::write(tmp.path().join("roster.json"), r#"["dragon"]"#).unwrap();
        let store = DirStore::open(tmp.path()).unwrap();
        assert!(matches!(store.load_match(), Err(SnapshotError::Malformed(_))));
        assert!(matches!(store.load_roster(), Err(SnapshotError::Malformed(_))));
    }
}
