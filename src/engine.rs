//! Engine state management.
//!
//! Holds the one live match, the enabled unit roster, and the store it is
//! persisted to. Player intents and execution steps go through the engine,
//! which enforces whose turn it is, saves at phase and round boundaries,
//! and writes protocol replies for the `handle_*` commands.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::roster::{occupied_count, territory_count};
use crate::board::{
    Action, Coord, MatchState, Outcome, Phase, Player, UnitId, UnitKind, ALL_UNIT_KINDS,
};
use crate::config::{ConfigError, MatchConfig};
use crate::protocol::snapshot::{Snapshot, SnapshotError, SnapshotStore};
use crate::resolve::economy::{self, EconomyRules, IllegalMove};
use crate::resolve::phase::{self, Transition};

/// Everything that can go wrong at the engine's boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),

    /// The snapshot store itself cannot be used. Unreadable or stale
    /// snapshots never surface here; resume discards them.
    #[error("snapshot store unavailable: {0}")]
    Store(#[from] SnapshotError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Owns a match and drives it through its phases.
pub struct Engine {
    config: MatchConfig,
    rules: EconomyRules,
    state: MatchState,
    enabled: Vec<UnitKind>,
    store: Box<dyn SnapshotStore>,
}

fn fresh_state(config: &MatchConfig) -> MatchState {
    MatchState::new(config.build_grid(), config.starting_gold, config.homes())
}

/// Deduplicates and puts kinds in catalog order. Empty means everything.
fn normalize_roster(kinds: &[UnitKind]) -> Vec<UnitKind> {
    let roster: Vec<UnitKind> = ALL_UNIT_KINDS
        .iter()
        .copied()
        .filter(|k| kinds.contains(k))
        .collect();
    if roster.is_empty() {
        ALL_UNIT_KINDS.to_vec()
    } else {
        roster
    }
}

impl Engine {
    /// Starts a fresh match, ignoring any saved one. The saved roster is
    /// still honored.
    pub fn new(config: MatchConfig, store: Box<dyn SnapshotStore>) -> Result<Self, EngineError> {
        config.validate()?;
        let mut engine = Engine {
            rules: config.economy(),
            state: fresh_state(&config),
            enabled: ALL_UNIT_KINDS.to_vec(),
            config,
            store,
        };
        engine.load_roster();
        info!(
            rows = engine.config.board.rows,
            cols = engine.config.board.cols,
            round_limit = engine.config.round_limit,
            "match started"
        );
        Ok(engine)
    }

    /// Continues the saved match if there is a usable one. A snapshot that
    /// cannot be read or does not fit the configured board is discarded and
    /// a fresh match starts instead.
    pub fn resume(config: MatchConfig, store: Box<dyn SnapshotStore>) -> Result<Self, EngineError> {
        let mut engine = Engine::new(config, store)?;
        let expected = engine.config.build_grid();
        let loaded = engine
            .store
            .load_match()
            .and_then(|snap| match snap {
                Some(s) => s.check_against(&expected).map(|()| Some(s)),
                None => Ok(None),
            });
        match loaded {
            Ok(Some(snap)) => {
                info!(round = snap.state.round, phase = %snap.state.phase, "match resumed");
                engine.state = snap.state;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "discarding saved match"),
        }
        Ok(engine)
    }

    fn load_roster(&mut self) {
        match self.store.load_roster() {
            Ok(Some(kinds)) => self.enabled = normalize_roster(&kinds),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "roster unreadable, enabling every unit"),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn rules(&self) -> &EconomyRules {
        &self.rules
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Unit kinds that may currently be deployed, in catalog order.
    pub fn enabled_templates(&self) -> &[UnitKind] {
        &self.enabled
    }

    /// The player whose shopping turn it is, if any.
    pub fn active_shopper(&self) -> Option<Player> {
        match self.state.phase {
            Phase::Shopping(p) => Some(p),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state.phase {
            Phase::GameOver(o) => Some(o),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.state.clone())
    }

    /// Throws away the current match and starts over.
    pub fn new_match(&mut self) {
        self.state = fresh_state(&self.config);
        info!("match restarted");
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save_match(&self.snapshot()) {
            warn!(error = %e, "failed to save match");
        }
    }

    fn require_shopper(&self, action: &'static str, player: Player) -> Result<(), IllegalMove> {
        match self.state.phase {
            Phase::Shopping(active) if active == player => Ok(()),
            Phase::Shopping(active) => Err(IllegalMove::NotYourTurn { player, active }),
            Phase::GameOver(_) => Err(IllegalMove::MatchOver),
            phase => Err(IllegalMove::WrongPhase { action, phase }),
        }
    }

    pub fn buy_territory(&mut self, player: Player, at: Coord) -> Result<(), IllegalMove> {
        self.require_shopper("buy", player)?;
        economy::buy_territory(&mut self.state, player, at, &self.rules)?;
        debug!(%player, %at, gold = self.state.player(player).gold, "territory bought");
        Ok(())
    }

    pub fn deploy(
        &mut self,
        player: Player,
        at: Coord,
        kind: UnitKind,
    ) -> Result<UnitId, IllegalMove> {
        self.require_shopper("deploy", player)?;
        let id = economy::deploy_unit(&mut self.state, player, at, kind, &self.enabled)?;
        debug!(unit = %id, %kind, %at, gold = self.state.player(player).gold, "unit deployed");
        Ok(id)
    }

    /// Ends the current phase. An execution phase can only end once every
    /// scheduled unit has acted.
    pub fn done(&mut self) -> Result<Transition, IllegalMove> {
        let leaving = self.state.phase;
        if let Phase::Executing(_) = leaving {
            let remaining = phase::remaining_in_schedule(&self.state);
            if remaining > 0 {
                return Err(IllegalMove::ExecutionPending { remaining });
            }
        }
        let transition = phase::advance(&mut self.state, &self.rules, self.config.round_limit)
            .ok_or(IllegalMove::MatchOver)?;
        match transition {
            Transition::Phase(p) => info!(round = self.state.round, phase = %p, "phase started"),
            Transition::NewRound { round } => info!(round, "round started"),
            Transition::Final(o) => info!(outcome = %o, "round limit reached"),
        }
        let save = matches!(leaving, Phase::Shopping(_))
            || !matches!(transition, Transition::Phase(_));
        if save {
            self.persist();
        }
        Ok(transition)
    }

    /// Resolves the next scheduled unit. `Ok(None)` means the phase has
    /// nothing left to resolve.
    pub fn step(&mut self) -> Result<Option<Action>, IllegalMove> {
        match self.state.phase {
            Phase::Executing(_) => {}
            Phase::GameOver(_) => return Err(IllegalMove::MatchOver),
            phase => {
                return Err(IllegalMove::WrongPhase {
                    action: "step",
                    phase,
                })
            }
        }
        let action = phase::resolve_next(&mut self.state);
        if let Some(a) = &action {
            debug!(action = %a, "unit resolved");
        }
        if let Phase::GameOver(outcome) = self.state.phase {
            info!(%outcome, round = self.state.round, "match over");
            self.persist();
        }
        Ok(action)
    }

    /// True once the running phase has no more work: every scheduled unit
    /// has acted, or the match is over. Shopping ends only on `done`.
    pub fn is_phase_complete(&self) -> bool {
        match self.state.phase {
            Phase::Shopping(_) => false,
            Phase::Executing(_) => phase::execution_complete(&self.state),
            Phase::GameOver(_) => true,
        }
    }

    /// Steps until the execution phase is complete or the match ends.
    pub fn run_phase(&mut self) -> Result<Vec<Action>, IllegalMove> {
        let mut actions = Vec::new();
        while let Some(a) = self.step()? {
            actions.push(a);
            if self.outcome().is_some() {
                break;
            }
        }
        Ok(actions)
    }

    /// Replaces the deployable roster and saves it. An empty list enables
    /// every unit.
    pub fn set_enabled_templates(&mut self, kinds: &[UnitKind]) {
        self.enabled = normalize_roster(kinds);
        if let Err(e) = self.store.save_roster(&self.enabled) {
            warn!(error = %e, "failed to save roster");
        }
    }

    fn write_illegal<W: Write>(out: &mut W, err: &IllegalMove) -> io::Result<()> {
        writeln!(out, "illegal {}", err)
    }

    fn write_outcome<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.outcome() {
            Some(o) => writeln!(out, "gameover {}", o),
            None => Ok(()),
        }
    }

    /// Handles `status`: one summary line.
    pub fn handle_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = &self.state;
        let [p1, p2] = [Player::P1, Player::P2];
        writeln!(
            out,
            "status round {} phase {} gold {} {} territory {} {} units {} {}",
            s.round,
            s.phase,
            s.player(p1).gold,
            s.player(p2).gold,
            territory_count(&s.grid, p1),
            territory_count(&s.grid, p2),
            occupied_count(&s.grid, p1),
            occupied_count(&s.grid, p2),
        )?;
        out.flush()
    }

    /// Handles `newmatch`.
    pub fn handle_new_match<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.new_match();
        writeln!(out, "ok")?;
        out.flush()
    }

    /// Handles `buy <row> <col>` for whoever is shopping.
    pub fn handle_buy<W: Write>(&mut self, at: Coord, out: &mut W) -> io::Result<()> {
        let player = self.active_shopper().unwrap_or(Player::P1);
        match self.buy_territory(player, at) {
            Ok(()) => writeln!(out, "ok")?,
            Err(e) => Self::write_illegal(out, &e)?,
        }
        out.flush()
    }

    /// Handles `deploy <row> <col> <unit>` for whoever is shopping.
    pub fn handle_deploy<W: Write>(
        &mut self,
        at: Coord,
        kind: UnitKind,
        out: &mut W,
    ) -> io::Result<()> {
        let player = self.active_shopper().unwrap_or(Player::P1);
        match self.deploy(player, at, kind) {
            Ok(_) => writeln!(out, "ok")?,
            Err(e) => Self::write_illegal(out, &e)?,
        }
        out.flush()
    }

    /// Handles `done`: announces the new phase, and the result if the
    /// round limit ended the match.
    pub fn handle_done<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match self.done() {
            Ok(_) => {
                writeln!(out, "phase {}", self.state.phase)?;
                self.write_outcome(out)?;
            }
            Err(e) => Self::write_illegal(out, &e)?,
        }
        out.flush()
    }

    /// Handles `step`: one action, or `complete`.
    pub fn handle_step<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match self.step() {
            Ok(Some(a)) => {
                writeln!(out, "action {}", a)?;
                self.write_outcome(out)?;
            }
            Ok(None) => writeln!(out, "complete")?,
            Err(e) => Self::write_illegal(out, &e)?,
        }
        out.flush()
    }

    /// Handles `run`: every remaining action, then `complete` or the result.
    pub fn handle_run<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match self.run_phase() {
            Ok(actions) => {
                for a in &actions {
                    writeln!(out, "action {}", a)?;
                }
                if self.outcome().is_some() {
                    self.write_outcome(out)?;
                } else {
                    writeln!(out, "complete")?;
                }
            }
            Err(e) => Self::write_illegal(out, &e)?,
        }
        out.flush()
    }

    /// Handles `roster`.
    pub fn handle_roster<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let ids: Vec<&str> = self.enabled.iter().map(|k| k.id()).collect();
        writeln!(out, "roster {}", ids.join(" "))?;
        out.flush()
    }

    /// Handles `catalog`: one `unit` line per enabled template.
    pub fn handle_catalog<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for kind in &self.enabled {
            let t = kind.template();
            writeln!(
                out,
                "unit {} {} tier {} cost {} hp {} atk {} def {}",
                t.id, t.name, t.tier, t.cost, t.base_hp, t.attack, t.defense
            )?;
        }
        out.flush()
    }

    /// Handles `enable <unit> ...`.
    pub fn handle_enable<W: Write>(&mut self, kinds: &[UnitKind], out: &mut W) -> io::Result<()> {
        self.set_enabled_templates(kinds);
        writeln!(out, "ok")?;
        out.flush()
    }

    /// Handles `snapshot`: the current match as one JSON line.
    pub fn handle_snapshot<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.snapshot().to_json() {
            Ok(json) => writeln!(out, "{}", json)?,
            Err(e) => writeln!(out, "error {}", e)?,
        }
        out.flush()
    }
}
