//! Hexclash -- a two-player hex territory and combat engine driven over a
//! line protocol.
//!
//! This binary reads commands from stdin and writes replies to stdout.
//! Logs go to stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hexclash::config::MatchConfig;
use hexclash::engine::{Engine, EngineError};
use hexclash::protocol::parser::{parse_command, Command};
use hexclash::protocol::snapshot::{DirStore, MemoryStore, SnapshotStore};

#[derive(Parser, Debug)]
#[command(name = "hexclash", version)]
#[command(about = "Two-player hex territory and combat engine over stdin/stdout")]
struct Args {
    /// Match configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for match.json and roster.json. Without it nothing
    /// outlives the process.
    #[arg(long)]
    store: Option<PathBuf>,
}

fn open_engine(args: &Args) -> Result<Engine, EngineError> {
    let config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    let store: Box<dyn SnapshotStore> = match &args.store {
        Some(dir) => Box::new(DirStore::open(dir)?),
        None => Box::new(MemoryStore::new()),
    };
    Engine::resume(config, store)
}

/// Dispatches one command. Returns `Ok(false)` on `quit`.
fn dispatch<W: Write>(engine: &mut Engine, cmd: Command, out: &mut W) -> io::Result<bool> {
    match cmd {
        Command::NewMatch => engine.handle_new_match(out)?,
        Command::Status => engine.handle_status(out)?,
        Command::Buy { at } => engine.handle_buy(at, out)?,
        Command::Deploy { at, kind } => engine.handle_deploy(at, kind, out)?,
        Command::Done => engine.handle_done(out)?,
        Command::Step => engine.handle_step(out)?,
        Command::Run => engine.handle_run(out)?,
        Command::Roster => engine.handle_roster(out)?,
        Command::Catalog => engine.handle_catalog(out)?,
        Command::Enable { kinds } => engine.handle_enable(&kinds, out)?,
        Command::Snapshot => engine.handle_snapshot(out)?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexclash=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut engine = match open_engine(&args) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "cannot start");
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let Some(cmd) = parse_command(&line) else {
            continue;
        };
        match dispatch(&mut engine, cmd, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdout closed");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
