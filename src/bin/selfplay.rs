//! Self-play match generation CLI.
//!
//! Plays random-shopping matches and writes one JSON record per match.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- [OPTIONS]

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hexclash::config::MatchConfig;
use hexclash::selfplay::{self, SelfPlayConfig};

#[derive(Parser, Debug)]
#[command(name = "selfplay")]
#[command(about = "Play hexclash matches with random legal shopping and emit JSONL")]
struct Args {
    /// Number of matches to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Worker threads (1 plays sequentially)
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Random seed, 0 for entropy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Match configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Suppress progress and summary logging
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexclash=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let match_config = match &args.config {
        Some(path) => match MatchConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, path = %path.display(), "bad config");
                return ExitCode::FAILURE;
            }
        },
        None => MatchConfig::default(),
    };
    let config = SelfPlayConfig {
        num_games: args.games,
        threads: args.threads,
        seed: args.seed,
        quiet: args.quiet,
        match_config,
    };

    if !config.quiet {
        info!(
            games = config.num_games,
            threads = config.threads,
            seed = config.seed,
            round_limit = config.match_config.round_limit,
            "self-play starting"
        );
    }

    let start = Instant::now();
    let records = match selfplay::run_self_play(&config) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "self-play failed");
            return ExitCode::FAILURE;
        }
    };

    if !config.quiet {
        let s = selfplay::summarize(&records);
        info!(
            games = s.games,
            p1_wins = s.p1_wins,
            p2_wins = s.p2_wins,
            draws = s.draws,
            avg_rounds = s.avg_rounds,
            avg_actions = s.avg_actions,
            secs = start.elapsed().as_secs_f64(),
            "self-play complete"
        );
    }

    let written = match &args.output {
        Some(path) => File::create(path)
            .and_then(|f| selfplay::write_jsonl(&records, &mut BufWriter::new(f))),
        None => selfplay::write_jsonl(&records, &mut BufWriter::new(io::stdout().lock())),
    };
    if let Err(e) = written {
        error!(error = %e, "failed to write records");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
