//! Self-play match generation.
//!
//! Plays complete matches where both players shop with random legal
//! purchases and units fight on their fixed strategies. Matches run
//! sequentially or on a rayon pool, each seeded from the base seed, and
//! records are written as JSONL.

use std::io::{self, Write};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::board::roster::{territory_count, total_hp};
use crate::board::{Outcome, Phase, Player};
use crate::config::MatchConfig;
use crate::engine::{Engine, EngineError};
use crate::intents::random_shopping;
use crate::protocol::snapshot::MemoryStore;

/// Configuration for a self-play run.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of matches to play.
    pub num_games: usize,
    /// Worker threads; 1 plays sequentially.
    pub threads: usize,
    /// Base random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-match progress logging.
    pub quiet: bool,
    pub match_config: MatchConfig,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            threads: 4,
            seed: 0,
            quiet: false,
            match_config: MatchConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// The result of one finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub match_id: usize,
    pub outcome: Outcome,
    /// Round the match ended in.
    pub rounds: u32,
    /// Summed hp of surviving units, by player.
    pub final_hp: [u32; 2],
    /// Owned cells, by player.
    pub final_territory: [usize; 2],
    /// Number of resolved unit actions.
    pub actions: usize,
}

fn rng_for(seed: u64, match_id: usize) -> SmallRng {
    if seed != 0 {
        SmallRng::seed_from_u64(seed.wrapping_add(match_id as u64))
    } else {
        SmallRng::from_entropy()
    }
}

/// Plays one match to completion.
pub fn play_match(
    config: &MatchConfig,
    match_id: usize,
    rng: &mut SmallRng,
) -> Result<MatchRecord, EngineError> {
    let mut engine = Engine::new(config.clone(), Box::new(MemoryStore::new()))?;
    loop {
        match engine.phase() {
            Phase::Shopping(_) => {
                random_shopping(&mut engine, rng);
            }
            Phase::Executing(_) => {
                engine.run_phase()?;
                if engine.outcome().is_some() {
                    continue;
                }
            }
            Phase::GameOver(outcome) => {
                let state = engine.state();
                let grid = &state.grid;
                return Ok(MatchRecord {
                    match_id,
                    outcome,
                    rounds: state.round,
                    final_hp: [total_hp(grid, Player::P1), total_hp(grid, Player::P2)],
                    final_territory: [
                        territory_count(grid, Player::P1),
                        territory_count(grid, Player::P2),
                    ],
                    actions: state.log.len(),
                });
            }
        }
        engine.done()?;
    }
}

fn play_logged(config: &SelfPlayConfig, match_id: usize) -> Result<MatchRecord, EngineError> {
    let start = Instant::now();
    let mut rng = rng_for(config.seed, match_id);
    let record = play_match(&config.match_config, match_id, &mut rng)?;
    if !config.quiet {
        info!(
            game = match_id + 1,
            of = config.num_games,
            outcome = %record.outcome,
            rounds = record.rounds,
            secs = start.elapsed().as_secs_f64(),
            "match finished"
        );
    }
    Ok(record)
}

/// Plays `config.num_games` matches. Records come back in match order
/// whether or not they were played in parallel.
pub fn run_self_play(config: &SelfPlayConfig) -> Result<Vec<MatchRecord>, SelfPlayError> {
    config
        .match_config
        .validate()
        .map_err(EngineError::from)?;
    if config.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;
        let records = pool.install(|| {
            (0..config.num_games)
                .into_par_iter()
                .map(|i| play_logged(config, i))
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(records)
    } else {
        let records = (0..config.num_games)
            .map(|i| play_logged(config, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

/// Writes one JSON object per line.
pub fn write_jsonl<W: Write>(records: &[MatchRecord], out: &mut W) -> io::Result<()> {
    for r in records {
        serde_json::to_writer(&mut *out, r)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Aggregate results of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub games: usize,
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub draws: usize,
    pub avg_rounds: f64,
    pub avg_actions: f64,
}

pub fn summarize(records: &[MatchRecord]) -> Summary {
    let mut s = Summary {
        games: records.len(),
        ..Summary::default()
    };
    if records.is_empty() {
        return s;
    }
    for r in records {
        match r.outcome {
            Outcome::Winner(Player::P1) => s.p1_wins += 1,
            Outcome::Winner(Player::P2) => s.p2_wins += 1,
            Outcome::Draw => s.draws += 1,
        }
    }
    let n = records.len() as f64;
    s.avg_rounds = records.iter().map(|r| f64::from(r.rounds)).sum::<f64>() / n;
    s.avg_actions = records.iter().map(|r| r.actions as f64).sum::<f64>() / n;
    s
}
