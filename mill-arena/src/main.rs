//! Mill Self-Play Arena
//!
//! Plays seeded AI-vs-AI games through the public engine commands and
//! reports aggregate statistics.

mod stats;

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mill_core::{AiPlayer, Game, GameMode, Phase, Player};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::stats::{ArenaStats, GameRecord};

#[derive(Parser, Debug)]
#[command(name = "arena", about = "Seeded AI-vs-AI self-play for Nine Men's Morris")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 100)]
    games: u64,

    /// Base seed; game g seeds its AIs with seed + 2g and seed + 2g + 1
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stop a game after this many committed actions
    #[arg(long, default_value_t = 400)]
    max_plies: u32,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.max_plies == 0 {
        bail!("--max-plies must be at least 1");
    }

    info!(games = args.games, seed = args.seed, max_plies = args.max_plies, "starting arena");

    let start = Instant::now();
    let mut stats = ArenaStats::new();
    for g in 0..args.games {
        let record = play_game(g, args.seed, args.max_plies)
            .with_context(|| format!("game {g} failed"))?;
        debug!(game = g, ?record, "game finished");
        if record.winner.is_none() {
            warn!(game = g, plies = record.plies, "ply limit reached");
        }
        stats.record(&record);
    }
    info!(elapsed = ?start.elapsed(), "arena complete");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Mill Self-Play Arena");
        println!("====================");
        stats.print_summary();
    }
    Ok(())
}

/// Play one game between two independently seeded AIs.
fn play_game(index: u64, seed: u64, max_plies: u32) -> Result<GameRecord> {
    let base = seed.wrapping_add(index.wrapping_mul(2));
    let mut one = AiPlayer::seeded(base);
    let mut two = AiPlayer::seeded(base.wrapping_add(1));
    let mut game = Game::new(GameMode::TwoPlayer);

    let mut plies = 0;
    let mut reached_flying = false;
    while !game.is_game_over() && plies < max_plies {
        let ai = match game.turn() {
            Player::One => &mut one,
            Player::Two => &mut two,
        };
        let Some(action) = ai.choose_action(&game) else {
            bail!("no action for {:?} in an unfinished game", game.turn());
        };
        if !game.apply(action)?.is_applied() {
            bail!("engine ignored AI action {action:?}");
        }
        plies += 1;
        reached_flying |= [Player::One, Player::Two]
            .into_iter()
            .any(|p| game.phase(p) == Phase::Flying);
    }

    let winner = game.winner();
    Ok(GameRecord {
        winner,
        plies,
        mills: [
            game.player(Player::One).mills_formed,
            game.player(Player::Two).mills_formed,
        ],
        reached_flying,
    })
}
