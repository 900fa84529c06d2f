//! Self-play statistics tracking.

use std::time::Instant;

use mill_core::Player;
use serde::Serialize;

/// Result of a single self-play game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRecord {
    /// None when the ply limit was hit first.
    pub winner: Option<Player>,
    /// Committed actions, removals included.
    pub plies: u32,
    /// Mills formed, indexed `[Player::One, Player::Two]`.
    pub mills: [u32; 2],
    /// Whether either side got down to flying.
    pub reached_flying: bool,
}

/// Aggregate statistics over many games.
#[derive(Debug, Default, Serialize)]
pub struct ArenaStats {
    pub games: u64,
    pub p1_wins: u64,
    pub p2_wins: u64,

    /// Games stopped at the ply limit
    pub unfinished: u64,

    pub total_plies: u64,
    pub longest_game: u32,

    /// Mills formed across all games
    pub p1_mills: u64,
    pub p2_mills: u64,

    /// Games in which someone flew
    pub reached_flying: u64,

    #[serde(skip)]
    start_time: Option<Instant>,
}

impl ArenaStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Fold one finished (or abandoned) game into the totals.
    pub fn record(&mut self, game: &GameRecord) {
        self.games += 1;
        match game.winner {
            Some(Player::One) => self.p1_wins += 1,
            Some(Player::Two) => self.p2_wins += 1,
            None => self.unfinished += 1,
        }
        self.total_plies += u64::from(game.plies);
        self.longest_game = self.longest_game.max(game.plies);
        self.p1_mills += u64::from(game.mills[0]);
        self.p2_mills += u64::from(game.mills[1]);
        if game.reached_flying {
            self.reached_flying += 1;
        }
    }

    pub fn average_plies(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_plies as f64 / self.games as f64
        }
    }

    fn percent(&self, count: u64) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.games as f64
        }
    }

    /// Print final summary
    pub fn print_summary(&self) {
        println!("Games played: {}", self.games);
        println!("  - P1 wins: {} ({:.1}%)", self.p1_wins, self.percent(self.p1_wins));
        println!("  - P2 wins: {} ({:.1}%)", self.p2_wins, self.percent(self.p2_wins));
        println!("  - Unfinished: {}", self.unfinished);
        println!("Average plies: {:.1}", self.average_plies());
        println!("Longest game: {} plies", self.longest_game);
        println!("Mills formed: P1={} P2={}", self.p1_mills, self.p2_mills);
        println!(
            "Reached flying: {} ({:.1}%)",
            self.reached_flying,
            self.percent(self.reached_flying)
        );

        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                println!("Average rate: {:.0} games/sec", self.games as f64 / elapsed);
            }
        }
    }
}
