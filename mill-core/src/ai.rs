//! One-ply heuristic opponent.
//!
//! Each decision walks a fixed priority list and takes the first tier that
//! has a candidate:
//!
//! ```text
//! Removal:    highest threat among pieces outside mills, else any piece
//! Placement:  complete own mill > block opponent mill > best potential > any
//! Movement:   complete own mill > block opponent mill > best position > any
//! Flying:     as movement, but every empty position is a destination
//! ```
//!
//! Candidates are tried on a scratch copy of the board inside a [`Trial`],
//! so the game's own board is never touched. Ties inside a tier are broken
//! by [`TieBreak`].
//!
//! [`Trial`]: crate::Trial

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, trace};

use crate::board::Board;
use crate::game::{Action, Game, Phase};
use crate::{Player, Pos};

/// How to choose between equally good candidates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TieBreak {
    /// Take the candidate with the lowest position ids.
    Lowest,
    /// Pick uniformly at random.
    Random,
}

/// Heuristic move selector for the side to act.
#[derive(Clone, Debug)]
pub struct AiPlayer {
    tie_break: TieBreak,
    rng: StdRng,
}

impl AiPlayer {
    /// Random tie-breaking seeded from the operating system.
    pub fn new() -> AiPlayer {
        AiPlayer {
            tie_break: TieBreak::Random,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Random tie-breaking with a reproducible seed.
    pub fn seeded(seed: u64) -> AiPlayer {
        AiPlayer {
            tie_break: TieBreak::Random,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Always take the lowest candidate.
    pub fn deterministic() -> AiPlayer {
        AiPlayer {
            tie_break: TieBreak::Lowest,
            rng: StdRng::seed_from_u64(0),
        }
    }

    #[inline]
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Choose an action for the player to act. Returns None when the game
    /// is over or no legal action exists.
    #[instrument(skip(self, game), fields(player = ?game.turn()))]
    pub fn choose_action(&mut self, game: &Game) -> Option<Action> {
        if game.is_game_over() {
            return None;
        }
        let player = game.turn();
        let mut board = game.board().clone();

        let action = if game.must_remove() {
            self.choose_removal(&board, player).map(Action::Remove)
        } else {
            match game.phase(player) {
                Phase::Placement => self.choose_placement(&mut board, player).map(Action::Place),
                phase => self
                    .choose_move(&mut board, player, phase == Phase::Flying)
                    .map(|(from, to)| Action::Move { from, to }),
            }
        };
        debug!(?action, "AI decision");
        action
    }

    fn choose_removal(&mut self, board: &Board, player: Player) -> Option<Pos> {
        let opponent = player.opponent();
        let targets: Vec<Pos> = board.pieces(opponent).collect();
        let free: Vec<Pos> = targets
            .iter()
            .copied()
            .filter(|&pos| !board.is_in_mill(pos, opponent))
            .collect();

        if free.is_empty() {
            trace!("every opponent piece is in a mill");
            return self.pick(&targets);
        }

        let scored: Vec<(Pos, usize)> = free
            .iter()
            .map(|&pos| (pos, threat(board, pos, opponent)))
            .collect();
        self.pick_best(&scored).or_else(|| self.pick(&free))
    }

    fn choose_placement(&mut self, board: &mut Board, player: Player) -> Option<Pos> {
        let opponent = player.opponent();
        let empties = board.empty_positions();

        let completing: Vec<Pos> = empties
            .iter()
            .copied()
            .filter(|&to| forms_mill(board, None, to, player))
            .collect();
        if !completing.is_empty() {
            trace!(?completing, "placement completes mill");
            return self.pick(&completing);
        }

        let blocking: Vec<Pos> = empties
            .iter()
            .copied()
            .filter(|&to| forms_mill(board, None, to, opponent))
            .collect();
        if !blocking.is_empty() {
            trace!(?blocking, "placement blocks mill");
            return self.pick(&blocking);
        }

        let scored: Vec<(Pos, usize)> = empties
            .iter()
            .map(|&to| (to, potential(board, to, player)))
            .collect();
        self.pick_best(&scored).or_else(|| self.pick(&empties))
    }

    fn choose_move(&mut self, board: &mut Board, player: Player, flying: bool) -> Option<(Pos, Pos)> {
        let opponent = player.opponent();
        let empties = board.empty_positions();
        let candidates: Vec<(Pos, Pos)> = board
            .pieces(player)
            .flat_map(|from| {
                let destinations = if flying {
                    empties.clone()
                } else {
                    board.legal_destinations(from)
                };
                destinations.into_iter().map(move |to| (from, to))
            })
            .collect();

        let completing: Vec<(Pos, Pos)> = candidates
            .iter()
            .copied()
            .filter(|&(from, to)| forms_mill(board, Some(from), to, player))
            .collect();
        if !completing.is_empty() {
            trace!(?completing, "move completes mill");
            return self.pick(&completing);
        }

        let blocking: Vec<(Pos, Pos)> = candidates
            .iter()
            .copied()
            .filter(|&(from, to)| blocks_mill(board, from, to, opponent))
            .collect();
        if !blocking.is_empty() {
            trace!(?blocking, "move blocks mill");
            return self.pick(&blocking);
        }

        let scored: Vec<((Pos, Pos), usize)> = candidates
            .iter()
            .map(|&(from, to)| ((from, to), positional(board, from, to, player)))
            .collect();
        self.pick_best(&scored).or_else(|| self.pick(&candidates))
    }

    /// Candidates with the highest non-zero score.
    fn pick_best<T: Copy>(&mut self, scored: &[(T, usize)]) -> Option<T> {
        let max = scored.iter().map(|&(_, score)| score).max()?;
        if max == 0 {
            return None;
        }
        let top: Vec<T> = scored
            .iter()
            .filter(|&&(_, score)| score == max)
            .map(|&(candidate, _)| candidate)
            .collect();
        self.pick(&top)
    }

    fn pick<T: Copy>(&mut self, candidates: &[T]) -> Option<T> {
        if candidates.is_empty() {
            return None;
        }
        let index = match self.tie_break {
            TieBreak::Lowest => 0,
            TieBreak::Random => self.rng.random_range(0..candidates.len()),
        };
        candidates.get(index).copied()
    }
}

impl Default for AiPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Would `player` landing on `to` (vacating `from`) complete a mill?
fn forms_mill(board: &mut Board, from: Option<Pos>, to: Pos, player: Player) -> bool {
    let mut trial = board.trial();
    if let Some(from) = from {
        trial.set_occupant(from, None);
    }
    trial.place(to, player);
    let formed = trial.is_mill(to, player);
    formed
}

/// After vacating `from`, would the opponent complete a mill on `to`?
fn blocks_mill(board: &mut Board, from: Pos, to: Pos, opponent: Player) -> bool {
    let mut trial = board.trial();
    trial.set_occupant(from, None).place(to, opponent);
    let formed = trial.is_mill(to, opponent);
    formed
}

/// Lines through `pos` holding exactly one own piece and two empty slots.
fn potential(board: &Board, pos: Pos, player: Player) -> usize {
    board
        .mill_lines_through(pos)
        .filter(|line| {
            board.count_on_line(line, Some(player)) == 1 && board.count_on_line(line, None) == 2
        })
        .count()
}

/// Own pieces sharing a line with `to`, not counting the piece that moves.
fn positional(board: &mut Board, from: Pos, to: Pos, player: Player) -> usize {
    let mut trial = board.trial();
    trial.set_occupant(from, None);
    let score: usize = trial
        .mill_lines_through(to)
        .map(|line| trial.count_on_line(line, Some(player)))
        .sum();
    score
}

/// How close the opponent piece on `pos` is to forming mills.
fn threat(board: &Board, pos: Pos, opponent: Player) -> usize {
    board
        .mill_lines_through(pos)
        .map(|line| match board.count_on_line(line, Some(opponent)) {
            2 => 2,
            1 => 1,
            _ => 0,
        })
        .sum()
}
