//! Turn order, phases, captures, and win detection.
//!
//! # Command Model
//!
//! Every command validates against the current state. Position ids outside
//! 0-23 are rejected with [`MillError::InvalidPosition`], and commands issued
//! after the game has ended are rejected with [`MillError::GameOver`]. Any
//! other illegal command (occupied target, wrong phase, protected mill piece)
//! changes nothing and returns [`Outcome::Ignored`].
//!
//! # Phases
//!
//! ```text
//! Derived per player from its own counters, never stored:
//!   placed < 9            -> Placement
//!   remaining <= 3        -> Flying
//!   otherwise             -> Movement
//!
//! Orthogonal sub-state: a freshly formed mill gates every command except
//! remove_piece until the capture is made.
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::ai::AiPlayer;
use crate::board::{Board, MillLine, Node};
use crate::{
    MillError, MillResult, Player, Pos, FLYING_THRESHOLD, LOSING_THRESHOLD, PIECES_PER_PLAYER,
};

/// How the game is being played. Only `VsAi` changes engine behaviour
/// (it enables [`Game::request_ai_move`]).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum GameMode {
    TwoPlayer,
    VsAi,
    Tutorial,
}

/// A player's phase, derived from its own piece counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Still has pieces in hand to put on the board.
    Placement,
    /// Slides pieces to adjacent empty positions.
    Movement,
    /// Down to three pieces; may move to any empty position.
    Flying,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Phase::Placement => "placement",
            Phase::Movement => "movement",
            Phase::Flying => "flying",
        };
        f.write_str(label)
    }
}

/// Per-player counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Pieces not yet captured (in hand plus on board). Starts at 9.
    pub remaining: u8,
    /// Pieces put on the board so far. Starts at 0, capped at 9.
    pub placed: u8,
    /// Mills formed during this game.
    pub mills_formed: u32,
}

impl PlayerState {
    /// Counters at the start of a game.
    pub const fn new() -> PlayerState {
        PlayerState {
            remaining: PIECES_PER_PLAYER,
            placed: 0,
            mills_formed: 0,
        }
    }

    /// Derive the phase from these counters.
    #[inline]
    pub fn phase(&self) -> Phase {
        if self.placed < PIECES_PER_PLAYER {
            Phase::Placement
        } else if self.remaining <= FLYING_THRESHOLD {
            Phase::Flying
        } else {
            Phase::Movement
        }
    }

    /// Pieces still waiting to be placed.
    #[inline]
    pub fn in_hand(&self) -> u8 {
        PIECES_PER_PLAYER.saturating_sub(self.placed)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

/// A player-facing command.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Action {
    Place(Pos),
    /// Select a piece to move, or deselect it if already selected.
    Select(Pos),
    Move { from: Pos, to: Pos },
    Remove(Pos),
    Reset,
}

/// Whether a command changed the game.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Applied,
    Ignored,
}

impl Outcome {
    #[inline]
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// Everything a presentation layer needs to draw the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: GameMode,
    pub turn: Player,
    /// Derived phases, indexed `[Player::One, Player::Two]`.
    pub phases: [Phase; 2],
    /// Counters, indexed `[Player::One, Player::Two]`.
    pub players: [PlayerState; 2],
    pub must_remove: bool,
    /// Where the pending mill was formed.
    pub mill_at: Option<Pos>,
    /// Whether the last applied command formed a mill.
    pub last_mill_formed: bool,
    pub selected: Option<Pos>,
    pub game_over: bool,
    pub winner: Option<Player>,
    pub nodes: Vec<Node>,
    /// Standing mills, indexed `[Player::One, Player::Two]`.
    pub mills: [Vec<MillLine>; 2],
}

/// Notification emitted once per applied command, after the mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub cause: Action,
    pub snapshot: Snapshot,
}

type Observer = Box<dyn FnMut(&StateChange)>;

/// A single game of mill.
pub struct Game {
    board: Board,
    mode: GameMode,
    turn: Player,
    players: [PlayerState; 2],
    /// Set while a capture is pending.
    mill_at: Option<Pos>,
    last_mill_formed: bool,
    selected: Option<Pos>,
    winner: Option<Player>,
    ai_side: Player,
    ai: Option<AiPlayer>,
    observers: Vec<Observer>,
}

impl Game {
    /// Start a new game. In `VsAi` mode the computer plays `Player::Two`
    /// with random tie-breaking seeded from the OS.
    pub fn new(mode: GameMode) -> Game {
        let ai = (mode == GameMode::VsAi).then(AiPlayer::new);
        Game::build(mode, Board::new(), Player::One, [PlayerState::new(); 2], Player::Two, ai)
    }

    /// Start a new `VsAi` game with an explicit computer side and AI.
    pub fn with_ai(ai_side: Player, ai: AiPlayer) -> Game {
        Game::build(
            GameMode::VsAi,
            Board::new(),
            Player::One,
            [PlayerState::new(); 2],
            ai_side,
            Some(ai),
        )
    }

    /// Build a game from an arbitrary position.
    ///
    /// Counters are taken as given; the caller keeps them consistent with the
    /// board. Game-over is evaluated once, so a constructed stalemate is
    /// reported immediately.
    pub fn from_board(
        mode: GameMode,
        board: Board,
        turn: Player,
        players: [PlayerState; 2],
    ) -> Game {
        let ai = (mode == GameMode::VsAi).then(AiPlayer::new);
        let mut game = Game::build(mode, board, turn, players, Player::Two, ai);
        game.evaluate_game_over();
        game
    }

    fn build(
        mode: GameMode,
        board: Board,
        turn: Player,
        players: [PlayerState; 2],
        ai_side: Player,
        ai: Option<AiPlayer>,
    ) -> Game {
        Game {
            board,
            mode,
            turn,
            players,
            mill_at: None,
            last_mill_formed: false,
            selected: None,
            winner: None,
            ai_side,
            ai,
            observers: Vec::new(),
        }
    }

    // ========== Queries ==========

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// The player to act.
    #[inline]
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Counters for a player.
    #[inline]
    pub fn player(&self, player: Player) -> &PlayerState {
        &self.players[player.index()]
    }

    /// Derived phase of a player.
    #[inline]
    pub fn phase(&self, player: Player) -> Phase {
        self.player(player).phase()
    }

    /// Derived phase of the player to act.
    #[inline]
    pub fn current_phase(&self) -> Phase {
        self.phase(self.turn)
    }

    /// Whether the player to act must capture before anything else.
    #[inline]
    pub fn must_remove(&self) -> bool {
        self.mill_at.is_some()
    }

    /// Where the pending mill was formed.
    #[inline]
    pub fn mill_at(&self) -> Option<Pos> {
        self.mill_at
    }

    #[inline]
    pub fn last_mill_formed(&self) -> bool {
        self.last_mill_formed
    }

    #[inline]
    pub fn selected(&self) -> Option<Pos> {
        self.selected
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// The side the computer plays in `VsAi` mode.
    #[inline]
    pub fn ai_side(&self) -> Player {
        self.ai_side
    }

    /// Standing mills of a player.
    pub fn standing_mills(&self, player: Player) -> Vec<MillLine> {
        self.board.all_mills(player)
    }

    /// Capture a full picture of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            turn: self.turn,
            phases: [self.phase(Player::One), self.phase(Player::Two)],
            players: self.players,
            must_remove: self.must_remove(),
            mill_at: self.mill_at,
            last_mill_formed: self.last_mill_formed,
            selected: self.selected,
            game_over: self.is_game_over(),
            winner: self.winner,
            nodes: self.board.nodes().to_vec(),
            mills: [
                self.board.all_mills(Player::One),
                self.board.all_mills(Player::Two),
            ],
        }
    }

    /// Register an observer called once after every applied command.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&StateChange) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    // ========== Commands ==========

    /// Put a piece of the player to act on an empty position.
    #[instrument(skip(self), fields(player = ?self.turn))]
    pub fn place(&mut self, id: u8) -> MillResult<Outcome> {
        let pos = self.check_command(id)?;
        let action = Action::Place(pos);
        let player = self.turn;

        if self.must_remove() {
            return Ok(ignore(action, "capture pending"));
        }
        if self.phase(player) != Phase::Placement {
            return Ok(ignore(action, "not in placement phase"));
        }
        if !self.board.is_empty(pos) {
            return Ok(ignore(action, "position occupied"));
        }

        self.board.set_occupant(pos, Some(player));
        self.players[player.index()].placed += 1;
        self.resolve_mill(pos);
        self.evaluate_game_over();
        Ok(self.commit(action))
    }

    /// Select a piece to move, or deselect the current selection.
    ///
    /// A piece with no destinations cannot be selected.
    #[instrument(skip(self), fields(player = ?self.turn))]
    pub fn select(&mut self, id: u8) -> MillResult<Outcome> {
        let pos = self.check_command(id)?;
        let action = Action::Select(pos);
        let player = self.turn;
        let phase = self.phase(player);

        if self.must_remove() {
            return Ok(ignore(action, "capture pending"));
        }
        if phase == Phase::Placement {
            return Ok(ignore(action, "still in placement phase"));
        }
        if self.board.occupant(pos) != Some(player) {
            return Ok(ignore(action, "not an own piece"));
        }

        if self.selected == Some(pos) {
            self.selected = None;
            self.board.clear_highlights();
            return Ok(self.commit(action));
        }

        let destinations = self.destinations(pos, phase);
        if destinations.is_empty() {
            return Ok(ignore(action, "piece has no destinations"));
        }

        self.board.clear_highlights();
        for to in destinations {
            self.board.set_highlight(to, true);
        }
        self.selected = Some(pos);
        Ok(self.commit(action))
    }

    /// Move a piece. Adjacency is required only in the movement phase.
    #[instrument(skip(self), fields(player = ?self.turn))]
    pub fn move_piece(&mut self, from: u8, to: u8) -> MillResult<Outcome> {
        let from = self.check_command(from)?;
        let to = self.check_command(to)?;
        let action = Action::Move { from, to };
        let player = self.turn;
        let phase = self.phase(player);

        if self.must_remove() {
            return Ok(ignore(action, "capture pending"));
        }
        if phase == Phase::Placement {
            return Ok(ignore(action, "still in placement phase"));
        }
        if self.board.occupant(from) != Some(player) {
            return Ok(ignore(action, "source is not an own piece"));
        }
        if !self.board.is_empty(to) {
            return Ok(ignore(action, "destination occupied"));
        }
        if phase == Phase::Movement && !self.board.can_move(from, to) {
            return Ok(ignore(action, "destination not adjacent"));
        }

        self.board.set_occupant(from, None);
        self.board.set_occupant(to, Some(player));
        self.board.clear_highlights();
        self.selected = None;
        self.resolve_mill(to);
        self.evaluate_game_over();
        Ok(self.commit(action))
    }

    /// Capture an opponent piece after forming a mill.
    ///
    /// Pieces in a standing mill are protected while the opponent has any
    /// piece outside a mill.
    #[instrument(skip(self), fields(player = ?self.turn))]
    pub fn remove_piece(&mut self, id: u8) -> MillResult<Outcome> {
        let pos = self.check_command(id)?;
        let action = Action::Remove(pos);
        let opponent = self.turn.opponent();

        if !self.must_remove() {
            return Ok(ignore(action, "no capture pending"));
        }
        if self.board.occupant(pos) != Some(opponent) {
            return Ok(ignore(action, "not an opponent piece"));
        }
        if self.board.is_in_mill(pos, opponent) && !self.all_in_mills(opponent) {
            return Ok(ignore(action, "piece protected by mill"));
        }

        self.board.set_occupant(pos, None);
        self.mill_at = None;
        self.last_mill_formed = false;
        let state = &mut self.players[opponent.index()];
        state.remaining = state.remaining.saturating_sub(1);
        debug!(?opponent, remaining = state.remaining, "piece captured");

        self.switch_turn();
        self.evaluate_game_over();
        Ok(self.commit(action))
    }

    /// Route a single board tap to the command the current state expects.
    pub fn tap(&mut self, id: u8) -> MillResult<Outcome> {
        let pos = self.check_command(id)?;

        if self.must_remove() {
            return self.remove_piece(id);
        }
        if self.current_phase() == Phase::Placement {
            return self.place(id);
        }
        let selected = self.selected;
        match selected {
            Some(from) if self.board.occupant(pos) != Some(self.turn) => {
                self.move_piece(from.0, id)
            }
            _ => self.select(id),
        }
    }

    /// Apply an [`Action`] through the matching command.
    pub fn apply(&mut self, action: Action) -> MillResult<Outcome> {
        match action {
            Action::Place(pos) => self.place(pos.0),
            Action::Select(pos) => self.select(pos.0),
            Action::Move { from, to } => self.move_piece(from.0, to.0),
            Action::Remove(pos) => self.remove_piece(pos.0),
            Action::Reset => {
                self.reset();
                Ok(Outcome::Applied)
            }
        }
    }

    /// Let the computer act if it is its turn in a `VsAi` game.
    ///
    /// Returns the applied action, or None when the computer has nothing to
    /// do (other mode, not its turn, game over, no legal action).
    pub fn request_ai_move(&mut self) -> MillResult<Option<Action>> {
        if self.mode != GameMode::VsAi || self.turn != self.ai_side || self.is_game_over() {
            return Ok(None);
        }
        let Some(mut ai) = self.ai.take() else {
            return Ok(None);
        };
        let choice = ai.choose_action(self);
        self.ai = Some(ai);

        let Some(action) = choice else {
            return Ok(None);
        };
        match self.apply(action)? {
            Outcome::Applied => Ok(Some(action)),
            Outcome::Ignored => {
                warn!(?action, "engine rejected AI action");
                Ok(None)
            }
        }
    }

    /// Start over with an empty board. Allowed after game over.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.turn = Player::One;
        self.players = [PlayerState::new(); 2];
        self.mill_at = None;
        self.last_mill_formed = false;
        self.selected = None;
        self.winner = None;
        info!(mode = ?self.mode, "game reset");
        self.commit(Action::Reset);
    }

    /// Check both loss conditions and record a winner if one applies.
    ///
    /// Fewer than three remaining pieces loses immediately. Otherwise the
    /// player to act loses when it cannot move (checked outside placement,
    /// and not while a capture is pending). Returns whether the game is over.
    pub fn evaluate_game_over(&mut self) -> bool {
        if self.is_game_over() {
            return true;
        }

        for player in [Player::One, Player::Two] {
            if self.player(player).remaining < LOSING_THRESHOLD {
                self.declare_winner(player.opponent(), "too few pieces");
                return true;
            }
        }

        if self.must_remove() {
            return false;
        }

        let player = self.turn;
        let can_move = match self.phase(player) {
            Phase::Placement => true,
            Phase::Flying => !self.board.empty_positions().is_empty(),
            Phase::Movement => self
                .board
                .pieces(player)
                .any(|from| !self.board.legal_destinations(from).is_empty()),
        };
        if !can_move {
            self.declare_winner(player.opponent(), "no legal moves");
        }
        !can_move
    }

    // ========== Internals ==========

    /// Validate an id and reject commands on a finished game.
    fn check_command(&self, id: u8) -> MillResult<Pos> {
        let pos = Pos::new(id)?;
        if self.is_game_over() {
            return Err(MillError::GameOver {
                winner: self.winner,
            });
        }
        Ok(pos)
    }

    fn destinations(&self, from: Pos, phase: Phase) -> Vec<Pos> {
        match phase {
            Phase::Flying => self.board.empty_positions(),
            _ => self.board.legal_destinations(from),
        }
    }

    fn all_in_mills(&self, player: Player) -> bool {
        self.board
            .pieces(player)
            .all(|pos| self.board.is_in_mill(pos, player))
    }

    /// After a piece lands on `pos`: open a capture or pass the turn.
    /// A mill with nothing to capture still counts but passes the turn.
    fn resolve_mill(&mut self, pos: Pos) {
        let player = self.turn;
        self.last_mill_formed = self.board.is_mill(pos, player);
        if self.last_mill_formed {
            self.players[player.index()].mills_formed += 1;
            debug!(?player, %pos, "mill formed");
        }
        if self.last_mill_formed && self.board.count(player.opponent()) > 0 {
            self.mill_at = Some(pos);
        } else {
            self.switch_turn();
        }
    }

    fn switch_turn(&mut self) {
        self.turn = self.turn.opponent();
        self.selected = None;
        self.board.clear_highlights();
    }

    fn declare_winner(&mut self, winner: Player, reason: &str) {
        self.winner = Some(winner);
        self.selected = None;
        self.board.clear_highlights();
        info!(?winner, reason, "game over");
    }

    fn commit(&mut self, cause: Action) -> Outcome {
        if !self.observers.is_empty() {
            let change = StateChange {
                cause,
                snapshot: self.snapshot(),
            };
            for observer in &mut self.observers {
                observer(&change);
            }
        }
        Outcome::Applied
    }
}

fn ignore(action: Action, reason: &str) -> Outcome {
    debug!(?action, reason, "command ignored");
    Outcome::Ignored
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("mode", &self.mode)
            .field("turn", &self.turn)
            .field("players", &self.players)
            .field("mill_at", &self.mill_at)
            .field("selected", &self.selected)
            .field("winner", &self.winner)
            .field("ai_side", &self.ai_side)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
