//! Whole-game scenarios driven only through the public API.
//!
//! - A scripted opening through the first capture
//! - Seeded random taps checking piece conservation and sub-state invariants
//! - Seeded AI-vs-AI games where every chosen action is accepted
//! - Snapshot and change-event serialization

use std::cell::RefCell;
use std::rc::Rc;

use mill_core::{
    Action, AiPlayer, Game, GameMode, MillError, Outcome, Player, Pos, StateChange,
    PIECES_PER_PLAYER,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Pieces on the board must equal placed pieces minus captured pieces.
fn assert_invariants(game: &Game) {
    for player in [Player::One, Player::Two] {
        let state = game.player(player);
        let captured = PIECES_PER_PLAYER - state.remaining;
        assert!(state.placed <= PIECES_PER_PLAYER, "{player:?} over-placed");
        assert_eq!(
            game.board().count(player),
            usize::from(state.placed - captured),
            "conservation broken for {player:?}: {state:?}"
        );
    }
    assert_eq!(
        game.selected().is_none(),
        game.board().highlighted().is_empty(),
        "highlights out of sync with selection"
    );
    if let Some(at) = game.mill_at() {
        assert!(game.last_mill_formed());
        assert!(game.board().is_mill(at, game.turn()), "pending capture without a mill");
    }
    if game.is_game_over() {
        assert!(game.winner().is_some());
    }
}

#[test]
fn test_opening_through_first_capture() {
    let mut game = Game::new(GameMode::TwoPlayer);
    assert_eq!(game.place(0), Ok(Outcome::Applied));
    assert_eq!(game.place(8), Ok(Outcome::Applied));
    assert_eq!(game.place(1), Ok(Outcome::Applied));
    assert_eq!(game.place(9), Ok(Outcome::Applied));
    assert_eq!(game.place(2), Ok(Outcome::Applied));

    assert!(game.must_remove());
    assert_eq!(game.turn(), Player::One, "turn must not pass before the capture");
    assert_eq!(game.standing_mills(Player::One), vec![[Pos(0), Pos(1), Pos(2)]]);

    assert_eq!(game.remove_piece(8), Ok(Outcome::Applied));
    let two = game.player(Player::Two);
    assert_eq!(two.remaining, 8);
    assert_eq!(two.placed, 2, "capture reduces remaining, not placed");
    assert_eq!(game.turn(), Player::Two);
    assert!(!game.must_remove());
    assert_invariants(&game);
}

#[test]
fn test_ignored_commands_leave_state_identical() {
    let mut game = Game::new(GameMode::TwoPlayer);
    game.place(3).unwrap();
    game.place(4).unwrap();

    let before = game.snapshot();
    for _ in 0..3 {
        assert_eq!(game.place(3), Ok(Outcome::Ignored));
        assert_eq!(game.remove_piece(4), Ok(Outcome::Ignored));
        assert_eq!(game.move_piece(3, 2), Ok(Outcome::Ignored));
        assert_eq!(game.snapshot(), before);
    }
}

#[test]
fn test_random_taps_preserve_invariants() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new(GameMode::TwoPlayer);

        for _ in 0..3000 {
            let id = rng.random_range(0..24u8);
            match game.tap(id) {
                Ok(_) => assert_invariants(&game),
                Err(MillError::GameOver { winner }) => {
                    assert_eq!(winner, game.winner());
                    break;
                }
                Err(err) => panic!("seed {seed}: unexpected error {err}"),
            }
        }
    }
}

#[test]
fn test_ai_self_play_never_stalls() {
    for seed in 0..16u64 {
        let mut ais = [AiPlayer::seeded(seed * 2), AiPlayer::seeded(seed * 2 + 1)];
        let mut game = Game::new(GameMode::TwoPlayer);

        for _ in 0..400 {
            if game.is_game_over() {
                break;
            }
            let ai = match game.turn() {
                Player::One => &mut ais[0],
                Player::Two => &mut ais[1],
            };
            let action = ai
                .choose_action(&game)
                .unwrap_or_else(|| panic!("seed {seed}: no action for {:?}", game.turn()));
            assert_eq!(game.apply(action), Ok(Outcome::Applied), "seed {seed}: {action:?}");
            assert_invariants(&game);
        }
    }
}

#[test]
fn test_vs_ai_game_alternates_with_human() {
    let mut game = Game::with_ai(Player::Two, AiPlayer::seeded(5));
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..2000 {
        if game.is_game_over() {
            break;
        }
        if game.turn() == game.ai_side() {
            let action = game.request_ai_move().unwrap();
            assert!(action.is_some(), "AI passed on its own turn");
        } else {
            game.tap(rng.random_range(0..24u8)).unwrap();
            if game.turn() != game.ai_side() {
                assert_eq!(game.request_ai_move(), Ok(None), "AI moved out of turn");
            }
        }
        assert_invariants(&game);
    }
}

#[test]
fn test_ai_decision_leaves_game_untouched() {
    let mut game = Game::new(GameMode::TwoPlayer);
    let mut ai = AiPlayer::seeded(3);
    for _ in 0..30 {
        if game.is_game_over() {
            break;
        }
        let before = game.snapshot();
        let action = ai.choose_action(&game).unwrap();
        assert_eq!(game.snapshot(), before, "choose_action mutated the game");
        game.apply(action).unwrap();
    }
}

#[test]
fn test_snapshot_serializes() {
    let mut game = Game::new(GameMode::VsAi);
    game.place(0).unwrap();
    let snapshot = game.snapshot();

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["turn"], "Two");
    assert_eq!(json["mode"], "VsAi");
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(24));
    assert_eq!(json["nodes"][0]["occupant"], "One");
    assert_eq!(json["players"][0]["placed"], 1);

    let back: mill_core::Snapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_change_events_in_order() {
    let events: Rc<RefCell<Vec<StateChange>>> = Rc::new(RefCell::new(Vec::new()));
    let mut game = Game::new(GameMode::TwoPlayer);
    let sink = Rc::clone(&events);
    game.subscribe(move |change| sink.borrow_mut().push(change.clone()));

    for id in [0, 8, 1, 9, 2] {
        game.tap(id).unwrap();
    }
    game.tap(2).unwrap(); // own piece during capture: ignored
    game.tap(8).unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 6);
    assert_eq!(events[4].cause, Action::Place(Pos(2)));
    assert!(events[4].snapshot.must_remove);
    assert_eq!(events[5].cause, Action::Remove(Pos(8)));
    assert_eq!(events[5].snapshot.players[1].remaining, 8);

    let json = serde_json::to_string(&events[5]).unwrap();
    assert!(json.contains("\"Remove\""));
}
