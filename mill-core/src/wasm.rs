//! WASM bindings for mill-core
//!
//! Provides a JavaScript-friendly API over [`Game`]. Position ids are plain
//! numbers; commands return `true` when applied and throw on invalid ids or
//! commands after game over.

use wasm_bindgen::prelude::*;

use crate::{AiPlayer, Game, GameMode, MillError, Player};

impl From<MillError> for JsValue {
    fn from(err: MillError) -> JsValue {
        JsError::new(&err.to_string()).into()
    }
}

/// WASM-friendly wrapper around Game
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game. Mode: 0 = two player, 1 = vs AI, 2 = tutorial.
    #[wasm_bindgen(constructor)]
    pub fn new(mode: u8) -> WasmGame {
        let mode = match mode {
            1 => GameMode::VsAi,
            2 => GameMode::Tutorial,
            _ => GameMode::TwoPlayer,
        };
        WasmGame { inner: Game::new(mode) }
    }

    /// Create a vs-AI game with a fixed AI seed (for reproducible demos).
    #[wasm_bindgen(js_name = withSeededAi)]
    pub fn with_seeded_ai(ai_side: u8, seed: u64) -> WasmGame {
        let side = Player::from_bits(ai_side).unwrap_or(Player::Two);
        WasmGame {
            inner: Game::with_ai(side, AiPlayer::seeded(seed)),
        }
    }

    pub fn place(&mut self, id: u8) -> Result<bool, JsValue> {
        Ok(self.inner.place(id)?.is_applied())
    }

    pub fn select(&mut self, id: u8) -> Result<bool, JsValue> {
        Ok(self.inner.select(id)?.is_applied())
    }

    #[wasm_bindgen(js_name = movePiece)]
    pub fn move_piece(&mut self, from: u8, to: u8) -> Result<bool, JsValue> {
        Ok(self.inner.move_piece(from, to)?.is_applied())
    }

    #[wasm_bindgen(js_name = removePiece)]
    pub fn remove_piece(&mut self, id: u8) -> Result<bool, JsValue> {
        Ok(self.inner.remove_piece(id)?.is_applied())
    }

    /// Handle a tap on a board node, routed by the current state.
    pub fn tap(&mut self, id: u8) -> Result<bool, JsValue> {
        Ok(self.inner.tap(id)?.is_applied())
    }

    /// Let the AI act if it is its turn. Returns the applied action as a JS
    /// object, or null.
    #[wasm_bindgen(js_name = requestAiMove)]
    pub fn request_ai_move(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.request_ai_move()? {
            Some(action) => Ok(serde_wasm_bindgen::to_value(&action)?),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Current player (1 or 2)
    #[wasm_bindgen(js_name = currentPlayer)]
    pub fn current_player(&self) -> u8 {
        self.inner.turn() as u8
    }

    /// Winner: 0 (none), 1 (P1), or 2 (P2)
    pub fn winner(&self) -> u8 {
        self.inner.winner().map_or(0, |p| p as u8)
    }

    #[wasm_bindgen(js_name = mustRemove)]
    pub fn must_remove(&self) -> bool {
        self.inner.must_remove()
    }

    /// Full state for rendering: nodes with coordinates, occupants and
    /// highlights, per-player counters and phases, standing mills.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.snapshot())?)
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new(0)
    }
}
