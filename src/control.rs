//! Runtime operator toggles
//!
//! Cloned into every loop that needs them; the stdin listener in `main` flips them while
//! the bot keeps running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
pub struct BotControl {
    paused: Arc<AtomicBool>,
    play_next_game: Arc<AtomicBool>,
}

impl Default for BotControl {
    fn default() -> Self {
        Self {
            paused: Arc::new(AtomicBool::new(false)),
            play_next_game: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl BotControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn play_next_game(&self) -> bool {
        self.play_next_game.load(Ordering::SeqCst)
    }

    /// Flip the pause flag, returning the new value
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.paused.fetch_xor(true, Ordering::SeqCst);
        if paused {
            log::info!("⏸️ Bot paused, press the pause key again to resume");
        } else {
            log::info!("▶️ Bot resumed");
        }
        paused
    }

    /// Flip whether a new game is queued after the current one, returning the new value
    pub fn toggle_play_next_game(&self) -> bool {
        let play = !self.play_next_game.fetch_xor(true, Ordering::SeqCst);
        if play {
            log::info!("🔁 The bot will queue another game");
        } else {
            log::info!("🏁 The bot will stop after this game");
        }
        play
    }

    /// Apply a command line typed by the operator. Returns false for unknown input.
    pub fn handle_command(&self, line: &str) -> bool {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" => {
                self.toggle_pause();
                true
            }
            "n" | "next" => {
                self.toggle_play_next_game();
                true
            }
            _ => false,
        }
    }
}
