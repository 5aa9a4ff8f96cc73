//! Score and lives for a run
//!
//! Fed by simulation events. The best score survives across runs and is
//! persisted to LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts::STARTING_LIVES;
use crate::sim::events::{EventSink, LifeLossCause, SimEvent};

/// Persisted part of the scoreboard
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct BestRecord {
    best_score: i64,
}

/// Running totals for one run plus the all-time best
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: i64,
    pub lives: u8,
    pub best_score: i64,
    pub tokens_slashed: u32,
    pub bombs_hit: u32,
    pub tokens_missed: u32,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self {
            score: 0,
            lives: STARTING_LIVES,
            best_score: 0,
            tokens_slashed: 0,
            bombs_hit: 0,
            tokens_missed: 0,
        }
    }
}

impl Scoreboard {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "token_slash_best";

    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, keeping the best score
    pub fn reset(&mut self) {
        *self = Self {
            best_score: self.best_score,
            ..Self::default()
        };
    }

    /// Every successful slash, good or bad
    pub fn total_slashes(&self) -> u32 {
        self.tokens_slashed + self.bombs_hit
    }

    pub fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    /// Fold one event into the totals. Returns true if the best score moved.
    pub fn apply(&mut self, event: &SimEvent) -> bool {
        match event {
            SimEvent::ScoreDelta { points } => {
                self.score += i64::from(*points);
                self.tokens_slashed += 1;
                if self.score > self.best_score {
                    self.best_score = self.score;
                    return true;
                }
            }
            SimEvent::LifeLost { cause } => {
                match cause {
                    LifeLossCause::BombHit => self.bombs_hit += 1,
                    LifeLossCause::TokenMissed => self.tokens_missed += 1,
                }
                self.lives = self.lives.saturating_sub(1);
                if self.is_game_over() {
                    log::info!("Game over: score {}, best {}", self.score, self.best_score);
                }
            }
            _ => {}
        }
        false
    }

    /// Load the best score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(record) = serde_json::from_str::<BestRecord>(&json) {
                    log::info!("Loaded best score {}", record.best_score);
                    return Self {
                        best_score: record.best_score,
                        ..Self::default()
                    };
                }
            }
        }

        log::info!("No best score found, starting fresh");
        Self::new()
    }

    /// Save the best score to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        let record = BestRecord {
            best_score: self.best_score,
        };
        if let (Some(storage), Ok(json)) = (storage, serde_json::to_string(&record)) {
            if storage.set_item(Self::STORAGE_KEY, &json).is_ok() {
                log::info!("Best score saved ({})", record.best_score);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

impl EventSink for Scoreboard {
    fn emit(&mut self, event: SimEvent) {
        self.apply(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EntityId;
    use glam::Vec2;

    fn life(cause: LifeLossCause) -> SimEvent {
        SimEvent::LifeLost { cause }
    }

    #[test]
    fn test_starts_with_three_lives() {
        let board = Scoreboard::new();
        assert_eq!(board.lives, 3);
        assert_eq!(board.score, 0);
        assert!(!board.is_game_over());
    }

    #[test]
    fn test_score_and_best() {
        let mut board = Scoreboard::new();
        assert!(board.apply(&SimEvent::ScoreDelta { points: 10 }));
        assert!(board.apply(&SimEvent::ScoreDelta { points: 10 }));
        assert_eq!(board.score, 20);
        assert_eq!(board.best_score, 20);
        assert_eq!(board.tokens_slashed, 2);

        board.reset();
        assert_eq!(board.score, 0);
        assert_eq!(board.best_score, 20);
        assert!(!board.apply(&SimEvent::ScoreDelta { points: 10 }));
    }

    #[test]
    fn test_lives_never_below_zero() {
        let mut board = Scoreboard::new();
        board.apply(&life(LifeLossCause::BombHit));
        board.apply(&life(LifeLossCause::TokenMissed));
        board.apply(&life(LifeLossCause::BombHit));
        assert!(board.is_game_over());
        board.apply(&life(LifeLossCause::BombHit));
        assert_eq!(board.lives, 0);
        assert_eq!(board.bombs_hit, 3);
        assert_eq!(board.tokens_missed, 1);
        assert_eq!(board.total_slashes(), 3);
    }

    #[test]
    fn test_presentation_events_ignored() {
        let mut board = Scoreboard::new();
        board.emit(SimEvent::ScreenFlash);
        board.emit(SimEvent::Explosion {
            entity: EntityId(1),
            pos: Vec2::ZERO,
        });
        assert_eq!(board.score, 0);
        assert_eq!(board.lives, 3);
    }
}
