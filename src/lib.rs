//! Token Slash - slice falling tokens, avoid the bombs
//!
//! Core modules:
//! - `sim`: Simulation (spawning, physics, gestures, collisions, particles, scheduling)
//! - `renderer`: 2D canvas rendering of the current frame
//! - `platform`: Browser input mapping and DOM presentation effects
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `scoreboard`: Score and lives bookkeeping for a run

pub mod platform;
pub mod renderer;
pub mod scoreboard;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use scoreboard::Scoreboard;
pub use settings::{QualityPreset, Settings, SettingsChange};
pub use tuning::{ConfigError, SimConfig};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed tick period (~60 Hz)
    pub const TICK_PERIOD_MS: f64 = 16.0;
    /// Spawn timer period
    pub const SPAWN_PERIOD_MS: f64 = 1200.0;
    /// Maximum ticks fired per pump to prevent spiral of death
    pub const MAX_TICKS_PER_PUMP: u32 = 8;
    /// Backlog older than this is dropped rather than replayed
    pub const MAX_CATCH_UP_MS: f64 = 250.0;

    /// Live entity cap checked before each spawn
    pub const MAX_ENTITIES: usize = 12;
    /// Live entity count that triggers a trim
    pub const TRIM_THRESHOLD: usize = 15;

    /// Entity trail capacity (points)
    pub const ENTITY_TRAIL_LENGTH: usize = 8;
    /// Entity trail point lifetime
    pub const ENTITY_TRAIL_LIFETIME_MS: f64 = 1000.0;

    /// Extra reach added to an entity's radius for slash hits
    pub const SLASH_SLOP: f32 = 15.0;
    /// Minimum gesture speed (pixels per sample) for a slash to count
    pub const MIN_SLASH_SPEED: f32 = 3.0;
    /// Delay between stroke end and clearing the blade trail
    pub const STROKE_CLEAR_DELAY_MS: f64 = 100.0;

    /// Token slashes burst this many green particles
    pub const GOOD_BURST: usize = 15;
    /// Bomb hits burst this many red particles
    pub const BAD_BURST: usize = 25;
    pub const GOOD_PARTICLE_COLOR: u32 = 0x00ff88;
    pub const BAD_PARTICLE_COLOR: u32 = 0xff4444;

    /// Lives at the start of a run
    pub const STARTING_LIVES: u8 = 3;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Direction of a slash from its velocity (radians, screen space)
#[inline]
pub fn slash_angle(velocity: Vec2) -> f32 {
    velocity.y.atan2(velocity.x)
}

/// Difficulty multiplier applied to spawn speeds (10% per level above 1)
#[inline]
pub fn difficulty_multiplier(level: u32) -> f32 {
    1.0 + level.saturating_sub(1) as f32 * 0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_multiplier() {
        assert_eq!(difficulty_multiplier(1), 1.0);
        assert!((difficulty_multiplier(3) - 1.2).abs() < 1e-6);
        // Level 0 is treated like level 1
        assert_eq!(difficulty_multiplier(0), 1.0);
    }

    #[test]
    fn test_slash_angle() {
        assert!((slash_angle(Vec2::new(0.0, 10.0)) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(slash_angle(Vec2::new(5.0, 0.0)), 0.0);
    }
}
