//! Data-driven game balance
//!
//! Every number the simulation uses lives in [`SimConfig`]. The defaults
//! reproduce the shipped game; a JSON document can override any subset of
//! them. Validation happens once, at load time, so the hot paths never
//! have to second-guess the tables they draw from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::state::EntityKind;

/// Tolerance when checking that spawn weights sum to 1
const WEIGHT_EPSILON: f32 = 1e-4;

/// Errors raised when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("kind table must contain at least one kind")]
    EmptyKindTable,
    #[error("kind {kind:?} has invalid spawn weight {weight}")]
    InvalidWeight { kind: EntityKind, weight: f32 },
    #[error("spawn weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f32 },
    #[error("kind {kind:?} appears more than once in the kind table")]
    DuplicateKind { kind: EntityKind },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} range is inverted ({min} > {max})")]
    InvertedRange { field: &'static str, min: f64, max: f64 },
    #[error("trim_threshold {threshold} is below max_entities {max_entities}")]
    TrimBelowCap { threshold: usize, max_entities: usize },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-kind payload: how often it spawns, what it is worth, how big it is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindSpec {
    pub kind: EntityKind,
    /// Spawn probability weight (the table's weights sum to 1)
    pub weight: f32,
    /// Score awarded when slashed
    pub points: i32,
    /// Visual and collision radius (pixels)
    pub radius: f32,
    /// Base colour (0xRRGGBB)
    pub color: u32,
}

impl KindSpec {
    pub const TOKEN: KindSpec = KindSpec {
        kind: EntityKind::Token,
        weight: 0.9,
        points: 10,
        radius: 30.0,
        color: 0xffd700,
    };

    pub const BOMB: KindSpec = KindSpec {
        kind: EntityKind::Bomb,
        weight: 0.1,
        points: 0,
        radius: 25.0,
        color: 0xff4444,
    };
}

/// Ordered weighted table of spawnable kinds.
///
/// Invariant: non-empty, no duplicate kinds, every weight finite and
/// non-negative, weights sum to 1. Enforced by [`KindTable::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<KindSpec>", into = "Vec<KindSpec>")]
pub struct KindTable {
    entries: Vec<KindSpec>,
}

impl KindTable {
    pub fn new(entries: Vec<KindSpec>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyKindTable);
        }
        for (i, spec) in entries.iter().enumerate() {
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    kind: spec.kind,
                    weight: spec.weight,
                });
            }
            if entries[..i].iter().any(|other| other.kind == spec.kind) {
                return Err(ConfigError::DuplicateKind { kind: spec.kind });
            }
        }
        let sum: f32 = entries.iter().map(|s| s.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(Self { entries })
    }

    /// Pick a kind for a uniform roll in [0, 1).
    ///
    /// Kinds are tried in table order against the cumulative weight; a roll
    /// that slips past the last boundary through rounding gets the first kind.
    pub fn pick(&self, roll: f32) -> &KindSpec {
        let mut cumulative = 0.0;
        for spec in &self.entries {
            cumulative += spec.weight;
            if roll <= cumulative {
                return spec;
            }
        }
        &self.entries[0]
    }

    /// Look up the spec for a kind
    pub fn get(&self, kind: EntityKind) -> Option<&KindSpec> {
        self.entries.iter().find(|s| s.kind == kind)
    }

    pub fn entries(&self) -> &[KindSpec] {
        &self.entries
    }
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            entries: vec![KindSpec::TOKEN, KindSpec::BOMB],
        }
    }
}

impl TryFrom<Vec<KindSpec>> for KindTable {
    type Error = ConfigError;

    fn try_from(entries: Vec<KindSpec>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<KindTable> for Vec<KindSpec> {
    fn from(table: KindTable) -> Self {
        table.entries
    }
}

/// Complete simulation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Scheduling ===
    pub tick_period_ms: f64,
    pub spawn_period_ms: f64,
    pub max_entities: usize,
    pub trim_threshold: usize,

    // === Spawning ===
    pub kinds: KindTable,
    /// Difficulty level (1 = base speed)
    pub level: u32,
    /// Horizontal keep-out at each playfield edge
    pub spawn_margin: f32,
    /// Spawn height (negative = above the top edge)
    pub spawn_y: f32,
    /// Horizontal speed is uniform in ±this (before difficulty scaling)
    pub spawn_vx_half_range: f32,
    pub spawn_vy_min: f32,
    pub spawn_vy_max: f32,
    /// Rotation speed is uniform in ±this (before difficulty scaling)
    pub spawn_spin_half_range: f32,

    // === Playfield bounds ===
    /// Unslashed tokens this far below the bottom edge count as missed
    pub miss_margin: f32,
    /// Entities this far outside the playfield are removed
    pub removal_margin: f32,

    // === Trails ===
    pub trail_length: usize,
    pub trail_lifetime_ms: f64,
    pub blade_trail_length: usize,
    pub blade_trail_lifetime_ms: f64,

    // === Slashing ===
    pub slash_slop: f32,
    pub min_slash_speed: f32,
    pub stroke_clear_delay_ms: f64,

    // === Particles ===
    pub particle_gravity: f32,
    pub particle_drag: f32,
    pub particle_speed_min: f32,
    pub particle_speed_max: f32,
    pub particle_decay_min: f32,
    pub particle_decay_max: f32,
    pub particle_size_min: f32,
    pub particle_size_max: f32,
    pub max_particles: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: TICK_PERIOD_MS,
            spawn_period_ms: SPAWN_PERIOD_MS,
            max_entities: MAX_ENTITIES,
            trim_threshold: TRIM_THRESHOLD,

            kinds: KindTable::default(),
            level: 1,
            spawn_margin: 40.0,
            spawn_y: -40.0,
            spawn_vx_half_range: 1.5,
            spawn_vy_min: 2.0,
            spawn_vy_max: 4.0,
            spawn_spin_half_range: 0.075,

            miss_margin: 50.0,
            removal_margin: 100.0,

            trail_length: ENTITY_TRAIL_LENGTH,
            trail_lifetime_ms: ENTITY_TRAIL_LIFETIME_MS,
            blade_trail_length: 20,
            blade_trail_lifetime_ms: 200.0,

            slash_slop: SLASH_SLOP,
            min_slash_speed: MIN_SLASH_SPEED,
            stroke_clear_delay_ms: STROKE_CLEAR_DELAY_MS,

            particle_gravity: 0.15,
            particle_drag: 0.98,
            particle_speed_min: 3.0,
            particle_speed_max: 7.0,
            particle_decay_min: 0.015,
            particle_decay_max: 0.025,
            particle_size_min: 2.0,
            particle_size_max: 5.0,
            max_particles: 512,
        }
    }
}

impl SimConfig {
    /// Parse a JSON document (missing fields keep their defaults) and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded tuning: {} kinds, level {}",
            config.kinds.entries().len(),
            config.level
        );
        Ok(config)
    }

    /// Check the values the kind table cannot check for itself
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tick_period_ms", self.tick_period_ms),
            ("spawn_period_ms", self.spawn_period_ms),
            ("max_entities", self.max_entities as f64),
            ("trim_threshold", self.trim_threshold as f64),
            ("trail_length", self.trail_length as f64),
            ("trail_lifetime_ms", self.trail_lifetime_ms),
            ("blade_trail_length", self.blade_trail_length as f64),
            ("blade_trail_lifetime_ms", self.blade_trail_lifetime_ms),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("particle_speed_min", self.particle_speed_min),
            ("particle_decay_min", self.particle_decay_min),
            ("particle_size_min", self.particle_size_min),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative {
                    field,
                    value: f64::from(value),
                });
            }
        }

        let ranges = [
            ("spawn_vy", self.spawn_vy_min, self.spawn_vy_max),
            ("particle_speed", self.particle_speed_min, self.particle_speed_max),
            ("particle_decay", self.particle_decay_min, self.particle_decay_max),
            ("particle_size", self.particle_size_min, self.particle_size_max),
        ];
        for (field, min, max) in ranges {
            if min > max {
                return Err(ConfigError::InvertedRange {
                    field,
                    min: f64::from(min),
                    max: f64::from(max),
                });
            }
        }

        if self.trim_threshold < self.max_entities {
            return Err(ConfigError::TrimBelowCap {
                threshold: self.trim_threshold,
                max_entities: self.max_entities,
            });
        }
        Ok(())
    }

    /// Look up a kind's payload. `None` if the table does not carry it.
    pub fn kind_spec(&self, kind: EntityKind) -> Option<&KindSpec> {
        self.kinds.get(kind)
    }
}
