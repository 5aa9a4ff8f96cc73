//! Simulation entity types
//!
//! Everything here belongs to one session and is dropped when the next
//! session starts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::KindSpec;

/// Scheduler state for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    /// No session running
    #[default]
    Idle,
    /// Timers armed, simulation advancing
    Running,
    /// Paused by the player
    Paused,
    /// Paused automatically because the tab was hidden
    Suspended,
}

/// Drawing surface dimensions the simulation plays inside (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when `pos` is within `margin` of the playfield (the top is open)
    pub fn contains_with_margin(&self, pos: Vec2, margin: f32) -> bool {
        pos.y <= self.height + margin && pos.x >= -margin && pos.x <= self.width + margin
    }
}

/// Falling object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Slice it for points
    Token,
    /// Slicing it costs a life
    Bomb,
}

/// Opaque entity identifier, stable for the entity's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// A recently visited position, faded by age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    /// When the point was recorded (ms)
    pub timestamp: f64,
    /// 1.0 when fresh, 0.0 when expired
    pub opacity: f32,
}

/// A falling token or bomb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Score awarded when slashed (copied from the kind table)
    pub points: i32,
    pub radius: f32,
    /// 0xRRGGBB, used for the trail and slice effect
    pub color: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// Recent positions, oldest first
    #[serde(skip)]
    pub trail: Vec<TrailPoint>,
    /// Set once on a successful hit, never cleared
    pub slashed: bool,
    /// Set once when an unslashed token falls past the miss line
    pub missed: bool,
}

impl Entity {
    pub fn new(id: EntityId, spec: &KindSpec, pos: Vec2, vel: Vec2, rotation_speed: f32) -> Self {
        Self {
            id,
            kind: spec.kind,
            points: spec.points,
            radius: spec.radius,
            color: spec.color,
            pos,
            vel,
            rotation: 0.0,
            rotation_speed,
            trail: Vec::new(),
            slashed: false,
            missed: false,
        }
    }

    /// Live entities can still be hit and are drawn
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.slashed
    }

    /// Mark slashed. Returns false if it already was.
    pub fn mark_slashed(&mut self) -> bool {
        if self.slashed {
            return false;
        }
        self.slashed = true;
        true
    }

    /// Record `pos` in the trail, refade every point and drop expired ones
    pub fn record_trail(&mut self, pos: Vec2, now_ms: f64, lifetime_ms: f64, capacity: usize) {
        self.trail.push(TrailPoint {
            pos,
            timestamp: now_ms,
            opacity: 1.0,
        });
        for point in self.trail.iter_mut() {
            let age = now_ms - point.timestamp;
            point.opacity = (1.0 - age / lifetime_ms).max(0.0) as f32;
        }
        self.trail.retain(|p| p.opacity > 0.0);
        if self.trail.len() > capacity {
            let excess = self.trail.len() - capacity;
            self.trail.drain(..excess);
        }
    }

    /// Clear trail (on trim or when the tab is hidden)
    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }
}
