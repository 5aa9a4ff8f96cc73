//! Pointer/touch stroke tracking
//!
//! A stroke runs from pointer-down to pointer-up. While it is active every
//! sample produces an instantaneous velocity (delta from the previous
//! sample) and extends the blade trail. The per-stroke hit set lives here so
//! the collision detector can register each entity at most once per stroke.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::EntityId;
use crate::tuning::SimConfig;

/// Timestamped pointer sample, also used as a blade trail point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GesturePoint {
    pub pos: Vec2,
    pub timestamp: f64,
}

#[derive(Debug, Clone)]
pub struct GestureTracker {
    active: bool,
    last: Option<Vec2>,
    velocity: Vec2,
    hit_set: HashSet<EntityId>,
    trail: Vec<GesturePoint>,
    /// Deferred clear of trail and hit set after the stroke ended
    pending_clear_at: Option<f64>,
    trail_capacity: usize,
    trail_lifetime_ms: f64,
    clear_delay_ms: f64,
}

impl GestureTracker {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            active: false,
            last: None,
            velocity: Vec2::ZERO,
            hit_set: HashSet::new(),
            trail: Vec::with_capacity(config.blade_trail_length),
            pending_clear_at: None,
            trail_capacity: config.blade_trail_length,
            trail_lifetime_ms: config.blade_trail_lifetime_ms,
            clear_delay_ms: config.stroke_clear_delay_ms,
        }
    }

    /// Begin a stroke at `pos`
    pub fn start(&mut self, pos: Vec2, now_ms: f64) {
        self.active = true;
        self.last = Some(pos);
        self.velocity = Vec2::ZERO;
        self.hit_set.clear();
        self.pending_clear_at = None;
        self.trail.clear();
        self.push_trail(pos, now_ms);
    }

    /// Add a sample. Returns the velocity since the previous sample, or
    /// `None` when no stroke is active.
    pub fn add(&mut self, pos: Vec2, now_ms: f64) -> Option<Vec2> {
        if !self.active {
            return None;
        }
        let last = self.last.unwrap_or(pos);
        self.velocity = pos - last;
        self.last = Some(pos);
        self.push_trail(pos, now_ms);
        Some(self.velocity)
    }

    /// End the stroke. The trail and hit set are cleared once the delay passes.
    pub fn end(&mut self, now_ms: f64) {
        if !self.active {
            return;
        }
        self.active = false;
        self.pending_clear_at = Some(now_ms + self.clear_delay_ms);
    }

    /// Fade the blade trail and run any due deferred clear
    pub fn update(&mut self, now_ms: f64) {
        if let Some(deadline) = self.pending_clear_at {
            if now_ms >= deadline {
                self.trail.clear();
                self.hit_set.clear();
                self.pending_clear_at = None;
            }
        }
        let lifetime = self.trail_lifetime_ms;
        self.trail.retain(|p| now_ms - p.timestamp < lifetime);
    }

    /// Record a hit. Returns false if the entity was already hit this stroke.
    pub fn record_hit(&mut self, id: EntityId) -> bool {
        self.hit_set.insert(id)
    }

    pub fn already_hit(&self, id: EntityId) -> bool {
        self.hit_set.contains(&id)
    }

    /// Drop all stroke state immediately (session start/end)
    pub fn reset(&mut self) {
        self.active = false;
        self.last = None;
        self.velocity = Vec2::ZERO;
        self.hit_set.clear();
        self.trail.clear();
        self.pending_clear_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Blade trail, oldest first
    pub fn trail(&self) -> &[GesturePoint] {
        &self.trail
    }

    pub fn hit_count(&self) -> usize {
        self.hit_set.len()
    }

    fn push_trail(&mut self, pos: Vec2, now_ms: f64) {
        self.trail.push(GesturePoint {
            pos,
            timestamp: now_ms,
        });
        if self.trail.len() > self.trail_capacity {
            self.trail.remove(0);
        }
    }
}
