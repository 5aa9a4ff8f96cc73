//! Slash collision detection and hit dispatch
//!
//! Each pointer sample is tested against every live entity as a point vs.
//! circle proximity check. There is no sweep between consecutive samples,
//! so a very fast stroke can pass between two samples without touching an
//! entity it visually crossed.

use glam::Vec2;
use rand::Rng;

use super::events::{EventSink, LifeLossCause, SimEvent};
use super::gesture::GestureTracker;
use super::particles::ParticleField;
use super::state::{Entity, EntityId, EntityKind};
use crate::consts::{BAD_BURST, BAD_PARTICLE_COLOR, GOOD_BURST, GOOD_PARTICLE_COLOR};
use crate::tuning::SimConfig;
use crate::{distance, slash_angle};

/// An entity registered as hit by one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlashHit {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub points: i32,
    pub color: u32,
}

impl SlashHit {
    fn of(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            pos: entity.pos,
            points: entity.points,
            color: entity.color,
        }
    }
}

/// Point-sampled slash tester
#[derive(Debug, Clone, Copy)]
pub struct CollisionDetector {
    /// Reach added to each entity's radius
    pub slop: f32,
    /// Samples slower than this never hit
    pub min_speed: f32,
}

impl CollisionDetector {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            slop: config.slash_slop,
            min_speed: config.min_slash_speed,
        }
    }

    /// Test one gesture sample against all live entities.
    ///
    /// Every entity within `radius + slop` of `point` that is not slashed and
    /// not yet hit this stroke gets slashed and recorded in the stroke's hit
    /// set. Does nothing unless a stroke is active and the sample is fast
    /// enough.
    pub fn check(
        &self,
        stroke: &mut GestureTracker,
        point: Vec2,
        velocity: Vec2,
        entities: &mut [Entity],
    ) -> Vec<SlashHit> {
        if !stroke.is_active() || velocity.length() < self.min_speed {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for entity in entities.iter_mut() {
            if !entity.is_live() || stroke.already_hit(entity.id) {
                continue;
            }
            if distance(point, entity.pos) < entity.radius + self.slop && entity.mark_slashed() {
                stroke.record_hit(entity.id);
                hits.push(SlashHit::of(entity));
            }
        }
        hits
    }
}

/// Report the outcome of a hit: score or life, particles, presentation effects
pub fn dispatch_hit<R: Rng>(
    hit: &SlashHit,
    velocity: Vec2,
    particles: &mut ParticleField,
    rng: &mut R,
    sink: &mut dyn EventSink,
) {
    match hit.kind {
        EntityKind::Token => {
            sink.emit(SimEvent::ScoreDelta { points: hit.points });
            particles.spawn_burst(rng, hit.pos, GOOD_PARTICLE_COLOR, GOOD_BURST);
            sink.emit(SimEvent::Popup {
                pos: hit.pos,
                value: hit.points,
                kind: hit.kind,
            });
            sink.emit(SimEvent::SliceEffect {
                entity: hit.id,
                pos: hit.pos,
                color: hit.color,
                angle: slash_angle(velocity),
            });
        }
        EntityKind::Bomb => {
            sink.emit(SimEvent::LifeLost {
                cause: LifeLossCause::BombHit,
            });
            particles.spawn_burst(rng, hit.pos, BAD_PARTICLE_COLOR, BAD_BURST);
            sink.emit(SimEvent::ScreenFlash);
            sink.emit(SimEvent::Popup {
                pos: hit.pos,
                value: 1,
                kind: hit.kind,
            });
            sink.emit(SimEvent::Explosion {
                entity: hit.id,
                pos: hit.pos,
            });
        }
    }
}
