//! Per-tick physics integration
//!
//! Euler step, no substeps: position += velocity, rotation += spin. Trails
//! record the pre-step position. Removal is two-staged: an unslashed token
//! past the miss line is reported once, but only leaves the list when it
//! is past the wider removal bounds, so it stays drawable for a few frames.

use super::events::{EventSink, LifeLossCause, SimEvent};
use super::state::{Entity, EntityKind, Playfield};
use crate::tuning::SimConfig;

/// Input for a single integration pass
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Tick timestamp (ms), used to age trail points
    pub now_ms: f64,
    /// Current drawing surface size
    pub field: Playfield,
    /// Record trails this tick (tab visible and trails enabled)
    pub record_trails: bool,
}

/// What happened during one integration pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tokens newly reported as missed
    pub missed: u32,
    /// Entities dropped from the list (off-screen or consumed)
    pub removed: u32,
}

/// Advance every entity one tick, then filter out the ones that are gone
pub fn integrate(
    entities: &mut Vec<Entity>,
    input: &TickInput,
    config: &SimConfig,
    sink: &mut dyn EventSink,
) -> TickReport {
    for entity in entities.iter_mut() {
        let prev = entity.pos;
        entity.pos += entity.vel;
        entity.rotation += entity.rotation_speed;

        if input.record_trails {
            entity.record_trail(prev, input.now_ms, config.trail_lifetime_ms, config.trail_length);
        }
    }

    let mut report = TickReport::default();
    let before = entities.len();
    let miss_line = input.field.height + config.miss_margin;

    entities.retain_mut(|entity| {
        // Slashed entities are consumed
        if entity.slashed {
            return false;
        }
        if entity.kind == EntityKind::Token && !entity.missed && entity.pos.y > miss_line {
            entity.missed = true;
            report.missed += 1;
            log::debug!("Token {:?} missed at y={:.0}", entity.id, entity.pos.y);
            sink.emit(SimEvent::LifeLost {
                cause: LifeLossCause::TokenMissed,
            });
        }
        input.field.contains_with_margin(entity.pos, config.removal_margin)
    });

    report.removed = (before - entities.len()) as u32;
    report
}
