//! Events emitted by the simulation for scoring and presentation.
//!
//! The core never keeps score or touches the DOM. It reports what happened
//! through an [`EventSink`] and lets the surrounding game decide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, EntityKind};

/// Why a life was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeLossCause {
    BombHit,
    TokenMissed,
}

/// Something the rest of the game should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// A token was slashed.
    ScoreDelta { points: i32 },
    /// A bomb was slashed or a token fell past the miss line.
    LifeLost { cause: LifeLossCause },
    /// Floating value label at a playfield position.
    Popup { pos: Vec2, value: i32, kind: EntityKind },
    /// Token cut in two along the slash direction.
    SliceEffect {
        entity: EntityId,
        pos: Vec2,
        color: u32,
        angle: f32,
    },
    /// Bomb blew up.
    Explosion { entity: EntityId, pos: Vec2 },
    /// Full-screen flash after a bomb hit.
    ScreenFlash,
}

/// Receiver for simulation events
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);
}

impl EventSink for Vec<SimEvent> {
    fn emit(&mut self, event: SimEvent) {
        self.push(event);
    }
}

/// Discards everything (headless runs that only care about state)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: SimEvent) {}
}
