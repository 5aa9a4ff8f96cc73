//! Simulation core
//!
//! Everything gameplay related lives here and nothing here touches the DOM:
//! - Integer tick counter, timestamps passed in by the caller
//! - Seeded RNG only
//! - Outcomes leave through an [`EventSink`]
//! - No rendering or platform dependencies

pub mod collision;
pub mod events;
pub mod gesture;
pub mod particles;
pub mod scheduler;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{CollisionDetector, SlashHit, dispatch_hit};
pub use events::{EventSink, LifeLossCause, NullSink, SimEvent};
pub use gesture::{GesturePoint, GestureTracker};
pub use particles::{Particle, ParticleField};
pub use scheduler::{FrameScheduler, PumpReport};
pub use session::SimulationSession;
pub use spawn::roll_entity;
pub use state::{Entity, EntityId, EntityKind, Playfield, RunState, TrailPoint};
pub use tick::{TickInput, TickReport, integrate};
