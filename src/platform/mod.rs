//! Platform layer
//!
//! Browser-facing glue that is not part of the simulation:
//! - Pointer/keyboard mapping into session operations
//! - Transient DOM effects (slice halves, explosion, flash, popups)

pub mod effects;
pub mod input;

pub use effects::{EffectQueue, HalfMotion, slice_halves};
pub use input::{ClientRect, KeyAction, PointerEvent, client_to_canvas, dispatch_pointer};
