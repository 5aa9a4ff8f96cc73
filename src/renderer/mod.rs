//! 2D rendering module
//!
//! Reads the current frame's data only and never mutates the simulation.
//! Commands are built by [`shapes`] and replayed onto a [`Surface`].

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod shapes;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
pub use shapes::{DrawCmd, Rgba};

use crate::sim::gesture::GesturePoint;
use crate::sim::particles::Particle;
use crate::sim::session::SimulationSession;
use crate::sim::state::Entity;

/// Anything that can replay draw commands
pub trait Surface {
    /// Current drawing size in pixels, `None` while detached
    fn size(&self) -> Option<(f32, f32)>;
    fn draw(&mut self, cmd: &DrawCmd);
}

/// Paint one frame. A detached or zero-sized surface is a no-op frame.
/// Returns the number of commands drawn.
pub fn render(
    surface: &mut dyn Surface,
    entities: &[Entity],
    gesture_trail: &[GesturePoint],
    particles: &[Particle],
) -> usize {
    let Some((width, height)) = surface.size() else {
        return 0;
    };
    if width <= 0.0 || height <= 0.0 {
        return 0;
    }

    let cmds = shapes::frame(width, height, entities, gesture_trail, particles);
    for cmd in &cmds {
        surface.draw(cmd);
    }
    cmds.len()
}

/// Paint the session's current frame
pub fn render_session(surface: &mut dyn Surface, session: &SimulationSession) -> usize {
    render(
        surface,
        session.entities(),
        session.gesture_trail(),
        session.particles(),
    )
}
