//! Pointer and keyboard mapping
//!
//! Browser callbacks translate raw DOM events into [`PointerEvent`]s in
//! canvas pixels and feed them straight to the session, so collision
//! results are visible to the very next render.

use glam::Vec2;

use crate::sim::events::EventSink;
use crate::sim::session::SimulationSession;

/// Canvas bounding box in client (CSS) pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Map client coordinates to canvas pixels.
///
/// The canvas backing store may differ from its CSS size, so the offset
/// is scaled by `canvas / rect` on each axis. A collapsed rect maps to
/// the unscaled offset.
pub fn client_to_canvas(client: Vec2, rect: ClientRect, canvas_size: Vec2) -> Vec2 {
    let scale = Vec2::new(
        if rect.width > 0.0 { canvas_size.x / rect.width } else { 1.0 },
        if rect.height > 0.0 { canvas_size.y / rect.height } else { 1.0 },
    );
    (client - Vec2::new(rect.left, rect.top)) * scale
}

/// Pointer event in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
}

/// Route a pointer event to the session's stroke operations.
/// Returns the number of entities hit.
pub fn dispatch_pointer(
    session: &mut SimulationSession,
    event: PointerEvent,
    now_ms: f64,
    sink: &mut dyn EventSink,
) -> usize {
    match event {
        PointerEvent::Down(pos) => {
            session.start_stroke(pos, now_ms);
            0
        }
        PointerEvent::Move(pos) => session.add_point(pos, now_ms, sink),
        PointerEvent::Up => {
            session.end_stroke(now_ms);
            0
        }
    }
}

/// Keyboard actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
}

impl KeyAction {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Spacebar" | "p" | "P" => Some(KeyAction::TogglePause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::SimEvent;
    use crate::sim::state::{EntityKind, Playfield, RunState};
    use crate::tuning::SimConfig;

    #[test]
    fn test_scales_css_to_backing_store() {
        let rect = ClientRect {
            left: 10.0,
            top: 20.0,
            width: 400.0,
            height: 300.0,
        };
        let p = client_to_canvas(Vec2::new(210.0, 170.0), rect, Vec2::new(800.0, 600.0));
        assert_eq!(p, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_collapsed_rect_is_unscaled() {
        let rect = ClientRect {
            left: 5.0,
            top: 5.0,
            width: 0.0,
            height: 0.0,
        };
        let p = client_to_canvas(Vec2::new(15.0, 25.0), rect, Vec2::new(800.0, 600.0));
        assert_eq!(p, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_pause_keys() {
        assert_eq!(KeyAction::from_key(" "), Some(KeyAction::TogglePause));
        assert_eq!(KeyAction::from_key("P"), Some(KeyAction::TogglePause));
        assert_eq!(KeyAction::from_key("Escape"), None);
    }

    #[test]
    fn test_pointer_stroke_slashes() {
        let mut s = SimulationSession::new(SimConfig::default(), Playfield::new(800.0, 600.0), 3);
        s.set_run_state(RunState::Running);
        s.place_entity(EntityKind::Token, Vec2::new(300.0, 300.0), Vec2::ZERO);
        let mut events: Vec<SimEvent> = Vec::new();

        dispatch_pointer(&mut s, PointerEvent::Down(Vec2::new(260.0, 300.0)), 0.0, &mut events);
        let hits = dispatch_pointer(&mut s, PointerEvent::Move(Vec2::new(300.0, 300.0)), 8.0, &mut events);
        dispatch_pointer(&mut s, PointerEvent::Up, 16.0, &mut events);

        assert_eq!(hits, 1);
        assert!(!s.stroke_active());
        assert_eq!(events.first(), Some(&SimEvent::ScoreDelta { points: 10 }));
    }
}
