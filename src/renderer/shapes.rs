//! Draw-command generation for 2D primitives
//!
//! Turns simulation data into a flat list of [`DrawCmd`]s. Nothing here
//! knows about the canvas API; a [`Surface`](super::Surface) replays the
//! list.

use glam::Vec2;

use crate::sim::gesture::GesturePoint;
use crate::sim::particles::Particle;
use crate::sim::state::{Entity, EntityKind};

/// Straight RGB plus alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn hex(rgb: u32, a: f32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// CSS color string
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Translucent fill laid over the previous frame for motion blur
pub const BACKGROUND: Rgba = Rgba::hex(0x222f3e, 0.05);
pub const SHADOW: Rgba = Rgba::hex(0x000000, 0.2);
pub const BLADE: Rgba = Rgba::hex(0xff6b35, 1.0);
pub const BLADE_WIDTH: f32 = 4.0;
pub const BLADE_GLOW: f32 = 15.0;

const BOMB_BODY: Rgba = Rgba::hex(0x2a2a2a, 1.0);
const BOMB_RIM: Rgba = Rgba::hex(0xff4444, 1.0);
const TOKEN_FACE: Rgba = Rgba::hex(0xe9ecef, 1.0);
const TOKEN_EDGE: Rgba = Rgba::hex(0x6c757d, 1.0);
const TOKEN_BEVEL: Rgba = Rgba::hex(0xffffff, 1.0);
const TOKEN_MARK: Rgba = Rgba::hex(0x00d4aa, 1.0);

/// One drawing operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    FillRect {
        pos: Vec2,
        size: Vec2,
        color: Rgba,
    },
    /// Round-capped segment
    Line {
        from: Vec2,
        to: Vec2,
        color: Rgba,
        width: f32,
    },
    /// Round-joined path with an optional glow (shadow blur)
    Polyline {
        points: Vec<Vec2>,
        color: Rgba,
        width: f32,
        glow: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Option<Rgba>,
        stroke: Option<(Rgba, f32)>,
    },
    /// Centered text
    Text {
        pos: Vec2,
        text: &'static str,
        size: f32,
        bold: bool,
        color: Rgba,
    },
    /// Save state, then translate and rotate
    PushTransform { translate: Vec2, rotate: f32 },
    /// Restore the state saved by the matching push
    PopTransform,
}

pub fn background(width: f32, height: f32) -> DrawCmd {
    DrawCmd::FillRect {
        pos: Vec2::ZERO,
        size: Vec2::new(width, height),
        color: BACKGROUND,
    }
}

/// Fading segments between consecutive trail points, in the entity color
pub fn entity_trail(entity: &Entity) -> Vec<DrawCmd> {
    let color = Rgba::hex(entity.color, 1.0);
    entity
        .trail
        .windows(2)
        .map(|pair| {
            let opacity = pair[1].opacity;
            DrawCmd::Line {
                from: pair[0].pos,
                to: pair[1].pos,
                color: color.with_alpha(0.6 * opacity),
                width: (3.0 * opacity).max(1.0),
            }
        })
        .collect()
}

/// Entity body in its own rotated frame
pub fn entity_body(entity: &Entity) -> Vec<DrawCmd> {
    let r = entity.radius;
    let mut cmds = vec![
        DrawCmd::PushTransform {
            translate: entity.pos,
            rotate: entity.rotation,
        },
        DrawCmd::Circle {
            center: Vec2::splat(2.0),
            radius: r,
            fill: Some(SHADOW),
            stroke: None,
        },
    ];

    match entity.kind {
        EntityKind::Bomb => {
            cmds.push(DrawCmd::Circle {
                center: Vec2::ZERO,
                radius: r,
                fill: Some(BOMB_BODY),
                stroke: Some((BOMB_RIM, 3.0)),
            });
            cmds.push(DrawCmd::Text {
                pos: Vec2::ZERO,
                text: "\u{1f4a3}",
                size: r,
                bold: false,
                color: BOMB_RIM,
            });
        }
        EntityKind::Token => {
            cmds.push(DrawCmd::Circle {
                center: Vec2::ZERO,
                radius: r,
                fill: Some(TOKEN_FACE),
                stroke: Some((TOKEN_EDGE, 2.5)),
            });
            cmds.push(DrawCmd::Circle {
                center: Vec2::ZERO,
                radius: (r - 4.0).max(0.0),
                fill: None,
                stroke: Some((TOKEN_BEVEL, 1.5)),
            });
            cmds.push(DrawCmd::Text {
                pos: Vec2::ZERO,
                text: "APT",
                size: r * 0.7,
                bold: true,
                color: TOKEN_MARK,
            });
        }
    }

    cmds.push(DrawCmd::PopTransform);
    cmds
}

/// Glowing blade trail; nothing for fewer than two points
pub fn blade_trail(trail: &[GesturePoint]) -> Option<DrawCmd> {
    if trail.len() < 2 {
        return None;
    }
    Some(DrawCmd::Polyline {
        points: trail.iter().map(|p| p.pos).collect(),
        color: BLADE,
        width: BLADE_WIDTH,
        glow: BLADE_GLOW,
    })
}

pub fn particle(p: &Particle) -> DrawCmd {
    DrawCmd::Circle {
        center: p.pos,
        radius: p.size,
        fill: Some(Rgba::hex(p.color, p.life.clamp(0.0, 1.0))),
        stroke: None,
    }
}

/// Whole frame, back to front
pub fn frame(
    width: f32,
    height: f32,
    entities: &[Entity],
    gesture_trail: &[GesturePoint],
    particles: &[Particle],
) -> Vec<DrawCmd> {
    let mut cmds = Vec::with_capacity(1 + entities.len() * 12 + particles.len() + 1);
    cmds.push(background(width, height));

    for entity in entities.iter().filter(|e| !e.slashed) {
        cmds.extend(entity_trail(entity));
        cmds.extend(entity_body(entity));
    }

    cmds.extend(blade_trail(gesture_trail));
    cmds.extend(particles.iter().map(particle));
    cmds
}
