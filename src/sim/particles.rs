//! Decaying particles for slice and explosion feedback

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::SimConfig;

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0xRRGGBB
    pub color: u32,
    /// 1 when spawned, removed once it reaches 0
    pub life: f32,
    /// Life lost per tick
    pub decay: f32,
    pub size: f32,
}

impl Particle {
    /// Advance one tick. Returns false when expired.
    pub fn advance(&mut self, gravity: f32, drag: f32) -> bool {
        self.pos += self.vel;
        self.vel.y += gravity;
        self.vel.x *= drag;
        self.life -= self.decay;
        self.life > 0.0
    }
}

/// Particle simulation, independent from the entity list
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    gravity: f32,
    drag: f32,
    speed: (f32, f32),
    decay: (f32, f32),
    size: (f32, f32),
    cap: usize,
}

impl ParticleField {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            particles: Vec::new(),
            gravity: config.particle_gravity,
            drag: config.particle_drag,
            speed: (config.particle_speed_min, config.particle_speed_max),
            decay: (config.particle_decay_min, config.particle_decay_max),
            size: (config.particle_size_min, config.particle_size_max),
            cap: config.max_particles,
        }
    }

    /// Spawn `count` particles evenly spaced around a circle
    pub fn spawn_burst<R: Rng>(&mut self, rng: &mut R, pos: Vec2, color: u32, count: usize) {
        if self.cap == 0 || count == 0 {
            return;
        }
        // Only the newest `cap` of this burst can survive
        let skip = count.saturating_sub(self.cap);
        let excess = (self.particles.len() + count - skip).saturating_sub(self.cap);
        self.particles.drain(..excess);
        for i in skip..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let speed = lerp(self.speed, rng.random::<f32>());
            self.particles.push(Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                color,
                life: 1.0,
                decay: lerp(self.decay, rng.random::<f32>()),
                size: lerp(self.size, rng.random::<f32>()),
            });
        }
    }

    /// Integrate all particles and drop expired ones
    pub fn advance(&mut self) {
        let (gravity, drag) = (self.gravity, self.drag);
        self.particles.retain_mut(|p| p.advance(gravity, drag));
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        if self.particles.len() > cap {
            let excess = self.particles.len() - cap;
            self.particles.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[inline]
fn lerp((min, max): (f32, f32), t: f32) -> f32 {
    min + (max - min) * t
}
