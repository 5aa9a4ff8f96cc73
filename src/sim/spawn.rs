//! Entity spawning: weighted kind selection and difficulty-scaled launch

use glam::Vec2;
use rand::Rng;

use super::state::{Entity, EntityId};
use crate::difficulty_multiplier;
use crate::tuning::SimConfig;

/// Roll a new entity just above the top edge of a playfield `width` wide
pub fn roll_entity<R: Rng>(rng: &mut R, config: &SimConfig, id: EntityId, width: f32) -> Entity {
    let spec = config.kinds.pick(rng.random::<f32>());
    let speed = difficulty_multiplier(config.level);

    let usable = (width - 2.0 * config.spawn_margin).max(0.0);
    let x = config.spawn_margin + rng.random::<f32>() * usable;

    let vx = symmetric(rng, config.spawn_vx_half_range) * speed;
    let vy = (config.spawn_vy_min + rng.random::<f32>() * (config.spawn_vy_max - config.spawn_vy_min)) * speed;
    let spin = symmetric(rng, config.spawn_spin_half_range) * speed;

    Entity::new(id, spec, Vec2::new(x, config.spawn_y), Vec2::new(vx, vy), spin)
}

/// Uniform in [-half, half)
#[inline]
fn symmetric<R: Rng>(rng: &mut R, half: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * 2.0 * half
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EntityKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_within_margins() {
        let config = SimConfig::default();
        let mut rng = Pcg32::seed_from_u64(42);
        for i in 0..500 {
            let e = roll_entity(&mut rng, &config, EntityId(i), 800.0);
            assert!(e.pos.x >= 40.0 && e.pos.x <= 760.0);
            assert_eq!(e.pos.y, -40.0);
            assert!(e.vel.y >= 2.0 && e.vel.y <= 4.0);
            assert!(e.vel.x.abs() <= 1.5);
            assert!(e.rotation_speed.abs() <= 0.075);
            assert!(!e.slashed);
        }
    }

    #[test]
    fn test_difficulty_scales_speed() {
        let mut config = SimConfig::default();
        config.level = 6; // x1.5
        let mut rng = Pcg32::seed_from_u64(9);
        let mut fastest: f32 = 0.0;
        for i in 0..500 {
            let e = roll_entity(&mut rng, &config, EntityId(i), 800.0);
            assert!(e.vel.y >= 3.0 - 1e-4 && e.vel.y <= 6.0 + 1e-4);
            fastest = fastest.max(e.vel.y);
        }
        assert!(fastest > 4.0);
    }

    #[test]
    fn test_kind_distribution() {
        let config = SimConfig::default();
        let mut rng = Pcg32::seed_from_u64(2024);
        let trials = 20_000;
        let bombs = (0..trials)
            .map(|i| roll_entity(&mut rng, &config, EntityId(i), 800.0))
            .filter(|e| e.kind == EntityKind::Bomb)
            .count();
        let ratio = bombs as f64 / trials as f64;
        // 10% +- ~5 standard deviations
        assert!((0.09..=0.11).contains(&ratio), "bomb ratio {ratio}");
    }

    #[test]
    fn test_kind_payload_copied() {
        let config = SimConfig::default();
        let mut rng = Pcg32::seed_from_u64(5);
        for i in 0..200 {
            let e = roll_entity(&mut rng, &config, EntityId(i), 800.0);
            match e.kind {
                EntityKind::Token => assert_eq!((e.points, e.radius), (10, 30.0)),
                EntityKind::Bomb => assert_eq!((e.points, e.radius), (0, 25.0)),
            }
        }
    }

    #[test]
    fn test_narrow_playfield() {
        let config = SimConfig::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let e = roll_entity(&mut rng, &config, EntityId(1), 20.0);
        assert_eq!(e.pos.x, 40.0);
    }
}
