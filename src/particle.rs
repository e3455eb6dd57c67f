use glam::Vec2;
use rand::Rng;

use crate::config::EffectConfig;

/// Reference frame rate the decay constants are expressed against.
pub const REFERENCE_FPS: f32 = 60.0;

/// Horizontal velocity is damped by this factor every frame.
const DRAG: f32 = 0.98;

/// Initial velocity range, +/- per axis.
const SPAWN_SPEED: f32 = 0.9;

/// Size variation applied to the base star size at spawn.
const SIZE_VARIATION: std::ops::Range<f32> = 0.4..1.5;

/// Back-layer stars are drawn smaller to sell the depth.
const BACK_SCALE: f32 = 0.6;

/// Rotation speed range, +/- radians per frame.
const SPIN: f32 = 0.03;

/// One decaying, rotating star. Lives in exactly one layer for its whole life.
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub life: f32,
    pub decay: f32,
    pub angle: f32,
    pub angular_velocity: f32,
    pub front: bool,
}

impl Particle {
    pub fn new(
        position: Vec2,
        front: bool,
        vertical_boost: f32,
        config: &EffectConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let jitter = Vec2::new(
            rng.gen_range(-0.5..=0.5) * config.spread_range,
            rng.gen_range(-0.5..=0.5) * config.spread_range,
        );
        let velocity = Vec2::new(
            rng.gen_range(-SPAWN_SPEED..=SPAWN_SPEED),
            rng.gen_range(-SPAWN_SPEED..=SPAWN_SPEED) + vertical_boost,
        );

        let scale = if front { 1.0 } else { BACK_SCALE };
        let outer_radius = config.base_star_size * rng.gen_range(SIZE_VARIATION) * scale;

        // Lifetime is randomized around the mean, floored at 0.1s so decay
        // stays finite.
        let life_time =
            config.life_time_sec + rng.gen_range(-1.0..=1.0) * config.life_time_random_sec;
        let decay = 1.0 / (REFERENCE_FPS * life_time.max(0.1));

        Self {
            position: position + jitter,
            velocity,
            outer_radius,
            inner_radius: outer_radius / 2.0,
            life: 1.0,
            decay,
            angle: rng.gen_range(0.0..std::f32::consts::TAU),
            angular_velocity: rng.gen_range(-SPIN..=SPIN),
            front,
        }
    }

    /// One fixed physics tick. Must run exactly once per frame per live particle.
    pub fn advance(&mut self, gravity: f32) {
        self.velocity.x *= DRAG;
        self.velocity.y += gravity;
        self.position += self.velocity;
        self.angle += self.angular_velocity;
        self.life -= self.decay;
    }

    /// Display opacity: full for the head of the lifetime, then a linear ramp
    /// down over the remaining tail.
    pub fn alpha(&self, full_life_ratio: f32) -> f32 {
        let fade_span = 1.0 - full_life_ratio;
        if self.life > fade_span {
            1.0
        } else {
            (self.life / fade_span).max(0.0)
        }
    }

    pub fn instance(&self, full_life_ratio: f32) -> StarInstance {
        StarInstance {
            position: self.position,
            outer_radius: self.outer_radius,
            inner_radius: self.inner_radius,
            angle: self.angle,
            alpha: self.alpha(full_life_ratio),
        }
    }
}

/// GPU form of a particle, one per drawn star.
#[repr(C)]
#[derive(bytemuck::Zeroable, Clone, Copy)]
pub struct StarInstance {
    pub position: Vec2,
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub angle: f32,
    pub alpha: f32,
}

unsafe impl bytemuck::Pod for StarInstance {}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    fn particle(rng: &mut SmallRng) -> Particle {
        Particle::new(
            Vec2::new(100.0, 100.0),
            true,
            0.0,
            &EffectConfig::default(),
            rng,
        )
    }

    #[test]
    fn life_is_monotonically_non_increasing() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut p = particle(&mut rng);

        let mut previous = p.life;
        for _ in 0..600 {
            p.advance(0.0);
            assert!(p.life <= previous);
            previous = p.life;
        }
    }

    #[test]
    fn alpha_ramp_matches_fade_tail() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut p = particle(&mut rng);

        p.life = 1.0;
        assert_eq!(p.alpha(0.5), 1.0);
        p.life = 0.25;
        assert_eq!(p.alpha(0.5), 0.5);
        p.life = 0.0;
        assert_eq!(p.alpha(0.5), 0.0);
        p.life = -0.01;
        assert_eq!(p.alpha(0.5), 0.0);
    }

    #[test]
    fn spawn_jitter_stays_within_spread_range() {
        let config = EffectConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let origin = Vec2::new(200.0, 300.0);

        for _ in 0..200 {
            let p = Particle::new(origin, false, 0.0, &config, &mut rng);
            assert!((p.position.x - origin.x).abs() <= config.spread_range / 2.0);
            assert!((p.position.y - origin.y).abs() <= config.spread_range / 2.0);
        }
    }

    #[test]
    fn vertical_boost_shifts_initial_velocity() {
        let config = EffectConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..100 {
            let p = Particle::new(Vec2::ZERO, true, -0.8, &config, &mut rng);
            assert!(p.velocity.y >= -0.8 - SPAWN_SPEED && p.velocity.y <= -0.8 + SPAWN_SPEED);
        }
    }

    #[test]
    fn back_layer_stars_are_smaller() {
        let config = EffectConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..100 {
            let p = Particle::new(Vec2::ZERO, false, 0.0, &config, &mut rng);
            assert!(p.outer_radius < config.base_star_size * 1.5 * BACK_SCALE);
            assert_eq!(p.inner_radius, p.outer_radius / 2.0);
        }
    }

    #[test]
    fn decay_respects_lifetime_floor() {
        let config = EffectConfig {
            life_time_sec: 0.0,
            life_time_random_sec: 0.0,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let p = Particle::new(Vec2::ZERO, true, 0.0, &config, &mut rng);

        // Floored at 0.1s => 6 frames.
        assert!((p.decay - 1.0 / 6.0).abs() < 1e-6);
    }
}
