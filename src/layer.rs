use std::collections::VecDeque;

use crate::particle::{Particle, StarInstance};

/// Bounded, insertion-ordered population of live particles for one layer.
///
/// When a spawn would exceed the capacity the oldest particle is evicted, so
/// bursts keep their freshest stars at the cost of the longest-lived ones.
pub struct LayerBuffer {
    particles: VecDeque<Particle>,
    capacity: usize,
}

impl LayerBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push_back(particle);
        if self.particles.len() > self.capacity {
            self.particles.pop_front();
        }
    }

    /// Advances every particle by one tick, drops the expired ones and emits
    /// draw instances for the survivors.
    ///
    /// A particle whose life reaches zero this tick is removed without being
    /// drawn. `retain_mut` keeps the mid-pass removal index-safe.
    pub fn step(&mut self, gravity: f32, full_life_ratio: f32, out: &mut Vec<StarInstance>) {
        self.particles.retain_mut(|particle| {
            particle.advance(gravity);
            if particle.life <= 0.0 {
                return false;
            }

            out.push(particle.instance(full_life_ratio));
            true
        });
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    fn positions_x(&self) -> Vec<f32> {
        self.particles.iter().map(|p| p.position.x).collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;
    use crate::config::EffectConfig;
    use crate::particle::Particle;

    fn tagged(x: f32) -> Particle {
        Particle {
            position: Vec2::new(x, 0.0),
            velocity: Vec2::ZERO,
            outer_radius: 3.5,
            inner_radius: 1.75,
            life: 1.0,
            decay: 0.01,
            angle: 0.0,
            angular_velocity: 0.0,
            front: true,
        }
    }

    #[test]
    fn push_evicts_the_oldest_when_full() {
        let mut layer = LayerBuffer::new(3);
        for x in 0..5 {
            layer.push(tagged(x as f32));
            assert!(layer.len() <= layer.capacity());
        }

        // 0 and 1 were evicted, newest survived.
        assert_eq!(layer.positions_x(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn expired_particle_is_removed_without_being_drawn() {
        let mut layer = LayerBuffer::new(8);
        let mut dying = tagged(1.0);
        dying.life = 0.5;
        dying.decay = 0.6;
        layer.push(dying);
        layer.push(tagged(2.0));

        let mut out = Vec::new();
        layer.step(0.0, 0.5, &mut out);

        // The expiring particle produced no instance on its removal frame.
        assert_eq!(layer.len(), 1);
        assert_eq!(out.len(), 1);
        assert_eq!(layer.positions_x(), vec![2.0]);
    }

    #[test]
    fn step_advances_survivors_in_order() {
        let mut layer = LayerBuffer::new(8);
        for x in 0..4 {
            let mut p = tagged(x as f32);
            p.velocity = Vec2::new(0.0, 1.0);
            layer.push(p);
        }

        let mut out = Vec::new();
        layer.step(0.0, 0.5, &mut out);

        assert_eq!(out.len(), 4);
        for (i, instance) in out.iter().enumerate() {
            assert_eq!(instance.position, Vec2::new(i as f32, 1.0));
        }
    }

    #[test]
    fn population_stays_capped_under_spawn_pressure() {
        let config = EffectConfig::default();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut layer = LayerBuffer::new(config.layer_capacity(false));

        for _ in 0..2000 {
            layer.push(Particle::new(Vec2::ZERO, false, 0.0, &config, &mut rng));
            assert!(layer.len() <= layer.capacity());
        }
        assert_eq!(layer.len(), 325);
    }
}
