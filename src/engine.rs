use glam::Vec2;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::config::EffectConfig;
use crate::layer::LayerBuffer;
use crate::particle::{Particle, StarInstance};
use crate::spawner::{SpawnRequest, Spawner};

/// Draw instances for one frame, back layer first.
#[derive(Default)]
pub struct FrameBatch {
    pub back: Vec<StarInstance>,
    pub front: Vec<StarInstance>,
}

/// The whole effect as one value: config, spawner state, both layer
/// populations and the RNG.
///
/// The engine holds no timer. Input entry points only enqueue particles; the
/// host drives the simulation by calling [`Engine::step`] once per frame tick.
pub struct Engine {
    config: EffectConfig,
    spawner: Spawner,
    front: LayerBuffer,
    back: LayerBuffer,
    rng: SmallRng,
    viewport: Vec2,
    pending: Vec<SpawnRequest>,
}

impl Engine {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            front: LayerBuffer::new(config.layer_capacity(true)),
            back: LayerBuffer::new(config.layer_capacity(false)),
            config,
            spawner: Spawner::new(),
            rng: SmallRng::from_entropy(),
            viewport: Vec2::ZERO,
            pending: Vec::new(),
        }
    }

    #[cfg(test)]
    fn with_seed(config: EffectConfig, seed: u64) -> Self {
        let mut engine = Self::new(config);
        engine.rng = SmallRng::seed_from_u64(seed);
        engine
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        self.viewport = size;
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.spawner
            .pointer_moved(position, &self.config, &mut self.rng, &mut self.pending);
        self.commit_spawns();
    }

    /// `offset` is the current scroll position, not a delta.
    pub fn scrolled(&mut self, offset: f32) {
        self.spawner
            .scrolled(offset, self.viewport, &mut self.rng, &mut self.pending);
        self.commit_spawns();
    }

    /// Each spawn goes to the front layer with probability `front_ratio`,
    /// otherwise to the back layer; the layer's FIFO cap applies on push.
    fn commit_spawns(&mut self) {
        for request in self.pending.drain(..) {
            let front = self.rng.gen::<f32>() < self.config.front_ratio;
            let particle = Particle::new(
                request.position,
                front,
                request.vertical_boost,
                &self.config,
                &mut self.rng,
            );

            if front {
                self.front.push(particle);
            } else {
                self.back.push(particle);
            }
        }
    }

    /// One frame tick: advance, cull and collect both layers, back before
    /// front so the depth stacking is preserved downstream.
    pub fn step(&mut self, out: &mut FrameBatch) {
        out.back.clear();
        out.front.clear();

        self.back
            .step(self.config.gravity, self.config.full_life_time_ratio, &mut out.back);
        self.front
            .step(self.config.gravity, self.config.full_life_time_ratio, &mut out.front);
    }

    pub fn population(&self) -> usize {
        self.front.len() + self.back.len()
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }
}
