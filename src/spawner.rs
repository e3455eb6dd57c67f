use glam::Vec2;
use rand::Rng;

use crate::config::EffectConfig;

/// Scroll deltas at or below this are ignored.
const SCROLL_DEADZONE: f32 = 2.0;

/// One particle per this many pixels of scroll delta.
const SCROLL_DIVISOR: f32 = 10.0;

/// Cap on particles per scroll event.
const SCROLL_MAX: usize = 8;

/// Scroll spawns sit this far inside the viewport edge.
const EDGE_INSET: f32 = 5.0;

/// Vertical kick applied to scroll spawns, away from the spawning edge.
const SCROLL_BOOST: f32 = 0.8;

/// A single particle to be created, before layer assignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    pub position: Vec2,
    pub vertical_boost: f32,
}

/// Turns raw pointer and scroll input into spawn requests.
///
/// Keeps the last observed pointer position and scroll offset; the very first
/// pointer observation only records, there is no previous point to measure a
/// delta from.
pub struct Spawner {
    last_pointer: Option<Vec2>,
    last_scroll: f32,
}

impl Spawner {
    pub fn new() -> Self {
        Self {
            last_pointer: None,
            last_scroll: 0.0,
        }
    }

    /// Spawn count scales with pointer speed: below the threshold a minimum
    /// count is spawned with probability `d / speed_factor`, at or above it
    /// the count grows with distance up to a cap. Positions are scattered
    /// along the motion segment for a trail.
    pub fn pointer_moved(
        &mut self,
        position: Vec2,
        config: &EffectConfig,
        rng: &mut impl Rng,
        out: &mut Vec<SpawnRequest>,
    ) {
        let Some(previous) = self.last_pointer.replace(position) else {
            return;
        };

        let distance = previous.distance(position);
        let count = if distance < config.speed_factor {
            if rng.gen::<f32>() < distance / config.speed_factor {
                config.min_count
            } else {
                0
            }
        } else {
            config.min_count + ((distance / config.speed_factor) as usize).min(config.max_additional)
        };

        for _ in 0..count {
            let t = rng.gen::<f32>();
            out.push(SpawnRequest {
                position: previous + (position - previous) * t,
                vertical_boost: 0.0,
            });
        }
    }

    /// Scrolling kicks up particles along the edge the content is moving
    /// towards: the bottom edge when scrolling down, the top edge when
    /// scrolling up, with a velocity boost away from that edge.
    pub fn scrolled(
        &mut self,
        offset: f32,
        viewport: Vec2,
        rng: &mut impl Rng,
        out: &mut Vec<SpawnRequest>,
    ) {
        let delta = offset - self.last_scroll;
        self.last_scroll = offset;

        if delta.abs() <= SCROLL_DEADZONE {
            return;
        }

        let count = ((delta.abs() / SCROLL_DIVISOR) as usize).min(SCROLL_MAX);
        let (y, boost) = if delta > 0.0 {
            (viewport.y - EDGE_INSET, -SCROLL_BOOST)
        } else {
            (EDGE_INSET, SCROLL_BOOST)
        };

        for _ in 0..count {
            out.push(SpawnRequest {
                position: Vec2::new(rng.gen::<f32>() * viewport.x, y),
                vertical_boost: boost,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    fn rig() -> (Spawner, EffectConfig, SmallRng, Vec<SpawnRequest>) {
        (
            Spawner::new(),
            EffectConfig::default(),
            SmallRng::seed_from_u64(42),
            Vec::new(),
        )
    }

    #[test]
    fn first_observation_records_without_spawning() {
        let (mut spawner, config, mut rng, mut out) = rig();

        spawner.pointer_moved(Vec2::new(400.0, 300.0), &config, &mut rng, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_delta_never_spawns() {
        let (mut spawner, config, mut rng, mut out) = rig();
        let position = Vec2::new(400.0, 300.0);

        spawner.pointer_moved(position, &config, &mut rng, &mut out);
        for _ in 0..500 {
            spawner.pointer_moved(position, &config, &mut rng, &mut out);
        }
        assert!(out.is_empty());
    }

    #[test]
    fn fast_movement_spawns_a_deterministic_count() {
        let (mut spawner, config, mut rng, mut out) = rig();

        spawner.pointer_moved(Vec2::ZERO, &config, &mut rng, &mut out);
        spawner.pointer_moved(Vec2::new(200.0, 0.0), &config, &mut rng, &mut out);

        // 1 + min(floor(200 / 50), 15)
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn extra_spawns_are_capped_for_very_fast_movement() {
        let (mut spawner, config, mut rng, mut out) = rig();

        spawner.pointer_moved(Vec2::ZERO, &config, &mut rng, &mut out);
        spawner.pointer_moved(Vec2::new(50_000.0, 0.0), &config, &mut rng, &mut out);

        assert_eq!(out.len(), config.min_count + config.max_additional);
    }

    #[test]
    fn trail_spawns_lie_along_the_motion_segment() {
        let (mut spawner, config, mut rng, mut out) = rig();

        spawner.pointer_moved(Vec2::new(100.0, 100.0), &config, &mut rng, &mut out);
        spawner.pointer_moved(Vec2::new(300.0, 100.0), &config, &mut rng, &mut out);

        for request in &out {
            assert!(request.position.x >= 100.0 && request.position.x < 300.0);
            assert_eq!(request.position.y, 100.0);
            assert_eq!(request.vertical_boost, 0.0);
        }
    }

    #[test]
    fn downward_scroll_kicks_up_from_the_bottom_edge() {
        let (mut spawner, _, mut rng, mut out) = rig();
        let viewport = Vec2::new(1280.0, 720.0);

        spawner.scrolled(55.0, viewport, &mut rng, &mut out);

        // min(floor(55 / 10), 8)
        assert_eq!(out.len(), 5);
        for request in &out {
            assert_eq!(request.position.y, 715.0);
            assert_eq!(request.vertical_boost, -0.8);
            assert!(request.position.x >= 0.0 && request.position.x < viewport.x);
        }
    }

    #[test]
    fn upward_scroll_kicks_down_from_the_top_edge() {
        let (mut spawner, _, mut rng, mut out) = rig();
        let viewport = Vec2::new(1280.0, 720.0);

        spawner.scrolled(100.0, viewport, &mut rng, &mut out);
        out.clear();
        spawner.scrolled(55.0, viewport, &mut rng, &mut out);

        assert_eq!(out.len(), 4);
        for request in &out {
            assert_eq!(request.position.y, 5.0);
            assert_eq!(request.vertical_boost, 0.8);
        }
    }

    #[test]
    fn scroll_inside_the_deadzone_spawns_nothing() {
        let (mut spawner, _, mut rng, mut out) = rig();

        spawner.scrolled(1.0, Vec2::new(1280.0, 720.0), &mut rng, &mut out);
        assert!(out.is_empty());

        // The offset was still recorded.
        spawner.scrolled(1.0, Vec2::new(1280.0, 720.0), &mut rng, &mut out);
        assert!(out.is_empty());
    }
}
