/// Tunables for the star-trail effect.
///
/// Defaults reproduce the effect as shipped on the site; the CLI overrides
/// gravity and the global population cap.
#[derive(Clone, Debug)]
pub struct EffectConfig {
    /// Baseline number of particles per pointer-move spawn.
    pub min_count: usize,
    /// Pointer speed (px per move) at which spawning stops being probabilistic.
    pub speed_factor: f32,
    /// Cap on the extra particles granted to fast pointer movement.
    pub max_additional: usize,
    /// Spatial jitter applied at spawn, total range per axis.
    pub spread_range: f32,
    /// Nominal outer radius unit of a star.
    pub base_star_size: f32,
    /// Per-frame increment to vertical velocity. 0 disables gravity.
    pub gravity: f32,
    /// Total population cap across both layers.
    pub global_max: usize,
    /// Fraction of spawns (and of capacity) assigned to the front layer.
    pub front_ratio: f32,
    /// Mean lifetime in seconds at the 60 fps reference rate.
    pub life_time_sec: f32,
    /// Lifetime jitter, +/- seconds.
    pub life_time_random_sec: f32,
    /// Fraction of life spent at full opacity before the fade-out tail.
    pub full_life_time_ratio: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            min_count: 1,
            speed_factor: 50.0,
            max_additional: 15,
            spread_range: 15.0,
            base_star_size: 3.5,
            gravity: 0.0,
            global_max: 500,
            front_ratio: 0.35,
            life_time_sec: 2.8,
            life_time_random_sec: 1.2,
            full_life_time_ratio: 0.5,
        }
    }
}

impl EffectConfig {
    /// Capacity of one layer: the global cap split by the front/back ratio.
    pub fn layer_capacity(&self, front: bool) -> usize {
        let share = if front {
            self.front_ratio
        } else {
            1.0 - self.front_ratio
        };

        ((self.global_max as f32 * share) as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_split_follows_front_ratio() {
        let config = EffectConfig::default();
        assert_eq!(config.layer_capacity(true), 175);
        assert_eq!(config.layer_capacity(false), 325);
    }

    #[test]
    fn capacity_never_reaches_zero() {
        let config = EffectConfig {
            global_max: 1,
            front_ratio: 0.35,
            ..Default::default()
        };
        assert_eq!(config.layer_capacity(true), 1);
        assert_eq!(config.layer_capacity(false), 1);
    }
}
