//! Falling flakes and the population that holds them

use rand::Rng;

use crate::config::{PopulationPolicy, SnowpackConfig};
use crate::constants::{MAX_FLAKES_LIMIT, MAX_SPAWN_PER_FRAME};
use crate::ground::GroundField;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flake {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub vx: f32,
    pub vy: f32,
    pub opacity: f32,
}

/// Box-Muller draw from a normal distribution.
fn normal_sample<R: Rng + ?Sized>(rng: &mut R, mean: f32, std_dev: f32) -> f32 {
    // Shift into (0, 1] so the logarithm stays finite.
    let u = 1.0 - rng.gen::<f32>();
    let v = rng.gen::<f32>();
    mean + std_dev * (-2.0 * u.ln()).sqrt() * (std::f32::consts::TAU * v).cos()
}

/// Create a flake somewhere above the visible area at a random column.
pub fn spawn<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SnowpackConfig,
    width: f32,
    height: f32,
) -> Flake {
    let radius = normal_sample(rng, config.radius_mean, config.radius_std_dev)
        .clamp(config.radius_min, config.radius_max);
    Flake {
        x: rng.gen::<f32>() * width.max(0.0),
        y: -rng.gen::<f32>() * height.max(0.0),
        radius,
        vx: rng.gen_range(-config.drift_range..=config.drift_range),
        vy: radius * config.base_speed_factor,
        opacity: config.flake_opacity,
    }
}

/// Wrap `x` into `[0, width)`.
pub fn wrap_x(x: f32, width: f32) -> f32 {
    if width <= 0.0 {
        return 0.0;
    }
    let wrapped = x.rem_euclid(width);
    // rem_euclid can round up to `width` for tiny negative inputs
    if wrapped >= width {
        0.0
    } else {
        wrapped
    }
}

/// Column index under `x`, clamped into `[0, len)`.
pub fn column(x: f32, len: usize) -> usize {
    if len == 0 || x.is_nan() || x <= 0.0 {
        return 0;
    }
    (x.floor() as usize).min(len - 1)
}

/// One frame of motion: gravity scaled by radius, drift, horizontal wrap.
pub fn advance(flake: &mut Flake, config: &SnowpackConfig, width: f32) {
    flake.vy += config.gravity * flake.radius;
    flake.x = wrap_x(flake.x + flake.vx, width);
    flake.y += flake.vy;
}

/// Whether the flake's leading edge has reached the snowpack surface below it.
pub fn landing_test(flake: &Flake, ground: &GroundField, height: f32) -> bool {
    let col = column(flake.x, ground.len());
    flake.y + flake.radius >= height - ground.height_at(col)
}

pub struct FlakeSet {
    flakes: Vec<Flake>,
    accumulator: f32,
}

impl FlakeSet {
    pub fn new(config: &SnowpackConfig) -> Self {
        Self {
            flakes: Vec::with_capacity(config.max_flakes.min(MAX_FLAKES_LIMIT)),
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Flake] {
        &self.flakes
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Flake] {
        &mut self.flakes
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Flake> {
        self.flakes.get_mut(index)
    }

    pub fn clear(&mut self) {
        self.flakes.clear();
        self.accumulator = 0.0;
    }

    /// Refill the population according to the configured policy.
    /// Returns the number of flakes spawned.
    pub fn top_up<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        config: &SnowpackConfig,
        width: f32,
        height: f32,
    ) -> usize {
        let before = self.flakes.len();
        match config.population {
            PopulationPolicy::Replace => {
                while self.flakes.len() < config.max_flakes {
                    self.flakes.push(spawn(rng, config, width, height));
                }
            }
            PopulationPolicy::Trickle { per_frame } => {
                self.accumulator += per_frame;
                let ready = self.accumulator.floor();
                if ready < 1.0 {
                    return 0;
                }
                // Whole flakes that don't fit under the cap are dropped, not banked.
                self.accumulator -= ready;
                let available = config.max_flakes.saturating_sub(self.flakes.len());
                let to_spawn = (ready as usize).min(available).min(MAX_SPAWN_PER_FRAME);
                for _ in 0..to_spawn {
                    self.flakes.push(spawn(rng, config, width, height));
                }
            }
        }
        self.flakes.len() - before
    }

    /// Take a landed flake out of play. Under `Replace` it is respawned in place,
    /// otherwise it is swap-removed, so callers walking the set must go from the back.
    pub fn retire<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rng: &mut R,
        config: &SnowpackConfig,
        width: f32,
        height: f32,
    ) {
        if index >= self.flakes.len() {
            return;
        }
        match config.population {
            PopulationPolicy::Replace => self.flakes[index] = spawn(rng, config, width, height),
            PopulationPolicy::Trickle { .. } => {
                self.flakes.swap_remove(index);
            }
        }
    }
}
