//! Snowpack constants
//!
//! Defaults for every tunable in [`SnowpackConfig`](crate::SnowpackConfig).
//! The values give a light snowfall that visibly builds a drift over a few minutes.

// Flakes
pub const DEFAULT_MAX_FLAKES: usize = 500;
pub const DEFAULT_FLAKES_PER_FRAME: f32 = 0.1;
pub const MAX_FLAKES_LIMIT: usize = 10_000;
pub const MAX_SPAWN_PER_FRAME: usize = 48;
pub const MAX_AVALANCHE_FACTOR: f32 = 0.25;
pub const DEFAULT_GRAVITY: f32 = 0.005;
pub const DEFAULT_DRIFT_RANGE: f32 = 0.4;
pub const DEFAULT_RADIUS_MEAN: f32 = 2.0;
pub const DEFAULT_RADIUS_STD_DEV: f32 = 0.4;
pub const DEFAULT_RADIUS_MIN: f32 = 1.0;
pub const DEFAULT_RADIUS_MAX: f32 = 3.0;
pub const DEFAULT_BASE_SPEED_FACTOR: f32 = 0.1;
pub const DEFAULT_FLAKE_OPACITY: f32 = 0.9;

// Deposition
pub const DEFAULT_DEPOSIT_FACTOR: f32 = 1.0;
pub const DEFAULT_NEIGHBOR_SHARE: f32 = 0.5;

// Relaxation
pub const DEFAULT_DIFFUSION_RATE: f32 = 0.05;
pub const DEFAULT_DIFFUSION_THRESHOLD: f32 = 1.0;
pub const DEFAULT_STABLE_SLOPE: f32 = 3.0;
pub const DEFAULT_AVALANCHE_FACTOR: f32 = 0.15;
pub const DEFAULT_MAX_AVALANCHE_PASSES: usize = 3;

// Baseline mound
pub const DEFAULT_MOUND_HEIGHT_RATIO: f32 = 0.05;
pub const DEFAULT_MOUND_SPREAD_RATIO: f32 = 1.0 / 3.0;
pub const DEFAULT_MOUND_NOISE: f32 = 2.0;

// Rendering
pub const DEFAULT_SILHOUETTE_STEP: usize = 8;
pub const DEFAULT_SILHOUETTE_SMOOTHING: usize = 0;
pub const DEFAULT_GRAIN_SIZE: u32 = 100;
pub const DEFAULT_GRAIN_MIN: u8 = 220;
pub const DEFAULT_GRAIN_MAX: u8 = 255;
pub const BACKGROUND_COLOR: &str = "#000";
pub const OUTLINE_COLOR: &str = "#fff";
pub const OUTLINE_WIDTH: f32 = 1.0;

// Persistence
pub const DEFAULT_STORAGE_KEY: &str = "snowpackGround";
