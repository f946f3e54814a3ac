//! Snowpack configuration

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// How the flake population is kept topped up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "camelCase")]
pub enum PopulationPolicy {
    /// Closed population: a landed flake is reset at the top straight away.
    Replace,
    /// Open population: new flakes trickle in at a fractional rate per frame.
    Trickle {
        #[serde(rename = "perFrame")]
        per_frame: f32,
    },
}

impl Default for PopulationPolicy {
    fn default() -> Self {
        PopulationPolicy::Trickle {
            per_frame: DEFAULT_FLAKES_PER_FRAME,
        }
    }
}

/// Shape of a freshly synthesized ground.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Baseline {
    #[default]
    Mound,
    Flat,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnowpackConfig {
    pub max_flakes: usize,
    pub population: PopulationPolicy,
    pub gravity: f32,
    pub drift_range: f32,
    pub radius_mean: f32,
    pub radius_std_dev: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub base_speed_factor: f32,
    pub flake_opacity: f32,

    pub deposit_factor: f32,
    pub neighbor_share: f32,

    pub diffusion_rate: f32,
    /// Adjacent columns exchange height only when they differ by more than this.
    pub diffusion_threshold: f32,
    pub stable_slope: f32,
    pub avalanche_factor: f32,
    pub max_avalanche_passes: usize,
    pub clamp_non_negative: bool,

    pub baseline: Baseline,
    pub mound_height_ratio: f32,
    pub mound_spread_ratio: f32,
    pub mound_noise: f32,

    pub silhouette_step: usize,
    pub silhouette_smoothing: usize,
    pub grain_size: u32,
    pub grain_min: u8,
    pub grain_max: u8,

    pub storage_key: String,
}

impl Default for SnowpackConfig {
    fn default() -> Self {
        Self {
            max_flakes: DEFAULT_MAX_FLAKES,
            population: PopulationPolicy::default(),
            gravity: DEFAULT_GRAVITY,
            drift_range: DEFAULT_DRIFT_RANGE,
            radius_mean: DEFAULT_RADIUS_MEAN,
            radius_std_dev: DEFAULT_RADIUS_STD_DEV,
            radius_min: DEFAULT_RADIUS_MIN,
            radius_max: DEFAULT_RADIUS_MAX,
            base_speed_factor: DEFAULT_BASE_SPEED_FACTOR,
            flake_opacity: DEFAULT_FLAKE_OPACITY,
            deposit_factor: DEFAULT_DEPOSIT_FACTOR,
            neighbor_share: DEFAULT_NEIGHBOR_SHARE,
            diffusion_rate: DEFAULT_DIFFUSION_RATE,
            diffusion_threshold: DEFAULT_DIFFUSION_THRESHOLD,
            stable_slope: DEFAULT_STABLE_SLOPE,
            avalanche_factor: DEFAULT_AVALANCHE_FACTOR,
            max_avalanche_passes: DEFAULT_MAX_AVALANCHE_PASSES,
            clamp_non_negative: true,
            baseline: Baseline::default(),
            mound_height_ratio: DEFAULT_MOUND_HEIGHT_RATIO,
            mound_spread_ratio: DEFAULT_MOUND_SPREAD_RATIO,
            mound_noise: DEFAULT_MOUND_NOISE,
            silhouette_step: DEFAULT_SILHOUETTE_STEP,
            silhouette_smoothing: DEFAULT_SILHOUETTE_SMOOTHING,
            grain_size: DEFAULT_GRAIN_SIZE,
            grain_min: DEFAULT_GRAIN_MIN,
            grain_max: DEFAULT_GRAIN_MAX,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

fn unit_interval(name: &str, value: f32) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{name} must lie in [0, 1], got {value}"
    );
    Ok(())
}

impl SnowpackConfig {
    /// Parse a (possibly partial) JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing snowpack config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_flakes <= MAX_FLAKES_LIMIT,
            "population cap must be at most {MAX_FLAKES_LIMIT}, got {}",
            self.max_flakes
        );
        if let PopulationPolicy::Trickle { per_frame } = self.population {
            ensure!(
                per_frame.is_finite() && (0.0..=MAX_SPAWN_PER_FRAME as f32).contains(&per_frame),
                "trickle rate must lie in [0, {MAX_SPAWN_PER_FRAME}], got {per_frame}"
            );
            ensure!(
                self.max_flakes > 0 || per_frame == 0.0,
                "trickle rate {per_frame} with a population cap of zero"
            );
        }
        ensure!(
            self.radius_min > 0.0 && self.radius_min <= self.radius_max,
            "radius band [{}, {}] is empty or non-positive",
            self.radius_min,
            self.radius_max
        );
        ensure!(self.radius_std_dev >= 0.0, "radius spread must be non-negative");
        ensure!(self.gravity >= 0.0, "gravity must be non-negative");
        ensure!(self.base_speed_factor >= 0.0, "base speed must be non-negative");
        ensure!(self.drift_range >= 0.0, "drift range must be non-negative");
        ensure!(self.deposit_factor >= 0.0, "deposit factor must be non-negative");
        ensure!(self.stable_slope >= 0.0, "stable slope must be non-negative");
        ensure!(
            self.diffusion_threshold >= 0.0,
            "diffusion threshold must be non-negative"
        );
        unit_interval("flake opacity", self.flake_opacity)?;
        unit_interval("neighbour share", self.neighbor_share)?;
        unit_interval("diffusion rate", self.diffusion_rate)?;
        // A peak sheds to both sides in one pass, so each side gets at most a quarter.
        ensure!(
            (0.0..=MAX_AVALANCHE_FACTOR).contains(&self.avalanche_factor),
            "avalanche factor must lie in [0, {MAX_AVALANCHE_FACTOR}], got {}",
            self.avalanche_factor
        );
        ensure!(self.mound_height_ratio >= 0.0, "mound height must be non-negative");
        ensure!(self.mound_spread_ratio > 0.0, "mound spread must be positive");
        ensure!(self.mound_noise >= 0.0, "mound noise must be non-negative");
        ensure!(self.silhouette_step > 0, "silhouette step must be positive");
        ensure!(self.grain_size > 0, "grain tile must have a positive size");
        ensure!(
            self.grain_min <= self.grain_max,
            "grain band [{}, {}] is inverted",
            self.grain_min,
            self.grain_max
        );
        ensure!(!self.storage_key.is_empty(), "storage key must not be empty");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SnowpackConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            SnowpackConfig::from_json(r#"{"maxFlakes": 42, "stableSlope": 2.5}"#).unwrap();
        assert_eq!(config.max_flakes, 42);
        assert_eq!(config.stable_slope, 2.5);
        assert_eq!(config.gravity, DEFAULT_GRAVITY);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn population_policy_is_tagged() {
        let config =
            SnowpackConfig::from_json(r#"{"population": {"policy": "replace"}}"#).unwrap();
        assert_eq!(config.population, PopulationPolicy::Replace);

        let config = SnowpackConfig::from_json(
            r#"{"population": {"policy": "trickle", "perFrame": 0.5}, "baseline": "flat"}"#,
        )
        .unwrap();
        assert_eq!(config.population, PopulationPolicy::Trickle { per_frame: 0.5 });
        assert_eq!(config.baseline, Baseline::Flat);
    }

    #[test]
    fn rejects_inverted_bands() {
        let err = SnowpackConfig::from_json(r#"{"radiusMin": 4.0, "radiusMax": 1.0}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("radius band"), "{err}");
        assert!(SnowpackConfig::from_json(r#"{"grainMin": 200, "grainMax": 100}"#).is_err());
    }

    #[test]
    fn rejects_oversized_coefficients() {
        assert!(SnowpackConfig::from_json(r#"{"avalancheFactor": 0.8}"#).is_err());
        assert!(SnowpackConfig::from_json(r#"{"diffusionRate": 1.5}"#).is_err());
        assert!(SnowpackConfig::from_json(r#"{"silhouetteStep": 0}"#).is_err());
    }

    #[test]
    fn rejects_runaway_population() {
        let err = SnowpackConfig::from_json(
            r#"{"population": {"policy": "trickle", "perFrame": 1e9}, "maxFlakes": 50}"#,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("trickle rate"), "{err}");
        assert!(SnowpackConfig::from_json(r#"{"maxFlakes": 1000000000000000000}"#).is_err());
        assert!(SnowpackConfig::from_json(r#"{"maxFlakes": 10000}"#).is_ok());
    }

    #[test]
    fn avalanche_factor_stops_at_a_quarter() {
        assert!(SnowpackConfig::from_json(r#"{"avalancheFactor": 0.25}"#).is_ok());
        assert!(SnowpackConfig::from_json(r#"{"avalancheFactor": 0.5}"#).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(SnowpackConfig::from_json("not json").is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(SnowpackConfig::default()).unwrap();
        assert_eq!(json["maxFlakes"], 500);
        assert_eq!(json["population"]["policy"], "trickle");
        assert_eq!(json["storageKey"], DEFAULT_STORAGE_KEY);
    }
}
