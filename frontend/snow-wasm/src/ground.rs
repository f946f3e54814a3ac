//! Ground field: accumulated snow height per pixel column
//!
//! Landed flakes deposit into the field; relaxation then diffuses sharp spikes
//! and lets over-steep slopes avalanche into their neighbours. Both steps move
//! height between adjacent columns only; the one exception is pinning the two
//! edge columns to their inner neighbours at the end of a pass.

use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::config::{Baseline, SnowpackConfig};
use crate::storage::{decode_snapshot, encode_snapshot, GroundStore, SnapshotRead};

#[derive(Clone, Debug, PartialEq)]
pub struct GroundField {
    samples: Vec<f32>,
    dirty: bool,
}

impl GroundField {
    pub fn flat(width: usize) -> Self {
        Self::from_samples(vec![0.0; width])
    }

    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self {
            samples,
            dirty: false,
        }
    }

    /// Build a baseline ground of `width` columns: either flat, or a Gaussian
    /// mound with a little noise so the first frame isn't a bare line.
    pub fn synthesize<R: Rng + ?Sized>(
        width: usize,
        height: f32,
        config: &SnowpackConfig,
        rng: &mut R,
    ) -> Self {
        match config.baseline {
            Baseline::Flat => Self::flat(width),
            Baseline::Mound => {
                let peak = height.max(0.0) * config.mound_height_ratio;
                let center = width as f32 / 2.0;
                let spread = (width as f32 * config.mound_spread_ratio).max(f32::EPSILON);
                let samples = (0..width)
                    .map(|x| {
                        let d = x as f32 - center;
                        let base = peak * (-(d * d) / (2.0 * spread * spread)).exp();
                        base + rng.gen::<f32>() * config.mound_noise
                    })
                    .collect();
                Self::from_samples(samples)
            }
        }
    }

    /// Reload the stored snapshot when it matches `width`, otherwise synthesize.
    /// Storage trouble is logged and treated like a missing snapshot.
    pub fn initialize<S: GroundStore + ?Sized, R: Rng + ?Sized>(
        width: usize,
        height: f32,
        config: &SnowpackConfig,
        store: &S,
        rng: &mut R,
    ) -> Self {
        match store.load(&config.storage_key) {
            Ok(Some(text)) => match decode_snapshot(&text, width) {
                SnapshotRead::Accepted(samples) => {
                    debug!("Restored ground snapshot ({width} columns)");
                    return Self::from_samples(samples);
                }
                SnapshotRead::LengthMismatch { expected, found } => {
                    debug!("Stored ground has {found} columns, canvas has {expected}; regenerating");
                }
                SnapshotRead::Unparsable(reason) => {
                    warn!("Error loading ground data: {reason}");
                }
            },
            Ok(None) => debug!("No stored ground, generating a fresh one"),
            Err(e) => warn!("Error loading ground data: {e:#}"),
        }
        Self::synthesize(width, height, config, rng)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Total snow held by the field.
    pub fn total(&self) -> f64 {
        self.samples.iter().map(|&h| h as f64).sum()
    }

    /// Height at `column`; out-of-range queries read the nearest edge.
    pub fn height_at(&self, column: usize) -> f32 {
        match self.samples.len() {
            0 => 0.0,
            len => self.samples[column.min(len - 1)],
        }
    }

    /// Add `amount` at `column` and a share of it to each neighbour.
    /// Columns outside the field are ignored.
    pub fn deposit(&mut self, column: usize, amount: f32, config: &SnowpackConfig) {
        let len = self.samples.len();
        if column >= len {
            return;
        }
        let amount = amount * config.deposit_factor;
        let share = amount * config.neighbor_share;
        self.samples[column] += amount;
        if column > 0 {
            self.samples[column - 1] += share;
        }
        if column + 1 < len {
            self.samples[column + 1] += share;
        }
        self.dirty = true;
    }

    /// Diffuse, avalanche and pin the edges, if anything was deposited since the
    /// last call. Returns whether a pass ran.
    pub fn relax(&mut self, config: &SnowpackConfig) -> bool {
        if !self.dirty {
            return false;
        }
        self.smooth(config);
        let mut passes = 0;
        while passes < config.max_avalanche_passes && self.avalanche_pass(config) {
            passes += 1;
        }
        trace!("Relaxed ground with {passes} avalanche passes");
        self.pin_edges();
        if config.clamp_non_negative {
            for h in &mut self.samples {
                *h = h.max(0.0);
            }
        }
        self.dirty = false;
        true
    }

    /// Mild diffusion. Each adjacent pair whose difference exceeds the
    /// threshold exchanges `rate / 2` of that difference, which blends every
    /// interior sample toward the mean of its neighbours.
    pub fn smooth(&mut self, config: &SnowpackConfig) {
        if self.samples.len() < 2 || config.diffusion_rate <= 0.0 {
            return;
        }
        let before = self.samples.clone();
        for (i, pair) in before.windows(2).enumerate() {
            let diff = pair[0] - pair[1];
            if diff.abs() > config.diffusion_threshold {
                let flux = diff * config.diffusion_rate * 0.5;
                self.samples[i] -= flux;
                self.samples[i + 1] += flux;
            }
        }
    }

    /// Move part of the excess across every pair steeper than the stable slope.
    /// Transfers are computed from the field as it was at the start of the pass.
    /// Returns whether anything moved.
    pub fn avalanche_pass(&mut self, config: &SnowpackConfig) -> bool {
        if self.samples.len() < 2 {
            return false;
        }
        let before = self.samples.clone();
        let mut changed = false;
        for (i, pair) in before.windows(2).enumerate() {
            let diff = pair[0] - pair[1];
            let excess = diff.abs() - config.stable_slope;
            if excess > 0.0 {
                let transfer = excess * config.avalanche_factor * diff.signum();
                self.samples[i] -= transfer;
                self.samples[i + 1] += transfer;
                changed = true;
            }
        }
        changed
    }

    fn pin_edges(&mut self) {
        let len = self.samples.len();
        if len < 3 {
            return;
        }
        self.samples[0] = self.samples[1];
        self.samples[len - 1] = self.samples[len - 2];
    }

    /// Write the samples under the configured key. Failures are logged and
    /// the in-memory field stays authoritative.
    pub fn persist<S: GroundStore + ?Sized>(&self, config: &SnowpackConfig, store: &mut S) -> bool {
        let written = encode_snapshot(&self.samples)
            .and_then(|json| store.save(&config.storage_key, &json));
        match written {
            Ok(()) => true,
            Err(e) => {
                warn!("Ground storage failed: {e:#}");
                false
            }
        }
    }

    /// Drop the stored snapshot and start over from a fresh baseline.
    pub fn regenerate<S: GroundStore + ?Sized, R: Rng + ?Sized>(
        &mut self,
        height: f32,
        config: &SnowpackConfig,
        store: &mut S,
        rng: &mut R,
    ) {
        info!("Regenerating ground ({} columns)", self.samples.len());
        if let Err(e) = store.remove(&config.storage_key) {
            warn!("Could not clear stored ground: {e:#}");
        }
        *self = Self::synthesize(self.samples.len(), height, config, rng);
        self.persist(config, store);
    }

    /// Reinitialize for a new width. Old samples are never stretched onto the
    /// new width: a compatible snapshot is reloaded or the baseline rebuilt.
    pub fn resize<S: GroundStore + ?Sized, R: Rng + ?Sized>(
        &mut self,
        width: usize,
        height: f32,
        config: &SnowpackConfig,
        store: &mut S,
        rng: &mut R,
    ) {
        info!("Resizing ground from {} to {width} columns", self.samples.len());
        *self = Self::initialize(width, height, config, &*store, rng);
        self.persist(config, store);
    }
}
