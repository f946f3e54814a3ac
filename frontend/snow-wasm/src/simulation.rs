//! Per-frame driver
//!
//! `Simulation` owns every piece of snowpack state. Each tick runs in a fixed
//! order: background, population top-up, landing tests with deposition or
//! motion, flake drawing, ground relaxation (and persistence), silhouette.

use rand::Rng;
use tracing::info;

use crate::config::SnowpackConfig;
use crate::flake::{advance, column, landing_test, wrap_x, FlakeSet};
use crate::ground::GroundField;
use crate::renderer::{Renderer, Surface};
use crate::storage::GroundStore;

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: usize,
    pub landed: usize,
    pub live: usize,
    pub relaxed: bool,
}

pub struct Simulation<S: GroundStore, R: Rng> {
    config: SnowpackConfig,
    width: f32,
    height: f32,
    flakes: FlakeSet,
    ground: GroundField,
    renderer: Renderer,
    store: S,
    rng: R,
}

impl<S: GroundStore, R: Rng> Simulation<S, R> {
    pub fn new(config: SnowpackConfig, width: u32, height: u32, store: S, mut rng: R) -> Self {
        let (w, h) = (width as f32, height as f32);
        let ground = GroundField::initialize(width as usize, h, &config, &store, &mut rng);
        let renderer = Renderer::new(w, h, &config, &mut rng);
        info!(
            "Snowpack started at {width}x{height}, up to {} flakes",
            config.max_flakes
        );
        Self {
            flakes: FlakeSet::new(&config),
            config,
            width: w,
            height: h,
            ground,
            renderer,
            store,
            rng,
        }
    }

    pub fn tick<D: Surface + ?Sized>(&mut self, surface: &mut D) -> TickReport {
        let (width, height) = (self.width, self.height);
        self.renderer.begin_frame(surface);

        let spawned = self
            .flakes
            .top_up(&mut self.rng, &self.config, width, height);

        // Walk from the back: retiring swap-removes into already visited slots.
        let mut landed = 0;
        for index in (0..self.flakes.len()).rev() {
            let Some(flake) = self.flakes.get_mut(index) else {
                continue;
            };
            if landing_test(flake, &self.ground, height) {
                let col = column(flake.x, self.ground.len());
                let amount = flake.radius;
                self.ground.deposit(col, amount, &self.config);
                self.flakes
                    .retire(index, &mut self.rng, &self.config, width, height);
                landed += 1;
            } else {
                advance(flake, &self.config, width);
            }
        }
        self.renderer.draw_flakes(surface, self.flakes.as_slice());

        let relaxed = self.ground.relax(&self.config);
        if relaxed {
            self.ground.persist(&self.config, &mut self.store);
        }
        self.renderer.draw_ground_silhouette(surface, &self.ground);

        TickReport {
            spawned,
            landed,
            live: self.flakes.len(),
            relaxed,
        }
    }

    /// Throw away the snowpack and start from a fresh baseline.
    pub fn regenerate(&mut self) {
        self.ground
            .regenerate(self.height, &self.config, &mut self.store, &mut self.rng);
    }

    /// The canvas changed size: rebuild the ground for the new width and the
    /// grain tile, and bring flakes back inside the new width.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
        self.ground.resize(
            width as usize,
            self.height,
            &self.config,
            &mut self.store,
            &mut self.rng,
        );
        self.renderer
            .resize(self.width, self.height, &self.config, &mut self.rng);
        for flake in self.flakes.as_mut_slice() {
            flake.x = wrap_x(flake.x, self.width);
        }
    }

    /// Final save before the page goes away.
    pub fn teardown(&mut self) {
        self.ground.persist(&self.config, &mut self.store);
    }

    pub fn config(&self) -> &SnowpackConfig {
        &self.config
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn ground(&self) -> &GroundField {
        &self.ground
    }

    pub fn flakes(&self) -> &FlakeSet {
        &self.flakes
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
