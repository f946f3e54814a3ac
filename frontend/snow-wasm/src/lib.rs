//! Snowpack - falling snow that piles up into a drift persisted across visits
//!
//! The simulation core (flakes, ground field, renderer, driver) is plain Rust
//! and runs anywhere; the `web` and `nav` modules bind it to a browser canvas
//! and only exist on `wasm32`.

pub mod config;
pub mod constants;
pub mod flake;
pub mod ground;
pub mod renderer;
pub mod simulation;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub mod nav;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{Baseline, PopulationPolicy, SnowpackConfig};
pub use flake::{Flake, FlakeSet};
pub use ground::GroundField;
pub use renderer::{DrawCall, GrainTile, PathCommand, Point, Recorder, Renderer, Surface};
pub use simulation::{Simulation, TickReport};
pub use storage::{GroundStore, MemoryStore, SnapshotRead};
