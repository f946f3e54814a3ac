//! Browser bindings: canvas surface, localStorage, console logging and the
//! `requestAnimationFrame` loop.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::io;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{
    console, CanvasPattern, CanvasRenderingContext2d, Document, HtmlCanvasElement, ImageData,
    Storage, Window,
};

use crate::config::SnowpackConfig;
use crate::renderer::{GrainTile, PathCommand, Surface};
use crate::simulation::Simulation;
use crate::storage::GroundStore;

const REGENERATE_BUTTON_ID: &str = "reset_snowpack";
const FALLBACK_GROUND_FILL: &str = "#eee";

fn js_error(context: &str, value: JsValue) -> anyhow::Error {
    anyhow!("{context}: {value:?}")
}

/// Line-buffered writer onto the devtools console.
#[derive(Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let line = String::from_utf8_lossy(&self.buf);
            console::log_1(&line.trim_end().into());
            self.buf.clear();
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

/// Route `tracing` output to the console. There is no clock on
/// `wasm32-unknown-unknown`, so timestamps are off.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::default)
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

pub struct LocalStorageStore {
    storage: Option<Storage>,
}

impl LocalStorageStore {
    pub fn open(window: &Window) -> Self {
        let storage = window.local_storage().ok().flatten();
        if storage.is_none() {
            warn!("localStorage is unavailable; the snowpack will not persist");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| anyhow!("localStorage is unavailable"))
    }
}

impl GroundStore for LocalStorageStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| js_error("reading localStorage", e))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| js_error("writing localStorage", e))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| js_error("clearing localStorage", e))
    }
}

pub struct CanvasSurface {
    document: Document,
    ctx: CanvasRenderingContext2d,
    grain: Option<CanvasPattern>,
}

impl CanvasSurface {
    pub fn new(document: Document, canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("2D canvas is not supported")?
            .dyn_into()?;
        Ok(Self {
            document,
            ctx,
            grain: None,
        })
    }

    fn trace(&self, path: &[PathCommand]) {
        self.ctx.begin_path();
        for command in path {
            match *command {
                PathCommand::MoveTo(p) => self.ctx.move_to(p.x as f64, p.y as f64),
                PathCommand::LineTo(p) => self.ctx.line_to(p.x as f64, p.y as f64),
                PathCommand::CubicTo { c1, c2, to } => self.ctx.bezier_curve_to(
                    c1.x as f64,
                    c1.y as f64,
                    c2.x as f64,
                    c2.y as f64,
                    to.x as f64,
                    to.y as f64,
                ),
                PathCommand::Close => self.ctx.close_path(),
            }
        }
    }

    fn build_pattern(&self, tile: &GrainTile) -> Result<CanvasPattern, JsValue> {
        let off: HtmlCanvasElement = self.document.create_element("canvas")?.dyn_into()?;
        off.set_width(tile.size());
        off.set_height(tile.size());
        let off_ctx: CanvasRenderingContext2d = off
            .get_context("2d")?
            .ok_or("2D canvas is not supported")?
            .dyn_into()?;
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(tile.rgba()),
            tile.size(),
            tile.size(),
        )?;
        off_ctx.put_image_data(&image, 0.0, 0.0)?;
        self.ctx
            .create_pattern_with_html_canvas_element(&off, "repeat")?
            .ok_or_else(|| "Failed to create grain pattern".into())
    }
}

impl Surface for CanvasSurface {
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx
            .fill_rect(x as f64, y as f64, width as f64, height as f64);
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, opacity: f32) {
        self.ctx.begin_path();
        if self
            .ctx
            .arc(x as f64, y as f64, radius as f64, 0.0, TAU)
            .is_err()
        {
            return;
        }
        self.ctx.set_global_alpha(opacity as f64);
        self.ctx.set_fill_style_str("#fff");
        self.ctx.fill();
        self.ctx.set_global_alpha(1.0);
    }

    fn install_grain(&mut self, tile: &GrainTile) {
        match self.build_pattern(tile) {
            Ok(pattern) => self.grain = Some(pattern),
            Err(e) => {
                warn!("Grain texture unavailable: {e:?}");
                self.grain = None;
            }
        }
    }

    fn fill_path_with_grain(&mut self, path: &[PathCommand]) {
        self.trace(path);
        match &self.grain {
            Some(pattern) => self.ctx.set_fill_style_canvas_pattern(pattern),
            None => self.ctx.set_fill_style_str(FALLBACK_GROUND_FILL),
        }
        self.ctx.fill();
    }

    fn stroke_path(&mut self, path: &[PathCommand], color: &str, line_width: f32) {
        self.trace(path);
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(line_width as f64);
        self.ctx.stroke();
    }
}

fn window_size(window: &Window) -> (u32, u32) {
    let dim = |v: Result<JsValue, JsValue>| {
        v.ok()
            .and_then(|v| v.as_f64())
            .map(|v| v.max(0.0) as u32)
            .unwrap_or(0)
    };
    (dim(window.inner_width()), dim(window.inner_height()))
}

fn request_animation_frame(window: &Window, callback: &Closure<dyn FnMut()>) {
    if let Err(e) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        warn!("requestAnimationFrame failed: {e:?}");
    }
}

fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut() + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut()>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

struct Scene {
    canvas: HtmlCanvasElement,
    surface: CanvasSurface,
    sim: Simulation<LocalStorageStore, SmallRng>,
}

impl Scene {
    fn fit_to_window(&mut self, window: &Window) {
        let (width, height) = window_size(window);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.sim.resize(width, height);
    }
}

/// The snowfall running on one canvas.
#[wasm_bindgen]
pub struct SnowScene {
    window: Window,
    inner: Rc<RefCell<Scene>>,
}

#[wasm_bindgen]
impl SnowScene {
    /// Attach to `canvas_id`. `config_json` is an optional, possibly partial
    /// [`SnowpackConfig`] document; invalid tuning falls back to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, config_json: Option<String>) -> Result<SnowScene, JsValue> {
        let config = match config_json.as_deref().map(SnowpackConfig::from_json) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                warn!("Ignoring snowpack config: {e:#}");
                SnowpackConfig::default()
            }
            None => SnowpackConfig::default(),
        };

        let window = web_sys::window().ok_or("Failed to get window")?;
        let document = window.document().ok_or("Failed to get document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into()?;

        let (width, height) = window_size(&window);
        canvas.set_width(width);
        canvas.set_height(height);

        let surface = CanvasSurface::new(document, &canvas)?;
        let store = LocalStorageStore::open(&window);
        let rng = SmallRng::seed_from_u64((js_sys::Math::random() * u64::MAX as f64) as u64);
        let sim = Simulation::new(config, width, height, store, rng);

        Ok(SnowScene {
            window,
            inner: Rc::new(RefCell::new(Scene {
                canvas,
                surface,
                sim,
            })),
        })
    }

    /// Hook up resize, teardown and the regenerate button, then start the frame loop.
    pub fn start(&self) -> Result<(), JsValue> {
        let target: &web_sys::EventTarget = self.window.as_ref();

        let (scene, window) = (self.inner.clone(), self.window.clone());
        listen(target, "resize", move || {
            if let Ok(mut scene) = scene.try_borrow_mut() {
                scene.fit_to_window(&window);
            }
        })?;

        let scene = self.inner.clone();
        listen(target, "pagehide", move || {
            if let Ok(mut scene) = scene.try_borrow_mut() {
                scene.sim.teardown();
            }
        })?;

        let document = self.window.document().ok_or("Failed to get document")?;
        match document.get_element_by_id(REGENERATE_BUTTON_ID) {
            Some(button) => {
                let scene = self.inner.clone();
                listen(button.as_ref(), "click", move || {
                    if let Ok(mut scene) = scene.try_borrow_mut() {
                        scene.sim.regenerate();
                    }
                })?;
            }
            None => info!("No #{REGENERATE_BUTTON_ID} button; regenerate is script-only"),
        }

        let frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let next = frame.clone();
        let (scene, window) = (self.inner.clone(), self.window.clone());
        *frame.borrow_mut() = Some(Closure::new(move || {
            {
                let mut scene = scene.borrow_mut();
                let Scene { surface, sim, .. } = &mut *scene;
                sim.tick(surface);
            }
            if let Some(callback) = next.borrow().as_ref() {
                request_animation_frame(&window, callback);
            }
        }));
        if let Some(callback) = frame.borrow().as_ref() {
            request_animation_frame(&self.window, callback);
        }
        Ok(())
    }

    pub fn regenerate(&self) {
        self.inner.borrow_mut().sim.regenerate();
    }

    pub fn resize(&self) {
        self.inner.borrow_mut().fit_to_window(&self.window);
    }

    pub fn teardown(&self) {
        self.inner.borrow_mut().sim.teardown();
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    init_logging();
    info!("[Snowpack] WASM loaded");
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
