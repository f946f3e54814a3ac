//! Server for the snowpack site: the static pages, the wasm bundle and the
//! simulation tuning the page fetches before it starts.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use snow_wasm::SnowpackConfig;
use tower_http::services::ServeDir;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, timeout::TimeoutLayer,
};
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "snowpack.json";

#[derive(Clone, Default)]
pub struct AppState {
    pub config: Arc<SnowpackConfig>,
}

impl AppState {
    pub fn new(config: SnowpackConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

fn read_config(path: &Path) -> Result<SnowpackConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    SnowpackConfig::from_json(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Load `snowpack.json` from `config_dir`. A missing directory or file means
/// the built-in defaults; a broken file is logged and also falls back.
pub fn load_config(config_dir: Option<&str>) -> SnowpackConfig {
    let Some(dir) = config_dir else {
        info!("No CONFIG_DIR set, using default snowpack tuning");
        return SnowpackConfig::default();
    };
    let path = Path::new(dir).join(CONFIG_FILE);
    if !path.exists() {
        info!("{} does not exist, using default snowpack tuning", path.display());
        return SnowpackConfig::default();
    }
    info!("Loading snowpack tuning from: {}", path.display());
    match read_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Falling back to default snowpack tuning: {e:#}");
            SnowpackConfig::default()
        }
    }
}

async fn handle_config(State(state): State<AppState>) -> Json<SnowpackConfig> {
    Json(state.config.as_ref().clone())
}

async fn handle_health() -> &'static str {
    "ok"
}

fn snowpack_api(state: AppState) -> Router {
    Router::new()
        .route("/config", get(handle_config))
        .with_state(state)
}

pub fn app(state: AppState, frontend_dir: &str, pkg_dir: &str) -> Router {
    let middleware = tower::ServiceBuilder::new()
        .layer(CompressionLayer::new().quality(tower_http::CompressionLevel::Fastest))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CatchPanicLayer::new());

    Router::new()
        .nest("/api/snowpack", snowpack_api(state))
        .route("/healthz", get(handle_health))
        .nest_service("/pkg", ServeDir::new(pkg_dir))
        .fallback_service(ServeDir::new(frontend_dir))
        .layer(middleware)
}
