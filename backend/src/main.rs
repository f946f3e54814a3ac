#![forbid(unsafe_code)]
use anyhow::Result;
use snowpack_server::{app, load_config, AppState};
use std::env;
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

const DEFAULT_PORT: &str = "3000";
const DEFAULT_FRONTEND_DIR: &str = "frontend/site";
const DEFAULT_WASM_PKG_DIR: &str = "frontend/snow-wasm/pkg";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // .env is optional; the process environment still applies without it
    if dotenvy::dotenv().is_err() {
        info!("No .env file found");
    }

    let frontend_dir = env::var("FRONTEND_DIR").unwrap_or_else(|_| DEFAULT_FRONTEND_DIR.into());
    let pkg_dir = env::var("WASM_PKG_DIR").unwrap_or_else(|_| DEFAULT_WASM_PKG_DIR.into());
    let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.into());
    let config = load_config(env::var("CONFIG_DIR").ok().as_deref());

    info!("Starting server");
    info!("Serving {frontend_dir} with the wasm bundle from {pkg_dir}");

    let app = app(AppState::new(config), &frontend_dir, &pkg_dir);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Listening on port {port}");
    axum::serve(listener, app).await?;
    Ok(())
}
