use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use snow_wasm::{PopulationPolicy, SnowpackConfig};
use snowpack_server::{app, load_config, AppState, CONFIG_FILE};
use std::path::PathBuf;
use tower::ServiceExt;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("snowpack-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn config_endpoint_serves_the_loaded_tuning() {
    let config = SnowpackConfig {
        max_flakes: 120,
        population: PopulationPolicy::Replace,
        ..SnowpackConfig::default()
    };
    let router = app(AppState::new(config.clone()), "/nonexistent", "/nonexistent");

    let (status, body) = get(router, "/api/snowpack/config").await;
    assert_eq!(status, StatusCode::OK);
    let served = SnowpackConfig::from_json(&body).unwrap();
    assert_eq!(served, config);
    assert!(body.contains("\"maxFlakes\":120"));
}

#[tokio::test]
async fn healthz_answers_ok() {
    let router = app(AppState::default(), "/nonexistent", "/nonexistent");
    let (status, body) = get(router, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn static_files_and_wasm_bundle_are_served() {
    let site = scratch_dir("site");
    let pkg = scratch_dir("pkg");
    std::fs::write(site.join("index.html"), "<canvas id=\"snow\"></canvas>").unwrap();
    std::fs::write(pkg.join("snow_sim.js"), "export default function init() {}").unwrap();

    let router = app(
        AppState::default(),
        site.to_str().unwrap(),
        pkg.to_str().unwrap(),
    );
    let (status, body) = get(router.clone(), "/index.html").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("canvas"));

    let (status, body) = get(router.clone(), "/pkg/snow_sim.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("init"));

    let (status, _) = get(router, "/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn load_config_reads_partial_files_and_falls_back() {
    assert_eq!(load_config(None), SnowpackConfig::default());

    let empty = scratch_dir("empty-config");
    assert_eq!(load_config(empty.to_str()), SnowpackConfig::default());

    let partial = scratch_dir("partial-config");
    std::fs::write(
        partial.join(CONFIG_FILE),
        r#"{"maxFlakes": 42, "stableSlope": 2.5}"#,
    )
    .unwrap();
    let config = load_config(partial.to_str());
    assert_eq!(config.max_flakes, 42);
    assert_eq!(config.stable_slope, 2.5);
    assert_eq!(config.gravity, SnowpackConfig::default().gravity);

    let broken = scratch_dir("broken-config");
    std::fs::write(broken.join(CONFIG_FILE), r#"{"maxFlakes": "#).unwrap();
    assert_eq!(load_config(broken.to_str()), SnowpackConfig::default());
}
