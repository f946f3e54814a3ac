//! Optionally compiles `snow_wasm` to WebAssembly and binds it into
//! `frontend/snow-wasm/pkg/snow_sim.{js,_bg.wasm}` for the server to hand out.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const BUNDLE_NAME: &str = "snow_sim";
const WASM_TARGET: &str = "wasm32-unknown-unknown";

fn run(command: &mut Command, what: &str) -> Result<(), String> {
    let status = command
        .status()
        .map_err(|e| format!("could not start {what}: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("{what} exited with {status}"))
    }
}

fn build_bundle(workspace: &Path, pkg_dir: &Path) -> Result<(), String> {
    let target_dir = env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.join("target"))
        .join("wasm-cache");
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".into());
    run(
        Command::new(cargo)
            .current_dir(workspace)
            .args(["build", "--package", "snow_wasm", "--release", "--target", WASM_TARGET])
            .env("CARGO_TARGET_DIR", &target_dir),
        "cargo build for snow_wasm",
    )?;

    let wasm = target_dir.join(WASM_TARGET).join("release/snow_wasm.wasm");
    if !wasm.is_file() {
        return Err(format!("no wasm artifact at {}", wasm.display()));
    }

    if pkg_dir.exists() {
        fs::remove_dir_all(pkg_dir).map_err(|e| format!("clearing {}: {e}", pkg_dir.display()))?;
    }
    let bindgen = env::var("WASM_BINDGEN").unwrap_or_else(|_| "wasm-bindgen".into());
    run(
        Command::new(bindgen)
            .args(["--target", "web", "--out-name", BUNDLE_NAME, "--out-dir"])
            .arg(pkg_dir)
            .arg(&wasm),
        "wasm-bindgen (install with `cargo install wasm-bindgen-cli` or set WASM_BINDGEN)",
    )
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let workspace = manifest_dir.parent().unwrap_or(&manifest_dir).to_path_buf();
    let snow_crate = workspace.join("frontend/snow-wasm");
    let pkg_dir = snow_crate.join("pkg");

    println!("cargo:rerun-if-changed={}", snow_crate.join("src").display());
    println!("cargo:rerun-if-changed={}", snow_crate.join("Cargo.toml").display());
    println!("cargo:rerun-if-env-changed=SNOW_WASM_BUILD");
    println!("cargo:rerun-if-env-changed=WASM_BINDGEN");

    if env::var_os("SNOW_WASM_BUILD").is_none() {
        let bundled = pkg_dir.join(format!("{BUNDLE_NAME}.js")).is_file()
            && pkg_dir.join(format!("{BUNDLE_NAME}_bg.wasm")).is_file();
        if !bundled {
            println!(
                "cargo:warning=No wasm bundle in {}; set SNOW_WASM_BUILD=1 to build it",
                pkg_dir.display()
            );
        }
        return;
    }

    if let Err(e) = build_bundle(&workspace, &pkg_dir) {
        panic!("building the snow bundle failed: {e}");
    }
}
