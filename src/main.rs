//! Native host.
//!
//! Usage: `tint-ngin [model.glb]`. The model path is resolved against
//! `./assets/`; without an argument the bundled table is loaded.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let mut config = tint_ngin::Config::default();
    if let Some(model_path) = std::env::args().nth(1) {
        config = config.with_model_path(&model_path);
    }
    tint_ngin::run(config)
}

// The browser build starts through `web::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
