use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Models and textures live in ./assets/ and are copied next to the build
// output so the native host finds them without a checkout.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        println!(
            "cargo:warning=no assets/ directory, the default model has to be provided at runtime"
        );
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::new()
    };
    copy_items(&[assets], out_dir, &options)
        .context("Could not copy assets to the build directory")?;
    Ok(())
}
