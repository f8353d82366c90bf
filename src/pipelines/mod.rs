//! Render pipelines and their uniforms.
//!
//! - `basic` draws lit or unlit meshes with an optional base colour map
//! - `light` holds the light uniform shared by all pipelines

pub mod basic;
pub mod light;
