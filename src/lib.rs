//! tint-ngin
//!
//! A small cross-platform product configurator built on wgpu and winit. It
//! loads a glTF model, lets the user recolor it or map an uploaded JPEG onto
//! it, and exports the result as a binary glTF file. The same code runs as a
//! native window and inside a browser canvas.
//!
//! High-level modules
//! - `camera`: orbit camera, damped controller and uniforms for view/projection
//! - `config`: start-up settings (model, palette, tiling, camera, lights)
//! - `configurator`: selection state and the actions the UI can trigger
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (colours, materials, meshes, scene graphs)
//! - `flow`: the event loop that ties window, UI and configurator together
//! - `mutator`: material passes that recolor or texture every mesh of a model
//! - `pipelines`: render pipeline and uniforms for lit, textured meshes
//! - `resources`: glTF loading and GLB export
//! - `render`: GPU copies of the scene graph and the draw calls for them
//! - `stage`: the lights surrounding the model
//! - `upload`: validation and decoding of user images
//! - `web`: functions exported to the hosting page (wasm only)
//!

pub mod camera;
pub mod config;
pub mod configurator;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod mutator;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod stage;
pub mod upload;
#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use config::Config;
pub use configurator::{Configurator, SavedDesign};
pub use data_structures::color::Color;
pub use flow::{UiEvent, run};
pub use upload::{Upload, UploadError};
