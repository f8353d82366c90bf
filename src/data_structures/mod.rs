//! Engine data structures: colours, materials, meshes, lights, textures and scene graphs.
//!
//! Everything in here is CPU-side and can be built and inspected without a GPU:
//!
//! - `color` is the sRGB colour type used by materials and lights
//! - `material` holds surface descriptions and texture sampling parameters
//! - `mesh` contains triangle geometry and its vertex layout
//! - `texture` holds decoded images and their GPU counterparts
//! - `instance` holds per-node transformations
//! - `light` describes light sources placed in a graph
//! - `scene_graph` enables hierarchical scene organization

pub mod color;
pub mod instance;
pub mod light;
pub mod material;
pub mod mesh;
pub mod scene_graph;
pub mod texture;
