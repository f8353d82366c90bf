/**
 * This module contains all logic for loading models and images from external
 * files and for writing models back out.
 */
use anyhow::Context;

use crate::data_structures::{
    material::Material,
    scene_graph::{ContainerNode, SceneNode, to_scene_node},
};

pub mod export;
pub mod material;
pub mod texture;

pub use texture::load_binary;

/// Load a glTF or GLB asset from the asset directory.
pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<Box<dyn SceneNode>> {
    let data = load_binary(file_name).await?;
    load_model_gltf_from_slice(&data, file_name).await
}

/// Parse glTF JSON or GLB bytes into a scene graph.
///
/// The default scene (or the first one) becomes a group named after
/// `file_name`. External buffers and images are resolved next to
/// `file_name`.
pub async fn load_model_gltf_from_slice(
    data: &[u8],
    file_name: &str,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf = gltf::Gltf::from_slice(data)
        .with_context(|| format!("{} is not a valid glTF asset", file_name))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .with_context(|| format!("{} references a missing binary chunk", file_name))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    anyhow::bail!("{}: embedded data URIs are not supported", file_name);
                }
                let bin = load_binary(&texture::sibling_path(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load materials
    let images = texture::load_images(&gltf, &buffer_data, file_name).await;
    let materials: Vec<Material> = gltf
        .materials()
        .map(|material| material::to_material(&material, &images))
        .collect();

    let mut root = ContainerNode::new(Some(file_name));
    match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                root.add_child(to_scene_node(node, &buffer_data, &materials));
            }
        }
        None => log::warn!("{} contains no scene", file_name),
    }
    log::info!(
        "Loaded {} with {} materials and {} images",
        file_name,
        materials.len(),
        images.len()
    );

    Ok(Box::new(root))
}
