//! Material rewriting over a model's mesh graph.
//!
//! The mutator never owns the model. Callers lend the root for the duration of
//! one pass; a missing root turns every pass into a no-op. Only nodes of kind
//! [`NodeKind::Mesh`] are touched, groups and lights are walked through.
//!
//! The last action wins: a colour pass drops any texture map, a texture pass
//! swaps in fresh materials and forgets whatever was there before.

use crate::data_structures::{
    color::Color,
    material::{Material, TextureMap, Tiling},
    scene_graph::{NodeKind, SceneNode, visit_mut},
    texture::TextureImage,
};

/// What the user currently has selected.
#[derive(Clone, Debug)]
pub struct Selection {
    pub color: Color,
    pub texture: Option<TextureImage>,
}

impl Selection {
    pub const DEFAULT_COLOR: Color = Color::from_u32(0x4a4a4a);

    pub fn new(color: Color) -> Self {
        Self {
            color,
            texture: None,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COLOR)
    }
}

/// Paint every mesh below `model_root` in `color`.
///
/// Base colour and emissive tint are both set, the texture map is cleared.
/// The materials are edited in place and keep their ids.
pub fn apply_color(model_root: Option<&mut Box<dyn SceneNode>>, color: Color) {
    let Some(root) = model_root else {
        return;
    };
    let mut meshes = 0;
    visit_mut(root, |node| {
        if node.kind() != NodeKind::Mesh {
            return;
        }
        if let Some(material) = node.get_material_mut() {
            material.color = color;
            material.emissive = color;
            material.map = None;
            meshes += 1;
        }
    });
    log::debug!("Applied colour {} to {} meshes", color, meshes);
}

/// Replace the material of every mesh below `model_root` with a new
/// standard material showing `texture` tiled according to `tiling`,
/// tinted with `tint`.
pub fn apply_texture(
    model_root: Option<&mut Box<dyn SceneNode>>,
    texture: &TextureImage,
    tint: Color,
    tiling: &Tiling,
) {
    let Some(root) = model_root else {
        return;
    };
    let mut meshes = 0;
    visit_mut(root, |node| {
        if node.kind() != NodeKind::Mesh {
            return;
        }
        let map = TextureMap::tiled(texture.clone(), tiling);
        if node.set_material(Material::textured(map, tint)).is_some() {
            meshes += 1;
        }
    });
    log::debug!(
        "Applied texture {} ({}x{}) to {} meshes",
        texture.label(),
        texture.width(),
        texture.height(),
        meshes
    );
}

/// Bring a freshly attached model in line with `selection`.
pub fn apply_selection(
    mut model_root: Option<&mut Box<dyn SceneNode>>,
    selection: &Selection,
    tiling: &Tiling,
) {
    apply_color(model_root.as_deref_mut(), selection.color);
    if let Some(texture) = &selection.texture {
        apply_texture(model_root, texture, selection.color, tiling);
    }
}
