use cgmath::Vector2;

use crate::data_structures::{
    color::Color,
    material::{Material, Shading, TextureMap, Wrapping},
    texture::TextureImage,
};

impl From<gltf::texture::WrappingMode> for Wrapping {
    fn from(mode: gltf::texture::WrappingMode) -> Self {
        match mode {
            gltf::texture::WrappingMode::Repeat => Wrapping::Repeat,
            gltf::texture::WrappingMode::MirroredRepeat => Wrapping::MirroredRepeat,
            gltf::texture::WrappingMode::ClampToEdge => Wrapping::ClampToEdge,
        }
    }
}

/// Convert a glTF material. `images` is indexed like the document's images.
///
/// Base colour and emissive factors are linear in glTF and stored as sRGB.
/// Alpha is dropped.
pub fn to_material(material: &gltf::Material, images: &[Option<TextureImage>]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let shading = if material.unlit() {
        Shading::Unlit
    } else {
        Shading::Standard
    };

    let mut converted = Material::new(shading);
    converted.name = material.name().map(str::to_string);
    converted.color = Color::from_linear([r, g, b]);
    converted.emissive = Color::from_linear(material.emissive_factor());
    converted.metallic = pbr.metallic_factor();
    converted.roughness = pbr.roughness_factor();
    converted.map = pbr.base_color_texture().and_then(|info| {
        let texture = info.texture();
        let image = images.get(texture.source().index())?.clone()?;
        let sampler = texture.sampler();
        let mut map = TextureMap::new(image);
        map.wrap_s = sampler.wrap_s().into();
        map.wrap_t = sampler.wrap_t().into();
        if let Some(transform) = info.texture_transform() {
            if transform.rotation() != 0.0 {
                log::warn!(
                    "Texture rotation of material {:?} is not supported and will be ignored.",
                    material.name()
                );
            }
            map.repeat = Vector2::from(transform.scale());
            map.offset = Vector2::from(transform.offset());
        }
        Some(map)
    });
    converted
}
