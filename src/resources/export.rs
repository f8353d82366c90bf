//! GLB export of a scene graph.
//!
//! The export is best effort: node hierarchy, names, transforms, geometry,
//! materials and texture maps are written; lights become plain nodes. Images
//! are re-encoded as PNG and embedded in the binary chunk.
//!
//! The document is built with `gltf::json` and framed with
//! [`gltf::binary::Glb`].

use std::{borrow::Cow, collections::{BTreeMap, HashMap}};

use anyhow::Context;
use gltf::json::{
    self,
    validation::{Checked::Valid, USize64},
};

use crate::data_structures::{
    material::{Material, MaterialId, Shading, TextureMap, Wrapping},
    mesh::MeshData,
    scene_graph::SceneNode,
};

const TEXTURE_TRANSFORM: &str = "KHR_texture_transform";
const MATERIALS_UNLIT: &str = "KHR_materials_unlit";

impl From<Wrapping> for json::texture::WrappingMode {
    fn from(wrapping: Wrapping) -> Self {
        match wrapping {
            Wrapping::Repeat => json::texture::WrappingMode::Repeat,
            Wrapping::MirroredRepeat => json::texture::WrappingMode::MirroredRepeat,
            Wrapping::ClampToEdge => json::texture::WrappingMode::ClampToEdge,
        }
    }
}

fn index<T>(idx: usize) -> json::Index<T> {
    json::Index::new(idx as u32)
}

struct GlbWriter {
    root: json::Root,
    bin: Vec<u8>,
    materials: HashMap<MaterialId, usize>,
    images: HashMap<usize, usize>,
    samplers: HashMap<[Wrapping; 2], usize>,
    textures: HashMap<(usize, usize), usize>,
}

impl GlbWriter {
    fn new() -> Self {
        let mut root = json::Root::default();
        root.asset.generator = Some(concat!("tint-ngin ", env!("CARGO_PKG_VERSION")).to_string());
        Self {
            root,
            bin: Vec::new(),
            materials: HashMap::new(),
            images: HashMap::new(),
            samplers: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    fn use_extension(&mut self, name: &str) {
        if !self.root.extensions_used.iter().any(|used| used == name) {
            self.root.extensions_used.push(name.to_string());
        }
    }

    fn push_view(
        &mut self,
        bytes: &[u8],
        target: Option<json::buffer::Target>,
    ) -> json::Index<json::buffer::View> {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let view = self.root.push(json::buffer::View {
            buffer: index(0),
            byte_length: USize64::from(bytes.len()),
            byte_offset: Some(USize64::from(self.bin.len())),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });
        self.bin.extend_from_slice(bytes);
        view
    }

    fn push_accessor(
        &mut self,
        bytes: &[u8],
        target: json::buffer::Target,
        component_type: json::accessor::ComponentType,
        count: usize,
        kind: json::accessor::Type,
        bounds: Option<([f32; 3], [f32; 3])>,
    ) -> json::Index<json::Accessor> {
        let buffer_view = self.push_view(bytes, Some(target));
        self.root.push(json::Accessor {
            buffer_view: Some(buffer_view),
            byte_offset: None,
            count: USize64::from(count),
            component_type: Valid(json::accessor::GenericComponentType(component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(kind),
            min: bounds.map(|(min, _)| json::Value::from(min.to_vec())),
            max: bounds.map(|(_, max)| json::Value::from(max.to_vec())),
            name: None,
            normalized: false,
            sparse: None,
        })
    }

    fn add_mesh(
        &mut self,
        mesh: &MeshData,
        material: json::Index<json::Material>,
    ) -> Option<json::Index<json::Mesh>> {
        use json::{
            accessor::{ComponentType, Type},
            buffer::Target,
            mesh::Semantic,
        };

        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            log::warn!("Skipping empty mesh {:?} on export", mesh.name);
            return None;
        }
        let count = mesh.vertices.len();
        let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
        let normals: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.normal).collect();
        let tex_coords: Vec<[f32; 2]> = mesh.vertices.iter().map(|v| v.tex_coords).collect();

        let mut attributes = BTreeMap::new();
        let position = self.push_accessor(
            bytemuck::cast_slice(&positions),
            Target::ArrayBuffer,
            ComponentType::F32,
            count,
            Type::Vec3,
            mesh.bounds(),
        );
        attributes.insert(Valid(Semantic::Positions), position);
        let normal = self.push_accessor(
            bytemuck::cast_slice(&normals),
            Target::ArrayBuffer,
            ComponentType::F32,
            count,
            Type::Vec3,
            None,
        );
        attributes.insert(Valid(Semantic::Normals), normal);
        let uv = self.push_accessor(
            bytemuck::cast_slice(&tex_coords),
            Target::ArrayBuffer,
            ComponentType::F32,
            count,
            Type::Vec2,
            None,
        );
        attributes.insert(Valid(Semantic::TexCoords(0)), uv);
        let indices = self.push_accessor(
            bytemuck::cast_slice(&mesh.indices),
            Target::ElementArrayBuffer,
            ComponentType::U32,
            mesh.indices.len(),
            Type::Scalar,
            None,
        );

        Some(self.root.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(mesh.name.clone()),
            primitives: vec![json::mesh::Primitive {
                attributes,
                extensions: Default::default(),
                extras: Default::default(),
                indices: Some(indices),
                material: Some(material),
                mode: Valid(json::mesh::Mode::Triangles),
                targets: None,
            }],
            weights: None,
        }))
    }

    fn add_texture(&mut self, map: &TextureMap) -> anyhow::Result<json::texture::Info> {
        let image = match self.images.get(&map.image.key()) {
            Some(&idx) => idx,
            None => {
                let png = map.image.to_png()?;
                let buffer_view = self.push_view(&png, None);
                let idx = self
                    .root
                    .push(json::Image {
                        buffer_view: Some(buffer_view),
                        mime_type: Some(json::image::MimeType("image/png".to_string())),
                        name: Some(map.image.label().to_string()),
                        uri: None,
                        extensions: Default::default(),
                        extras: Default::default(),
                    })
                    .value();
                self.images.insert(map.image.key(), idx);
                idx
            }
        };
        let wrapping = map.wrapping();
        let sampler = match self.samplers.get(&wrapping) {
            Some(&idx) => idx,
            None => {
                let idx = self
                    .root
                    .push(json::texture::Sampler {
                        mag_filter: Some(Valid(json::texture::MagFilter::Linear)),
                        min_filter: Some(Valid(json::texture::MinFilter::Linear)),
                        wrap_s: Valid(map.wrap_s.into()),
                        wrap_t: Valid(map.wrap_t.into()),
                        name: None,
                        extensions: Default::default(),
                        extras: Default::default(),
                    })
                    .value();
                self.samplers.insert(wrapping, idx);
                idx
            }
        };
        let texture = match self.textures.get(&(image, sampler)) {
            Some(&idx) => idx,
            None => {
                let idx = self
                    .root
                    .push(json::Texture {
                        name: None,
                        sampler: Some(index(sampler)),
                        source: index(image),
                        extensions: Default::default(),
                        extras: Default::default(),
                    })
                    .value();
                self.textures.insert((image, sampler), idx);
                idx
            }
        };

        let (scale, offset) = map.uv_scale_offset();
        let extensions = if scale != cgmath::Vector2::new(1.0, 1.0)
            || offset != cgmath::Vector2::new(0.0, 0.0)
        {
            self.use_extension(TEXTURE_TRANSFORM);
            Some(json::extensions::texture::Info {
                texture_transform: Some(json::extensions::texture::TextureTransform {
                    offset: json::extensions::texture::TextureTransformOffset(offset.into()),
                    rotation: json::extensions::texture::TextureTransformRotation(0.0),
                    scale: json::extensions::texture::TextureTransformScale(scale.into()),
                    tex_coord: None,
                    extras: Default::default(),
                }),
                ..Default::default()
            })
        } else {
            None
        };
        Ok(json::texture::Info {
            index: index(texture),
            tex_coord: 0,
            extensions,
            extras: Default::default(),
        })
    }

    fn add_material(&mut self, material: &Material) -> anyhow::Result<json::Index<json::Material>> {
        if let Some(&idx) = self.materials.get(&material.id()) {
            return Ok(index(idx));
        }
        let base_color_texture = match &material.map {
            Some(map) => Some(self.add_texture(map)?),
            None => None,
        };
        let extensions = if material.shading == Shading::Unlit {
            self.use_extension(MATERIALS_UNLIT);
            Some(json::extensions::material::Material {
                unlit: Some(json::extensions::material::Unlit {}),
                ..Default::default()
            })
        } else {
            None
        };
        let [r, g, b] = material.color.to_linear();
        let converted = self.root.push(json::Material {
            name: material.name.clone(),
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor([r, g, b, 1.0]),
                base_color_texture,
                metallic_factor: json::material::StrengthFactor(material.metallic),
                roughness_factor: json::material::StrengthFactor(material.roughness),
                ..Default::default()
            },
            emissive_factor: json::material::EmissiveFactor(material.emissive.to_linear()),
            extensions,
            ..Default::default()
        });
        self.materials.insert(material.id(), converted.value());
        Ok(converted)
    }

    fn add_node(&mut self, node: &dyn SceneNode) -> anyhow::Result<json::Index<json::Node>> {
        let transform = node.get_local_transform();
        let mut mesh = None;
        if let (Some(data), Some(material)) = (node.get_mesh(), node.get_material()) {
            let material = self.add_material(material)?;
            mesh = self.add_mesh(data, material);
        }
        Ok(self.root.push(json::Node {
            name: node.name().map(str::to_string),
            mesh,
            translation: (transform.position != cgmath::Vector3::new(0.0, 0.0, 0.0))
                .then(|| transform.position.into()),
            rotation: (transform.rotation != cgmath::Quaternion::new(1.0, 0.0, 0.0, 0.0))
                .then(|| json::scene::UnitQuaternion(transform.rotation_xyzw())),
            scale: (transform.scale != cgmath::Vector3::new(1.0, 1.0, 1.0))
                .then(|| transform.scale.into()),
            ..Default::default()
        }))
    }

    fn finish(mut self) -> anyhow::Result<Vec<u8>> {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        if !self.bin.is_empty() {
            self.root.push(json::Buffer {
                byte_length: USize64::from(self.bin.len()),
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                uri: None,
            });
        }
        let json = json::serialize::to_vec(&self.root).context("Failed to serialize glTF JSON")?;
        let padded = |len: usize| len.div_ceil(4) * 4;
        let mut length = 12 + 8 + padded(json.len());
        if !self.bin.is_empty() {
            length += 8 + self.bin.len();
        }
        let glb = gltf::binary::Glb {
            header: gltf::binary::Header {
                magic: *b"glTF",
                version: 2,
                length: u32::try_from(length).context("Model is too large for GLB")?,
            },
            json: Cow::Owned(json),
            bin: (!self.bin.is_empty()).then_some(Cow::Owned(self.bin)),
        };
        glb.to_vec().context("Failed to write GLB container")
    }
}

/// Serialize `root` and everything below it into a GLB file.
pub fn export_glb(root: &dyn SceneNode) -> anyhow::Result<Vec<u8>> {
    let mut writer = GlbWriter::new();
    let mut stack: Vec<(&dyn SceneNode, Option<json::Index<json::Node>>)> = vec![(root, None)];
    while let Some((node, parent)) = stack.pop() {
        let idx = writer.add_node(node)?;
        match parent {
            Some(parent) => writer.root.nodes[parent.value()]
                .children
                .get_or_insert_with(Vec::new)
                .push(idx),
            None => {
                let scene = writer.root.push(json::Scene {
                    extensions: Default::default(),
                    extras: Default::default(),
                    name: None,
                    nodes: vec![idx],
                });
                writer.root.scene = Some(scene);
            }
        }
        for child in node.get_children().iter().rev() {
            stack.push((child.as_ref(), Some(idx)));
        }
    }
    log::info!(
        "Exported {} nodes, {} meshes and {} materials",
        writer.root.nodes.len(),
        writer.root.meshes.len(),
        writer.root.materials.len()
    );
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::scene_graph::ContainerNode;

    #[test]
    fn empty_graph_is_a_valid_glb_without_binary_chunk() {
        let root = ContainerNode::new(Some("empty"));
        let glb = export_glb(&root).unwrap();
        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);
        let parsed = gltf::Gltf::from_slice(&glb).unwrap();
        assert!(parsed.blob.is_none());
        assert_eq!(parsed.nodes().count(), 1);
        assert_eq!(parsed.default_scene().map(|scene| scene.index()), Some(0));
    }

    #[test]
    fn unlit_materials_keep_their_shading() {
        use crate::data_structures::{
            mesh::{MeshData, ModelVertex},
            scene_graph::MeshNode,
        };

        let vertex = |x: f32| ModelVertex {
            position: [x, 0.0, 0.0],
            ..Default::default()
        };
        let vertices = vec![vertex(0.0), vertex(1.0), vertex(2.0)];
        let mesh = MeshData::new("strip", vertices, vec![0, 1, 2]);
        let root = MeshNode::new(Some("badge"), mesh, Material::new(Shading::Unlit));
        let glb = export_glb(&root).unwrap();

        let parsed = gltf::Gltf::from_slice(&glb).unwrap();
        assert!(String::from_utf8_lossy(&glb).contains(MATERIALS_UNLIT));
        let material = parsed.materials().next().unwrap();
        assert!(material.unlit());
        let accessor = parsed.accessors().next().unwrap();
        assert_eq!(accessor.count(), 3);
        assert_eq!(parsed.blob.as_ref().map(|blob| blob.len() % 4), Some(0));
    }
}
