use std::io::Cursor;

use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use image::{DynamicImage, ImageFormat, RgbImage};
use tint_ngin::data_structures::{
    color::Color,
    instance::Instance,
    light::Light,
    material::Material,
    mesh::{MeshData, ModelVertex},
    scene_graph::{ContainerNode, LightNode, MeshNode, NodeKind, SceneNode, visit},
};

pub const WOOD: Color = Color::from_u32(0x8b5a2b);

/// A unit quad in the xz plane, facing up.
pub fn quad(name: &str) -> MeshData {
    let vertex = |x: f32, z: f32, u: f32, v: f32| ModelVertex {
        position: [x, 0.0, z],
        tex_coords: [u, v],
        normal: [0.0, 1.0, 0.0],
    };
    MeshData::new(
        name,
        vec![
            vertex(-0.5, -0.5, 0.0, 0.0),
            vertex(0.5, -0.5, 1.0, 0.0),
            vertex(0.5, 0.5, 1.0, 1.0),
            vertex(-0.5, 0.5, 0.0, 1.0),
        ],
        vec![0, 2, 1, 0, 3, 2],
    )
}

fn wood(name: &str) -> Material {
    Material::standard().with_name(name).with_color(WOOD)
}

fn chair(name: &str, x: f32, turn: f32) -> Box<dyn SceneNode> {
    let transform = Instance {
        position: Vector3::new(x, 0.0, 0.0),
        rotation: Quaternion::from_angle_y(Deg(turn)),
        scale: Vector3::new(1.0, 1.0, 1.0),
    };
    Box::new(
        ContainerNode::new(Some(name))
            .with_transform(transform)
            .with_child(Box::new(MeshNode::new(
                Some(&format!("{}_seat", name)),
                quad("seat"),
                wood("chair_wood"),
            )))
            .with_child(Box::new(
                MeshNode::new(
                    Some(&format!("{}_back", name)),
                    quad("back"),
                    wood("chair_wood"),
                )
                .with_transform(Instance {
                    position: Vector3::new(0.0, 0.5, -0.5),
                    ..Instance::new()
                }),
            )),
    )
}

/// Meshes in [`table_and_chairs`]: table top and leg, seat and back of each chair.
pub const MESH_COUNT: usize = 6;

/// A table with two chairs and a lamp, spread over three levels.
pub fn table_and_chairs() -> Box<dyn SceneNode> {
    let table = MeshNode::new(Some("table_top"), quad("top"), wood("table_wood"))
        .with_transform(Instance {
            position: Vector3::new(0.0, 0.75, 0.0),
            ..Instance::new()
        })
        .with_child(Box::new(MeshNode::new(
            Some("table_leg"),
            quad("leg"),
            wood("table_wood"),
        )));
    Box::new(
        ContainerNode::new(Some("table_and_chairs"))
            .with_child(Box::new(table))
            .with_child(Box::new(
                ContainerNode::new(Some("chairs"))
                    .with_child(chair("chair_left", -1.0, 90.0))
                    .with_child(chair("chair_right", 1.0, -90.0)),
            ))
            .with_child(Box::new(LightNode::new(
                Some("lamp"),
                Light::Ambient {
                    color: Color::WHITE,
                    intensity: 0.3,
                },
            ))),
    )
}

/// Every material in the graph, in traversal order.
pub fn materials(root: &dyn SceneNode) -> Vec<Material> {
    let mut materials = Vec::new();
    visit(root, |node| {
        if node.kind() == NodeKind::Mesh {
            if let Some(material) = node.get_material() {
                materials.push(material.clone());
            }
        }
    });
    materials
}

pub fn mesh_names(root: &dyn SceneNode) -> Vec<String> {
    let mut names = Vec::new();
    visit(root, |node| {
        if node.kind() == NodeKind::Mesh {
            names.push(node.name().unwrap_or_default().to_string());
        }
    });
    names
}

fn checkerboard(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Rgb([200, 160, 90])
        } else {
            image::Rgb([90, 60, 30])
        }
    }))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn mk_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&checkerboard(width, height), ImageFormat::Jpeg)
}

pub fn mk_png(width: u32, height: u32) -> Vec<u8> {
    encode(&checkerboard(width, height), ImageFormat::Png)
}
