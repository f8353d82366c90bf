//! Scene graph and hierarchical scene organization.
//!
//! A model is a tree of boxed [`SceneNode`]s. Group nodes only carry a
//! transform, mesh nodes add geometry and a material, light nodes add a
//! light source. Each node reports its [`NodeKind`] so walkers can decide
//! what to touch without downcasting.
//!
//! All walks over the graph are iterative with an explicit stack, so deep
//! hierarchies in imported assets can't overflow the call stack.

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use crate::data_structures::{
    instance::Instance,
    light::Light,
    material::Material,
    mesh::{MeshData, ModelVertex},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An empty transform that only groups its children.
    Group,
    /// Drawable geometry with a material.
    Mesh,
    Light,
}

pub trait SceneNode {
    fn kind(&self) -> NodeKind;

    fn name(&self) -> Option<&str>;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.get_children_mut().push(child);
    }

    fn get_mesh(&self) -> Option<&MeshData> {
        None
    }

    fn get_material(&self) -> Option<&Material> {
        None
    }

    fn get_material_mut(&mut self) -> Option<&mut Material> {
        None
    }

    /**
     * Swaps the material of a mesh node and hands back the old one.
     *
     * Nodes without a material slot ignore the call and return `None`.
     */
    fn set_material(&mut self, _material: Material) -> Option<Material> {
        None
    }

    fn get_light(&self) -> Option<&Light> {
        None
    }
}

/// Groups children under a common transform.
#[derive(Default)]
pub struct ContainerNode {
    pub name: Option<String>,
    pub children: Vec<Box<dyn SceneNode>>,
    pub transform: Instance,
}

impl ContainerNode {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            children: Vec::new(),
            transform: Instance::default(),
        }
    }

    pub fn with_transform(mut self, transform: Instance) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Box<dyn SceneNode>) -> Self {
        self.children.push(child);
        self
    }
}

impl SceneNode for ContainerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Group
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn get_local_transform(&self) -> &Instance {
        &self.transform
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.transform = instance;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }
}

/// Drawable geometry plus the material it is shaded with.
pub struct MeshNode {
    pub name: Option<String>,
    pub mesh: MeshData,
    pub material: Material,
    pub children: Vec<Box<dyn SceneNode>>,
    pub transform: Instance,
}

impl MeshNode {
    pub fn new(name: Option<&str>, mesh: MeshData, material: Material) -> Self {
        Self {
            name: name.map(str::to_string),
            mesh,
            material,
            children: Vec::new(),
            transform: Instance::default(),
        }
    }

    pub fn with_transform(mut self, transform: Instance) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Box<dyn SceneNode>) -> Self {
        self.children.push(child);
        self
    }
}

impl SceneNode for MeshNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Mesh
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn get_local_transform(&self) -> &Instance {
        &self.transform
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.transform = instance;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_mesh(&self) -> Option<&MeshData> {
        Some(&self.mesh)
    }

    fn get_material(&self) -> Option<&Material> {
        Some(&self.material)
    }

    fn get_material_mut(&mut self) -> Option<&mut Material> {
        Some(&mut self.material)
    }

    fn set_material(&mut self, material: Material) -> Option<Material> {
        Some(std::mem::replace(&mut self.material, material))
    }
}

pub struct LightNode {
    pub name: Option<String>,
    pub light: Light,
    pub children: Vec<Box<dyn SceneNode>>,
    pub transform: Instance,
}

impl LightNode {
    pub fn new(name: Option<&str>, light: Light) -> Self {
        Self {
            name: name.map(str::to_string),
            light,
            children: Vec::new(),
            transform: Instance::default(),
        }
    }

    pub fn with_transform(mut self, transform: Instance) -> Self {
        self.transform = transform;
        self
    }
}

impl SceneNode for LightNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Light
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn get_local_transform(&self) -> &Instance {
        &self.transform
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.transform = instance;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn get_light(&self) -> Option<&Light> {
        Some(&self.light)
    }
}

/// Calls `visitor` on `root` and every descendant, parents before children.
pub fn visit(root: &dyn SceneNode, mut visitor: impl FnMut(&dyn SceneNode)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visitor(node);
        // reversed so siblings come off the stack in declaration order
        for child in node.get_children().iter().rev() {
            stack.push(child.as_ref());
        }
    }
}

/// Mutable counterpart of [`visit`].
pub fn visit_mut(root: &mut Box<dyn SceneNode>, mut visitor: impl FnMut(&mut dyn SceneNode)) {
    let mut stack: Vec<&mut Box<dyn SceneNode>> = vec![root];
    while let Some(node) = stack.pop() {
        visitor(node.as_mut());
        for child in node.get_children_mut().iter_mut().rev() {
            stack.push(child);
        }
    }
}

pub fn count_meshes(root: &dyn SceneNode) -> usize {
    let mut count = 0;
    visit(root, |node| {
        if node.kind() == NodeKind::Mesh {
            count += 1;
        }
    });
    count
}

/// A mesh node resolved to world space, ready to be uploaded or exported.
pub struct Drawable<'a> {
    pub world: Matrix4<f32>,
    pub mesh: &'a MeshData,
    pub material: &'a Material,
}

/// All mesh nodes under `root` with their accumulated world transforms.
pub fn collect_drawables<'a>(root: &'a dyn SceneNode) -> Vec<Drawable<'a>> {
    let mut drawables = Vec::new();
    let mut stack: Vec<(&'a dyn SceneNode, Matrix4<f32>)> = vec![(root, Matrix4::identity())];
    while let Some((node, parent)) = stack.pop() {
        let world = parent * node.get_local_transform().to_matrix();
        if node.kind() == NodeKind::Mesh {
            if let (Some(mesh), Some(material)) = (node.get_mesh(), node.get_material()) {
                drawables.push(Drawable {
                    world,
                    mesh,
                    material,
                });
            }
        }
        for child in node.get_children().iter().rev() {
            stack.push((child.as_ref(), world));
        }
    }
    drawables
}

/// All lights under `root` with their world positions.
pub fn collect_lights(root: &dyn SceneNode) -> Vec<(Light, Vector3<f32>)> {
    let mut lights = Vec::new();
    let mut stack: Vec<(&dyn SceneNode, Matrix4<f32>)> = vec![(root, Matrix4::identity())];
    while let Some((node, parent)) = stack.pop() {
        let world = parent * node.get_local_transform().to_matrix();
        if let Some(light) = node.get_light() {
            lights.push((*light, (world * Vector4::unit_w()).truncate()));
        }
        for child in node.get_children().iter().rev() {
            stack.push((child.as_ref(), world));
        }
    }
    lights
}

/// Converts a glTF node and its descendants into scene nodes.
///
/// `materials` is indexed like the document's materials; primitives without
/// a material get a default standard one. A mesh with a single primitive
/// becomes a [`MeshNode`], a mesh with several becomes a group of them.
pub fn to_scene_node(
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    materials: &[Material],
) -> Box<dyn SceneNode> {
    let name = node.name();
    let mut mesh_nodes: Vec<MeshNode> = match node.mesh() {
        Some(mesh) => mesh
            .primitives()
            .filter_map(|primitive| {
                let mesh_name = mesh.name().or(name).unwrap_or("unknown_mesh");
                let data = read_primitive(&primitive, buffers, mesh_name)?;
                let material = primitive
                    .material()
                    .index()
                    .and_then(|idx| materials.get(idx))
                    .cloned()
                    .unwrap_or_default();
                Some(MeshNode::new(Some(mesh_name), data, material))
            })
            .collect(),
        None => Vec::new(),
    };

    let mut scene_node: Box<dyn SceneNode> = if mesh_nodes.len() == 1 {
        let mut mesh_node = mesh_nodes.remove(0);
        mesh_node.name = name.map(str::to_string).or(mesh_node.name);
        Box::new(mesh_node)
    } else {
        let mut group = ContainerNode::new(name);
        for mesh_node in mesh_nodes {
            group.add_child(Box::new(mesh_node));
        }
        Box::new(group)
    };

    let (translation, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Instance::from_trs(translation, rotation, scale));
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers, materials));
    }
    scene_node
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    name: &str,
) -> Option<MeshData> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::warn!(
            "Skipping primitive {} of mesh {}: only triangle lists are supported, got {:?}.",
            primitive.index(),
            name,
            primitive.mode()
        );
        return None;
    }
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
        Some(positions) => positions
            .map(|position| ModelVertex {
                position,
                ..Default::default()
            })
            .collect(),
        None => {
            log::warn!("Skipping primitive {} of mesh {}: no positions.", primitive.index(), name);
            return None;
        }
    };
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
        vertices
            .iter_mut()
            .zip(tex_coords)
            .for_each(|(vertex, uv)| vertex.tex_coords = uv);
    }
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };

    let mut mesh = MeshData::new(name, vertices, indices);
    match reader.read_normals() {
        Some(normals) => mesh
            .vertices
            .iter_mut()
            .zip(normals)
            .for_each(|(vertex, normal)| vertex.normal = normal),
        None => mesh.compute_normals(),
    }
    Some(mesh)
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::data_structures::color::Color;

    fn mesh_node(name: &str) -> MeshNode {
        MeshNode::new(Some(name), MeshData::default(), Material::standard())
    }

    fn sample() -> Box<dyn SceneNode> {
        Box::new(
            ContainerNode::new(Some("root"))
                .with_child(Box::new(
                    mesh_node("a").with_child(Box::new(mesh_node("a.1"))),
                ))
                .with_child(Box::new(
                    ContainerNode::new(Some("b"))
                        .with_transform(Vector3::new(0.0, 1.0, 0.0).into())
                        .with_child(Box::new(mesh_node("b.1"))),
                ))
                .with_child(Box::new(LightNode::new(
                    Some("sun"),
                    Light::Ambient {
                        color: Color::WHITE,
                        intensity: 1.0,
                    },
                ))),
        )
    }

    #[test]
    fn visits_depth_first_in_declaration_order() {
        let root = sample();
        let mut names = Vec::new();
        visit(root.as_ref(), |node| names.push(node.name().unwrap().to_string()));
        assert_eq!(names, ["root", "a", "a.1", "b", "b.1", "sun"]);
    }

    #[test]
    fn visit_mut_reaches_every_node() {
        let mut root = sample();
        visit_mut(&mut root, |node| {
            if let Some(material) = node.get_material_mut() {
                material.color = Color::BLACK;
            }
        });
        assert_eq!(count_meshes(root.as_ref()), 3);
        for drawable in collect_drawables(root.as_ref()) {
            assert_eq!(drawable.material.color, Color::BLACK);
        }
    }

    #[test]
    fn drawables_carry_world_transforms() {
        let root = sample();
        let drawables = collect_drawables(root.as_ref());
        let b1 = drawables
            .iter()
            .find(|d| d.world.w.y == 1.0)
            .expect("b.1 is translated by its parent");
        assert_eq!(b1.world.w.truncate(), Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn non_mesh_nodes_have_no_material_slot() {
        let mut group: Box<dyn SceneNode> = Box::new(ContainerNode::new(None));
        assert_eq!(group.set_material(Material::standard()).map(|m| m.id()), None);
        assert!(group.get_material().is_none());
        assert_eq!(group.kind(), NodeKind::Group);
    }
}
