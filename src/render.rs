//! GPU copies of the model.
//!
//! A [`GpuScene`] holds one vertex buffer, index buffer and material bind
//! group per mesh node, each baked with the node's world transform. It is
//! rebuilt from the scene graph whenever the configurator reports a change and
//! is otherwise reused frame after frame.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        material::Wrapping,
        scene_graph::{SceneNode, collect_drawables},
        texture::Texture,
    },
    pipelines::basic::MeshUniform,
};

pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    #[allow(unused)]
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Default)]
pub struct GpuScene {
    pub meshes: Vec<GpuMesh>,
    textures: HashMap<(usize, [Wrapping; 2]), Texture>,
}

impl GpuScene {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Upload every mesh below `root`. Textures shared between materials are
    /// uploaded once.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        white: &Texture,
        root: Option<&dyn SceneNode>,
    ) -> Self {
        let mut scene = Self::empty();
        let Some(root) = root else {
            return scene;
        };
        for drawable in collect_drawables(root) {
            let mesh = drawable.mesh;
            if mesh.vertices.is_empty() || mesh.indices.is_empty() {
                continue;
            }
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let uniform = MeshUniform::new(drawable.world, drawable.material);
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Mesh Uniform", mesh.name)),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let texture = match &drawable.material.map {
                Some(map) => &*scene
                    .textures
                    .entry((map.image.key(), map.wrapping()))
                    .or_insert_with(|| {
                        Texture::from_texture_image(device, queue, &map.image, map.wrapping())
                    }),
                None => white,
            };
            let sampler = match (&texture.sampler, &white.sampler) {
                (Some(sampler), _) | (None, Some(sampler)) => sampler,
                (None, None) => {
                    log::error!("No sampler available for mesh {:?}", mesh.name);
                    continue;
                }
            };
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
                label: Some(&format!("{:?} Material Bind Group", mesh.name)),
            });

            scene.meshes.push(GpuMesh {
                name: mesh.name.clone(),
                vertex_buffer,
                index_buffer,
                num_elements: mesh.indices.len() as u32,
                uniform_buffer,
                bind_group,
            });
        }
        log::debug!(
            "Uploaded {} meshes and {} textures",
            scene.meshes.len(),
            scene.textures.len()
        );
        scene
    }
}

pub trait DrawScene<'a> {
    fn draw_mesh(
        &mut self,
        mesh: &'a GpuMesh,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_scene(
        &mut self,
        scene: &'a GpuScene,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawScene<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(
        &mut self,
        mesh: &'b GpuMesh,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &mesh.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_scene(
        &mut self,
        scene: &'b GpuScene,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        for mesh in &scene.meshes {
            self.draw_mesh(mesh, camera_bind_group, light_bind_group);
        }
    }
}
