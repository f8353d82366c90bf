//! CPU-side mesh geometry and its vertex layout.

use cgmath::{InnerSpace, Vector3, Zero};

/// Describes how a vertex type is laid out in a GPU vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Triangle list geometry of a single drawable.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(name: &str, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            vertices,
            indices,
        }
    }

    /// Axis-aligned bounds of all positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (
                [
                    min[0].min(v.position[0]),
                    min[1].min(v.position[1]),
                    min[2].min(v.position[2]),
                ],
                [
                    max[0].max(v.position[0]),
                    max[1].max(v.position[1]),
                    max[2].max(v.position[2]),
                ],
            )
        }))
    }

    /// Smooth normals averaged from the faces around each vertex.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vector3::<f32>::zero(); self.vertices.len()];
        for c in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
            if i0 >= normals.len() || i1 >= normals.len() || i2 >= normals.len() {
                continue;
            }
            let p0: Vector3<f32> = self.vertices[i0].position.into();
            let p1: Vector3<f32> = self.vertices[i1].position.into();
            let p2: Vector3<f32> = self.vertices[i2].position.into();
            // unnormalized, larger faces weigh more
            let face = (p1 - p0).cross(p2 - p0);
            normals[i0] += face;
            normals[i1] += face;
            normals[i2] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = if normal.magnitude2() > 0.0 {
                normal.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(position: [f32; 3]) -> ModelVertex {
        ModelVertex {
            position,
            ..Default::default()
        }
    }

    #[test]
    fn computes_face_normals_for_a_flat_quad() {
        let mut quad = MeshData::new(
            "quad",
            vec![
                vertex([0.0, 0.0, 0.0]),
                vertex([1.0, 0.0, 0.0]),
                vertex([1.0, 0.0, -1.0]),
                vertex([0.0, 0.0, -1.0]),
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        quad.compute_normals();
        for v in &quad.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn bounds_cover_all_positions() {
        let mesh = MeshData::new(
            "tri",
            vec![
                vertex([-1.0, 2.0, 0.5]),
                vertex([3.0, -4.0, 0.0]),
                vertex([0.0, 0.0, 9.0]),
            ],
            vec![0, 1, 2],
        );
        assert_eq!(mesh.bounds(), Some(([-1.0, -4.0, 0.0], [3.0, 2.0, 9.0])));
        assert_eq!(MeshData::default().bounds(), None);
    }
}
