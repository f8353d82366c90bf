//! Node transformations.
//!
//! Every scene node carries a local [`Instance`]: position, rotation and
//! scale relative to its parent. World transforms are the product of all
//! local transforms from the root down.

use std::ops::Mul;

use cgmath::{One, SquareMatrix};

/// Local transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// From glTF's decomposed TRS: translation, rotation as `[x, y, z, w]`, scale.
    pub fn from_trs(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            position: translation.into(),
            rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        }
    }

    /// Rotation as glTF stores it: `[x, y, z, w]`.
    pub fn rotation_xyzw(&self) -> [f32; 4] {
        let q = self.rotation;
        [q.v.x, q.v.y, q.v.z, q.s]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::new()
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// The matrix that transforms normals for `world`: inverse transpose, identity if singular.
pub fn normal_matrix(world: &cgmath::Matrix4<f32>) -> cgmath::Matrix4<f32> {
    use cgmath::Matrix;
    world
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(cgmath::Matrix4::identity)
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Rotation3, Vector3};

    use super::*;

    #[test]
    fn trs_round_trips_through_gltf_layout() {
        let rotation = [0.0, 0.70710677, 0.0, 0.70710677];
        let instance = Instance::from_trs([1.0, 2.0, 3.0], rotation, [2.0, 2.0, 2.0]);
        assert_eq!(instance.rotation_xyzw(), rotation);
        assert!(!instance.is_identity());
        assert!(Instance::default().is_identity());
    }

    #[test]
    fn composition_matches_matrix_product() {
        let parent = Instance {
            position: Vector3::new(1.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let child: Instance = Vector3::new(0.0, 0.0, 1.0).into();
        let composed = (&parent * &child).to_matrix();
        let expected = parent.to_matrix() * child.to_matrix();
        for c in 0..4 {
            for r in 0..4 {
                assert!((composed[c][r] - expected[c][r]).abs() < 1e-5);
            }
        }
    }
}
