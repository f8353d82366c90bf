//! The host's own scene: the lights the model is shown under.
//!
//! Lights live in a small scene graph of their own, separate from the loaded
//! model, so replacing the model never touches the lighting.

use cgmath::{InnerSpace, Vector3};

use crate::{
    config::LightConfig,
    data_structures::{
        instance::Instance,
        light::Light,
        scene_graph::{ContainerNode, LightNode, SceneNode, collect_lights},
    },
    pipelines::light::LightUniform,
};

pub struct Stage {
    root: Box<dyn SceneNode>,
}

impl Stage {
    pub fn new(config: &LightConfig) -> Self {
        let ambient = LightNode::new(
            Some("ambient"),
            Light::Ambient {
                color: config.ambient_color,
                intensity: config.ambient_intensity,
            },
        );
        let position = if config.directional_position.magnitude2() > 0.0 {
            config.directional_position.normalize()
        } else {
            Vector3::unit_y()
        };
        let directional = LightNode::new(
            Some("directional"),
            Light::Directional {
                color: config.directional_color,
                intensity: config.directional_intensity,
            },
        )
        .with_transform(Instance::from(position));

        let root = ContainerNode::new(Some("stage"))
            .with_child(Box::new(ambient))
            .with_child(Box::new(directional));
        Self {
            root: Box::new(root),
        }
    }

    pub fn root(&self) -> &dyn SceneNode {
        self.root.as_ref()
    }

    /// Sum of all ambient lights plus the first directional light.
    pub fn light_uniform(&self) -> LightUniform {
        let mut ambient = [0.0; 3];
        let mut sun = None;
        for (light, position) in collect_lights(self.root()) {
            match light {
                Light::Ambient { .. } => {
                    let [r, g, b] = light.radiance();
                    ambient = [ambient[0] + r, ambient[1] + g, ambient[2] + b];
                }
                Light::Directional { .. } if sun.is_none() => {
                    let direction = if position.magnitude2() > 0.0 {
                        position.normalize()
                    } else {
                        Vector3::unit_y()
                    };
                    sun = Some((direction, light.radiance()));
                }
                Light::Directional { .. } => {
                    log::warn!("Only one directional light is supported, ignoring the others");
                }
            }
        }
        let (direction, color) = sun.unwrap_or((Vector3::unit_y(), [0.0; 3]));
        LightUniform::new(ambient, direction.into(), color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stage_has_dim_ambient_and_white_sun() {
        let stage = Stage::new(&LightConfig::default());
        let uniform = stage.light_uniform();
        let expected = 1.0 / 3.0_f32.sqrt();
        for c in &uniform.direction[..3] {
            assert!((c - expected).abs() < 1e-5);
        }
        for c in &uniform.color[..3] {
            assert!((c - 1.0).abs() < 1e-5);
        }
        assert!(uniform.ambient[0] > 0.0 && uniform.ambient[0] < 0.1);
    }
}
