//! Light sources that can be placed in a scene graph.

use crate::data_structures::color::Color;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    /// Uniform light from every direction.
    Ambient { color: Color, intensity: f32 },
    /// Parallel rays shining from the node's position towards the origin.
    Directional { color: Color, intensity: f32 },
}

impl Light {
    pub fn color(&self) -> Color {
        match self {
            Light::Ambient { color, .. } | Light::Directional { color, .. } => *color,
        }
    }

    /// Linear colour scaled by intensity.
    pub fn radiance(&self) -> [f32; 3] {
        let intensity = match self {
            Light::Ambient { intensity, .. } | Light::Directional { intensity, .. } => *intensity,
        };
        let [r, g, b] = self.color().to_linear();
        [r * intensity, g * intensity, b * intensity]
    }
}
