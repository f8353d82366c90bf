//! Runtime configuration.
//!
//! There are no configuration files: the binary builds a [`Config`] in code,
//! overriding the defaults with the `with_*` builders, and hands it to
//! [`crate::flow::run`].

use std::path::PathBuf;

use cgmath::{Point3, Vector3};

use crate::data_structures::{color::Color, material::Tiling};
use crate::mutator::Selection;

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of the remaining orbit velocity applied per frame.
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(2.0, 1.0, 0.0),
            target: Point3::new(0.0, 0.0, 0.0),
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            damping: 0.25,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LightConfig {
    pub ambient_color: Color,
    pub ambient_intensity: f32,
    pub directional_color: Color,
    pub directional_intensity: f32,
    /// Where the directional light shines from. Normalized when the stage is built.
    pub directional_position: Vector3<f32>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_color: Color::from_u32(0x404040),
            ambient_intensity: 1.0,
            directional_color: Color::WHITE,
            directional_intensity: 1.0,
            directional_position: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Model to load, relative to the asset directory.
    pub model_path: String,
    pub export_file_name: String,
    /// Where saved designs are written on native targets.
    pub export_dir: PathBuf,
    pub default_color: Color,
    /// Colours bound to the number keys `1`..`9`.
    pub palette: Vec<Color>,
    pub tiling: Tiling,
    pub clear_colour: wgpu::Color,
    pub window_title: String,
    pub camera: CameraConfig,
    pub lights: LightConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: "table_and_chairs.glb".to_string(),
            export_file_name: "DiningTable.glb".to_string(),
            export_dir: PathBuf::from("."),
            default_color: Selection::DEFAULT_COLOR,
            palette: vec![
                Selection::DEFAULT_COLOR,
                Color::from_u32(0x8b5a2b),
                Color::from_u32(0xdeb887),
                Color::from_u32(0xf5f5dc),
                Color::from_u32(0x2f4f4f),
                Color::from_u32(0x800000),
                Color::from_u32(0x556b2f),
                Color::from_u32(0x191970),
                Color::from_u32(0xff0000),
            ],
            tiling: Tiling::default(),
            clear_colour: wgpu::Color::WHITE,
            window_title: "tint-ngin".to_string(),
            camera: CameraConfig::default(),
            lights: LightConfig::default(),
        }
    }
}

impl Config {
    pub fn with_model_path(mut self, model_path: &str) -> Self {
        self.model_path = model_path.to_string();
        self
    }

    pub fn with_export_file_name(mut self, file_name: &str) -> Self {
        self.export_file_name = file_name.to_string();
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    pub fn with_palette(mut self, palette: Vec<Color>) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_tiling(mut self, tiling: Tiling) -> Self {
        self.tiling = tiling;
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: wgpu::Color) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_lights(mut self, lights: LightConfig) -> Self {
        self.lights = lights;
        self
    }

    /// Palette entry for a number key, `1` being the first colour.
    pub fn palette_color(&self, digit: u32) -> Option<Color> {
        let idx = digit.checked_sub(1)? as usize;
        self.palette.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_one_based() {
        let config = Config::default();
        assert_eq!(config.palette_color(1), Some(Selection::DEFAULT_COLOR));
        assert_eq!(config.palette_color(0), None);
        assert_eq!(config.palette_color(10), None);
    }

    #[test]
    fn builders_override_defaults() {
        let config = Config::default()
            .with_model_path("chair.gltf")
            .with_default_color(Color::BLACK);
        assert_eq!(config.model_path, "chair.gltf");
        assert_eq!(config.default_color, Color::BLACK);
        assert_eq!(config.export_file_name, "DiningTable.glb");
    }
}
