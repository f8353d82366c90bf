//! Surface descriptions of meshes.
//!
//! A [`Material`] holds the flat colour, emissive tint and an optional
//! [`TextureMap`]. Every constructed material gets a fresh [`MaterialId`];
//! in-place edits keep it, replacing the material changes it.

use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Vector2;

use crate::data_structures::{color::Color, texture::TextureImage};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a constructed material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Lit by the stage lights.
    Standard,
    /// Colour (and map) only, lights are ignored.
    Unlit,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wrapping {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// How many times a map repeats across a mesh and around which pivot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tiling {
    pub repeat: Vector2<f32>,
    pub center: Vector2<f32>,
}

impl Default for Tiling {
    fn default() -> Self {
        Self {
            repeat: Vector2::new(3.3, 3.3),
            center: Vector2::new(0.5, 0.5),
        }
    }
}

/// A texture image plus its sampling parameters.
///
/// Texture coordinates are transformed as
/// `uv' = (uv - center) * repeat + center + offset`.
#[derive(Clone, Debug)]
pub struct TextureMap {
    pub image: TextureImage,
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub repeat: Vector2<f32>,
    pub center: Vector2<f32>,
    pub offset: Vector2<f32>,
}

impl TextureMap {
    /// Map `image` once across the surface, as most assets ship their maps.
    pub fn new(image: TextureImage) -> Self {
        Self {
            image,
            wrap_s: Wrapping::Repeat,
            wrap_t: Wrapping::Repeat,
            repeat: Vector2::new(1.0, 1.0),
            center: Vector2::new(0.0, 0.0),
            offset: Vector2::new(0.0, 0.0),
        }
    }

    /// Repeat `image` across the surface around the tiling's center.
    pub fn tiled(image: TextureImage, tiling: &Tiling) -> Self {
        Self {
            wrap_s: Wrapping::Repeat,
            wrap_t: Wrapping::Repeat,
            repeat: tiling.repeat,
            center: tiling.center,
            ..Self::new(image)
        }
    }

    pub fn wrapping(&self) -> [Wrapping; 2] {
        [self.wrap_s, self.wrap_t]
    }

    /// The transform folded into `uv' = uv * scale + offset`.
    pub fn uv_scale_offset(&self) -> (Vector2<f32>, Vector2<f32>) {
        let scale = self.repeat;
        let offset = Vector2::new(
            self.center.x * (1.0 - scale.x) + self.offset.x,
            self.center.y * (1.0 - scale.y) + self.offset.y,
        );
        (scale, offset)
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    id: MaterialId,
    pub name: Option<String>,
    pub shading: Shading,
    pub color: Color,
    pub emissive: Color,
    pub metallic: f32,
    pub roughness: f32,
    pub map: Option<TextureMap>,
}

impl Material {
    pub fn new(shading: Shading) -> Self {
        Self {
            id: MaterialId::next(),
            name: None,
            shading,
            color: Color::WHITE,
            emissive: Color::BLACK,
            metallic: 0.0,
            roughness: 1.0,
            map: None,
        }
    }

    pub fn standard() -> Self {
        Self::new(Shading::Standard)
    }

    /// A new standard material showing `map` on top of the `tint` colour.
    pub fn textured(map: TextureMap, tint: Color) -> Self {
        Self {
            color: tint,
            map: Some(map),
            ..Self::standard()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard()
    }
}
