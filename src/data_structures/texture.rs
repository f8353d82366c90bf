//! Texture images and GPU textures.
//!
//! [`TextureImage`] is the decoded, CPU-side image that materials reference.
//! It is cheap to clone (the pixels are shared) so a single upload can be
//! mapped onto every mesh of a model.
//!
//! [`Texture`] wraps the WGPU texture objects created from such an image,
//! along with its view and sampler, plus helpers for depth and fallback
//! textures.

use std::{fmt, io::Cursor, sync::Arc};

use anyhow::*;
use image::{
    DynamicImage, ImageFormat, RgbaImage, imageops::FilterType, load_from_memory_with_format,
};

use crate::data_structures::material::Wrapping;

/// A decoded image in RGBA8, shared between all materials that map it.
#[derive(Clone)]
pub struct TextureImage {
    label: String,
    pixels: Arc<RgbaImage>,
}

impl TextureImage {
    pub fn from_image(img: &DynamicImage, label: &str) -> Self {
        Self {
            label: label.to_string(),
            pixels: Arc::new(img.to_rgba8()),
        }
    }

    /// Decode raw image file data.
    ///
    /// * `format` is an optional file extension or MIME type hint (`"png"`,
    ///   `"image/jpeg"`). If None, the format is guessed from the content.
    pub fn from_bytes(bytes: &[u8], label: &str, format: Option<&str>) -> Result<Self> {
        let img = match format.and_then(parse_format) {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        };
        Ok(Self::from_image(&img, label))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// True if both handles share the same decoded pixels.
    pub fn ptr_eq(&self, other: &TextureImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Stable key for deduplicating shared images (e.g. on export).
    pub fn key(&self) -> usize {
        Arc::as_ptr(&self.pixels) as usize
    }

    /// Downscale so neither side exceeds `max_dimension`, keeping the aspect
    /// ratio. Images that already fit are returned as a shared handle.
    pub fn fit_within(&self, max_dimension: u32) -> TextureImage {
        let max_dimension = max_dimension.max(1);
        if self.width() <= max_dimension && self.height() <= max_dimension {
            return self.clone();
        }
        let resized = DynamicImage::ImageRgba8(self.pixels.as_ref().clone()).resize(
            max_dimension,
            max_dimension,
            FilterType::Triangle,
        );
        log::info!(
            "Downscaled {} from {}x{} to {}x{}",
            self.label,
            self.width(),
            self.height(),
            resized.width(),
            resized.height()
        );
        Self::from_image(&resized, &self.label)
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut out, ImageFormat::Png)
            .with_context(|| format!("Failed to encode texture {} as png", self.label))?;
        Ok(out.into_inner())
    }
}

impl fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureImage")
            .field("label", &self.label)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

fn parse_format(hint: &str) -> Option<ImageFormat> {
    ImageFormat::from_mime_type(hint).or_else(|| ImageFormat::from_extension(hint))
}

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        }));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 white texture bound for materials without a map, so the shader
    /// can always multiply colour by a texel.
    pub fn create_white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, image::Rgba([255; 4])));
        Self::from_image(device, queue, &img, Some("white fallback"), [Wrapping::Repeat; 2])
    }

    pub fn from_texture_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        wrapping: [Wrapping; 2],
    ) -> Self {
        let image = image.fit_within(device.limits().max_texture_dimension_2d);
        Self::from_rgba(device, queue, image.rgba(), Some(image.label()), wrapping)
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &DynamicImage,
        label: Option<&str>,
        wrapping: [Wrapping; 2],
    ) -> Self {
        Self::from_rgba(device, queue, &img.to_rgba8(), label, wrapping)
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: Option<&str>,
        wrapping: [Wrapping; 2],
    ) -> Self {
        let dimensions = rgba.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_sampler(device, wrapping));

        Self {
            texture,
            view,
            sampler,
        }
    }
}

pub fn create_sampler(device: &wgpu::Device, wrapping: [Wrapping; 2]) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wrapping[0].into(),
        address_mode_v: wrapping[1].into(),
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

impl From<Wrapping> for wgpu::AddressMode {
    fn from(wrapping: Wrapping) -> Self {
        match wrapping {
            Wrapping::Repeat => wgpu::AddressMode::Repeat,
            Wrapping::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
            Wrapping::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_with_and_without_hint() {
        let bytes = png_bytes();
        let guessed = TextureImage::from_bytes(&bytes, "guessed", None).unwrap();
        let hinted = TextureImage::from_bytes(&bytes, "hinted", Some("image/png")).unwrap();
        assert_eq!((guessed.width(), guessed.height()), (3, 2));
        assert_eq!(hinted.rgba().get_pixel(0, 0), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn clones_share_pixels() {
        let img = TextureImage::from_bytes(&png_bytes(), "a", Some("png")).unwrap();
        let other = TextureImage::from_bytes(&png_bytes(), "b", Some("png")).unwrap();
        assert!(img.ptr_eq(&img.clone()));
        assert_eq!(img.key(), img.clone().key());
        assert!(!img.ptr_eq(&other));
    }

    #[test]
    fn oversized_images_are_scaled_down() {
        let big = TextureImage::from_image(&DynamicImage::new_rgb8(400, 300), "photo.jpg");
        let fitted = big.fit_within(200);
        assert_eq!((fitted.width(), fitted.height()), (200, 150));
        assert_eq!(fitted.label(), "photo.jpg");

        let small = big.fit_within(400);
        assert!(small.ptr_eq(&big));
    }
}
