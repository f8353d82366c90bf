//! User image uploads.
//!
//! Only JPEG files are accepted as textures. The MIME type is checked before
//! any decoding happens, so a rejected upload never touches the image decoder.

use image::ImageFormat;
use thiserror::Error;

use crate::data_structures::texture::TextureImage;

pub const ACCEPTED_MIME_TYPE: &str = "image/jpeg";

/// Longest side of a decoded upload. WebGL2 devices reject larger textures.
pub const MAX_TEXTURE_DIMENSION: u32 = 2048;

/// A file handed over by the UI, either dropped on the window or picked in
/// the browser.
#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let bytes = std::fs::read(path)
            .with_context(|| format!("Could not read upload {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            file_name,
            mime_type: mime_from_path(path).to_string(),
            bytes,
        })
    }
}

pub fn mime_from_path(path: &std::path::Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg" | "jpe" | "jfif") => ACCEPTED_MIME_TYPE,
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a JPEG file.")]
    UnsupportedType { file_name: String, mime_type: String },
    #[error("Could not read {file_name} as a JPEG image: {source}")]
    Decode {
        file_name: String,
        #[source]
        source: image::ImageError,
    },
}

/// Validate the MIME type and decode the upload into a texture image.
pub fn decode_upload(upload: &Upload) -> Result<TextureImage, UploadError> {
    if !is_jpeg_mime(&upload.mime_type) {
        return Err(UploadError::UnsupportedType {
            file_name: upload.file_name.clone(),
            mime_type: upload.mime_type.clone(),
        });
    }
    let img = image::load_from_memory_with_format(&upload.bytes, ImageFormat::Jpeg).map_err(
        |source| UploadError::Decode {
            file_name: upload.file_name.clone(),
            source,
        },
    )?;
    let img = if img.width() > MAX_TEXTURE_DIMENSION || img.height() > MAX_TEXTURE_DIMENSION {
        log::info!(
            "Scaling {} down from {}x{}",
            upload.file_name,
            img.width(),
            img.height()
        );
        img.resize(
            MAX_TEXTURE_DIMENSION,
            MAX_TEXTURE_DIMENSION,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img
    };
    Ok(TextureImage::from_image(&img, &upload.file_name))
}

/// Compares the media type without parameters, ignoring case.
fn is_jpeg_mime(mime_type: &str) -> bool {
    mime_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(ACCEPTED_MIME_TYPE))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn infers_mime_from_extension() {
        assert_eq!(mime_from_path(Path::new("oak.JPG")), "image/jpeg");
        assert_eq!(mime_from_path(Path::new("dir/walnut.jfif")), "image/jpeg");
        assert_eq!(mime_from_path(Path::new("logo.png")), "image/png");
        assert_eq!(mime_from_path(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn rejects_before_decoding() {
        let upload = Upload::new("logo.png", "image/png", Vec::new());
        let err = decode_upload(&upload).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
        assert_eq!(err.to_string(), "Please upload a JPEG file.");
    }

    #[test]
    fn mime_check_ignores_case_and_parameters() {
        assert!(is_jpeg_mime("image/jpeg"));
        assert!(is_jpeg_mime("IMAGE/JPEG"));
        assert!(is_jpeg_mime("Image/Jpeg; q=0.9"));
        assert!(!is_jpeg_mime("image/jpegx"));
        assert!(!is_jpeg_mime("image/png"));
        assert!(!is_jpeg_mime(""));
    }

    #[test]
    fn garbage_with_jpeg_mime_fails_to_decode() {
        let upload = Upload::new("broken.jpg", "image/jpeg", b"not a jpeg".to_vec());
        assert!(matches!(
            decode_upload(&upload),
            Err(UploadError::Decode { .. })
        ));
    }
}
