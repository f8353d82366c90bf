use anyhow::*;

use crate::data_structures::texture::TextureImage;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let window = web_sys::window().context("No browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow!("Could not read the page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Read an asset file.
///
/// Native builds read from `./assets/`, the web build fetches
/// `<origin>/assets/` from the serving host.
pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?
    };

    Ok(data)
}

/// Resolve `uri` relative to the directory of `file_name`.
pub fn sibling_path(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_string(),
    }
}

pub async fn load_texture_image(file_name: &str, format: Option<&str>) -> Result<TextureImage> {
    let data = load_binary(file_name).await?;
    TextureImage::from_bytes(&data, file_name, format)
        .with_context(|| format!("Could not decode image {}", file_name))
}

/// Decode every image of a glTF document, in document order.
///
/// Images that fail to load are logged and left out, materials referencing
/// them fall back to their flat colour.
pub async fn load_images(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    file_name: &str,
) -> Vec<Option<TextureImage>> {
    let mut images = Vec::new();
    for image in gltf.images() {
        let label = image
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}#image{}", file_name, image.index()));
        let decoded = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let end = start + view.length();
                buffers
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(start..end))
                    .context("Image buffer view is out of bounds")
                    .and_then(|bytes| TextureImage::from_bytes(bytes, &label, Some(mime_type)))
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                if uri.starts_with("data:") {
                    Err(anyhow!("Embedded data URIs are not supported"))
                } else {
                    load_texture_image(&sibling_path(file_name, uri), mime_type).await
                }
            }
        };
        match decoded {
            std::result::Result::Ok(img) => images.push(Some(img)),
            Err(e) => {
                log::warn!("Image {} of {} could not be loaded: {:#}", label, file_name, e);
                images.push(None);
            }
        }
    }
    images
}
