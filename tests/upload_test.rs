use tint_ngin::{Color, Config, Configurator, Upload, UploadError, upload::MAX_TEXTURE_DIMENSION};

use crate::common::test_utils::{MESH_COUNT, materials, mk_jpeg, mk_png, table_and_chairs};

mod common;

fn configurator() -> Configurator {
    let mut configurator = Configurator::new(&Config::default());
    configurator.attach_model(table_and_chairs());
    configurator.take_dirty();
    configurator
}

#[test]
fn png_upload_is_rejected() {
    let mut configurator = configurator();
    let upload = Upload::new("logo.png", "image/png", mk_png(8, 8));

    let err = configurator.upload_image(&upload).unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedType { .. }));
    assert_eq!(err.to_string(), "Please upload a JPEG file.");

    assert!(configurator.selection().texture.is_none());
    assert!(!configurator.take_dirty());
    let root = configurator.model_root().unwrap();
    assert!(materials(root).iter().all(|m| m.map.is_none()));
}

#[test]
fn mislabelled_png_fails_to_decode() {
    let mut configurator = configurator();
    let upload = Upload::new("logo.jpg", "image/jpeg", mk_png(8, 8));
    assert!(matches!(
        configurator.upload_image(&upload),
        Err(UploadError::Decode { .. })
    ));
    assert!(configurator.selection().texture.is_none());
}

#[test]
fn jpeg_upload_textures_every_mesh() {
    let mut configurator = configurator();
    configurator.pick_color(Color::from_u32(0x336699));
    configurator.take_dirty();

    let upload = Upload::new("walnut.jpg", "image/jpeg", mk_jpeg(32, 16));
    configurator.upload_image(&upload).unwrap();
    assert!(configurator.take_dirty());

    let texture = configurator.selection().texture.clone().unwrap();
    assert_eq!((texture.width(), texture.height()), (32, 16));
    assert_eq!(texture.label(), "walnut.jpg");

    let root = configurator.model_root().unwrap();
    let materials = materials(root);
    assert_eq!(materials.len(), MESH_COUNT);
    for material in materials {
        // the texture is tinted with the selected colour
        assert_eq!(material.color, Color::from_u32(0x336699));
        assert!(material.map.unwrap().image.ptr_eq(&texture));
    }
}

#[test]
fn upload_without_model_is_kept_for_later() {
    let mut configurator = Configurator::new(&Config::default());
    let upload = Upload::new("walnut.jpg", "image/jpeg", mk_jpeg(8, 8));
    configurator.upload_image(&upload).unwrap();
    assert!(configurator.selection().texture.is_some());

    configurator.attach_model(table_and_chairs());
    let root = configurator.model_root().unwrap();
    assert!(materials(root).iter().all(|m| m.map.is_some()));
}

#[test]
fn phone_sized_photo_is_scaled_to_the_texture_limit() {
    let mut configurator = configurator();
    let upload = Upload::new("holiday.jpg", "image/jpeg", mk_jpeg(4096, 3072));
    configurator.upload_image(&upload).unwrap();

    let texture = configurator.selection().texture.clone().unwrap();
    assert!(texture.width() <= MAX_TEXTURE_DIMENSION);
    assert!(texture.height() <= MAX_TEXTURE_DIMENSION);
    assert_eq!((texture.width(), texture.height()), (2048, 1536));
}

#[test]
fn mime_type_is_matched_without_case() {
    let mut configurator = configurator();
    let upload = Upload::new("walnut.JPG", "IMAGE/JPEG", mk_jpeg(8, 8));
    configurator.upload_image(&upload).unwrap();
    assert!(configurator.selection().texture.is_some());
}
