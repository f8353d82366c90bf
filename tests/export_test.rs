use cgmath::Vector2;
use futures::executor::block_on;
use tint_ngin::{
    Color, Config, Configurator, Upload,
    data_structures::{
        material::Wrapping,
        scene_graph::{collect_drawables, count_meshes},
    },
    resources::{export::export_glb, load_model_gltf_from_slice},
};

use crate::common::test_utils::{MESH_COUNT, materials, mesh_names, mk_jpeg, table_and_chairs};

mod common;

fn close(a: Vector2<f32>, b: Vector2<f32>) -> bool {
    (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5
}

#[test]
fn save_without_model_yields_nothing() {
    let configurator = Configurator::new(&Config::default());
    assert!(configurator.save_design().unwrap().is_none());
}

#[test]
fn saved_design_is_named_after_config() {
    let mut configurator =
        Configurator::new(&Config::default().with_export_file_name("Kitchen.glb"));
    configurator.attach_model(table_and_chairs());
    let design = configurator.save_design().unwrap().unwrap();
    assert_eq!(design.file_name, "Kitchen.glb");
    assert_eq!(&design.bytes[0..4], b"glTF");
}

#[test]
fn colored_model_survives_a_round_trip() {
    let mut configurator = Configurator::new(&Config::default());
    configurator.attach_model(table_and_chairs());
    configurator.pick_color(Color::from_u32(0xff0000));
    let design = configurator.save_design().unwrap().unwrap();

    let parsed = gltf::Gltf::from_slice(&design.bytes).unwrap();
    assert_eq!(parsed.meshes().count(), MESH_COUNT);
    assert_eq!(parsed.materials().count(), MESH_COUNT);
    assert!(parsed.blob.is_some());

    let reloaded = block_on(load_model_gltf_from_slice(&design.bytes, &design.file_name)).unwrap();
    assert_eq!(count_meshes(reloaded.as_ref()), MESH_COUNT);
    assert_eq!(
        mesh_names(reloaded.as_ref()),
        mesh_names(configurator.model_root().unwrap())
    );
    for material in materials(reloaded.as_ref()) {
        assert_eq!(material.color, Color::from_u32(0xff0000));
        assert!(material.map.is_none());
    }
}

#[test]
fn world_transforms_survive_a_round_trip() {
    let model = table_and_chairs();
    let glb = export_glb(model.as_ref()).unwrap();
    let reloaded = block_on(load_model_gltf_from_slice(&glb, "table.glb")).unwrap();

    let before = collect_drawables(model.as_ref());
    let after = collect_drawables(reloaded.as_ref());
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        let a: [[f32; 4]; 4] = a.world.into();
        let b: [[f32; 4]; 4] = b.world.into();
        for (col_a, col_b) in a.iter().zip(&b) {
            for (x, y) in col_a.iter().zip(col_b) {
                assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
            }
        }
        assert_eq!(a.len(), 4);
    }
}

#[test]
fn textured_model_keeps_its_tiling() {
    let mut configurator = Configurator::new(&Config::default());
    configurator.attach_model(table_and_chairs());
    configurator
        .upload_image(&Upload::new("walnut.jpg", "image/jpeg", mk_jpeg(16, 16)))
        .unwrap();
    let design = configurator.save_design().unwrap().unwrap();

    let parsed = gltf::Gltf::from_slice(&design.bytes).unwrap();
    // one image shared by every material
    assert_eq!(parsed.images().count(), 1);
    assert!(String::from_utf8_lossy(&design.bytes).contains("KHR_texture_transform"));

    let expected = materials(configurator.model_root().unwrap())[0]
        .map
        .as_ref()
        .unwrap()
        .uv_scale_offset();
    let reloaded = block_on(load_model_gltf_from_slice(&design.bytes, &design.file_name)).unwrap();
    let reloaded = materials(reloaded.as_ref());
    assert_eq!(reloaded.len(), MESH_COUNT);
    for material in reloaded {
        let map = material.map.expect("texture map survives export");
        assert_eq!((map.image.width(), map.image.height()), (16, 16));
        assert_eq!(map.wrapping(), [Wrapping::Repeat, Wrapping::Repeat]);
        let (scale, offset) = map.uv_scale_offset();
        assert!(close(scale, expected.0));
        assert!(close(offset, expected.1));
        assert!(close(offset, Vector2::new(-1.15, -1.15)));
    }
}
