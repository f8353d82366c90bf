use cgmath::Vector2;
use tint_ngin::{
    Color, Config, Configurator,
    data_structures::{
        material::{Material, Tiling, Wrapping},
        scene_graph::{SceneNode, count_meshes},
        texture::TextureImage,
    },
    mutator::{Selection, apply_color, apply_selection, apply_texture},
};

use crate::common::test_utils::{MESH_COUNT, materials, table_and_chairs};

mod common;

const RED: Color = Color::from_u32(0xff0000);

fn texture() -> TextureImage {
    TextureImage::from_image(&image::DynamicImage::new_rgb8(8, 8), "oak.jpg")
}

#[test]
fn color_reaches_every_mesh_and_clears_maps() {
    let mut model = table_and_chairs();
    apply_texture(Some(&mut model), &texture(), Color::WHITE, &Tiling::default());
    apply_color(Some(&mut model), RED);

    let materials = materials(model.as_ref());
    assert_eq!(materials.len(), MESH_COUNT);
    assert_eq!(materials.len(), count_meshes(model.as_ref()));
    for material in materials {
        assert_eq!(material.color, RED);
        assert_eq!(material.emissive, RED);
        assert!(material.map.is_none());
    }
}

#[test]
fn color_keeps_material_identity() {
    let mut model = table_and_chairs();
    let before: Vec<_> = materials(model.as_ref()).iter().map(Material::id).collect();
    apply_color(Some(&mut model), RED);
    let after: Vec<_> = materials(model.as_ref()).iter().map(Material::id).collect();
    assert_eq!(before, after);
}

#[test]
fn texture_is_tiled_on_fresh_materials() {
    let mut model = table_and_chairs();
    let before: Vec<_> = materials(model.as_ref()).iter().map(Material::id).collect();
    let image = texture();
    apply_texture(Some(&mut model), &image, RED, &Tiling::default());

    let materials = materials(model.as_ref());
    assert_eq!(materials.len(), MESH_COUNT);
    for (material, old_id) in materials.iter().zip(&before) {
        assert_ne!(material.id(), *old_id);
        assert_eq!(material.color, RED);
        let map = material.map.as_ref().expect("textured material has a map");
        assert!(map.image.ptr_eq(&image));
        assert_eq!(map.wrapping(), [Wrapping::Repeat, Wrapping::Repeat]);
        assert_eq!(map.repeat, Vector2::new(3.3, 3.3));
        assert_eq!(map.center, Vector2::new(0.5, 0.5));
    }
}

#[test]
fn missing_model_is_a_no_op() {
    apply_color(None, RED);
    apply_texture(None, &texture(), RED, &Tiling::default());
    apply_selection(None, &Selection::default(), &Tiling::default());
}

#[test]
fn only_mesh_nodes_are_touched() {
    let mut model = table_and_chairs();
    apply_color(Some(&mut model), RED);
    assert!(model.get_material().is_none());
    let lamp = model
        .get_children()
        .iter()
        .find(|child| child.name() == Some("lamp"))
        .expect("lamp node");
    assert!(lamp.get_material().is_none());
    assert!(lamp.get_light().is_some());
}

#[test]
fn last_action_wins() {
    let mut configurator = Configurator::new(&Config::default());
    configurator.attach_model(table_and_chairs());

    configurator.pick_color(RED);
    let upload = tint_ngin::Upload::new(
        "oak.jpg",
        "image/jpeg",
        crate::common::test_utils::mk_jpeg(16, 16),
    );
    configurator.upload_image(&upload).unwrap();
    let root = configurator.model_root().unwrap();
    assert!(materials(root).iter().all(|m| m.map.is_some()));

    configurator.pick_color(Color::BLACK);
    let root = configurator.model_root().unwrap();
    assert!(
        materials(root)
            .iter()
            .all(|m| m.map.is_none() && m.color == Color::BLACK)
    );
    assert!(configurator.selection().texture.is_none());
}

#[test]
fn attached_model_takes_the_current_selection() {
    let mut configurator = Configurator::new(&Config::default());
    assert!(configurator.take_dirty());
    assert!(!configurator.take_dirty());

    configurator.pick_color(RED);
    assert!(configurator.take_dirty());
    assert!(configurator.model_root().is_none());

    assert!(configurator.attach_model(table_and_chairs()).is_none());
    assert!(configurator.take_dirty());
    let root = configurator.model_root().unwrap();
    assert!(materials(root).iter().all(|m| m.color == RED));

    let detached = configurator.detach_model().unwrap();
    assert_eq!(count_meshes(detached.as_ref()), MESH_COUNT);
    assert!(configurator.model_root().is_none());
}

#[test]
fn default_selection_is_dark_grey() {
    let configurator = Configurator::new(&Config::default());
    assert_eq!(configurator.selection().color, Color::from_u32(0x4a4a4a));
    assert!(configurator.selection().texture.is_none());
}

#[test]
fn loaded_model_turns_red() {
    let glb = tint_ngin::resources::export::export_glb(table_and_chairs().as_ref()).unwrap();
    let mut model = futures::executor::block_on(
        tint_ngin::resources::load_model_gltf_from_slice(&glb, "table_and_chairs.glb"),
    )
    .unwrap();
    assert_eq!(count_meshes(model.as_ref()), MESH_COUNT);

    apply_color(Some(&mut model), Color::from_hex("#FF0000").unwrap());
    let materials = materials(model.as_ref());
    assert_eq!(materials.len(), MESH_COUNT);
    assert!(materials.iter().all(|m| m.color == RED && m.map.is_none()));
}
