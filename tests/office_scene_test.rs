use std::time::Duration;

use cgmath::{Transform as _, Vector3};
use office_scene::{
    assets::{COOLER, OFFICE, REGISTRY},
    config::OfficeConfig,
    data_structures::{
        material::{Rgb, TextureImage},
        scene_graph::SceneChange,
    },
    loader::{LoadOutcome, ModelLoader},
    office::ENCLOSURE_GROUP,
    pick::{ClickState, to_ndc},
    resources::MemorySource,
    room::{CEILING, FLOOR, WALL_BACK, WALL_FRONT, WALL_LEFT, WALL_RIGHT},
};
use winit::{event::MouseButton, keyboard::KeyCode};

mod common;

use common::test_utils::{complete, complete_assets, office_with, png, triangle_glb};

const RED: Rgb = Rgb::from_hex(0xff0000);

fn frames(office: &mut office_scene::Office, count: usize) {
    for _ in 0..count {
        office.frame(Duration::from_millis(16));
    }
}

#[test]
fn setup_loads_every_registered_model_at_its_placement() {
    let mut office = office_with(complete_assets(), OfficeConfig::default());
    let loads = office.setup();
    complete(&mut office, loads);

    let scene = office.scene();
    for entry in REGISTRY {
        let root = scene.find(entry.name).expect("model root missing");
        let node = scene.node(root).unwrap();
        assert_eq!(node.parent, None);
        assert_eq!(node.local.position, entry.placement.translation());
        let s = entry.placement.scale;
        assert_eq!(node.local.scale, Vector3::new(s, s, s));
        assert!(scene.descendants(root).iter().all(|id| scene.node(*id).unwrap().cast_shadow));
    }
    assert!(scene.find(COOLER.name).is_none());

    // The triangle's (1, 0, 0) corner lands at translation + scale along X.
    let desk = scene.node(scene.find("desk").unwrap()).unwrap();
    let corner = desk.world.transform_point(cgmath::Point3::new(1.0, 0.0, 0.0));
    assert!((corner.x - (290.0 + 58.0)).abs() < 1e-3);
    assert!((corner.y - 10.0).abs() < 1e-3);
    assert!((corner.z + 290.0).abs() < 1e-3);
}

#[test]
fn room_has_six_surfaces_with_their_textures() {
    let mut office = office_with(complete_assets(), OfficeConfig::default());
    let loads = office.setup();
    complete(&mut office, loads);

    let scene = office.scene();
    let group = scene.find(ENCLOSURE_GROUP).unwrap();
    for name in [FLOOR, WALL_FRONT, WALL_BACK, WALL_RIGHT, WALL_LEFT, CEILING] {
        let id = scene.find(name).unwrap_or_else(|| panic!("{} missing", name));
        let material = scene.material(id).unwrap();
        assert!(matches!(material.texture, TextureImage::Decoded(_)), "{} untextured", name);
        if name != FLOOR {
            assert_eq!(scene.node(id).unwrap().parent, Some(group));
        }
    }
    let floor = scene.material(scene.find(FLOOR).unwrap()).unwrap();
    assert_eq!(floor.repeat, [100.0, 100.0]);
    let ceiling = scene.material(scene.find(CEILING).unwrap()).unwrap();
    assert_eq!(ceiling.repeat, [0.01, 0.005]);
}

#[test]
fn clicking_the_back_wall_turns_it_red() {
    let mut office = office_with(complete_assets(), OfficeConfig::default());
    let loads = office.setup();
    complete(&mut office, loads);
    office.scene_mut().drain_changes();

    office.on_pointer_moved(400.0, 300.0);
    office.on_mouse_button(MouseButton::Left, true);
    let hit = office.on_mouse_button(MouseButton::Left, false);

    let back = office.scene().find(WALL_BACK).unwrap();
    assert_eq!(hit, Some(back));
    assert_eq!(office.scene().material(back).unwrap().color, RED);
    let front = office.scene().find(WALL_FRONT).unwrap();
    assert_eq!(office.scene().material(front).unwrap().color, Rgb::WHITE);
    assert_eq!(
        office.scene_mut().drain_changes(),
        vec![SceneChange::MaterialChanged(back)]
    );
}

#[test]
fn nearest_hit_wins_over_the_wall_behind_it() {
    let config = OfficeConfig {
        camera_position: [299.0, 20.0, 0.0],
        ..OfficeConfig::default()
    };
    let mut office = office_with(complete_assets(), config);
    let loads = office.setup();
    complete(&mut office, loads);

    office.on_pointer_moved(400.0, 300.0);
    let hit = office.click();

    let desk = office.scene().find("desk").unwrap();
    assert_eq!(hit, Some(desk));
    assert_eq!(office.scene().material(desk).unwrap().color, RED);
    let back = office.scene().find(WALL_BACK).unwrap();
    assert_eq!(office.scene().material(back).unwrap().color, Rgb::WHITE);
}

#[test]
fn clicking_empty_space_changes_nothing() {
    // Above the ceiling, looking up into the sky.
    let config = OfficeConfig {
        camera_position: [0.0, 500.0, 0.0],
        camera_pitch_deg: 80.0,
        ..OfficeConfig::default()
    };
    let mut office = office_with(MemorySource::new(), config);
    office.setup();
    office.scene_mut().drain_changes();

    office.on_pointer_moved(400.0, 300.0);
    let hit = office.click();
    assert_eq!(hit, None);
    assert!(office.scene_mut().drain_changes().is_empty());
    assert_eq!(office.interaction().clicks_handled(), 1);
}

#[test]
fn pointer_corners_map_to_ndc() {
    assert_eq!(to_ndc(0.0, 0.0, 1024.0, 768.0), [-1.0, 1.0]);
    assert_eq!(to_ndc(1024.0, 768.0, 1024.0, 768.0), [1.0, -1.0]);
    assert_eq!(to_ndc(512.0, 384.0, 1024.0, 768.0), [0.0, 0.0]);

    let mut office = office_with(MemorySource::new(), OfficeConfig::default());
    office.on_pointer_moved(0.0, 600.0);
    assert_eq!(office.interaction().pointer(), [-1.0, -1.0]);
}

#[test]
fn idle_frames_keep_the_camera_still() {
    let mut office = office_with(MemorySource::new(), OfficeConfig::default());
    office.setup();
    let start = *office.camera();
    frames(&mut office, 240);
    assert_eq!(office.camera().position, start.position);
    assert_eq!(office.camera().yaw, start.yaw);
    assert_eq!(office.camera().pitch, start.pitch);
}

#[test]
fn walking_forward_is_frame_rate_independent() {
    let mut slow = office_with(MemorySource::new(), OfficeConfig::default());
    let mut fast = office_with(MemorySource::new(), OfficeConfig::default());
    slow.on_key(KeyCode::KeyW, true);
    fast.on_key(KeyCode::ArrowUp, true);

    slow.frame(Duration::from_millis(100));
    for _ in 0..10 {
        fast.frame(Duration::from_millis(10));
    }
    let slow_z = slow.camera().position.z;
    let fast_z = fast.camera().position.z;
    assert!((slow_z - (10.0 - 14.0)).abs() < 1e-3);
    assert!((slow_z - fast_z).abs() < 1e-3);
}

#[test]
fn a_click_after_many_frames_is_handled_once() {
    let mut office = office_with(complete_assets(), OfficeConfig::default());
    let loads = office.setup();
    complete(&mut office, loads);
    frames(&mut office, 50);
    office.scene_mut().drain_changes();

    office.on_pointer_moved(400.0, 300.0);
    office.on_mouse_button(MouseButton::Left, true);
    office.on_mouse_button(MouseButton::Left, false);

    assert_eq!(office.interaction().clicks_handled(), 1);
    assert_eq!(office.interaction().state(), ClickState::Idle);
    assert_eq!(office.scene_mut().drain_changes().len(), 1);

    frames(&mut office, 50);
    assert_eq!(office.interaction().clicks_handled(), 1);
}

#[test]
fn failed_model_load_inserts_nothing() {
    let source = complete_assets().with(OFFICE.model, b"definitely not glTF".to_vec());
    let mut office = office_with(source, OfficeConfig::default());
    let loads = office.setup();
    let before = office.scene().len();

    let mut failures = 0;
    for load in loads {
        match futures::executor::block_on(load) {
            LoadOutcome::Model { result, .. } if result.is_err() => {
                failures += 1;
                assert_eq!(office.on_loaded(LoadOutcome::Model { entry: OFFICE, result }), None);
            }
            outcome => {
                office.on_loaded(outcome);
            }
        }
    }
    assert_eq!(failures, 1);
    assert_eq!(office.scene().len(), before);
    assert!(office.scene().find(OFFICE.name).is_none());
}

#[test]
fn room_textures_never_land_on_a_model_node_of_the_same_name() {
    let source = complete_assets().with(OFFICE.model, triangle_glb(WALL_BACK, None));
    let mut office = office_with(source, OfficeConfig::default());
    let loads = office.setup();

    // The model arrives before any room texture does.
    let (models, textures): (Vec<_>, Vec<_>) = loads
        .into_iter()
        .map(futures::executor::block_on)
        .partition(|outcome| matches!(outcome, LoadOutcome::Model { .. }));
    for outcome in models.into_iter().chain(textures) {
        office.on_loaded(outcome);
    }

    let scene = office.scene();
    let group = scene.find(ENCLOSURE_GROUP).unwrap();
    let named: Vec<_> = scene
        .iter()
        .filter(|(_, node)| node.name == WALL_BACK && node.mesh.is_some())
        .collect();
    assert_eq!(named.len(), 2);
    for (id, node) in named {
        let texture = &scene.material(id).unwrap().texture;
        if node.parent == Some(group) {
            assert!(matches!(texture, TextureImage::Decoded(_)));
        } else {
            assert!(texture.is_placeholder());
        }
    }
}

#[test]
fn models_are_inserted_in_completion_order() {
    let source = MemorySource::new()
        .with(OFFICE.model, triangle_glb("desk", None))
        .with(COOLER.model, triangle_glb("tank", None));
    let loader = ModelLoader::new(std::sync::Arc::new(source.clone()));
    let mut office = office_with(source, OfficeConfig::default());

    let first_requested = loader.load(&OFFICE);
    let second_requested = loader.load(&COOLER);
    let cooler = futures::executor::block_on(second_requested);
    let desk = futures::executor::block_on(first_requested);

    let cooler_id = office.on_loaded(cooler).unwrap();
    let desk_id = office.on_loaded(desk).unwrap();
    assert_eq!(office.scene().roots(), &[cooler_id, desk_id]);
    assert_eq!(office.scene().node(cooler_id).unwrap().name, COOLER.name);
}

#[test]
fn model_textures_resolve_next_to_the_model() {
    let source = MemorySource::new()
        .with(OFFICE.model, triangle_glb("desk", Some("desk.png")))
        .with("models/desk.png", png(2, 2, [10, 20, 30, 255]));
    let mut office = office_with(source.clone(), OfficeConfig::default());
    let outcome =
        futures::executor::block_on(ModelLoader::new(std::sync::Arc::new(source)).load(&OFFICE));
    office.on_loaded(outcome);

    let desk = office.scene().find("desk").unwrap();
    let material = office.scene().material(desk).unwrap();
    assert!(material.lit);
    assert!((material.color.r - 0.5).abs() < 1e-6);
    match &material.texture {
        TextureImage::Decoded(image) => assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]),
        TextureImage::Placeholder => panic!("model texture was not loaded"),
    }
}

#[test]
fn missing_model_texture_falls_back_to_placeholder() {
    let source = MemorySource::new().with(OFFICE.model, triangle_glb("desk", Some("gone.png")));
    let mut office = office_with(source.clone(), OfficeConfig::default());
    let outcome = futures::executor::block_on(
        ModelLoader::new(std::sync::Arc::new(source)).load(&OFFICE),
    );
    assert!(office.on_loaded(outcome).is_some());
    let desk = office.scene().find("desk").unwrap();
    assert!(office.scene().material(desk).unwrap().texture.is_placeholder());
}

#[test]
fn disposed_office_ignores_late_loads_and_clicks() {
    let mut office = office_with(complete_assets(), OfficeConfig::default());
    let loads = office.setup();
    office.dispose();
    let before = office.scene().len();
    complete(&mut office, loads);
    assert_eq!(office.scene().len(), before);

    office.on_pointer_moved(400.0, 300.0);
    assert_eq!(office.click(), None);
    assert!(!office.interaction().is_attached());
}

#[tokio::test]
async fn filesystem_source_reads_relative_to_its_root() {
    use office_scene::resources::{AssetSource, FsSource};

    let root = std::env::temp_dir().join(format!("office-scene-assets-{}", std::process::id()));
    tokio::fs::create_dir_all(root.join("images")).await.unwrap();
    tokio::fs::write(root.join("images/tile.jpeg"), png(1, 1, [1, 2, 3, 255]))
        .await
        .unwrap();

    let source = FsSource::new(&root);
    let bytes = source.fetch("images/tile.jpeg").await.unwrap();
    assert!(!bytes.is_empty());
    assert!(source.fetch("images/missing.jpg").await.is_err());

    tokio::fs::remove_dir_all(&root).await.unwrap();
}
