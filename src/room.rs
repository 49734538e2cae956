//! The office room: a tiled floor, four walls and a ceiling.
//!
//! All dimensions are literal constants. The walls are rectangles extruded into
//! thin slabs and then rotated and moved into place; the ceiling uses the same
//! construction with a deeper outline laid flat at wall height.

use std::f32::consts::FRAC_PI_2;

use cgmath::Rad;

use crate::{
    assets::RoomTextures,
    binder::{TextureRequest, texture_surface},
    data_structures::{
        geometry::{plane, rectangle},
        scene_graph::SceneObject,
        transform::Transform,
    },
};

pub const HALF_WIDTH: f32 = 300.0;
pub const WALL_HEIGHT: f32 = 150.0;
pub const CEILING_DEPTH: f32 = 600.0;
pub const WALL_THICKNESS: f32 = 2.0;
pub const FLOOR_SIZE: f32 = 5000.0;
pub const FLOOR_REPEAT: [f32; 2] = [100.0, 100.0];
pub const WALL_REPEAT: [f32; 2] = [0.01, 0.005];

pub const FLOOR: &str = "floor";
pub const WALL_FRONT: &str = "wall_front";
pub const WALL_BACK: &str = "wall_back";
pub const WALL_RIGHT: &str = "wall_right";
pub const WALL_LEFT: &str = "wall_left";
pub const CEILING: &str = "ceiling";

/// The six room surfaces plus the images they wait for.
#[derive(Debug)]
pub struct Room {
    pub floor: SceneObject,
    /// Four walls followed by the ceiling.
    pub enclosure: Vec<SceneObject>,
    pub textures: Vec<TextureRequest>,
}

impl Room {
    pub fn surface_count(&self) -> usize {
        1 + self.enclosure.len()
    }
}

fn floor(image: &str) -> (SceneObject, TextureRequest) {
    let (mut floor, request) =
        texture_surface(FLOOR, plane(FLOOR_SIZE, FLOOR_SIZE), image, FLOOR_REPEAT);
    floor.transform = Transform::from_rotation_x(Rad(-FRAC_PI_2));
    (floor, request)
}

fn wall(name: &str, height: f32, z: f32, image: &str) -> (SceneObject, TextureRequest) {
    let geometry = rectangle(HALF_WIDTH, height).extrude(WALL_THICKNESS);
    let (mut wall, request) = texture_surface(name, geometry, image, WALL_REPEAT);
    wall.transform.position.z = z;
    (wall, request)
}

pub fn build_room(textures: &RoomTextures) -> Room {
    let mut requests = Vec::with_capacity(6);

    let (floor, request) = floor(&textures.floor);
    requests.push(request);

    let (front, request) = wall(WALL_FRONT, WALL_HEIGHT, HALF_WIDTH, &textures.wall);
    requests.push(request);

    let (back, request) = wall(WALL_BACK, WALL_HEIGHT, -HALF_WIDTH, &textures.wall);
    requests.push(request);

    let (mut right, request) = wall(WALL_RIGHT, WALL_HEIGHT, 0.0, &textures.wall);
    right.transform.rotation = Transform::from_rotation_y(Rad(FRAC_PI_2)).rotation;
    right.transform.position.x = HALF_WIDTH;
    requests.push(request);

    let (mut left, request) = wall(WALL_LEFT, WALL_HEIGHT, 0.0, &textures.wall);
    left.transform.rotation = Transform::from_rotation_y(Rad(FRAC_PI_2)).rotation;
    left.transform.position.x = -HALF_WIDTH;
    requests.push(request);

    let (mut ceiling, request) = wall(CEILING, CEILING_DEPTH, -HALF_WIDTH, &textures.ceiling);
    ceiling.transform.rotation = Transform::from_rotation_x(Rad(FRAC_PI_2)).rotation;
    ceiling.transform.position.y = WALL_HEIGHT;
    requests.push(request);

    Room {
        floor,
        enclosure: vec![front, back, right, left, ceiling],
        textures: requests,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::scene_graph::Scene;
    use cgmath::Transform as _;

    fn world_bounds(scene: &Scene, name: &str) -> ([f32; 3], [f32; 3]) {
        let id = scene.find(name).unwrap();
        let node = scene.node(id).unwrap();
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for vertex in &node.mesh.as_ref().unwrap().geometry.vertices {
            let p = node.world.transform_point(vertex.position.into());
            for (axis, value) in [p.x, p.y, p.z].into_iter().enumerate() {
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
        }
        (min, max)
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-2
    }

    fn build_scene() -> Scene {
        let room = build_room(&RoomTextures::default());
        let mut scene = Scene::new();
        scene.add(room.floor, None);
        for surface in room.enclosure {
            scene.add(surface, None);
        }
        scene
    }

    #[test]
    fn room_has_six_textured_surfaces() {
        let room = build_room(&RoomTextures::default());
        assert_eq!(room.surface_count(), 6);
        assert_eq!(room.textures.len(), 6);
        let ceiling = room.textures.iter().find(|r| r.surface == CEILING).unwrap();
        assert_eq!(ceiling.image, RoomTextures::default().ceiling);
    }

    #[test]
    fn floor_lies_flat_at_zero() {
        let scene = build_scene();
        let (min, max) = world_bounds(&scene, FLOOR);
        assert!(close(min[1], 0.0) && close(max[1], 0.0));
        assert!(close(min[0], -2500.0) && close(max[0], 2500.0));
        assert!(close(min[2], -2500.0) && close(max[2], 2500.0));
    }

    #[test]
    fn side_walls_are_turned_onto_the_z_axis() {
        let scene = build_scene();
        let (min, max) = world_bounds(&scene, WALL_RIGHT);
        assert!(close(min[0], HALF_WIDTH) && close(max[0], HALF_WIDTH + WALL_THICKNESS));
        assert!(close(min[2], -HALF_WIDTH) && close(max[2], HALF_WIDTH));
        assert!(close(min[1], 0.0) && close(max[1], WALL_HEIGHT));

        let (min, max) = world_bounds(&scene, WALL_LEFT);
        assert!(close(min[0], -HALF_WIDTH) && close(max[0], -HALF_WIDTH + WALL_THICKNESS));
    }

    #[test]
    fn ceiling_closes_the_room_at_wall_height() {
        let scene = build_scene();
        let (min, max) = world_bounds(&scene, CEILING);
        assert!(close(max[1], WALL_HEIGHT));
        assert!(close(min[1], WALL_HEIGHT - WALL_THICKNESS));
        assert!(close(min[2], -HALF_WIDTH) && close(max[2], HALF_WIDTH));
        assert!(close(min[0], -HALF_WIDTH) && close(max[0], HALF_WIDTH));
    }
}
