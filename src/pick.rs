//! Object picking by ray casting.
//!
//! A click is turned into a ray from the camera through the pointer position
//! and tested against every mesh in the scene: first against the mesh's world
//! bounding box, then triangle by triangle. Only front faces count. The nearest
//! hit is recoloured with the highlight colour.
//!
//! Picking runs on the CPU against the geometry the scene keeps, so it works
//! without a GPU and is covered by headless tests.

use cgmath::{ElementWise, InnerSpace, Matrix4, Point3, Transform as _, Vector3};

use crate::{
    camera::{Camera, Projection},
    data_structures::{
        geometry::Geometry,
        material::Rgb,
        scene_graph::{NodeId, Scene},
    },
};

const EPSILON: f32 = 1e-6;

/// Converts a pointer position in pixels to normalized device coordinates,
/// x to the right and y up, both in `[-1, 1]`.
pub fn to_ndc(px: f32, py: f32, width: f32, height: f32) -> [f32; 2] {
    let width = width.max(1.0);
    let height = height.max(1.0);
    [(px / width) * 2.0 - 1.0, -(py / height) * 2.0 + 1.0]
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Normalized.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// The ray from the camera through `ndc` on the near plane.
    pub fn from_camera(camera: &Camera, projection: &Projection, ndc: [f32; 2]) -> Self {
        let half_height = (projection.fovy.0 / 2.0).tan();
        let half_width = half_height * projection.aspect;
        let direction = camera.forward()
            + camera.right() * (ndc[0] * half_width)
            + camera.up() * (ndc[1] * half_height);
        Self::new(camera.position, direction)
    }

    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });
        Some(Self { min, max })
    }

    /// World-space bounds of `geometry` under `world`.
    pub fn of_geometry(geometry: &Geometry, world: &Matrix4<f32>) -> Option<Self> {
        let local = Self::from_points(geometry.vertices.iter().map(|v| Point3::from(v.position)))?;
        let corners = [
            Point3::new(local.min.x, local.min.y, local.min.z),
            Point3::new(local.max.x, local.min.y, local.min.z),
            Point3::new(local.min.x, local.max.y, local.min.z),
            Point3::new(local.min.x, local.min.y, local.max.z),
            Point3::new(local.max.x, local.max.y, local.min.z),
            Point3::new(local.max.x, local.min.y, local.max.z),
            Point3::new(local.min.x, local.max.y, local.max.z),
            Point3::new(local.max.x, local.max.y, local.max.z),
        ];
        Self::from_points(corners.into_iter().map(|c| world.transform_point(c)))
    }

    /// Distance along the ray to the box, `None` if the ray misses it.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );
        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t_near = t_min.x.min(t_max.x).max(t_min.y.min(t_max.y)).max(t_min.z.min(t_max.z));
        let t_far = t_min.x.max(t_max.x).min(t_min.y.max(t_max.y)).min(t_min.z.max(t_max.z));

        // Flat boxes (a plane) yield NaN on the axis the ray runs parallel to,
        // which min/max skip.
        if t_near <= t_far + EPSILON && t_far >= 0.0 {
            Some(t_near.max(0.0))
        } else {
            None
        }
    }
}

/// Möller–Trumbore; returns the distance to the triangle. Front faces wind
/// counter-clockwise as seen along the ray; back faces only count when
/// `double_sided` is set.
pub fn intersect_triangle(
    ray: &Ray,
    [a, b, c]: [Point3<f32>; 3],
    double_sided: bool,
) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);
    let culled = if double_sided {
        det.abs() < EPSILON
    } else {
        det < EPSILON
    };
    if culled {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.origin - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(qvec) * inv_det;
    (t > EPSILON).then_some(t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub node: NodeId,
    pub distance: f32,
    pub point: Point3<f32>,
}

/// Every mesh node the ray hits, nearest first. A node appears once, at its
/// nearest triangle.
pub fn intersect_scene(scene: &Scene, ray: &Ray) -> Vec<Intersection> {
    let mut hits = Vec::new();
    for (id, node, mesh) in scene.meshes() {
        let Some(bounds) = Aabb::of_geometry(&mesh.geometry, &node.world) else {
            continue;
        };
        if bounds.intersect_ray(ray).is_none() {
            continue;
        }
        let nearest = mesh
            .geometry
            .triangles()
            .filter_map(|[a, b, c]| {
                let world = [a, b, c].map(|p| node.world.transform_point(Point3::from(p)));
                intersect_triangle(ray, world, mesh.material.double_sided)
            })
            .min_by(|x, y| x.total_cmp(y));
        if let Some(distance) = nearest {
            hits.push(Intersection {
                node: id,
                distance,
                point: ray.point_at(distance),
            });
        }
    }
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickState {
    Idle,
    HandlingClick,
}

/// Owns the pointer state and turns clicks into highlights.
///
/// There is a single handler per scene and it handles every click exactly
/// once; it never re-registers itself.
#[derive(Debug)]
pub struct InteractionHandler {
    state: ClickState,
    pointer: [f32; 2],
    highlight: Rgb,
    clicks_handled: u64,
    attached: bool,
}

impl InteractionHandler {
    pub fn new(highlight: Rgb) -> Self {
        Self {
            state: ClickState::Idle,
            pointer: [0.0, 0.0],
            highlight,
            clicks_handled: 0,
            attached: true,
        }
    }

    /// Last pointer position in normalized device coordinates.
    pub fn pointer(&self) -> [f32; 2] {
        self.pointer
    }

    pub fn pointer_moved(&mut self, px: f32, py: f32, width: f32, height: f32) {
        self.pointer = to_ndc(px, py, width, height);
    }

    pub fn state(&self) -> ClickState {
        self.state
    }

    pub fn clicks_handled(&self) -> u64 {
        self.clicks_handled
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Casts a ray through the last pointer position and highlights the
    /// nearest mesh. Returns the highlighted node.
    pub fn click(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        projection: &Projection,
    ) -> Option<NodeId> {
        if !self.attached || self.state == ClickState::HandlingClick {
            return None;
        }
        self.state = ClickState::HandlingClick;
        self.clicks_handled += 1;

        let ray = Ray::from_camera(camera, projection, self.pointer);
        let hit = intersect_scene(scene, &ray).first().map(|hit| hit.node);
        if let Some(node) = hit {
            log::debug!("picked {:?} ({})", node, scene.node(node).map_or("", |n| n.name.as_str()));
            scene.set_color(node, self.highlight);
        }

        self.state = ClickState::Idle;
        hit
    }

    /// Stops reacting to clicks.
    pub fn detach(&mut self) {
        self.attached = false;
        self.state = ClickState::Idle;
    }
}
