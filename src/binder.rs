//! Texture binding.
//!
//! Turns an image reference and a geometry into a drawable surface whose texture
//! repeats at a given density along U and V. Every call allocates a fresh
//! [`Material`]; nothing is cached, so two surfaces bound to the same image are
//! still recoloured and uploaded independently.

use std::sync::Arc;

use crate::data_structures::{
    geometry::Geometry,
    material::Material,
    scene_graph::{Mesh, SceneObject},
};

/// A surface waiting for its image: the node name it was created under and
/// the asset reference to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureRequest {
    pub surface: String,
    pub image: String,
}

/// Binds `image` to `geometry` with the given tiling.
///
/// The returned surface renders with a white placeholder until the image has
/// been fetched and assigned; the request tells the caller what to fetch.
pub fn texture_surface(
    name: &str,
    geometry: Geometry,
    image: &str,
    repeat: [f32; 2],
) -> (SceneObject, TextureRequest) {
    let material = Material::tiled(repeat);
    let surface = SceneObject::with_mesh(
        name,
        Mesh {
            geometry: Arc::new(geometry),
            material,
        },
    );
    let request = TextureRequest {
        surface: name.to_string(),
        image: image.to_string(),
    };
    (surface, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{geometry::plane, material::Rgb, scene_graph::Scene};

    #[test]
    fn surfaces_do_not_share_materials() {
        let (a, _) = texture_surface("a", plane(1.0, 1.0), "images/tile.jpeg", [2.0, 2.0]);
        let (b, _) = texture_surface("b", plane(1.0, 1.0), "images/tile.jpeg", [2.0, 2.0]);
        let mut scene = Scene::new();
        let a = scene.add(a, None);
        let b = scene.add(b, None);

        scene.set_color(a, Rgb::from_hex(0xff0000));
        assert_eq!(scene.material(b).unwrap().color, Rgb::WHITE);
    }

    #[test]
    fn request_names_surface_and_image() {
        let (surface, request) = texture_surface("floor", plane(1.0, 1.0), "images/tile.jpeg", [100.0, 100.0]);
        assert_eq!(request.surface, "floor");
        assert_eq!(request.image, "images/tile.jpeg");
        let material = &surface.mesh.as_ref().unwrap().material;
        assert_eq!(material.repeat, [100.0, 100.0]);
        assert!(material.texture.is_placeholder());
    }
}
