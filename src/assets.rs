//! Static asset registry.
//!
//! The office is assembled from a fixed set of assets: one glTF model per
//! [`AssetEntry`] in [`REGISTRY`] and the three room textures in
//! [`RoomTextures`]. References are paths relative to the configured asset root.

/// Where a loaded model ends up in the world.
///
/// The translation is applied as-is; `scale` only scales the model itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub scale: f32,
}

impl Placement {
    /// Builds a placement from the `[x, y, z, scale]` layout the registry uses.
    pub const fn from_params(params: [f32; 4]) -> Self {
        Self {
            x: params[0],
            y: params[1],
            z: params[2],
            scale: params[3],
        }
    }

    pub fn translation(&self) -> cgmath::Vector3<f32> {
        cgmath::Vector3::new(self.x, self.y, self.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssetEntry {
    pub name: &'static str,
    pub model: &'static str,
    pub placement: Placement,
}

pub const OFFICE: AssetEntry = AssetEntry {
    name: "office",
    model: "models/office.glb",
    placement: Placement::from_params([290.0, 10.0, -290.0, 58.0]),
};

/// A water cooler placement that was authored but never wired into the scene.
/// It is not part of [`REGISTRY`] and is never loaded.
pub const COOLER: AssetEntry = AssetEntry {
    name: "cooler",
    model: "models/cooler.glb",
    placement: Placement::from_params([100.0, 30.0, 100.0, 0.6]),
};

/// Every model requested during setup, exactly once each.
pub const REGISTRY: &[AssetEntry] = &[OFFICE];

/// Image references consumed by the room builder.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomTextures {
    pub floor: String,
    pub wall: String,
    pub ceiling: String,
}

impl Default for RoomTextures {
    fn default() -> Self {
        Self {
            floor: "images/tile.jpeg".to_string(),
            wall: "images/whitewall.jpg".to_string(),
            ceiling: "images/ceiling.jpg".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_are_unique() {
        let mut names: Vec<_> = REGISTRY.iter().map(|entry| entry.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), REGISTRY.len());
    }

    #[test]
    fn cooler_is_not_registered() {
        assert!(!REGISTRY.iter().any(|entry| entry.name == COOLER.name));
    }

    #[test]
    fn office_placement_matches_params() {
        let placement = OFFICE.placement;
        assert_eq!(placement.translation(), cgmath::Vector3::new(290.0, 10.0, -290.0));
        assert_eq!(placement.scale, 58.0);
    }
}
