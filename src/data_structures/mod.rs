//! Scene data structures: geometry, materials, transforms, the scene graph and
//! GPU textures.
//!
//! - `geometry` holds CPU vertex/index data and the plane/extrusion generators
//! - `material` describes colour, texture image and tiling per mesh
//! - `transform` holds node transforms and their GPU instance layout
//! - `scene_graph` is the arena that owns every node of a scene
//! - `texture` wraps GPU texture creation

pub mod geometry;
pub mod material;
pub mod scene_graph;
pub mod texture;
pub mod transform;
