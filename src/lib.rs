//! office-scene
//!
//! A hand-authored, first-person 3D office rendered with wgpu, natively and in
//! the browser. A tiled floor, four walls and a ceiling are built from literal
//! dimensions, glTF furniture is loaded in the background, and clicking a
//! surface highlights it.
//!
//! High-level modules
//! - `assets`: the static model registry and room texture references
//! - `binder`: binds tiled textures to surfaces
//! - `camera`: camera, projection and first-person controls
//! - `config`: tuning constants of the scene
//! - `context`: GPU and window context that owns device/queue/pipelines
//! - `data_structures`: geometry, materials, transforms and the scene graph
//! - `flow`: the winit event loop
//! - `loader`: asynchronous model and texture loads
//! - `office`: the scene context tying everything together, usable headless
//! - `pick`: ray-cast picking and the click handler
//! - `pipelines`: render pipelines and shaders
//! - `render`: the GPU mirror of the scene
//! - `resources`: asset sources and glTF parsing
//! - `room`: construction of the room enclosure

pub mod assets;
pub mod binder;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod loader;
pub mod office;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod room;

pub use config::OfficeConfig;
pub use office::Office;
