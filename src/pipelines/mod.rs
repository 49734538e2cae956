//! Render pipelines: textured meshes (`basic`), the ambient light group
//! (`light`) and the axes helper (`lines`).

pub mod basic;
pub mod light;
pub mod lines;
