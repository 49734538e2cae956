//! Asynchronous model and texture loading.
//!
//! The loader only produces futures; it never touches the scene. Each future
//! resolves to a [`LoadOutcome`] that the caller hands back to
//! [`crate::office::Office::on_loaded`] once it completes, so insertion order
//! follows completion order and a failed load leaves the scene untouched.

use std::sync::Arc;

use cgmath::Vector3;

use crate::{
    assets::AssetEntry,
    binder::TextureRequest,
    data_structures::scene_graph::{NodeId, SceneObject},
    resources::{AssetSource, BoxedFuture, boxed, decode_image, model::load_model_gltf},
};

#[derive(Debug)]
pub enum LoadOutcome {
    Model {
        entry: AssetEntry,
        result: anyhow::Result<SceneObject>,
    },
    Texture {
        /// The surface the image is for.
        target: NodeId,
        request: TextureRequest,
        result: anyhow::Result<Arc<image::RgbaImage>>,
    },
}

pub type PendingLoad = BoxedFuture<'static, LoadOutcome>;

#[derive(Clone)]
pub struct ModelLoader {
    source: Arc<dyn AssetSource>,
}

impl ModelLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    /// Fetches and parses the model of `entry`, then applies its placement.
    pub fn load(&self, entry: &AssetEntry) -> PendingLoad {
        let source = self.source.clone();
        let entry = *entry;
        boxed(async move {
            log::debug!("loading model {} from {}", entry.name, entry.model);
            let result = load_model_gltf(source, entry.model)
                .await
                .map(|object| place(object, &entry));
            LoadOutcome::Model { entry, result }
        })
    }

    /// Fetches and decodes the image the surface `target` is waiting for.
    pub fn load_texture(&self, target: NodeId, request: TextureRequest) -> PendingLoad {
        let source = self.source.clone();
        boxed(async move {
            let result = match source.fetch(&request.image).await {
                Ok(bytes) => decode_image(&bytes, &request.image).map(Arc::new),
                Err(e) => Err(e),
            };
            LoadOutcome::Texture {
                target,
                request,
                result,
            }
        })
    }
}

/// Names the model root after its entry, moves and scales it, and marks every
/// node in the tree as a shadow caster.
pub fn place(mut object: SceneObject, entry: &AssetEntry) -> SceneObject {
    let placement = entry.placement;
    object.name = entry.name.to_string();
    object.transform.position = placement.translation();
    object.transform.scale = Vector3::new(placement.scale, placement.scale, placement.scale);
    object.traverse_mut(&mut |node| node.cast_shadow = true);
    object
}
