//! glTF 2.0 model loading.
//!
//! Buffers and images are either embedded (GLB binary chunk, buffer views or
//! base64 data URIs) or resolved through an [`AssetSource`], relative to the
//! model file. The node hierarchy of the default scene is rebuilt as a
//! [`SceneObject`] tree; every primitive becomes a mesh with its own material.

use std::sync::Arc;

use anyhow::{Context as _, bail};

use crate::{
    data_structures::{
        geometry::{Geometry, ModelVertex},
        material::{Material, Rgb, TextureImage},
        scene_graph::{Mesh, SceneObject},
        transform::Transform,
    },
    resources::{AssetSource, decode_data_uri, decode_image, resolve_relative},
};

/// Where an image's bytes live, detached from the document so it can be
/// resolved across awaits.
enum ImageData {
    View {
        buffer: usize,
        offset: usize,
        length: usize,
    },
    Uri(String),
}

pub async fn load_model_gltf(
    source: Arc<dyn AssetSource>,
    file_name: &str,
) -> anyhow::Result<SceneObject> {
    let bytes = source.fetch(file_name).await?;
    let gltf = ::gltf::Gltf::from_slice(&bytes)
        .with_context(|| format!("{} is not a valid glTF file", file_name))?;

    // Load buffers
    let buffer_uris: Vec<Option<String>> = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            ::gltf::buffer::Source::Bin => None,
            ::gltf::buffer::Source::Uri(uri) => Some(uri.to_string()),
        })
        .collect();
    let mut buffer_data = Vec::with_capacity(buffer_uris.len());
    for uri in buffer_uris {
        match uri {
            None => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => bail!("{} references a binary chunk it does not have", file_name),
            },
            Some(uri) if uri.starts_with("data:") => buffer_data.push(
                decode_data_uri(&uri)
                    .with_context(|| format!("{}: embedded buffer", file_name))?,
            ),
            Some(uri) => {
                let path = resolve_relative(file_name, &uri);
                buffer_data.push(source.fetch(&path).await?);
            }
        }
    }

    // Load images. A broken image degrades to the placeholder instead of
    // failing the whole model.
    let image_data: Vec<ImageData> = gltf
        .images()
        .map(|image| match image.source() {
            ::gltf::image::Source::View { view, .. } => ImageData::View {
                buffer: view.buffer().index(),
                offset: view.offset(),
                length: view.length(),
            },
            ::gltf::image::Source::Uri { uri, .. } => ImageData::Uri(uri.to_string()),
        })
        .collect();
    let mut images = Vec::with_capacity(image_data.len());
    for (idx, data) in image_data.into_iter().enumerate() {
        let label = format!("{} image {}", file_name, idx);
        let decoded = match data {
            ImageData::View {
                buffer,
                offset,
                length,
            } => buffer_data
                .get(buffer)
                .and_then(|bytes| bytes.get(offset..offset + length))
                .context("image view is out of bounds")
                .and_then(|bytes| decode_image(bytes, &label)),
            ImageData::Uri(uri) if uri.starts_with("data:") => {
                decode_data_uri(&uri).and_then(|bytes| decode_image(&bytes, &label))
            }
            ImageData::Uri(uri) => {
                let path = resolve_relative(file_name, &uri);
                match source.fetch(&path).await {
                    Ok(bytes) => decode_image(&bytes, &label),
                    Err(e) => Err(e),
                }
            }
        };
        images.push(match decoded {
            Ok(image) => TextureImage::Decoded(Arc::new(image)),
            Err(e) => {
                log::warn!("{}: {:#}", label, e);
                TextureImage::Placeholder
            }
        });
    }

    // Load materials
    let materials: Vec<Material> = gltf
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            let texture = pbr
                .base_color_texture()
                .and_then(|info| images.get(info.texture().source().index()).cloned())
                .unwrap_or(TextureImage::Placeholder);
            let mut standard = Material::standard(Rgb { r, g, b }, texture);
            standard.double_sided = material.double_sided();
            standard
        })
        .collect();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("{} contains no scene", file_name))?;

    let mut root = SceneObject::group(file_name);
    for node in scene.nodes() {
        root.add_child(to_scene_object(node, &buffer_data, &materials));
    }
    Ok(root)
}

fn to_scene_object(
    node: ::gltf::Node,
    buffers: &[Vec<u8>],
    materials: &[Material],
) -> SceneObject {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let (translation, rotation, scale) = node.transform().decomposed();

    let mut object = SceneObject::group(name.clone());
    object.transform = Transform {
        position: translation.into(),
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    };

    if let Some(mesh) = node.mesh() {
        let mut meshes: Vec<Mesh> = mesh
            .primitives()
            .filter_map(|primitive| read_primitive(&primitive, buffers, materials, &name))
            .collect();
        if meshes.len() == 1 {
            object.mesh = meshes.pop();
        } else {
            for (idx, mesh) in meshes.into_iter().enumerate() {
                object.add_child(SceneObject::with_mesh(format!("{}_{}", name, idx), mesh));
            }
        }
    }

    for child in node.children() {
        object.add_child(to_scene_object(child, buffers, materials));
    }
    object
}

fn read_primitive(
    primitive: &::gltf::Primitive,
    buffers: &[Vec<u8>],
    materials: &[Material],
    node: &str,
) -> Option<Mesh> {
    if primitive.mode() != ::gltf::mesh::Mode::Triangles {
        log::warn!(
            "{}: skipping primitive {} with unsupported mode {:?}",
            node,
            primitive.index(),
            primitive.mode()
        );
        return None;
    }
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let Some(positions) = reader.read_positions() else {
        log::warn!("{}: primitive {} has no positions", node, primitive.index());
        return None;
    };
    let mut vertices: Vec<ModelVertex> = positions
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();
    if let Some(normals) = reader.read_normals() {
        for (vertex, normal) in vertices.iter_mut().zip(normals) {
            vertex.normal = normal;
        }
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
        for (vertex, tex_coords) in vertices.iter_mut().zip(tex_coords) {
            vertex.tex_coords = tex_coords;
        }
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    if indices.iter().any(|&i| i as usize >= vertices.len()) {
        log::warn!("{}: primitive {} indexes past its vertices", node, primitive.index());
        return None;
    }

    let material = primitive
        .material()
        .index()
        .and_then(|idx| materials.get(idx))
        .cloned()
        .unwrap_or_else(|| Material::standard(Rgb::WHITE, TextureImage::Placeholder));

    Some(Mesh {
        geometry: Arc::new(Geometry { vertices, indices }),
        material,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::MemorySource;

    #[test]
    fn non_gltf_bytes_fail_to_load() {
        let source = Arc::new(MemorySource::new().with("models/broken.glb", b"not a model".to_vec()));
        let result = futures::executor::block_on(load_model_gltf(source, "models/broken.glb"));
        assert!(result.is_err());
    }

    /// A self-contained `.gltf`: one triangle facing +Z, its buffer inlined as
    /// a data URI.
    fn embedded_triangle_gltf(double_sided: bool) -> Vec<u8> {
        use base64::Engine as _;

        let mut bin = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        let payload = base64::engine::general_purpose::STANDARD.encode(&bin);
        format!(
            r#"{{"asset":{{"version":"2.0"}},"scenes":[{{"nodes":[0]}}],"nodes":[{{"name":"sign","mesh":0}}],"meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}},"material":0}}]}}],"materials":[{{"doubleSided":{double_sided}}}],"accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}}],"bufferViews":[{{"buffer":0,"byteLength":36}}],"buffers":[{{"byteLength":36,"uri":"data:application/octet-stream;base64,{payload}"}}]}}"#,
            double_sided = double_sided,
            payload = payload,
        )
        .into_bytes()
    }

    fn load(bytes: Vec<u8>) -> SceneObject {
        let source = Arc::new(MemorySource::new().with("models/sign.gltf", bytes));
        futures::executor::block_on(load_model_gltf(source, "models/sign.gltf")).unwrap()
    }

    #[test]
    fn embedded_buffers_are_decoded() {
        let root = load(embedded_triangle_gltf(false));
        let sign = &root.children[0];
        assert_eq!(sign.name, "sign");
        let mesh = sign.mesh.as_ref().unwrap();
        assert_eq!(mesh.geometry.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
        assert!(!mesh.material.double_sided);
    }

    #[test]
    fn double_sided_materials_can_be_picked_from_behind() {
        use crate::{data_structures::scene_graph::Scene, pick::{Ray, intersect_scene}};
        use cgmath::{Point3, Vector3};

        let behind = Ray::new(Point3::new(0.25, 0.25, -5.0), Vector3::new(0.0, 0.0, 1.0));

        let mut scene = Scene::new();
        scene.add(load(embedded_triangle_gltf(true)), None);
        let hits = intersect_scene(&scene, &behind);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 5.0).abs() < 1e-5);

        let mut scene = Scene::new();
        scene.add(load(embedded_triangle_gltf(false)), None);
        assert!(intersect_scene(&scene, &behind).is_empty());
    }

    #[test]
    fn missing_file_fails_to_load() {
        let source = Arc::new(MemorySource::new());
        let result = futures::executor::block_on(load_model_gltf(source, "models/office.glb"));
        assert!(result.unwrap_err().to_string().contains("models/office.glb"));
    }
}
