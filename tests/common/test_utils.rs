use std::{io::Cursor, sync::Arc};

use office_scene::{
    assets::{OFFICE, RoomTextures},
    config::OfficeConfig,
    loader::PendingLoad,
    office::Office,
    resources::MemorySource,
};

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// One triangle in the XY plane, (0,0,0) (1,0,0) (0,1,0), facing +Z.
fn triangle_bin() -> Vec<u8> {
    let mut bin = Vec::new();
    for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    bin
}

fn triangle_json(node_name: &str, image_uri: Option<&str>, bin_len: usize) -> String {
    let (material, textures) = match image_uri {
        Some(uri) => (
            r#"{"pbrMetallicRoughness":{"baseColorFactor":[0.5,0.5,0.5,1.0],"baseColorTexture":{"index":0}}}"#
                .to_string(),
            format!(r#","textures":[{{"source":0}}],"images":[{{"uri":"{}"}}]"#, uri),
        ),
        None => (
            r#"{"pbrMetallicRoughness":{"baseColorFactor":[0.5,0.5,0.5,1.0]}}"#.to_string(),
            String::new(),
        ),
    };
    format!(
        r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],"nodes":[{{"name":"{node}","mesh":0}}],"meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}},"indices":1,"material":0}}]}}],"materials":[{material}]{textures},"accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}},{{"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}}],"bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36,"target":34962}},{{"buffer":0,"byteOffset":36,"byteLength":6,"target":34963}}],"buffers":[{{"byteLength":{bin_len}}}]}}"#,
        node = node_name,
        material = material,
        textures = textures,
        bin_len = bin_len,
    )
}

/// A binary glTF holding a single triangle on a node named `node_name`,
/// optionally textured with an image next to the model file.
pub fn triangle_glb(node_name: &str, image_uri: Option<&str>) -> Vec<u8> {
    let bin = triangle_bin();
    let mut json = triangle_json(node_name, image_uri, bin.len()).into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(&bin);
    glb
}

pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("failed to encode png");
    bytes.into_inner()
}

/// Every asset the office asks for: the registered model and the three room
/// images.
pub fn complete_assets() -> MemorySource {
    let textures = RoomTextures::default();
    MemorySource::new()
        .with(OFFICE.model, triangle_glb("desk", None))
        .with(textures.floor, png(4, 4, [200, 200, 200, 255]))
        .with(textures.wall, png(4, 4, [255, 255, 255, 255]))
        .with(textures.ceiling, png(4, 4, [240, 240, 240, 255]))
}

pub fn office_with(source: MemorySource, config: OfficeConfig) -> Office {
    Office::new(config, Arc::new(source), 800, 600)
}

/// Completes `loads` in order and applies every outcome.
pub fn complete(office: &mut Office, loads: Vec<PendingLoad>) {
    for load in loads {
        let outcome = futures::executor::block_on(load);
        office.on_loaded(outcome);
    }
}
