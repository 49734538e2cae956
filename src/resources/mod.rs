//! Asset fetching and decoding.
//!
//! Every external file the scene needs goes through an [`AssetSource`]: the
//! filesystem on native targets, HTTP relative to the page origin on the web,
//! or an in-memory map. Fetches are futures so loads never block the render
//! loop; on native they are `Send` so they can run on the tokio runtime.

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use anyhow::{Context as _, bail};
use base64::Engine as _;

pub mod model;

/// A boxed future that is `Send` wherever the platform has threads.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
#[cfg(target_arch = "wasm32")]
pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[cfg(not(target_arch = "wasm32"))]
pub fn boxed<'a, T>(fut: impl Future<Output = T> + Send + 'a) -> BoxedFuture<'a, T> {
    Box::pin(fut)
}
#[cfg(target_arch = "wasm32")]
pub fn boxed<'a, T>(fut: impl Future<Output = T> + 'a) -> BoxedFuture<'a, T> {
    Box::pin(fut)
}

#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}
#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

/// Resolves asset references (paths relative to the asset root) to bytes.
pub trait AssetSource: MaybeSendSync {
    fn fetch(&self, path: &str) -> BoxedFuture<'static, anyhow::Result<Vec<u8>>>;
}

/// Reads assets from a directory on disk.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FsSource {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FsSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetSource for FsSource {
    fn fetch(&self, path: &str) -> BoxedFuture<'static, anyhow::Result<Vec<u8>>> {
        let path = self.root.join(path);
        boxed(async move {
            tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))
        })
    }
}

/// Fetches assets over HTTP from `<page origin>/<asset root>/`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug)]
pub struct HttpSource {
    base: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpSource {
    pub fn from_window(asset_root: &str) -> anyhow::Result<Self> {
        let window = web_sys::window().context("no browser window")?;
        let origin = window
            .location()
            .origin()
            .map_err(|e| anyhow::anyhow!("cannot read page origin: {:?}", e))?;
        Ok(Self {
            base: format!("{}/{}", origin.trim_end_matches('/'), asset_root),
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl AssetSource for HttpSource {
    fn fetch(&self, path: &str) -> BoxedFuture<'static, anyhow::Result<Vec<u8>>> {
        let url = format!("{}/{}", self.base, path);
        boxed(async move {
            let response = reqwest::get(&url)
                .await
                .with_context(|| format!("request for {} failed", url))?
                .error_for_status()
                .with_context(|| format!("server refused {}", url))?;
            let bytes = response
                .bytes()
                .await
                .with_context(|| format!("failed to read body of {}", url))?;
            Ok(bytes.to_vec())
        })
    }
}

/// Serves assets from memory. Useful for embedding and for tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Arc<Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), Arc::new(bytes));
    }

    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> BoxedFuture<'static, anyhow::Result<Vec<u8>>> {
        let result = self
            .files
            .get(path)
            .map(|bytes| bytes.as_ref().clone())
            .with_context(|| format!("asset {} not found", path));
        boxed(async move { result })
    }
}

/// Decodes an encoded image (PNG, JPEG, ...) into RGBA8.
pub fn decode_image(bytes: &[u8], label: &str) -> anyhow::Result<image::RgbaImage> {
    let image = image::load_from_memory(bytes)
        .with_context(|| format!("failed to decode image {}", label))?;
    Ok(image.to_rgba8())
}

/// Decodes the payload of a base64 `data:` URI, the form glTF uses for
/// buffers and images embedded in a `.gltf` file.
pub fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let rest = uri.strip_prefix("data:").context("not a data URI")?;
    let (header, payload) = rest.split_once(',').context("data URI without a payload")?;
    if !header.ends_with(";base64") {
        bail!("data URI is not base64 encoded");
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("data URI holds invalid base64")
}

/// Resolves `uri` relative to the directory of `base`, the way glTF URIs are
/// relative to the file that references them.
pub fn resolve_relative(base: &str, uri: &str) -> String {
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], uri),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_uris_resolve_next_to_their_file() {
        assert_eq!(resolve_relative("models/office.glb", "tex/wood.png"), "models/tex/wood.png");
        assert_eq!(resolve_relative("office.gltf", "office.bin"), "office.bin");
    }

    #[test]
    fn memory_source_reports_missing_assets() {
        let source = MemorySource::new().with("a.bin", vec![1, 2, 3]);
        let found = futures::executor::block_on(source.fetch("a.bin")).unwrap();
        assert_eq!(found, vec![1, 2, 3]);
        let missing = futures::executor::block_on(source.fetch("b.bin"));
        assert!(missing.unwrap_err().to_string().contains("b.bin"));
    }

    #[test]
    fn base64_data_uris_decode_to_their_bytes() {
        let bytes = decode_data_uri("data:application/octet-stream;base64,AAEC/w==").unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 255]);
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("models/office.bin").is_err());
    }

    #[test]
    fn garbage_is_not_an_image() {
        assert!(decode_image(&[0, 1, 2, 3], "garbage").is_err());
    }
}
