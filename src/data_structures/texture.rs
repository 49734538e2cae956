//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU texture resources,
//! and helpers for creating the depth buffer, solid-colour placeholders and
//! textures from decoded images. Colour textures are mipmapped and sampled
//! with repeat addressing on both axes so materials can tile them.

use std::borrow::Cow;

use image::imageops::{self, FilterType};

/// A GPU texture with a view and sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1×1 texture of a single colour. Used while an image is still loading or
    /// when it failed to load, so the material colour shows through.
    pub fn create_placeholder(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4]) -> Self {
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_rgba(device, queue, &image, Some("placeholder texture"))
    }

    /// Upload a decoded image as an sRGB texture with a full mip chain.
    ///
    /// Images larger than the device allows are scaled down first.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &image::RgbaImage,
        label: Option<&str>,
    ) -> Self {
        let base = if rgba.width() == 0 || rgba.height() == 0 {
            log::warn!("uploading an empty image, using a white pixel instead");
            image::RgbaImage::from_pixel(1, 1, image::Rgba([255; 4]))
        } else {
            fit_to_limit(rgba, device.limits().max_texture_dimension_2d).into_owned()
        };
        let levels = mip_chain(base);
        let (width, height) = levels[0].dimensions();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            let (width, height) = level.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                level,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_repeat_sampler(device);

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Scales `image` down so neither side exceeds `max_dimension`, keeping the
/// aspect ratio. Images that already fit are borrowed as they are.
pub fn fit_to_limit(image: &image::RgbaImage, max_dimension: u32) -> Cow<'_, image::RgbaImage> {
    let (width, height) = image.dimensions();
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return Cow::Borrowed(image);
    }
    let scale = max_dimension as f64 / width.max(height) as f64;
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
    log::debug!(
        "scaling {}x{} texture down to {}x{}",
        width,
        height,
        new_width,
        new_height
    );
    Cow::Owned(imageops::resize(image, new_width, new_height, FilterType::Triangle))
}

/// Every mip level of `base`, level 0 first, each half the size of the
/// previous one down to 1×1.
pub fn mip_chain(base: image::RgbaImage) -> Vec<image::RgbaImage> {
    let mut levels = vec![base];
    loop {
        let (width, height) = levels[levels.len() - 1].dimensions();
        if width <= 1 && height <= 1 {
            break;
        }
        let next = imageops::resize(
            &levels[levels.len() - 1],
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );
        levels.push(next);
    }
    levels
}

pub fn create_repeat_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> image::RgbaImage {
        image::RgbaImage::from_pixel(width, height, image::Rgba([90, 120, 150, 255]))
    }

    #[test]
    fn oversized_images_shrink_to_the_device_limit() {
        let wide = solid(4096, 1024);
        let fitted = fit_to_limit(&wide, 2048);
        assert_eq!(fitted.dimensions(), (2048, 512));

        let tall = solid(300, 5000);
        let fitted = fit_to_limit(&tall, 2048);
        assert_eq!(fitted.height(), 2048);
        assert!(fitted.width() >= 1 && fitted.width() <= 123);
    }

    #[test]
    fn images_within_the_limit_are_not_copied() {
        let small = solid(64, 32);
        assert!(matches!(fit_to_limit(&small, 2048), Cow::Borrowed(_)));
        assert!(matches!(fit_to_limit(&solid(2048, 2048), 2048), Cow::Borrowed(_)));
    }

    #[test]
    fn mip_chain_halves_down_to_a_single_pixel() {
        let levels = mip_chain(solid(8, 2));
        let sizes: Vec<_> = levels.iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        assert_eq!(levels[3].get_pixel(0, 0).0, [90, 120, 150, 255]);

        assert_eq!(mip_chain(solid(1, 1)).len(), 1);
    }
}
