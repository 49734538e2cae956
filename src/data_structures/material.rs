//! Surface materials.
//!
//! A [`Material`] is the CPU description of how a mesh is shaded: a base colour
//! multiplied with a texture that is repeated `repeat` times along U and V.
//! Each mesh owns its material; nothing is shared, so recolouring one mesh never
//! bleeds into another.

use std::sync::Arc;

/// Linear RGB colour in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Parses a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_array(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

impl From<Rgb> for wgpu::Color {
    fn from(colour: Rgb) -> Self {
        // The surface is sRGB, so the clear value has to be given in linear space.
        let linear = |c: f32| {
            let c = c as f64;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        wgpu::Color {
            r: linear(colour.r),
            g: linear(colour.g),
            b: linear(colour.b),
            a: 1.0,
        }
    }
}

/// The image a material samples from.
#[derive(Clone, Debug)]
pub enum TextureImage {
    /// Nothing assigned yet (or the assigned image failed to load). Renders as
    /// plain white so the material colour shows through.
    Placeholder,
    /// Decoded image, shared between the CPU scene and the GPU upload.
    Decoded(Arc<image::RgbaImage>),
}

impl TextureImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TextureImage::Placeholder)
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub color: Rgb,
    pub texture: TextureImage,
    /// Texture repetitions along U and V.
    pub repeat: [f32; 2],
    /// Room textures use a bottom-left UV origin, glTF textures a top-left one.
    pub flip_y: bool,
    /// Whether ambient light tints the surface.
    pub lit: bool,
    /// Rendered and pickable from both sides.
    pub double_sided: bool,
}

impl Material {
    /// An unlit, white material tiling `repeat` times.
    pub fn tiled(repeat: [f32; 2]) -> Self {
        Self {
            color: Rgb::WHITE,
            texture: TextureImage::Placeholder,
            repeat,
            flip_y: true,
            lit: false,
            double_sided: false,
        }
    }

    /// The material glTF meshes are given: lit, untiled, top-left UV origin.
    pub fn standard(color: Rgb, texture: TextureImage) -> Self {
        Self {
            color,
            texture,
            repeat: [1.0, 1.0],
            flip_y: false,
            lit: true,
            double_sided: false,
        }
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            color: self.color.to_array(1.0),
            repeat: self.repeat,
            flip_y: if self.flip_y { 1.0 } else { 0.0 },
            lit: if self.lit { 1.0 } else { 0.0 },
        }
    }
}

/// Per-material uniform; 32 bytes to satisfy uniform alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub repeat: [f32; 2],
    pub flip_y: f32,
    pub lit: f32,
}
