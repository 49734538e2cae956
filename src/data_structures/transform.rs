//! Node transforms and their GPU representation.
//!
//! Every scene node carries a local [`Transform`] (translation, rotation,
//! scale). World matrices are the product of the ancestors' local matrices and
//! are uploaded per drawable mesh as an [`InstanceRaw`].

use cgmath::{One, Rotation3};

use crate::data_structures::geometry::Vertex;

/// Local transformation: position, rotation (as quaternion), and scale.
///
/// The matrix is composed as `T * R * S`, so scale never affects the
/// translation of the node it belongs to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_rotation_x(angle: cgmath::Rad<f32>) -> Self {
        Self {
            rotation: cgmath::Quaternion::from_angle_x(angle),
            ..Self::new()
        }
    }

    pub fn from_rotation_y(angle: cgmath::Rad<f32>) -> Self {
        Self {
            rotation: cgmath::Quaternion::from_angle_y(angle),
            ..Self::new()
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl From<cgmath::Vector3<f32>> for Transform {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the world matrix as it is stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
}

impl From<cgmath::Matrix4<f32>> for InstanceRaw {
    fn from(world: cgmath::Matrix4<f32>) -> Self {
        Self {
            model: world.into(),
        }
    }
}

/**
 * A mat4 takes up four vertex slots as it is technically four vec4s. The step mode
 * is `Instance` so the shader only advances once per drawn instance.
 */
impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Rad, Transform as _};
    use std::f32::consts::FRAC_PI_2;

    fn assert_close(actual: cgmath::Point3<f32>, expected: [f32; 3]) {
        for (a, e) in [actual.x, actual.y, actual.z].iter().zip(expected) {
            assert!((a - e).abs() < 1e-3, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn scale_does_not_move_the_origin() {
        let mut transform = Transform::from(cgmath::Vector3::new(290.0, 10.0, -290.0));
        transform.scale = cgmath::Vector3::new(58.0, 58.0, 58.0);
        let origin = transform
            .to_matrix()
            .transform_point(cgmath::Point3::new(0.0, 0.0, 0.0));
        assert_close(origin, [290.0, 10.0, -290.0]);
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_negative_z() {
        let transform = Transform::from_rotation_y(Rad(FRAC_PI_2));
        let p = transform
            .to_matrix()
            .transform_point(cgmath::Point3::new(1.0, 0.0, 0.0));
        assert_close(p, [0.0, 0.0, -1.0]);
    }
}
