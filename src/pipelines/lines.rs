//! Line rendering for the axes helper.

use crate::data_structures::{geometry::Vertex, texture::Texture};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// X, Y and Z axes from the origin as a line list. Each axis fades from its
/// primary colour towards a lighter tint at its tip.
pub fn axes(length: f32) -> Vec<LineVertex> {
    let line = |to: [f32; 3], from_color: [f32; 3], to_color: [f32; 3]| {
        [
            LineVertex {
                position: [0.0; 3],
                color: from_color,
            },
            LineVertex {
                position: to,
                color: to_color,
            },
        ]
    };
    [
        line([length, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.6, 0.0]),
        line([0.0, length, 0.0], [0.0, 1.0, 0.0], [0.6, 1.0, 0.0]),
        line([0.0, 0.0, length], [0.0, 0.0, 1.0], [0.0, 0.6, 1.0]),
    ]
    .concat()
}

pub fn mk_lines_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Lines Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Lines Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("lines.wgsl").into()),
    };
    crate::pipelines::basic::mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        &[LineVertex::desc()],
        wgpu::PrimitiveTopology::LineList,
        None,
        shader,
    )
}
