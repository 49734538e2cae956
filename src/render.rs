//! GPU mirror of the scene and the frame draw.
//!
//! The [`Renderer`] keeps one set of GPU buffers per mesh node. It never reads
//! the scene directly while drawing; instead [`Renderer::sync`] drains the
//! scene's change log once per frame and uploads new meshes, material colours
//! and texture images.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        material::{Material, TextureImage},
        scene_graph::{Mesh, Node, NodeId, Scene, SceneChange},
        texture::Texture,
        transform::InstanceRaw,
    },
    pipelines::{basic::mk_material_bind_group, lines::axes},
};

/// GPU resources of one mesh node.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material_buffer: wgpu::Buffer,
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
    pub double_sided: bool,
}

struct Axes {
    vertex_buffer: wgpu::Buffer,
    num_vertices: u32,
}

pub struct Renderer {
    meshes: HashMap<NodeId, GpuMesh>,
    /// Draw order, i.e. insertion order.
    order: Vec<NodeId>,
    axes: Option<Axes>,
}

impl Renderer {
    pub fn new(ctx: &Context, axes_length: Option<f32>) -> Self {
        let axes = axes_length.map(|length| {
            let vertices = axes(length);
            Axes {
                vertex_buffer: ctx
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Axes Vertex Buffer"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                num_vertices: vertices.len() as u32,
            }
        });
        Self {
            meshes: HashMap::new(),
            order: Vec::new(),
            axes,
        }
    }

    /// Applies every scene change recorded since the previous call.
    pub fn sync(&mut self, ctx: &Context, scene: &mut Scene) {
        for change in scene.drain_changes() {
            match change {
                SceneChange::Inserted(id) => {
                    if let Some((node, mesh)) = mesh_of(scene, id) {
                        self.meshes.insert(id, upload(ctx, node, mesh));
                        self.order.push(id);
                    }
                }
                SceneChange::MaterialChanged(id) => {
                    if let (Some(gpu), Some(material)) = (self.meshes.get(&id), scene.material(id)) {
                        ctx.queue.write_buffer(
                            &gpu.material_buffer,
                            0,
                            bytemuck::cast_slice(&[material.to_uniform()]),
                        );
                    }
                }
                SceneChange::TextureChanged(id) => {
                    if let (Some(gpu), Some(material)) = (self.meshes.get_mut(&id), scene.material(id)) {
                        let label = format!("{:?} texture", id);
                        gpu.texture = mk_texture(ctx, material, &label);
                        gpu.bind_group = mk_material_bind_group(
                            &ctx.device,
                            &ctx.material_layout,
                            &gpu.texture,
                            &gpu.material_buffer,
                            &label,
                        );
                    }
                }
            }
        }
    }

    pub fn render(&self, ctx: &Context) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &ctx.light.bind_group, &[]);
            let mut double_sided = None;
            for id in &self.order {
                let Some(mesh) = self.meshes.get(id) else {
                    continue;
                };
                if double_sided != Some(mesh.double_sided) {
                    render_pass.set_pipeline(if mesh.double_sided {
                        &ctx.double_sided_pipeline
                    } else {
                        &ctx.basic_pipeline
                    });
                    double_sided = Some(mesh.double_sided);
                }
                render_pass.set_bind_group(0, &mesh.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.num_elements, 0, 0..1);
            }

            if let Some(axes) = &self.axes {
                render_pass.set_pipeline(&ctx.lines_pipeline);
                render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
                render_pass.set_vertex_buffer(0, axes.vertex_buffer.slice(..));
                render_pass.draw(0..axes.num_vertices, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn mesh_of(scene: &Scene, id: NodeId) -> Option<(&Node, &Mesh)> {
    let node = scene.node(id)?;
    let mesh = node.mesh.as_ref()?;
    Some((node, mesh))
}

fn mk_texture(ctx: &Context, material: &Material, label: &str) -> Texture {
    match &material.texture {
        TextureImage::Decoded(image) => Texture::from_rgba(&ctx.device, &ctx.queue, image, Some(label)),
        TextureImage::Placeholder => Texture::create_placeholder(&ctx.device, &ctx.queue, [255; 4]),
    }
}

fn upload(ctx: &Context, node: &Node, mesh: &Mesh) -> GpuMesh {
    let label = node.name.as_str();
    let vertex_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
    let index_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
    let instance_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", label)),
            contents: bytemuck::cast_slice(&[InstanceRaw::from(node.world)]),
            usage: wgpu::BufferUsages::VERTEX,
        });
    let material_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", label)),
            contents: bytemuck::cast_slice(&[mesh.material.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
    let texture = mk_texture(ctx, &mesh.material, label);
    let bind_group = mk_material_bind_group(
        &ctx.device,
        &ctx.material_layout,
        &texture,
        &material_buffer,
        label,
    );

    GpuMesh {
        vertex_buffer,
        index_buffer,
        instance_buffer,
        num_elements: mesh.geometry.indices.len() as u32,
        material_buffer,
        texture,
        bind_group,
        double_sided: mesh.material.double_sided,
    }
}
