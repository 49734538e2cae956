//! CPU-side geometry.
//!
//! Geometry is kept on the CPU for the lifetime of the scene so the renderer can
//! upload it lazily and picking can intersect rays against it. Only the two
//! primitives the office needs are generated here: a flat plane and an extruded
//! 2D outline. Loaded glTF meshes use the same [`Geometry`] container.

/// Describes how a vertex type is laid out in a GPU vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
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
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Indexed triangle list. Front faces wind counter-clockwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Iterates the triangles as position triples, skipping out-of-range indices.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([a.position, b.position, c.position])
        })
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

/// A flat `width` × `height` rectangle in the XY plane, centred on the origin and
/// facing +Z. UVs run from (0, 0) bottom-left to (1, 1) top-right.
pub fn plane(width: f32, height: f32) -> Geometry {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        ModelVertex {
            position: [-hw, hh, 0.0],
            tex_coords: [0.0, 1.0],
            normal,
        },
        ModelVertex {
            position: [hw, hh, 0.0],
            tex_coords: [1.0, 1.0],
            normal,
        },
        ModelVertex {
            position: [-hw, -hh, 0.0],
            tex_coords: [0.0, 0.0],
            normal,
        },
        ModelVertex {
            position: [hw, -hh, 0.0],
            tex_coords: [1.0, 0.0],
            normal,
        },
    ];
    Geometry {
        vertices,
        indices: vec![0, 2, 1, 2, 3, 1],
    }
}

/// A closed 2D outline in the XY plane, traced counter-clockwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    points: Vec<[f32; 2]>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the outline. Any previously traced points are discarded.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.points.clear();
        self.points.push([x, y]);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.points.push([x, y]);
    }

    /// Sweeps the outline from z = 0 to z = `depth`.
    ///
    /// Caps are fan-triangulated, which is exact for convex outlines. Cap UVs are
    /// the outline's own coordinates, so texture tiling is expressed in world
    /// units through the material's repeat factor. Side UVs follow the edge along
    /// its dominant axis and the extrusion depth.
    pub fn extrude(&self, depth: f32) -> Geometry {
        let mut geometry = Geometry::default();
        let n = self.points.len();
        if n < 3 {
            log::warn!("cannot extrude an outline with {} points", n);
            return geometry;
        }

        for (z, normal) in [(0.0, [0.0, 0.0, -1.0]), (depth, [0.0, 0.0, 1.0])] {
            let base = geometry.vertices.len() as u32;
            for &[x, y] in &self.points {
                geometry.vertices.push(ModelVertex {
                    position: [x, y, z],
                    tex_coords: [x, y],
                    normal,
                });
            }
            for i in 1..(n as u32 - 1) {
                if z == 0.0 {
                    geometry.push_triangle(base, base + i + 1, base + i);
                } else {
                    geometry.push_triangle(base, base + i, base + i + 1);
                }
            }
        }

        for i in 0..n {
            let [ax, ay] = self.points[i];
            let [bx, by] = self.points[(i + 1) % n];
            let (ex, ey) = (bx - ax, by - ay);
            let len = (ex * ex + ey * ey).sqrt();
            if len == 0.0 {
                continue;
            }
            let normal = [ey / len, -ex / len, 0.0];
            let along_x = ey.abs() < ex.abs();
            let u = |x: f32, y: f32| if along_x { x } else { y };
            let base = geometry.vertices.len() as u32;
            for (x, y, z) in [(ax, ay, 0.0), (bx, by, 0.0), (bx, by, depth), (ax, ay, depth)] {
                geometry.vertices.push(ModelVertex {
                    position: [x, y, z],
                    tex_coords: [u(x, y), 1.0 - z],
                    normal,
                });
            }
            geometry.push_triangle(base, base + 1, base + 2);
            geometry.push_triangle(base, base + 2, base + 3);
        }
        geometry
    }
}

/// Counter-clockwise rectangle from (-half_width, 0) to (half_width, height).
pub fn rectangle(half_width: f32, height: f32) -> Shape {
    let mut shape = Shape::new();
    shape.move_to(-half_width, 0.0);
    shape.line_to(half_width, 0.0);
    shape.line_to(half_width, height);
    shape.line_to(-half_width, height);
    shape
}
