/// Mesh - CPU-side triangle geometry shared between scene nodes.
///
/// Vertices are uploaded by the offscreen renderer every frame, so a mesh
/// is plain data: no GPU resource is owned here.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use crate::error::{Error, Result};
use crate::graphics_device::{BufferFormat, VertexAttribute, VertexLayout};

/// Interleaved vertex: position (location 0), linear RGBA color (location 1)
/// and texture coordinates (location 2)
///
/// The fragment color is the vertex color times the material texel at `uv`,
/// so untextured geometry simply shows its vertex color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    /// (0, 0) is the top-left texel
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self { position: position.to_array(), color, uv: [0.0, 0.0] }
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = uv.to_array();
        self
    }

    /// Vertex input layout matching the scene shaders
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Vertex>() as u32,
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    format: BufferFormat::R32G32B32_SFLOAT,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    format: BufferFormat::R32G32B32A32_SFLOAT,
                    offset: BufferFormat::R32G32B32_SFLOAT.size(),
                },
                VertexAttribute {
                    location: 2,
                    format: BufferFormat::R32G32_SFLOAT,
                    offset: BufferFormat::R32G32B32_SFLOAT.size() + BufferFormat::R32G32B32A32_SFLOAT.size(),
                },
            ],
        }
    }
}

/// Texture coordinates of a face's corners, listed bottom-left counter-clockwise
const FACE_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
];

/// Triangle list geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
}

impl Mesh {
    /// Create a mesh from a triangle list
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the vertex count is not a multiple of 3.
    pub fn new(vertices: Vec<Vertex>) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(Error::InvalidResource(format!(
                "triangle list needs a multiple of 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    /// Build a mesh from indexed positions with a single color
    ///
    /// Used for tracked face geometry, which arrives as a vertex cloud plus
    /// triangle indices.
    pub fn from_indexed(positions: &[Vec3], indices: &[u32], color: [f32; 4]) -> Result<Self> {
        let mut vertices = Vec::with_capacity(indices.len());
        for &index in indices {
            let position = positions.get(index as usize).ok_or_else(|| {
                Error::InvalidResource(format!(
                    "index {} out of range for {} positions",
                    index,
                    positions.len()
                ))
            })?;
            vertices.push(Vertex::new(*position, color));
        }
        Self::new(vertices)
    }

    /// Axis-aligned quad in the XY plane, centered on the origin, facing +Z
    ///
    /// The full texture maps onto the quad, top row at +Y.
    pub fn quad(width: f32, height: f32, color: [f32; 4]) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let corners = [
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ];
        let vertices = [0, 1, 2, 0, 2, 3]
            .iter()
            .map(|&i| Vertex::new(corners[i], color).with_uv(FACE_UVS[i]))
            .collect();
        Self { vertices }
    }

    /// Axis-aligned box centered on the origin
    pub fn cuboid(size: Vec3, color: [f32; 4]) -> Self {
        let h = size * 0.5;
        let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);
        // Two triangles per face, counter-clockwise seen from outside
        let faces: [[Vec3; 4]; 6] = [
            [corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)],
            [corner(1.0, -1.0, -1.0), corner(-1.0, -1.0, -1.0), corner(-1.0, 1.0, -1.0), corner(1.0, 1.0, -1.0)],
            [corner(1.0, -1.0, 1.0), corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, 1.0, 1.0)],
            [corner(-1.0, -1.0, -1.0), corner(-1.0, -1.0, 1.0), corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0)],
            [corner(-1.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), corner(1.0, 1.0, -1.0), corner(-1.0, 1.0, -1.0)],
            [corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0), corner(1.0, -1.0, 1.0), corner(-1.0, -1.0, 1.0)],
        ];
        let mut vertices = Vec::with_capacity(36);
        for face in faces {
            for i in [0, 1, 2, 0, 2, 3] {
                vertices.push(Vertex::new(face[i], color).with_uv(FACE_UVS[i]));
            }
        }
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Copy of this mesh with every vertex recolored
    pub fn with_color(&self, color: [f32; 4]) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| Vertex { color, ..*v }).collect(),
        }
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
