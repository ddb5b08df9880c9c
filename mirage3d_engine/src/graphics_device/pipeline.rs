/// Pipeline trait and pipeline descriptor

use std::sync::Arc;
use crate::graphics_device::{BindingGroupLayoutDesc, BufferFormat, RenderPass, Shader};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
}

/// One vertex attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Attribute format
    pub format: BufferFormat,
    /// Byte offset inside the vertex
    pub offset: u32,
}

/// Interleaved vertex layout (single binding)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Size of one vertex in bytes
    pub stride: u32,
    /// Attributes
    pub attributes: Vec<VertexAttribute>,
}

/// Descriptor for creating a graphics pipeline
#[derive(Clone)]
pub struct PipelineDesc {
    /// Vertex shader
    pub vertex_shader: Arc<dyn Shader>,
    /// Fragment shader
    pub fragment_shader: Arc<dyn Shader>,
    /// Vertex input layout
    pub vertex_layout: VertexLayout,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Size in bytes of the vertex-stage push constant block
    pub push_constant_size: u32,
    /// Binding group layouts, indexed by set
    pub binding_group_layouts: Vec<BindingGroupLayoutDesc>,
    /// Render pass the pipeline is used with
    pub render_pass: Arc<dyn RenderPass>,
}

/// Pipeline resource trait
///
/// Implemented by backend-specific pipeline types.
/// The pipeline is automatically destroyed when dropped.
pub trait Pipeline: Send + Sync {
    /// Primitive topology the pipeline assembles
    fn topology(&self) -> PrimitiveTopology;

    /// Size of the push constant block in bytes
    fn push_constant_size(&self) -> u32;

    /// Number of binding group layouts (sets) declared at creation
    fn binding_group_layout_count(&self) -> u32;
}
