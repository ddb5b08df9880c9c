/// Shader trait and shader descriptor

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Descriptor for creating a shader
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Compiled shader bytecode (SPIR-V for the Vulkan backend)
    pub code: Vec<u8>,
    /// Shader stage
    pub stage: ShaderStage,
    /// Entry point function name
    pub entry_point: String,
}

/// Shader resource trait
///
/// Implemented by backend-specific shader types.
/// The shader is automatically destroyed when dropped.
pub trait Shader: Send + Sync {
    /// Stage this module was created for
    fn stage(&self) -> ShaderStage;
}
