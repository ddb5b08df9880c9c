/// Shader - Vulkan implementation of the Shader trait

use mirage3d_engine::mirage3d::render::{Shader as GraphicsShader, ShaderStage};
use ash::vk;
use std::ffi::CString;

/// Vulkan shader implementation
pub struct Shader {
    /// Vulkan shader module
    pub(crate) module: vk::ShaderModule,
    /// Shader stage
    pub(crate) stage: ShaderStage,
    /// Entry point name
    pub(crate) entry_point: CString,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl GraphicsShader for Shader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}
