/// RenderPass - Vulkan implementation of the RenderPass trait

use mirage3d_engine::mirage3d::render::{AttachmentDesc, RenderPass as GraphicsRenderPass};
use ash::vk;

/// Vulkan render pass implementation
pub struct RenderPass {
    /// Vulkan render pass handle
    pub(crate) render_pass: vk::RenderPass,
    /// Attachments the pass was created with
    pub(crate) color_attachments: Vec<AttachmentDesc>,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl GraphicsRenderPass for RenderPass {
    fn color_attachments(&self) -> &[AttachmentDesc] {
        &self.color_attachments
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
