/// RenderTarget - Vulkan implementation of the RenderTarget trait

use mirage3d_engine::mirage3d::render::{
    RenderTarget as GraphicsRenderTarget, Texture as GraphicsTexture, TextureFormat,
};
use ash::vk;
use std::sync::Arc;

/// Vulkan render target implementation
///
/// Owns a color attachment view over an offscreen texture. The texture
/// itself (and its VkImage) stays owned by the `Texture`.
pub struct RenderTarget {
    /// Texture drawn into
    texture: Arc<dyn GraphicsTexture>,
    /// Vulkan image view used as framebuffer attachment
    pub(crate) image_view: vk::ImageView,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl RenderTarget {
    /// Create a render target over `texture`, taking ownership of `image_view`
    pub fn new(texture: Arc<dyn GraphicsTexture>, image_view: vk::ImageView, device: ash::Device) -> Self {
        Self {
            texture,
            image_view,
            device,
        }
    }
}

impl GraphicsRenderTarget for RenderTarget {
    fn width(&self) -> u32 {
        self.texture.info().width
    }

    fn height(&self) -> u32 {
        self.texture.info().height
    }

    fn format(&self) -> TextureFormat {
        self.texture.info().format
    }

    fn texture(&self) -> &Arc<dyn GraphicsTexture> {
        &self.texture
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.image_view, None);
        }
    }
}
