/// Texture - Vulkan implementation of the Texture trait

use mirage3d_engine::mirage3d::render::{HostMemory, Texture as GraphicsTexture, TextureInfo};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Host-visible buffer the texture is copied into for CPU reads
pub(crate) struct ReadbackBuffer {
    pub(crate) buffer: vk::Buffer,
    pub(crate) allocation: Option<Allocation>,
    /// Row stride of the copied image (tightly packed)
    pub(crate) bytes_per_row: usize,
}

/// Vulkan texture implementation
///
/// The image is kept in `SHADER_READ_ONLY_OPTIMAL` between submissions.
pub struct Texture {
    /// Shared GPU context (device, allocator)
    pub(crate) ctx: Arc<GpuContext>,
    /// Vulkan image
    pub(crate) image: vk::Image,
    /// Vulkan image view (sampling)
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Readback buffer, only with `TextureUsage::HOST_READBACK`
    pub(crate) readback: Option<ReadbackBuffer>,
    /// Read-only texture properties
    pub(crate) info: TextureInfo,
}

impl Texture {
    /// Size in bytes of the readback copy
    pub(crate) fn readback_size(&self) -> usize {
        self.readback
            .as_ref()
            .map(|readback| readback.bytes_per_row * self.info.height as usize)
            .unwrap_or(0)
    }
}

impl GraphicsTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn host_memory(&self) -> Option<HostMemory> {
        let readback = self.readback.as_ref()?;
        let mapped = readback.allocation.as_ref()?.mapped_slice()?;
        let bytes = mapped.get(..self.readback_size())?.to_vec();
        Some(HostMemory {
            bytes,
            bytes_per_row: readback.bytes_per_row,
        })
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            // Destroy image view
            self.ctx.device.destroy_image_view(self.view, None);

            // Free GPU memory; don't panic if the lock fails, the handles still go
            if let Ok(mut allocator) = self.ctx.allocator.lock() {
                if let Some(allocation) = self.allocation.take() {
                    allocator.free(allocation).ok();
                }
                if let Some(readback) = self.readback.as_mut() {
                    if let Some(allocation) = readback.allocation.take() {
                        allocator.free(allocation).ok();
                    }
                }
            }

            if let Some(readback) = &self.readback {
                self.ctx.device.destroy_buffer(readback.buffer, None);
            }

            // Destroy image
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
