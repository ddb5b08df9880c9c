/// Fence - Vulkan implementation of the Fence trait
///
/// One VkFence per submission, destroyed with the last handle to it.

use mirage3d_engine::mirage3d::{Error, Result};
use mirage3d_engine::mirage3d::render::Fence as GraphicsFence;
use mirage3d_engine::engine_err;
use ash::vk;
use std::sync::Arc;
use std::time::Duration;

use crate::vulkan_context::GpuContext;

pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl Fence {
    pub fn new(ctx: Arc<GpuContext>, fence: vk::Fence) -> Self {
        Self { ctx, fence }
    }
}

impl GraphicsFence for Fence {
    fn is_signaled(&self) -> Result<bool> {
        unsafe {
            self.ctx
                .device
                .get_fence_status(self.fence)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to query fence status: {:?}", e))
        }
    }

    fn wait(&self, timeout: Duration) -> Result<bool> {
        let timeout_ns = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
        unsafe {
            match self.ctx.device.wait_for_fences(&[self.fence], true, timeout_ns) {
                Ok(()) => Ok(true),
                Err(vk::Result::TIMEOUT) => Ok(false),
                Err(vk::Result::ERROR_DEVICE_LOST) => Err(Error::BackendError(
                    "Device lost while waiting for fence".to_string(),
                )),
                Err(e) => Err(engine_err!("mirage3d::vulkan", "Failed to wait for fence: {:?}", e)),
            }
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            // A fence still pending on the queue must not be destroyed
            self.ctx.device.wait_for_fences(&[self.fence], true, u64::MAX).ok();
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}
