/// SamplerCache - VkSampler objects shared by every binding group of the device

use mirage3d_engine::mirage3d::render::SamplerType;
use mirage3d_engine::mirage3d::Result;
use mirage3d_engine::engine_err;
use crate::vulkan_context::GpuContext;
use ash::vk;
use std::collections::HashMap;
use std::sync::Arc;

/// Creates a VkSampler on first use of a sampler type, destroys them on shutdown
pub(crate) struct SamplerCache {
    ctx: Option<Arc<GpuContext>>,
    cache: HashMap<SamplerType, vk::Sampler>,
}

impl SamplerCache {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx: Some(ctx),
            cache: HashMap::new(),
        }
    }

    /// Get or create the VkSampler for `sampler_type`
    pub(crate) fn get(&mut self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&sampler_type) {
            return Ok(sampler);
        }

        let ctx = self.ctx.as_ref()
            .ok_or_else(|| engine_err!("mirage3d::vulkan", "Sampler requested after device shutdown"))?;
        let create_info = sampler_create_info(sampler_type);
        let sampler = unsafe {
            ctx.device.create_sampler(&create_info, None)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to create sampler {:?}: {:?}", sampler_type, e))?
        };
        self.cache.insert(sampler_type, sampler);
        Ok(sampler)
    }

    /// Destroy every cached sampler and release the context
    ///
    /// Called from `VulkanGraphicsDevice::drop` while the device is alive.
    pub(crate) fn shutdown(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            for (_, sampler) in self.cache.drain() {
                unsafe { ctx.device.destroy_sampler(sampler, None); }
            }
        }
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Filter and address mode of a sampler type, no mipmaps
pub(crate) fn sampler_create_info(sampler_type: SamplerType) -> vk::SamplerCreateInfo<'static> {
    let (filter, mipmap) = match sampler_type {
        SamplerType::LinearClamp => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR),
        SamplerType::NearestClamp => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST),
    };

    vk::SamplerCreateInfo::default()
        .mag_filter(filter)
        .min_filter(filter)
        .mipmap_mode(mipmap)
        .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
        .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
        .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0)
        .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
        .anisotropy_enable(false)
        .max_anisotropy(1.0)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .unnormalized_coordinates(false)
}
