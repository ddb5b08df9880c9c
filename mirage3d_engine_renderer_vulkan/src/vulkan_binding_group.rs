/// BindingGroup - Vulkan implementation of the BindingGroup trait

use mirage3d_engine::mirage3d::render::{BindingGroup as GraphicsBindingGroup, Texture as GraphicsTexture};
use ash::vk;
use std::sync::Arc;

/// Vulkan binding group implementation
///
/// Wraps a VkDescriptorSet. The set is owned by the device's descriptor
/// pool and freed with it. Holds the bound textures so their image views
/// outlive every command buffer recorded with this group.
pub struct BindingGroup {
    pub(crate) descriptor_set: vk::DescriptorSet,
    pub(crate) set_index: u32,
    pub(crate) _textures: Vec<Arc<dyn GraphicsTexture>>,
}

impl GraphicsBindingGroup for BindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}
