/// Pipeline - Vulkan implementation of the Pipeline trait

use mirage3d_engine::mirage3d::render::{
    BindingGroupLayoutDesc, Pipeline as GraphicsPipeline, PrimitiveTopology,
};
use ash::vk;

/// Vulkan pipeline implementation
pub struct Pipeline {
    /// Vulkan graphics pipeline
    pub(crate) pipeline: vk::Pipeline,
    /// Pipeline layout (push constant range and descriptor set layouts)
    pub(crate) pipeline_layout: vk::PipelineLayout,
    /// One descriptor set layout per binding group, indexed by set
    pub(crate) descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
    /// Layout descriptions, to validate binding group resources
    pub(crate) binding_group_layouts: Vec<BindingGroupLayoutDesc>,
    pub(crate) topology: PrimitiveTopology,
    pub(crate) push_constant_size: u32,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl GraphicsPipeline for Pipeline {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    fn binding_group_layout_count(&self) -> u32 {
        self.descriptor_set_layouts.len() as u32
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
            for layout in self.descriptor_set_layouts.drain(..) {
                self.device.destroy_descriptor_set_layout(layout, None);
            }
        }
    }
}
