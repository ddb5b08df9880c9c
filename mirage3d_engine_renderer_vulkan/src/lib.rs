/*!
# Mirage3D Engine - Vulkan Backend

Headless Vulkan implementation of the Mirage3D graphics device traits.

This crate implements the mirage3d_engine traits using the Ash library for
Vulkan bindings and gpu-allocator for memory management. No surface or
swapchain is created: every frame is rendered into offscreen textures.
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_context;
mod vulkan_texture;
mod vulkan_buffer;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_sampler;
mod vulkan_binding_group;
mod vulkan_command_list;
mod vulkan_render_target;
mod vulkan_render_pass;
mod vulkan_fence;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanGraphicsDevice;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};

/// Main namespace of the Vulkan backend
pub mod mirage3d {
    pub use crate::vulkan::VulkanGraphicsDevice;
}
