/// CommandList - Vulkan implementation of the CommandList trait

use mirage3d_engine::mirage3d::{Result, Error};
use mirage3d_engine::mirage3d::render::{
    CommandList as GraphicsCommandList,
    RenderPass as GraphicsRenderPass,
    RenderTarget as GraphicsRenderTarget,
    Pipeline as GraphicsPipeline,
    BindingGroup as GraphicsBindingGroup,
    Buffer as GraphicsBuffer,
    Texture as GraphicsTexture,
    TextureUsage, Viewport, Rect2D, ClearValue,
};
use mirage3d_engine::engine_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_binding_group::BindingGroup;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_texture::Texture;

/// Vulkan command list implementation
///
/// Records rendering commands for later submission to the GPU.
pub struct CommandList {
    /// Shared GPU context
    ctx: Arc<GpuContext>,
    /// Command pool for allocating command buffers
    command_pool: vk::CommandPool,
    /// Command buffer for recording
    command_buffer: vk::CommandBuffer,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
    /// Currently bound pipeline layout (for push constants)
    bound_pipeline_layout: Option<vk::PipelineLayout>,
    /// Framebuffers created during recording (destroyed after command buffer is done)
    framebuffers: Vec<vk::Framebuffer>,
    /// Binding groups referenced by the recorded commands
    bound_groups: Vec<Arc<dyn GraphicsBindingGroup>>,
}

impl CommandList {
    /// Create a new command list with its own command pool
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to create command pool: {:?}", e))?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = match ctx.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(command_buffers) => command_buffers,
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(engine_err!("mirage3d::vulkan", "Failed to allocate command buffer: {:?}", e));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer: command_buffers[0],
                is_recording: false,
                in_render_pass: false,
                bound_pipeline_layout: None,
                framebuffers: Vec::new(),
                bound_groups: Vec::new(),
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Whether recording is in progress (a recording list cannot be submitted)
    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    fn require_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(())
    }
}

fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

impl GraphicsCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }

        unsafe {
            // Reset command buffer
            self.ctx.device
                .reset_command_buffer(
                    self.command_buffer,
                    vk::CommandBufferResetFlags::empty(),
                )
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;

            self.is_recording = true;
            self.in_render_pass = false;
            self.bound_pipeline_layout = None;

            // The previous submission of this list has completed: its framebuffers can go
            for framebuffer in self.framebuffers.drain(..) {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }
            self.bound_groups.clear();

            Ok(())
        }
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;

            self.is_recording = false;

            Ok(())
        }
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn GraphicsRenderPass>,
        render_target: &Arc<dyn GraphicsRenderTarget>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        unsafe {
            // Downcast to Vulkan types
            let vk_render_pass = render_pass.as_ref() as *const dyn GraphicsRenderPass as *const RenderPass;
            let vk_render_pass = &*vk_render_pass;

            let vk_render_target = render_target.as_ref() as *const dyn GraphicsRenderTarget as *const RenderTarget;
            let vk_render_target = &*vk_render_target;

            let vk_clear_values: Vec<vk::ClearValue> = clear_values
                .iter()
                .map(|cv| match cv {
                    ClearValue::Color(color) => vk::ClearValue {
                        color: vk::ClearColorValue {
                            float32: *color,
                        },
                    },
                })
                .collect();

            // Create framebuffer on the fly
            let attachments = [vk_render_target.image_view];
            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .attachments(&attachments)
                .width(render_target.width())
                .height(render_target.height())
                .layers(1);

            let framebuffer = self.ctx.device.create_framebuffer(&framebuffer_info, None)
                .map_err(|e| Error::BackendError(format!("Failed to create framebuffer: {:?}", e)))?;

            // Destroyed in begin() or Drop
            self.framebuffers.push(framebuffer);

            let render_pass_info = vk::RenderPassBeginInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .framebuffer(framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: vk::Extent2D {
                        width: render_target.width(),
                        height: render_target.height(),
                    },
                })
                .clear_values(&vk_clear_values);

            self.ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );

            self.in_render_pass = true;

            Ok(())
        }
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording()?;

        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }

        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;

        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording()?;

        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }

        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording()?;

        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x: scissor.x, y: scissor.y })
            .extent(vk::Extent2D { width: scissor.width, height: scissor.height });

        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }

        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn GraphicsPipeline>) -> Result<()> {
        self.require_recording()?;

        unsafe {
            // Downcast to Vulkan type
            let vk_pipeline = pipeline.as_ref() as *const dyn GraphicsPipeline as *const Pipeline;
            let vk_pipeline = &*vk_pipeline;

            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );

            // Save pipeline layout for push constants
            self.bound_pipeline_layout = Some(vk_pipeline.pipeline_layout);
        }

        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn GraphicsPipeline>,
        set_index: u32,
        binding_group: &Arc<dyn GraphicsBindingGroup>,
    ) -> Result<()> {
        self.require_recording()?;

        if set_index >= pipeline.binding_group_layout_count() || binding_group.set_index() != set_index {
            return Err(Error::InvalidResource(format!(
                "binding group for set {} cannot be bound at set {} of a pipeline with {} set(s)",
                binding_group.set_index(), set_index, pipeline.binding_group_layout_count()
            )));
        }

        unsafe {
            let vk_pipeline = pipeline.as_ref() as *const dyn GraphicsPipeline as *const Pipeline;
            let vk_pipeline = &*vk_pipeline;
            let vk_group = binding_group.as_ref() as *const dyn GraphicsBindingGroup as *const BindingGroup;
            let vk_group = &*vk_group;

            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline_layout,
                set_index,
                &[vk_group.descriptor_set],
                &[],
            );
        }

        self.bound_groups.push(Arc::clone(binding_group));
        Ok(())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording()?;

        let layout = self.bound_pipeline_layout.ok_or_else(|| {
            Error::BackendError("No pipeline bound for push constants".to_string())
        })?;

        unsafe {
            // Push constant range is declared for the vertex stage only
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                layout,
                vk::ShaderStageFlags::VERTEX,
                offset,
                data,
            );
        }

        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GraphicsBuffer>, offset: u64) -> Result<()> {
        self.require_recording()?;

        unsafe {
            // Downcast to Vulkan type
            let vk_buffer = buffer.as_ref() as *const dyn GraphicsBuffer as *const Buffer;
            let vk_buffer = &*vk_buffer;

            self.ctx.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[vk_buffer.buffer],
                &[offset],
            );
        }

        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_recording()?;

        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }

        unsafe {
            self.ctx.device.cmd_draw(
                self.command_buffer,
                vertex_count,
                1, // instance_count
                first_vertex,
                0, // first_instance
            );
        }

        Ok(())
    }

    fn copy_texture_to_host(&mut self, texture: &Arc<dyn GraphicsTexture>) -> Result<()> {
        self.require_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("copy_texture_to_host inside a render pass".to_string()));
        }

        let info = texture.info();
        if !info.usage.contains(TextureUsage::HOST_READBACK) {
            return Err(Error::InvalidResource(format!(
                "copy_texture_to_host: texture usage {:?} lacks HOST_READBACK",
                info.usage
            )));
        }

        unsafe {
            // Downcast to Vulkan type
            let vk_texture = texture.as_ref() as *const dyn GraphicsTexture as *const Texture;
            let vk_texture = &*vk_texture;

            let readback = vk_texture.readback.as_ref().ok_or_else(|| {
                Error::BackendError("Texture has no readback buffer".to_string())
            })?;

            // SHADER_READ_ONLY -> TRANSFER_SRC, after the render pass wrote it
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .new_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(vk_texture.image)
                .subresource_range(color_subresource_range())
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_access_mask(vk::AccessFlags::TRANSFER_READ);

            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            // Tightly packed copy (buffer_row_length 0)
            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: info.width,
                    height: info.height,
                    depth: 1,
                });

            self.ctx.device.cmd_copy_image_to_buffer(
                self.command_buffer,
                vk_texture.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                readback.buffer,
                &[region],
            );

            // Back to SHADER_READ_ONLY for material sampling; make the copy host-visible
            let to_shader_read = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(vk_texture.image)
                .subresource_range(color_subresource_range())
                .src_access_mask(vk::AccessFlags::TRANSFER_READ)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);

            let to_host = vk::BufferMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::HOST_READ)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .buffer(readback.buffer)
                .offset(0)
                .size(vk::WHOLE_SIZE);

            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::HOST,
                vk::DependencyFlags::empty(),
                &[],
                &[to_host],
                &[to_shader_read],
            );
        }

        Ok(())
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            for framebuffer in self.framebuffers.drain(..) {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }

            // Command buffer is freed with its pool
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
