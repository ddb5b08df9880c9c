/// GraphicsDevice trait - main device interface for creating resources and submitting commands

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, CommandList, Fence, Pipeline, PipelineDesc,
    RenderPass, RenderPassDesc, RenderTarget, Shader, ShaderDesc, Texture, TextureDesc,
};

/// Main graphics device trait
///
/// This is the central factory interface for creating GPU resources and submitting commands.
/// Implemented by backend-specific devices (e.g., VulkanGraphicsDevice).
///
/// A device is created once by the application and shared explicitly as
/// `Arc<Mutex<dyn GraphicsDevice>>` with every component that needs it.
pub trait GraphicsDevice: Send + Sync {
    /// Human readable name of the physical device
    fn device_name(&self) -> &str;

    /// Create a texture
    ///
    /// When `desc.data` is set, the data is uploaded before this call returns.
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a render target view over a texture
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the texture lacks `TextureUsage::RENDER_TARGET`.
    fn create_render_target(&self, texture: &Arc<dyn Texture>) -> Result<Arc<dyn RenderTarget>>;

    /// Create a render pass
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a host-visible buffer
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a shader module
    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create a graphics pipeline
    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Create a binding group for set `set_index` of `pipeline`
    ///
    /// `resources` holds one entry per slot of the set's layout, in binding order.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the set index is out of range or the
    /// resources do not match the layout.
    fn create_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource<'_>],
    ) -> Result<Arc<dyn BindingGroup>>;

    /// Create a command list for recording rendering commands
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Submit command lists for asynchronous execution on the GPU
    ///
    /// Returns immediately. The returned fence signals once every submitted
    /// command has finished executing.
    fn submit(&self, commands: &[&dyn CommandList]) -> Result<Arc<dyn Fence>>;

    /// Wait for all GPU operations to complete
    fn wait_idle(&self) -> Result<()>;
}

/// Lock a shared device, reporting a poisoned lock as a backend error
pub fn lock_device(
    graphics_device: &Arc<Mutex<dyn GraphicsDevice>>,
) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    graphics_device
        .lock()
        .map_err(|_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))
}
