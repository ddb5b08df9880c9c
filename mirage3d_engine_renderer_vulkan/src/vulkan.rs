/// VulkanGraphicsDevice - headless Vulkan implementation of the GraphicsDevice trait

use mirage3d_engine::mirage3d::{GraphicsDevice, Result, Error, Config};
use mirage3d_engine::mirage3d::render::{
    CommandList as GraphicsCommandList, RenderTarget as GraphicsRenderTarget,
    RenderPass as GraphicsRenderPass, Texture as GraphicsTexture, Buffer as GraphicsBuffer,
    Shader as GraphicsShader, Pipeline as GraphicsPipeline, Fence as GraphicsFence,
    BindingGroup as GraphicsBindingGroup, RenderPassDesc, TextureDesc, TextureInfo, TextureUsage,
    BufferDesc, ShaderDesc, PipelineDesc, TextureFormat, BufferFormat, ShaderStage, BufferUsage,
    PrimitiveTopology, LoadOp, StoreOp, ImageLayout, BindingType, BindingResource,
};
use ash::vk;
use std::ffi::CString;
use std::io::Cursor;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use mirage3d_engine::{engine_debug, engine_info, engine_warn, engine_error, engine_bail, engine_err};

use crate::vulkan_texture::{ReadbackBuffer, Texture};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_shader::Shader;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_fence::Fence;
use crate::vulkan_context::GpuContext;
use crate::vulkan_binding_group::BindingGroup;
use crate::vulkan_sampler::SamplerCache;

/// Combined image samplers per descriptor pool
const POOL_SAMPLED_TEXTURES: u32 = 1024;
/// Descriptor sets per descriptor pool
const POOL_MAX_SETS: u32 = 1024;

/// Vulkan device implementation
///
/// Central object for creating resources and submitting commands. Headless:
/// no surface, no swapchain, no present queue.
///
/// Every resource created by this device must be dropped before it.
pub struct VulkanGraphicsDevice {
    /// Vulkan entry (keeps the loader library alive)
    _entry: ash::Entry,
    /// Vulkan instance
    instance: ash::Instance,
    /// Physical device name, reported by `device_name()`
    device_name: String,

    /// GPU memory allocator reference (also stored in GpuContext)
    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Debug utils loader and messenger (only with validation enabled)
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    /// Shared GPU context for all resources (textures, buffers, fences)
    gpu_context: Arc<GpuContext>,

    /// Descriptor pools, a new one is appended when the last is exhausted
    descriptor_pools: Vec<vk::DescriptorPool>,
    sampler_cache: SamplerCache,
}

impl VulkanGraphicsDevice {
    /// Create a new headless Vulkan device
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` when the Vulkan library cannot be loaded,
    /// no GPU with a graphics queue exists, or device creation fails.
    pub fn new(config: Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("mirage3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|_| Error::InitializationFailed("Application name contains a NUL byte".to_string()))?;
            let (major, minor, patch) = config.app_version;

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Mirage3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let validation = Self::validation_enabled(&entry, &config);

            #[allow(unused_mut)]
            let mut extension_names: Vec<*const std::ffi::c_char> = Vec::new();
            #[allow(unused_mut)]
            let mut layer_names: Vec<*const std::ffi::c_char> = Vec::new();
            #[cfg(feature = "vulkan-validation")]
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(crate::debug::VALIDATION_LAYER.as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("mirage3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                Some(crate::debug::create_debug_messenger(&entry, &instance, config.debug_severity)?)
            } else {
                None
            };
            #[cfg(not(feature = "vulkan-validation"))]
            let debug_messenger = None;

            let (physical_device, graphics_family_index) = Self::pick_physical_device(&instance)?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown GPU".to_string());

            // Create Logical Device (one graphics queue, no extensions)
            let queue_priorities = [1.0];
            let queue_create_infos = [
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .queue_priorities(&queue_priorities),
            ];

            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("mirage3d::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("mirage3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            // Upload command pool (TRANSIENT + RESET for reusable one-shot uploads)
            let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let upload_command_pool = device.create_command_pool(&upload_pool_create_info, None)
                .map_err(|e| {
                    engine_error!("mirage3d::vulkan", "Failed to create upload command pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e))
                })?;

            let allocator_arc = Arc::new(Mutex::new(allocator));
            let gpu_context = Arc::new(GpuContext::new(
                device,
                Arc::clone(&allocator_arc),
                graphics_queue,
                graphics_family_index,
                upload_command_pool,
            ));

            let descriptor_pool = match Self::create_descriptor_pool(&gpu_context.device) {
                Ok(pool) => pool,
                Err(e) => {
                    gpu_context.device.destroy_command_pool(upload_command_pool, None);
                    return Err(e);
                }
            };
            let sampler_cache = SamplerCache::new(Arc::clone(&gpu_context));

            engine_info!(
                "mirage3d::vulkan",
                "Vulkan device ready: {} (queue family {}, validation {})",
                device_name, graphics_family_index, if validation { "on" } else { "off" }
            );

            Ok(Self {
                _entry: entry,
                instance,
                device_name,
                allocator: ManuallyDrop::new(allocator_arc),
                debug_messenger,
                gpu_context,
                descriptor_pools: vec![descriptor_pool],
                sampler_cache,
            })
        }
    }

    fn create_descriptor_pool(device: &ash::Device) -> Result<vk::DescriptorPool> {
        let pool_sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: POOL_SAMPLED_TEXTURES,
        }];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(POOL_MAX_SETS);

        unsafe {
            device.create_descriptor_pool(&info, None)
                .map_err(|e| {
                    engine_error!("mirage3d::vulkan", "Failed to create descriptor pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e))
                })
        }
    }

    /// Allocate one descriptor set, growing the pool list when the last pool is full
    fn allocate_descriptor_set(&mut self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        unsafe {
            if let Some(&pool) = self.descriptor_pools.last() {
                let allocate_info = vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(pool)
                    .set_layouts(&layouts);
                match self.gpu_context.device.allocate_descriptor_sets(&allocate_info) {
                    Ok(sets) => return Ok(sets[0]),
                    Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {}
                    Err(e) => engine_bail!("mirage3d::vulkan", "Failed to allocate descriptor set: {:?}", e),
                }
            }

            let pool = Self::create_descriptor_pool(&self.gpu_context.device)?;
            self.descriptor_pools.push(pool);
            engine_debug!(
                "mirage3d::vulkan",
                "Descriptor pool exhausted, created pool {}",
                self.descriptor_pools.len()
            );
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&layouts);
            let sets = self.gpu_context.device.allocate_descriptor_sets(&allocate_info)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to allocate descriptor set after pool growth: {:?}", e))?;
            Ok(sets[0])
        }
    }

    /// Destroy descriptor set layouts created before a later pipeline step failed
    fn destroy_set_layouts(&self, layouts: &[vk::DescriptorSetLayout]) {
        for &layout in layouts {
            unsafe { self.gpu_context.device.destroy_descriptor_set_layout(layout, None); }
        }
    }

    /// Create a device already wrapped for sharing between pipeline components
    pub fn shared(config: Config) -> Result<Arc<Mutex<dyn GraphicsDevice>>> {
        let graphics_device: Arc<Mutex<dyn GraphicsDevice>> = Arc::new(Mutex::new(Self::new(config)?));
        Ok(graphics_device)
    }

    /// Whether validation layers will actually be enabled for `config`
    #[cfg(feature = "vulkan-validation")]
    fn validation_enabled(entry: &ash::Entry, config: &Config) -> bool {
        if !config.enable_validation {
            return false;
        }
        if !crate::debug::validation_layer_available(entry) {
            engine_warn!("mirage3d::vulkan", "Validation requested but VK_LAYER_KHRONOS_validation is not installed");
            return false;
        }
        true
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn validation_enabled(_entry: &ash::Entry, config: &Config) -> bool {
        if config.enable_validation {
            engine_debug!("mirage3d::vulkan", "Validation requested but the vulkan-validation feature is disabled");
        }
        false
    }

    /// First GPU with a graphics queue, discrete GPUs preferred
    unsafe fn pick_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!("mirage3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        let mut candidates: Vec<(vk::PhysicalDevice, u32, bool)> = physical_devices
            .into_iter()
            .filter_map(|physical_device| {
                let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
                let graphics_family_index = queue_families
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))?;
                let properties = instance.get_physical_device_properties(physical_device);
                let discrete = properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
                Some((physical_device, graphics_family_index as u32, discrete))
            })
            .collect();

        // Stable sort keeps enumeration order among equals
        candidates.sort_by_key(|(_, _, discrete)| !*discrete);

        candidates
            .first()
            .map(|(physical_device, family, _)| (*physical_device, *family))
            .ok_or_else(|| {
                engine_error!("mirage3d::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })
    }

    /// Create a persistently mapped buffer, releasing it again on failure
    unsafe fn create_mapped_buffer(
        &self,
        name: &str,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
    ) -> Result<(vk::Buffer, Allocation)> {
        let device = &self.gpu_context.device;

        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = device.create_buffer(&buffer_create_info, None)
            .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to create {} of size {} bytes: {:?}", name, size, e))?;

        let requirements = device.get_buffer_memory_requirements(buffer);

        let allocation = self.gpu_context.lock_allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("mirage3d::vulkan", "Out of GPU memory for {} (required: {:.2} MB)", name, size_mb);
                    Error::OutOfMemory
                })
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                device.destroy_buffer(buffer, None);
                return Err(e);
            }
        };

        if let Err(e) = device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
            self.destroy_mapped_buffer(buffer, allocation);
            return Err(engine_err!("mirage3d::vulkan", "Failed to bind {} memory: {:?}", name, e));
        }

        Ok((buffer, allocation))
    }

    unsafe fn destroy_mapped_buffer(&self, buffer: vk::Buffer, allocation: Allocation) {
        if let Ok(mut allocator) = self.gpu_context.lock_allocator() {
            allocator.free(allocation).ok();
        }
        self.gpu_context.device.destroy_buffer(buffer, None);
    }

    /// Upload `data` into a freshly created image and leave it shader-readable
    unsafe fn upload_texture_data(&self, texture: &Texture, data: &[u8]) -> Result<()> {
        let (staging_buffer, mut staging_allocation) = self.create_mapped_buffer(
            "texture_staging_buffer",
            data.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
        )?;

        let mapped = match staging_allocation.mapped_slice_mut() {
            Some(mapped) => {
                mapped[..data.len()].copy_from_slice(data);
                true
            }
            None => false,
        };
        if !mapped {
            self.destroy_mapped_buffer(staging_buffer, staging_allocation);
            engine_bail!("mirage3d::vulkan", "Staging buffer is not mapped");
        }

        let image = texture.image;
        let extent = vk::Extent3D {
            width: texture.info.width,
            height: texture.info.height,
            depth: 1,
        };

        let result = self.gpu_context.execute_one_shot(|device, command_buffer| {
            let to_transfer = image_barrier(
                image,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::AccessFlags::empty(),
                vk::AccessFlags::TRANSFER_WRITE,
            );
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

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
                .image_extent(extent);

            device.cmd_copy_buffer_to_image(
                command_buffer,
                staging_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            let to_shader_read = image_barrier(
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::SHADER_READ,
            );
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_shader_read],
            );
        });

        self.destroy_mapped_buffer(staging_buffer, staging_allocation);
        result
    }

    /// Move an image without initial data to the shader-readable layout
    unsafe fn transition_to_shader_read(&self, image: vk::Image) -> Result<()> {
        self.gpu_context.execute_one_shot(|device, command_buffer| {
            let barrier = image_barrier(
                image,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::AccessFlags::empty(),
                vk::AccessFlags::SHADER_READ,
            );
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        })
    }
}

// ============================================================================
// FORMAT CONVERSION
// ============================================================================

/// Convert TextureFormat to Vulkan format
pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
    }
}

/// Convert BufferFormat to Vulkan format
pub(crate) fn buffer_format_to_vk(format: BufferFormat) -> vk::Format {
    match format {
        BufferFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        BufferFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
        BufferFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
    }
}

/// Image usage flags for a texture usage
///
/// Every texture can receive uploads; host readback adds the copy source.
pub(crate) fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::TRANSFER_DST;
    if usage.contains(TextureUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::RENDER_TARGET) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsage::HOST_READBACK) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    flags
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    match usage {
        BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
    }
}

pub(crate) fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
    }
}

pub(crate) fn binding_type_to_vk(binding_type: BindingType) -> vk::DescriptorType {
    match binding_type {
        BindingType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
    }
}

/// Layout transition barrier over the single color subresource
fn image_barrier(
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access_mask: vk::AccessFlags,
    dst_access_mask: vk::AccessFlags,
) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
        .src_access_mask(src_access_mask)
        .dst_access_mask(dst_access_mask)
}

fn color_view_create_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
}

// ============================================================================
// GRAPHICS DEVICE
// ============================================================================

impl GraphicsDevice for VulkanGraphicsDevice {
    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn GraphicsTexture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "Texture dimensions must be non-zero ({}x{})",
                desc.width, desc.height
            )));
        }
        if let Some(data) = &desc.data {
            if data.len() != desc.tight_size() {
                return Err(Error::InvalidResource(format!(
                    "Texture data is {} bytes, expected {} for {}x{} {:?}",
                    data.len(), desc.tight_size(), desc.width, desc.height, desc.format
                )));
            }
        }

        let device = &self.gpu_context.device;

        unsafe {
            let format = texture_format_to_vk(desc.format);

            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(texture_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to create texture image: {:?}", e))?;

            let requirements = device.get_image_memory_requirements(image);

            let allocation = self.gpu_context.lock_allocator().and_then(|mut allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: "texture",
                        requirements,
                        location: MemoryLocation::GpuOnly,
                        linear: false,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        engine_error!("mirage3d::vulkan", "Out of GPU memory for texture (size: {}x{}, {:.2} MB)", desc.width, desc.height, size_mb);
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_image(image, None);
                    return Err(e);
                }
            };

            let view = device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .and_then(|_| device.create_image_view(&color_view_create_info(image, format), None));
            let view = match view {
                Ok(view) => view,
                Err(e) => {
                    if let Ok(mut allocator) = self.gpu_context.lock_allocator() {
                        allocator.free(allocation).ok();
                    }
                    device.destroy_image(image, None);
                    engine_bail!("mirage3d::vulkan", "Failed to bind texture memory or create view: {:?}", e);
                }
            };

            // From here on, Texture::drop releases everything created so far
            let mut texture = Texture {
                ctx: Arc::clone(&self.gpu_context),
                image,
                view,
                allocation: Some(allocation),
                readback: None,
                info: TextureInfo {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    usage: desc.usage,
                },
            };

            if desc.usage.contains(TextureUsage::HOST_READBACK) {
                let bytes_per_row = desc.width as usize * desc.format.bytes_per_pixel() as usize;
                let (buffer, mut allocation) = self.create_mapped_buffer(
                    "texture_readback_buffer",
                    desc.tight_size() as u64,
                    vk::BufferUsageFlags::TRANSFER_DST,
                    MemoryLocation::GpuToCpu,
                )?;

                // The readback copy starts out equal to the uploaded content
                if let (Some(data), Some(mapped)) = (&desc.data, allocation.mapped_slice_mut()) {
                    mapped[..data.len()].copy_from_slice(data);
                }

                texture.readback = Some(ReadbackBuffer {
                    buffer,
                    allocation: Some(allocation),
                    bytes_per_row,
                });
            }

            match &desc.data {
                Some(data) => self.upload_texture_data(&texture, data)?,
                None => self.transition_to_shader_read(texture.image)?,
            }

            engine_debug!(
                "mirage3d::vulkan",
                "Created texture {}x{} {:?} {:?}",
                desc.width, desc.height, desc.format, desc.usage
            );

            Ok(Arc::new(texture))
        }
    }

    fn create_render_target(&self, texture: &Arc<dyn GraphicsTexture>) -> Result<Arc<dyn GraphicsRenderTarget>> {
        let info = texture.info();
        if !info.usage.contains(TextureUsage::RENDER_TARGET) {
            return Err(Error::InvalidResource(format!(
                "create_render_target: texture usage {:?} lacks RENDER_TARGET",
                info.usage
            )));
        }

        unsafe {
            // Downcast to Vulkan texture to access VkImage
            let vk_texture = texture.as_ref() as *const dyn GraphicsTexture as *const Texture;
            let vk_texture = &*vk_texture;

            let view_create_info = color_view_create_info(vk_texture.image, texture_format_to_vk(info.format));

            let view = self.gpu_context.device.create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to create image view for render target: {:?}", e))?;

            // RenderTarget owns the ImageView but NOT the VkImage (owned by the Texture)
            Ok(Arc::new(RenderTarget::new(
                Arc::clone(texture),
                view,
                self.gpu_context.device.clone(),
            )))
        }
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn GraphicsRenderPass>> {
        let attachments: Vec<vk::AttachmentDescription> = desc.color_attachments
            .iter()
            .map(|attachment| {
                vk::AttachmentDescription::default()
                    .format(texture_format_to_vk(attachment.format))
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(load_op_to_vk(attachment.load_op))
                    .store_op(store_op_to_vk(attachment.store_op))
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(image_layout_to_vk(attachment.initial_layout))
                    .final_layout(image_layout_to_vk(attachment.final_layout))
            })
            .collect();

        let color_attachment_refs: Vec<vk::AttachmentReference> = (0..attachments.len() as u32)
            .map(|i| {
                vk::AttachmentReference::default()
                    .attachment(i)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            })
            .collect();

        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachment_refs);

        // In: wait for earlier sampling and host copies of the target.
        // Out: make the result visible to sampling and the readback copy.
        let dependencies = [
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::TRANSFER)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE),
            vk::SubpassDependency::default()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::TRANSFER)
                .dst_access_mask(vk::AccessFlags::SHADER_READ | vk::AccessFlags::TRANSFER_READ),
        ];

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&dependencies);

        let render_pass = unsafe {
            self.gpu_context.device.create_render_pass(&render_pass_info, None)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to create render pass: {:?}", e))?
        };

        Ok(Arc::new(RenderPass {
            render_pass,
            color_attachments: desc.color_attachments.clone(),
            device: self.gpu_context.device.clone(),
        }))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn GraphicsBuffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource("Buffer size must be non-zero".to_string()));
        }

        unsafe {
            let (buffer, allocation) = self.create_mapped_buffer(
                "buffer",
                desc.size,
                buffer_usage_to_vk(desc.usage) | vk::BufferUsageFlags::TRANSFER_DST,
                MemoryLocation::CpuToGpu,
            )?;

            Ok(Arc::new(Buffer::new(
                Arc::clone(&self.gpu_context),
                buffer,
                allocation,
                desc.size,
            )))
        }
    }

    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn GraphicsShader>> {
        // read_spv checks size and magic and realigns the bytes to u32 words
        let code = ash::util::read_spv(&mut Cursor::new(&desc.code)).map_err(|e| {
            engine_warn!("mirage3d::vulkan", "Invalid SPIR-V for {:?} shader: {}", desc.stage, e);
            Error::InvalidResource(format!("Invalid SPIR-V: {}", e))
        })?;

        let entry_point = CString::new(desc.entry_point.as_str())
            .map_err(|_| Error::InvalidResource("Shader entry point contains a NUL byte".to_string()))?;

        let create_info = vk::ShaderModuleCreateInfo::default()
            .code(&code);

        let module = unsafe {
            self.gpu_context.device.create_shader_module(&create_info, None)
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to create shader module: {:?}", e))?
        };

        Ok(Arc::new(Shader {
            module,
            stage: desc.stage,
            entry_point,
            device: self.gpu_context.device.clone(),
        }))
    }

    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<Arc<dyn GraphicsPipeline>> {
        unsafe {
            // Downcast render pass and shaders to Vulkan types
            let vk_render_pass = desc.render_pass.as_ref() as *const dyn GraphicsRenderPass as *const RenderPass;
            let vk_render_pass = &*vk_render_pass;

            let vertex_shader = desc.vertex_shader.as_ref() as *const dyn GraphicsShader as *const Shader;
            let vertex_shader = &*vertex_shader;

            let fragment_shader = desc.fragment_shader.as_ref() as *const dyn GraphicsShader as *const Shader;
            let fragment_shader = &*fragment_shader;

            let shader_stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(vertex_shader.stage))
                    .module(vertex_shader.module)
                    .name(&vertex_shader.entry_point),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(fragment_shader.stage))
                    .module(fragment_shader.module)
                    .name(&fragment_shader.entry_point),
            ];

            // Single interleaved binding
            let vertex_bindings = [vk::VertexInputBindingDescription {
                binding: 0,
                stride: desc.vertex_layout.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            }];

            let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc.vertex_layout.attributes
                .iter()
                .map(|attribute| vk::VertexInputAttributeDescription {
                    location: attribute.location,
                    binding: 0,
                    format: buffer_format_to_vk(attribute.format),
                    offset: attribute.offset,
                })
                .collect();

            let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&vertex_bindings)
                .vertex_attribute_descriptions(&vertex_attributes);

            let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(topology_to_vk(desc.topology))
                .primitive_restart_enable(false);

            // Viewport state (dynamic)
            let viewports = [vk::Viewport::default()];
            let scissors = [vk::Rect2D::default()];
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewports(&viewports)
                .scissors(&scissors);

            // Overlay meshes are not closed: no culling, no depth
            let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false);

            let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false);

            let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&color_blend_attachment));

            let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
            let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
                .dynamic_states(&dynamic_states);

            // One descriptor set layout per binding group, in set order
            let mut descriptor_set_layouts: Vec<vk::DescriptorSetLayout> = Vec::new();
            for group in &desc.binding_group_layouts {
                let bindings: Vec<vk::DescriptorSetLayoutBinding> = group.entries
                    .iter()
                    .map(|entry| {
                        vk::DescriptorSetLayoutBinding::default()
                            .binding(entry.binding)
                            .descriptor_type(binding_type_to_vk(entry.binding_type))
                            .descriptor_count(1)
                            .stage_flags(shader_stage_to_vk(entry.stage))
                    })
                    .collect();
                let set_layout_info = vk::DescriptorSetLayoutCreateInfo::default()
                    .bindings(&bindings);
                match self.gpu_context.device.create_descriptor_set_layout(&set_layout_info, None) {
                    Ok(set_layout) => descriptor_set_layouts.push(set_layout),
                    Err(e) => {
                        self.destroy_set_layouts(&descriptor_set_layouts);
                        engine_bail!("mirage3d::vulkan", "Failed to create descriptor set layout: {:?}", e);
                    }
                }
            }

            // Pipeline layout with the vertex-stage push constant block
            let push_constant_ranges = [vk::PushConstantRange {
                stage_flags: vk::ShaderStageFlags::VERTEX,
                offset: 0,
                size: desc.push_constant_size,
            }];

            let mut layout_create_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&descriptor_set_layouts);
            if desc.push_constant_size > 0 {
                layout_create_info = layout_create_info.push_constant_ranges(&push_constant_ranges);
            }

            let layout = match self.gpu_context.device.create_pipeline_layout(&layout_create_info, None) {
                Ok(layout) => layout,
                Err(e) => {
                    self.destroy_set_layouts(&descriptor_set_layouts);
                    engine_bail!("mirage3d::vulkan", "Failed to create pipeline layout: {:?}", e);
                }
            };

            let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&shader_stages)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .multisample_state(&multisample_state)
                .color_blend_state(&color_blend_state)
                .dynamic_state(&dynamic_state)
                .layout(layout)
                .render_pass(vk_render_pass.render_pass)
                .subpass(0);

            let pipelines = match self.gpu_context.device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_create_info],
                None,
            ) {
                Ok(pipelines) => pipelines,
                Err((_, e)) => {
                    self.gpu_context.device.destroy_pipeline_layout(layout, None);
                    self.destroy_set_layouts(&descriptor_set_layouts);
                    engine_bail!("mirage3d::vulkan", "Failed to create graphics pipeline: {:?}", e);
                }
            };

            Ok(Arc::new(Pipeline {
                pipeline: pipelines[0],
                pipeline_layout: layout,
                descriptor_set_layouts,
                binding_group_layouts: desc.binding_group_layouts,
                topology: desc.topology,
                push_constant_size: desc.push_constant_size,
                device: self.gpu_context.device.clone(),
            }))
        }
    }

    fn create_binding_group(
        &mut self,
        pipeline: &Arc<dyn GraphicsPipeline>,
        set_index: u32,
        resources: &[BindingResource<'_>],
    ) -> Result<Arc<dyn GraphicsBindingGroup>> {
        let vk_pipeline = pipeline.as_ref() as *const dyn GraphicsPipeline as *const Pipeline;
        let vk_pipeline = unsafe { &*vk_pipeline };

        let (set_layout, layout_desc) = match (
            vk_pipeline.descriptor_set_layouts.get(set_index as usize),
            vk_pipeline.binding_group_layouts.get(set_index as usize),
        ) {
            (Some(&set_layout), Some(layout_desc)) => (set_layout, layout_desc),
            _ => {
                engine_warn!(
                    "mirage3d::vulkan",
                    "create_binding_group: set {} out of range (pipeline has {} sets)",
                    set_index, vk_pipeline.descriptor_set_layouts.len()
                );
                return Err(Error::InvalidResource(format!(
                    "binding group set {} out of range ({} sets)",
                    set_index, vk_pipeline.descriptor_set_layouts.len()
                )));
            }
        };

        if resources.len() != layout_desc.entries.len() {
            return Err(Error::InvalidResource(format!(
                "binding group set {} expects {} resources, got {}",
                set_index, layout_desc.entries.len(), resources.len()
            )));
        }

        // Resolve every resource before allocating, so a rejected resource leaks no set
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::with_capacity(resources.len());
        let mut textures: Vec<Arc<dyn GraphicsTexture>> = Vec::with_capacity(resources.len());
        for (entry, resource) in layout_desc.entries.iter().zip(resources) {
            match (entry.binding_type, resource) {
                (BindingType::CombinedImageSampler, BindingResource::SampledTexture(texture, sampler_type)) => {
                    let texture: &Arc<dyn GraphicsTexture> = texture;
                    if !texture.info().usage.contains(TextureUsage::SAMPLED) {
                        return Err(Error::InvalidResource(format!(
                            "binding {}: texture lacks SAMPLED usage", entry.binding
                        )));
                    }
                    let vk_texture = Arc::as_ptr(texture) as *const Texture;
                    let vk_texture = unsafe { &*vk_texture };
                    let sampler = self.sampler_cache.get(*sampler_type)?;
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                            .image_view(vk_texture.view)
                            .sampler(sampler)
                    );
                    textures.push(Arc::clone(texture));
                }
            }
        }

        let descriptor_set = self.allocate_descriptor_set(set_layout)?;

        let writes: Vec<vk::WriteDescriptorSet> = layout_desc.entries
            .iter()
            .zip(&image_infos)
            .map(|(entry, image_info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(entry.binding)
                    .dst_array_element(0)
                    .descriptor_type(binding_type_to_vk(entry.binding_type))
                    .image_info(std::slice::from_ref(image_info))
            })
            .collect();

        unsafe {
            self.gpu_context.device.update_descriptor_sets(&writes, &[]);
        }

        Ok(Arc::new(BindingGroup {
            descriptor_set,
            set_index,
            _textures: textures,
        }))
    }

    fn create_command_list(&self) -> Result<Box<dyn GraphicsCommandList>> {
        let command_list = CommandList::new(Arc::clone(&self.gpu_context))?;
        Ok(Box::new(command_list))
    }

    fn submit(&self, commands: &[&dyn GraphicsCommandList]) -> Result<Arc<dyn GraphicsFence>> {
        unsafe {
            // Collect command buffers
            let mut command_buffers = Vec::with_capacity(commands.len());
            for command in commands {
                let vk_command = *command as *const dyn GraphicsCommandList as *const CommandList;
                let vk_command = &*vk_command;
                if vk_command.is_recording() {
                    engine_bail!("mirage3d::vulkan", "submit: command list is still recording");
                }
                command_buffers.push(vk_command.command_buffer());
            }

            let fence = self.gpu_context.device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| engine_err!("mirage3d::vulkan", "submit: failed to create fence: {:?}", e))?;

            let submit_info = vk::SubmitInfo::default()
                .command_buffers(&command_buffers);

            if let Err(e) = self.gpu_context.device.queue_submit(
                self.gpu_context.graphics_queue,
                &[submit_info],
                fence,
            ) {
                self.gpu_context.device.destroy_fence(fence, None);
                engine_bail!("mirage3d::vulkan", "submit: failed to submit queue: {:?}", e);
            }

            Ok(Arc::new(Fence::new(Arc::clone(&self.gpu_context), fence)))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.gpu_context.device
                .device_wait_idle()
                .map_err(|e| engine_err!("mirage3d::vulkan", "Failed to wait idle: {:?}", e))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            let device = self.gpu_context.device.clone();

            // Wait for device to finish
            device.device_wait_idle().ok();

            // 1. Samplers and descriptor pools (frees every descriptor set)
            self.sampler_cache.shutdown();
            for pool in self.descriptor_pools.drain(..) {
                device.destroy_descriptor_pool(pool, None);
            }

            // 2. Destroy upload command pool from GpuContext
            if let Ok(mut pool) = self.gpu_context.upload_command_pool.lock() {
                if *pool != vk::CommandPool::null() {
                    device.destroy_command_pool(*pool, None);
                    *pool = vk::CommandPool::null();
                }
            }

            // 3. Drop allocator: free VkDeviceMemory pages BEFORE destroying device.
            //    First drop this device's Arc, then GpuContext's ManuallyDrop Arc.
            ManuallyDrop::drop(&mut self.allocator);
            match Arc::get_mut(&mut self.gpu_context) {
                Some(ctx) => ManuallyDrop::drop(&mut ctx.allocator),
                None => engine_warn!(
                    "mirage3d::vulkan",
                    "GPU resources outlive the device; their memory is leaked"
                ),
            }

            // 4. Destroy debug messenger BEFORE device and instance
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 5. Destroy device and instance
            device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
