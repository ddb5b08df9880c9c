/// OffscreenRenderer - draws a scene snapshot into an offscreen target.
///
/// Rendering is asynchronous: `render` records and submits one command list
/// and returns a `RenderCompletion` without waiting for the GPU.
///
/// Command lists are pooled. A pooled slot is reused only after the fence of
/// its last submission signalled, and each slot owns its vertex buffer, so
/// the vertices of a frame still in flight are never overwritten. A slot
/// whose recording fails is dropped from the pool.
///
/// Every draw samples a material texture at set 0; meshes without a material
/// sample a 1x1 white texture, which leaves their vertex colors unchanged.

use std::sync::{Arc, Mutex};
use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_device::{
    lock_device, AttachmentDesc, BindingGroup, BindingGroupLayoutDesc, BindingResource, Buffer,
    BufferDesc, BufferUsage, ClearColor, ClearValue, CommandList, Fence, GraphicsDevice, Pipeline,
    PipelineDesc, PrimitiveTopology, Rect2D, RenderPass, SamplerType, Shader, ShaderDesc,
    ShaderStage, Texture, TextureDesc, TextureFormat, TextureUsage, Viewport,
};
use crate::scene::{Material, SceneSnapshot, Vertex};
use crate::{engine_trace, engine_debug, engine_warn};
use super::{OffscreenTarget, RenderCompletion, RenderPassDescriptor};

/// Smallest vertex buffer a pooled slot allocates
const MIN_VERTEX_BUFFER_SIZE: u64 = 64 * 1024;
/// One column-major 4x4 f32 matrix
const MVP_PUSH_CONSTANT_SIZE: u32 = 64;
/// Set index of the material binding group
const MATERIAL_SET: u32 = 0;

/// Converts the y-up clip space of the scene math into the y-down clip
/// space of the render target (row 0 is the top of the image).
const CLIP_Y_FLIP: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

/// Compiled scene shaders (SPIR-V for the Vulkan backend)
///
/// Vertex inputs follow `Vertex::layout()`; the vertex stage receives the
/// model-view-projection matrix as a 64-byte push constant block. The
/// fragment stage samples a combined image sampler at set 0, binding 0 and
/// multiplies it with the vertex color.
#[derive(Debug, Clone)]
pub struct SceneShaders {
    pub vertex: Vec<u8>,
    pub fragment: Vec<u8>,
}

struct CommandSlot {
    command_list: Box<dyn CommandList>,
    vertex_buffer: Option<Arc<dyn Buffer>>,
    fence: Option<Arc<dyn Fence>>,
}

impl CommandSlot {
    fn is_free(&self) -> Result<bool> {
        match &self.fence {
            Some(fence) => fence.is_signaled(),
            None => Ok(true),
        }
    }
}

/// One mesh resolved for this frame
struct DrawCall {
    mvp: Mat4,
    first_vertex: u32,
    vertex_count: u32,
    material: Option<Material>,
}

/// Pipeline state shared by every draw of a frame
struct Geometry<'a> {
    pipeline: &'a Arc<dyn Pipeline>,
    vertex_buffer: &'a Arc<dyn Buffer>,
    /// One binding group per draw call
    binding_groups: &'a [Arc<dyn BindingGroup>],
}

/// Binding groups are created per pipeline, sampled texture and sampler
type BindingGroupKey = (AttachmentDesc, usize, SamplerType);

pub struct OffscreenRenderer {
    graphics_device: Arc<Mutex<dyn GraphicsDevice>>,
    shaders: Option<(Arc<dyn Shader>, Arc<dyn Shader>)>,
    render_passes: FxHashMap<AttachmentDesc, Arc<dyn RenderPass>>,
    pipelines: FxHashMap<AttachmentDesc, Arc<dyn Pipeline>>,
    /// Groups keep their texture alive, so a cached address is never reused
    binding_groups: FxHashMap<BindingGroupKey, Arc<dyn BindingGroup>>,
    white_texture: Option<Arc<dyn Texture>>,
    slots: Vec<CommandSlot>,
    frame_index: u64,
    warned_missing_pipeline: bool,
    warned_feedback: bool,
}

impl OffscreenRenderer {
    /// Renderer without scene shaders: passes clear the target, geometry is skipped
    pub fn new(graphics_device: Arc<Mutex<dyn GraphicsDevice>>) -> Self {
        Self {
            graphics_device,
            shaders: None,
            render_passes: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            binding_groups: FxHashMap::default(),
            white_texture: None,
            slots: Vec::new(),
            frame_index: 0,
            warned_missing_pipeline: false,
            warned_feedback: false,
        }
    }

    /// Create the scene shader modules used to draw geometry
    pub fn with_scene_shaders(mut self, shaders: SceneShaders) -> Result<Self> {
        {
            let mut graphics_device = lock_device(&self.graphics_device)?;
            let vertex = graphics_device.create_shader(ShaderDesc {
                code: shaders.vertex,
                stage: ShaderStage::Vertex,
                entry_point: "main".to_string(),
            })?;
            let fragment = graphics_device.create_shader(ShaderDesc {
                code: shaders.fragment,
                stage: ShaderStage::Fragment,
                entry_point: "main".to_string(),
            })?;
            self.shaders = Some((vertex, fragment));
        }
        Ok(self)
    }

    pub fn graphics_device(&self) -> &Arc<Mutex<dyn GraphicsDevice>> {
        &self.graphics_device
    }

    /// Number of render calls submitted so far
    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    /// Number of pooled command lists
    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    /// Render `scene` into `target`, clearing it to `clear_color` first
    ///
    /// Returns as soon as the work is submitted. When the target keeps a
    /// host-visible mirror, the mirror is refreshed as part of the same
    /// submission, so it is valid once the completion signals.
    ///
    /// A failed call leaves the renderer usable: the next call records into
    /// a fresh command list.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the target cannot be rendered to.
    pub fn render(
        &mut self,
        scene: SceneSnapshot<'_>,
        target: &OffscreenTarget,
        clear_color: ClearColor,
    ) -> Result<RenderCompletion> {
        if !target.usage().contains(TextureUsage::RENDER_TARGET) {
            return Err(Error::InvalidResource(format!(
                "offscreen target usage {:?} lacks RENDER_TARGET",
                target.usage()
            )));
        }

        let descriptor = RenderPassDescriptor::clear_and_store(target, clear_color);
        let (vertices, draw_calls) = self.collect_draw_calls(scene, target)?;

        let graphics_device_arc = self.graphics_device.clone();
        let mut graphics_device = lock_device(&graphics_device_arc)?;

        let attachment = descriptor.attachment();
        let render_pass = self.render_pass(&mut *graphics_device, &descriptor)?;
        let pipeline = self.pipeline(&mut *graphics_device, attachment, &render_pass)?;
        let slot_index = self.acquire_slot(&*graphics_device)?;

        let (vertex_buffer, binding_groups) = match &pipeline {
            Some(pipeline) if !draw_calls.is_empty() => {
                let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices.as_slice());
                let vertex_buffer = self.ensure_vertex_buffer(&mut *graphics_device, slot_index, vertex_bytes)?;
                let mut binding_groups = Vec::with_capacity(draw_calls.len());
                for draw in &draw_calls {
                    binding_groups.push(self.binding_group(
                        &mut *graphics_device,
                        attachment,
                        pipeline,
                        draw.material.as_ref(),
                    )?);
                }
                (Some(vertex_buffer), binding_groups)
            }
            _ => (None, Vec::new()),
        };
        let geometry = match (&pipeline, &vertex_buffer) {
            (Some(pipeline), Some(vertex_buffer)) => Some(Geometry {
                pipeline,
                vertex_buffer,
                binding_groups: &binding_groups,
            }),
            _ => None,
        };

        let recorded = record_frame(
            self.slots[slot_index].command_list.as_mut(),
            &render_pass,
            target,
            &descriptor.clear_values(),
            geometry.as_ref(),
            &draw_calls,
        );
        if let Err(e) = recorded {
            // The list may be left recording; it is never reused
            self.slots.swap_remove(slot_index);
            engine_warn!(
                "mirage3d::OffscreenRenderer",
                "Recording frame {} failed, command list discarded: {}",
                self.frame_index, e
            );
            return Err(e);
        }

        let ticket = target.issue_submission();
        let slot = &mut self.slots[slot_index];
        let fence = graphics_device.submit(&[slot.command_list.as_ref()])?;
        slot.fence = Some(fence.clone());

        let frame_index = self.frame_index;
        self.frame_index += 1;
        engine_trace!(
            "mirage3d::OffscreenRenderer",
            "Frame {} submitted: {} draw(s), {} vertices",
            frame_index, draw_calls.len(), vertices.len()
        );

        Ok(RenderCompletion::new(fence, frame_index, ticket))
    }

    /// Flatten the scene into one vertex array and per-mesh draw calls
    fn collect_draw_calls(
        &mut self,
        scene: SceneSnapshot<'_>,
        target: &OffscreenTarget,
    ) -> Result<(Vec<Vertex>, Vec<DrawCall>)> {
        let drawables = scene.scene.drawables();
        if self.shaders.is_none() {
            if !drawables.is_empty() && !self.warned_missing_pipeline {
                engine_warn!(
                    "mirage3d::OffscreenRenderer",
                    "No scene shaders configured: {} mesh node(s) will not be drawn",
                    drawables.len()
                );
                self.warned_missing_pipeline = true;
            }
            return Ok((Vec::new(), Vec::new()));
        }

        let view_projection = CLIP_Y_FLIP * scene.viewpoint.view_projection_matrix();
        let mut vertices = Vec::new();
        let mut draw_calls = Vec::with_capacity(drawables.len());
        for drawable in drawables {
            let first_vertex = u32::try_from(vertices.len())
                .map_err(|_| Error::InvalidResource("scene exceeds u32 vertex count".to_string()))?;
            vertices.extend_from_slice(drawable.mesh.vertices());
            let material = match drawable.material {
                Some(material) if samples_target(&material, target) => {
                    if !self.warned_feedback {
                        engine_warn!(
                            "mirage3d::OffscreenRenderer",
                            "Material of node {:?} samples the target being rendered, drawn untextured",
                            drawable.key
                        );
                        self.warned_feedback = true;
                    }
                    None
                }
                material => material,
            };
            draw_calls.push(DrawCall {
                mvp: view_projection * drawable.world,
                first_vertex,
                vertex_count: drawable.mesh.vertex_count(),
                material,
            });
        }
        Ok((vertices, draw_calls))
    }

    fn render_pass(
        &mut self,
        graphics_device: &mut dyn GraphicsDevice,
        descriptor: &RenderPassDescriptor,
    ) -> Result<Arc<dyn RenderPass>> {
        let attachment = descriptor.attachment();
        if let Some(render_pass) = self.render_passes.get(&attachment) {
            return Ok(render_pass.clone());
        }
        let render_pass = graphics_device.create_render_pass(&descriptor.render_pass_desc())?;
        self.render_passes.insert(attachment, render_pass.clone());
        engine_debug!("mirage3d::OffscreenRenderer", "Created render pass for {:?}", attachment.format);
        Ok(render_pass)
    }

    fn pipeline(
        &mut self,
        graphics_device: &mut dyn GraphicsDevice,
        attachment: AttachmentDesc,
        render_pass: &Arc<dyn RenderPass>,
    ) -> Result<Option<Arc<dyn Pipeline>>> {
        let Some((vertex_shader, fragment_shader)) = &self.shaders else {
            return Ok(None);
        };
        if let Some(pipeline) = self.pipelines.get(&attachment) {
            return Ok(Some(pipeline.clone()));
        }
        let pipeline = graphics_device.create_pipeline(PipelineDesc {
            vertex_shader: vertex_shader.clone(),
            fragment_shader: fragment_shader.clone(),
            vertex_layout: Vertex::layout(),
            topology: PrimitiveTopology::TriangleList,
            push_constant_size: MVP_PUSH_CONSTANT_SIZE,
            render_pass: render_pass.clone(),
            binding_group_layouts: vec![BindingGroupLayoutDesc::sampled_texture()],
        })?;
        self.pipelines.insert(attachment, pipeline.clone());
        Ok(Some(pipeline))
    }

    /// Material binding group of one draw, the white texture when `material` is unset
    fn binding_group(
        &mut self,
        graphics_device: &mut dyn GraphicsDevice,
        attachment: AttachmentDesc,
        pipeline: &Arc<dyn Pipeline>,
        material: Option<&Material>,
    ) -> Result<Arc<dyn BindingGroup>> {
        let (texture, sampler) = match material {
            Some(material) => (material.diffuse().clone(), material.sampler()),
            None => (self.white_texture(graphics_device)?, SamplerType::NearestClamp),
        };
        let key = (attachment, Arc::as_ptr(&texture) as *const () as usize, sampler);
        if let Some(binding_group) = self.binding_groups.get(&key) {
            return Ok(binding_group.clone());
        }
        let binding_group = graphics_device.create_binding_group(
            pipeline,
            MATERIAL_SET,
            &[BindingResource::SampledTexture(&texture, sampler)],
        )?;
        self.binding_groups.insert(key, binding_group.clone());
        engine_debug!(
            "mirage3d::OffscreenRenderer",
            "Created material binding group ({} cached)",
            self.binding_groups.len()
        );
        Ok(binding_group)
    }

    fn white_texture(&mut self, graphics_device: &mut dyn GraphicsDevice) -> Result<Arc<dyn Texture>> {
        if let Some(texture) = &self.white_texture {
            return Ok(texture.clone());
        }
        let texture = graphics_device.create_texture(TextureDesc {
            width: 1,
            height: 1,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::SAMPLED,
            data: Some(vec![255; 4]),
        })?;
        self.white_texture = Some(texture.clone());
        Ok(texture)
    }

    /// Index of a slot whose last submission has completed, creating one if needed
    fn acquire_slot(&mut self, graphics_device: &dyn GraphicsDevice) -> Result<usize> {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.is_free()? {
                return Ok(index);
            }
        }
        self.slots.push(CommandSlot {
            command_list: graphics_device.create_command_list()?,
            vertex_buffer: None,
            fence: None,
        });
        engine_debug!("mirage3d::OffscreenRenderer", "Command list pool grown to {}", self.slots.len());
        Ok(self.slots.len() - 1)
    }

    fn ensure_vertex_buffer(
        &mut self,
        graphics_device: &mut dyn GraphicsDevice,
        slot_index: usize,
        data: &[u8],
    ) -> Result<Arc<dyn Buffer>> {
        let slot = &mut self.slots[slot_index];
        let needed = data.len() as u64;
        let buffer = match &slot.vertex_buffer {
            Some(buffer) if buffer.size() >= needed => buffer.clone(),
            _ => {
                let size = needed.next_power_of_two().max(MIN_VERTEX_BUFFER_SIZE);
                let buffer = graphics_device.create_buffer(BufferDesc {
                    size,
                    usage: BufferUsage::Vertex,
                })?;
                slot.vertex_buffer = Some(buffer.clone());
                buffer
            }
        };
        buffer.update(0, data)?;
        Ok(buffer)
    }
}

/// True when `material` reads the texture `target` draws into
fn samples_target(material: &Material, target: &OffscreenTarget) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(material.diffuse()), Arc::as_ptr(target.texture()))
}

/// Record one frame: clear, draw every mesh, then refresh the host mirror
fn record_frame(
    command_list: &mut dyn CommandList,
    render_pass: &Arc<dyn RenderPass>,
    target: &OffscreenTarget,
    clear_values: &[ClearValue],
    geometry: Option<&Geometry<'_>>,
    draw_calls: &[DrawCall],
) -> Result<()> {
    let width = target.width();
    let height = target.height();

    command_list.begin()?;
    command_list.begin_render_pass(render_pass, target.render_target(), clear_values)?;
    command_list.set_viewport(Viewport::full(width, height))?;
    command_list.set_scissor(Rect2D::full(width, height))?;
    if let Some(geometry) = geometry {
        command_list.bind_pipeline(geometry.pipeline)?;
        command_list.bind_vertex_buffer(geometry.vertex_buffer, 0)?;
        for (draw, binding_group) in draw_calls.iter().zip(geometry.binding_groups) {
            command_list.bind_binding_group(geometry.pipeline, MATERIAL_SET, binding_group)?;
            command_list.push_constants(0, bytemuck::cast_slice(&draw.mvp.to_cols_array()[..]))?;
            command_list.draw(draw.vertex_count, draw.first_vertex)?;
        }
    }
    command_list.end_render_pass()?;
    if target.usage().contains(TextureUsage::HOST_READBACK) {
        command_list.copy_texture_to_host(target.texture())?;
    }
    command_list.end()
}

#[cfg(test)]
#[path = "offscreen_renderer_tests.rs"]
mod tests;
