/// Mock graphics device for unit tests (no GPU required)
///
/// Behaves like an asynchronous GPU: `submit` only queues work, and queued
/// work executes when a fence is waited on, when `poll` is called, or on
/// `wait_idle`. Execution happens on the CPU: clears, triangle rasterization
/// (no depth test, draw order wins), texture sampling through binding groups
/// and host readback copies write real pixels, so tests can assert on
/// rendered content.
///
/// `fail_next` makes the next recording of a named command fail once, to
/// exercise error paths of callers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::engine_bail;
use crate::graphics_device::{
    AttachmentDesc, BindingGroup, BindingGroupLayoutDesc, BindingResource, Buffer, BufferDesc,
    BufferFormat, ClearValue, CommandList, Fence, GraphicsDevice, LoadOp, HostMemory, Pipeline,
    PipelineDesc, PrimitiveTopology, Rect2D, RenderPass, RenderPassDesc, RenderTarget,
    SamplerType, Shader, ShaderDesc, ShaderStage, Texture, TextureDesc, TextureFormat,
    TextureInfo, TextureUsage, VertexLayout, Viewport,
};

// ============================================================================
// Mock Texture
// ============================================================================

pub struct MockTexture {
    pub info: TextureInfo,
    /// "Device" memory, tightly packed rows
    pixels: Mutex<Vec<u8>>,
    /// Host-visible mirror (only with HOST_READBACK)
    host: Option<Mutex<Vec<u8>>>,
}

impl MockTexture {
    pub fn new(info: TextureInfo) -> Self {
        let size = info.width as usize * info.height as usize * info.format.bytes_per_pixel() as usize;
        let host = info
            .usage
            .contains(TextureUsage::HOST_READBACK)
            .then(|| Mutex::new(vec![0u8; size]));
        Self {
            info,
            pixels: Mutex::new(vec![0u8; size]),
            host,
        }
    }

    /// Snapshot of the "device" memory (what the GPU sees, not the host mirror)
    pub fn device_bytes(&self) -> Vec<u8> {
        self.pixels.lock().unwrap().clone()
    }

    /// Decoded color of one pixel of the device memory
    pub fn device_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let bpp = self.info.format.bytes_per_pixel() as usize;
        let offset = (y as usize * self.info.width as usize + x as usize) * bpp;
        let pixels = self.pixels.lock().unwrap();
        self.info.format.decode_color(&pixels[offset..offset + bpp])
    }

    fn write_all(&self, data: &[u8]) {
        self.pixels.lock().unwrap().copy_from_slice(data);
    }

    fn copy_to_host(&self) {
        if let Some(host) = &self.host {
            host.lock().unwrap().copy_from_slice(&self.pixels.lock().unwrap());
        }
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn host_memory(&self) -> Option<HostMemory> {
        let host = self.host.as_ref()?;
        Some(HostMemory {
            bytes: host.lock().unwrap().clone(),
            bytes_per_row: self.info.width as usize * self.info.format.bytes_per_pixel() as usize,
        })
    }
}

/// Downcast a texture created by the mock device
pub fn as_mock_texture(texture: &Arc<dyn Texture>) -> &MockTexture {
    unsafe { &*(texture.as_ref() as *const dyn Texture as *const MockTexture) }
}

// ============================================================================
// Mock RenderTarget / RenderPass
// ============================================================================

pub struct MockRenderTarget {
    texture: Arc<dyn Texture>,
}

impl RenderTarget for MockRenderTarget {
    fn width(&self) -> u32 {
        self.texture.info().width
    }

    fn height(&self) -> u32 {
        self.texture.info().height
    }

    fn format(&self) -> TextureFormat {
        self.texture.info().format
    }

    fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }
}

pub struct MockRenderPass {
    attachments: Vec<AttachmentDesc>,
}

impl RenderPass for MockRenderPass {
    fn color_attachments(&self) -> &[AttachmentDesc] {
        &self.attachments
    }
}

// ============================================================================
// Mock Buffer / Shader / Pipeline
// ============================================================================

pub struct MockBuffer {
    data: Mutex<Vec<u8>>,
}

impl MockBuffer {
    pub fn new(size: u64) -> Self {
        Self { data: Mutex::new(vec![0u8; size as usize]) }
    }

    fn bytes(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap();
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            engine_bail!("mirage3d::mock", "Buffer update out of range: {}..{} > {}", start, end, bytes.len());
        }
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }
}

pub struct MockShader {
    pub stage: ShaderStage,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

pub struct MockPipeline {
    topology: PrimitiveTopology,
    push_constant_size: u32,
    vertex_layout: VertexLayout,
    binding_group_layouts: Vec<BindingGroupLayoutDesc>,
}

impl Pipeline for MockPipeline {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    fn binding_group_layout_count(&self) -> u32 {
        self.binding_group_layouts.len() as u32
    }
}

fn as_mock_pipeline(pipeline: &Arc<dyn Pipeline>) -> &MockPipeline {
    unsafe { &*(pipeline.as_ref() as *const dyn Pipeline as *const MockPipeline) }
}

// ============================================================================
// Mock BindingGroup
// ============================================================================

pub struct MockBindingGroup {
    set_index: u32,
    /// Sampled textures in binding order
    textures: Vec<(Arc<dyn Texture>, SamplerType)>,
}

impl BindingGroup for MockBindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }
}

fn as_mock_binding_group(binding_group: &Arc<dyn BindingGroup>) -> &MockBindingGroup {
    unsafe { &*(binding_group.as_ref() as *const dyn BindingGroup as *const MockBindingGroup) }
}

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Clone)]
enum MockCommand {
    BeginRenderPass {
        render_pass: Arc<dyn RenderPass>,
        target: Arc<dyn RenderTarget>,
        clear_values: Vec<ClearValue>,
    },
    EndRenderPass,
    SetViewport(Viewport),
    SetScissor(Rect2D),
    BindPipeline(Arc<dyn Pipeline>),
    BindBindingGroup { set_index: u32, binding_group: Arc<dyn BindingGroup> },
    PushConstants { offset: u32, data: Vec<u8> },
    BindVertexBuffer { buffer: Arc<dyn Buffer>, offset: u64 },
    Draw { vertex_count: u32, first_vertex: u32 },
    CopyToHost(Arc<dyn Texture>),
}

impl MockCommand {
    fn name(&self) -> &'static str {
        match self {
            MockCommand::BeginRenderPass { .. } => "begin_render_pass",
            MockCommand::EndRenderPass => "end_render_pass",
            MockCommand::SetViewport(_) => "set_viewport",
            MockCommand::SetScissor(_) => "set_scissor",
            MockCommand::BindPipeline(_) => "bind_pipeline",
            MockCommand::BindBindingGroup { .. } => "bind_binding_group",
            MockCommand::PushConstants { .. } => "push_constants",
            MockCommand::BindVertexBuffer { .. } => "bind_vertex_buffer",
            MockCommand::Draw { .. } => "draw",
            MockCommand::CopyToHost(_) => "copy_texture_to_host",
        }
    }
}

/// Command names whose next recording fails, shared by a device and its lists
type InjectedFailures = Arc<Mutex<Vec<&'static str>>>;

pub struct MockCommandList {
    commands: Vec<MockCommand>,
    recording: bool,
    in_render_pass: bool,
    injected_failures: InjectedFailures,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self::with_injected_failures(InjectedFailures::default())
    }

    fn with_injected_failures(injected_failures: InjectedFailures) -> Self {
        Self {
            commands: Vec::new(),
            recording: false,
            in_render_pass: false,
            injected_failures,
        }
    }

    /// Names of the recorded commands, in order
    pub fn command_names(&self) -> Vec<&'static str> {
        self.commands.iter().map(MockCommand::name).collect()
    }

    fn record(&mut self, command: MockCommand) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        {
            let mut failures = self.injected_failures.lock().unwrap();
            if let Some(position) = failures.iter().position(|name| *name == command.name()) {
                failures.remove(position);
                engine_bail!("mirage3d::mock", "Injected {} failure", command.name());
            }
        }
        self.commands.push(command);
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }
        self.commands.clear();
        self.recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended before ending command list".to_string()));
        }
        self.recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        render_target: &Arc<dyn RenderTarget>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }
        self.record(MockCommand::BeginRenderPass {
            render_pass: render_pass.clone(),
            target: render_target.clone(),
            clear_values: clear_values.to_vec(),
        })?;
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }
        self.record(MockCommand::EndRenderPass)?;
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(MockCommand::SetViewport(viewport))
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(MockCommand::SetScissor(scissor))
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.record(MockCommand::BindPipeline(pipeline.clone()))
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        binding_group: &Arc<dyn BindingGroup>,
    ) -> Result<()> {
        if set_index >= pipeline.binding_group_layout_count() || binding_group.set_index() != set_index {
            return Err(Error::InvalidResource(format!(
                "binding group for set {} cannot be bound at set {} of a pipeline with {} set(s)",
                binding_group.set_index(), set_index, pipeline.binding_group_layout_count()
            )));
        }
        self.record(MockCommand::BindBindingGroup { set_index, binding_group: binding_group.clone() })
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.record(MockCommand::PushConstants { offset, data: data.to_vec() })
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.record(MockCommand::BindVertexBuffer { buffer: buffer.clone(), offset })
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::BackendError("draw outside of a render pass".to_string()));
        }
        self.record(MockCommand::Draw { vertex_count, first_vertex })
    }

    fn copy_texture_to_host(&mut self, texture: &Arc<dyn Texture>) -> Result<()> {
        if self.in_render_pass {
            return Err(Error::BackendError("copy_texture_to_host inside a render pass".to_string()));
        }
        if !texture.info().usage.contains(TextureUsage::HOST_READBACK) {
            return Err(Error::InvalidResource("texture has no HOST_READBACK usage".to_string()));
        }
        self.record(MockCommand::CopyToHost(texture.clone()))
    }
}

// ============================================================================
// Mock queue and fences
// ============================================================================

struct FenceState {
    signaled: AtomicBool,
}

struct Submission {
    id: u64,
    commands: Vec<MockCommand>,
    fence: Arc<FenceState>,
}

#[derive(Default)]
struct MockQueue {
    pending: VecDeque<Submission>,
}

impl MockQueue {
    /// Execute queued submissions in order, up to and including `until`
    fn drain(&mut self, until: Option<u64>) {
        while let Some(front) = self.pending.front() {
            if let Some(limit) = until {
                if front.id > limit {
                    break;
                }
            }
            if let Some(submission) = self.pending.pop_front() {
                Executor::default().run(&submission.commands);
                submission.fence.signaled.store(true, Ordering::SeqCst);
            }
        }
    }
}

pub struct MockFence {
    id: u64,
    state: Arc<FenceState>,
    queue: Arc<Mutex<MockQueue>>,
}

impl Fence for MockFence {
    fn is_signaled(&self) -> Result<bool> {
        Ok(self.state.signaled.load(Ordering::SeqCst))
    }

    fn wait(&self, _timeout: Duration) -> Result<bool> {
        if !self.state.signaled.load(Ordering::SeqCst) {
            self.queue.lock().unwrap().drain(Some(self.id));
        }
        Ok(self.state.signaled.load(Ordering::SeqCst))
    }
}

// ============================================================================
// CPU executor
// ============================================================================

#[derive(Default)]
struct Executor {
    target: Option<Arc<dyn RenderTarget>>,
    viewport: Option<Viewport>,
    scissor: Option<Rect2D>,
    pipeline: Option<Arc<dyn Pipeline>>,
    /// Texture bound at set 0, binding 0
    sampled: Option<(Arc<dyn Texture>, SamplerType)>,
    push_constants: Vec<u8>,
    vertex_buffer: Option<(Arc<dyn Buffer>, u64)>,
}

#[derive(Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    color: [f32; 4],
    uv: [f32; 2],
}

/// Copy of a texture's device memory taken when a draw starts
struct TexelSource {
    width: u32,
    height: u32,
    format: TextureFormat,
    bytes: Vec<u8>,
    sampler: SamplerType,
}

impl TexelSource {
    fn new(texture: &Arc<dyn Texture>, sampler: SamplerType) -> Self {
        let mock = as_mock_texture(texture);
        Self {
            width: mock.info.width,
            height: mock.info.height,
            format: mock.info.format,
            bytes: mock.device_bytes(),
            sampler,
        }
    }

    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let bpp = self.format.bytes_per_pixel() as usize;
        let offset = (y * self.width as usize + x) * bpp;
        self.format.decode_color(&self.bytes[offset..offset + bpp])
    }

    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let x = uv[0] * self.width as f32;
        let y = uv[1] * self.height as f32;
        match self.sampler {
            SamplerType::NearestClamp => self.texel(x.floor() as i64, y.floor() as i64),
            SamplerType::LinearClamp => {
                let (fx, fy) = (x - 0.5, y - 0.5);
                let (x0, y0) = (fx.floor() as i64, fy.floor() as i64);
                let (tx, ty) = (fx - fx.floor(), fy - fy.floor());
                let mut out = [0.0f32; 4];
                for (dx, dy, weight) in [
                    (0, 0, (1.0 - tx) * (1.0 - ty)),
                    (1, 0, tx * (1.0 - ty)),
                    (0, 1, (1.0 - tx) * ty),
                    (1, 1, tx * ty),
                ] {
                    let texel = self.texel(x0 + dx, y0 + dy);
                    for (channel, value) in out.iter_mut().enumerate() {
                        *value += weight * texel[channel];
                    }
                }
                out
            }
        }
    }
}

impl Executor {
    fn run(&mut self, commands: &[MockCommand]) {
        for command in commands {
            match command {
                MockCommand::BeginRenderPass { render_pass, target, clear_values } => {
                    let attachment = render_pass.color_attachments().first().copied();
                    if let (Some(attachment), Some(ClearValue::Color(rgba))) = (attachment, clear_values.first()) {
                        if attachment.load_op == LoadOp::Clear {
                            Self::clear(target, *rgba);
                        }
                    }
                    self.target = Some(target.clone());
                }
                MockCommand::EndRenderPass => self.target = None,
                MockCommand::SetViewport(viewport) => self.viewport = Some(*viewport),
                MockCommand::SetScissor(scissor) => self.scissor = Some(*scissor),
                MockCommand::BindPipeline(pipeline) => self.pipeline = Some(pipeline.clone()),
                MockCommand::BindBindingGroup { set_index, binding_group } => {
                    if *set_index == 0 {
                        self.sampled = as_mock_binding_group(binding_group).textures.first().cloned();
                    }
                }
                MockCommand::PushConstants { offset, data } => {
                    let end = *offset as usize + data.len();
                    if self.push_constants.len() < end {
                        self.push_constants.resize(end, 0);
                    }
                    self.push_constants[*offset as usize..end].copy_from_slice(data);
                }
                MockCommand::BindVertexBuffer { buffer, offset } => {
                    self.vertex_buffer = Some((buffer.clone(), *offset));
                }
                MockCommand::Draw { vertex_count, first_vertex } => {
                    self.draw(*vertex_count, *first_vertex);
                }
                MockCommand::CopyToHost(texture) => as_mock_texture(texture).copy_to_host(),
            }
        }
    }

    fn clear(target: &Arc<dyn RenderTarget>, rgba: [f32; 4]) {
        let texture = as_mock_texture(target.texture());
        let bpp = texture.info.format.bytes_per_pixel() as usize;
        let mut pixel = vec![0u8; bpp];
        texture.info.format.encode_color(rgba, &mut pixel);
        let mut pixels = texture.pixels.lock().unwrap();
        for chunk in pixels.chunks_exact_mut(bpp) {
            chunk.copy_from_slice(&pixel);
        }
    }

    fn mvp(&self) -> glam::Mat4 {
        if self.push_constants.len() < 64 {
            return glam::Mat4::IDENTITY;
        }
        let floats: Vec<f32> = self.push_constants[..64]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        glam::Mat4::from_cols_slice(&floats)
    }

    fn draw(&self, vertex_count: u32, first_vertex: u32) {
        let (Some(target), Some(pipeline_arc), Some((buffer, offset))) =
            (&self.target, &self.pipeline, &self.vertex_buffer)
        else {
            return;
        };
        let pipeline = as_mock_pipeline(pipeline_arc);
        let buffer = unsafe { &*(buffer.as_ref() as *const dyn Buffer as *const MockBuffer) };
        let bytes = buffer.bytes();
        let layout = &pipeline.vertex_layout;
        let viewport = self.viewport.unwrap_or_else(|| Viewport::full(target.width(), target.height()));
        let mvp = self.mvp();

        let mut screen = Vec::with_capacity(vertex_count as usize);
        for index in first_vertex..first_vertex + vertex_count {
            let base = *offset as usize + index as usize * layout.stride as usize;
            let position = read_attribute(&bytes, base, layout, 0).unwrap_or([0.0, 0.0, 0.0, 1.0]);
            let color = read_attribute(&bytes, base, layout, 1).unwrap_or([1.0, 1.0, 1.0, 1.0]);
            let uv = read_attribute(&bytes, base, layout, 2).unwrap_or([0.0, 0.0, 0.0, 1.0]);
            let clip = mvp * glam::Vec4::new(position[0], position[1], position[2], 1.0);
            if clip.w <= 0.0 {
                screen.push(None);
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            screen.push(Some(ScreenVertex {
                x: viewport.x + (ndc.x + 1.0) * 0.5 * viewport.width,
                y: viewport.y + (ndc.y + 1.0) * 0.5 * viewport.height,
                color,
                uv: [uv[0], uv[1]],
            }));
        }

        let triangles: Vec<[usize; 3]> = match pipeline.topology {
            PrimitiveTopology::TriangleList => (0..screen.len() / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
            PrimitiveTopology::TriangleStrip => (2..screen.len()).map(|i| [i - 2, i - 1, i]).collect(),
        };

        let source = match &self.sampled {
            Some((texture, sampler)) if !pipeline.binding_group_layouts.is_empty() => {
                Some(TexelSource::new(texture, *sampler))
            }
            _ => None,
        };
        let texture = as_mock_texture(target.texture());
        let scissor = self.scissor.unwrap_or(Rect2D::full(target.width(), target.height()));
        for [a, b, c] in triangles {
            if let (Some(a), Some(b), Some(c)) = (screen[a], screen[b], screen[c]) {
                rasterize(texture, scissor, [a, b, c], source.as_ref());
            }
        }
    }
}

fn read_attribute(bytes: &[u8], base: usize, layout: &VertexLayout, location: u32) -> Option<[f32; 4]> {
    let attribute = layout.attributes.iter().find(|a| a.location == location)?;
    let count = match attribute.format {
        BufferFormat::R32G32_SFLOAT => 2,
        BufferFormat::R32G32B32_SFLOAT => 3,
        BufferFormat::R32G32B32A32_SFLOAT => 4,
    };
    let mut out = [0.0, 0.0, 0.0, 1.0];
    for (i, value) in out.iter_mut().take(count).enumerate() {
        let start = base + attribute.offset as usize + i * 4;
        let raw = bytes.get(start..start + 4)?;
        *value = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    }
    Some(out)
}

fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

fn rasterize(texture: &MockTexture, scissor: Rect2D, v: [ScreenVertex; 3], source: Option<&TexelSource>) {
    let p = v.map(|s| (s.x, s.y));
    let area = edge(p[0], p[1], p[2]);
    if area.abs() < f32::EPSILON {
        return;
    }

    let width = texture.info.width as i64;
    let height = texture.info.height as i64;
    let min_x = (p.iter().map(|q| q.0).fold(f32::MAX, f32::min).floor() as i64)
        .max(scissor.x as i64)
        .max(0);
    let min_y = (p.iter().map(|q| q.1).fold(f32::MAX, f32::min).floor() as i64)
        .max(scissor.y as i64)
        .max(0);
    let max_x = (p.iter().map(|q| q.0).fold(f32::MIN, f32::max).ceil() as i64)
        .min(scissor.x as i64 + scissor.width as i64)
        .min(width);
    let max_y = (p.iter().map(|q| q.1).fold(f32::MIN, f32::max).ceil() as i64)
        .min(scissor.y as i64 + scissor.height as i64)
        .min(height);

    let format = texture.info.format;
    let bpp = format.bytes_per_pixel() as usize;
    let mut encoded = vec![0u8; bpp];
    let mut pixels = texture.pixels.lock().unwrap();

    for y in min_y..max_y {
        for x in min_x..max_x {
            let center = (x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(p[1], p[2], center) / area;
            let w1 = edge(p[2], p[0], center) / area;
            let w2 = edge(p[0], p[1], center) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let mut rgba = [0.0f32; 4];
            for (channel, value) in rgba.iter_mut().enumerate() {
                *value = w0 * v[0].color[channel] + w1 * v[1].color[channel] + w2 * v[2].color[channel];
            }
            if let Some(source) = source {
                let uv = [
                    w0 * v[0].uv[0] + w1 * v[1].uv[0] + w2 * v[2].uv[0],
                    w0 * v[0].uv[1] + w1 * v[1].uv[1] + w2 * v[2].uv[1],
                ];
                let texel = source.sample(uv);
                for (value, sampled) in rgba.iter_mut().zip(texel) {
                    *value *= sampled;
                }
            }
            format.encode_color(rgba, &mut encoded);
            let offset = (y as usize * width as usize + x as usize) * bpp;
            pixels[offset..offset + bpp].copy_from_slice(&encoded);
        }
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    queue: Arc<Mutex<MockQueue>>,
    injected_failures: InjectedFailures,
    next_submission: AtomicU64,
    textures_created: AtomicUsize,
    command_lists_created: AtomicUsize,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(MockQueue::default())),
            injected_failures: InjectedFailures::default(),
            next_submission: AtomicU64::new(0),
            textures_created: AtomicUsize::new(0),
            command_lists_created: AtomicUsize::new(0),
        }
    }

    /// Shared device handle, as components expect it
    pub fn shared() -> Arc<Mutex<dyn GraphicsDevice>> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Make the next recording of `command` fail once, on any command list of this device
    ///
    /// `command` is a `CommandList` method name such as `"begin_render_pass"`.
    pub fn fail_next(&self, command: &'static str) {
        self.injected_failures.lock().unwrap().push(command);
    }

    /// Let the "GPU" catch up with every queued submission
    pub fn poll(&self) {
        self.queue.lock().unwrap().drain(None);
    }

    /// Number of submitted but not yet executed command batches
    pub fn pending_submissions(&self) -> usize {
        self.queue.lock().unwrap().pending.len()
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created.load(Ordering::SeqCst)
    }

    pub fn command_lists_created(&self) -> usize {
        self.command_lists_created.load(Ordering::SeqCst)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn device_name(&self) -> &str {
        "Mock GPU"
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("mirage3d::mock", "Texture dimensions must be non-zero ({}x{})", desc.width, desc.height);
        }
        let texture = MockTexture::new(TextureInfo {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
        });
        if let Some(data) = &desc.data {
            if data.len() != desc.tight_size() {
                engine_bail!("mirage3d::mock", "Texture data size {} does not match {}", data.len(), desc.tight_size());
            }
            texture.write_all(data);
            texture.copy_to_host();
        }
        self.textures_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(texture))
    }

    fn create_render_target(&self, texture: &Arc<dyn Texture>) -> Result<Arc<dyn RenderTarget>> {
        if !texture.info().usage.contains(TextureUsage::RENDER_TARGET) {
            return Err(Error::InvalidResource(format!(
                "texture usage {:?} is not compatible with render target",
                texture.info().usage
            )));
        }
        Ok(Arc::new(MockRenderTarget { texture: texture.clone() }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        Ok(Arc::new(MockRenderPass { attachments: desc.color_attachments.clone() }))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(MockBuffer::new(desc.size)))
    }

    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        Ok(Arc::new(MockShader { stage: desc.stage }))
    }

    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(MockPipeline {
            topology: desc.topology,
            push_constant_size: desc.push_constant_size,
            vertex_layout: desc.vertex_layout,
            binding_group_layouts: desc.binding_group_layouts,
        }))
    }

    fn create_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource<'_>],
    ) -> Result<Arc<dyn BindingGroup>> {
        let mock_pipeline = as_mock_pipeline(pipeline);
        let Some(layout) = mock_pipeline.binding_group_layouts.get(set_index as usize) else {
            return Err(Error::InvalidResource(format!(
                "set index {} out of range (pipeline has {} layouts)",
                set_index, mock_pipeline.binding_group_layouts.len()
            )));
        };
        if resources.len() != layout.entries.len() {
            return Err(Error::InvalidResource(format!(
                "{} resource(s) for a layout of {} binding(s)",
                resources.len(), layout.entries.len()
            )));
        }
        let mut textures = Vec::with_capacity(resources.len());
        for resource in resources {
            match resource {
                BindingResource::SampledTexture(texture, sampler) => {
                    if !texture.info().usage.contains(TextureUsage::SAMPLED) {
                        return Err(Error::InvalidResource("texture has no SAMPLED usage".to_string()));
                    }
                    textures.push(((*texture).clone(), *sampler));
                }
            }
        }
        Ok(Arc::new(MockBindingGroup { set_index, textures }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        self.command_lists_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCommandList::with_injected_failures(self.injected_failures.clone())))
    }

    fn submit(&self, commands: &[&dyn CommandList]) -> Result<Arc<dyn Fence>> {
        let mut recorded = Vec::new();
        for command_list in commands {
            let mock = unsafe { &*(*command_list as *const dyn CommandList as *const MockCommandList) };
            if mock.recording {
                engine_bail!("mirage3d::mock", "submit: command list still recording");
            }
            recorded.extend(mock.commands.iter().cloned());
        }

        let id = self.next_submission.fetch_add(1, Ordering::SeqCst);
        let state = Arc::new(FenceState { signaled: AtomicBool::new(false) });
        self.queue.lock().unwrap().pending.push_back(Submission {
            id,
            commands: recorded,
            fence: state.clone(),
        });

        Ok(Arc::new(MockFence { id, state, queue: self.queue.clone() }))
    }

    fn wait_idle(&self) -> Result<()> {
        self.poll();
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
