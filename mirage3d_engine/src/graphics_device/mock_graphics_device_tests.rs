/// Unit tests for MockGraphicsDevice and associated mock types.
///
/// The mock is the execution model every offscreen test relies on, so its
/// deferred execution and CPU rasterization are checked here directly.

use crate::graphics_device::mock_graphics_device::*;
use crate::error::Error;
use crate::graphics_device::{
    lock_device, AttachmentDesc, BindingGroupLayoutDesc, BindingResource, Buffer, BufferDesc,
    BufferFormat, BufferUsage, ClearColor, ClearValue, CommandList, GraphicsDevice, ImageLayout,
    LoadOp, Pipeline, PipelineDesc, PrimitiveTopology, Rect2D, RenderPass, RenderPassDesc,
    SamplerType, ShaderDesc, ShaderStage, StoreOp, Texture, TextureDesc, TextureFormat,
    TextureUsage, VertexAttribute, VertexLayout, Viewport,
};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helper Functions
// ============================================================================

fn target_desc(width: u32, height: u32, data: Option<Vec<u8>>) -> TextureDesc {
    TextureDesc {
        width,
        height,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED | TextureUsage::HOST_READBACK,
        data,
    }
}

fn clear_pass(device: &MockGraphicsDevice, load_op: LoadOp) -> Arc<dyn crate::graphics_device::RenderPass> {
    device
        .create_render_pass(&RenderPassDesc {
            color_attachments: vec![AttachmentDesc {
                format: TextureFormat::R8G8B8A8_UNORM,
                load_op,
                store_op: StoreOp::Store,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::ShaderReadOnly,
            }],
        })
        .unwrap()
}

fn color_layout() -> VertexLayout {
    VertexLayout {
        stride: 28,
        attributes: vec![
            VertexAttribute { location: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 0 },
            VertexAttribute { location: 1, format: BufferFormat::R32G32B32A32_SFLOAT, offset: 12 },
        ],
    }
}

fn textured_layout() -> VertexLayout {
    VertexLayout {
        stride: 36,
        attributes: vec![
            VertexAttribute { location: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 0 },
            VertexAttribute { location: 1, format: BufferFormat::R32G32B32A32_SFLOAT, offset: 12 },
            VertexAttribute { location: 2, format: BufferFormat::R32G32_SFLOAT, offset: 28 },
        ],
    }
}

fn pipeline(
    device: &mut MockGraphicsDevice,
    pass: &Arc<dyn RenderPass>,
    vertex_layout: VertexLayout,
    binding_group_layouts: Vec<BindingGroupLayoutDesc>,
) -> Arc<dyn Pipeline> {
    let vertex_shader = device
        .create_shader(ShaderDesc { code: vec![], stage: ShaderStage::Vertex, entry_point: "main".to_string() })
        .unwrap();
    let fragment_shader = device
        .create_shader(ShaderDesc { code: vec![], stage: ShaderStage::Fragment, entry_point: "main".to_string() })
        .unwrap();
    device
        .create_pipeline(PipelineDesc {
            vertex_shader,
            fragment_shader,
            vertex_layout,
            topology: PrimitiveTopology::TriangleList,
            push_constant_size: 64,
            render_pass: pass.clone(),
            binding_group_layouts,
        })
        .unwrap()
}

fn vertex_bytes(vertices: &[([f32; 3], [f32; 4])]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (position, color) in vertices {
        for v in position.iter().chain(color.iter()) {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
    }
    bytes
}

// ============================================================================
// MockTexture Tests
// ============================================================================

#[test]
fn test_mock_texture_upload_is_immediate() {
    let mut device = MockGraphicsDevice::new();
    let data = vec![7u8; 4 * 4 * 4];
    let texture = device.create_texture(target_desc(4, 4, Some(data.clone()))).unwrap();

    assert_eq!(as_mock_texture(&texture).device_bytes(), data);
    let host = texture.host_memory().unwrap();
    assert_eq!(host.bytes, data);
    assert_eq!(host.bytes_per_row, 16);
}

#[test]
fn test_mock_texture_without_readback_has_no_host_memory() {
    let mut device = MockGraphicsDevice::new();
    let texture = device
        .create_texture(TextureDesc {
            width: 2,
            height: 2,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
            data: None,
        })
        .unwrap();

    assert!(texture.host_memory().is_none());
}

#[test]
fn test_mock_texture_rejects_wrong_data_size() {
    let mut device = MockGraphicsDevice::new();
    let result = device.create_texture(target_desc(4, 4, Some(vec![0u8; 3])));
    assert!(result.is_err());
}

#[test]
fn test_mock_texture_rejects_zero_size() {
    let mut device = MockGraphicsDevice::new();
    assert!(device.create_texture(target_desc(0, 4, None)).is_err());
}

// ============================================================================
// MockRenderTarget Tests
// ============================================================================

#[test]
fn test_mock_render_target_requires_render_target_usage() {
    let mut device = MockGraphicsDevice::new();
    let sampled_only = device
        .create_texture(TextureDesc {
            width: 2,
            height: 2,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::SAMPLED,
            data: None,
        })
        .unwrap();

    let result = device.create_render_target(&sampled_only);
    assert!(matches!(result, Err(crate::error::Error::InvalidResource(_))));
}

#[test]
fn test_mock_render_target_reports_texture_properties() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(8, 3, None)).unwrap();
    let target = device.create_render_target(&texture).unwrap();

    assert_eq!(target.width(), 8);
    assert_eq!(target.height(), 3);
    assert_eq!(target.format(), TextureFormat::R8G8B8A8_UNORM);
    assert!(Arc::ptr_eq(target.texture(), &texture));
}

// ============================================================================
// MockBuffer Tests
// ============================================================================

#[test]
fn test_mock_buffer_update_in_range() {
    let buffer = MockBuffer::new(16);
    assert!(buffer.update(8, &[1, 2, 3, 4]).is_ok());
    assert_eq!(buffer.size(), 16);
}

#[test]
fn test_mock_buffer_update_out_of_range() {
    let buffer = MockBuffer::new(4);
    assert!(buffer.update(2, &[1, 2, 3, 4]).is_err());
}

// ============================================================================
// MockCommandList Tests
// ============================================================================

#[test]
fn test_mock_command_list_records_in_order() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(2, 2, None)).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);

    let mut list = MockCommandList::new();
    list.begin().unwrap();
    list.begin_render_pass(&pass, &target, &[ClearColor::WHITE.into()]).unwrap();
    list.set_viewport(Viewport::full(2, 2)).unwrap();
    list.set_scissor(Rect2D::full(2, 2)).unwrap();
    list.end_render_pass().unwrap();
    list.copy_texture_to_host(&texture).unwrap();
    list.end().unwrap();

    assert_eq!(
        list.command_names(),
        vec!["begin_render_pass", "set_viewport", "set_scissor", "end_render_pass", "copy_texture_to_host"]
    );
}

#[test]
fn test_mock_command_list_requires_begin() {
    let mut list = MockCommandList::new();
    assert!(list.set_viewport(Viewport::full(1, 1)).is_err());
    assert!(list.end().is_err());
}

#[test]
fn test_mock_command_list_rejects_copy_inside_render_pass() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(2, 2, None)).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);

    let mut list = MockCommandList::new();
    list.begin().unwrap();
    list.begin_render_pass(&pass, &target, &[]).unwrap();
    assert!(list.copy_texture_to_host(&texture).is_err());
    assert!(list.end().is_err());
}

// ============================================================================
// Submission / Fence Tests
// ============================================================================

#[test]
fn test_submit_is_deferred_until_fence_wait() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(2, 2, Some(vec![0u8; 16]))).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);

    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    list.begin_render_pass(&pass, &target, &[ClearColor::WHITE.into()]).unwrap();
    list.end_render_pass().unwrap();
    list.copy_texture_to_host(&texture).unwrap();
    list.end().unwrap();

    let fence = device.submit(&[list.as_ref()]).unwrap();
    assert_eq!(device.pending_submissions(), 1);
    assert!(!fence.is_signaled().unwrap());
    assert_eq!(texture.host_memory().unwrap().bytes, vec![0u8; 16]);

    assert!(fence.wait(Duration::from_secs(1)).unwrap());
    assert!(fence.is_signaled().unwrap());
    assert_eq!(device.pending_submissions(), 0);
    assert_eq!(texture.host_memory().unwrap().bytes, vec![255u8; 16]);
}

#[test]
fn test_load_pass_keeps_previous_content() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(1, 1, Some(vec![1, 2, 3, 4]))).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Load);

    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    list.begin_render_pass(&pass, &target, &[ClearColor::WHITE.into()]).unwrap();
    list.end_render_pass().unwrap();
    list.end().unwrap();

    device.submit(&[list.as_ref()]).unwrap();
    device.wait_idle().unwrap();
    assert_eq!(as_mock_texture(&texture).device_bytes(), vec![1, 2, 3, 4]);
}

#[test]
fn test_submit_rejects_list_still_recording() {
    let device = MockGraphicsDevice::new();
    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    assert!(device.submit(&[list.as_ref()]).is_err());
}

#[test]
fn test_submission_snapshot_survives_rerecording() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(1, 1, Some(vec![0u8; 4]))).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);

    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    list.begin_render_pass(&pass, &target, &[ClearValue::Color([1.0, 0.0, 0.0, 1.0])]).unwrap();
    list.end_render_pass().unwrap();
    list.end().unwrap();
    let fence = device.submit(&[list.as_ref()]).unwrap();

    // Re-record before the first submission executed
    list.begin().unwrap();
    list.end().unwrap();

    fence.wait(Duration::from_secs(1)).unwrap();
    assert_eq!(as_mock_texture(&texture).device_bytes(), vec![255, 0, 0, 255]);
}

// ============================================================================
// Rasterization Tests
// ============================================================================

#[test]
fn test_draw_fills_covered_pixels_only() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(4, 4, None)).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);

    let pipeline = pipeline(&mut device, &pass, color_layout(), Vec::new());

    // Quad covering the left half of NDC space, pure red
    let red = [1.0, 0.0, 0.0, 1.0];
    let bytes = vertex_bytes(&[
        ([-1.0, -1.0, 0.0], red),
        ([0.0, -1.0, 0.0], red),
        ([0.0, 1.0, 0.0], red),
        ([-1.0, -1.0, 0.0], red),
        ([0.0, 1.0, 0.0], red),
        ([-1.0, 1.0, 0.0], red),
    ]);
    let buffer = device
        .create_buffer(BufferDesc { size: bytes.len() as u64, usage: BufferUsage::Vertex })
        .unwrap();
    buffer.update(0, &bytes).unwrap();

    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    list.begin_render_pass(&pass, &target, &[ClearColor::WHITE.into()]).unwrap();
    list.set_viewport(Viewport::full(4, 4)).unwrap();
    list.set_scissor(Rect2D::full(4, 4)).unwrap();
    list.bind_pipeline(&pipeline).unwrap();
    list.push_constants(0, bytemuck::cast_slice(&glam::Mat4::IDENTITY.to_cols_array()[..])).unwrap();
    list.bind_vertex_buffer(&buffer, 0).unwrap();
    list.draw(6, 0).unwrap();
    list.end_render_pass().unwrap();
    list.end().unwrap();

    let fence = device.submit(&[list.as_ref()]).unwrap();
    fence.wait(Duration::from_secs(1)).unwrap();

    let mock = as_mock_texture(&texture);
    for y in 0..4 {
        assert_eq!(mock.device_pixel(0, y), red);
        assert_eq!(mock.device_pixel(1, y), red);
        assert_eq!(mock.device_pixel(2, y), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(mock.device_pixel(3, y), [1.0, 1.0, 1.0, 1.0]);
    }
}

#[test]
fn test_draw_samples_bound_texture() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(4, 4, None)).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);
    let pipeline = pipeline(&mut device, &pass, textured_layout(), vec![BindingGroupLayoutDesc::sampled_texture()]);

    // 2x2 source: red left column, blue right column
    let (red, blue) = ([255u8, 0, 0, 255], [0u8, 0, 255, 255]);
    let source = device
        .create_texture(TextureDesc {
            width: 2,
            height: 2,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::SAMPLED,
            data: Some([red, blue, red, blue].concat()),
        })
        .unwrap();
    let binding_group = device
        .create_binding_group(&pipeline, 0, &[BindingResource::SampledTexture(&source, SamplerType::NearestClamp)])
        .unwrap();

    // Full-screen quad, white vertices, uv (0, 0) at NDC (-1, -1)
    let mut bytes = Vec::new();
    for (x, y) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        let uv = [(x + 1.0) * 0.5, (y + 1.0) * 0.5];
        for v in [x, y, 0.0, 1.0, 1.0, 1.0, 1.0, uv[0], uv[1]] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
    }
    let buffer = device
        .create_buffer(BufferDesc { size: bytes.len() as u64, usage: BufferUsage::Vertex })
        .unwrap();
    buffer.update(0, &bytes).unwrap();

    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    list.begin_render_pass(&pass, &target, &[ClearColor::BLACK.into()]).unwrap();
    list.bind_pipeline(&pipeline).unwrap();
    list.bind_binding_group(&pipeline, 0, &binding_group).unwrap();
    list.push_constants(0, bytemuck::cast_slice(&glam::Mat4::IDENTITY.to_cols_array()[..])).unwrap();
    list.bind_vertex_buffer(&buffer, 0).unwrap();
    list.draw(6, 0).unwrap();
    list.end_render_pass().unwrap();
    list.end().unwrap();
    device.submit(&[list.as_ref()]).unwrap().wait(Duration::from_secs(1)).unwrap();

    let mock = as_mock_texture(&texture);
    for y in 0..4 {
        assert_eq!(mock.device_pixel(0, y), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mock.device_pixel(1, y), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mock.device_pixel(2, y), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(mock.device_pixel(3, y), [0.0, 0.0, 1.0, 1.0]);
    }
}

#[test]
fn test_binding_group_must_match_pipeline_layout() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(2, 2, None)).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);
    let textured = pipeline(&mut device, &pass, textured_layout(), vec![BindingGroupLayoutDesc::sampled_texture()]);
    let untextured = pipeline(&mut device, &pass, color_layout(), Vec::new());
    let resource = [BindingResource::SampledTexture(&texture, SamplerType::LinearClamp)];

    assert!(matches!(
        device.create_binding_group(&textured, 1, &resource),
        Err(Error::InvalidResource(_))
    ));
    assert!(matches!(
        device.create_binding_group(&textured, 0, &[]),
        Err(Error::InvalidResource(_))
    ));

    let binding_group = device.create_binding_group(&textured, 0, &resource).unwrap();
    assert_eq!(binding_group.set_index(), 0);

    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    assert!(list.bind_binding_group(&untextured, 0, &binding_group).is_err());
    list.bind_binding_group(&textured, 0, &binding_group).unwrap();
}

// ============================================================================
// Device Tests
// ============================================================================

#[test]
fn test_lock_device_reaches_shared_device() {
    let device = MockGraphicsDevice::shared();
    let mut graphics_device = lock_device(&device).unwrap();

    assert_eq!(graphics_device.device_name(), "Mock GPU");
    let texture = graphics_device.create_texture(target_desc(1, 1, None)).unwrap();
    assert_eq!(texture.info().width, 1);
}

#[test]
fn test_injected_failure_fires_once() {
    let mut device = MockGraphicsDevice::new();
    let texture = device.create_texture(target_desc(2, 2, None)).unwrap();
    let target = device.create_render_target(&texture).unwrap();
    let pass = clear_pass(&device, LoadOp::Clear);
    device.fail_next("begin_render_pass");

    let mut first = device.create_command_list().unwrap();
    first.begin().unwrap();
    assert!(matches!(first.begin_render_pass(&pass, &target, &[]), Err(Error::BackendError(_))));

    let mut second = device.create_command_list().unwrap();
    second.begin().unwrap();
    second.begin_render_pass(&pass, &target, &[]).unwrap();
    // The failed list is still recording
    assert!(first.begin().is_err());
}

#[test]
fn test_device_counters() {
    let mut device = MockGraphicsDevice::new();
    device.create_texture(target_desc(1, 1, None)).unwrap();
    device.create_command_list().unwrap();
    device.create_command_list().unwrap();

    assert_eq!(device.textures_created(), 1);
    assert_eq!(device.command_lists_created(), 2);
    assert_eq!(device.device_name(), "Mock GPU");
}
