//! Offscreen rendering module
//!
//! Render-to-texture pipeline: a provisioned color target, a renderer that
//! draws a scene snapshot into it, and a bridge that turns the target's
//! memory into CPU pixel buffers.

mod canvas;
mod texture_provisioner;
mod render_pass_descriptor;
mod render_completion;
mod offscreen_renderer;
mod pixel_buffer;
mod pixel_buffer_bridge;
mod frame_pipeline;

pub use canvas::Canvas;
pub use texture_provisioner::{OffscreenTarget, TextureProvisioner};
pub use render_pass_descriptor::{LoadAction, RenderPassDescriptor, StoreAction};
pub use render_completion::RenderCompletion;
pub use offscreen_renderer::{OffscreenRenderer, SceneShaders};
pub use pixel_buffer::{PixelBuffer, PixelFormat};
pub use pixel_buffer_bridge::PixelBufferBridge;
pub use frame_pipeline::{FrameOutput, FramePipeline};
