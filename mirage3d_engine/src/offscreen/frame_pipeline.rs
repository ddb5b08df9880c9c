/// FramePipeline - per-frame entry point of the offscreen pipeline.
///
/// Owns the offscreen target, the renderer drawing into it and the bridge
/// reading it back. Every tracking-frame update calls `frame_updated` with
/// the current scene and viewpoint.

use std::sync::{Arc, Mutex};
use crate::config::{DeviceLossPolicy, OffscreenConfig};
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::scene::SceneSnapshot;
use crate::{engine_error, engine_info, engine_warn};
use super::{
    OffscreenRenderer, OffscreenTarget, PixelBuffer, PixelBufferBridge, RenderCompletion,
    SceneShaders, TextureProvisioner,
};

/// Result of one frame update
#[derive(Debug)]
pub struct FrameOutput {
    /// Completion of the frame's GPU work
    pub completion: RenderCompletion,
    /// Pixel buffer of the finished frame, when capture is enabled
    pub pixel_buffer: Option<PixelBuffer>,
}

struct ActivePipeline {
    renderer: OffscreenRenderer,
    target: OffscreenTarget,
    bridge: PixelBufferBridge,
}

pub struct FramePipeline {
    active: Option<ActivePipeline>,
    config: OffscreenConfig,
    warned_disabled: bool,
}

impl FramePipeline {
    /// Build the pipeline on the device the application created
    ///
    /// When device creation failed, `config.device_loss_policy` decides:
    /// `Fatal` returns the error, `DisableOffscreen` returns a pipeline whose
    /// frame updates do nothing.
    pub fn new(
        device_result: Result<Arc<Mutex<dyn GraphicsDevice>>>,
        config: OffscreenConfig,
    ) -> Result<Self> {
        let graphics_device = match device_result {
            Ok(graphics_device) => graphics_device,
            Err(e) => {
                return match config.device_loss_policy {
                    DeviceLossPolicy::Fatal => {
                        engine_error!("mirage3d::FramePipeline", "No usable GPU device: {}", e);
                        Err(e)
                    }
                    DeviceLossPolicy::DisableOffscreen => {
                        engine_warn!(
                            "mirage3d::FramePipeline",
                            "No usable GPU device ({}), offscreen rendering disabled",
                            e
                        );
                        Ok(Self { active: None, config, warned_disabled: false })
                    }
                };
            }
        };

        let target = TextureProvisioner::from_config(graphics_device.clone(), &config)
            .allocate(config.width, config.height, config.format)?;
        let renderer = OffscreenRenderer::new(graphics_device);
        let bridge = PixelBufferBridge::new(config.readback_timeout);

        engine_info!(
            "mirage3d::FramePipeline",
            "Offscreen pipeline ready: {}x{} {:?}",
            config.width, config.height, config.format
        );

        Ok(Self {
            active: Some(ActivePipeline { renderer, target, bridge }),
            config,
            warned_disabled: false,
        })
    }

    /// Draw scene geometry with the given shaders
    pub fn with_scene_shaders(mut self, shaders: SceneShaders) -> Result<Self> {
        if let Some(active) = self.active.take() {
            let renderer = active.renderer.with_scene_shaders(shaders)?;
            self.active = Some(ActivePipeline { renderer, ..active });
        }
        Ok(self)
    }

    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    pub fn config(&self) -> &OffscreenConfig {
        &self.config
    }

    /// Offscreen target, to bind as a material texture
    pub fn target(&self) -> Option<&OffscreenTarget> {
        self.active.as_ref().map(|active| &active.target)
    }

    /// Render the current scene into the offscreen target
    ///
    /// Returns `Ok(None)` when offscreen rendering is disabled.
    pub fn frame_updated(&mut self, scene: SceneSnapshot<'_>) -> Result<Option<FrameOutput>> {
        let Some(active) = self.active.as_mut() else {
            if !self.warned_disabled {
                engine_warn!("mirage3d::FramePipeline", "Offscreen rendering disabled, frame updates ignored");
                self.warned_disabled = true;
            }
            return Ok(None);
        };

        let completion = active.renderer.render(scene, &active.target, self.config.clear_color)?;
        let pixel_buffer = if self.config.capture_pixel_buffers {
            active.bridge.to_pixel_buffer(&active.target, &completion)
        } else {
            None
        };

        Ok(Some(FrameOutput { completion, pixel_buffer }))
    }

    /// Pixel buffer of the target as it is now (no wait)
    pub fn pixel_buffer_now(&self) -> Option<PixelBuffer> {
        let active = self.active.as_ref()?;
        active.bridge.to_pixel_buffer_now(&active.target)
    }

    /// Pixel buffer of a frame returned by `frame_updated`
    ///
    /// Waits for that frame to complete. Only the most recent frame can be
    /// read: once a later `frame_updated` has been submitted, an older
    /// completion yields `None`.
    pub fn pixel_buffer(&self, completion: &RenderCompletion) -> Option<PixelBuffer> {
        let active = self.active.as_ref()?;
        active.bridge.to_pixel_buffer(&active.target, completion)
    }
}

#[cfg(test)]
#[path = "frame_pipeline_tests.rs"]
mod tests;
