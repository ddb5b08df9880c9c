/// TextureProvisioner - allocates the offscreen color target.
///
/// The target is created once at setup, pre-filled with a solid color drawn
/// through a `Canvas`, and stays alive for the whole session. It is both a
/// render destination and a shader-readable texture.

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};
use crate::config::OffscreenConfig;
use crate::error::{Error, Result};
use crate::engine_info;
use crate::graphics_device::{
    lock_device, ClearColor, GraphicsDevice, RenderTarget, Texture, TextureDesc, TextureFormat,
    TextureUsage,
};
use crate::scene::Material;
use super::render_completion::SubmissionTicket;
use super::Canvas;

/// GPU-resident 2D color target, drawable and sampleable
///
/// Cloning shares the same GPU texture and the same submission order.
#[derive(Clone)]
pub struct OffscreenTarget {
    texture: Arc<dyn Texture>,
    render_target: Arc<dyn RenderTarget>,
    /// Number of renders submitted into this target
    submissions: Arc<AtomicU64>,
}

impl OffscreenTarget {
    fn new(texture: Arc<dyn Texture>, render_target: Arc<dyn RenderTarget>) -> Self {
        Self { texture, render_target, submissions: Arc::new(AtomicU64::new(0)) }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(texture: Arc<dyn Texture>, render_target: Arc<dyn RenderTarget>) -> Self {
        Self::new(texture, render_target)
    }

    pub fn width(&self) -> u32 {
        self.texture.info().width
    }

    pub fn height(&self) -> u32 {
        self.texture.info().height
    }

    pub fn format(&self) -> TextureFormat {
        self.texture.info().format
    }

    pub fn usage(&self) -> TextureUsage {
        self.texture.info().usage
    }

    /// Texture to bind as a material input
    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    /// Drawable view used by render passes
    pub fn render_target(&self) -> &Arc<dyn RenderTarget> {
        &self.render_target
    }

    /// Material showing this target's content on another scene's mesh
    pub fn material(&self) -> Result<Material> {
        Material::textured(self.texture.clone())
    }

    /// Reserve the next place in this target's submission order
    pub(crate) fn issue_submission(&self) -> SubmissionTicket {
        SubmissionTicket::issue(&self.submissions)
    }

    pub(crate) fn submissions(&self) -> &Arc<AtomicU64> {
        &self.submissions
    }
}

/// Allocator for one (width, height, format) offscreen target
pub struct TextureProvisioner {
    graphics_device: Arc<Mutex<dyn GraphicsDevice>>,
    width: u32,
    height: u32,
    format: TextureFormat,
    fill_color: ClearColor,
    host_readback: bool,
}

impl TextureProvisioner {
    /// Provisioner for targets of `width` x `height` in `format`
    ///
    /// Defaults: opaque green fill, host readback enabled.
    pub fn new(
        graphics_device: Arc<Mutex<dyn GraphicsDevice>>,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        let defaults = OffscreenConfig::default();
        Self {
            graphics_device,
            width,
            height,
            format,
            fill_color: defaults.fill_color,
            host_readback: defaults.host_readback,
        }
    }

    /// Provisioner configured from an `OffscreenConfig`
    pub fn from_config(graphics_device: Arc<Mutex<dyn GraphicsDevice>>, config: &OffscreenConfig) -> Self {
        Self::new(graphics_device, config.width, config.height, config.format)
            .with_fill_color(config.fill_color)
            .with_host_readback(config.host_readback)
    }

    pub fn with_fill_color(mut self, fill_color: ClearColor) -> Self {
        self.fill_color = fill_color;
        self
    }

    /// Keep a host-visible mirror of the target (required by the pixel buffer bridge)
    pub fn with_host_readback(mut self, host_readback: bool) -> Self {
        self.host_readback = host_readback;
        self
    }

    /// Allocate a new target pre-filled with the fill color
    ///
    /// # Errors
    ///
    /// * `Error::InvalidResource` for a zero dimension, a format that is not
    ///   4 bytes per pixel, or a triple this provisioner was not created for
    /// * backend errors from texture creation
    pub fn allocate(&self, width: u32, height: u32, format: TextureFormat) -> Result<OffscreenTarget> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!(
                "offscreen target dimensions must be non-zero ({}x{})",
                width, height
            )));
        }
        if format.bytes_per_pixel() != 4 {
            return Err(Error::InvalidResource(format!(
                "offscreen target format {:?} is not a 4-byte color format",
                format
            )));
        }
        if (width, height, format) != (self.width, self.height, self.format) {
            return Err(Error::InvalidResource(format!(
                "provisioner is configured for {}x{} {:?}, got {}x{} {:?}",
                self.width, self.height, self.format, width, height, format
            )));
        }

        let mut canvas = Canvas::new(width, height)?;
        canvas.fill(self.fill_color);
        let data = convert_canvas(canvas, format);

        let mut usage = TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED;
        if self.host_readback {
            usage |= TextureUsage::HOST_READBACK;
        }

        let mut graphics_device = lock_device(&self.graphics_device)?;
        let texture = graphics_device.create_texture(TextureDesc {
            width,
            height,
            format,
            usage,
            data: Some(data),
        })?;
        let render_target = graphics_device.create_render_target(&texture)?;

        engine_info!(
            "mirage3d::TextureProvisioner",
            "Allocated offscreen target {}x{} {:?} on {}",
            width, height, format, graphics_device.device_name()
        );

        Ok(OffscreenTarget::new(texture, render_target))
    }
}

/// Re-encode canvas bytes (RGBA8 unorm) into `format`
fn convert_canvas(canvas: Canvas, format: TextureFormat) -> Vec<u8> {
    if format == TextureFormat::R8G8B8A8_UNORM {
        return canvas.into_bytes();
    }
    let mut data = canvas.into_bytes();
    for pixel in data.chunks_exact_mut(4) {
        let rgba = TextureFormat::R8G8B8A8_UNORM.decode_color(pixel);
        format.encode_color(rgba, pixel);
    }
    data
}

#[cfg(test)]
#[path = "texture_provisioner_tests.rs"]
mod tests;
