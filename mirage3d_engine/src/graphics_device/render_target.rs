/// RenderTarget trait - a drawable view over an offscreen texture

use std::sync::Arc;
use crate::graphics_device::{Texture, TextureFormat};

/// Render target trait
///
/// A color surface a render pass can draw into. Always backed by a texture
/// created with `TextureUsage::RENDER_TARGET`.
pub trait RenderTarget: Send + Sync {
    /// Get the width of the render target in pixels
    fn width(&self) -> u32;

    /// Get the height of the render target in pixels
    fn height(&self) -> u32;

    /// Get the pixel format of the render target
    fn format(&self) -> TextureFormat;

    /// Texture this target draws into
    fn texture(&self) -> &Arc<dyn Texture>;
}
