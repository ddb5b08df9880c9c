/// Texture trait, texture descriptor, and texture info

use bitflags::bitflags;
use half::f16;

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
}

impl TextureFormat {
    /// Size of one pixel in bytes
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB => 4,
            TextureFormat::R16G16B16A16_SFLOAT => 8,
        }
    }

    /// True for formats whose stored values are sRGB-encoded
    pub fn is_srgb(&self) -> bool {
        matches!(self, TextureFormat::R8G8B8A8_SRGB | TextureFormat::B8G8R8A8_SRGB)
    }

    /// True when red and blue are swapped in memory
    pub fn is_bgra(&self) -> bool {
        matches!(self, TextureFormat::B8G8R8A8_UNORM | TextureFormat::B8G8R8A8_SRGB)
    }

    /// Encode a linear RGBA color into `out` (`bytes_per_pixel()` bytes)
    pub fn encode_color(&self, rgba: [f32; 4], out: &mut [u8]) {
        match self {
            TextureFormat::R16G16B16A16_SFLOAT => {
                for (channel, value) in rgba.iter().enumerate() {
                    let bits = f16::from_f32(*value).to_bits().to_le_bytes();
                    out[channel * 2..channel * 2 + 2].copy_from_slice(&bits);
                }
            }
            _ => {
                let mut rgb = [rgba[0], rgba[1], rgba[2]];
                if self.is_srgb() {
                    rgb = rgb.map(linear_to_srgb);
                }
                let bytes = [
                    unorm8(rgb[0]),
                    unorm8(rgb[1]),
                    unorm8(rgb[2]),
                    unorm8(rgba[3]),
                ];
                if self.is_bgra() {
                    out[..4].copy_from_slice(&[bytes[2], bytes[1], bytes[0], bytes[3]]);
                } else {
                    out[..4].copy_from_slice(&bytes);
                }
            }
        }
    }

    /// Decode one pixel (`bytes_per_pixel()` bytes) into a linear RGBA color
    pub fn decode_color(&self, bytes: &[u8]) -> [f32; 4] {
        match self {
            TextureFormat::R16G16B16A16_SFLOAT => {
                let mut rgba = [0.0; 4];
                for (channel, value) in rgba.iter_mut().enumerate() {
                    let bits = u16::from_le_bytes([bytes[channel * 2], bytes[channel * 2 + 1]]);
                    *value = f16::from_bits(bits).to_f32();
                }
                rgba
            }
            _ => {
                let (r, g, b) = if self.is_bgra() {
                    (bytes[2], bytes[1], bytes[0])
                } else {
                    (bytes[0], bytes[1], bytes[2])
                };
                let mut rgb = [r, g, b].map(|v| v as f32 / 255.0);
                if self.is_srgb() {
                    rgb = rgb.map(srgb_to_linear);
                }
                [rgb[0], rgb[1], rgb[2], bytes[3] as f32 / 255.0]
            }
        }
    }
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn linear_to_srgb(value: f32) -> f32 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.040_45 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

bitflags! {
    /// Texture usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be sampled in shaders (material input)
        const SAMPLED = 1 << 0;
        /// Texture can be used as a color render target
        const RENDER_TARGET = 1 << 1;
        /// Texture keeps a host-visible mirror refreshed by `CommandList::copy_texture_to_host`
        const HOST_READBACK = 1 << 2;
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage flags
    pub usage: TextureUsage,
    /// Optional initial data (tightly packed rows) uploaded at creation time
    pub data: Option<Vec<u8>>,
}

impl TextureDesc {
    /// Size in bytes of a tightly packed image of this descriptor
    pub fn tight_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }
}

/// Read-only properties of a created texture.
///
/// Returned by `Texture::info()` to query texture properties
/// without exposing backend-specific details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage flags
    pub usage: TextureUsage,
}

/// Copy of a texture's host-visible backing memory
#[derive(Debug, Clone, PartialEq)]
pub struct HostMemory {
    /// Raw pixel rows, `bytes_per_row * height` bytes
    pub bytes: Vec<u8>,
    /// Row stride in bytes (may include backend padding)
    pub bytes_per_row: usize,
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types (e.g., VulkanTexture).
/// The texture is automatically destroyed when dropped.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;

    /// Read the host-visible mirror of this texture
    ///
    /// Returns `None` when the texture was not created with
    /// `TextureUsage::HOST_READBACK` or the memory is not mapped.
    /// The content reflects the last completed copy; callers order the
    /// read after GPU work through the submission fence.
    fn host_memory(&self) -> Option<HostMemory>;
}
